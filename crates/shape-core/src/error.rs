//! # Error Types: Build-Time and Transform Failures
//!
//! Defines the errors raised while *building* schema fragments and the
//! error type user transforms and constructors return while *running*.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Malformed combinator usage is reported at construction time as a
//!   [`SchemaError`]; it is never deferred to validation.
//! - A [`TransformError`] returned by user code is fatal for the
//!   validation call that triggered it. It is not a validation failure
//!   and never ends up in a result envelope.

use thiserror::Error;

/// Malformed combinator usage detected while building a schema fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A combinator that only accepts object fragments received something else.
    #[error("{combinator}: expected an object fragment with `properties`, got {found}")]
    NotAnObject {
        /// The combinator that rejected its input.
        combinator: &'static str,
        /// Compact rendering of the rejected fragment.
        found: String,
    },

    /// `partial` accepts only object fragments and tagged unions.
    #[error("partial: expected an object fragment or a tagged union, got {found}")]
    NotObjectOrTaggedUnion {
        /// Compact rendering of the rejected fragment.
        found: String,
    },

    /// An operation that edits `required` was applied to a fragment without it.
    #[error("{combinator}: fragment has no `required` keyword")]
    MissingRequired {
        /// The combinator that rejected its input.
        combinator: &'static str,
    },

    /// Two members of a tagged union share a tag value.
    #[error("tagged_union: tag value {value:?} of `{tag}` is used by more than one member")]
    DuplicateTag {
        /// Name of the discriminator property.
        tag: String,
        /// The repeated tag value.
        value: String,
    },

    /// An inline transform or class was supplied without a name.
    #[error("{combinator}: inline {what} must have a non-empty name")]
    UnnamedFunction {
        /// The combinator that rejected its input.
        combinator: &'static str,
        /// `"transform"` or `"class"`.
        what: &'static str,
    },

    /// No constructor could be resolved for a serialized instance.
    #[error("serialized_instance_of: no constructor available for class {class}")]
    UnresolvedClass {
        /// The class identifier that could not be resolved.
        class: String,
    },

    /// A JSON value that is not an object was offered as a schema fragment.
    #[error("schema fragments must be JSON objects, got {found}")]
    NotAFragment {
        /// Compact rendering of the rejected value.
        found: String,
    },
}

/// Failure raised by a transform function or class constructor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A constructor rejected its serialized input.
    #[error("could not construct {class} from {input}: {reason}")]
    Construct {
        /// Name of the class being constructed.
        class: String,
        /// Compact rendering of the rejected input.
        input: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// Any other failure raised by user code.
    #[error("{0}")]
    Failed(String),
}

impl TransformError {
    /// Shorthand for [`TransformError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Render a JSON value compactly for error messages, truncating long output.
pub fn describe(value: &serde_json::Value) -> String {
    const LIMIT: usize = 120;
    let rendered = value.to_string();
    if rendered.len() <= LIMIT {
        return rendered;
    }
    let mut cut = LIMIT;
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &rendered[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_error_messages() {
        let err = SchemaError::NotAnObject {
            combinator: "tagged_union",
            found: "{\"type\":\"string\"}".to_string(),
        };
        assert!(err.to_string().starts_with("tagged_union:"));
        let err = SchemaError::MissingRequired { combinator: "remove_property" };
        assert_eq!(err.to_string(), "remove_property: fragment has no `required` keyword");
        let err = SchemaError::DuplicateTag {
            tag: "kind".to_string(),
            value: "circle".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "tagged_union: tag value \"circle\" of `kind` is used by more than one member"
        );
    }

    #[test]
    fn test_transform_error_display() {
        let err = TransformError::Construct {
            class: "Date".to_string(),
            input: "\"yesterday\"".to_string(),
            reason: "input contains invalid characters".to_string(),
        };
        assert!(err.to_string().contains("could not construct Date"));
        assert_eq!(TransformError::failed("boom").to_string(), "boom");
    }

    #[test]
    fn test_describe_truncates() {
        let long = json!("x".repeat(500));
        let rendered = describe(&long);
        assert!(rendered.ends_with('…'));
        assert!(rendered.len() < 200);
        assert_eq!(describe(&json!({"a": 1})), "{\"a\":1}");
    }
}
