//! # Asserting Validator
//!
//! A [`Validator`] that returns the transformed value directly and turns
//! validation failures into [`ValidatorError::ValidationFailed`].

use serde_json::Value;
use shape_core::{Schema, ValidatorOptions};

use crate::compile::{get_validator, Validator};
use crate::error::{CompileError, ValidatorError};

/// Message used when the caller supplies none.
pub const DEFAULT_MESSAGE: &str = "jsonschema validation failed";

/// A validator that rejects invalid values with an error.
#[derive(Debug)]
pub struct AssertingValidator {
    inner: Validator,
    message: String,
}

/// Compile `schema` into an [`AssertingValidator`]. `message` defaults to
/// [`DEFAULT_MESSAGE`].
///
/// # Errors
///
/// As for [`get_validator`].
pub fn get_asserting_validator(
    schema: &Schema,
    message: Option<&str>,
    options: Option<ValidatorOptions>,
) -> Result<AssertingValidator, CompileError> {
    Ok(AssertingValidator {
        inner: get_validator(schema, options)?,
        message: message.unwrap_or(DEFAULT_MESSAGE).to_string(),
    })
}

impl AssertingValidator {
    /// Validate `value` and return the transformed data.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::ValidationFailed`] carrying every failure
    /// when `value` is invalid, and [`ValidatorError::TransformFailed`] when
    /// a transform fails.
    pub fn validate(&self, value: Value) -> Result<Value, ValidatorError> {
        let outcome = self.inner.validate(value)?;
        match outcome.errors {
            None => Ok(outcome.data),
            Some(errors) => Err(ValidatorError::ValidationFailed {
                message: self.message.clone(),
                errors,
            }),
        }
    }

    /// The message carried by validation failures.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying validator.
    pub fn validator(&self) -> &Validator {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number_schema() -> Schema {
        Schema::from_value(json!({"type": "number"})).unwrap()
    }

    #[test]
    fn test_returns_data_when_valid() {
        let v = get_asserting_validator(&number_schema(), None, None).unwrap();
        assert_eq!(v.validate(json!(3)).unwrap(), json!(3));
        assert_eq!(v.message(), DEFAULT_MESSAGE);
    }

    #[test]
    fn test_raises_when_invalid() {
        let v = get_asserting_validator(&number_schema(), Some("bad number"), None).unwrap();
        match v.validate(json!("x")) {
            Err(ValidatorError::ValidationFailed { message, errors }) => {
                assert_eq!(message, "bad number");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].keyword, "type");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }
}
