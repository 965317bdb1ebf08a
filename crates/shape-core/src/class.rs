//! # Runtime Classes
//!
//! A class gives a JSON value runtime provenance: the `instanceOf`
//! keyword asks a class whether a value is one of its instances, and a
//! serialized instance is turned into a live one by the class
//! constructor.
//!
//! ## Built-in registry
//!
//! [`default_classes`] is the process-wide registry consulted when an
//! identifier is not configured explicitly: `Object`, `Array`, `String`,
//! `Number`, `Boolean` and `Date`.
//!
//! `Date` instances are represented as `{"$date": "<RFC 3339>"}` with
//! millisecond precision and a `Z` suffix, so that re-serializing a
//! constructed date reproduces the canonical input string.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::error::{describe, TransformError};

/// A runtime class: an instance predicate plus a constructor.
pub trait Constructor: Send + Sync {
    /// Identifier used by the `instanceOf` keyword.
    fn name(&self) -> &str;

    /// Whether `value` is an instance of this class.
    fn is_instance(&self, value: &Value) -> bool;

    /// Build an instance from its serialized form.
    fn construct(&self, serialized: Value) -> Result<Value, TransformError>;
}

/// A shared class handle.
pub type Class = Arc<dyn Constructor>;

/// Classes indexed by name.
pub type ClassTable = BTreeMap<String, Class>;

/// A free-standing deserializer used instead of a class constructor.
pub type ConstructFn = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

/// Wrap a closure as a [`ConstructFn`].
pub fn construct_fn<F>(f: F) -> ConstructFn
where
    F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A class as passed to the `instance_of` combinators.
#[derive(Clone)]
pub enum ClassRef {
    /// Resolved by identifier at compile time.
    Named(String),
    /// Carried by the fragment itself.
    Class(Class),
}

impl ClassRef {
    /// The identifier written into the `instanceOf` keyword.
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Class(class) => class.name(),
        }
    }
}

impl From<&str> for ClassRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ClassRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Class> for ClassRef {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Class(class) => f.debug_tuple("Class").field(&class.name()).finish(),
        }
    }
}

/// Build a table from a list of classes. Later entries win on name collisions.
pub fn class_table<I>(classes: I) -> ClassTable
where
    I: IntoIterator<Item = Class>,
{
    classes
        .into_iter()
        .map(|class| (class.name().to_string(), class))
        .collect()
}

/// The built-in class registry.
pub fn default_classes() -> &'static ClassTable {
    static REGISTRY: OnceLock<ClassTable> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        class_table([
            Arc::new(Builtin::Object) as Class,
            Arc::new(Builtin::Array),
            Arc::new(Builtin::String),
            Arc::new(Builtin::Number),
            Arc::new(Builtin::Boolean),
            Arc::new(DateClass),
        ])
    })
}

// ---------------------------------------------------------------------------
// Built-in primitive classes
// ---------------------------------------------------------------------------

/// Classes for the JSON primitive kinds. Their constructors parse a
/// serialized (string) form; non-string inputs are converted directly
/// where that is unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Object,
    Array,
    String,
    Number,
    Boolean,
}

impl Builtin {
    fn reject(self, input: &Value, reason: impl Into<String>) -> TransformError {
        TransformError::Construct {
            class: self.name().to_string(),
            input: describe(input),
            reason: reason.into(),
        }
    }

    fn parse_json(self, serialized: Value) -> Result<Value, TransformError> {
        match serialized {
            Value::String(text) => serde_json::from_str(&text)
                .map_err(|e| self.reject(&Value::String(text.clone()), e.to_string())),
            other => Ok(other),
        }
    }
}

impl Constructor for Builtin {
    fn name(&self) -> &str {
        match self {
            Self::Object => "Object",
            Self::Array => "Array",
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
        }
    }

    fn is_instance(&self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    fn construct(&self, serialized: Value) -> Result<Value, TransformError> {
        let built = match self {
            Self::String => match serialized {
                Value::String(s) => Value::String(s),
                other => Value::String(other.to_string()),
            },
            Self::Object | Self::Array | Self::Number | Self::Boolean => {
                self.parse_json(serialized)?
            }
        };
        if self.is_instance(&built) {
            Ok(built)
        } else {
            Err(self.reject(&built, format!("not a {}", self.name())))
        }
    }
}

// ---------------------------------------------------------------------------
// Date
// ---------------------------------------------------------------------------

/// Key of the single entry of a date instance.
pub const DATE_KEY: &str = "$date";

/// Calendar timestamps, constructed from RFC 3339 strings or epoch
/// milliseconds and normalised to UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateClass;

impl DateClass {
    /// Render a timestamp as a date instance.
    pub fn instance(dt: DateTime<Utc>) -> Value {
        json!({ DATE_KEY: dt.to_rfc3339_opts(SecondsFormat::Millis, true) })
    }

    /// Extract the timestamp carried by a date instance.
    pub fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        let text = map.get(DATE_KEY)?.as_str()?;
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// The canonical serialized form of a date instance.
    pub fn serialize(value: &Value) -> Option<String> {
        Self::timestamp(value).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    fn reject(input: &Value, reason: impl Into<String>) -> TransformError {
        TransformError::Construct {
            class: "Date".to_string(),
            input: describe(input),
            reason: reason.into(),
        }
    }
}

impl Constructor for DateClass {
    fn name(&self) -> &str {
        "Date"
    }

    fn is_instance(&self, value: &Value) -> bool {
        Self::timestamp(value).is_some()
    }

    fn construct(&self, serialized: Value) -> Result<Value, TransformError> {
        if self.is_instance(&serialized) {
            return Ok(serialized);
        }
        let dt = match &serialized {
            Value::String(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Self::reject(&serialized, e.to_string()))?,
            Value::Number(n) => {
                let millis = n
                    .as_i64()
                    .ok_or_else(|| Self::reject(&serialized, "epoch milliseconds must be an integer"))?;
                DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| Self::reject(&serialized, "timestamp out of range"))?
            }
            _ => return Err(Self::reject(&serialized, "expected a string or a number")),
        };
        Ok(Self::instance(dt))
    }
}
