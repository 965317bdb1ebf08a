//! # Transform Functions
//!
//! A transform is a named, ordered, value-rewriting validation step. The
//! `transform` keyword of a schema node lists transform identifiers; the
//! compiler resolves each identifier to a [`TransformFn`] and runs the
//! chain in declared order whenever a value reaches that node.
//!
//! ## Contract
//!
//! A transform receives the current value by ownership and returns the
//! value that replaces it. It may report any number of validation
//! failures through [`TransformContext::error`] without stopping the rest
//! of the chain. Returning `Err` aborts the whole validation call.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::TransformError;

/// A transform function.
pub type TransformFn =
    Arc<dyn Fn(Value, &mut TransformContext<'_>) -> Result<Value, TransformError> + Send + Sync>;

/// Transform functions indexed by identifier.
pub type TransformTable = BTreeMap<String, TransformFn>;

/// Wrap a closure as a [`TransformFn`].
pub fn transform_fn<F>(f: F) -> TransformFn
where
    F: Fn(Value, &mut TransformContext<'_>) -> Result<Value, TransformError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A validation failure reported by a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformIssue {
    /// Identifier of the transform that reported the failure.
    pub transformation: String,
    /// Human-readable description.
    pub message: String,
    /// Optional structured parameters supplied by the transform.
    pub params: Option<Value>,
}

/// Everything a transform can see about the value it is rewriting.
pub struct TransformContext<'a> {
    transformation: &'a str,
    instance_path: &'a str,
    key: Option<&'a str>,
    parent_schema: &'a Value,
    issues: &'a mut Vec<TransformIssue>,
}

impl<'a> TransformContext<'a> {
    /// Create a context. `issues` collects failures reported via [`error`](Self::error).
    pub fn new(
        transformation: &'a str,
        instance_path: &'a str,
        key: Option<&'a str>,
        parent_schema: &'a Value,
        issues: &'a mut Vec<TransformIssue>,
    ) -> Self {
        Self {
            transformation,
            instance_path,
            key,
            parent_schema,
            issues,
        }
    }

    /// Identifier of the transform being run.
    pub fn transformation(&self) -> &str {
        self.transformation
    }

    /// JSON Pointer of the value inside the validated document (`""` at the root).
    pub fn instance_path(&self) -> &str {
        self.instance_path
    }

    /// Key or index of the value within its parent container, `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.key
    }

    /// The schema node carrying the `transform` keyword.
    pub fn parent_schema(&self) -> &Value {
        self.parent_schema
    }

    /// Report a validation failure. The chain keeps running.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message.into(), None);
    }

    /// Report a validation failure with structured parameters.
    pub fn error_with(&mut self, message: impl Into<String>, params: Value) {
        self.push(message.into(), Some(params));
    }

    fn push(&mut self, message: String, params: Option<Value>) {
        self.issues.push(TransformIssue {
            transformation: self.transformation.to_string(),
            message,
            params,
        });
    }
}

/// A reference to a transform as passed to the `transform` combinator.
#[derive(Clone)]
pub enum TransformRef {
    /// Resolved at compile time against the validator configuration.
    Named(String),
    /// Carried by the fragment itself and registered under `name`.
    Inline {
        /// Identifier written into the `transform` keyword.
        name: String,
        /// The function to run.
        func: TransformFn,
    },
}

impl TransformRef {
    /// A transform resolved by identifier.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// A transform carried inline by the fragment.
    pub fn inline<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, &mut TransformContext<'_>) -> Result<Value, TransformError>
            + Send
            + Sync
            + 'static,
    {
        Self::Inline {
            name: name.into(),
            func: Arc::new(f),
        }
    }

    /// The identifier written into the `transform` keyword.
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Inline { name, .. } => name,
        }
    }
}

impl From<&str> for TransformRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for TransformRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl fmt::Debug for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Inline { name, .. } => f.debug_struct("Inline").field("name", name).finish(),
        }
    }
}
