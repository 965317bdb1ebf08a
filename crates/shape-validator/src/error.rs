//! # Compiler and Validator Errors
//!
//! [`CompileError`] covers everything that can go wrong while turning a
//! schema into a [`Validator`](crate::Validator). [`ValidatorError`] covers
//! the two ways a validation call can fail outright: an asserting
//! validator rejecting its input, and a transform or constructor raising
//! an error. Ordinary validation failures are not errors; they are
//! reported in [`ValidationOutcome`](crate::ValidationOutcome).

use shape_core::TransformError;
use thiserror::Error;

use crate::outcome::{render_issues, ValidationIssue};

/// Failure to compile a schema into a validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A `transform` keyword names a function that is neither configured
    /// nor attached to the node.
    #[error("no such transform function available: {name} (at '{pointer}')")]
    UnknownTransform {
        /// The unresolved transform identifier.
        name: String,
        /// JSON Pointer of the schema node.
        pointer: String,
    },

    /// An `instanceOf` keyword names an unknown class.
    #[error("invalid \"instanceOf\" keyword value {name} (at '{pointer}')")]
    UnknownClass {
        /// The unresolved class identifier.
        name: String,
        /// JSON Pointer of the schema node.
        pointer: String,
    },

    /// An extension keyword outside the supported catalogue was requested.
    #[error("unknown extension keyword: {name}")]
    UnknownKeyword {
        /// The requested keyword.
        name: String,
    },

    /// A custom keyword carries a value of the wrong shape.
    #[error("invalid value for \"{keyword}\" at '{pointer}': {reason}")]
    InvalidKeyword {
        /// The keyword.
        keyword: String,
        /// JSON Pointer of the schema node.
        pointer: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The structural matcher rejected the schema.
    #[error("schema compilation error: {reason}")]
    Build {
        /// Matcher diagnostic.
        reason: String,
    },
}

/// Fatal failure of a validation call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidatorError {
    /// An asserting validator received invalid data.
    #[error("{message}:\n{}", render_issues(.errors))]
    ValidationFailed {
        /// Caller-supplied message, `"jsonschema validation failed"` by default.
        message: String,
        /// Every reported failure.
        errors: Vec<ValidationIssue>,
    },

    /// A transform function or class constructor returned an error.
    #[error("transform '{transformation}' failed at '{instance_path}': {source}")]
    TransformFailed {
        /// Identifier of the failing transform.
        transformation: String,
        /// JSON Pointer of the value being transformed.
        instance_path: String,
        /// The error raised by user code.
        #[source]
        source: TransformError,
    },
}
