//! # shape-validator — Validation and Transform Compiler
//!
//! Compiles a [`Schema`](shape_core::Schema) into a [`Validator`] that
//! checks values against it and rewrites them with the schema's
//! transforms.
//!
//! ## Pipeline
//!
//! Structural matching is delegated to the `jsonschema` crate, extended
//! with the `instanceOf`, `transform` and `typeof` keywords and any
//! catalogue keywords enabled in [`ValidatorOptions`](shape_core::ValidatorOptions).
//! Transforms run in a separate pass over a compiled transform plan, after
//! matching, so the schema always describes the value *before*
//! transformation.
//!
//! ## Results
//!
//! Every call returns a [`ValidationOutcome`] `{valid, errors, data}`.
//! Only two things are errors: an [`AssertingValidator`] rejecting its
//! input, and a transform returning `Err`.
//!
//! ## Crate Policy
//!
//! - Depends only on `shape-core` internally.
//! - Identifiers (`instanceOf` classes, `transform` functions, keyword
//!   names) are resolved once at compile time; unknown ones fail
//!   compilation.
//! - A compiled [`Validator`] is immutable and safe to share across threads.

pub mod asserting;
pub mod compile;
pub mod error;
pub mod keywords;
pub mod outcome;
mod plan;
pub mod registry;
mod walk;

pub(crate) use jsonschema::Validator as Matcher;

pub use asserting::{get_asserting_validator, AssertingValidator, DEFAULT_MESSAGE};
pub use compile::{get_validator, Validator};
pub use error::{CompileError, ValidatorError};
pub use keywords::{resolve_extensions, Extension};
pub use outcome::{ValidationIssue, ValidationOutcome};
pub use registry::ClassRegistry;
