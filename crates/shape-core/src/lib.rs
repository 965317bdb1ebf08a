#![deny(missing_docs)]

//! # shape-core — Foundational Types for the Shape Stack
//!
//! This crate defines the data every other `shape-*` crate agrees on:
//! schema fragments, the metadata that travels alongside them, and the
//! function-valued pieces (transforms, class constructors) a plain JSON
//! document cannot carry.
//!
//! ## Key Design Principles
//!
//! 1. **Documents stay plain JSON.** [`Schema`] pairs a JSON object with a
//!    pointer-keyed side table of [`Metadata`]. Serialization and equality
//!    only ever see the document.
//!
//! 2. **Typed metadata slots.** Each slot is a marker type implementing
//!    [`MetadataKey`], so `get_metadata::<TaggedUnion>` returns a
//!    [`TaggedUnionTag`] and not an untyped blob.
//!
//! 3. **Explicit sum types at call sites.** A transform is either named or
//!    inline ([`TransformRef`]); a class is either named or carried
//!    ([`ClassRef`]). Nothing is discriminated by runtime inspection.
//!
//! 4. **Functions are shared and thread-safe.** Transforms and classes are
//!    `Arc<dyn ... + Send + Sync>`, so compiled validators can be shared
//!    across threads.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `shape-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod class;
pub mod error;
pub mod fragment;
pub mod kind;
pub mod metadata;
pub mod options;
pub mod transform;
pub mod util;

// Re-export primary types for ergonomic imports.
pub use class::{
    class_table, construct_fn, default_classes, Class, ClassRef, ClassTable, ConstructFn,
    Constructor, DateClass, DATE_KEY,
};
pub use error::{SchemaError, TransformError};
pub use fragment::Schema;
pub use kind::ValueKind;
pub use metadata::{
    get_metadata, set_metadata, Constructors, Metadata, MetadataKey, Optional, TaggedUnion,
    TaggedUnionTag, Transforms, ValidatorConfig,
};
pub use options::{ConfigFile, Draft, MatcherOptions, ValidatorOptions};
pub use transform::{
    transform_fn, TransformContext, TransformFn, TransformIssue, TransformRef, TransformTable,
};
