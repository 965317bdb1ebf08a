//! # shape-schema — Schema Combinator Algebra
//!
//! Pure builders that produce and compose [`Schema`] fragments. Every
//! combinator takes its inputs by value and returns a new fragment; none of
//! them reaches into a fragment it did not build.
//!
//! ## Metadata
//!
//! Combinators that embed fragments (objects, tuples, unions, definitions)
//! keep the embedded fragments' metadata under the new node pointers.
//! [`optional`], [`tagged_union`], [`instance_of`] and [`transform`] write
//! metadata of their own, which the validator compiler reads back through
//! [`shape_core::get_metadata`] and [`Schema::metadata_at`].
//!
//! ## Errors
//!
//! Malformed usage (a non-object tagged-union member, `partial` on a plain
//! string schema, an unnamed inline transform) is rejected immediately with
//! a [`SchemaError`]. Nothing panics.
//!
//! ## Example
//!
//! ```
//! use shape_schema::{closed_object, tagged_union, type_};
//!
//! let shapes = tagged_union(
//!     "shape",
//!     [
//!         ("rectangle", closed_object([("height", type_("number")), ("width", type_("number"))])),
//!         ("circle", closed_object([("radius", type_("number"))])),
//!     ],
//!     None,
//! )
//! .unwrap();
//! assert_eq!(shapes.members("anyOf").len(), 2);
//! ```

pub mod array;
pub mod instance;
pub mod object;
pub mod primitives;
pub mod union;

pub use array::{closed_tuple_of, list_of, open_tuple_of};
pub use instance::{instance_of, serialized_instance_of, serialized_instance_of_with, transform};
pub use object::{
    closed_object, extending, is_object, map_object, object, open_object, optional,
    remove_property,
};
pub use primitives::{
    any, base_schema, base_schema_with_id_base, enum_of, reference, runtime_type, type_, TypeArg,
    DEFAULT_ID_BASE, SCHEMA_DIALECT,
};
pub use union::{any_of, is_tagged_union, nullable, partial, tagged_union};

pub use shape_core::{Schema, SchemaError};
