//! # Array Fragments
//!
//! Homogeneous lists and positional tuples.

use shape_core::Schema;

use crate::primitives::{type_, TypeArg};

/// An array whose elements all match `item`.
pub fn list_of(item: impl Into<TypeArg>) -> Schema {
    type_("array").with_child(&["items"], type_(item))
}

/// An array whose leading elements match `items` position by position.
/// Extra trailing elements of any shape are allowed.
pub fn open_tuple_of<I, T>(items: I) -> Schema
where
    I: IntoIterator<Item = T>,
    T: Into<TypeArg>,
{
    let items: Vec<Schema> = items.into_iter().map(type_).collect();
    let count = items.len();
    let base = type_("array");
    let base = if items.is_empty() {
        base
    } else {
        base.with_members("items", items)
    };
    base.with("minItems", count)
}

/// [`open_tuple_of`] that rejects extra elements.
pub fn closed_tuple_of<I, T>(items: I) -> Schema
where
    I: IntoIterator<Item = T>,
    T: Into<TypeArg>,
{
    let items: Vec<TypeArg> = items.into_iter().map(Into::into).collect();
    let count = items.len();
    open_tuple_of(items)
        .with("additionalItems", false)
        .with("maxItems", count)
}
