//! # Classes and Transforms
//!
//! Builders for the two custom keywords: `instanceOf` checks runtime
//! provenance against a class, `transform` rewrites the value during
//! validation. Classes and transform functions supplied inline are stored
//! in the fragment's metadata so the compiler finds them without a
//! separate registry.

use std::sync::Arc;

use shape_core::{
    class_table, construct_fn, default_classes, get_metadata, set_metadata, ClassRef, ConstructFn,
    Constructors, Schema, SchemaError, TransformRef, TransformTable, Transforms, ValueKind,
};

use crate::object::open_object;
use crate::primitives::type_;
use crate::union::any_of;

/// An open object whose value must be an instance of `class`.
///
/// A carried class ([`ClassRef::Class`]) is also registered in the
/// fragment's [`Constructors`] metadata.
///
/// # Errors
///
/// Returns [`SchemaError::UnnamedFunction`] if the class name is empty.
pub fn instance_of(class: impl Into<ClassRef>) -> Result<Schema, SchemaError> {
    let class = class.into();
    let name = class.name().to_string();
    if name.is_empty() {
        return Err(SchemaError::UnnamedFunction {
            combinator: "instance_of",
            what: "class",
        });
    }
    let fragment = open_object(Vec::<(String, Schema)>::new()).with("instanceOf", name);
    Ok(match class {
        ClassRef::Class(class) => set_metadata::<Constructors>(fragment, Some(class_table([class]))),
        ClassRef::Named(_) => fragment,
    })
}

/// [`serialized_instance_of_with`] using the class constructor and a
/// string serialized form.
pub fn serialized_instance_of(class: impl Into<ClassRef>) -> Result<Schema, SchemaError> {
    serialized_instance_of_with(class, None, ValueKind::String)
}

/// Either an instance of `class`, or its serialized form of kind
/// `serialized`, which is deserialized during validation.
///
/// The deserializer is `constructor` when given, otherwise the class's own
/// constructor (for a carried class), otherwise the constructor of the
/// same-named class in [`default_classes`]. It runs only on values whose
/// kind is exactly `serialized`; other values pass through untouched.
/// Constructor failures abort validation.
///
/// # Errors
///
/// Returns [`SchemaError::UnresolvedClass`] if no deserializer can be
/// found, and the errors of [`instance_of`].
pub fn serialized_instance_of_with(
    class: impl Into<ClassRef>,
    constructor: Option<ConstructFn>,
    serialized: ValueKind,
) -> Result<Schema, SchemaError> {
    let class = class.into();
    let instance = instance_of(class.clone())?;

    let construct = match (constructor, &class) {
        (Some(f), _) => f,
        (None, ClassRef::Class(class)) => {
            let class = Arc::clone(class);
            construct_fn(move |value| class.construct(value))
        }
        (None, ClassRef::Named(name)) => {
            let class = default_classes()
                .get(name)
                .map(Arc::clone)
                .ok_or_else(|| SchemaError::UnresolvedClass { class: name.clone() })?;
            construct_fn(move |value| class.construct(value))
        }
    };

    let deserialize = TransformRef::inline(class.name(), move |value, _ctx| {
        if ValueKind::of(&value) == serialized {
            construct(value)
        } else {
            Ok(value)
        }
    });
    let serialized_form = transform(type_(serialized), [deserialize])?;
    Ok(any_of([instance, serialized_form]))
}

/// Set the `transform` keyword to the names of `transforms`, in order.
///
/// Inline transforms are added to the fragment's [`Transforms`] metadata.
/// Existing metadata of the fragment is kept.
///
/// # Errors
///
/// Returns [`SchemaError::UnnamedFunction`] for an inline transform with an
/// empty name.
pub fn transform<I>(schema: Schema, transforms: I) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = TransformRef>,
{
    let mut names = Vec::new();
    let mut inline = TransformTable::new();
    for transform in transforms {
        match transform {
            TransformRef::Named(name) => names.push(name),
            TransformRef::Inline { name, func } => {
                if name.is_empty() {
                    return Err(SchemaError::UnnamedFunction {
                        combinator: "transform",
                        what: "transform",
                    });
                }
                names.push(name.clone());
                inline.insert(name, func);
            }
        }
    }

    let out = schema.with("transform", names);
    if inline.is_empty() {
        return Ok(out);
    }
    let mut table = get_metadata::<Transforms>(&out).cloned().unwrap_or_default();
    table.extend(inline);
    Ok(set_metadata::<Transforms>(out, Some(table)))
}
