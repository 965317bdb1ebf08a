//! # Object Fragments
//!
//! Open and closed objects, string-keyed maps, optional properties, and
//! the two operations that rework an object's property set: [`extending`]
//! and [`remove_property`].
//!
//! ## Required properties
//!
//! `open_object` and `closed_object` require every property whose fragment
//! is not marked [`Optional`]. An empty `required` list is never emitted
//! by the builders: the keyword is omitted instead, so equivalent
//! fragments compare equal. [`remove_property`] is the exception and keeps
//! `required: []`, so its output can be narrowed again.

use serde_json::Value;
use shape_core::error::describe;
use shape_core::util::{concat, dedupe, null_if_empty, seq};
use shape_core::{get_metadata, set_metadata, Optional, Schema, SchemaError};

/// Returns `true` for fragments with `type: "object"` and `properties`.
pub fn is_object(schema: &Schema) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object")
        && schema.get("properties").is_some_and(|p| !p.is_null())
}

/// `{"type": "object", "properties": props}` without `required`.
pub fn object<I, K>(props: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Schema::new()
        .with("type", "object")
        .with_children("properties", props)
}

/// An object that requires every non-optional property and accepts
/// undeclared ones.
pub fn open_object<I, K>(props: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    let props: Vec<(String, Schema)> = props.into_iter().map(|(k, v)| (k.into(), v)).collect();
    let required = dedupe(
        props
            .iter()
            .filter(|(_, fragment)| get_metadata::<Optional>(fragment) != Some(&true))
            .map(|(name, _)| Value::String(name.clone())),
    );
    with_required(object(props), required)
}

/// [`open_object`] plus `additionalProperties: false`.
pub fn closed_object<I, K>(props: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    open_object(props).with("additionalProperties", false)
}

/// An object with no declared properties whose values all match
/// `values`, or anything when `values` is `None`.
pub fn map_object(values: Option<Schema>) -> Schema {
    let base = open_object(Vec::<(String, Schema)>::new());
    match values {
        Some(values) => base.with_child(&["additionalProperties"], values),
        None => base.with("additionalProperties", true),
    }
}

/// Mark a fragment as optional when it is used as an object property.
/// Has no effect anywhere else.
pub fn optional(schema: Schema) -> Schema {
    set_metadata::<Optional>(schema, Some(true))
}

/// Combine `child` with its `bases`.
///
/// Properties and `required` lists are merged across the chain. On
/// property name conflicts the child wins, then the last base, then the
/// one before it, down to the first base. `required` is the de-duplicated
/// union of every list (child first, then bases from last to first).
/// Every other keyword of the child is kept as given.
pub fn extending<I>(child: Schema, bases: I) -> Schema
where
    I: IntoIterator<Item = Schema>,
{
    let bases: Vec<Schema> = bases.into_iter().collect();

    let required = concat(
        std::iter::once(&child)
            .chain(bases.iter().rev())
            .map(|s| s.get("required").unwrap_or(&Value::Null)),
    );

    let mut properties: Vec<(String, Schema)> = Vec::new();
    for source in bases.iter().chain(std::iter::once(&child)) {
        for (name, fragment) in source.children("properties") {
            match properties.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = fragment,
                None => properties.push((name, fragment)),
            }
        }
    }

    let merged = Schema::merged([child]).with_children("properties", properties);
    with_required(merged, dedupe(required))
}

/// Remove properties from an object, both from `properties` and from
/// `required`. The result keeps `required` even when it becomes empty.
///
/// # Errors
///
/// Returns [`SchemaError::MissingRequired`] if the fragment has no
/// `required` keyword.
pub fn remove_property(schema: Schema, names: &[&str]) -> Result<Schema, SchemaError> {
    let Some(required) = schema.get("required").filter(|r| !r.is_null()) else {
        return Err(SchemaError::MissingRequired {
            combinator: "remove_property",
        });
    };
    let required: Vec<Value> = seq(required)
        .into_iter()
        .filter(|r| !r.as_str().is_some_and(|name| names.contains(&name)))
        .collect();
    let properties: Vec<(String, Schema)> = schema
        .children("properties")
        .into_iter()
        .filter(|(name, _)| !names.contains(&name.as_str()))
        .collect();
    Ok(Schema::merged([schema])
        .with_children("properties", properties)
        .with("required", required))
}

/// Set `required`, or drop it when the list is empty.
pub(crate) fn with_required(schema: Schema, required: Vec<Value>) -> Schema {
    match null_if_empty(Value::Array(required)) {
        Some(required) => schema.with("required", required),
        None => schema.without("required"),
    }
}

pub(crate) fn not_an_object(combinator: &'static str, schema: &Schema) -> SchemaError {
    SchemaError::NotAnObject {
        combinator,
        found: describe(&schema.to_value()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::type_;
    use serde_json::json;

    #[test]
    fn test_object_has_no_required() {
        let s = object([("a", type_("number"))]);
        assert_eq!(
            s.to_value(),
            json!({"type": "object", "properties": {"a": {"type": "number"}}})
        );
    }

    #[test]
    fn test_open_object_requires_non_optional() {
        let s = open_object([("a", type_("number")), ("b", optional(type_("string")))]);
        assert_eq!(s.get("required"), Some(&json!(["a"])));
        assert!(s.get("additionalProperties").is_none());
    }

    #[test]
    fn test_open_object_omits_empty_required() {
        let s = open_object([("b", optional(type_("string")))]);
        assert!(s.get("required").is_none());
        let empty = open_object(Vec::<(String, Schema)>::new());
        assert_eq!(empty.to_value(), json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_closed_object() {
        let s = closed_object([("a", type_("number"))]);
        assert_eq!(s.get("additionalProperties"), Some(&json!(false)));
        assert_eq!(s.get("required"), Some(&json!(["a"])));
    }

    #[test]
    fn test_optional_only_marks_metadata() {
        let s = optional(type_("string"));
        assert_eq!(s, type_("string"));
        assert_eq!(get_metadata::<Optional>(&s), Some(&true));
    }

    #[test]
    fn test_map_object() {
        assert_eq!(
            map_object(Some(type_("number"))).to_value(),
            json!({"type": "object", "properties": {}, "additionalProperties": {"type": "number"}})
        );
        assert_eq!(map_object(None).get("additionalProperties"), Some(&json!(true)));
    }

    #[test]
    fn test_extending_single_base() {
        let parent = open_object([("foo", type_("string"))]);
        let child = closed_object([("baz", type_("number"))]).with_description("child object");
        let s = extending(child, [parent]);
        assert_eq!(s.get("description"), Some(&json!("child object")));
        assert_eq!(s.get("additionalProperties"), Some(&json!(false)));
        assert_eq!(s.get("required"), Some(&json!(["baz", "foo"])));
        assert_eq!(
            s.get("properties"),
            Some(&json!({"foo": {"type": "string"}, "baz": {"type": "number"}}))
        );
    }

    #[test]
    fn test_extending_precedence_child_then_last_base() {
        let grand_parent = open_object([("name", type_("string")), ("id", type_("string"))]);
        let parent = open_object([("room", type_("number")), ("id", type_("number"))]);
        let child = closed_object([("is_substitute", type_("boolean"))]);
        let s = extending(child, [grand_parent, parent]);

        assert_eq!(s.lookup(&["properties", "id"]), Some(&json!({"type": "number"})));
        assert_eq!(
            s.get("required"),
            Some(&json!(["is_substitute", "room", "id", "name"]))
        );
    }

    #[test]
    fn test_extending_child_overrides_bases() {
        let base = open_object([("credentials", type_("object"))]);
        let child = closed_object([("credentials", type_("string"))]);
        let s = extending(child, [base]);
        assert_eq!(s.lookup(&["properties", "credentials"]), Some(&json!({"type": "string"})));
        assert_eq!(s.get("required"), Some(&json!(["credentials"])));
    }

    #[test]
    fn test_extending_keeps_property_metadata() {
        let base = object([("note", optional(type_("string")))]);
        let s = extending(closed_object(Vec::<(String, Schema)>::new()), [base]);
        assert!(s.metadata_at("/properties/note").is_some());
        assert!(s.get("required").is_none());
    }

    #[test]
    fn test_remove_property() {
        let s = closed_object([("a", type_("number")), ("b", type_("string"))]);
        let removed = remove_property(s, &["b"]).unwrap();
        assert_eq!(
            removed.to_value(),
            json!({
                "type": "object",
                "properties": {"a": {"type": "number"}},
                "required": ["a"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn test_remove_property_requires_required() {
        let err = remove_property(object([("a", type_("number"))]), &["a"]).unwrap_err();
        assert_eq!(err, SchemaError::MissingRequired { combinator: "remove_property" });
    }

    #[test]
    fn test_remove_property_keeps_empty_required() {
        let s = open_object([("a", type_("number")), ("b", type_("string"))]);
        let once = remove_property(s, &["a"]).unwrap();
        let twice = remove_property(once, &["b"]).unwrap();
        assert_eq!(
            twice.to_value(),
            json!({"type": "object", "properties": {}, "required": []})
        );
        let again = remove_property(twice, &["c"]).unwrap();
        assert_eq!(again.get("required"), Some(&json!([])));
    }

    #[test]
    fn test_extending_required_is_deduplicated_union() {
        let base = open_object([("a", type_("number")), ("b", type_("number"))]);
        let child = open_object([("b", type_("string")), ("c", type_("string"))]);
        let s = extending(child, [base]);
        assert_eq!(s.get("required"), Some(&json!(["b", "c", "a"])));
    }

    #[test]
    fn test_is_object() {
        assert!(is_object(&object(Vec::<(String, Schema)>::new())));
        assert!(!is_object(&type_("object")));
        assert!(!is_object(&type_("string")));
    }
}
