//! # Unions
//!
//! Plain unions, nullability, discriminated (tagged) unions and partial
//! views of objects and tagged unions.
//!
//! ## Tagged unions
//!
//! [`tagged_union`] extends every member object with a required
//! discriminator property constrained by `const`, and records the tag in
//! the [`TaggedUnion`] metadata slot of the union. [`partial`] relies on
//! that record to keep the discriminator required.

use serde_json::{json, Value};
use shape_core::error::describe;
use shape_core::util::{concat, dedupe, seq};
use shape_core::{get_metadata, set_metadata, Schema, SchemaError, TaggedUnion, TaggedUnionTag};

use crate::object::{is_object, not_an_object, with_required};
use crate::primitives::type_;

/// `{"anyOf": members}`.
pub fn any_of<I>(members: I) -> Schema
where
    I: IntoIterator<Item = Schema>,
{
    Schema::new().with_members("anyOf", members)
}

/// A union that also accepts `null`. `None` stands for the empty fragment.
///
/// A union that already has a member admitting `null` is returned
/// unchanged, so `nullable` is idempotent. Another union gets a `null`
/// member appended; any other fragment is wrapped in a two-member union.
pub fn nullable(schema: Option<Schema>) -> Schema {
    let schema = schema.unwrap_or_default();
    match schema.get("anyOf") {
        Some(Value::Array(members)) => {
            let null = json!("null");
            let admits_null = members
                .iter()
                .any(|m| seq(m.get("type").unwrap_or(&Value::Null)).contains(&null));
            if admits_null {
                schema
            } else {
                Schema::merged([schema]).push_member("anyOf", type_("null"))
            }
        }
        _ => any_of([schema, type_("null")]),
    }
}

/// Returns `true` for fragments marked as tagged unions, and for unions
/// whose members are all object fragments.
pub fn is_tagged_union(schema: &Schema) -> bool {
    if !matches!(schema.get("anyOf"), Some(Value::Array(_))) {
        return false;
    }
    get_metadata::<TaggedUnion>(schema).is_some() || {
        let members = schema.members("anyOf");
        let declared = schema.get("anyOf").and_then(Value::as_array).map_or(0, Vec::len);
        members.len() == declared && members.iter().all(is_object)
    }
}

/// A discriminated union of object fragments.
///
/// Each `(tag value, member)` entry becomes a copy of `member` with the
/// `tag` property added (its schema is `description`, default
/// `{"type": "string"}`, plus `const: <tag value>`) and required.
///
/// # Errors
///
/// Returns [`SchemaError::NotAnObject`] if a member is not an object
/// fragment, and [`SchemaError::DuplicateTag`] if two members share a tag
/// value.
pub fn tagged_union<I, K>(
    tag: &str,
    variants: I,
    description: Option<Schema>,
) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    let description = description.unwrap_or_else(|| type_("string"));
    let mut members = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for (tag_value, member) in variants {
        if !is_object(&member) {
            return Err(not_an_object("tagged_union", &member));
        }
        let tag_value: String = tag_value.into();
        if seen.contains(&tag_value) {
            return Err(SchemaError::DuplicateTag {
                tag: tag.to_string(),
                value: tag_value,
            });
        }
        seen.push(tag_value.clone());
        let tag_schema = Schema::merged([description.clone()]).with("const", tag_value);
        let required = concat([
            member.get("required").unwrap_or(&Value::Null),
            &Value::String(tag.to_string()),
        ]);
        let extended = member.with_child(&["properties", tag], tag_schema);
        members.push(with_required(extended, dedupe(required)));
    }
    let descriptor = TaggedUnionTag {
        tag_property_name: tag.to_string(),
        tag_property_description: description.into_value(),
    };
    Ok(set_metadata::<TaggedUnion>(any_of(members), Some(descriptor)))
}

/// Relax `required` to the names in `keep`.
///
/// Objects keep only the required names listed in `keep`. Tagged unions
/// add their discriminator to `keep` and are relaxed member by member, so
/// the discriminator stays required; a kept name a member does not
/// require is simply absent from that member. Applying `partial` twice
/// with the same `keep` gives the same fragment as applying it once.
///
/// # Errors
///
/// Returns [`SchemaError::NotObjectOrTaggedUnion`] for any other fragment.
pub fn partial(schema: Schema, keep: &[&str]) -> Result<Schema, SchemaError> {
    let tag = get_metadata::<TaggedUnion>(&schema).map(|t| t.tag_property_name.clone());
    let mut whitelist: Vec<&str> = keep.to_vec();
    if let Some(tag) = tag.as_deref() {
        whitelist.push(tag);
    }

    if is_object(&schema) {
        let required: Vec<Value> = seq(schema.get("required").unwrap_or(&Value::Null))
            .into_iter()
            .filter(|r| r.as_str().is_some_and(|name| whitelist.contains(&name)))
            .collect();
        return Ok(with_required(schema, required));
    }

    if is_tagged_union(&schema) {
        let members = schema
            .members("anyOf")
            .into_iter()
            .map(|member| partial(member, &whitelist))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(schema.with_members("anyOf", members));
    }

    Err(SchemaError::NotObjectOrTaggedUnion {
        found: describe(&schema.to_value()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{closed_object, open_object};

    fn shapes() -> Schema {
        tagged_union(
            "shape",
            [
                (
                    "rectangle",
                    closed_object([("height", type_("number")), ("width", type_("number"))]),
                ),
                (
                    "circle",
                    closed_object([
                        (
                            "center",
                            closed_object([("x", type_("number")), ("y", type_("number"))]),
                        ),
                        ("radius", type_("number")),
                    ]),
                ),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_any_of() {
        assert_eq!(
            any_of([type_("string"), type_("integer")]).to_value(),
            json!({"anyOf": [{"type": "string"}, {"type": "integer"}]})
        );
    }

    #[test]
    fn test_nullable_wraps_non_unions() {
        assert_eq!(
            nullable(Some(type_("string"))).to_value(),
            json!({"anyOf": [{"type": "string"}, {"type": "null"}]})
        );
        assert_eq!(
            nullable(None).to_value(),
            json!({"anyOf": [{}, {"type": "null"}]})
        );
    }

    #[test]
    fn test_nullable_appends_to_unions() {
        let u = any_of([type_("string"), type_("integer")]);
        assert_eq!(
            nullable(Some(u)).to_value(),
            json!({"anyOf": [{"type": "string"}, {"type": "integer"}, {"type": "null"}]})
        );
    }

    #[test]
    fn test_nullable_recognises_type_lists() {
        let u = any_of([type_(vec!["string", "null"])]);
        assert_eq!(nullable(Some(u.clone())), u);
    }

    #[test]
    fn test_nullable_idempotent_for_tagged_unions() {
        let once = nullable(Some(shapes()));
        assert_eq!(once, nullable(Some(once.clone())));
    }

    #[test]
    fn test_tagged_union_injects_tag() {
        let u = shapes();
        let members = u.members("anyOf");
        assert_eq!(members.len(), 2);
        let rect = &members[0];
        assert_eq!(
            rect.lookup(&["properties", "shape"]),
            Some(&json!({"type": "string", "const": "rectangle"}))
        );
        assert_eq!(rect.get("required"), Some(&json!(["height", "width", "shape"])));
        assert_eq!(rect.get("additionalProperties"), Some(&json!(false)));

        let tag = get_metadata::<TaggedUnion>(&u).unwrap();
        assert_eq!(tag.tag_property_name, "shape");
        assert_eq!(tag.tag_property_description, json!({"type": "string"}));
    }

    #[test]
    fn test_tagged_union_custom_description() {
        let desc = type_("string").with_description("kind of value");
        let u = tagged_union("kind", [("a", open_object([("v", type_("number"))]))], Some(desc))
            .unwrap();
        assert_eq!(
            u.lookup(&["anyOf", "0", "properties", "kind"]),
            Some(&json!({"type": "string", "description": "kind of value", "const": "a"}))
        );
    }

    #[test]
    fn test_tagged_union_rejects_non_objects() {
        let err = tagged_union("t", [("a", type_("string"))], None).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnObject { combinator: "tagged_union", .. }));
    }

    #[test]
    fn test_tagged_union_rejects_repeated_tag_values() {
        let err = tagged_union(
            "shape",
            [
                ("circle", closed_object([("radius", type_("number"))])),
                ("circle", closed_object([("diameter", type_("number"))])),
            ],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateTag {
                tag: "shape".to_string(),
                value: "circle".to_string(),
            }
        );
    }

    #[test]
    fn test_partial_object() {
        let s = open_object([("a", type_("integer")), ("b", type_("string"))]);
        assert!(partial(s.clone(), &[]).unwrap().get("required").is_none());
        assert_eq!(partial(s, &["a", "zzz"]).unwrap().get("required"), Some(&json!(["a"])));
    }

    #[test]
    fn test_partial_tagged_union_keeps_tag() {
        let p = partial(shapes(), &["height"]).unwrap();
        let members = p.members("anyOf");
        assert_eq!(members[0].get("required"), Some(&json!(["height", "shape"])));
        assert_eq!(members[1].get("required"), Some(&json!(["shape"])));
        assert!(get_metadata::<TaggedUnion>(&p).is_some());
    }

    #[test]
    fn test_partial_untagged_object_union() {
        let u = any_of([open_object([("a", type_("number"))])]);
        let p = partial(u, &[]).unwrap();
        assert!(p.members("anyOf")[0].get("required").is_none());
    }

    #[test]
    fn test_partial_rejects_other_fragments() {
        let err = partial(type_("string"), &[]).unwrap_err();
        assert!(matches!(err, SchemaError::NotObjectOrTaggedUnion { .. }));
        let err = partial(any_of([type_("string")]), &[]).unwrap_err();
        assert!(matches!(err, SchemaError::NotObjectOrTaggedUnion { .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::object::{closed_object, open_object, optional};
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Schema> {
        prop_oneof![
            Just(type_("string")),
            Just(type_("number")),
            Just(type_("boolean")),
            Just(optional(type_("integer"))),
        ]
    }

    fn object_fragment() -> impl Strategy<Value = Schema> {
        (prop::collection::btree_map("[a-e]", leaf(), 0..5), any::<bool>()).prop_map(
            |(props, closed)| {
                if closed {
                    closed_object(props)
                } else {
                    open_object(props)
                }
            },
        )
    }

    fn tagged() -> impl Strategy<Value = Schema> {
        prop::collection::btree_map("[p-t]{1,3}", object_fragment(), 1..4)
            .prop_map(|variants| tagged_union("kind", variants, None).unwrap_or_default())
    }

    fn keep_list() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]|kind", 0..3)
    }

    proptest! {
        /// `partial` is idempotent on objects.
        #[test]
        fn partial_object_idempotent(s in object_fragment(), keep in keep_list()) {
            let keep: Vec<&str> = keep.iter().map(String::as_str).collect();
            let once = partial(s, &keep).unwrap();
            let twice = partial(once.clone(), &keep).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// `partial` is idempotent on tagged unions and keeps the tag required.
        #[test]
        fn partial_tagged_idempotent(u in tagged(), keep in keep_list()) {
            let keep: Vec<&str> = keep.iter().map(String::as_str).collect();
            let once = partial(u, &keep).unwrap();
            let twice = partial(once.clone(), &keep).unwrap();
            for member in once.members("anyOf") {
                prop_assert!(seq(member.get("required").unwrap_or(&Value::Null))
                    .contains(&json!("kind")));
            }
            prop_assert_eq!(once, twice);
        }

        /// `nullable` is idempotent on unions.
        #[test]
        fn nullable_idempotent(u in tagged()) {
            let once = nullable(Some(u));
            prop_assert_eq!(nullable(Some(once.clone())), once);
        }
    }
}
