//! Traversal of every subschema position of a JSON Schema document.

use serde_json::{Map, Value};
use shape_core::util::join_pointer;

/// Keywords whose value maps names to subschemas.
const SCHEMA_MAPS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependencies",
    "dependentSchemas",
];

/// Keywords whose value is a list of subschemas.
const SCHEMA_LISTS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value is a single subschema. `items` may also be a list.
const SCHEMA_SINGLES: &[&str] = &[
    "items",
    "additionalProperties",
    "additionalItems",
    "unevaluatedProperties",
    "unevaluatedItems",
    "not",
    "if",
    "then",
    "else",
    "contains",
    "propertyNames",
];

/// Call `f` with the pointer and keywords of every object schema in
/// `document`, parents before children. Data-valued keywords (`enum`,
/// `const`, `default`, `examples`) are not entered.
pub(crate) fn for_each_schema<'a, E, F>(document: &'a Value, f: &mut F) -> Result<(), E>
where
    F: FnMut(&str, &'a Map<String, Value>) -> Result<(), E>,
{
    visit(document, String::new(), f)
}

fn visit<'a, E, F>(value: &'a Value, pointer: String, f: &mut F) -> Result<(), E>
where
    F: FnMut(&str, &'a Map<String, Value>) -> Result<(), E>,
{
    let Value::Object(map) = value else {
        return Ok(());
    };
    f(&pointer, map)?;

    for &keyword in SCHEMA_MAPS {
        if let Some(Value::Object(children)) = map.get(keyword) {
            for (name, child) in children {
                visit(child, join_pointer(&pointer, &[keyword, name.as_str()]), f)?;
            }
        }
    }
    for keyword in SCHEMA_LISTS.iter().copied().chain(std::iter::once("items")) {
        if let Some(Value::Array(members)) = map.get(keyword) {
            for (index, member) in members.iter().enumerate() {
                visit(member, join_pointer(&pointer, &[keyword, &index.to_string()]), f)?;
            }
        }
    }
    for &keyword in SCHEMA_SINGLES {
        if let Some(child @ Value::Object(_)) = map.get(keyword) {
            visit(child, join_pointer(&pointer, &[keyword]), f)?;
        }
    }
    Ok(())
}

/// Decode one JSON Pointer token.
pub(crate) fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;

    fn pointers(document: &Value) -> Vec<String> {
        let mut seen = Vec::new();
        for_each_schema::<Infallible, _>(document, &mut |pointer, _| {
            seen.push(pointer.to_string());
            Ok(())
        })
        .unwrap();
        seen
    }

    #[test]
    fn test_visits_nested_positions() {
        let doc = json!({
            "properties": {"a/b": {"items": {"type": "string"}}},
            "anyOf": [{"type": "null"}, true],
            "items": [{}, {}],
            "not": {"enum": [{"type": "object"}]},
            "definitions": {"x": {"additionalProperties": {}}}
        });
        assert_eq!(
            pointers(&doc),
            vec![
                "",
                "/properties/a~1b",
                "/properties/a~1b/items",
                "/definitions/x",
                "/definitions/x/additionalProperties",
                "/anyOf/0",
                "/items/0",
                "/items/1",
                "/not",
            ]
        );
    }

    #[test]
    fn test_stops_on_error() {
        let doc = json!({"properties": {"a": {}, "b": {}}});
        let mut count = 0;
        let result = for_each_schema(&doc, &mut |pointer, _| {
            count += 1;
            if pointer == "/properties/a" {
                Err(pointer.to_string())
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("/properties/a".to_string()));
        assert_eq!(count, 2);
    }

    #[test]
    fn test_unescape_token() {
        assert_eq!(unescape_token("a~1b~0c"), "a/b~c");
        assert_eq!(unescape_token("required"), "required");
    }
}
