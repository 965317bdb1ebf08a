//! # JSON Utilities
//!
//! Small, pure helpers over `serde_json` values used by the combinator
//! algebra and the compiler. None of them mutate their inputs.
//!
//! ## Absence
//!
//! JSON `null` is treated as "absent" throughout: merging skips `null`
//! values, `seq(null)` is empty, and `concat` ignores `null` arguments.
//! This keeps generated schema documents minimal and comparable.

use serde_json::{Map, Value};

/// Drop every `null`-valued entry from an object.
pub fn trim_object(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Shallow left-to-right merge. Later maps win on key collisions; `null`
/// values and absent maps are ignored.
pub fn merge_objects<'a, I>(maps: I) -> Map<String, Value>
where
    I: IntoIterator<Item = Option<&'a Map<String, Value>>>,
{
    let mut out = Map::new();
    for map in maps.into_iter().flatten() {
        for (k, v) in trim_object(map) {
            out.insert(k, v);
        }
    }
    out
}

/// Order-preserving de-duplication.
pub fn dedupe<T, I>(items: I) -> Vec<T>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Coerce a value into a sequence: `null` is empty, arrays are returned
/// as-is, anything else becomes a one-element sequence.
pub fn seq(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Flatten arrays one level deep, skipping `null`.
pub fn concat<'a, I>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().flat_map(seq).collect()
}

/// Safe nested lookup. Each path step indexes an object by key or an
/// array by position; a missing step yields `None`. An empty path returns
/// the value itself.
pub fn get_in<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |acc, key| match acc {
        Value::Object(map) => map.get(*key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Empty objects and arrays become `None`.
pub fn null_if_empty(value: Value) -> Option<Value> {
    match &value {
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        _ => Some(value),
    }
}

/// Escape a single JSON Pointer reference token (RFC 6901).
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Append reference tokens to a JSON Pointer.
pub fn join_pointer(base: &str, tokens: &[&str]) -> String {
    let mut out = base.to_string();
    for token in tokens {
        out.push('/');
        out.push_str(&escape_pointer_token(token));
    }
    out
}

/// Returns `true` if `pointer` equals `prefix` or lies beneath it.
pub fn pointer_has_prefix(pointer: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || pointer == prefix
        || (pointer.starts_with(prefix) && pointer[prefix.len()..].starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_seq() {
        assert_eq!(seq(&json!(1)), vec![json!(1)]);
        assert_eq!(seq(&json!(true)), vec![json!(true)]);
        assert_eq!(seq(&json!([1, 2, 3])), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(seq(&json!({"a": 1})), vec![json!({"a": 1})]);
        assert_eq!(seq(&json!("asdf")), vec![json!("asdf")]);
        assert!(seq(&Value::Null).is_empty());
    }

    #[test]
    fn test_dedupe() {
        assert!(dedupe(Vec::<i32>::new()).is_empty());
        assert_eq!(dedupe(vec![1, 1, 2, 3, 1]), vec![1, 2, 3]);
        assert_eq!(dedupe(vec!["a", "b", "a", "c", "d"]), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_trim_object() {
        assert_eq!(trim_object(&Map::new()), Map::new());
        assert_eq!(trim_object(&obj(json!({"a": 1}))), obj(json!({"a": 1})));
        assert_eq!(trim_object(&obj(json!({"a": 1, "b": null}))), obj(json!({"a": 1})));
    }

    #[test]
    fn test_merge_objects() {
        assert_eq!(merge_objects(Vec::new()), Map::new());

        let (a, b, c) = (obj(json!({"a": 1})), obj(json!({"b": 2})), obj(json!({"c": 3})));
        assert_eq!(
            merge_objects([Some(&a), Some(&b), Some(&c)]),
            obj(json!({"a": 1, "b": 2, "c": 3}))
        );

        let (a1, a2, a3) = (obj(json!({"a": 1})), obj(json!({"a": 2})), obj(json!({"a": 3})));
        assert_eq!(merge_objects([Some(&a1), Some(&a2), Some(&a3)]), obj(json!({"a": 3})));

        let (b_null, a_null) = (obj(json!({"b": null})), obj(json!({"a": null})));
        assert_eq!(
            merge_objects([Some(&a1), Some(&b_null), Some(&a_null)]),
            obj(json!({"a": 1}))
        );
        assert_eq!(merge_objects([None, Some(&a1), None, Some(&a_null)]), obj(json!({"a": 1})));
    }

    #[test]
    fn test_get_in() {
        let flat = json!({"a": 2, "b": 3});
        assert_eq!(get_in(&flat, &["a"]), Some(&json!(2)));
        assert_eq!(get_in(&flat, &["c"]), None);

        let nested = json!({"a": {"b": 1}});
        assert_eq!(get_in(&nested, &["a", "b"]), Some(&json!(1)));
        assert_eq!(get_in(&nested, &["c"]), None);
        assert_eq!(get_in(&nested, &["a"]), Some(&json!({"b": 1})));
        assert_eq!(get_in(&Value::Null, &["c"]), None);
        assert_eq!(get_in(&json!({"a": 1}), &[]), Some(&json!({"a": 1})));
        assert_eq!(get_in(&json!([0, {"a": 1}]), &["1"]), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_concat() {
        assert!(concat(Vec::<&Value>::new()).is_empty());
        assert_eq!(concat([&json!(1)]), vec![json!(1)]);
        assert_eq!(concat([&json!([1])]), vec![json!(1)]);
        assert_eq!(concat([&json!([1]), &Value::Null]), vec![json!(1)]);
        assert_eq!(concat([&json!([1]), &json!([])]), vec![json!(1)]);
        assert_eq!(concat([&json!([1]), &json!(2)]), vec![json!(1), json!(2)]);
        assert_eq!(concat([&json!(1), &json!(2)]), vec![json!(1), json!(2)]);
        assert_eq!(concat([&json!([1]), &json!([2])]), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_null_if_empty() {
        assert_eq!(null_if_empty(json!({})), None);
        assert_eq!(null_if_empty(json!([])), None);
        assert_eq!(null_if_empty(json!(["a"])), Some(json!(["a"])));
        assert_eq!(null_if_empty(json!(0)), Some(json!(0)));
    }

    #[test]
    fn test_pointer_helpers() {
        assert_eq!(join_pointer("", &["properties", "a/b"]), "/properties/a~1b");
        assert_eq!(escape_pointer_token("m~n"), "m~0n");
        assert!(pointer_has_prefix("/properties/a", ""));
        assert!(pointer_has_prefix("/properties/a", "/properties"));
        assert!(pointer_has_prefix("/properties", "/properties"));
        assert!(!pointer_has_prefix("/propertiesX", "/properties"));
    }
}
