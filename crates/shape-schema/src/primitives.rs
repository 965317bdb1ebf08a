//! # Primitive Fragments
//!
//! Leaf builders: type wrappers, enumerations, references into a
//! document's `definitions`, and the document envelope itself.

use serde_json::Value;
use shape_core::{Schema, ValueKind};

/// Meta-schema URI written into `$schema` by [`base_schema`].
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Prefix of the `$id` written by [`base_schema`].
pub const DEFAULT_ID_BASE: &str = "https://shape-stack.github.io/schema/";

/// Argument of [`type_`]: a kind name, a list of kind names, or a fragment
/// that is passed through unchanged.
#[derive(Debug, Clone)]
pub enum TypeArg {
    /// A single kind name, e.g. `"string"`.
    Kind(String),
    /// Several kind names, e.g. `["string", "null"]`.
    Kinds(Vec<String>),
    /// An already-built fragment.
    Schema(Schema),
}

impl From<&str> for TypeArg {
    fn from(kind: &str) -> Self {
        Self::Kind(kind.to_string())
    }
}

impl From<String> for TypeArg {
    fn from(kind: String) -> Self {
        Self::Kind(kind)
    }
}

impl From<ValueKind> for TypeArg {
    fn from(kind: ValueKind) -> Self {
        Self::Kind(kind.as_str().to_string())
    }
}

impl From<Vec<&str>> for TypeArg {
    fn from(kinds: Vec<&str>) -> Self {
        Self::Kinds(kinds.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for TypeArg {
    fn from(kinds: Vec<String>) -> Self {
        Self::Kinds(kinds)
    }
}

impl From<Schema> for TypeArg {
    fn from(schema: Schema) -> Self {
        Self::Schema(schema)
    }
}

/// `{"type": t}` for kind names; fragments pass through unchanged.
pub fn type_(t: impl Into<TypeArg>) -> Schema {
    match t.into() {
        TypeArg::Kind(kind) => Schema::new().with("type", kind),
        TypeArg::Kinds(kinds) => Schema::new().with("type", kinds),
        TypeArg::Schema(schema) => schema,
    }
}

/// The empty fragment: every value matches.
pub fn any() -> Schema {
    Schema::new()
}

/// A string restricted to the given values.
pub fn enum_of<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    type_("string").with("enum", values)
}

/// `{"$ref": "#/definitions/<name>"}`.
pub fn reference(name: &str) -> Schema {
    Schema::new().with("$ref", format!("#/definitions/{name}"))
}

/// A document envelope carrying `$schema`, `$id`, `title` and `definitions`.
pub fn base_schema<I, K>(name: &str, definitions: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    base_schema_with_id_base(DEFAULT_ID_BASE, name, definitions)
}

/// [`base_schema`] with a custom `$id` prefix.
pub fn base_schema_with_id_base<I, K>(id_base: &str, name: &str, definitions: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Schema::new()
        .with("$schema", SCHEMA_DIALECT)
        .with("type", "object")
        .with("$id", format!("{id_base}{name}.schema.json"))
        .with("title", name)
        .with_children("definitions", definitions)
}

/// `{"typeof": kind}`: checks the runtime kind name of a value using the
/// `typeof` extension keyword. Accepts `string`, `number`, `boolean`,
/// `object` and `undefined`; `null` and arrays report `object`.
pub fn runtime_type(kind: &str) -> Schema {
    Schema::new().with("typeof", kind)
}
