//! # Schema Fragments
//!
//! [`Schema`] is a JSON Schema document (always a JSON object) paired with
//! a metadata side table. The table maps the JSON Pointer of a node,
//! relative to the fragment root (`""` is the fragment itself), to its
//! [`Metadata`] record.
//!
//! ## Composition rules
//!
//! - Embedding a fragment under another one (`with_child`, `with_children`,
//!   `with_members`) re-keys the embedded metadata beneath the embedding
//!   pointer, so nested records follow their nodes.
//! - Overwriting a keyword discards every record beneath it.
//! - [`Schema::merged`] is the plain structural merge. It keeps the nested
//!   records of the keywords it copies and drops root records; builders
//!   that must preserve root metadata re-attach it explicitly.
//! - `Serialize` and `PartialEq` see the document only.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{describe, SchemaError};
use crate::metadata::{set_metadata, Metadata, ValidatorConfig};
use crate::options::ValidatorOptions;
use crate::util::{get_in, join_pointer, merge_objects, pointer_has_prefix, trim_object};

/// A schema fragment: a JSON object document plus node-scoped metadata.
#[derive(Clone, Default)]
pub struct Schema {
    doc: Map<String, Value>,
    meta: BTreeMap<String, Metadata>,
}

impl Schema {
    /// The empty fragment, which accepts every value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object without metadata.
    pub fn from_map(doc: Map<String, Value>) -> Self {
        Self {
            doc,
            meta: BTreeMap::new(),
        }
    }

    /// Wrap a JSON value. Anything but an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(doc) => Ok(Self::from_map(doc)),
            other => Err(SchemaError::NotAFragment {
                found: describe(&other),
            }),
        }
    }

    /// The JSON document.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.doc
    }

    /// A copy of the JSON document as a [`Value`].
    pub fn to_value(&self) -> Value {
        Value::Object(self.doc.clone())
    }

    /// The JSON document as a [`Value`], dropping metadata.
    pub fn into_value(self) -> Value {
        Value::Object(self.doc)
    }

    /// Split into document and metadata table.
    pub fn into_parts(self) -> (Map<String, Value>, BTreeMap<String, Metadata>) {
        (self.doc, self.meta)
    }

    /// A top-level keyword.
    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.doc.get(keyword)
    }

    /// A nested value, addressed by reference tokens.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        get_in(self.doc.get(*first)?, rest)
    }

    /// Returns `true` for the empty fragment.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    // -----------------------------------------------------------------------
    // Metadata access
    // -----------------------------------------------------------------------

    /// The root metadata record.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.meta.get("")
    }

    /// The metadata record of the node at `pointer`.
    pub fn metadata_at(&self, pointer: &str) -> Option<&Metadata> {
        self.meta.get(pointer)
    }

    /// Every metadata record with its node pointer, in pointer order.
    pub fn metadata_entries(&self) -> impl Iterator<Item = (&str, &Metadata)> {
        self.meta.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The record of the node at `pointer`, created on demand.
    pub fn metadata_mut(&mut self, pointer: &str) -> &mut Metadata {
        self.meta.entry(pointer.to_string()).or_default()
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Set a plain keyword, discarding metadata beneath it.
    pub fn with(mut self, keyword: &str, value: impl Into<Value>) -> Self {
        self.clear_meta_under(&join_pointer("", &[keyword]));
        self.doc.insert(keyword.to_string(), value.into());
        self
    }

    /// Remove a keyword and the metadata beneath it.
    pub fn without(mut self, keyword: &str) -> Self {
        self.clear_meta_under(&join_pointer("", &[keyword]));
        self.doc.remove(keyword);
        self
    }

    /// Embed `child` at `path`, creating intermediate objects as needed.
    /// An empty path replaces the whole fragment.
    pub fn with_child(mut self, path: &[&str], child: Schema) -> Self {
        if path.is_empty() {
            return child;
        }
        let prefix = join_pointer("", path);
        self.clear_meta_under(&prefix);
        let (doc, meta) = child.into_parts();
        insert_at(&mut self.doc, path, Value::Object(doc));
        self.adopt(&prefix, meta);
        self
    }

    /// Set `keyword` to an object of child fragments (`properties`,
    /// `definitions`, ...).
    pub fn with_children<I, K>(mut self, keyword: &str, children: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let base = join_pointer("", &[keyword]);
        self.clear_meta_under(&base);
        let mut map = Map::new();
        for (name, child) in children {
            let name = name.into();
            let (doc, meta) = child.into_parts();
            self.adopt(&join_pointer(&base, &[&name]), meta);
            map.insert(name, Value::Object(doc));
        }
        self.doc.insert(keyword.to_string(), Value::Object(map));
        self
    }

    /// Set `keyword` to an array of child fragments (`anyOf`, tuple `items`).
    pub fn with_members<I>(mut self, keyword: &str, members: I) -> Self
    where
        I: IntoIterator<Item = Schema>,
    {
        let base = join_pointer("", &[keyword]);
        self.clear_meta_under(&base);
        let mut items = Vec::new();
        for (index, member) in members.into_iter().enumerate() {
            let (doc, meta) = member.into_parts();
            self.adopt(&join_pointer(&base, &[&index.to_string()]), meta);
            items.push(Value::Object(doc));
        }
        self.doc.insert(keyword.to_string(), Value::Array(items));
        self
    }

    /// Append a fragment to the array under `keyword`, creating it if needed.
    pub fn push_member(mut self, keyword: &str, member: Schema) -> Self {
        if !matches!(self.doc.get(keyword), Some(Value::Array(_))) {
            self.clear_meta_under(&join_pointer("", &[keyword]));
            self.doc.insert(keyword.to_string(), Value::Array(Vec::new()));
        }
        let (doc, meta) = member.into_parts();
        if let Some(Value::Array(items)) = self.doc.get_mut(keyword) {
            let index = items.len().to_string();
            items.push(Value::Object(doc));
            self.adopt(&join_pointer("", &[keyword, &index]), meta);
        }
        self
    }

    /// Set `description`.
    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with("description", Value::String(description.into()))
    }

    /// Attach validator options to the fragment root.
    pub fn with_validator_options(self, options: ValidatorOptions) -> Self {
        set_metadata::<ValidatorConfig>(self, Some(options))
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// The sub-fragment at `path`, with its metadata re-rooted. `None` if
    /// the path does not lead to a JSON object.
    pub fn at(&self, path: &[&str]) -> Option<Schema> {
        let doc = match self.lookup(path) {
            Some(Value::Object(map)) => map.clone(),
            _ if path.is_empty() => self.doc.clone(),
            _ => return None,
        };
        let prefix = join_pointer("", path);
        let meta = self
            .meta
            .iter()
            .filter(|(pointer, _)| pointer_has_prefix(pointer, &prefix))
            .map(|(pointer, m)| (pointer[prefix.len()..].to_string(), m.clone()))
            .collect();
        Some(Schema { doc, meta })
    }

    /// The object-valued entries of the array under `keyword`, as fragments.
    pub fn members(&self, keyword: &str) -> Vec<Schema> {
        let len = match self.doc.get(keyword) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        };
        (0..len)
            .filter_map(|i| self.at(&[keyword, &i.to_string()]))
            .collect()
    }

    /// The entries of the object under `keyword`, as named fragments.
    pub fn children(&self, keyword: &str) -> Vec<(String, Schema)> {
        let names: Vec<String> = match self.doc.get(keyword) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        names
            .into_iter()
            .filter_map(|name| {
                let child = self.at(&[keyword, &name])?;
                Some((name, child))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Structural merge
    // -----------------------------------------------------------------------

    /// Shallow left-to-right merge of top-level keywords. Later fragments
    /// win, `null` values are skipped. Metadata beneath each copied keyword
    /// travels with it; root metadata is dropped.
    pub fn merged<I>(parts: I) -> Schema
    where
        I: IntoIterator<Item = Schema>,
    {
        let parts: Vec<_> = parts.into_iter().map(Schema::into_parts).collect();
        let mut out = Schema::from_map(merge_objects(parts.iter().map(|(doc, _)| Some(doc))));
        for (doc, meta) in &parts {
            for keyword in trim_object(doc).keys() {
                let prefix = join_pointer("", &[keyword.as_str()]);
                out.clear_meta_under(&prefix);
                for (pointer, m) in meta {
                    if pointer_has_prefix(pointer, &prefix) {
                        out.meta.insert(pointer.clone(), m.clone());
                    }
                }
            }
        }
        out
    }

    fn clear_meta_under(&mut self, prefix: &str) {
        self.meta.retain(|pointer, _| !pointer_has_prefix(pointer, prefix));
    }

    fn adopt(&mut self, prefix: &str, meta: BTreeMap<String, Metadata>) {
        for (pointer, m) in meta {
            if !m.is_empty() {
                self.meta.insert(format!("{prefix}{pointer}"), m);
            }
        }
    }
}

fn insert_at(doc: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = doc;
    for token in parents {
        let slot = current
            .entry(token.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot.as_object_mut() {
            Some(map) => current = map,
            None => return,
        }
    }
    current.insert(last.to_string(), value);
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.doc == other.doc
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointers: Vec<&String> = self.meta.keys().collect();
        f.debug_struct("Schema")
            .field("doc", &self.doc)
            .field("metadata", &pointers)
            .finish()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.doc).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.doc.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Schema::from_map)
    }
}

impl From<Map<String, Value>> for Schema {
    fn from(doc: Map<String, Value>) -> Self {
        Schema::from_map(doc)
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Schema::from_value(value)
    }
}
