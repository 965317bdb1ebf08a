//! # Transform Plan
//!
//! A compiled, arena-allocated view of the schema positions a value can
//! reach: `properties`, `patternProperties`, `additionalProperties`, list
//! and tuple `items`, `additionalItems`, `allOf`, `anyOf`/`oneOf`,
//! `then`/`else` and local `$ref`s. Each node carries its resolved
//! transform chain. A `transform` under any other applicator (`not`,
//! `if`, `contains`, `propertyNames`, `dependencies`, ...) fails
//! compilation.
//!
//! ## Transform pass
//!
//! The pass takes the value by ownership and returns the rewritten value.
//! Children are transformed before the node's own chain. A node is
//! *active* when it or anything it reaches carries transforms; inactive
//! subtrees are skipped.
//!
//! Every matcher decision (union branch, `if` condition, key pattern for
//! `additionalProperties`) is taken on the value as it was before the
//! pass, the same value the structural matcher saw.
//!
//! For unions, only branches the structural matcher accepts are visited.
//! The first accepted branch is selected if it is inactive or its chains
//! report no failure; failures of rejected branches surface only when no
//! branch is selected.
//!
//! ## Pruning
//!
//! With `remove_additional`, undeclared properties of closed objects are
//! removed before matching. Union branches and conditionals are never
//! pruned, since the matcher has not yet picked one.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use shape_core::util::join_pointer;
use shape_core::{Schema, TransformContext, TransformFn, TransformIssue, TransformTable, Transforms};

use crate::error::{CompileError, ValidatorError};
use crate::outcome::ValidationIssue;
use crate::walk::for_each_schema;
use crate::Matcher;

type NodeId = usize;

/// Applicators whose subschemas the transform pass never enters.
const UNVISITED_SINGLES: &[&str] = &[
    "not",
    "if",
    "contains",
    "propertyNames",
    "unevaluatedProperties",
    "unevaluatedItems",
];

/// Like [`UNVISITED_SINGLES`], for keywords mapping names to subschemas.
const UNVISITED_MAPS: &[&str] = &["dependencies", "dependentSchemas"];

#[derive(Default)]
enum Items {
    #[default]
    None,
    List(NodeId),
    Tuple(Vec<NodeId>),
}

struct Branch {
    node: NodeId,
    matcher: Option<Matcher>,
}

/// A `patternProperties` entry.
struct Pattern {
    source: String,
    node: NodeId,
    matcher: Option<Matcher>,
}

impl Pattern {
    fn matches(&self, key: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|m| m.is_valid(&Value::String(key.to_string())))
    }
}

/// `if` with its `then` and `else` subschemas.
struct Conditional {
    pointer: String,
    then: Option<NodeId>,
    otherwise: Option<NodeId>,
    matcher: Option<Matcher>,
}

#[derive(Default)]
struct Node {
    pointer: String,
    transforms: Vec<(String, TransformFn)>,
    properties: Vec<(String, NodeId)>,
    patterns: Vec<Pattern>,
    additional: Option<NodeId>,
    closed: bool,
    items: Items,
    additional_items: Option<NodeId>,
    all_of: Vec<NodeId>,
    branches: Vec<Branch>,
    conditional: Option<Conditional>,
    reference: Option<NodeId>,
    active: bool,
}

impl Node {
    fn children(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.properties.iter().map(|(_, id)| *id).collect();
        out.extend(self.patterns.iter().map(|p| p.node));
        out.extend(self.additional);
        match &self.items {
            Items::None => {}
            Items::List(id) => out.push(*id),
            Items::Tuple(ids) => out.extend(ids),
        }
        out.extend(self.additional_items);
        out.extend(&self.all_of);
        out.extend(self.branches.iter().map(|b| b.node));
        if let Some(cond) = &self.conditional {
            out.extend(cond.then);
            out.extend(cond.otherwise);
        }
        out.extend(self.reference);
        out
    }

    fn declares(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    /// Whether `name` is covered by `properties` or `patternProperties`,
    /// i.e. not subject to `additionalProperties`.
    fn covers(&self, name: &str) -> bool {
        self.declares(name) || self.patterns.iter().any(|p| p.matches(name))
    }

    fn item_schema(&self, index: usize) -> Option<NodeId> {
        match &self.items {
            Items::List(id) => Some(*id),
            Items::Tuple(ids) => ids.get(index).copied().or(self.additional_items),
            Items::None => None,
        }
    }
}

/// Where a value sits in the validated document. `origin` is the value at
/// this position before the pass started.
struct Position<'p> {
    path: &'p str,
    key: Option<&'p str>,
    origin: &'p Value,
}

/// The compiled transform plan of one schema.
pub(crate) struct Plan {
    document: Value,
    nodes: Vec<Node>,
    verbose: bool,
}

impl Plan {
    /// Build the plan for `schema`. Transform identifiers resolve against
    /// `transforms` first, then the node's own [`Transforms`] metadata.
    /// `compile_matcher` builds the matchers for union branches, `if`
    /// conditions and property-name patterns.
    pub(crate) fn compile<F>(
        schema: &Schema,
        document: Value,
        transforms: &TransformTable,
        verbose: bool,
        mut compile_matcher: F,
    ) -> Result<Self, CompileError>
    where
        F: FnMut(&Value) -> Result<Matcher, CompileError>,
    {
        let mut builder = Builder {
            schema,
            document: &document,
            transforms,
            nodes: Vec::new(),
            by_pointer: HashMap::new(),
        };
        builder.node(String::new())?;
        let mut nodes = builder.nodes;

        mark_active(&mut nodes);

        for id in 0..nodes.len() {
            // Pattern matchers are also needed for pruning and for the
            // `additionalProperties` key split, so they are always built.
            for pattern in &mut nodes[id].patterns {
                let doc = json!({"type": "string", "pattern": pattern.source});
                pattern.matcher = Some(compile_matcher(&doc)?);
            }

            if nodes[id].branches.iter().any(|b| nodes[b.node].active) {
                let pointers: Vec<String> =
                    nodes[id].branches.iter().map(|b| nodes[b.node].pointer.clone()).collect();
                for (index, pointer) in pointers.iter().enumerate() {
                    let matcher = compile_matcher(&branch_document(&document, pointer))?;
                    nodes[id].branches[index].matcher = Some(matcher);
                }
            }

            let condition = nodes[id].conditional.as_ref().and_then(|cond| {
                let active = cond.then.into_iter().chain(cond.otherwise).any(|n| nodes[n].active);
                active.then(|| cond.pointer.clone())
            });
            if let Some(pointer) = condition {
                let matcher = compile_matcher(&branch_document(&document, &pointer))?;
                if let Some(cond) = nodes[id].conditional.as_mut() {
                    cond.matcher = Some(matcher);
                }
            }
        }

        Ok(Self {
            document,
            nodes,
            verbose,
        })
    }

    /// The compiled schema document.
    pub(crate) fn document(&self) -> &Value {
        &self.document
    }

    /// Number of nodes carrying a transform chain.
    pub(crate) fn transform_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| !n.transforms.is_empty()).count()
    }

    /// Run the transform pass over `value`, appending reported failures to `issues`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::TransformFailed`] when a transform returns `Err`.
    pub(crate) fn apply(
        &self,
        value: Value,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<Value, ValidatorError> {
        if !self.nodes.first().is_some_and(|root| root.active) {
            return Ok(value);
        }
        let origin = value.clone();
        let root = Position {
            path: "",
            key: None,
            origin: &origin,
        };
        self.apply_node(0, value, &root, issues, &mut Vec::new())
    }

    /// Remove undeclared properties of closed objects from `value`.
    pub(crate) fn prune(&self, value: &mut Value) {
        self.prune_node(0, value, &mut Vec::new());
    }

    fn apply_node(
        &self,
        id: NodeId,
        mut value: Value,
        at: &Position<'_>,
        issues: &mut Vec<ValidationIssue>,
        seen: &mut Vec<NodeId>,
    ) -> Result<Value, ValidatorError> {
        let node = &self.nodes[id];
        if !node.active || seen.contains(&id) {
            return Ok(value);
        }
        seen.push(id);

        match &mut value {
            Value::Object(map) => self.apply_properties(node, map, at, issues)?,
            Value::Array(items) => self.apply_items(node, items, at, issues)?,
            _ => {}
        }

        for &sub in node.all_of.iter().chain(node.reference.iter()) {
            value = self.apply_node(sub, value, at, issues, seen)?;
        }

        if node.branches.iter().any(|b| self.nodes[b.node].active) {
            value = self.apply_branches(node, value, at, issues, seen)?;
        }

        if let Some(cond) = &node.conditional {
            let taken = match &cond.matcher {
                Some(m) if m.is_valid(at.origin) => cond.then,
                Some(_) => cond.otherwise,
                None => None,
            };
            if let Some(sub) = taken {
                value = self.apply_node(sub, value, at, issues, seen)?;
            }
        }

        self.run_chain(node, value, at, issues)
    }

    fn apply_properties(
        &self,
        node: &Node,
        map: &mut Map<String, Value>,
        at: &Position<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<(), ValidatorError> {
        for (name, child) in &node.properties {
            if let Some(slot) = map.get_mut(name) {
                *slot = self.apply_child(*child, std::mem::take(slot), at, name, issues)?;
            }
        }
        for pattern in &node.patterns {
            for (name, slot) in map.iter_mut() {
                if pattern.matches(name) {
                    *slot = self.apply_child(pattern.node, std::mem::take(slot), at, name, issues)?;
                }
            }
        }
        if let Some(additional) = node.additional {
            for (name, slot) in map.iter_mut() {
                if !node.covers(name) {
                    *slot = self.apply_child(additional, std::mem::take(slot), at, name, issues)?;
                }
            }
        }
        Ok(())
    }

    fn apply_items(
        &self,
        node: &Node,
        items: &mut [Value],
        at: &Position<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<(), ValidatorError> {
        for (index, slot) in items.iter_mut().enumerate() {
            if let Some(schema) = node.item_schema(index) {
                let key = index.to_string();
                *slot = self.apply_child(schema, std::mem::take(slot), at, &key, issues)?;
            }
        }
        Ok(())
    }

    fn apply_child(
        &self,
        id: NodeId,
        value: Value,
        parent: &Position<'_>,
        key: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<Value, ValidatorError> {
        let path = join_pointer(parent.path, &[key]);
        let original = match parent.origin {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        // A position created by an earlier transform has no original.
        let fallback;
        let origin = match original {
            Some(origin) => origin,
            None => {
                fallback = value.clone();
                &fallback
            }
        };
        let at = Position {
            path: &path,
            key: Some(key),
            origin,
        };
        self.apply_node(id, value, &at, issues, &mut Vec::new())
    }

    fn apply_branches(
        &self,
        node: &Node,
        value: Value,
        at: &Position<'_>,
        issues: &mut Vec<ValidationIssue>,
        seen: &[NodeId],
    ) -> Result<Value, ValidatorError> {
        let mut rejected = Vec::new();
        for branch in &node.branches {
            if !branch.matcher.as_ref().map_or(true, |m| m.is_valid(at.origin)) {
                continue;
            }
            if !self.nodes[branch.node].active {
                return Ok(value);
            }
            let mut local = Vec::new();
            let out = self.apply_node(branch.node, value.clone(), at, &mut local, &mut seen.to_vec())?;
            if local.is_empty() {
                return Ok(out);
            }
            rejected.extend(local);
        }
        issues.extend(rejected);
        Ok(value)
    }

    fn run_chain(
        &self,
        node: &Node,
        mut value: Value,
        at: &Position<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Result<Value, ValidatorError> {
        if node.transforms.is_empty() {
            return Ok(value);
        }
        let parent_schema = self.document.pointer(&node.pointer).unwrap_or(&Value::Null);
        let mut reported: Vec<TransformIssue> = Vec::new();
        for (name, transform) in &node.transforms {
            tracing::trace!(transform = %name, path = %at.path, "applying transform");
            let mut ctx = TransformContext::new(name, at.path, at.key, parent_schema, &mut reported);
            value = transform(value, &mut ctx).map_err(|source| ValidatorError::TransformFailed {
                transformation: name.clone(),
                instance_path: at.path.to_string(),
                source,
            })?;
        }

        let schema_path = join_pointer(&node.pointer, &["transform"]);
        for issue in reported {
            issues.push(ValidationIssue {
                keyword: "transform".to_string(),
                instance_path: at.path.to_string(),
                schema_path: schema_path.clone(),
                message: issue.message,
                params: issue.params,
                schema: self.verbose.then(|| parent_schema.get("transform").cloned()).flatten(),
                parent_schema: self.verbose.then(|| parent_schema.clone()),
                data: self.verbose.then(|| value.clone()),
            });
        }
        Ok(value)
    }

    fn prune_node(&self, id: NodeId, value: &mut Value, seen: &mut Vec<NodeId>) {
        if seen.contains(&id) {
            return;
        }
        seen.push(id);
        let node = &self.nodes[id];

        for &sub in node.all_of.iter().chain(node.reference.iter()) {
            self.prune_node(sub, value, seen);
        }

        match value {
            Value::Object(map) => {
                if node.closed {
                    map.retain(|name, _| node.covers(name));
                }
                for (name, child) in &node.properties {
                    if let Some(slot) = map.get_mut(name) {
                        self.prune_node(*child, slot, &mut Vec::new());
                    }
                }
                for pattern in &node.patterns {
                    for (name, slot) in map.iter_mut() {
                        if pattern.matches(name) {
                            self.prune_node(pattern.node, slot, &mut Vec::new());
                        }
                    }
                }
                if let Some(additional) = node.additional {
                    for (name, slot) in map.iter_mut() {
                        if !node.covers(name) {
                            self.prune_node(additional, slot, &mut Vec::new());
                        }
                    }
                }
            }
            Value::Array(items) => {
                for (index, slot) in items.iter_mut().enumerate() {
                    if let Some(schema) = node.item_schema(index) {
                        self.prune_node(schema, slot, &mut Vec::new());
                    }
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

struct Builder<'s> {
    schema: &'s Schema,
    document: &'s Value,
    transforms: &'s TransformTable,
    nodes: Vec<Node>,
    by_pointer: HashMap<String, NodeId>,
}

impl<'s> Builder<'s> {
    fn node(&mut self, pointer: String) -> Result<NodeId, CompileError> {
        if let Some(&id) = self.by_pointer.get(&pointer) {
            return Ok(id);
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            pointer: pointer.clone(),
            ..Node::default()
        });
        self.by_pointer.insert(pointer.clone(), id);

        let document = self.document;
        let Some(Value::Object(map)) = document.pointer(&pointer) else {
            return Ok(id);
        };

        reject_unvisited_transforms(map, &pointer)?;
        let transforms = self.resolve_transforms(map, &pointer)?;

        let mut properties = Vec::new();
        if let Some(Value::Object(props)) = map.get("properties") {
            for name in props.keys() {
                let child = self.node(join_pointer(&pointer, &["properties", name]))?;
                properties.push((name.clone(), child));
            }
        }
        let mut patterns = Vec::new();
        if let Some(Value::Object(props)) = map.get("patternProperties") {
            for source in props.keys() {
                let node = self.node(join_pointer(&pointer, &["patternProperties", source]))?;
                patterns.push(Pattern {
                    source: source.clone(),
                    node,
                    matcher: None,
                });
            }
        }
        let additional = self.single(map, &pointer, "additionalProperties")?;
        let closed = map.get("additionalProperties") == Some(&Value::Bool(false));

        let (items, additional_items) = match (map.get("prefixItems"), map.get("items")) {
            (Some(Value::Array(_)), _) => (
                Items::Tuple(self.list(map, &pointer, "prefixItems")?),
                self.single(map, &pointer, "items")?,
            ),
            (_, Some(Value::Array(_))) => (
                Items::Tuple(self.list(map, &pointer, "items")?),
                self.single(map, &pointer, "additionalItems")?,
            ),
            _ => (
                self.single(map, &pointer, "items")?.map_or(Items::None, Items::List),
                None,
            ),
        };

        let all_of = self.list(map, &pointer, "allOf")?;
        let mut branches = Vec::new();
        for keyword in ["anyOf", "oneOf"] {
            for node in self.list(map, &pointer, keyword)? {
                branches.push(Branch { node, matcher: None });
            }
        }

        // `then` and `else` are ignored by the matcher without an `if`.
        let conditional = match map.get("if") {
            Some(_) => Some(Conditional {
                pointer: join_pointer(&pointer, &["if"]),
                then: self.single(map, &pointer, "then")?,
                otherwise: self.single(map, &pointer, "else")?,
                matcher: None,
            }),
            None => None,
        };

        let reference = match map.get("$ref").and_then(Value::as_str) {
            Some(target) => match target.strip_prefix('#') {
                Some(local) if document.pointer(local).is_some() => Some(self.node(local.to_string())?),
                _ => None,
            },
            None => None,
        };

        let node = &mut self.nodes[id];
        node.transforms = transforms;
        node.properties = properties;
        node.patterns = patterns;
        node.additional = additional;
        node.closed = closed;
        node.items = items;
        node.additional_items = additional_items;
        node.all_of = all_of;
        node.branches = branches;
        node.conditional = conditional;
        node.reference = reference;
        Ok(id)
    }

    fn single(
        &mut self,
        map: &Map<String, Value>,
        pointer: &str,
        keyword: &str,
    ) -> Result<Option<NodeId>, CompileError> {
        match map.get(keyword) {
            Some(Value::Object(_)) => Ok(Some(self.node(join_pointer(pointer, &[keyword]))?)),
            _ => Ok(None),
        }
    }

    fn list(
        &mut self,
        map: &Map<String, Value>,
        pointer: &str,
        keyword: &str,
    ) -> Result<Vec<NodeId>, CompileError> {
        let len = map.get(keyword).and_then(Value::as_array).map_or(0, Vec::len);
        (0..len)
            .map(|index| self.node(join_pointer(pointer, &[keyword, &index.to_string()])))
            .collect()
    }

    fn resolve_transforms(
        &self,
        map: &Map<String, Value>,
        pointer: &str,
    ) -> Result<Vec<(String, TransformFn)>, CompileError> {
        let Some(Value::Array(names)) = map.get("transform") else {
            return Ok(Vec::new());
        };
        let local = self
            .schema
            .metadata_at(pointer)
            .and_then(|meta| meta.get::<Transforms>());
        names
            .iter()
            .map(|name| {
                let name = name.as_str().unwrap_or_default();
                self.transforms
                    .get(name)
                    .or_else(|| local.and_then(|table| table.get(name)))
                    .map(|f| (name.to_string(), f.clone()))
                    .ok_or_else(|| CompileError::UnknownTransform {
                        name: name.to_string(),
                        pointer: pointer.to_string(),
                    })
            })
            .collect()
    }
}

/// Fail on a `transform` keyword below an applicator of `map` that the
/// pass never enters.
fn reject_unvisited_transforms(map: &Map<String, Value>, pointer: &str) -> Result<(), CompileError> {
    let mut roots: Vec<(String, &Value)> = Vec::new();
    for &keyword in UNVISITED_SINGLES {
        if let Some(sub) = map.get(keyword) {
            roots.push((join_pointer(pointer, &[keyword]), sub));
        }
    }
    for &keyword in UNVISITED_MAPS {
        if let Some(Value::Object(entries)) = map.get(keyword) {
            for (name, sub) in entries {
                roots.push((join_pointer(pointer, &[keyword, name]), sub));
            }
        }
    }

    for (root, sub) in roots {
        for_each_schema(sub, &mut |inner, schema| {
            if schema.contains_key("transform") {
                return Err(CompileError::InvalidKeyword {
                    keyword: "transform".to_string(),
                    pointer: format!("{root}{inner}"),
                    reason: "transforms only run under properties, items, allOf, anyOf, oneOf, then, else and $ref"
                        .to_string(),
                });
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Propagate activity from nodes with transforms to everything reaching them.
fn mark_active(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        node.active = !node.transforms.is_empty();
    }
    loop {
        let mut changed = false;
        for id in 0..nodes.len() {
            if nodes[id].active {
                continue;
            }
            if nodes[id].children().into_iter().any(|child| nodes[child].active) {
                nodes[id].active = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// A standalone document for the subschema at `pointer`: the subschema
/// itself plus the root's definitions, so local references still resolve.
fn branch_document(document: &Value, pointer: &str) -> Value {
    match document.pointer(pointer) {
        Some(Value::Object(branch)) => {
            let mut out = branch.clone();
            for keyword in ["$schema", "definitions", "$defs"] {
                if let Some(value) = document.get(keyword) {
                    out.entry(keyword).or_insert_with(|| value.clone());
                }
            }
            Value::Object(out)
        }
        Some(other) => other.clone(),
        None => Value::Bool(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shape_core::transform_fn;

    fn table() -> TransformTable {
        let mut t = TransformTable::new();
        t.insert(
            "double".to_string(),
            transform_fn(|v, _| Ok(json!(v.as_i64().unwrap_or_default() * 2))),
        );
        t.insert(
            "reject".to_string(),
            transform_fn(|v, ctx| {
                ctx.error("rejected");
                Ok(v)
            }),
        );
        t
    }

    fn matcher(document: &Value) -> Result<Matcher, CompileError> {
        jsonschema::validator_for(document).map_err(|e| CompileError::Build {
            reason: e.to_string(),
        })
    }

    fn plan(document: Value) -> Plan {
        let schema = Schema::from_value(document.clone()).unwrap();
        Plan::compile(&schema, document, &table(), true, matcher).unwrap()
    }

    #[test]
    fn test_nested_transforms_run() {
        let p = plan(json!({
            "properties": {
                "a": {"transform": ["double"]},
                "list": {"items": {"transform": ["double", "double"]}}
            }
        }));
        let mut issues = Vec::new();
        let out = p.apply(json!({"a": 2, "list": [1, 2], "b": 5}), &mut issues).unwrap();
        assert_eq!(out, json!({"a": 4, "list": [4, 8], "b": 5}));
        assert!(issues.is_empty());
        assert_eq!(p.transform_nodes(), 2);
    }

    #[test]
    fn test_root_transform_replaces_value() {
        let p = plan(json!({"transform": ["double"]}));
        let out = p.apply(json!(21), &mut Vec::new()).unwrap();
        assert_eq!(out, json!(42));
    }

    #[test]
    fn test_reported_issue_shape() {
        let p = plan(json!({"properties": {"a": {"transform": ["double", "reject"]}}}));
        let mut issues = Vec::new();
        let out = p.apply(json!({"a": 1}), &mut issues).unwrap();
        assert_eq!(out, json!({"a": 2}));
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.keyword, "transform");
        assert_eq!(issue.instance_path, "/a");
        assert_eq!(issue.schema_path, "/properties/a/transform");
        assert_eq!(issue.message, "rejected");
        assert_eq!(issue.schema, Some(json!(["double", "reject"])));
        assert_eq!(issue.data, Some(json!(2)));
    }

    #[test]
    fn test_refs_and_cycles() {
        let p = plan(json!({
            "definitions": {
                "node": {
                    "properties": {
                        "value": {"transform": ["double"]},
                        "next": {"$ref": "#/definitions/node"}
                    }
                }
            },
            "$ref": "#/definitions/node"
        }));
        let out = p
            .apply(json!({"value": 1, "next": {"value": 2, "next": {"value": 3}}}), &mut Vec::new())
            .unwrap();
        assert_eq!(out, json!({"value": 2, "next": {"value": 4, "next": {"value": 6}}}));
    }

    #[test]
    fn test_tuple_and_additional_items() {
        let p = plan(json!({
            "items": [{}, {"transform": ["double"]}],
            "additionalItems": {"transform": ["double"]}
        }));
        let out = p.apply(json!([1, 2, 3, 4]), &mut Vec::new()).unwrap();
        assert_eq!(out, json!([1, 4, 6, 8]));
    }

    #[test]
    fn test_unknown_transform_is_fatal() {
        let document = json!({"properties": {"a": {"transform": ["nope"]}}});
        let schema = Schema::from_value(document.clone()).unwrap();
        let err = Plan::compile(&schema, document, &table(), true, matcher).err();
        assert_eq!(
            err,
            Some(CompileError::UnknownTransform {
                name: "nope".to_string(),
                pointer: "/properties/a".to_string(),
            })
        );
    }

    #[test]
    fn test_prune_closed_objects() {
        let p = plan(json!({
            "properties": {"a": {"properties": {"x": {}}, "additionalProperties": false}},
            "additionalProperties": false
        }));
        let mut value = json!({"a": {"x": 1, "y": 2}, "b": 3});
        p.prune(&mut value);
        assert_eq!(value, json!({"a": {"x": 1}}));
    }

    #[test]
    fn test_branch_document_carries_definitions() {
        let document = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"n": {"type": "number"}},
            "anyOf": [{"$ref": "#/definitions/n"}]
        });
        assert_eq!(
            branch_document(&document, "/anyOf/0"),
            json!({
                "$ref": "#/definitions/n",
                "$schema": "http://json-schema.org/draft-07/schema#",
                "definitions": {"n": {"type": "number"}}
            })
        );
    }

    #[test]
    fn test_pattern_properties_transforms_run() {
        let p = plan(json!({
            "properties": {"n_fixed": {}},
            "patternProperties": {"^n_": {"transform": ["double"]}},
            "additionalProperties": {"transform": ["reject"]}
        }));
        let mut issues = Vec::new();
        let out = p.apply(json!({"n_a": 2, "n_fixed": 3, "other": 1}), &mut issues).unwrap();
        assert_eq!(out, json!({"n_a": 4, "n_fixed": 6, "other": 1}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].instance_path, "/other");
    }

    #[test]
    fn test_conditional_picks_then_or_else() {
        let p = plan(json!({
            "if": {"type": "integer"},
            "then": {"transform": ["double"]},
            "else": {"transform": ["reject"]}
        }));
        let mut issues = Vec::new();
        assert_eq!(p.apply(json!(3), &mut issues).unwrap(), json!(6));
        assert!(issues.is_empty());
        assert_eq!(p.apply(json!("x"), &mut issues).unwrap(), json!("x"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].schema_path, "/else/transform");
    }

    #[test]
    fn test_branch_selection_sees_original_value() {
        let mut t = table();
        t.insert("tag_a".to_string(), transform_fn(|mut v, _| {
            v["branch"] = json!("a");
            Ok(v)
        }));
        t.insert("tag_b".to_string(), transform_fn(|mut v, _| {
            v["branch"] = json!("b");
            Ok(v)
        }));
        let document = json!({
            "properties": {"n": {"transform": ["double"]}},
            "anyOf": [
                {"properties": {"n": {"maximum": 5}}, "transform": ["tag_a"]},
                {"transform": ["tag_b"]}
            ]
        });
        let schema = Schema::from_value(document.clone()).unwrap();
        let p = Plan::compile(&schema, document, &t, true, matcher).unwrap();
        let out = p.apply(json!({"n": 4}), &mut Vec::new()).unwrap();
        assert_eq!(out, json!({"n": 8, "branch": "a"}));
    }

    #[test]
    fn test_transforms_under_unvisited_applicators_fail() {
        for document in [
            json!({"not": {"transform": ["double"]}}),
            json!({"if": {"transform": ["double"]}, "then": {}}),
            json!({"properties": {"a": {"contains": {"items": {"transform": ["double"]}}}}}),
            json!({"dependencies": {"a": {"properties": {"b": {"transform": ["double"]}}}}}),
        ] {
            let schema = Schema::from_value(document.clone()).unwrap();
            let err = Plan::compile(&schema, document, &table(), true, matcher).err();
            assert!(
                matches!(err, Some(CompileError::InvalidKeyword { ref keyword, .. }) if keyword == "transform"),
                "{err:?}"
            );
        }
    }

    #[test]
    fn test_prune_keeps_pattern_properties() {
        let p = plan(json!({
            "properties": {"a": {}},
            "patternProperties": {"^x_": {}},
            "additionalProperties": false
        }));
        let mut value = json!({"a": 1, "x_1": 2, "b": 3});
        p.prune(&mut value);
        assert_eq!(value, json!({"a": 1, "x_1": 2}));
    }
}
