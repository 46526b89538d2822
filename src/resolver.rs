//! Graph resolution - turns a schema graph into a single JSON Schema document.
//!
//! Every node is either *inlined* at its use site or *lifted*: emitted once
//! with an `$id` and referenced with `$ref` from every other site. Named
//! nodes are always lifted. Unnamed nodes are lifted when they are shared
//! (reached more than once) and not simple, or when they re-enter
//! themselves.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::canonical::canonicalize;
use crate::error::ResolveError;
use crate::graph::SchemaGraph;
use crate::ident::Identifier;
use crate::node::{ArraySchema, Node, NodeId, ObjectSchema, Shape, Slot};
use crate::types::{CyclePolicy, ResolveOptions, ANNOTATION_KEYWORDS, COMPOSITION_KEYWORDS};
use crate::usage::{self, lookup, UsageMap};

/// Resolve the graph reachable from `root` into a draft 2020-12 document.
///
/// Usage counts are collected over the whole reachable graph first, then a
/// fresh resolution context walks it once.
///
/// # Errors
///
/// Returns `ResolveError` if a reachable handle is foreign or undefined, or
/// if a cycle is hit under [`CyclePolicy::Reject`].
pub fn resolve(
    graph: &SchemaGraph,
    root: NodeId,
    options: &ResolveOptions,
) -> Result<Value, ResolveError> {
    Resolver::new(graph, root, options)?.run()
}

/// Resolution context for one top-level resolve call.
///
/// Not meant to be shared between calls: each call builds its own.
#[derive(Debug)]
pub struct Resolver<'a> {
    graph: &'a SchemaGraph,
    options: &'a ResolveOptions,
    root: NodeId,
    usage: UsageMap,
    visited: HashMap<NodeId, Identifier>,
    in_progress: Vec<NodeId>,
    reentered: HashSet<NodeId>,
}

impl<'a> Resolver<'a> {
    /// Build a context for `root`, collecting usage counts up front.
    pub fn new(
        graph: &'a SchemaGraph,
        root: NodeId,
        options: &'a ResolveOptions,
    ) -> Result<Self, ResolveError> {
        let usage = usage::collect(graph, root)?;
        Ok(Self {
            graph,
            options,
            root,
            usage,
            visited: HashMap::new(),
            in_progress: Vec::new(),
            reentered: HashSet::new(),
        })
    }

    /// Resolve the root, honoring the explicit root name from the options.
    pub fn run(mut self) -> Result<Value, ResolveError> {
        let name = self.options.name.clone();
        self.resolve_node(self.root, name.as_deref())
    }

    pub fn usage(&self) -> &UsageMap {
        &self.usage
    }

    /// Identifiers assigned to lifted nodes so far.
    pub fn visited(&self) -> &HashMap<NodeId, Identifier> {
        &self.visited
    }

    /// Resolve one node to an inline document or a `$ref` to its lifted form.
    pub fn resolve_node(
        &mut self,
        id: NodeId,
        explicit_name: Option<&str>,
    ) -> Result<Value, ResolveError> {
        let graph = self.graph;
        let node = lookup(graph, id)?;

        // Boolean schemas stand alone and are never lifted
        if let Shape::Raw(Value::Bool(b)) = node.shape() {
            return Ok(Value::Bool(*b));
        }

        if let Some(identifier) = self.visited.get(&id) {
            tracing::trace!(node = %id, identifier = %identifier, "referencing lifted node");
            return Ok(reference(identifier.as_str()));
        }

        if self.in_progress.contains(&id) {
            return match self.options.cycle_policy {
                CyclePolicy::Reject => Err(ResolveError::UnresolvedCycle { node: id }),
                CyclePolicy::Lift => {
                    tracing::debug!(node = %id, "cycle re-entered node, lifting it");
                    self.reentered.insert(id);
                    Ok(reference(&pending_token(id)))
                }
            };
        }

        // A logical name fixes the identifier before any child can refer back
        let name = explicit_name.or(node.name());
        let named = name.map(|name| {
            let identifier =
                graph
                    .identifiers()
                    .identify(id, &self.options.namespace, Some(name), "");
            self.visited.insert(id, identifier.clone());
            identifier
        });

        self.in_progress.push(id);
        let built = self.build(node);
        self.in_progress.pop();
        let document = built?;

        if let Some(identifier) = named {
            tracing::debug!(node = %id, identifier = %identifier, "lifted named node");
            return Ok(lift(document, &identifier, name));
        }

        let recursive = self.reentered.remove(&id);
        let uses = self.usage.count(id);
        if !recursive && (is_simple(&document) || uses <= 1) {
            return Ok(document);
        }

        let canonical = self.hashing_form(&document, id, recursive);
        let identifier = graph
            .identifiers()
            .identify(id, &self.options.namespace, None, &canonical);

        let mut document = document;
        if recursive {
            let token = pending_token(id);
            rewrite_refs(&mut document, &|target| {
                (target == token).then(|| identifier.to_string())
            });
        }

        tracing::debug!(node = %id, identifier = %identifier, uses, recursive, "lifted node");
        self.visited.insert(id, identifier.clone());
        Ok(lift(document, &identifier, None))
    }

    fn build(&mut self, node: &Node) -> Result<Value, ResolveError> {
        let mut map = Map::new();

        match node.shape() {
            Shape::Raw(document) => return Ok(raw_document(document, node.keywords())),
            Shape::Primitive(kind) => {
                map.insert("type".into(), kind.as_str().into());
            }
            Shape::Object(_) => {
                map.insert("type".into(), "object".into());
            }
            Shape::Array(_) => {
                map.insert("type".into(), "array".into());
            }
            Shape::Composition { .. } | Shape::Not(_) | Shape::Conditional { .. } => {}
        }

        for (keyword, value) in node.keywords() {
            map.insert(keyword.clone(), value.clone());
        }

        if let Shape::Composition { kind, members } = node.shape() {
            let mut resolved = Vec::with_capacity(members.len());
            for member in members {
                resolved.push(self.resolve_node(*member, None)?);
            }
            map.insert(kind.keyword().into(), Value::Array(resolved));
        }

        match node.shape() {
            Shape::Not(inner) => {
                map.insert("not".into(), self.resolve_node(*inner, None)?);
            }
            Shape::Conditional {
                condition,
                then,
                otherwise,
            } => {
                map.insert("if".into(), self.resolve_node(*condition, None)?);
                map.insert("then".into(), self.resolve_node(*then, None)?);
                map.insert("else".into(), self.resolve_node(*otherwise, None)?);
            }
            Shape::Object(obj) => self.build_object(obj, &mut map)?,
            Shape::Array(arr) => self.build_array(arr, &mut map)?,
            Shape::Primitive(_) | Shape::Composition { .. } | Shape::Raw(_) => {}
        }

        Ok(Value::Object(map))
    }

    fn build_object(
        &mut self,
        obj: &ObjectSchema,
        map: &mut Map<String, Value>,
    ) -> Result<(), ResolveError> {
        if !obj.properties.is_empty() {
            let properties = self.resolve_entries(&obj.properties)?;
            map.insert("properties".into(), properties);
        }
        if !obj.required.is_empty() {
            map.insert("required".into(), obj.required.clone().into());
        }
        if !obj.pattern_properties.is_empty() {
            let patterns = self.resolve_entries(&obj.pattern_properties)?;
            map.insert("patternProperties".into(), patterns);
        }
        if let Some(slot) = obj.additional_properties {
            map.insert("additionalProperties".into(), self.resolve_slot(slot)?);
        }
        if let Some(slot) = obj.unevaluated_properties {
            map.insert("unevaluatedProperties".into(), self.resolve_slot(slot)?);
        }
        if !obj.dependent_required.is_empty() {
            let dependents: Map<String, Value> = obj
                .dependent_required
                .iter()
                .map(|(name, names)| (name.clone(), names.clone().into()))
                .collect();
            map.insert("dependentRequired".into(), Value::Object(dependents));
        }
        if !obj.dependent_schemas.is_empty() {
            let dependents = self.resolve_entries(&obj.dependent_schemas)?;
            map.insert("dependentSchemas".into(), dependents);
        }
        if let Some(names) = obj.property_names {
            map.insert("propertyNames".into(), self.resolve_node(names, None)?);
        }
        Ok(())
    }

    fn build_array(
        &mut self,
        arr: &ArraySchema,
        map: &mut Map<String, Value>,
    ) -> Result<(), ResolveError> {
        if let Some(slot) = arr.items {
            map.insert("items".into(), self.resolve_slot(slot)?);
        }
        if !arr.prefix_items.is_empty() {
            let mut prefix = Vec::with_capacity(arr.prefix_items.len());
            for item in &arr.prefix_items {
                prefix.push(self.resolve_node(*item, None)?);
            }
            map.insert("prefixItems".into(), Value::Array(prefix));
        }
        if let Some(contains) = arr.contains {
            map.insert("contains".into(), self.resolve_node(contains, None)?);
        }
        if let Some(slot) = arr.unevaluated_items {
            map.insert("unevaluatedItems".into(), self.resolve_slot(slot)?);
        }
        Ok(())
    }

    fn resolve_entries(&mut self, entries: &[(String, NodeId)]) -> Result<Value, ResolveError> {
        let mut result = Map::new();
        for (key, id) in entries {
            result.insert(key.clone(), self.resolve_node(*id, None)?);
        }
        Ok(Value::Object(result))
    }

    fn resolve_slot(&mut self, slot: Slot) -> Result<Value, ResolveError> {
        match slot {
            Slot::Bool(b) => Ok(Value::Bool(b)),
            Slot::Node(id) => self.resolve_node(id, None),
        }
    }

    /// Canonical content of a finished node for hashing.
    ///
    /// Pending references to the node itself or to enclosing in-progress
    /// nodes are replaced by their relative depth, so the hash depends on
    /// content only.
    fn hashing_form(&self, document: &Value, id: NodeId, recursive: bool) -> String {
        let mut markers: HashMap<String, String> = HashMap::new();
        if recursive {
            markers.insert(pending_token(id), "#recursive-0".to_string());
        }
        let depth = self.in_progress.len();
        for (level, ancestor) in self.in_progress.iter().enumerate() {
            if self.reentered.contains(ancestor) {
                markers.insert(
                    pending_token(*ancestor),
                    format!("#recursive-{}", depth - level),
                );
            }
        }

        if markers.is_empty() {
            return canonicalize(document);
        }
        let mut hashed = document.clone();
        rewrite_refs(&mut hashed, &|target| markers.get(target).cloned());
        canonicalize(&hashed)
    }
}

/// Whether a resolved keyword set is small enough to always inline.
///
/// Simple means fewer than three non-annotation keywords and no
/// composition keyword.
pub fn is_simple(document: &Value) -> bool {
    match document {
        Value::Object(map) => {
            let meaningful = map
                .keys()
                .filter(|k| !ANNOTATION_KEYWORDS.contains(&k.as_str()))
                .count();
            meaningful < 3 && !COMPOSITION_KEYWORDS.iter().any(|k| map.contains_key(*k))
        }
        _ => true,
    }
}

fn reference(target: &str) -> Value {
    let mut map = Map::new();
    map.insert("$ref".into(), target.into());
    Value::Object(map)
}

/// Placeholder for a reference to a node whose identifier is not known yet.
fn pending_token(id: NodeId) -> String {
    format!("urn:pending:{}", id.index())
}

fn lift(document: Value, identifier: &Identifier, name: Option<&str>) -> Value {
    let Value::Object(map) = document else {
        return document;
    };

    let mut lifted = Map::new();
    lifted.insert("$id".into(), identifier.as_str().into());
    if let Some(name) = name {
        if !map.contains_key("title") {
            lifted.insert("title".into(), name.into());
        }
    }
    for (key, value) in map {
        // Raw documents may carry their own $id; the generated one wins
        if key != "$id" {
            lifted.insert(key, value);
        }
    }
    Value::Object(lifted)
}

fn raw_document(document: &Value, keywords: &Map<String, Value>) -> Value {
    match document {
        Value::Object(map) => {
            let mut result = map.clone();
            for (keyword, value) in keywords {
                result
                    .entry(keyword.clone())
                    .or_insert_with(|| value.clone());
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

/// Rewrite every `$ref` string for which `replace` returns a new target.
fn rewrite_refs(value: &mut Value, replace: &dyn Fn(&str) -> Option<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "$ref" {
                    if let Some(target) = child.as_str().and_then(replace) {
                        *child = Value::String(target);
                        continue;
                    }
                }
                rewrite_refs(child, replace);
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, replace);
            }
        }
        _ => {}
    }
}
