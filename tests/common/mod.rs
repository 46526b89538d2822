//! Shared helpers for integration tests.
//!
//! `graph_from_document` converts a hand-written document back into a schema
//! graph so resolution can be checked as a round trip.

#![allow(dead_code)]

use schema_graph::{ArraySchema, Constraints, NodeId, ObjectSchema, SchemaGraph, Slot};
use serde_json::{Map, Value};

/// Build nodes for `document` in `graph`, returning the root handle.
///
/// Every subschema becomes its own node, so each node is reached once.
pub fn graph_from_document(graph: &mut SchemaGraph, document: &Value) -> NodeId {
    let Value::Object(map) = document else {
        return graph.raw(document.clone(), Constraints::new()).unwrap();
    };

    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(members) = map.get(keyword).and_then(Value::as_array) {
            let members: Vec<NodeId> = members
                .iter()
                .map(|m| graph_from_document(graph, m))
                .collect();
            let constraints = constraints_from(map, &[keyword]);
            return match keyword {
                "allOf" => graph.all_of(members, constraints),
                "anyOf" => graph.any_of(members, constraints),
                _ => graph.one_of(members, constraints),
            }
            .unwrap();
        }
    }

    if let Some(inner) = map.get("not") {
        let inner = graph_from_document(graph, inner);
        return graph.not(inner, constraints_from(map, &["not"])).unwrap();
    }

    if let (Some(i), Some(t), Some(e)) = (map.get("if"), map.get("then"), map.get("else")) {
        let i = graph_from_document(graph, i);
        let t = graph_from_document(graph, t);
        let e = graph_from_document(graph, e);
        return graph
            .conditional(i, t, e, constraints_from(map, &["if", "then", "else"]))
            .unwrap();
    }

    match map.get("type").and_then(Value::as_str) {
        Some("object") => object_from(graph, map),
        Some("array") => array_from(graph, map),
        Some("string") => graph.string(constraints_from(map, &["type"])).unwrap(),
        Some("number") => graph.number(constraints_from(map, &["type"])).unwrap(),
        Some("integer") => graph.integer(constraints_from(map, &["type"])).unwrap(),
        Some("boolean") => graph.boolean(constraints_from(map, &["type"])).unwrap(),
        Some("null") => graph.null(constraints_from(map, &["type"])).unwrap(),
        _ => graph.raw(document.clone(), Constraints::new()).unwrap(),
    }
}

fn object_from(graph: &mut SchemaGraph, map: &Map<String, Value>) -> NodeId {
    let mut schema = ObjectSchema::new();

    for (name, sub) in entries(map, "properties") {
        let id = graph_from_document(graph, sub);
        schema = schema.property(name.clone(), id);
    }
    if let Some(required) = map.get("required").and_then(Value::as_array) {
        schema = schema.required(required.iter().filter_map(Value::as_str));
    }
    for (pattern, sub) in entries(map, "patternProperties") {
        let id = graph_from_document(graph, sub);
        schema = schema.pattern_property(pattern.clone(), id);
    }
    if let Some(slot) = map.get("additionalProperties") {
        schema = schema.additional_properties(slot_from(graph, slot));
    }
    if let Some(slot) = map.get("unevaluatedProperties") {
        schema = schema.unevaluated_properties(slot_from(graph, slot));
    }
    for (name, names) in entries(map, "dependentRequired") {
        let names = names.as_array().into_iter().flatten().filter_map(Value::as_str);
        schema = schema.dependent_required(name.clone(), names);
    }
    for (name, sub) in entries(map, "dependentSchemas") {
        let id = graph_from_document(graph, sub);
        schema = schema.dependent_schema(name.clone(), id);
    }
    if let Some(sub) = map.get("propertyNames") {
        let id = graph_from_document(graph, sub);
        schema = schema.property_names(id);
    }

    let constraints = constraints_from(
        map,
        &[
            "type",
            "properties",
            "required",
            "patternProperties",
            "additionalProperties",
            "unevaluatedProperties",
            "dependentRequired",
            "dependentSchemas",
            "propertyNames",
        ],
    );
    graph.object(schema.constraints(constraints)).unwrap()
}

fn array_from(graph: &mut SchemaGraph, map: &Map<String, Value>) -> NodeId {
    let mut schema = ArraySchema::new();

    if let Some(slot) = map.get("items") {
        schema = schema.items(slot_from(graph, slot));
    }
    for sub in map.get("prefixItems").and_then(Value::as_array).into_iter().flatten() {
        let id = graph_from_document(graph, sub);
        schema = schema.prefix_item(id);
    }
    if let Some(sub) = map.get("contains") {
        let id = graph_from_document(graph, sub);
        schema = schema.contains(id);
    }
    if let Some(slot) = map.get("unevaluatedItems") {
        schema = schema.unevaluated_items(slot_from(graph, slot));
    }

    let constraints = constraints_from(
        map,
        &["type", "items", "prefixItems", "contains", "unevaluatedItems"],
    );
    graph.array(schema.constraints(constraints)).unwrap()
}

fn slot_from(graph: &mut SchemaGraph, value: &Value) -> Slot {
    match value {
        Value::Bool(b) => Slot::Bool(*b),
        other => Slot::Node(graph_from_document(graph, other)),
    }
}

fn entries<'a>(map: &'a Map<String, Value>, key: &str) -> Vec<(&'a String, &'a Value)> {
    map.get(key)
        .and_then(Value::as_object)
        .map(|m| m.iter().collect())
        .unwrap_or_default()
}

fn constraints_from(map: &Map<String, Value>, skip: &[&str]) -> Constraints {
    map.iter()
        .filter(|(k, _)| !skip.contains(&k.as_str()))
        .fold(Constraints::new(), |c, (k, v)| c.keyword(k.clone(), v.clone()))
}

/// Count occurrences of `key` anywhere in a document.
pub fn count_key(value: &Value, key: &str) -> usize {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| usize::from(k == key) + count_key(v, key))
            .sum(),
        Value::Array(items) => items.iter().map(|v| count_key(v, key)).sum(),
        _ => 0,
    }
}
