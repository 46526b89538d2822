//! Integration tests for validating values through resolved graphs.

mod common;

use common::graph_from_document;
use schema_graph::{
    resolve, validate, validate_against_schema, ArraySchema, Constraints, NodeId, ObjectSchema,
    ResolveOptions, SchemaGraph, SchemaValidator, ValidationOptions, ValidationResult,
};
use serde_json::json;

fn person(graph: &mut SchemaGraph) -> NodeId {
    let name = graph.string(Constraints::new().min_length(1)).unwrap();
    let age = graph.number(Constraints::new().minimum(0)).unwrap();
    graph
        .object(
            ObjectSchema::new()
                .required_property("name", name)
                .required_property("age", age),
        )
        .unwrap()
}

mod person_example {
    use super::*;

    #[test]
    fn resolves_to_expected_document() {
        let mut graph = SchemaGraph::new();
        let root = person(&mut graph);
        let doc = resolve(&graph, root, &ResolveOptions::new()).unwrap();
        assert_eq!(
            doc,
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "age": { "type": "number", "minimum": 0 }
                },
                "required": ["name", "age"]
            })
        );
    }

    #[test]
    fn valid_value() {
        let mut graph = SchemaGraph::new();
        let root = person(&mut graph);
        let result = validate(
            &graph,
            root,
            &json!({ "name": "Ada", "age": 32 }),
            &ResolveOptions::new(),
            &ValidationOptions::new(),
        );
        assert_eq!(result, ValidationResult::success());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "valid": true, "errors": null })
        );
    }

    #[test]
    fn empty_name_fails_min_length() {
        let mut graph = SchemaGraph::new();
        let root = person(&mut graph);
        let result = validate(
            &graph,
            root,
            &json!({ "name": "", "age": 32 }),
            &ResolveOptions::new(),
            &ValidationOptions::new(),
        );
        assert!(!result.valid);
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword, "minLength");
        assert_eq!(errors[0].instance_path, "/name");
    }
}

mod composition {
    use super::*;

    fn named_all_of(graph: &mut SchemaGraph) -> NodeId {
        let name = graph.string(Constraints::new()).unwrap();
        let age = graph.integer(Constraints::new()).unwrap();
        let named = graph
            .object(
                ObjectSchema::new()
                    .name("Named")
                    .required_property("name", name),
            )
            .unwrap();
        let aged = graph
            .object(ObjectSchema::new().name("Aged").required_property("age", age))
            .unwrap();
        graph.all_of(vec![named, aged], Constraints::new()).unwrap()
    }

    #[test]
    fn satisfies_both_members() {
        let mut graph = SchemaGraph::new();
        let root = named_all_of(&mut graph);
        let doc = resolve(&graph, root, &ResolveOptions::new()).unwrap();
        assert_eq!(doc["allOf"][0]["$id"], json!("schema:Named"));
        assert_eq!(doc["allOf"][1]["$id"], json!("schema:Aged"));

        let result = validate_against_schema(
            &doc,
            &json!({ "name": "Ada", "age": 32 }),
            &ValidationOptions::new(),
        );
        assert!(result.valid);
    }

    #[test]
    fn missing_field_from_either_member_fails() {
        let mut graph = SchemaGraph::new();
        let root = named_all_of(&mut graph);
        let options = ValidationOptions::new();
        let resolve_options = ResolveOptions::new();

        let result = validate(&graph, root, &json!({ "name": "Ada" }), &resolve_options, &options);
        assert!(!result.valid);
        assert_eq!(result.errors()[0].keyword, "required");

        let result = validate(&graph, root, &json!({ "age": 32 }), &resolve_options, &options);
        assert!(!result.valid);
    }

    #[test]
    fn conditional_branches() {
        let doc = json!({
            "if": { "type": "object", "properties": { "kind": { "type": "string", "const": "card" } } },
            "then": { "type": "object", "required": ["number"] },
            "else": { "type": "object", "required": ["iban"] }
        });
        let mut graph = SchemaGraph::new();
        let root = graph_from_document(&mut graph, &doc);
        let options = ValidationOptions::new();
        let resolve_options = ResolveOptions::new();

        let card = json!({ "kind": "card", "number": "4111" });
        assert!(validate(&graph, root, &card, &resolve_options, &options).valid);

        let bank = json!({ "kind": "bank" });
        assert!(!validate(&graph, root, &bank, &resolve_options, &options).valid);
    }
}

mod lifted_references {
    use super::*;

    #[test]
    fn shared_definition_validates_at_every_site() {
        let mut graph = SchemaGraph::new();
        let street = graph.string(Constraints::new().min_length(1)).unwrap();
        let city = graph.string(Constraints::new()).unwrap();
        let address = graph
            .object(
                ObjectSchema::new()
                    .required_property("street", street)
                    .property("city", city),
            )
            .unwrap();
        let root = graph
            .object(
                ObjectSchema::new()
                    .property("home", address)
                    .property("work", address),
            )
            .unwrap();

        let doc = resolve(&graph, root, &ResolveOptions::new()).unwrap();
        assert!(doc["properties"]["work"]["$ref"].is_string());

        let validator = SchemaValidator::compile(&doc, &ValidationOptions::new()).unwrap();
        assert!(validator
            .check(&json!({ "home": { "street": "Main" }, "work": { "street": "Side" } }))
            .valid);

        let result = validator.check(&json!({ "home": { "street": "Main" }, "work": {} }));
        assert!(!result.valid);
        assert_eq!(result.errors()[0].instance_path, "/work");
    }

    #[test]
    fn recursive_tree_validates_nested_values() {
        let mut graph = SchemaGraph::new();
        let tree = graph.reserve();
        let label = graph.string(Constraints::new().min_length(1)).unwrap();
        let children = graph.array(ArraySchema::new().items(tree)).unwrap();
        graph
            .define_object(
                tree,
                ObjectSchema::new()
                    .required_property("label", label)
                    .property("children", children),
            )
            .unwrap();

        let doc = resolve(&graph, tree, &ResolveOptions::new()).unwrap();
        let validator = SchemaValidator::compile(&doc, &ValidationOptions::new()).unwrap();

        let good = json!({
            "label": "root",
            "children": [{ "label": "a" }, { "label": "b", "children": [{ "label": "c" }] }]
        });
        assert!(validator.check(&good).valid);

        let bad = json!({
            "label": "root",
            "children": [{ "label": "b", "children": [{ "label": "" }] }]
        });
        let result = validator.check(&bad);
        assert!(!result.valid);
        assert_eq!(result.errors()[0].instance_path, "/children/0/children/0/label");
    }

    #[test]
    fn anchored_recursion_validates() {
        let doc = json!({
            "$anchor": "node",
            "type": "object",
            "properties": {
                "value": { "type": "integer" },
                "next": { "$ref": "#node" }
            }
        });
        let mut graph = SchemaGraph::new();
        let root = graph_from_document(&mut graph, &doc);
        let options = ValidationOptions::new();
        let resolve_options = ResolveOptions::new();

        let list = json!({ "value": 1, "next": { "value": 2, "next": { "value": 3 } } });
        assert!(validate(&graph, root, &list, &resolve_options, &options).valid);

        let broken = json!({ "value": 1, "next": { "value": "two" } });
        assert!(!validate(&graph, root, &broken, &resolve_options, &options).valid);
    }
}

mod failures {
    use super::*;

    #[test]
    fn unevaluated_properties_enforced() {
        let mut graph = SchemaGraph::new();
        let id = graph.string(Constraints::new()).unwrap();
        let root = graph
            .object(
                ObjectSchema::new()
                    .property("id", id)
                    .unevaluated_properties(false),
            )
            .unwrap();

        let doc = resolve(&graph, root, &ResolveOptions::new()).unwrap();
        let validator = SchemaValidator::compile(&doc, &ValidationOptions::new()).unwrap();
        assert!(validator.capabilities().unevaluated);
        assert!(validator.check(&json!({ "id": "x" })).valid);

        let result = validator.check(&json!({ "id": "x", "extra": 1 }));
        assert!(!result.valid);
        assert_eq!(result.errors()[0].keyword, "unevaluatedProperties");
    }

    #[test]
    fn invalid_raw_document_reports_compilation() {
        let mut graph = SchemaGraph::new();
        let raw = graph
            .raw(json!({ "title": "Broken", "minLength": "three" }), Constraints::new())
            .unwrap();
        let result = validate(
            &graph,
            raw,
            &json!("x"),
            &ResolveOptions::new(),
            &ValidationOptions::new(),
        );
        assert!(!result.valid);
        assert_eq!(result.errors()[0].keyword, "compilation");
        assert!(result.errors()[0].message.contains("Broken"));
    }

    #[test]
    fn result_serializes_error_details() {
        let doc = json!({ "type": "integer" });
        let result = validate_against_schema(&doc, &json!("x"), &ValidationOptions::new());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], json!(false));
        assert_eq!(json["errors"][0]["keyword"], json!("type"));
        assert_eq!(json["errors"][0]["instancePath"], json!(""));
        assert_eq!(json["errors"][0]["schemaPath"], json!("/type"));
    }
}
