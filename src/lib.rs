//! Schema Graph Resolver
//!
//! Builds canonical draft 2020-12 JSON Schema documents from composable,
//! in-memory schema graphs, and validates values against them.
//!
//! Nodes live in a [`SchemaGraph`] arena and may share sub-nodes or refer to
//! themselves. Resolution first counts how often each node is reached, then
//! walks the graph once, inlining nodes used in one place and lifting shared
//! ones into `$id`-bearing definitions referenced by `$ref`.
//!
//! # Example
//!
//! ```
//! use schema_graph::{resolve, Constraints, ObjectSchema, ResolveOptions, SchemaGraph};
//! use serde_json::json;
//!
//! let mut graph = SchemaGraph::new();
//! let name = graph.string(Constraints::new().min_length(1)).unwrap();
//! let age = graph.number(Constraints::new().minimum(0)).unwrap();
//! let person = graph
//!     .object(
//!         ObjectSchema::new()
//!             .required_property("name", name)
//!             .required_property("age", age),
//!     )
//!     .unwrap();
//!
//! let document = resolve(&graph, person, &ResolveOptions::new()).unwrap();
//! assert_eq!(
//!     document,
//!     json!({
//!         "type": "object",
//!         "properties": {
//!             "name": { "type": "string", "minLength": 1 },
//!             "age": { "type": "number", "minimum": 0 }
//!         },
//!         "required": ["name", "age"]
//!     })
//! );
//! ```
//!
//! # Inline or lift
//!
//! | Node | Result |
//! |------|--------|
//! | Has a logical name | Lifted as `<namespace>:<name>` |
//! | Reached once | Inlined |
//! | Reached more than once, simple | Inlined at every site |
//! | Reached more than once, not simple | Lifted once as `<namespace>:hash-<hex>`, `$ref` elsewhere |
//! | Re-enters itself | Lifted, inner sites use `$ref` |
//!
//! A keyword set is *simple* when it has fewer than three non-annotation
//! keywords and no `allOf`/`anyOf`/`oneOf`.

pub mod canonical;
mod error;
mod graph;
mod ident;
mod loader;
mod node;
mod resolver;
mod types;
mod usage;
mod validator;

pub use error::{
    AdapterError, ErrorDetail, FailureKind, GraphError, LoadError, ResolveError, ValidationResult,
};
pub use graph::SchemaGraph;
pub use ident::{content_hash, Identifier, IdentifierCache};
pub use loader::{load_document, load_document_str};
pub use node::{
    ArraySchema, CompositionKind, Constraints, Node, NodeId, ObjectSchema, PrimitiveKind, Shape,
    Slot,
};
pub use resolver::{is_simple, resolve, Resolver};
pub use types::{CyclePolicy, ResolveOptions, DEFAULT_NAMESPACE};
pub use usage::{collect, UsageMap};
pub use validator::{
    detect_capabilities, validate, validate_against_schema, Capabilities, SchemaValidator,
    ValidationOptions,
};
