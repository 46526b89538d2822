//! Arena that owns the nodes of a schema graph.

use serde_json::Value;

use crate::error::GraphError;
use crate::ident::IdentifierCache;
use crate::node::{
    ArraySchema, CompositionKind, Constraints, Node, NodeId, ObjectSchema, PrimitiveKind,
};

/// Arena of fragment nodes addressed by [`NodeId`].
///
/// Nodes may only reference handles that already exist in this arena. To
/// build a recursive shape, [`reserve`](Self::reserve) a handle first, use it
/// as a child, then [`define`](Self::define) it.
///
/// ```
/// use schema_graph::{resolve, ArraySchema, Constraints, ObjectSchema, ResolveOptions, SchemaGraph};
///
/// let mut graph = SchemaGraph::new();
/// let tree = graph.reserve();
/// let label = graph.string(Constraints::new().min_length(1)).unwrap();
/// let children = graph.array(ArraySchema::new().items(tree)).unwrap();
/// graph
///     .define_object(
///         tree,
///         ObjectSchema::new()
///             .property("label", label)
///             .property("children", children),
///     )
///     .unwrap();
///
/// let doc = resolve(&graph, tree, &ResolveOptions::new()).unwrap();
/// let id = doc["$id"].as_str().unwrap();
/// assert_eq!(doc["properties"]["children"]["items"]["$ref"], id);
/// ```
#[derive(Debug, Default)]
pub struct SchemaGraph {
    nodes: Vec<Option<Node>>,
    identifiers: IdentifierCache,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its handle.
    pub fn add(&mut self, node: Node) -> Result<NodeId, GraphError> {
        self.check_children(&node)?;
        let id = self.next_id();
        self.nodes.push(Some(node));
        Ok(id)
    }

    /// Issue a handle whose node is supplied later with [`define`](Self::define).
    pub fn reserve(&mut self) -> NodeId {
        let id = self.next_id();
        self.nodes.push(None);
        id
    }

    /// Fill a reserved handle. A handle can be defined once.
    pub fn define(&mut self, id: NodeId, node: Node) -> Result<(), GraphError> {
        self.check_children(&node)?;
        let slot = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode { node: id })?;
        if slot.is_some() {
            return Err(GraphError::AlreadyDefined { node: id });
        }
        *slot = Some(node);
        Ok(())
    }

    pub fn define_object(&mut self, id: NodeId, schema: ObjectSchema) -> Result<(), GraphError> {
        self.define(id, Node::object(schema)?)
    }

    pub fn define_array(&mut self, id: NodeId, schema: ArraySchema) -> Result<(), GraphError> {
        self.define(id, Node::array(schema)?)
    }

    pub fn string(&mut self, constraints: Constraints) -> Result<NodeId, GraphError> {
        self.add(Node::primitive(PrimitiveKind::String, constraints)?)
    }

    pub fn number(&mut self, constraints: Constraints) -> Result<NodeId, GraphError> {
        self.add(Node::primitive(PrimitiveKind::Number, constraints)?)
    }

    pub fn integer(&mut self, constraints: Constraints) -> Result<NodeId, GraphError> {
        self.add(Node::primitive(PrimitiveKind::Integer, constraints)?)
    }

    pub fn boolean(&mut self, constraints: Constraints) -> Result<NodeId, GraphError> {
        self.add(Node::primitive(PrimitiveKind::Boolean, constraints)?)
    }

    pub fn null(&mut self, constraints: Constraints) -> Result<NodeId, GraphError> {
        self.add(Node::primitive(PrimitiveKind::Null, constraints)?)
    }

    pub fn object(&mut self, schema: ObjectSchema) -> Result<NodeId, GraphError> {
        self.add(Node::object(schema)?)
    }

    pub fn array(&mut self, schema: ArraySchema) -> Result<NodeId, GraphError> {
        self.add(Node::array(schema)?)
    }

    pub fn all_of(
        &mut self,
        members: Vec<NodeId>,
        constraints: Constraints,
    ) -> Result<NodeId, GraphError> {
        self.add(Node::composition(CompositionKind::AllOf, members, constraints)?)
    }

    pub fn any_of(
        &mut self,
        members: Vec<NodeId>,
        constraints: Constraints,
    ) -> Result<NodeId, GraphError> {
        self.add(Node::composition(CompositionKind::AnyOf, members, constraints)?)
    }

    pub fn one_of(
        &mut self,
        members: Vec<NodeId>,
        constraints: Constraints,
    ) -> Result<NodeId, GraphError> {
        self.add(Node::composition(CompositionKind::OneOf, members, constraints)?)
    }

    pub fn not(&mut self, inner: NodeId, constraints: Constraints) -> Result<NodeId, GraphError> {
        self.add(Node::negation(inner, constraints)?)
    }

    pub fn conditional(
        &mut self,
        condition: NodeId,
        then: NodeId,
        otherwise: NodeId,
        constraints: Constraints,
    ) -> Result<NodeId, GraphError> {
        self.add(Node::conditional(condition, then, otherwise, constraints)?)
    }

    pub fn raw(&mut self, document: Value, constraints: Constraints) -> Result<NodeId, GraphError> {
        self.add(Node::raw(document, constraints)?)
    }

    /// Look up a defined node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Whether the handle was issued by this graph (defined or only reserved).
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Identifier cache, living as long as the arena.
    pub fn identifiers(&self) -> &IdentifierCache {
        &self.identifiers
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    fn check_children(&self, node: &Node) -> Result<(), GraphError> {
        match node.children().into_iter().find(|child| !self.contains(*child)) {
            Some(node) => Err(GraphError::UnknownNode { node }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handles_are_sequential() {
        let mut graph = SchemaGraph::new();
        let a = graph.string(Constraints::new()).unwrap();
        let b = graph.number(Constraints::new()).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn rejects_foreign_handles() {
        let mut other = SchemaGraph::new();
        other.string(Constraints::new()).unwrap();
        let foreign = other.string(Constraints::new()).unwrap();

        let mut graph = SchemaGraph::new();
        let err = graph.not(foreign, Constraints::new()).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode { node: foreign });
    }

    #[test]
    fn reserved_handle_defined_once() {
        let mut graph = SchemaGraph::new();
        let id = graph.reserve();
        assert!(graph.contains(id));
        assert!(graph.get(id).is_none());

        graph.define_object(id, ObjectSchema::new()).unwrap();
        assert!(graph.get(id).is_some());

        let err = graph.define_object(id, ObjectSchema::new()).unwrap_err();
        assert_eq!(err, GraphError::AlreadyDefined { node: id });
    }

    #[test]
    fn define_may_reference_itself() {
        let mut graph = SchemaGraph::new();
        let id = graph.reserve();
        graph
            .define_object(id, ObjectSchema::new().property("next", id))
            .unwrap();
        assert_eq!(graph.get(id).unwrap().children(), vec![id]);
    }

    #[test]
    fn raw_constructor() {
        let mut graph = SchemaGraph::new();
        let id = graph
            .raw(json!({ "type": "string" }), Constraints::new().name("Text"))
            .unwrap();
        assert_eq!(graph.get(id).unwrap().name(), Some("Text"));
    }
}
