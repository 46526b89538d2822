//! Fragment node shapes and their construction inputs.
//!
//! A [`Node`] is one fragment of a schema graph. Nodes are immutable once
//! built and refer to each other through [`NodeId`] handles issued by a
//! [`SchemaGraph`](crate::SchemaGraph).

use std::fmt;

use serde_json::{Map, Value};

use crate::error::GraphError;
use crate::types::{json_type_name, STRUCTURAL_KEYWORDS};

/// Stable handle of a node inside its graph arena.
///
/// Handles are the identity of a node: two nodes with equal content but
/// different handles are different nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A slot that holds either a boolean schema or a nested node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Bool(bool),
    Node(NodeId),
}

impl From<bool> for Slot {
    fn from(value: bool) -> Self {
        Slot::Bool(value)
    }
}

impl From<NodeId> for Slot {
    fn from(node: NodeId) -> Self {
        Slot::Node(node)
    }
}

impl Slot {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Slot::Node(id) => Some(*id),
            Slot::Bool(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl PrimitiveKind {
    /// The `type` keyword value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Null => "null",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(PrimitiveKind::String),
            "number" => Some(PrimitiveKind::Number),
            "integer" => Some(PrimitiveKind::Integer),
            "boolean" => Some(PrimitiveKind::Boolean),
            "null" => Some(PrimitiveKind::Null),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionKind {
    AllOf,
    AnyOf,
    OneOf,
}

impl CompositionKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CompositionKind::AllOf => "allOf",
            CompositionKind::AnyOf => "anyOf",
            CompositionKind::OneOf => "oneOf",
        }
    }
}

/// Constraint bag shared by every node constructor.
///
/// Holds pass-through keywords (bounds, pattern, format, annotations, ...)
/// and the node's optional logical name. Structural keywords are rejected
/// when the bag is turned into a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    name: Option<String>,
    keywords: Map<String, Value>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical name; a named node is always lifted as `<namespace>:<name>`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set any pass-through keyword verbatim.
    pub fn keyword(mut self, keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(keyword.into(), value.into());
        self
    }

    pub fn min_length(self, n: u64) -> Self {
        self.keyword("minLength", n)
    }

    pub fn max_length(self, n: u64) -> Self {
        self.keyword("maxLength", n)
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.keyword("pattern", pattern.into())
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.keyword("format", format.into())
    }

    pub fn minimum(self, n: impl Into<Value>) -> Self {
        self.keyword("minimum", n)
    }

    pub fn maximum(self, n: impl Into<Value>) -> Self {
        self.keyword("maximum", n)
    }

    pub fn exclusive_minimum(self, n: impl Into<Value>) -> Self {
        self.keyword("exclusiveMinimum", n)
    }

    pub fn exclusive_maximum(self, n: impl Into<Value>) -> Self {
        self.keyword("exclusiveMaximum", n)
    }

    pub fn multiple_of(self, n: impl Into<Value>) -> Self {
        self.keyword("multipleOf", n)
    }

    pub fn enumeration<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.keyword("enum", values)
    }

    pub fn constant(self, value: impl Into<Value>) -> Self {
        self.keyword("const", value)
    }

    pub fn content_encoding(self, encoding: impl Into<String>) -> Self {
        self.keyword("contentEncoding", encoding.into())
    }

    pub fn content_media_type(self, media_type: impl Into<String>) -> Self {
        self.keyword("contentMediaType", media_type.into())
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        self.keyword("title", title.into())
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.keyword("description", description.into())
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.keyword("default", value)
    }

    pub fn examples<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.keyword("examples", values)
    }

    pub fn deprecated(self, deprecated: bool) -> Self {
        self.keyword("deprecated", deprecated)
    }

    pub fn read_only(self, read_only: bool) -> Self {
        self.keyword("readOnly", read_only)
    }

    pub fn write_only(self, write_only: bool) -> Self {
        self.keyword("writeOnly", write_only)
    }

    pub fn comment(self, comment: impl Into<String>) -> Self {
        self.keyword("$comment", comment.into())
    }

    pub fn logical_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn keywords(&self) -> &Map<String, Value> {
        &self.keywords
    }

    fn merge(&mut self, other: Constraints) {
        if other.name.is_some() {
            self.name = other.name;
        }
        self.keywords.extend(other.keywords);
    }

    fn check(&self) -> Result<(), GraphError> {
        match self
            .keywords
            .keys()
            .find(|k| STRUCTURAL_KEYWORDS.contains(&k.as_str()))
        {
            Some(keyword) => Err(GraphError::ReservedKeyword {
                keyword: keyword.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Construction input for an object node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub(crate) properties: Vec<(String, NodeId)>,
    pub(crate) required: Vec<String>,
    pub(crate) pattern_properties: Vec<(String, NodeId)>,
    pub(crate) additional_properties: Option<Slot>,
    pub(crate) unevaluated_properties: Option<Slot>,
    pub(crate) dependent_required: Vec<(String, Vec<String>)>,
    pub(crate) dependent_schemas: Vec<(String, NodeId)>,
    pub(crate) property_names: Option<NodeId>,
    pub(crate) constraints: Constraints,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property; re-adding a name replaces its schema in place.
    pub fn property(mut self, name: impl Into<String>, node: NodeId) -> Self {
        upsert(&mut self.properties, name.into(), node);
        self
    }

    /// Add a property and mark it required.
    pub fn required_property(self, name: impl Into<String>, node: NodeId) -> Self {
        let name = name.into();
        self.property(name.clone(), node).required([name])
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.required.contains(&name) {
                self.required.push(name);
            }
        }
        self
    }

    pub fn pattern_property(mut self, pattern: impl Into<String>, node: NodeId) -> Self {
        upsert(&mut self.pattern_properties, pattern.into(), node);
        self
    }

    pub fn additional_properties(mut self, slot: impl Into<Slot>) -> Self {
        self.additional_properties = Some(slot.into());
        self
    }

    pub fn unevaluated_properties(mut self, slot: impl Into<Slot>) -> Self {
        self.unevaluated_properties = Some(slot.into());
        self
    }

    pub fn dependent_required<I, S>(mut self, property: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let property = property.into();
        match self.dependent_required.iter_mut().find(|(k, _)| *k == property) {
            Some(entry) => entry.1 = names,
            None => self.dependent_required.push((property, names)),
        }
        self
    }

    pub fn dependent_schema(mut self, property: impl Into<String>, node: NodeId) -> Self {
        upsert(&mut self.dependent_schemas, property.into(), node);
        self
    }

    pub fn property_names(mut self, node: NodeId) -> Self {
        self.property_names = Some(node);
        self
    }

    pub fn min_properties(mut self, n: u64) -> Self {
        self.constraints = self.constraints.keyword("minProperties", n);
        self
    }

    pub fn max_properties(mut self, n: u64) -> Self {
        self.constraints = self.constraints.keyword("maxProperties", n);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.constraints = self.constraints.name(name);
        self
    }

    /// Merge a constraint bag (annotations and other pass-through keywords)
    /// into the one already built up; incoming entries win.
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints.merge(constraints);
        self
    }
}

/// Construction input for an array node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySchema {
    pub(crate) items: Option<Slot>,
    pub(crate) prefix_items: Vec<NodeId>,
    pub(crate) contains: Option<NodeId>,
    pub(crate) unevaluated_items: Option<Slot>,
    pub(crate) constraints: Constraints,
}

impl ArraySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(mut self, slot: impl Into<Slot>) -> Self {
        self.items = Some(slot.into());
        self
    }

    /// Append a positional schema (tuple form).
    pub fn prefix_item(mut self, node: NodeId) -> Self {
        self.prefix_items.push(node);
        self
    }

    pub fn contains(mut self, node: NodeId) -> Self {
        self.contains = Some(node);
        self
    }

    pub fn min_contains(mut self, n: u64) -> Self {
        self.constraints = self.constraints.keyword("minContains", n);
        self
    }

    pub fn max_contains(mut self, n: u64) -> Self {
        self.constraints = self.constraints.keyword("maxContains", n);
        self
    }

    pub fn min_items(mut self, n: u64) -> Self {
        self.constraints = self.constraints.keyword("minItems", n);
        self
    }

    pub fn max_items(mut self, n: u64) -> Self {
        self.constraints = self.constraints.keyword("maxItems", n);
        self
    }

    pub fn unique_items(mut self, unique: bool) -> Self {
        self.constraints = self.constraints.keyword("uniqueItems", unique);
        self
    }

    pub fn unevaluated_items(mut self, slot: impl Into<Slot>) -> Self {
        self.unevaluated_items = Some(slot.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.constraints = self.constraints.name(name);
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints.merge(constraints);
        self
    }
}

/// Shape kind of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Primitive(PrimitiveKind),
    Object(ObjectSchema),
    Array(ArraySchema),
    Composition {
        kind: CompositionKind,
        members: Vec<NodeId>,
    },
    Not(NodeId),
    Conditional {
        condition: NodeId,
        then: NodeId,
        otherwise: NodeId,
    },
    /// Already-shaped document, emitted as-is.
    Raw(Value),
}

/// One fragment of a schema graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    shape: Shape,
    constraints: Constraints,
}

impl Node {
    pub fn primitive(kind: PrimitiveKind, constraints: Constraints) -> Result<Self, GraphError> {
        Self::build(Shape::Primitive(kind), constraints)
    }

    pub fn object(mut schema: ObjectSchema) -> Result<Self, GraphError> {
        let constraints = std::mem::take(&mut schema.constraints);
        Self::build(Shape::Object(schema), constraints)
    }

    pub fn array(mut schema: ArraySchema) -> Result<Self, GraphError> {
        let constraints = std::mem::take(&mut schema.constraints);
        Self::build(Shape::Array(schema), constraints)
    }

    /// Composition node; at least one member is required.
    pub fn composition(
        kind: CompositionKind,
        members: Vec<NodeId>,
        constraints: Constraints,
    ) -> Result<Self, GraphError> {
        if members.is_empty() {
            return Err(GraphError::EmptyComposition {
                keyword: kind.keyword(),
            });
        }
        Self::build(Shape::Composition { kind, members }, constraints)
    }

    pub fn negation(inner: NodeId, constraints: Constraints) -> Result<Self, GraphError> {
        Self::build(Shape::Not(inner), constraints)
    }

    pub fn conditional(
        condition: NodeId,
        then: NodeId,
        otherwise: NodeId,
        constraints: Constraints,
    ) -> Result<Self, GraphError> {
        Self::build(
            Shape::Conditional {
                condition,
                then,
                otherwise,
            },
            constraints,
        )
    }

    /// Pass-through document. Only the logical name and keywords of the
    /// constraint bag apply; the document's own keywords take precedence.
    pub fn raw(document: Value, constraints: Constraints) -> Result<Self, GraphError> {
        match &document {
            Value::Object(_) => {}
            Value::Bool(_) if constraints.keywords.is_empty() => {}
            Value::Bool(_) => {
                return Err(GraphError::InvalidRaw {
                    actual: "boolean with extra keywords".to_string(),
                })
            }
            other => {
                return Err(GraphError::InvalidRaw {
                    actual: json_type_name(other).to_string(),
                })
            }
        }
        // Raw documents are opaque, so their structural keywords are kept.
        Ok(Self {
            shape: Shape::Raw(document),
            constraints,
        })
    }

    fn build(shape: Shape, constraints: Constraints) -> Result<Self, GraphError> {
        constraints.check()?;
        Ok(Self { shape, constraints })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn name(&self) -> Option<&str> {
        self.constraints.logical_name()
    }

    pub fn keywords(&self) -> &Map<String, Value> {
        self.constraints.keywords()
    }

    /// Every node referenced from a schema-bearing slot, in emission order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match &self.shape {
            Shape::Primitive(_) | Shape::Raw(_) => {}
            Shape::Composition { members, .. } => out.extend(members.iter().copied()),
            Shape::Not(inner) => out.push(*inner),
            Shape::Conditional {
                condition,
                then,
                otherwise,
            } => out.extend([*condition, *then, *otherwise]),
            Shape::Object(obj) => {
                out.extend(obj.properties.iter().map(|(_, id)| *id));
                out.extend(obj.pattern_properties.iter().map(|(_, id)| *id));
                out.extend(obj.additional_properties.and_then(|s| s.node()));
                out.extend(obj.unevaluated_properties.and_then(|s| s.node()));
                out.extend(obj.dependent_schemas.iter().map(|(_, id)| *id));
                out.extend(obj.property_names);
            }
            Shape::Array(arr) => {
                out.extend(arr.items.and_then(|s| s.node()));
                out.extend(arr.prefix_items.iter().copied());
                out.extend(arr.contains);
                out.extend(arr.unevaluated_items.and_then(|s| s.node()));
            }
        }
        out
    }
}

fn upsert(entries: &mut Vec<(String, NodeId)>, key: String, node: NodeId) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = node,
        None => entries.push((key, node)),
    }
}
