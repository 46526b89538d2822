//! Shared keyword tables and resolution options.

use serde_json::Value;

/// Namespace used for identifiers when none is configured.
pub const DEFAULT_NAMESPACE: &str = "schema";

/// Composition keywords; a keyword set holding any of these is never "simple".
pub const COMPOSITION_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf"];

/// Keywords produced from a node's shape, never accepted in a constraint bag.
pub const STRUCTURAL_KEYWORDS: &[&str] = &[
    "type",
    "$id",
    "properties",
    "required",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
    "items",
    "prefixItems",
    "contains",
    "unevaluatedItems",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
];

/// Annotation keywords, ignored when judging whether a keyword set is simple.
pub const ANNOTATION_KEYWORDS: &[&str] = &[
    "title",
    "description",
    "$comment",
    "default",
    "examples",
    "deprecated",
    "readOnly",
    "writeOnly",
];

/// Keywords that need dynamic-scope reference support in the engine.
pub const DYNAMIC_REF_KEYWORDS: &[&str] = &[
    "$dynamicRef",
    "$dynamicAnchor",
    "$recursiveRef",
    "$recursiveAnchor",
];

/// Keywords that need unevaluated-location tracking in the engine.
pub const UNEVALUATED_KEYWORDS: &[&str] = &["unevaluatedProperties", "unevaluatedItems"];

/// Every keyword of the draft 2020-12 vocabularies.
pub const DRAFT_2020_12_KEYWORDS: &[&str] = &[
    // core
    "$schema",
    "$id",
    "$ref",
    "$anchor",
    "$dynamicRef",
    "$dynamicAnchor",
    "$vocabulary",
    "$comment",
    "$defs",
    // applicator
    "prefixItems",
    "items",
    "contains",
    "additionalProperties",
    "properties",
    "patternProperties",
    "dependentSchemas",
    "propertyNames",
    "if",
    "then",
    "else",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    // unevaluated
    "unevaluatedItems",
    "unevaluatedProperties",
    // validation
    "type",
    "const",
    "enum",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "maxContains",
    "minContains",
    "maxProperties",
    "minProperties",
    "required",
    "dependentRequired",
    // meta-data
    "title",
    "description",
    "default",
    "deprecated",
    "readOnly",
    "writeOnly",
    "examples",
    // format, content
    "format",
    "contentEncoding",
    "contentMediaType",
    "contentSchema",
];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How the resolver treats a node that re-enters itself before it has an
/// identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Lift the re-entered node and point the inner site at it with `$ref`.
    #[default]
    Lift,
    /// Fail with [`ResolveError::UnresolvedCycle`](crate::ResolveError::UnresolvedCycle).
    /// Cycles must then be written with explicit `$anchor`/`$ref` keywords.
    Reject,
}

/// Options for graph resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Prefix of every generated identifier (`<namespace>:<name>`).
    pub namespace: String,
    /// Explicit logical name for the root node. Forces the root to be lifted.
    pub name: Option<String>,
    pub cycle_policy: CyclePolicy,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            name: None,
            cycle_policy: CyclePolicy::default(),
        }
    }

    /// Set the identifier namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Request the root node be lifted under this logical name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }
}
