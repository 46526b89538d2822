//! Value validation against resolved documents.
//!
//! The checking itself is done by the `jsonschema` engine (draft 2020-12).
//! This module decides which engine capabilities a document needs, and turns
//! every engine failure into a [`ValidationResult`] instead of an error or a
//! panic.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use jsonschema::paths::{LazyLocation, Location};
use jsonschema::{Draft, Keyword, ValidationError};
use serde_json::Value;

use crate::error::{AdapterError, ErrorDetail, ValidationResult};
use crate::graph::SchemaGraph;
use crate::node::NodeId;
use crate::resolver::resolve;
use crate::types::{
    ResolveOptions, DRAFT_2020_12_KEYWORDS, DYNAMIC_REF_KEYWORDS, UNEVALUATED_KEYWORDS,
};

type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type KeywordCheck = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Engine capabilities a document relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// `$dynamicRef`/`$dynamicAnchor` (or their draft 2019-09 forms).
    pub dynamic_refs: bool,
    /// `unevaluatedProperties`/`unevaluatedItems`.
    pub unevaluated: bool,
}

/// Scan a document for keywords that need extended engine support.
pub fn detect_capabilities(document: &Value) -> Capabilities {
    let mut found = Capabilities::default();
    scan_keywords(document, &mut found);
    found
}

fn scan_keywords(value: &Value, found: &mut Capabilities) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if DYNAMIC_REF_KEYWORDS.contains(&key.as_str()) {
                    found.dynamic_refs = true;
                }
                if UNEVALUATED_KEYWORDS.contains(&key.as_str()) {
                    found.unevaluated = true;
                }
                scan_keywords(child, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                scan_keywords(item, found);
            }
        }
        _ => {}
    }
}

/// Options passed through to the validation engine.
#[derive(Clone)]
pub struct ValidationOptions {
    /// Report every error instead of stopping at the first.
    pub all_errors: bool,
    /// Reject documents using keywords outside draft 2020-12 and the
    /// registered vocabulary.
    pub strict: bool,
    /// Enabled automatically when the document needs it.
    pub dynamic_refs: bool,
    /// Enabled automatically when the document needs it.
    pub unevaluated: bool,
    /// Assert the `format` keyword instead of treating it as an annotation.
    pub validate_formats: bool,
    formats: Vec<(String, FormatCheck)>,
    keywords: Vec<(String, KeywordCheck)>,
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("all_errors", &self.all_errors)
            .field("strict", &self.strict)
            .field("dynamic_refs", &self.dynamic_refs)
            .field("unevaluated", &self.unevaluated)
            .field("validate_formats", &self.validate_formats)
            .field(
                "formats",
                &self.formats.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field(
                "keywords",
                &self.keywords.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationOptions {
    /// All errors collected, formats asserted, strict mode off.
    pub fn new() -> Self {
        Self {
            all_errors: true,
            strict: false,
            dynamic_refs: false,
            unevaluated: false,
            validate_formats: true,
            formats: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn all_errors(mut self, all_errors: bool) -> Self {
        self.all_errors = all_errors;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn dynamic_refs(mut self, enabled: bool) -> Self {
        self.dynamic_refs = enabled;
        self
    }

    pub fn unevaluated(mut self, enabled: bool) -> Self {
        self.unevaluated = enabled;
        self
    }

    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    /// Register a custom `format` checker.
    pub fn with_format<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.formats.push((name.into(), Arc::new(check)));
        self
    }

    /// Register a custom keyword.
    ///
    /// `check` receives the keyword's value from the schema and the instance,
    /// and returns whether the instance passes. Strict mode accepts
    /// registered keywords.
    pub fn with_keyword<F>(mut self, keyword: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.keywords.push((keyword.into(), Arc::new(check)));
        self
    }

    /// Capabilities after auto-enabling what `document` needs.
    pub fn capabilities_for(&self, document: &Value) -> Capabilities {
        let detected = detect_capabilities(document);
        Capabilities {
            dynamic_refs: self.dynamic_refs || detected.dynamic_refs,
            unevaluated: self.unevaluated || detected.unevaluated,
        }
    }

    fn check_extensions(&self) -> Result<(), AdapterError> {
        for (name, _) in &self.formats {
            if name.trim().is_empty() {
                return Err(AdapterError::EngineInitialization {
                    message: "custom format name is empty".to_string(),
                });
            }
        }
        for (keyword, _) in &self.keywords {
            if keyword.trim().is_empty() {
                return Err(AdapterError::EngineInitialization {
                    message: "custom keyword name is empty".to_string(),
                });
            }
            if DRAFT_2020_12_KEYWORDS.contains(&keyword.as_str()) {
                return Err(AdapterError::EngineInitialization {
                    message: format!("custom keyword \"{}\" shadows a standard keyword", keyword),
                });
            }
        }
        Ok(())
    }
}

/// A compiled document, reusable across many values.
pub struct SchemaValidator {
    inner: jsonschema::Validator,
    all_errors: bool,
    capabilities: Capabilities,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("all_errors", &self.all_errors)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile a resolved document.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::EngineInitialization` for unusable options and
    /// `AdapterError::Compilation` when the document is not a valid schema.
    pub fn compile(document: &Value, options: &ValidationOptions) -> Result<Self, AdapterError> {
        let capabilities = options.capabilities_for(document);
        tracing::debug!(
            dynamic_refs = capabilities.dynamic_refs,
            unevaluated = capabilities.unevaluated,
            strict = options.strict,
            "compiling schema"
        );

        options.check_extensions()?;

        let title = document
            .get("title")
            .and_then(Value::as_str)
            .map(String::from);

        if options.strict {
            let known: Vec<String> = options
                .keywords
                .iter()
                .map(|(name, _)| name.clone())
                .collect();
            if let Some(location) = find_unknown_keyword(document, "", &known) {
                return Err(AdapterError::Compilation {
                    title,
                    message: format!("unknown keyword at {}", location),
                });
            }
        }

        let built = catch_unwind(AssertUnwindSafe(|| {
            let mut engine = jsonschema::options();
            engine
                .with_draft(Draft::Draft202012)
                .should_validate_formats(options.validate_formats);
            for (name, check) in &options.formats {
                let check = Arc::clone(check);
                engine.with_format(name.clone(), move |value: &str| check(value));
            }
            for (name, check) in &options.keywords {
                let name = name.clone();
                let check = Arc::clone(check);
                engine.with_keyword(name.clone(), move |_, value, location| {
                    Ok(Box::new(CustomKeyword {
                        name: name.clone(),
                        value: value.clone(),
                        location,
                        check: Arc::clone(&check),
                    }))
                });
            }
            engine.build(document)
        }))
        .map_err(|panic| AdapterError::EngineInitialization {
            message: panic_message(panic),
        })?;

        let inner = built.map_err(|e| AdapterError::Compilation {
            title,
            message: e.to_string(),
        })?;

        Ok(Self {
            inner,
            all_errors: options.all_errors,
            capabilities,
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Check one value. Never panics; engine faults become
    /// `runtime-validation` failures.
    pub fn check(&self, instance: &Value) -> ValidationResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let errors = self.inner.iter_errors(instance).map(|e| ErrorDetail {
                keyword: keyword_of(&e.schema_path.to_string()),
                message: e.to_string(),
                schema_path: e.schema_path.to_string(),
                instance_path: e.instance_path.to_string(),
            });
            if self.all_errors {
                errors.collect::<Vec<_>>()
            } else {
                errors.take(1).collect()
            }
        }));

        match outcome {
            Ok(errors) if errors.is_empty() => ValidationResult::success(),
            Ok(errors) => ValidationResult::invalid(errors),
            Err(panic) => {
                let err = AdapterError::Runtime {
                    message: panic_message(panic),
                };
                tracing::warn!(error = %err, "validation engine fault");
                err.into()
            }
        }
    }
}

/// Resolve `root` and validate `instance` against the resulting document.
///
/// Never fails: resolution problems are reported as `schema-generation`
/// errors in the result.
pub fn validate(
    graph: &SchemaGraph,
    root: NodeId,
    instance: &Value,
    resolve_options: &ResolveOptions,
    options: &ValidationOptions,
) -> ValidationResult {
    let document = match resolve(graph, root, resolve_options) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(error = %err, "schema generation failed");
            return err.into();
        }
    };
    validate_against_schema(&document, instance, options)
}

/// Validate a value against an already-resolved document.
///
/// Compile once with [`SchemaValidator::compile`] instead when checking many
/// values.
pub fn validate_against_schema(
    document: &Value,
    instance: &Value,
    options: &ValidationOptions,
) -> ValidationResult {
    match SchemaValidator::compile(document, options) {
        Ok(validator) => validator.check(instance),
        Err(err) => {
            tracing::warn!(error = %err, "schema compilation failed");
            err.into()
        }
    }
}

/// Engine-side instance of a keyword registered with
/// [`ValidationOptions::with_keyword`].
struct CustomKeyword {
    name: String,
    value: Value,
    location: Location,
    check: KeywordCheck,
}

impl Keyword for CustomKeyword {
    fn validate<'i>(
        &self,
        instance: &'i Value,
        location: &LazyLocation,
    ) -> Result<(), ValidationError<'i>> {
        if self.is_valid(instance) {
            return Ok(());
        }
        Err(ValidationError::custom(
            self.location.clone(),
            location.into(),
            instance,
            format!("{} does not satisfy \"{}\"", instance, self.name),
        ))
    }

    fn is_valid(&self, instance: &Value) -> bool {
        (self.check)(&self.value, instance)
    }
}

fn keyword_of(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("schema")
        .replace("~1", "/")
        .replace("~0", "~")
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown engine fault".to_string()
    }
}

/// Location (JSON Pointer) of the first keyword unknown to draft 2020-12
/// and `extra`, walking every subschema position.
fn find_unknown_keyword(schema: &Value, path: &str, extra: &[String]) -> Option<String> {
    let Value::Object(map) = schema else {
        return None;
    };

    for (key, value) in map {
        let child_path = format!("{}/{}", path, escape_pointer(key));
        if !DRAFT_2020_12_KEYWORDS.contains(&key.as_str()) && !extra.contains(key) {
            return Some(child_path);
        }

        let found = match key.as_str() {
            "properties" | "patternProperties" | "dependentSchemas" | "$defs" => value
                .as_object()
                .into_iter()
                .flatten()
                .find_map(|(name, sub)| {
                    let sub_path = format!("{}/{}", child_path, escape_pointer(name));
                    find_unknown_keyword(sub, &sub_path, extra)
                }),
            "prefixItems" | "allOf" | "anyOf" | "oneOf" => value
                .as_array()
                .into_iter()
                .flatten()
                .enumerate()
                .find_map(|(i, sub)| {
                    find_unknown_keyword(sub, &format!("{}/{}", child_path, i), extra)
                }),
            "items" | "contains" | "additionalProperties" | "unevaluatedProperties"
            | "unevaluatedItems" | "propertyNames" | "not" | "if" | "then" | "else"
            | "contentSchema" => find_unknown_keyword(value, &child_path, extra),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
