//! Error types for graph construction, resolution, loading and validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::node::NodeId;

/// Errors while building a schema graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("{keyword} requires at least one member schema")]
    EmptyComposition { keyword: &'static str },

    #[error("node {node} does not belong to this graph")]
    UnknownNode { node: NodeId },

    #[error("node {node} is already defined")]
    AlreadyDefined { node: NodeId },

    #[error("\"{keyword}\" is structural and cannot be set in a constraint bag")]
    ReservedKeyword { keyword: String },

    #[error("raw schema must be an object or boolean, got {actual}")]
    InvalidRaw { actual: String },
}

/// Errors during graph resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("node {node} does not belong to this graph")]
    UnknownNode { node: NodeId },

    #[error("node {node} was reserved but never defined")]
    UndefinedNode { node: NodeId },

    #[error("node {node} re-entered itself before it was assigned an identifier")]
    UnresolvedCycle { node: NodeId },
}

/// Errors while loading documents and instance values.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Failures at the validation engine boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("validation engine could not be initialized: {message}")]
    EngineInitialization { message: String },

    #[error("{}", compile_message(title.as_deref(), message))]
    Compilation {
        title: Option<String>,
        message: String,
    },

    #[error("validation aborted: {message}")]
    Runtime { message: String },
}

fn compile_message(title: Option<&str>, message: &str) -> String {
    match title {
        Some(title) => format!("schema \"{}\" failed to compile: {}", title, message),
        None => format!("schema failed to compile: {}", message),
    }
}

impl AdapterError {
    /// Machine-readable kind reported in [`ErrorDetail::keyword`].
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EngineInitialization { .. } => FailureKind::EngineInitialization,
            Self::Compilation { .. } => FailureKind::Compilation,
            Self::Runtime { .. } => FailureKind::RuntimeValidation,
        }
    }
}

/// Kinds of failure that are not ordinary validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    SchemaGeneration,
    EngineInitialization,
    Compilation,
    RuntimeValidation,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::SchemaGeneration => "schema-generation",
            FailureKind::EngineInitialization => "engine-initialization",
            FailureKind::Compilation => "compilation",
            FailureKind::RuntimeValidation => "runtime-validation",
        }
    }
}

/// Single validation error with location context.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Failing keyword (`minLength`, `required`, ...) or a [`FailureKind`] name.
    pub keyword: String,
    /// Human-readable error message.
    pub message: String,
    /// JSON Pointer into the schema document.
    pub schema_path: String,
    /// JSON Pointer (RFC 6901) into the instance.
    pub instance_path: String,
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.instance_path, self.message)
    }
}

/// Outcome of checking one value.
///
/// `errors` is `None` when the value is valid.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Option<Vec<ErrorDetail>>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: None,
        }
    }

    pub fn invalid(errors: Vec<ErrorDetail>) -> Self {
        Self {
            valid: false,
            errors: Some(errors),
        }
    }

    /// A failed result carrying a single non-validation error.
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::invalid(vec![ErrorDetail {
            keyword: kind.as_str().to_string(),
            message: message.into(),
            schema_path: String::new(),
            instance_path: String::new(),
        }])
    }

    /// The error list, empty for valid results.
    pub fn errors(&self) -> &[ErrorDetail] {
        self.errors.as_deref().unwrap_or_default()
    }
}

impl From<AdapterError> for ValidationResult {
    fn from(err: AdapterError) -> Self {
        ValidationResult::failure(err.kind(), err.to_string())
    }
}

impl From<ResolveError> for ValidationResult {
    fn from(err: ResolveError) -> Self {
        ValidationResult::failure(FailureKind::SchemaGeneration, err.to_string())
    }
}
