//! Error types for the schema compiler

use std::fmt;

use thiserror::Error;

use crate::source::SchemaFile;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema compiler errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unknown type: {name}{}", did_you_mean(.suggestion))]
    UnknownType {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Type {name} is already defined in {defined_in}")]
    DuplicateType { name: String, defined_in: String },

    #[error("Module {module} for type {type_name} was already generated for another type")]
    ModuleCollision { module: String, type_name: String },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Unresolved(UnresolvedSchemas),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean {}?)", s),
        None => String::new(),
    }
}

impl SchemaError {
    /// Whether this is the aggregate permanent-failure error of a run
    pub fn is_unresolved(&self) -> bool {
        matches!(self, SchemaError::Unresolved(_))
    }
}

/// One schema file that never compiled, with its last diagnostic
#[derive(Debug)]
pub struct UnresolvedSchema {
    pub file: SchemaFile,
    pub error: SchemaError,
}

/// Every file left pending after a pass that made no progress.
///
/// Entries are kept in enumeration order.
#[derive(Debug, Default)]
pub struct UnresolvedSchemas {
    entries: Vec<UnresolvedSchema>,
}

impl UnresolvedSchemas {
    pub fn new(entries: Vec<UnresolvedSchema>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[UnresolvedSchema] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &SchemaFile> {
        self.entries.iter().map(|e| &e.file)
    }

    /// Last diagnostic recorded for `file`
    pub fn error_for(&self, file: &SchemaFile) -> Option<&SchemaError> {
        self.entries.iter().find(|e| &e.file == file).map(|e| &e.error)
    }

    pub fn file_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.file.name()).collect()
    }
}

impl fmt::Display for UnresolvedSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to resolve dependencies for [{}]: circular dependencies or missing types",
            self.file_names().join(", ")
        )
    }
}
