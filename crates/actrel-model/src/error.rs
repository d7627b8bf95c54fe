//! Error types for model resolution and constraint assembly.

use std::path::PathBuf;

use actrel_core::GraphError;

/// The model reader could not resolve a class, attribute or connector end.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("class '{0}' not found in model")]
    UnknownClass(String),

    #[error("class '{0}' declared more than once")]
    DuplicateClass(String),

    #[error("class '{class}' extends unknown class '{parent}'")]
    UnknownParent { class: String, parent: String },

    #[error("class '{0}' is its own ancestor")]
    CyclicParent(String),

    #[error("attribute '{field}' declared twice in class '{class}' or its ancestors")]
    DuplicateField { class: String, field: String },

    #[error("connector in class '{class}' references unknown step '{step}'")]
    UnknownEdgeEnd { class: String, step: String },

    #[error("unsupported model format: {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("reading model {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

/// The declarations handed to the assembler are inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("field '{field}' has undeclared type '{type_name}'")]
    UnknownFieldType { field: String, type_name: String },

    #[error("ordering for '{signature}' refers to '{step}', which is not one of its fields")]
    UnknownStep { signature: String, step: String },

    #[error("signature '{0}' is not declared")]
    UnknownSignature(String),

    #[error("signature '{0}' declared more than once")]
    DuplicateSignature(String),

    #[error("no library predicate or function named '{0}'")]
    UnknownFunction(String),

    #[error("'{name}' takes {expected} argument(s), {found} given")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
}
