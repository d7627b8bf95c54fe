//! Translation error types.

use std::path::PathBuf;

use actrel_core::TopologyError;
use actrel_model::{ConfigurationError, ModelError};

/// Errors that can occur while translating one class.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// The model could not be resolved.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// The behavior graph has an unclassifiable shape.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// The assembled declarations are inconsistent.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The output could not be written.
    #[error("I/O error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for translation operations.
pub type Result<T> = std::result::Result<T, TranslateError>;

/// A failed translation, tagged with the class it was for.
#[derive(Debug, thiserror::Error)]
#[error("{class}: {error}")]
pub struct ClassError {
    pub class: String,
    pub error: TranslateError,
}
