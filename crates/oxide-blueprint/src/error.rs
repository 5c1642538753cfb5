//! Error types for live introspection and file loading.

use std::path::PathBuf;

use oxide_blueprint_core::SchemaError;

/// Errors that can occur while reading a schema or a blueprint.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    /// Database error while reading the schema.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading blueprint or snapshot files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a JSON file.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compilation error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The introspected table doesn't exist.
    #[error("Table '{0}' doesn't exist")]
    TableNotFound(String),
}

/// Result type for introspection operations.
pub type Result<T> = std::result::Result<T, IntrospectError>;
