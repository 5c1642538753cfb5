//! Error types for blueprint compilation.

use crate::grammar::Dialect;

/// Errors that can occur while compiling a blueprint.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The dialect (or the connection platform) cannot perform an operation.
    #[error("{dialect} doesn't support {feature}.")]
    UnsupportedOperation {
        /// Dialect lacking the feature.
        dialect: Dialect,
        /// Description of the missing feature.
        feature: String,
    },

    /// Several rebuild-only commands were combined in one modification.
    #[error(
        "{dialect} doesn't support multiple calls to dropColumn / renameColumn in a single modification."
    )]
    UnsupportedCombination {
        /// Dialect that cannot combine the commands.
        dialect: Dialect,
    },

    /// The introspected table does not exist.
    #[error("Table '{0}' doesn't exist")]
    UnknownTable(String),

    /// A command references a column the table doesn't have.
    #[error("Column '{column}' doesn't exist on table '{table}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A command references an index the table doesn't have.
    #[error("Index '{index}' doesn't exist on table '{table}'")]
    UnknownIndex {
        /// Table name.
        table: String,
        /// Missing index.
        index: String,
    },

    /// The blueprint itself is malformed.
    #[error("Invalid blueprint: {0}")]
    InvalidBlueprint(String),

    /// The introspection source failed.
    #[error("Failed to introspect table '{table}': {source}")]
    Introspection {
        /// Table being introspected.
        table: String,
        /// Underlying driver error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SchemaError {
    /// Creates an [`SchemaError::UnsupportedOperation`].
    pub fn unsupported(dialect: Dialect, feature: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            dialect,
            feature: feature.into(),
        }
    }
}

/// Result type for blueprint compilation.
pub type Result<T> = std::result::Result<T, SchemaError>;
