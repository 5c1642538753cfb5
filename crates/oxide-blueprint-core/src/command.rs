//! Blueprint commands.
//!
//! Defines every schema operation a [`Blueprint`](crate::Blueprint) can carry.

use serde::{Deserialize, Serialize};

/// Kind of index a command creates or drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Primary key.
    Primary,
    /// Unique index or constraint.
    Unique,
    /// Plain index.
    Index,
    /// Full-text index.
    Fulltext,
    /// Spatial index.
    Spatial,
}

impl IndexKind {
    /// Suffix used when inferring an index name.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Index => "index",
            Self::Fulltext => "fulltext",
            Self::Spatial => "spatialindex",
        }
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set the referencing column to NULL.
    SetNull,
    /// Set the referencing column to its default.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "no action",
            Self::Restrict => "restrict",
            Self::Cascade => "cascade",
            Self::SetNull => "set null",
            Self::SetDefault => "set default",
        }
    }

    /// Parses an action as engines report it (`CASCADE`, `SET NULL`, ...).
    #[must_use]
    pub fn from_sql(action: &str) -> Option<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "no action" => Some(Self::NoAction),
            "restrict" => Some(Self::Restrict),
            "cascade" => Some(Self::Cascade),
            "set null" => Some(Self::SetNull),
            "set default" => Some(Self::SetDefault),
            _ => None,
        }
    }
}

/// Creates an index, unique constraint or primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCommand {
    /// Kind of index.
    pub kind: IndexKind,
    /// Index (or constraint) name; inferred when empty.
    #[serde(default)]
    pub name: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
}

/// Drops an index, unique constraint or primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropIndexCommand {
    /// Kind of index being dropped.
    pub kind: IndexKind,
    /// Index (or constraint) name.
    pub name: String,
}

/// Adds a foreign key constraint.
///
/// ```rust
/// use oxide_blueprint_core::{ForeignKeyAction, ForeignKeyCommand};
///
/// let foreign = ForeignKeyCommand::new(&["user_id"])
///     .references(&["id"])
///     .on("users")
///     .on_delete(ForeignKeyAction::Cascade);
/// assert_eq!(foreign.on, "users");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyCommand {
    /// Constraint name; inferred when empty.
    #[serde(default)]
    pub name: String,
    /// Referencing columns.
    pub columns: Vec<String>,
    /// Referenced columns.
    #[serde(default)]
    pub references: Vec<String>,
    /// Referenced table.
    #[serde(default)]
    pub on: String,
    /// ON DELETE action.
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
    /// ON UPDATE action.
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKeyCommand {
    /// Creates a foreign key over `columns` referencing `id` of no table yet.
    #[must_use]
    pub fn new(columns: &[&str]) -> Self {
        Self {
            name: String::new(),
            columns: columns.iter().map(|&c| c.to_string()).collect(),
            references: vec!["id".to_string()],
            on: String::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets an explicit constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the referenced columns.
    #[must_use]
    pub fn references(mut self, columns: &[&str]) -> Self {
        self.references = columns.iter().map(|&c| c.to_string()).collect();
        self
    }

    /// Sets the referenced table.
    #[must_use]
    pub fn on(mut self, table: impl Into<String>) -> Self {
        self.on = table.into();
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// A single schema operation on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Create the table from the blueprint's columns.
    #[serde(skip)]
    Create,
    /// Add every non-change column of the blueprint.
    #[serde(skip)]
    Add,
    /// Alter every `change` column of the blueprint.
    #[serde(skip)]
    Change,
    /// Rename a column.
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Drop one or more columns.
    DropColumn {
        /// Columns to drop.
        columns: Vec<String>,
    },
    /// Create an index.
    Index(IndexCommand),
    /// Drop an index.
    DropIndex(DropIndexCommand),
    /// Rename an index.
    RenameIndex {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Add a foreign key.
    Foreign(ForeignKeyCommand),
    /// Drop a foreign key.
    DropForeign {
        /// Constraint name.
        name: String,
    },
    /// Rename the table.
    Rename {
        /// New table name.
        to: String,
    },
    /// Drop the table.
    Drop,
    /// Drop the table if it exists.
    DropIfExists,
}

impl Command {
    /// Returns the command name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Add => "add",
            Self::Change => "change",
            Self::RenameColumn { .. } => "renameColumn",
            Self::DropColumn { .. } => "dropColumn",
            Self::Index(_) => "index",
            Self::DropIndex(_) => "dropIndex",
            Self::RenameIndex { .. } => "renameIndex",
            Self::Foreign(_) => "foreign",
            Self::DropForeign { .. } => "dropForeign",
            Self::Rename { .. } => "rename",
            Self::Drop => "drop",
            Self::DropIfExists => "dropIfExists",
        }
    }

    /// Returns true for commands that rewrite existing columns and therefore
    /// need a table rebuild where native alteration is unavailable.
    #[must_use]
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            Self::Change | Self::RenameColumn { .. } | Self::DropColumn { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_class() {
        assert!(Command::Change.requires_rebuild());
        assert!(
            Command::RenameColumn {
                from: "a".to_string(),
                to: "b".to_string(),
            }
            .requires_rebuild()
        );
        assert!(!Command::Add.requires_rebuild());
        assert!(
            !Command::DropForeign {
                name: "fk".to_string()
            }
            .requires_rebuild()
        );
    }

    #[test]
    fn test_foreign_key_action_from_sql() {
        assert_eq!(
            ForeignKeyAction::from_sql("CASCADE"),
            Some(ForeignKeyAction::Cascade)
        );
        assert_eq!(
            ForeignKeyAction::from_sql("SET NULL"),
            Some(ForeignKeyAction::SetNull)
        );
        assert_eq!(ForeignKeyAction::from_sql("NONE"), None);
    }

    #[test]
    fn test_command_json_shape() {
        let cmd: Command =
            serde_json::from_str(r#"{"op":"rename_column","from":"name","to":"first_name"}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::RenameColumn {
                from: "name".to_string(),
                to: "first_name".to_string(),
            }
        );

        let cmd: Command = serde_json::from_str(
            r#"{"op":"index","kind":"unique","name":"users_email_unique","columns":["email"]}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Index(IndexCommand {
                kind: IndexKind::Unique,
                name: "users_email_unique".to_string(),
                columns: vec!["email".to_string()],
            })
        );
    }
}
