//! Schema introspection.
//!
//! Grammars and the rebuild planner read the current shape of a table through
//! the [`Introspect`] trait. Driver crates implement it (or load a
//! [`SchemaSnapshot`] ahead of time); the core crate stays driver-agnostic and
//! synchronous.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::{ColumnType, DefaultValue};
use crate::command::ForeignKeyAction;
use crate::error::{Result, SchemaError};
use crate::grammar::Dialect;

/// A snapshot of one existing column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column is nullable.
    #[serde(default)]
    pub nullable: bool,
    /// Default value, if any.
    #[serde(default)]
    pub default: Option<DefaultValue>,
    /// Collation, if any.
    #[serde(default)]
    pub collation: Option<String>,
    /// Unsigned integer.
    #[serde(default)]
    pub unsigned: bool,
    /// Auto-incrementing.
    #[serde(default)]
    pub auto_increment: bool,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnSnapshot {
    /// Creates a NOT NULL column snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            collation: None,
            unsigned: false,
            auto_increment: false,
            primary_key: false,
        }
    }

    /// Marks the column nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the collation.
    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as an auto-incrementing primary key.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.primary_key = true;
        self
    }
}

/// A snapshot of one existing index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Index name.
    pub name: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    #[serde(default)]
    pub unique: bool,
}

impl IndexSnapshot {
    /// Creates an index snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: &[&str], unique: bool) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|&c| c.to_string()).collect(),
            unique,
        }
    }
}

/// A snapshot of one existing foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySnapshot {
    /// Referencing columns, in order.
    pub columns: Vec<String>,
    /// Referenced table.
    pub on: String,
    /// Referenced columns; empty means the referenced primary key.
    #[serde(default)]
    pub references: Vec<String>,
    /// ON DELETE action.
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
    /// ON UPDATE action.
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKeySnapshot {
    /// Creates a foreign key snapshot referencing `on (references)`.
    #[must_use]
    pub fn new(columns: &[&str], on: impl Into<String>, references: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|&c| c.to_string()).collect(),
            on: on.into(),
            references: references.iter().map(|&c| c.to_string()).collect(),
            on_delete: None,
            on_update: None,
        }
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

/// A snapshot of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name.
    pub name: String,
    /// Columns in physical order.
    pub columns: Vec<ColumnSnapshot>,
    /// Indexes, excluding the implicit primary key.
    #[serde(default)]
    pub indexes: Vec<IndexSnapshot>,
    /// Foreign keys declared on the table.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySnapshot>,
}

impl TableSnapshot {
    /// Creates an empty table snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnSnapshot) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends an index.
    #[must_use]
    pub fn index(mut self, index: IndexSnapshot) -> Self {
        self.indexes.push(index);
        self
    }

    /// Appends a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, foreign_key: ForeignKeySnapshot) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnSnapshot> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up an index by name.
    #[must_use]
    pub fn find_index(&self, name: &str) -> Option<&IndexSnapshot> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// Reads the current shape of tables on a connection.
pub trait Introspect {
    /// Platform of the connection.
    fn dialect(&self) -> Dialect;

    /// Lists the columns of `table` in physical order. An unknown table
    /// yields an empty list.
    fn list_columns(&self, table: &str) -> Result<Vec<ColumnSnapshot>>;

    /// Lists the indexes of `table`.
    fn list_indexes(&self, table: &str) -> Result<Vec<IndexSnapshot>>;

    /// Lists the foreign keys declared on `table`.
    fn list_foreign_keys(&self, _table: &str) -> Result<Vec<ForeignKeySnapshot>> {
        Ok(Vec::new())
    }

    /// Reads a whole table, failing when it has no columns.
    fn table(&self, table: &str) -> Result<TableSnapshot> {
        let columns = self.list_columns(table)?;
        if columns.is_empty() {
            return Err(SchemaError::UnknownTable(table.to_string()));
        }

        Ok(TableSnapshot {
            name: table.to_string(),
            columns,
            indexes: self.list_indexes(table)?,
            foreign_keys: self.list_foreign_keys(table)?,
        })
    }
}

/// An in-memory schema that answers introspection queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Platform the schema was read from.
    pub dialect: Dialect,
    /// Tables keyed by name.
    #[serde(default)]
    pub tables: BTreeMap<String, TableSnapshot>,
}

impl SchemaSnapshot {
    /// Creates an empty schema snapshot.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a table.
    pub fn add_table(&mut self, table: TableSnapshot) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Builder variant of [`Self::add_table`].
    #[must_use]
    pub fn with_table(mut self, table: TableSnapshot) -> Self {
        self.add_table(table);
        self
    }
}

impl Introspect for SchemaSnapshot {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnSnapshot>> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    fn list_indexes(&self, table: &str) -> Result<Vec<IndexSnapshot>> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.indexes.clone())
            .unwrap_or_default())
    }

    fn list_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeySnapshot>> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }
}

/// Answers for one rebuilt table from memory and delegates every other table
/// to the underlying connection.
pub(crate) struct Overlay<'a> {
    inner: &'a dyn Introspect,
    table: TableSnapshot,
}

impl<'a> Overlay<'a> {
    pub(crate) const fn new(inner: &'a dyn Introspect, table: TableSnapshot) -> Self {
        Self { inner, table }
    }
}

impl Introspect for Overlay<'_> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn list_columns(&self, table: &str) -> Result<Vec<ColumnSnapshot>> {
        if table == self.table.name {
            return Ok(self.table.columns.clone());
        }
        self.inner.list_columns(table)
    }

    fn list_indexes(&self, table: &str) -> Result<Vec<IndexSnapshot>> {
        if table == self.table.name {
            return Ok(self.table.indexes.clone());
        }
        self.inner.list_indexes(table)
    }

    fn list_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeySnapshot>> {
        if table == self.table.name {
            return Ok(self.table.foreign_keys.clone());
        }
        self.inner.list_foreign_keys(table)
    }
}
