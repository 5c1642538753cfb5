//! SQLite grammar.
//!
//! SQLite has no `ALTER COLUMN`, so changing, renaming and dropping columns
//! goes through [`TableRebuilder`](crate::TableRebuilder). Primary and foreign
//! keys can only be declared inline when the table is created.

use tracing::warn;

use super::{Dialect, Grammar};
use crate::blueprint::Blueprint;
use crate::column::{ColumnDefinition, ColumnType};
use crate::command::{Command, DropIndexCommand, ForeignKeyCommand, IndexCommand, IndexKind};
use crate::error::{Result, SchemaError};
use crate::introspect::Introspect;
use crate::rebuild::{create_index_sql, identifier};

/// Grammar for SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

impl SqliteGrammar {
    /// Creates a new SQLite grammar.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Grammar for SqliteGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn supports_native_column_alter(&self) -> bool {
        false
    }

    fn supports_multiple_column_rebuilds(&self) -> bool {
        false
    }

    fn supports_dropping_foreign_keys(&self) -> bool {
        false
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        match &column.column_type {
            ColumnType::String(_) | ColumnType::Char(_) | ColumnType::Uuid => {
                "varchar".to_string()
            }
            ColumnType::Text | ColumnType::Json => "text".to_string(),
            ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::SmallInteger
            | ColumnType::TinyInteger => "integer".to_string(),
            ColumnType::Boolean => "tinyint(1)".to_string(),
            ColumnType::Float | ColumnType::Double => "float".to_string(),
            ColumnType::Decimal(..) => "numeric".to_string(),
            ColumnType::Date => "date".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "datetime".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::Binary => "blob".to_string(),
            ColumnType::Custom(raw) => raw.clone(),
        }
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", self.wrap(&column.name), self.type_sql(column));

        if let Some(collation) = &column.collation {
            sql.push_str(" collate ");
            sql.push_str(&self.wrap(collation));
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(" default ");
            sql.push_str(&default.to_quoted_sql());
        }
        if column.auto_increment {
            sql.push_str(" primary key autoincrement");
        }
        sql
    }

    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let mut definitions: Vec<String> = blueprint
            .columns()
            .iter()
            .map(|c| self.column_sql(c))
            .collect();

        let commands = blueprint.ordered_commands();
        for command in &commands {
            if let Command::Foreign(foreign) = command {
                definitions.push(self.foreign_key_clause(foreign));
            }
        }
        for command in &commands {
            if let Command::Index(index) = command {
                if index.kind == IndexKind::Primary {
                    definitions.push(format!("primary key ({})", self.columnize(&index.columns)));
                }
            }
        }

        Ok(vec![format!(
            "create table {} ({})",
            self.wrap(blueprint.table()),
            definitions.join(", ")
        )])
    }

    fn compile_add_columns(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        Ok(blueprint
            .added_columns()
            .into_iter()
            .map(|c| format!("alter table {table} add column {}", self.column_sql(c)))
            .collect())
    }

    fn compile_change_columns(
        &self,
        _blueprint: &Blueprint,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        Err(SchemaError::unsupported(
            self.dialect(),
            "modifying columns without a table rebuild",
        ))
    }

    fn compile_drop_columns(
        &self,
        blueprint: &Blueprint,
        columns: &[String],
    ) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        Ok(columns
            .iter()
            .map(|c| format!("alter table {table} drop column {}", self.wrap(c)))
            .collect())
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        let name = self.wrap(&index.name);
        let columns = self.columnize(&index.columns);

        match index.kind {
            // Declared inline by compile_create.
            IndexKind::Primary if blueprint.creating() => Ok(Vec::new()),
            IndexKind::Primary => Err(SchemaError::unsupported(
                self.dialect(),
                "adding a primary key to an existing table",
            )),
            IndexKind::Unique => Ok(vec![format!(
                "create unique index {name} on {table} ({columns})"
            )]),
            IndexKind::Index => Ok(vec![format!("create index {name} on {table} ({columns})")]),
            IndexKind::Fulltext => Err(SchemaError::unsupported(self.dialect(), "fulltext indexes")),
            IndexKind::Spatial => Err(SchemaError::unsupported(self.dialect(), "spatial indexes")),
        }
    }

    fn compile_drop_index(
        &self,
        _blueprint: &Blueprint,
        index: &DropIndexCommand,
    ) -> Result<Vec<String>> {
        match index.kind {
            IndexKind::Primary => Err(SchemaError::unsupported(
                self.dialect(),
                "dropping a primary key",
            )),
            _ => Ok(vec![format!("drop index {}", self.wrap(&index.name))]),
        }
    }

    /// SQLite cannot rename an index: it is dropped and recreated from its
    /// introspected definition.
    fn compile_rename_index(
        &self,
        blueprint: &Blueprint,
        from: &str,
        to: &str,
        connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let mut index = connection
            .list_indexes(blueprint.table())?
            .into_iter()
            .find(|i| i.name == from)
            .ok_or_else(|| SchemaError::UnknownIndex {
                table: blueprint.table().to_string(),
                index: from.to_string(),
            })?;
        index.name = to.to_string();

        Ok(vec![
            format!("DROP INDEX {}", identifier(from)),
            create_index_sql(blueprint.table(), &index),
        ])
    }

    fn compile_foreign(
        &self,
        blueprint: &Blueprint,
        foreign: &ForeignKeyCommand,
    ) -> Result<Vec<String>> {
        if !blueprint.creating() {
            warn!(
                table = blueprint.table(),
                foreign = %foreign.name,
                "SQLite cannot add a foreign key to an existing table, skipping"
            );
        }
        Ok(Vec::new())
    }

    fn foreign_key_clause(&self, foreign: &ForeignKeyCommand) -> String {
        let mut sql = format!(
            "foreign key({}) references {}({})",
            self.columnize(&foreign.columns),
            self.wrap(&foreign.on),
            self.columnize(&foreign.references)
        );
        if let Some(action) = foreign.on_delete {
            sql.push_str(" on delete ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = foreign.on_update {
            sql.push_str(" on update ");
            sql.push_str(action.as_sql());
        }
        sql
    }

    fn compile_drop_foreign(&self, _blueprint: &Blueprint, _name: &str) -> Result<Vec<String>> {
        Err(SchemaError::unsupported(
            self.dialect(),
            "dropping foreign keys (you would need to re-create the table)",
        ))
    }
}
