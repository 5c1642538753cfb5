//! SQL Server grammar.

use super::{Dialect, Grammar};
use crate::blueprint::Blueprint;
use crate::column::{quote_string, ColumnDefinition, ColumnType};
use crate::command::{DropIndexCommand, IndexCommand, IndexKind};
use crate::error::{Result, SchemaError};
use crate::introspect::Introspect;

/// Grammar for Microsoft SQL Server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerGrammar;

impl SqlServerGrammar {
    /// Creates a new SQL Server grammar.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// `sp_rename N'<object>', <new name>[, N'<kind>']`.
    fn sp_rename(&self, object: &str, to: &str, kind: Option<&str>) -> String {
        let mut sql = format!("sp_rename N{}, {}", quote_string(object), self.wrap(to));
        if let Some(kind) = kind {
            sql.push_str(", N");
            sql.push_str(&quote_string(kind));
        }
        sql
    }
}

impl Grammar for SqlServerGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        match &column.column_type {
            ColumnType::String(length) => format!("nvarchar({length})"),
            ColumnType::Char(length) => format!("nchar({length})"),
            ColumnType::Text | ColumnType::Json => "nvarchar(max)".to_string(),
            ColumnType::Integer => "int".to_string(),
            ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::SmallInteger => "smallint".to_string(),
            ColumnType::TinyInteger => "tinyint".to_string(),
            ColumnType::Boolean => "bit".to_string(),
            ColumnType::Float | ColumnType::Double => "float".to_string(),
            ColumnType::Decimal(precision, scale) => format!("decimal({precision}, {scale})"),
            ColumnType::Date => "date".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "datetime".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::Uuid => "uniqueidentifier".to_string(),
            ColumnType::Binary => "varbinary(max)".to_string(),
            ColumnType::Custom(raw) => raw.clone(),
        }
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", self.wrap(&column.name), self.type_sql(column));

        if let Some(collation) = &column.collation {
            sql.push_str(" collate ");
            sql.push_str(collation);
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(" default ");
            sql.push_str(&default.to_quoted_sql());
        }
        if column.auto_increment {
            sql.push_str(" identity primary key");
        }
        sql
    }

    fn compile_add_columns(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns: Vec<String> = blueprint
            .added_columns()
            .into_iter()
            .map(|c| self.column_sql(c))
            .collect();
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![format!(
            "alter table {} add {}",
            self.wrap(blueprint.table()),
            columns.join(", ")
        )])
    }

    fn compile_change_columns(
        &self,
        blueprint: &Blueprint,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        let mut statements = Vec::new();

        for column in blueprint.changed_columns() {
            // Defaults are constraints and cannot be part of ALTER COLUMN.
            let definition = ColumnDefinition {
                default: None,
                auto_increment: false,
                ..column.clone()
            };
            statements.push(format!(
                "alter table {table} alter column {}",
                self.column_sql(&definition)
            ));

            if let Some(default) = &column.default {
                statements.push(format!(
                    "alter table {table} add default {} for {}",
                    default.to_quoted_sql(),
                    self.wrap(&column.name)
                ));
            }
        }

        Ok(statements)
    }

    fn compile_rename_column(
        &self,
        blueprint: &Blueprint,
        from: &str,
        to: &str,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let object = format!("{}.{}", self.wrap(blueprint.table()), self.wrap(from));
        Ok(vec![self.sp_rename(&object, to, Some("COLUMN"))])
    }

    fn compile_drop_columns(
        &self,
        blueprint: &Blueprint,
        columns: &[String],
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop column {}",
            self.wrap(blueprint.table()),
            self.columnize(columns)
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        let name = self.wrap(&index.name);
        let columns = self.columnize(&index.columns);

        let sql = match index.kind {
            IndexKind::Primary => {
                format!("alter table {table} add constraint {name} primary key ({columns})")
            }
            IndexKind::Unique => format!("create unique index {name} on {table} ({columns})"),
            IndexKind::Index => format!("create index {name} on {table} ({columns})"),
            IndexKind::Spatial => format!("create spatial index {name} on {table} ({columns})"),
            IndexKind::Fulltext => {
                return Err(SchemaError::unsupported(self.dialect(), "fulltext indexes"));
            }
        };
        Ok(vec![sql])
    }

    fn compile_drop_index(
        &self,
        blueprint: &Blueprint,
        index: &DropIndexCommand,
    ) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        let name = self.wrap(&index.name);

        let sql = match index.kind {
            IndexKind::Primary => format!("alter table {table} drop constraint {name}"),
            IndexKind::Fulltext => {
                return Err(SchemaError::unsupported(self.dialect(), "fulltext indexes"));
            }
            _ => format!("drop index {name} on {table}"),
        };
        Ok(vec![sql])
    }

    fn compile_rename_index(
        &self,
        blueprint: &Blueprint,
        from: &str,
        to: &str,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let object = format!("{}.{}", self.wrap(blueprint.table()), self.wrap(from));
        Ok(vec![self.sp_rename(&object, to, Some("INDEX"))])
    }

    fn compile_rename_table(&self, blueprint: &Blueprint, to: &str) -> Result<Vec<String>> {
        Ok(vec![self.sp_rename(&self.wrap(blueprint.table()), to, None)])
    }

    fn compile_drop_table(&self, blueprint: &Blueprint, if_exists: bool) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        if if_exists {
            return Ok(vec![format!(
                "if object_id(N{}, 'U') is not null drop table {table}",
                quote_string(&table)
            )]);
        }
        Ok(vec![format!("drop table {table}")])
    }
}
