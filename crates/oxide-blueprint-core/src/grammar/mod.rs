//! Dialect-specific schema grammars.
//!
//! Each supported database gets a stateless unit struct implementing
//! [`Grammar`]. A grammar turns one [`Command`] of a [`Blueprint`] into zero
//! or more SQL statements; [`Grammar::compile`] dispatches to the
//! per-command methods.
//!
//! ```rust
//! use oxide_blueprint_core::grammar::{Dialect, Grammar};
//!
//! let grammar = Dialect::Postgres.grammar();
//! assert_eq!(grammar.wrap("users"), "\"users\"");
//! assert!(grammar.supports_native_column_alter());
//! ```

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;
pub use sqlserver::SqlServerGrammar;

use crate::blueprint::Blueprint;
use crate::column::ColumnDefinition;
use crate::command::{Command, DropIndexCommand, ForeignKeyCommand, IndexCommand};
use crate::error::Result;
use crate::introspect::Introspect;

/// The closed set of supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    SqlServer,
}

static MYSQL: MySqlGrammar = MySqlGrammar::new();
static POSTGRES: PostgresGrammar = PostgresGrammar::new();
static SQLITE: SqliteGrammar = SqliteGrammar::new();
static SQLSERVER: SqlServerGrammar = SqlServerGrammar::new();

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Self; 4] = [Self::MySql, Self::Postgres, Self::Sqlite, Self::SqlServer];

    /// Returns the grammar for this dialect.
    #[must_use]
    pub fn grammar(self) -> &'static dyn Grammar {
        match self {
            Self::MySql => &MYSQL,
            Self::Postgres => &POSTGRES,
            Self::Sqlite => &SQLITE,
            Self::SqlServer => &SQLSERVER,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
            Self::SqlServer => "SQL Server",
        })
    }
}

/// Compiles blueprint commands into SQL for one dialect.
pub trait Grammar: Send + Sync {
    /// Returns the dialect this grammar emits.
    fn dialect(&self) -> Dialect;

    /// Whether existing columns can be modified, renamed and dropped in
    /// place. Without it those commands go through a table rebuild.
    fn supports_native_column_alter(&self) -> bool {
        true
    }

    /// Whether several dropColumn / renameColumn commands can be combined
    /// in one modification.
    fn supports_multiple_column_rebuilds(&self) -> bool {
        true
    }

    /// Whether foreign keys can be dropped from an existing table.
    fn supports_dropping_foreign_keys(&self) -> bool {
        true
    }

    /// Quotes an identifier.
    fn wrap(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// Quotes and comma-joins a list of identifiers.
    fn columnize(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.wrap(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the SQL type of a column.
    fn type_sql(&self, column: &ColumnDefinition) -> String;

    /// Returns the full definition of a column (name, type, modifiers).
    fn column_sql(&self, column: &ColumnDefinition) -> String;

    /// Compiles every command of a blueprint into SQL.
    fn compile(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let statements = match command {
            Command::Create => self.compile_create(blueprint)?,
            Command::Add => self.compile_add_columns(blueprint)?,
            Command::Change => self.compile_change_columns(blueprint, connection)?,
            Command::RenameColumn { from, to } => {
                self.compile_rename_column(blueprint, from, to, connection)?
            }
            Command::DropColumn { columns } => self.compile_drop_columns(blueprint, columns)?,
            Command::Index(index) => self.compile_index(blueprint, index)?,
            Command::DropIndex(index) => self.compile_drop_index(blueprint, index)?,
            Command::RenameIndex { from, to } => {
                self.compile_rename_index(blueprint, from, to, connection)?
            }
            Command::Foreign(foreign) => self.compile_foreign(blueprint, foreign)?,
            Command::DropForeign { name } => self.compile_drop_foreign(blueprint, name)?,
            Command::Rename { to } => self.compile_rename_table(blueprint, to)?,
            Command::Drop => self.compile_drop_table(blueprint, false)?,
            Command::DropIfExists => self.compile_drop_table(blueprint, true)?,
        };

        for sql in &statements {
            debug!(sql = %sql, command = command.name(), "Compiled command");
        }
        Ok(statements)
    }

    /// Compiles a CREATE TABLE from every column of the blueprint.
    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns: Vec<String> = blueprint
            .columns()
            .iter()
            .map(|c| self.column_sql(c))
            .collect();

        Ok(vec![format!(
            "create table {} ({})",
            self.wrap(blueprint.table()),
            columns.join(", ")
        )])
    }

    /// Compiles the implied `add` command.
    fn compile_add_columns(&self, blueprint: &Blueprint) -> Result<Vec<String>>;

    /// Compiles the implied `change` command.
    fn compile_change_columns(
        &self,
        blueprint: &Blueprint,
        connection: &dyn Introspect,
    ) -> Result<Vec<String>>;

    /// Compiles a column rename.
    fn compile_rename_column(
        &self,
        blueprint: &Blueprint,
        from: &str,
        to: &str,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename column {} to {}",
            self.wrap(blueprint.table()),
            self.wrap(from),
            self.wrap(to)
        )])
    }

    /// Compiles dropping one or more columns.
    fn compile_drop_columns(&self, blueprint: &Blueprint, columns: &[String])
    -> Result<Vec<String>>;

    /// Compiles an index, unique constraint or primary key.
    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>>;

    /// Compiles dropping an index, unique constraint or primary key.
    fn compile_drop_index(
        &self,
        blueprint: &Blueprint,
        index: &DropIndexCommand,
    ) -> Result<Vec<String>>;

    /// Compiles an index rename.
    fn compile_rename_index(
        &self,
        blueprint: &Blueprint,
        from: &str,
        to: &str,
        connection: &dyn Introspect,
    ) -> Result<Vec<String>>;

    /// Compiles a foreign key constraint.
    fn compile_foreign(
        &self,
        blueprint: &Blueprint,
        foreign: &ForeignKeyCommand,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add constraint {} {}",
            self.wrap(blueprint.table()),
            self.wrap(&foreign.name),
            self.foreign_key_clause(foreign)
        )])
    }

    /// Renders `foreign key (..) references t (..)` with its actions.
    fn foreign_key_clause(&self, foreign: &ForeignKeyCommand) -> String {
        let mut sql = format!(
            "foreign key ({}) references {} ({})",
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

    /// Compiles dropping a foreign key.
    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop constraint {}",
            self.wrap(blueprint.table()),
            self.wrap(name)
        )])
    }

    /// Compiles a table rename.
    fn compile_rename_table(&self, blueprint: &Blueprint, to: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename to {}",
            self.wrap(blueprint.table()),
            self.wrap(to)
        )])
    }

    /// Compiles DROP TABLE, optionally guarded by IF EXISTS.
    fn compile_drop_table(&self, blueprint: &Blueprint, if_exists: bool) -> Result<Vec<String>> {
        let guard = if if_exists { "if exists " } else { "" };
        Ok(vec![format!(
            "drop table {guard}{}",
            self.wrap(blueprint.table())
        )])
    }
}
