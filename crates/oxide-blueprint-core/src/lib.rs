//! # oxide-blueprint-core
//!
//! A schema-change compiler: describe how one table should change, get back
//! the ordered SQL statements that apply the change on MySQL, PostgreSQL,
//! SQLite or SQL Server.
//!
//! This crate provides:
//! - [`Blueprint`], a dialect-independent list of column definitions and
//!   commands for one table
//! - One [`Grammar`] per [`Dialect`], compiling commands into SQL
//! - [`TableRebuilder`], realizing column changes through temp-table
//!   reconstruction where the engine cannot alter columns in place
//! - [`Introspect`] and in-memory [`SchemaSnapshot`]s describing the current
//!   schema
//!
//! Nothing here talks to a database: statements are returned, never executed.
//!
//! ## Example
//!
//! ```rust
//! use oxide_blueprint_core::prelude::*;
//!
//! let connection = SchemaSnapshot::new(Dialect::Sqlite).with_table(
//!     TableSnapshot::new("users")
//!         .column(ColumnSnapshot::new("name", ColumnType::String(255)).collation("BINARY"))
//!         .column(ColumnSnapshot::new("age", ColumnType::String(255)).collation("BINARY")),
//! );
//!
//! let blueprint = Blueprint::new("users", |table| {
//!     table.integer("age").change();
//! });
//!
//! let sql = blueprint.to_sql(&connection, Dialect::Sqlite.grammar()).unwrap();
//! assert_eq!(sql[0], "CREATE TEMPORARY TABLE __temp__users AS SELECT name, age FROM users");
//! assert_eq!(
//!     sql[2],
//!     "CREATE TABLE users (name VARCHAR(255) NOT NULL COLLATE BINARY, age INTEGER NOT NULL)"
//! );
//! ```

pub mod blueprint;
pub mod column;
pub mod command;
pub mod error;
pub mod grammar;
pub mod introspect;
pub mod naming;
pub mod rebuild;

pub use blueprint::Blueprint;
pub use column::{ColumnDefinition, ColumnIndex, ColumnType, DefaultValue};
pub use command::{
    Command, DropIndexCommand, ForeignKeyAction, ForeignKeyCommand, IndexCommand, IndexKind,
};
pub use error::{Result, SchemaError};
pub use grammar::{
    Dialect, Grammar, MySqlGrammar, PostgresGrammar, SqlServerGrammar, SqliteGrammar,
};
pub use introspect::{
    ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot, Introspect, SchemaSnapshot, TableSnapshot,
};
pub use rebuild::TableRebuilder;

/// Commonly used items.
pub mod prelude {
    pub use crate::blueprint::Blueprint;
    pub use crate::column::{ColumnDefinition, ColumnType, DefaultValue};
    pub use crate::command::{ForeignKeyAction, ForeignKeyCommand};
    pub use crate::error::{Result, SchemaError};
    pub use crate::grammar::{Dialect, Grammar};
    pub use crate::introspect::{
        ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot, Introspect, SchemaSnapshot,
        TableSnapshot,
    };
}
