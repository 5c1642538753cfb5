//! # oxide-blueprint
//!
//! Laravel-like schema blueprints for Rust.
//!
//! This crate re-exports [`oxide_blueprint_core`] and adds:
//! - [`SqliteIntrospector`], reading the current schema of a live SQLite
//!   database into a [`SchemaSnapshot`]
//! - JSON loaders for blueprints and snapshots
//! - The `oxide-blueprint` command-line tool
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxide_blueprint::prelude::*;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let pool = SqlitePoolOptions::new().connect("sqlite:app.db").await?;
//! let connection = SqliteIntrospector::new(pool).snapshot(&["users"]).await?;
//!
//! let blueprint = Blueprint::new("users", |table| {
//!     table.rename_column("name", "first_name");
//! });
//!
//! for statement in blueprint.to_sql(&connection, Dialect::Sqlite.grammar())? {
//!     println!("{statement};");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod sqlite;

use std::fs;
use std::path::Path;

pub use oxide_blueprint_core::*;

pub use error::IntrospectError;
pub use sqlite::SqliteIntrospector;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::IntrospectError;
    pub use crate::sqlite::SqliteIntrospector;
    pub use oxide_blueprint_core::prelude::*;
}

/// Reads a blueprint from a JSON file.
pub fn load_blueprint(path: impl AsRef<Path>) -> error::Result<Blueprint> {
    load_json(path.as_ref())
}

/// Reads a schema snapshot from a JSON file.
pub fn load_snapshot(path: impl AsRef<Path>) -> error::Result<SchemaSnapshot> {
    load_json(path.as_ref())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> error::Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| IntrospectError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
