//! Live SQLite introspection.
//!
//! [`SqliteIntrospector`] reads table definitions from a SQLite database
//! through `sqlx` and turns them into a [`SchemaSnapshot`]. The snapshot
//! implements [`Introspect`](oxide_blueprint_core::Introspect), so it can be
//! handed to [`Blueprint::to_sql`](oxide_blueprint_core::Blueprint::to_sql)
//! without any further database access.

use oxide_blueprint_core::naming::index_name;
use oxide_blueprint_core::rebuild::DEFAULT_COLLATION;
use oxide_blueprint_core::{
    ColumnSnapshot, ColumnType, DefaultValue, Dialect, ForeignKeyAction, ForeignKeySnapshot,
    IndexSnapshot, SchemaError, SchemaSnapshot, TableSnapshot,
};
use regex::Regex;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::error::{IntrospectError, Result};

/// Reads table definitions from a SQLite database.
pub struct SqliteIntrospector {
    pool: SqlitePool,
}

impl SqliteIntrospector {
    /// Creates a new introspector over `pool`.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists user tables, sorted by name.
    pub async fn table_names(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Reads one table: columns in physical order, secondary indexes and
    /// foreign keys.
    pub async fn table(&self, name: &str) -> Result<TableSnapshot> {
        let wrap = |e: sqlx::Error| {
            IntrospectError::Schema(SchemaError::Introspection {
                table: name.to_string(),
                source: Box::new(e),
            })
        };

        let create_sql: Option<(Option<String>,)> =
            sqlx::query_as("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(wrap)?;
        let Some((create_sql,)) = create_sql else {
            return Err(IntrospectError::TableNotFound(name.to_string()));
        };
        let create_sql = create_sql.unwrap_or_default();

        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(wrap)?;

        let autoincrement = create_sql.to_uppercase().contains("AUTOINCREMENT");
        let columns: Vec<ColumnSnapshot> = rows
            .into_iter()
            .map(|(column, declared, not_null, default, pk)| {
                let (column_type, unsigned) = parse_declared_type(&declared);
                let collation = parse_collation(&create_sql, &column).or_else(|| {
                    column_type
                        .is_string_like()
                        .then(|| DEFAULT_COLLATION.to_string())
                });
                let primary_key = pk > 0;
                ColumnSnapshot {
                    auto_increment: primary_key
                        && autoincrement
                        && column_type == ColumnType::Integer,
                    name: column,
                    column_type,
                    nullable: not_null == 0 && !primary_key,
                    default: default.as_deref().map(parse_default),
                    collation,
                    unsigned,
                    primary_key,
                }
            })
            .collect();

        let indexes = self.indexes(name).await.map_err(wrap)?;
        let foreign_keys = self.foreign_keys(name).await.map_err(wrap)?;

        debug!(
            table = %name,
            columns = columns.len(),
            indexes = indexes.len(),
            foreign_keys = foreign_keys.len(),
            "Introspected table"
        );

        Ok(TableSnapshot {
            name: name.to_string(),
            columns,
            indexes,
            foreign_keys,
        })
    }

    async fn foreign_keys(
        &self,
        table: &str,
    ) -> std::result::Result<Vec<ForeignKeySnapshot>, sqlx::Error> {
        let rows: Vec<(i64, String, String, Option<String>, String, String)> = sqlx::query_as(
            r#"SELECT id, "table", "from", "to", on_update, on_delete
               FROM pragma_foreign_key_list(?) ORDER BY id, seq"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        // One row per column; rows sharing an id form one key.
        let mut keys: Vec<(i64, ForeignKeySnapshot)> = Vec::new();
        for (id, on, from, to, on_update, on_delete) in rows {
            let index = match keys.iter().position(|(key_id, _)| *key_id == id) {
                Some(index) => index,
                None => {
                    keys.push((
                        id,
                        ForeignKeySnapshot {
                            columns: Vec::new(),
                            on,
                            references: Vec::new(),
                            on_delete: parse_action(&on_delete),
                            on_update: parse_action(&on_update),
                        },
                    ));
                    keys.len() - 1
                }
            };
            let key = &mut keys[index].1;
            key.columns.push(from);
            if let Some(to) = to {
                key.references.push(to);
            }
        }

        // Declaration order; SQLite numbers the last declared key 0.
        Ok(keys.into_iter().rev().map(|(_, key)| key).collect())
    }

    async fn indexes(&self, table: &str) -> std::result::Result<Vec<IndexSnapshot>, sqlx::Error> {
        let list: Vec<(String, i64, String)> =
            sqlx::query_as(r#"SELECT name, "unique", origin FROM pragma_index_list(?) ORDER BY seq"#)
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        let mut indexes = Vec::new();
        // Oldest first, the order the indexes were declared in.
        for (name, unique, origin) in list.into_iter().rev() {
            if origin == "pk" {
                continue;
            }

            let columns: Vec<(String,)> =
                sqlx::query_as("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
                    .bind(&name)
                    .fetch_all(&self.pool)
                    .await?;
            let columns: Vec<String> = columns.into_iter().map(|(c,)| c).collect();

            // Inline UNIQUE constraints get reserved names; give them a usable one.
            let name = if origin == "u" {
                index_name(table, &columns, "unique")
            } else {
                name
            };

            indexes.push(IndexSnapshot {
                name,
                columns,
                unique: unique != 0,
            });
        }
        Ok(indexes)
    }

    /// Reads the given tables into a snapshot.
    pub async fn snapshot(&self, tables: &[&str]) -> Result<SchemaSnapshot> {
        let mut snapshot = SchemaSnapshot::new(Dialect::Sqlite);
        for table in tables {
            snapshot.add_table(self.table(table).await?);
        }
        Ok(snapshot)
    }

    /// Reads every user table into a snapshot.
    pub async fn snapshot_all(&self) -> Result<SchemaSnapshot> {
        let names = self.table_names().await?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        self.snapshot(&names).await
    }
}

/// Maps a declared SQLite type (`VARCHAR(255)`, `INTEGER UNSIGNED`, ...) to a
/// column type and its unsigned flag.
#[must_use]
pub fn parse_declared_type(declared: &str) -> (ColumnType, bool) {
    let upper = declared.trim().to_uppercase();
    let unsigned = upper.split_whitespace().any(|w| w == "UNSIGNED");
    let base = upper.replace("UNSIGNED", "");
    let base = base.trim();

    let (name, args) = match base.split_once('(') {
        Some((name, rest)) => {
            let args: Vec<u32> = rest
                .trim_end_matches(')')
                .split(',')
                .filter_map(|a| a.trim().parse().ok())
                .collect();
            (name.trim(), args)
        }
        None => (base, Vec::new()),
    };
    let length = args
        .first()
        .copied()
        .unwrap_or(oxide_blueprint_core::column::DEFAULT_STRING_LENGTH);

    let column_type = match name {
        "VARCHAR" | "CHARACTER VARYING" | "VARYING CHARACTER" | "NVARCHAR" => {
            ColumnType::String(length)
        }
        "CHAR" | "CHARACTER" | "NCHAR" | "NATIVE CHARACTER" => ColumnType::Char(length),
        "TEXT" | "CLOB" => ColumnType::Text,
        "INTEGER" | "INT" | "MEDIUMINT" => ColumnType::Integer,
        "BIGINT" => ColumnType::BigInteger,
        "SMALLINT" => ColumnType::SmallInteger,
        "TINYINT" if args.first() == Some(&1) => ColumnType::Boolean,
        "TINYINT" => ColumnType::TinyInteger,
        "BOOLEAN" => ColumnType::Boolean,
        "FLOAT" | "REAL" => ColumnType::Float,
        "DOUBLE" | "DOUBLE PRECISION" => ColumnType::Double,
        "NUMERIC" | "DECIMAL" => {
            let precision = args.first().copied().unwrap_or(10);
            let scale = args.get(1).copied().unwrap_or(0);
            ColumnType::Decimal(
                u8::try_from(precision).unwrap_or(u8::MAX),
                u8::try_from(scale).unwrap_or(u8::MAX),
            )
        }
        "DATE" => ColumnType::Date,
        "DATETIME" => ColumnType::DateTime,
        "TIMESTAMP" => ColumnType::Timestamp,
        "TIME" => ColumnType::Time,
        "JSON" => ColumnType::Json,
        "UUID" => ColumnType::Uuid,
        "BLOB" | "" => ColumnType::Binary,
        _ => ColumnType::Custom(declared.trim().to_string()),
    };
    (column_type, unsigned)
}

/// Finds the `COLLATE` clause of `column` in a `CREATE TABLE` statement.
#[must_use]
pub fn parse_collation(create_sql: &str, column: &str) -> Option<String> {
    let name = regex::escape(column);
    let pattern = format!(
        r#"(?is)(?:^|[(,])\s*(?:"{name}"|`{name}`|\[{name}\]|{name})\s+[^,]*?\bCOLLATE\s+["'`]?(\w+)"#
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(create_sql)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parses a foreign key action; `NO ACTION` is the implicit default.
fn parse_action(action: &str) -> Option<ForeignKeyAction> {
    ForeignKeyAction::from_sql(action).filter(|a| *a != ForeignKeyAction::NoAction)
}

/// Parses the default clause text reported by `PRAGMA table_info`.
#[must_use]
pub fn parse_default(raw: &str) -> DefaultValue {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("null") {
        return DefaultValue::Null;
    }
    if raw.eq_ignore_ascii_case("true") {
        return DefaultValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return DefaultValue::Bool(false);
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return DefaultValue::String(raw[1..raw.len() - 1].replace("''", "'"));
    }
    if let Ok(value) = raw.parse::<i64>() {
        return DefaultValue::Integer(value);
    }
    if let Ok(value) = raw.parse::<f64>() {
        return DefaultValue::Float(value);
    }
    DefaultValue::Expression(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_blueprint_core::Introspect;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    #[test]
    fn test_parse_declared_type() {
        assert_eq!(parse_declared_type("VARCHAR(100)"), (ColumnType::String(100), false));
        assert_eq!(parse_declared_type("varchar"), (ColumnType::String(255), false));
        assert_eq!(parse_declared_type("INTEGER UNSIGNED"), (ColumnType::Integer, true));
        assert_eq!(parse_declared_type("tinyint(1)"), (ColumnType::Boolean, false));
        assert_eq!(parse_declared_type("NUMERIC(8, 2)"), (ColumnType::Decimal(8, 2), false));
        assert_eq!(parse_declared_type("CLOB"), (ColumnType::Text, false));
        assert_eq!(
            parse_declared_type("GEOMETRY"),
            (ColumnType::Custom("GEOMETRY".to_string()), false)
        );
    }

    #[test]
    fn test_parse_collation() {
        let sql = r#"CREATE TABLE "users" ("name" varchar not null collate "NOCASE", age INTEGER NOT NULL, code TEXT COLLATE RTRIM)"#;
        assert_eq!(parse_collation(sql, "name").as_deref(), Some("NOCASE"));
        assert_eq!(parse_collation(sql, "age"), None);
        assert_eq!(parse_collation(sql, "code").as_deref(), Some("RTRIM"));
    }

    #[test]
    fn test_parse_default() {
        assert_eq!(parse_default("NULL"), DefaultValue::Null);
        assert_eq!(parse_default("'it''s'"), DefaultValue::String("it's".to_string()));
        assert_eq!(parse_default("18"), DefaultValue::Integer(18));
        assert_eq!(
            parse_default("CURRENT_TIMESTAMP"),
            DefaultValue::Expression("CURRENT_TIMESTAMP".to_string())
        );
    }

    #[tokio::test]
    async fn test_introspect_table() {
        let pool = create_test_pool().await;
        sqlx::query(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             email VARCHAR(255) NOT NULL UNIQUE, \
             nickname VARCHAR(50) DEFAULT 'anon' COLLATE NOCASE, \
             age INTEGER NOT NULL DEFAULT 18)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE INDEX users_age_index ON users (age)")
            .execute(&pool)
            .await
            .unwrap();

        let introspector = SqliteIntrospector::new(pool);
        let table = introspector.table("users").await.unwrap();

        let id = table.find_column("id").unwrap();
        assert!(id.auto_increment);
        assert!(id.primary_key);
        assert!(!id.nullable);

        let email = table.find_column("email").unwrap();
        assert_eq!(email.column_type, ColumnType::String(255));
        assert_eq!(email.collation.as_deref(), Some("BINARY"));

        let nickname = table.find_column("nickname").unwrap();
        assert!(nickname.nullable);
        assert_eq!(nickname.collation.as_deref(), Some("NOCASE"));
        assert_eq!(
            nickname.default,
            Some(DefaultValue::String("anon".to_string()))
        );

        let age = table.find_column("age").unwrap();
        assert_eq!(age.default, Some(DefaultValue::Integer(18)));
        assert_eq!(age.collation, None);

        assert_eq!(table.indexes.len(), 2);
        let email_unique = table.find_index("users_email_unique").unwrap();
        assert!(email_unique.unique);
        assert_eq!(email_unique.columns, vec!["email"]);
        assert!(!table.find_index("users_age_index").unwrap().unique);
    }

    #[tokio::test]
    async fn test_introspect_foreign_keys() {
        let pool = create_test_pool().await;
        for sql in [
            "CREATE TABLE teams (id INTEGER PRIMARY KEY, code VARCHAR(10) NOT NULL)",
            "CREATE TABLE users (id INTEGER PRIMARY KEY, \
             team_id INTEGER REFERENCES teams(id) ON DELETE CASCADE, \
             mentor_id INTEGER, \
             FOREIGN KEY(mentor_id) REFERENCES users ON UPDATE SET NULL)",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }

        let table = SqliteIntrospector::new(pool).table("users").await.unwrap();
        assert_eq!(table.foreign_keys.len(), 2);

        let team = table
            .foreign_keys
            .iter()
            .find(|f| f.columns == ["team_id"])
            .unwrap();
        assert_eq!(team.on, "teams");
        assert_eq!(team.references, vec!["id"]);
        assert_eq!(team.on_delete, Some(ForeignKeyAction::Cascade));
        assert_eq!(team.on_update, None);

        let mentor = table
            .foreign_keys
            .iter()
            .find(|f| f.columns == ["mentor_id"])
            .unwrap();
        assert_eq!(mentor.on, "users");
        assert!(mentor.references.is_empty());
        assert_eq!(mentor.on_update, Some(ForeignKeyAction::SetNull));
    }

    #[tokio::test]
    async fn test_missing_table() {
        let introspector = SqliteIntrospector::new(create_test_pool().await);
        assert!(matches!(
            introspector.table("missing").await,
            Err(IntrospectError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_all() {
        let pool = create_test_pool().await;
        for sql in [
            "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT NOT NULL)",
            "CREATE TABLE users (name VARCHAR(255) NOT NULL)",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }

        let snapshot = SqliteIntrospector::new(pool).snapshot_all().await.unwrap();
        assert_eq!(snapshot.dialect(), Dialect::Sqlite);
        assert_eq!(
            snapshot.tables.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["posts", "users"]
        );
        assert_eq!(snapshot.list_columns("posts").unwrap().len(), 2);
    }
}
