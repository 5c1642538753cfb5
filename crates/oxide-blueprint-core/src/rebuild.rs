//! Table rebuilds for engines without in-place column alteration.
//!
//! SQLite cannot modify a column. To change, rename or drop columns the table
//! is copied aside, dropped, recreated with the target definition and
//! refilled:
//!
//! ```text
//! CREATE TEMPORARY TABLE __temp__users AS SELECT name, age FROM users
//! DROP TABLE users
//! CREATE TABLE users (name VARCHAR(255) NOT NULL, age INTEGER NOT NULL)
//! INSERT INTO users (name, age) SELECT name, age FROM __temp__users
//! DROP TABLE __temp__users
//! ```
//!
//! A [`TableRebuilder`] is seeded with one introspected [`TableSnapshot`] and
//! keeps it in sync after every pass, so several passes in a row each start
//! from the table the previous one left behind.

use std::collections::HashMap;

use tracing::debug;

use crate::blueprint::Blueprint;
use crate::column::{ColumnDefinition, ColumnType};
use crate::command::Command;
use crate::error::{Result, SchemaError};
use crate::grammar::Dialect;
use crate::introspect::{ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot, TableSnapshot};

/// Prefix of the temporary copy of a rebuilt table.
pub const TEMP_TABLE_PREFIX: &str = "__temp__";

/// Collation SQLite applies when none is declared.
pub const DEFAULT_COLLATION: &str = "BINARY";

/// SQLite keywords; identifiers matching one are always quoted.
const KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "KEY",
    "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT", "NOTHING",
    "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS", "OUTER", "OVER",
    "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE", "RANGE",
    "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT",
    "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET", "TABLE",
    "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED", "UNION",
    "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE",
    "WINDOW", "WITH", "WITHOUT",
];

/// Plans table rebuilds against an evolving table snapshot.
#[derive(Debug, Clone)]
pub struct TableRebuilder {
    table: TableSnapshot,
}

/// One surviving column: where its data comes from and what it becomes.
#[derive(Debug)]
struct Survivor {
    source: String,
    target: ColumnSnapshot,
}

impl TableRebuilder {
    /// Creates a rebuilder for the given table.
    #[must_use]
    pub const fn new(table: TableSnapshot) -> Self {
        Self { table }
    }

    /// Returns the table as it stands after the passes applied so far.
    #[must_use]
    pub const fn snapshot(&self) -> &TableSnapshot {
        &self.table
    }

    /// Consumes the rebuilder, returning the rebuilt table.
    #[must_use]
    pub fn into_snapshot(self) -> TableSnapshot {
        self.table
    }

    /// Plans one rebuild pass for `command` and returns its statements.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownColumn`] when the command references a
    /// column the table doesn't have, and [`SchemaError::InvalidBlueprint`]
    /// for commands that don't rewrite columns.
    pub fn apply(&mut self, blueprint: &Blueprint, command: &Command) -> Result<Vec<String>> {
        debug!(
            table = %self.table.name,
            command = command.name(),
            "Planning table rebuild"
        );

        let survivors = match command {
            Command::Change => self.plan_change(&blueprint.changed_columns())?,
            Command::RenameColumn { from, to } => self.plan_rename(from, to)?,
            Command::DropColumn { columns } => self.plan_drop(columns)?,
            other => {
                return Err(SchemaError::InvalidBlueprint(format!(
                    "{} cannot be realized through a table rebuild",
                    other.name()
                )));
            }
        };

        Ok(self.finish(&survivors))
    }

    fn plan_change(&self, changed: &[&ColumnDefinition]) -> Result<Vec<Survivor>> {
        let mut redeclared = HashMap::with_capacity(changed.len());
        for definition in changed {
            let existing = self.existing(&definition.name)?;
            redeclared.insert(
                definition.name.as_str(),
                Survivor {
                    source: existing.name.clone(),
                    target: changed_column(existing, definition),
                },
            );
        }

        let order: Vec<&str> = changed.iter().map(|c| c.name.as_str()).collect();
        Ok(self.reorder(redeclared, &order, &[]))
    }

    fn plan_rename(&self, from: &str, to: &str) -> Result<Vec<Survivor>> {
        let existing = self.existing(from)?;
        if from != to && self.table.find_column(to).is_some() {
            return Err(SchemaError::InvalidBlueprint(format!(
                "column '{to}' already exists on table '{}'",
                self.table.name
            )));
        }

        // The engine default is implied; any other collation is kept.
        let collation = existing
            .collation
            .clone()
            .filter(|c| !c.eq_ignore_ascii_case(DEFAULT_COLLATION));
        let target = ColumnSnapshot {
            name: to.to_string(),
            collation,
            ..existing.clone()
        };
        let redeclared = HashMap::from([(
            from,
            Survivor {
                source: existing.name.clone(),
                target,
            },
        )]);

        Ok(self.reorder(redeclared, &[from], &[]))
    }

    fn plan_drop(&self, columns: &[String]) -> Result<Vec<Survivor>> {
        for column in columns {
            self.existing(column)?;
        }

        let dropped: Vec<&str> = columns.iter().map(String::as_str).collect();
        let survivors = self.reorder(HashMap::new(), &[], &dropped);
        if survivors.is_empty() {
            return Err(SchemaError::unsupported(
                Dialect::Sqlite,
                "dropping every column of a table",
            ));
        }
        Ok(survivors)
    }

    /// Untouched columns keep their relative order; redeclared columns follow
    /// in declaration order.
    fn reorder<'a>(
        &self,
        mut redeclared: HashMap<&'a str, Survivor>,
        order: &[&'a str],
        dropped: &[&str],
    ) -> Vec<Survivor> {
        let mut survivors: Vec<Survivor> = self
            .table
            .columns
            .iter()
            .filter(|c| !dropped.contains(&c.name.as_str()))
            .filter(|c| !redeclared.contains_key(c.name.as_str()))
            .map(|c| Survivor {
                source: c.name.clone(),
                target: c.clone(),
            })
            .collect();

        survivors.extend(order.iter().filter_map(|name| redeclared.remove(name)));
        survivors
    }

    fn existing(&self, column: &str) -> Result<&ColumnSnapshot> {
        self.table
            .find_column(column)
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: self.table.name.clone(),
                column: column.to_string(),
            })
    }

    /// Emits the rebuild statements and moves the snapshot to the new shape.
    fn finish(&mut self, survivors: &[Survivor]) -> Vec<String> {
        let table = identifier(&self.table.name);
        let temp = identifier(&format!("{TEMP_TABLE_PREFIX}{}", self.table.name));

        let by_source: HashMap<&str, &str> = survivors
            .iter()
            .map(|s| (s.source.as_str(), s.target.name.as_str()))
            .collect();

        // Source columns in the table's current physical order.
        let (sources, targets): (Vec<String>, Vec<String>) = self
            .table
            .columns
            .iter()
            .filter_map(|c| {
                by_source
                    .get(c.name.as_str())
                    .map(|target| (identifier(&c.name), identifier(target)))
            })
            .unzip();
        let sources = sources.join(", ");

        let columns: Vec<ColumnSnapshot> = survivors.iter().map(|s| s.target.clone()).collect();

        // Keys on a dropped column go away with it.
        let foreign_keys: Vec<ForeignKeySnapshot> = self
            .table
            .foreign_keys
            .iter()
            .filter_map(|foreign| {
                let columns = foreign
                    .columns
                    .iter()
                    .map(|c| by_source.get(c.as_str()).map(|t| (*t).to_string()))
                    .collect::<Option<Vec<_>>>()?;
                // Self-references follow renames of the referenced columns too.
                let references = if foreign.on == self.table.name {
                    foreign
                        .references
                        .iter()
                        .map(|c| {
                            by_source
                                .get(c.as_str())
                                .map_or_else(|| c.clone(), |t| (*t).to_string())
                        })
                        .collect()
                } else {
                    foreign.references.clone()
                };
                Some(ForeignKeySnapshot {
                    columns,
                    references,
                    ..foreign.clone()
                })
            })
            .collect();

        let mut statements = vec![
            format!("CREATE TEMPORARY TABLE {temp} AS SELECT {sources} FROM {table}"),
            format!("DROP TABLE {table}"),
            create_table_sql(&table, &columns, &foreign_keys),
            format!(
                "INSERT INTO {table} ({}) SELECT {sources} FROM {temp}",
                targets.join(", ")
            ),
            format!("DROP TABLE {temp}"),
        ];

        let indexes: Vec<IndexSnapshot> = self
            .table
            .indexes
            .iter()
            .filter_map(|index| {
                let columns = index
                    .columns
                    .iter()
                    .map(|c| by_source.get(c.as_str()).map(|t| (*t).to_string()))
                    .collect::<Option<Vec<_>>>()?;
                Some(IndexSnapshot {
                    columns,
                    ..index.clone()
                })
            })
            .collect();
        statements.extend(indexes.iter().map(|i| create_index_sql(&self.table.name, i)));

        self.table.columns = columns;
        self.table.indexes = indexes;
        self.table.foreign_keys = foreign_keys;
        statements
    }
}

/// Merges a `change` definition into the existing column.
fn changed_column(existing: &ColumnSnapshot, definition: &ColumnDefinition) -> ColumnSnapshot {
    let collation = definition.collation.clone().or_else(|| {
        if definition.column_type.is_string_like() {
            existing.collation.clone()
        } else {
            None
        }
    });

    ColumnSnapshot {
        name: existing.name.clone(),
        column_type: definition.column_type.clone(),
        nullable: definition.nullable,
        default: definition.default.clone(),
        collation,
        unsigned: definition.unsigned,
        auto_increment: definition.auto_increment,
        primary_key: existing.primary_key || definition.auto_increment,
    }
}

/// Leaves plain identifiers bare and double-quotes keywords and anything
/// else.
pub(crate) fn identifier(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain && !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name)) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// SQLite type declaration used in rebuilt tables.
fn declared_type(column: &ColumnSnapshot) -> String {
    let base = match &column.column_type {
        ColumnType::String(length) => format!("VARCHAR({length})"),
        ColumnType::Char(length) => format!("CHAR({length})"),
        ColumnType::Text | ColumnType::Json => "CLOB".to_string(),
        ColumnType::Integer => "INTEGER".to_string(),
        ColumnType::BigInteger => "BIGINT".to_string(),
        ColumnType::SmallInteger => "SMALLINT".to_string(),
        ColumnType::TinyInteger => "TINYINT".to_string(),
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Float | ColumnType::Double => "DOUBLE PRECISION".to_string(),
        ColumnType::Decimal(precision, scale) => format!("NUMERIC({precision}, {scale})"),
        ColumnType::Date => "DATE".to_string(),
        ColumnType::DateTime | ColumnType::Timestamp => "DATETIME".to_string(),
        ColumnType::Time => "TIME".to_string(),
        ColumnType::Uuid => "CHAR(36)".to_string(),
        ColumnType::Binary => "BLOB".to_string(),
        ColumnType::Custom(raw) => raw.clone(),
    };

    if column.unsigned && column.column_type.is_integer() {
        format!("{base} UNSIGNED")
    } else {
        base
    }
}

fn column_sql(column: &ColumnSnapshot) -> String {
    let name = identifier(&column.name);
    if column.auto_increment {
        return format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL");
    }

    let mut sql = format!("{name} {}", declared_type(column));
    match &column.default {
        Some(default) => {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }
        None if column.nullable => sql.push_str(" DEFAULT NULL"),
        None => {}
    }
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(collation) = &column.collation {
        sql.push_str(" COLLATE ");
        sql.push_str(collation);
    }
    sql
}

fn create_table_sql(
    table: &str,
    columns: &[ColumnSnapshot],
    foreign_keys: &[ForeignKeySnapshot],
) -> String {
    let mut definitions: Vec<String> = columns.iter().map(column_sql).collect();

    let primary: Vec<String> = columns
        .iter()
        .filter(|c| c.primary_key && !c.auto_increment)
        .map(|c| identifier(&c.name))
        .collect();
    if !primary.is_empty() && !columns.iter().any(|c| c.auto_increment) {
        definitions.push(format!("PRIMARY KEY({})", primary.join(", ")));
    }
    definitions.extend(foreign_keys.iter().map(foreign_key_sql));

    format!("CREATE TABLE {table} ({})", definitions.join(", "))
}

fn foreign_key_sql(foreign: &ForeignKeySnapshot) -> String {
    let columns: Vec<String> = foreign.columns.iter().map(|c| identifier(c)).collect();
    let mut sql = format!(
        "FOREIGN KEY({}) REFERENCES {}",
        columns.join(", "),
        identifier(&foreign.on)
    );
    if !foreign.references.is_empty() {
        let references: Vec<String> = foreign.references.iter().map(|c| identifier(c)).collect();
        sql.push_str(" (");
        sql.push_str(&references.join(", "));
        sql.push(')');
    }
    if let Some(action) = foreign.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(&action.as_sql().to_uppercase());
    }
    if let Some(action) = foreign.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(&action.as_sql().to_uppercase());
    }
    sql
}

/// `CREATE [UNIQUE] INDEX` for an introspected index.
pub(crate) fn create_index_sql(table: &str, index: &IndexSnapshot) -> String {
    let columns: Vec<String> = index.columns.iter().map(|c| identifier(c)).collect();
    format!(
        "CREATE {}INDEX {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        identifier(&index.name),
        identifier(table),
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::DefaultValue;
    use crate::command::ForeignKeyAction;

    fn users() -> TableSnapshot {
        TableSnapshot::new("users")
            .column(ColumnSnapshot::new("name", ColumnType::String(255)).collation("BINARY"))
            .column(ColumnSnapshot::new("age", ColumnType::String(255)).collation("BINARY"))
    }

    #[test]
    fn test_change_then_rename_passes() {
        let blueprint = Blueprint::new("users", |table| {
            table.integer("age").change();
            table.rename_column("name", "first_name");
        });
        let mut rebuilder = TableRebuilder::new(users());

        let first = rebuilder.apply(&blueprint, &Command::Change).unwrap();
        assert_eq!(
            first[2],
            "CREATE TABLE users (name VARCHAR(255) NOT NULL COLLATE BINARY, age INTEGER NOT NULL)"
        );

        let second = rebuilder
            .apply(&blueprint, &blueprint.commands()[0])
            .unwrap();
        assert_eq!(
            second,
            vec![
                "CREATE TEMPORARY TABLE __temp__users AS SELECT name, age FROM users",
                "DROP TABLE users",
                "CREATE TABLE users (age INTEGER NOT NULL, first_name VARCHAR(255) NOT NULL)",
                "INSERT INTO users (first_name, age) SELECT name, age FROM __temp__users",
                "DROP TABLE __temp__users",
            ]
        );

        let names: Vec<&str> = rebuilder
            .snapshot()
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["age", "first_name"]);
    }

    #[test]
    fn test_drop_keeps_order_and_indexes() {
        let table = TableSnapshot::new("posts")
            .column(ColumnSnapshot::new("id", ColumnType::Integer).auto_increment())
            .column(ColumnSnapshot::new("title", ColumnType::String(100)))
            .column(ColumnSnapshot::new("body", ColumnType::Text).nullable())
            .index(IndexSnapshot::new("posts_title_unique", &["title"], true))
            .index(IndexSnapshot::new("posts_body_index", &["body"], false));
        let blueprint = Blueprint::new("posts", |table| table.drop_column(&["body"]));
        let mut rebuilder = TableRebuilder::new(table);

        let sql = rebuilder
            .apply(&blueprint, &blueprint.commands()[0])
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TEMPORARY TABLE __temp__posts AS SELECT id, title FROM posts",
                "DROP TABLE posts",
                "CREATE TABLE posts (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, title VARCHAR(100) NOT NULL)",
                "INSERT INTO posts (id, title) SELECT id, title FROM __temp__posts",
                "DROP TABLE __temp__posts",
                "CREATE UNIQUE INDEX posts_title_unique ON posts (title)",
            ]
        );
        assert_eq!(rebuilder.snapshot().indexes.len(), 1);
    }

    #[test]
    fn test_rename_maps_indexes_and_composite_primary_key() {
        let table = TableSnapshot::new("role_user")
            .column(ColumnSnapshot::new("role_id", ColumnType::Integer).primary_key())
            .column(ColumnSnapshot::new("user_id", ColumnType::Integer).primary_key())
            .index(IndexSnapshot::new("role_user_user_id_index", &["user_id"], false));
        let blueprint = Blueprint::new("role_user", |table| {
            table.rename_column("user_id", "member_id");
        });
        let mut rebuilder = TableRebuilder::new(table);

        let sql = rebuilder
            .apply(&blueprint, &blueprint.commands()[0])
            .unwrap();
        assert_eq!(
            sql[2],
            "CREATE TABLE role_user (role_id INTEGER NOT NULL, member_id INTEGER NOT NULL, PRIMARY KEY(role_id, member_id))"
        );
        assert_eq!(
            sql[5],
            "CREATE INDEX role_user_user_id_index ON role_user (member_id)"
        );
    }

    #[test]
    fn test_change_keeps_collation_for_strings_only() {
        let blueprint = Blueprint::new("users", |table| {
            table.string("name").nullable().change();
            table.integer("age").default_int(18).change();
        });
        let mut rebuilder = TableRebuilder::new(users());

        let sql = rebuilder.apply(&blueprint, &Command::Change).unwrap();
        assert_eq!(
            sql[2],
            "CREATE TABLE users (name VARCHAR(255) DEFAULT NULL COLLATE BINARY, age INTEGER DEFAULT 18 NOT NULL)"
        );
    }

    #[test]
    fn test_unknown_column() {
        let blueprint = Blueprint::new("users", |table| {
            table.integer("missing").change();
        });
        let mut rebuilder = TableRebuilder::new(users());

        let err = rebuilder.apply(&blueprint, &Command::Change).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownColumn { ref column, .. } if column == "missing"
        ));
    }

    #[test]
    fn test_dropping_every_column_fails() {
        let blueprint = Blueprint::new("users", |table| table.drop_column(&["name", "age"]));
        let mut rebuilder = TableRebuilder::new(users());

        assert!(matches!(
            rebuilder.apply(&blueprint, &blueprint.commands()[0]),
            Err(SchemaError::UnsupportedOperation { .. })
        ));
    }

    fn abc() -> TableSnapshot {
        TableSnapshot::new("items")
            .column(ColumnSnapshot::new("a", ColumnType::Integer))
            .column(ColumnSnapshot::new("b", ColumnType::Integer))
            .column(ColumnSnapshot::new("c", ColumnType::Integer))
    }

    #[test]
    fn test_changed_column_moves_behind_untouched_ones() {
        let blueprint = Blueprint::new("items", |table| {
            table.big_integer("a").change();
        });
        let mut rebuilder = TableRebuilder::new(abc());

        let sql = rebuilder.apply(&blueprint, &Command::Change).unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TEMPORARY TABLE __temp__items AS SELECT a, b, c FROM items",
                "DROP TABLE items",
                "CREATE TABLE items (b INTEGER NOT NULL, c INTEGER NOT NULL, a BIGINT NOT NULL)",
                "INSERT INTO items (a, b, c) SELECT a, b, c FROM __temp__items",
                "DROP TABLE __temp__items",
            ]
        );
    }

    #[test]
    fn test_keyword_identifiers_are_quoted() {
        let table = TableSnapshot::new("orders")
            .column(ColumnSnapshot::new("order", ColumnType::Integer))
            .column(ColumnSnapshot::new("note", ColumnType::String(255)))
            .index(IndexSnapshot::new("orders_order_index", &["order"], false));
        let blueprint = Blueprint::new("orders", |table| {
            table.text("note").change();
        });
        let mut rebuilder = TableRebuilder::new(table);

        let sql = rebuilder.apply(&blueprint, &Command::Change).unwrap();
        assert_eq!(
            sql,
            vec![
                r#"CREATE TEMPORARY TABLE __temp__orders AS SELECT "order", note FROM orders"#,
                "DROP TABLE orders",
                r#"CREATE TABLE orders ("order" INTEGER NOT NULL, note CLOB NOT NULL)"#,
                r#"INSERT INTO orders ("order", note) SELECT "order", note FROM __temp__orders"#,
                "DROP TABLE __temp__orders",
                r#"CREATE INDEX orders_order_index ON orders ("order")"#,
            ]
        );
        assert_eq!(identifier("group"), "\"group\"");
        assert_eq!(identifier("Key"), "\"Key\"");
        assert_eq!(identifier("order_id"), "order_id");
    }

    #[test]
    fn test_rename_keeps_non_default_collation() {
        let table = TableSnapshot::new("users")
            .column(ColumnSnapshot::new("email", ColumnType::String(255)).collation("NOCASE"));
        let blueprint = Blueprint::new("users", |table| {
            table.rename_column("email", "login");
        });
        let mut rebuilder = TableRebuilder::new(table);

        let sql = rebuilder
            .apply(&blueprint, &blueprint.commands()[0])
            .unwrap();
        assert_eq!(
            sql[2],
            "CREATE TABLE users (login VARCHAR(255) NOT NULL COLLATE NOCASE)"
        );
    }

    #[test]
    fn test_foreign_keys_follow_renames_and_drops() {
        let table = TableSnapshot::new("users")
            .column(ColumnSnapshot::new("name", ColumnType::String(255)).collation("BINARY"))
            .column(ColumnSnapshot::new("team_id", ColumnType::Integer).nullable())
            .column(ColumnSnapshot::new("owner_id", ColumnType::Integer).nullable())
            .foreign_key(
                ForeignKeySnapshot::new(&["team_id"], "teams", &["id"])
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(ForeignKeySnapshot::new(&["owner_id"], "users", &["id"]));
        let mut rebuilder = TableRebuilder::new(table);

        let rename = Blueprint::new("users", |table| {
            table.rename_column("team_id", "squad_id");
        });
        let sql = rebuilder.apply(&rename, &rename.commands()[0]).unwrap();
        assert_eq!(
            sql[2],
            "CREATE TABLE users (name VARCHAR(255) NOT NULL COLLATE BINARY, \
             owner_id INTEGER DEFAULT NULL, squad_id INTEGER DEFAULT NULL, \
             FOREIGN KEY(squad_id) REFERENCES teams (id) ON DELETE CASCADE, \
             FOREIGN KEY(owner_id) REFERENCES users (id))"
        );

        let drop_owner = Blueprint::new("users", |table| table.drop_column(&["owner_id"]));
        let sql = rebuilder.apply(&drop_owner, &drop_owner.commands()[0]).unwrap();
        assert_eq!(
            sql[2],
            "CREATE TABLE users (name VARCHAR(255) NOT NULL COLLATE BINARY, \
             squad_id INTEGER DEFAULT NULL, \
             FOREIGN KEY(squad_id) REFERENCES teams (id) ON DELETE CASCADE)"
        );
        assert_eq!(rebuilder.snapshot().foreign_keys.len(), 1);
    }

    #[test]
    fn test_default_rendering() {
        let column = ColumnSnapshot::new("status", ColumnType::String(20))
            .default(DefaultValue::String("draft".to_string()));
        assert_eq!(
            column_sql(&column),
            "status VARCHAR(20) DEFAULT 'draft' NOT NULL"
        );
        assert_eq!(identifier("user-id"), "\"user-id\"");
    }
}
