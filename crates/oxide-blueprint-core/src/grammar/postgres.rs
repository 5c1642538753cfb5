//! PostgreSQL grammar.

use super::{Dialect, Grammar};
use crate::blueprint::Blueprint;
use crate::column::{quote_string, ColumnDefinition, ColumnType};
use crate::command::{DropIndexCommand, IndexCommand, IndexKind};
use crate::error::Result;
use crate::introspect::Introspect;

/// Grammar for PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl PostgresGrammar {
    /// Creates a new PostgreSQL grammar.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// `comment on column` statements for every commented column.
    fn comments<'a>(
        &self,
        blueprint: &Blueprint,
        columns: impl IntoIterator<Item = &'a ColumnDefinition>,
    ) -> Vec<String> {
        columns
            .into_iter()
            .filter_map(|column| {
                column.comment.as_ref().map(|comment| {
                    format!(
                        "comment on column {}.{} is {}",
                        self.wrap(blueprint.table()),
                        self.wrap(&column.name),
                        quote_string(comment)
                    )
                })
            })
            .collect()
    }

    /// `alter column` clauses realizing a changed definition.
    fn change_clauses(&self, column: &ColumnDefinition) -> Vec<String> {
        let name = self.wrap(&column.name);
        // serial pseudo-types only exist in CREATE / ADD.
        let plain = ColumnDefinition {
            auto_increment: false,
            ..column.clone()
        };

        let mut alter_type = format!("alter column {name} type {}", self.type_sql(&plain));
        if let Some(collation) = &column.collation {
            alter_type.push_str(" collate ");
            alter_type.push_str(&self.wrap(collation));
        }

        let nullability = if column.nullable {
            format!("alter column {name} drop not null")
        } else {
            format!("alter column {name} set not null")
        };

        let default = column.default.as_ref().map_or_else(
            || format!("alter column {name} drop default"),
            |default| format!("alter column {name} set default {}", default.to_quoted_sql()),
        );

        vec![alter_type, nullability, default]
    }
}

impl Grammar for PostgresGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        match &column.column_type {
            ColumnType::String(length) => format!("varchar({length})"),
            ColumnType::Char(length) => format!("char({length})"),
            ColumnType::Text => "text".to_string(),
            ColumnType::Integer if column.auto_increment => "serial".to_string(),
            ColumnType::Integer => "integer".to_string(),
            ColumnType::BigInteger if column.auto_increment => "bigserial".to_string(),
            ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::SmallInteger | ColumnType::TinyInteger if column.auto_increment => {
                "smallserial".to_string()
            }
            ColumnType::SmallInteger | ColumnType::TinyInteger => "smallint".to_string(),
            ColumnType::Boolean => "boolean".to_string(),
            ColumnType::Float => "real".to_string(),
            ColumnType::Double => "double precision".to_string(),
            ColumnType::Decimal(precision, scale) => format!("decimal({precision}, {scale})"),
            ColumnType::Date => "date".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => {
                "timestamp(0) without time zone".to_string()
            }
            ColumnType::Time => "time(0) without time zone".to_string(),
            ColumnType::Json => "json".to_string(),
            ColumnType::Uuid => "uuid".to_string(),
            ColumnType::Binary => "bytea".to_string(),
            ColumnType::Custom(raw) => raw.clone(),
        }
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", self.wrap(&column.name), self.type_sql(column));

        if let Some(collation) = &column.collation {
            sql.push_str(" collate ");
            sql.push_str(&self.wrap(collation));
        }
        if column.auto_increment {
            sql.push_str(" primary key");
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(" default ");
            sql.push_str(&default.to_quoted_sql());
        }
        sql
    }

    fn compile_create(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let columns: Vec<String> = blueprint
            .columns()
            .iter()
            .map(|c| self.column_sql(c))
            .collect();

        let mut statements = vec![format!(
            "create table {} ({})",
            self.wrap(blueprint.table()),
            columns.join(", ")
        )];
        statements.extend(self.comments(blueprint, blueprint.columns()));
        Ok(statements)
    }

    fn compile_add_columns(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let added = blueprint.added_columns();
        if added.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<String> = added
            .iter()
            .map(|c| format!("add column {}", self.column_sql(c)))
            .collect();
        let mut statements = vec![format!(
            "alter table {} {}",
            self.wrap(blueprint.table()),
            clauses.join(", ")
        )];
        statements.extend(self.comments(blueprint, added));
        Ok(statements)
    }

    fn compile_change_columns(
        &self,
        blueprint: &Blueprint,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let changed = blueprint.changed_columns();
        if changed.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<String> = changed
            .iter()
            .flat_map(|c| self.change_clauses(c))
            .collect();
        let mut statements = vec![format!(
            "alter table {} {}",
            self.wrap(blueprint.table()),
            clauses.join(", ")
        )];
        statements.extend(self.comments(blueprint, changed));
        Ok(statements)
    }

    fn compile_drop_columns(
        &self,
        blueprint: &Blueprint,
        columns: &[String],
    ) -> Result<Vec<String>> {
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("drop column {}", self.wrap(c)))
            .collect();
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap(blueprint.table()),
            clauses.join(", ")
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        let name = self.wrap(&index.name);
        let columns = self.columnize(&index.columns);

        let sql = match index.kind {
            IndexKind::Primary => format!("alter table {table} add primary key ({columns})"),
            IndexKind::Unique => {
                format!("alter table {table} add constraint {name} unique ({columns})")
            }
            IndexKind::Index => format!("create index {name} on {table} ({columns})"),
            IndexKind::Fulltext => {
                let vectors: Vec<String> = index
                    .columns
                    .iter()
                    .map(|c| format!("to_tsvector({}, {})", quote_string("english"), self.wrap(c)))
                    .collect();
                format!(
                    "create index {name} on {table} using gin (({}))",
                    vectors.join(" || ")
                )
            }
            IndexKind::Spatial => format!("create index {name} on {table} using gist ({columns})"),
        };
        Ok(vec![sql])
    }

    fn compile_drop_index(
        &self,
        blueprint: &Blueprint,
        index: &DropIndexCommand,
    ) -> Result<Vec<String>> {
        let table = self.wrap(blueprint.table());
        let sql = match index.kind {
            IndexKind::Primary => format!(
                "alter table {table} drop constraint {}",
                self.wrap(&format!("{}_pkey", blueprint.table()))
            ),
            IndexKind::Unique => {
                format!("alter table {table} drop constraint {}", self.wrap(&index.name))
            }
            _ => format!("drop index {}", self.wrap(&index.name)),
        };
        Ok(vec![sql])
    }

    fn compile_rename_index(
        &self,
        _blueprint: &Blueprint,
        from: &str,
        to: &str,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "alter index {} rename to {}",
            self.wrap(from),
            self.wrap(to)
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ForeignKeyAction, ForeignKeyCommand};
    use crate::introspect::SchemaSnapshot;

    fn compile(blueprint: &Blueprint) -> Vec<String> {
        let connection = SchemaSnapshot::new(Dialect::Postgres);
        blueprint
            .to_sql(&connection, &PostgresGrammar::new())
            .unwrap()
    }

    #[test]
    fn test_create_table_with_comment() {
        let blueprint = Blueprint::create("users", |table| {
            table.increments("id");
            table.string("email").comment("login");
            table.timestamp("created_at").nullable();
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                r#"create table "users" ("id" serial primary key not null, "email" varchar(255) not null, "created_at" timestamp(0) without time zone null)"#,
                r#"comment on column "users"."email" is 'login'"#,
            ]
        );
    }

    #[test]
    fn test_change_columns() {
        let blueprint = Blueprint::new("users", |table| {
            table.string_with_length("name", 100).nullable().collation("C").change();
            table.integer("votes").default_int(0).change();
        });

        assert_eq!(
            compile(&blueprint),
            vec![concat!(
                r#"alter table "users" alter column "name" type varchar(100) collate "C", "#,
                r#"alter column "name" drop not null, alter column "name" drop default, "#,
                r#"alter column "votes" type integer, alter column "votes" set not null, "#,
                r#"alter column "votes" set default '0'"#
            )]
        );
    }

    #[test]
    fn test_add_rename_drop_columns() {
        let blueprint = Blueprint::new("users", |table| {
            table.boolean("active").default_bool(false);
            table.rename_column("name", "first_name");
            table.drop_column(&["votes"]);
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                r#"alter table "users" add column "active" boolean not null default '0'"#,
                r#"alter table "users" rename column "name" to "first_name""#,
                r#"alter table "users" drop column "votes""#,
            ]
        );
    }

    #[test]
    fn test_indexes() {
        let blueprint = Blueprint::new("users", |table| {
            table.primary(&["id"], None);
            table.unique(&["email"], None);
            table.index(&["name"], None);
            table.fulltext(&["bio"], None);
            table.spatial_index(&["location"], None);
            table.drop_unique("users_email_unique");
            table.drop_index("users_name_index");
            table.drop_primary(None);
            table.rename_index("index1", "index2");
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                r#"alter table "users" add primary key ("id")"#,
                r#"alter table "users" add constraint "users_email_unique" unique ("email")"#,
                r#"create index "users_name_index" on "users" ("name")"#,
                r#"create index "users_bio_fulltext" on "users" using gin ((to_tsvector('english', "bio")))"#,
                r#"create index "users_location_spatialindex" on "users" using gist ("location")"#,
                r#"alter table "users" drop constraint "users_email_unique""#,
                r#"drop index "users_name_index""#,
                r#"alter table "users" drop constraint "users_pkey""#,
                r#"alter index "index1" rename to "index2""#,
            ]
        );
    }

    #[test]
    fn test_foreign_keys_and_tables() {
        let blueprint = Blueprint::new("posts", |table| {
            table.foreign(
                ForeignKeyCommand::new(&["user_id"])
                    .on("users")
                    .on_delete(ForeignKeyAction::SetNull)
                    .on_update(ForeignKeyAction::Cascade),
            );
            table.drop_foreign("posts_user_id_foreign");
            table.rename("articles");
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                r#"alter table "posts" add constraint "posts_user_id_foreign" foreign key ("user_id") references "users" ("id") on delete set null on update cascade"#,
                r#"alter table "posts" drop constraint "posts_user_id_foreign""#,
                r#"alter table "posts" rename to "articles""#,
            ]
        );
    }
}
