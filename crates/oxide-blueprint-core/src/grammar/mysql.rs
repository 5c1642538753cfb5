//! MySQL grammar.

use super::{Dialect, Grammar};
use crate::blueprint::Blueprint;
use crate::column::{quote_string, ColumnDefinition, ColumnType};
use crate::command::{DropIndexCommand, IndexCommand, IndexKind};
use crate::error::Result;
use crate::introspect::Introspect;

/// Grammar for MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl MySqlGrammar {
    /// Creates a new MySQL grammar.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn alter(&self, blueprint: &Blueprint, clauses: &[String]) -> Vec<String> {
        if clauses.is_empty() {
            return Vec::new();
        }
        vec![format!(
            "alter table {} {}",
            self.wrap(blueprint.table()),
            clauses.join(", ")
        )]
    }
}

impl Grammar for MySqlGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn wrap(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        let base = match &column.column_type {
            ColumnType::String(length) => format!("varchar({length})"),
            ColumnType::Char(length) => format!("char({length})"),
            ColumnType::Text => "text".to_string(),
            ColumnType::Integer => "int".to_string(),
            ColumnType::BigInteger => "bigint".to_string(),
            ColumnType::SmallInteger => "smallint".to_string(),
            ColumnType::TinyInteger => "tinyint".to_string(),
            ColumnType::Boolean => "tinyint(1)".to_string(),
            ColumnType::Float => "float".to_string(),
            ColumnType::Double => "double".to_string(),
            ColumnType::Decimal(precision, scale) => format!("decimal({precision}, {scale})"),
            ColumnType::Date => "date".to_string(),
            ColumnType::DateTime => "datetime".to_string(),
            ColumnType::Timestamp => "timestamp".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::Json => "json".to_string(),
            ColumnType::Uuid => "char(36)".to_string(),
            ColumnType::Binary => "blob".to_string(),
            ColumnType::Custom(raw) => raw.clone(),
        };

        if column.unsigned && column.column_type.is_integer() {
            format!("{base} unsigned")
        } else {
            base
        }
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", self.wrap(&column.name), self.type_sql(column));

        if let Some(collation) = &column.collation {
            sql.push_str(" collate ");
            sql.push_str(&quote_string(collation));
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(" default ");
            sql.push_str(&default.to_quoted_sql());
        }
        if column.auto_increment {
            sql.push_str(" auto_increment primary key");
        }
        if let Some(comment) = &column.comment {
            sql.push_str(" comment ");
            sql.push_str(&quote_string(comment));
        }
        if let Some(after) = &column.after {
            sql.push_str(" after ");
            sql.push_str(&self.wrap(after));
        }
        sql
    }

    fn compile_add_columns(&self, blueprint: &Blueprint) -> Result<Vec<String>> {
        let clauses: Vec<String> = blueprint
            .added_columns()
            .into_iter()
            .map(|c| format!("add {}", self.column_sql(c)))
            .collect();
        Ok(self.alter(blueprint, &clauses))
    }

    fn compile_change_columns(
        &self,
        blueprint: &Blueprint,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let clauses: Vec<String> = blueprint
            .changed_columns()
            .into_iter()
            .map(|c| format!("modify {}", self.column_sql(c)))
            .collect();
        Ok(self.alter(blueprint, &clauses))
    }

    fn compile_drop_columns(
        &self,
        blueprint: &Blueprint,
        columns: &[String],
    ) -> Result<Vec<String>> {
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("drop {}", self.wrap(c)))
            .collect();
        Ok(self.alter(blueprint, &clauses))
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Result<Vec<String>> {
        let columns = self.columnize(&index.columns);
        let clause = match index.kind {
            IndexKind::Primary => format!("add primary key ({columns})"),
            IndexKind::Unique => format!("add unique {}({columns})", self.wrap(&index.name)),
            IndexKind::Index => format!("add index {}({columns})", self.wrap(&index.name)),
            IndexKind::Fulltext => format!("add fulltext {}({columns})", self.wrap(&index.name)),
            IndexKind::Spatial => {
                format!("add spatial index {}({columns})", self.wrap(&index.name))
            }
        };
        Ok(self.alter(blueprint, &[clause]))
    }

    fn compile_drop_index(
        &self,
        blueprint: &Blueprint,
        index: &DropIndexCommand,
    ) -> Result<Vec<String>> {
        let clause = match index.kind {
            IndexKind::Primary => "drop primary key".to_string(),
            _ => format!("drop index {}", self.wrap(&index.name)),
        };
        Ok(self.alter(blueprint, &[clause]))
    }

    fn compile_rename_index(
        &self,
        blueprint: &Blueprint,
        from: &str,
        to: &str,
        _connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let clause = format!("rename index {} to {}", self.wrap(from), self.wrap(to));
        Ok(self.alter(blueprint, &[clause]))
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Result<Vec<String>> {
        let clause = format!("drop foreign key {}", self.wrap(name));
        Ok(self.alter(blueprint, &[clause]))
    }

    fn compile_rename_table(&self, blueprint: &Blueprint, to: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "rename table {} to {}",
            self.wrap(blueprint.table()),
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
        let connection = SchemaSnapshot::new(Dialect::MySql);
        blueprint.to_sql(&connection, &MySqlGrammar::new()).unwrap()
    }

    #[test]
    fn test_create_table() {
        let blueprint = Blueprint::create("users", |table| {
            table.increments("id");
            table.string("email").collation("utf8mb4_bin");
            table.boolean("active").default_bool(true).comment("enabled");
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                "create table `users` (`id` int unsigned not null auto_increment primary key, \
                 `email` varchar(255) collate 'utf8mb4_bin' not null, \
                 `active` tinyint(1) not null default '1' comment 'enabled')"
            ]
        );
    }

    #[test]
    fn test_add_and_change_columns() {
        let blueprint = Blueprint::new("users", |table| {
            table.string("nickname").nullable().after("email");
            table.integer("age").unsigned().change();
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                "alter table `users` modify `age` int unsigned not null",
                "alter table `users` add `nickname` varchar(255) null after `email`",
            ]
        );
    }

    #[test]
    fn test_column_commands() {
        let blueprint = Blueprint::new("users", |table| {
            table.rename_column("name", "first_name");
            table.drop_column(&["votes", "avatar"]);
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                "alter table `users` rename column `name` to `first_name`",
                "alter table `users` drop `votes`, drop `avatar`",
            ]
        );
    }

    #[test]
    fn test_index_commands() {
        let blueprint = Blueprint::new("users", |table| {
            table.primary(&["id"], None);
            table.unique(&["email"], None);
            table.index(&["first_name", "last_name"], Some("name_index"));
            table.fulltext(&["bio"], None);
            table.spatial_index(&["location"], None);
            table.drop_index("name_index");
            table.drop_primary(None);
            table.rename_index("index1", "index2");
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                "alter table `users` add primary key (`id`)",
                "alter table `users` add unique `users_email_unique`(`email`)",
                "alter table `users` add index `name_index`(`first_name`, `last_name`)",
                "alter table `users` add fulltext `users_bio_fulltext`(`bio`)",
                "alter table `users` add spatial index `users_location_spatialindex`(`location`)",
                "alter table `users` drop index `name_index`",
                "alter table `users` drop primary key",
                "alter table `users` rename index `index1` to `index2`",
            ]
        );
    }

    #[test]
    fn test_foreign_keys_and_tables() {
        let blueprint = Blueprint::new("posts", |table| {
            table.foreign(
                ForeignKeyCommand::new(&["user_id"])
                    .on("users")
                    .on_delete(ForeignKeyAction::Cascade),
            );
            table.drop_foreign("posts_team_id_foreign");
            table.rename("articles");
        });

        assert_eq!(
            compile(&blueprint),
            vec![
                "alter table `posts` add constraint `posts_user_id_foreign` foreign key (`user_id`) \
                 references `users` (`id`) on delete cascade",
                "alter table `posts` drop foreign key `posts_team_id_foreign`",
                "rename table `posts` to `articles`",
            ]
        );
    }

    #[test]
    fn test_drop_table() {
        let drop = Blueprint::new("users", Blueprint::drop_table);
        let drop_if_exists = Blueprint::new("users", Blueprint::drop_table_if_exists);

        assert_eq!(compile(&drop), vec!["drop table `users`"]);
        assert_eq!(compile(&drop_if_exists), vec!["drop table if exists `users`"]);
    }
}
