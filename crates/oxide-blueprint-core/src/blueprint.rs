//! Table blueprints.
//!
//! A [`Blueprint`] accumulates the columns and commands describing how one
//! table should change. It never produces SQL by itself: [`Blueprint::to_sql`]
//! hands it to a [`Grammar`], routing column rewrites through the
//! [`TableRebuilder`] when the grammar or the connection cannot alter columns
//! in place.
//!
//! ```rust
//! use oxide_blueprint_core::{Blueprint, ColumnSnapshot, ColumnType, Dialect};
//! use oxide_blueprint_core::{SchemaSnapshot, TableSnapshot};
//!
//! let connection = SchemaSnapshot::new(Dialect::MySql).with_table(
//!     TableSnapshot::new("users").column(ColumnSnapshot::new("name", ColumnType::String(255))),
//! );
//!
//! let blueprint = Blueprint::new("users", |table| {
//!     table.string("email").nullable();
//! });
//!
//! let sql = blueprint.to_sql(&connection, Dialect::MySql.grammar()).unwrap();
//! assert_eq!(sql, vec!["alter table `users` add `email` varchar(255) null"]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::column::{ColumnDefinition, ColumnType, DEFAULT_STRING_LENGTH};
use crate::command::{Command, DropIndexCommand, ForeignKeyCommand, IndexCommand, IndexKind};
use crate::error::{Result, SchemaError};
use crate::grammar::Grammar;
use crate::introspect::{Introspect, Overlay};
use crate::naming::index_name;
use crate::rebuild::TableRebuilder;

/// Describes the changes to apply to one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    table: String,
    #[serde(default)]
    create: bool,
    #[serde(default)]
    columns: Vec<ColumnDefinition>,
    #[serde(default)]
    commands: Vec<Command>,
}

impl Blueprint {
    /// Creates a blueprint modifying an existing table.
    pub fn new(table: impl Into<String>, build: impl FnOnce(&mut Self)) -> Self {
        let mut blueprint = Self::empty(table.into(), false);
        build(&mut blueprint);
        blueprint
    }

    /// Creates a blueprint creating a new table.
    pub fn create(table: impl Into<String>, build: impl FnOnce(&mut Self)) -> Self {
        let mut blueprint = Self::empty(table.into(), true);
        build(&mut blueprint);
        blueprint
    }

    const fn empty(table: String, create: bool) -> Self {
        Self {
            table,
            create,
            columns: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns true when the blueprint creates the table.
    #[must_use]
    pub const fn creating(&self) -> bool {
        self.create
    }

    /// Returns the declared columns, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Returns the explicitly declared commands, in declaration order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns the columns to add (every column when creating).
    #[must_use]
    pub fn added_columns(&self) -> Vec<&ColumnDefinition> {
        self.columns
            .iter()
            .filter(|c| self.create || !c.change)
            .collect()
    }

    /// Returns the columns to modify in place.
    #[must_use]
    pub fn changed_columns(&self) -> Vec<&ColumnDefinition> {
        if self.create {
            return Vec::new();
        }
        self.columns.iter().filter(|c| c.change).collect()
    }

    // ==================== Columns ====================

    /// Adds a column of an arbitrary type.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> &mut ColumnDefinition {
        let position = self.columns.len();
        self.columns.push(ColumnDefinition::new(name, column_type));
        &mut self.columns[position]
    }

    /// Adds a VARCHAR column of the default length.
    pub fn string(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::String(DEFAULT_STRING_LENGTH))
    }

    /// Adds a VARCHAR column of the given length.
    pub fn string_with_length(
        &mut self,
        name: impl Into<String>,
        length: u32,
    ) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::String(length))
    }

    /// Adds a CHAR column.
    pub fn char(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Char(length))
    }

    /// Adds a TEXT column.
    pub fn text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Text)
    }

    /// Adds an INTEGER column.
    pub fn integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Integer)
    }

    /// Adds a BIGINT column.
    pub fn big_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger)
    }

    /// Adds a SMALLINT column.
    pub fn small_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::SmallInteger)
    }

    /// Adds a TINYINT column.
    pub fn tiny_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TinyInteger)
    }

    /// Adds an unsigned INTEGER column.
    pub fn unsigned_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.integer(name).unsigned()
    }

    /// Adds an unsigned BIGINT column.
    pub fn unsigned_big_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.big_integer(name).unsigned()
    }

    /// Adds an auto-incrementing unsigned INTEGER primary key.
    pub fn increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.unsigned_integer(name).auto_increment()
    }

    /// Adds an auto-incrementing unsigned BIGINT primary key.
    pub fn big_increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.unsigned_big_integer(name).auto_increment()
    }

    /// Adds the conventional `id` primary key.
    pub fn id(&mut self) -> &mut ColumnDefinition {
        self.big_increments("id")
    }

    /// Adds a BOOLEAN column.
    pub fn boolean(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Boolean)
    }

    /// Adds a FLOAT column.
    pub fn float(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Float)
    }

    /// Adds a DOUBLE column.
    pub fn double(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Double)
    }

    /// Adds a DECIMAL column.
    pub fn decimal(
        &mut self,
        name: impl Into<String>,
        precision: u8,
        scale: u8,
    ) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Decimal(precision, scale))
    }

    /// Adds a DATE column.
    pub fn date(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Date)
    }

    /// Adds a DATETIME column.
    pub fn date_time(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::DateTime)
    }

    /// Adds a TIMESTAMP column.
    pub fn timestamp(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Timestamp)
    }

    /// Adds nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    /// Adds a TIME column.
    pub fn time(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Time)
    }

    /// Adds a JSON column.
    pub fn json(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Json)
    }

    /// Adds a UUID column.
    pub fn uuid(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Uuid)
    }

    /// Adds a binary column.
    pub fn binary(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Binary)
    }

    // ==================== Commands ====================

    /// Renames a column.
    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.commands.push(Command::RenameColumn {
            from: from.into(),
            to: to.into(),
        });
    }

    /// Drops one or more columns in a single command.
    pub fn drop_column(&mut self, columns: &[&str]) {
        self.commands.push(Command::DropColumn {
            columns: to_strings(columns),
        });
    }

    /// Adds a primary key, named `{table}_{columns}_primary` when `name` is
    /// `None`.
    pub fn primary(&mut self, columns: &[&str], name: Option<&str>) {
        self.index_command(IndexKind::Primary, columns, name);
    }

    /// Adds a unique index.
    pub fn unique(&mut self, columns: &[&str], name: Option<&str>) {
        self.index_command(IndexKind::Unique, columns, name);
    }

    /// Adds a plain index.
    pub fn index(&mut self, columns: &[&str], name: Option<&str>) {
        self.index_command(IndexKind::Index, columns, name);
    }

    /// Adds a full-text index.
    pub fn fulltext(&mut self, columns: &[&str], name: Option<&str>) {
        self.index_command(IndexKind::Fulltext, columns, name);
    }

    /// Adds a spatial index.
    pub fn spatial_index(&mut self, columns: &[&str], name: Option<&str>) {
        self.index_command(IndexKind::Spatial, columns, name);
    }

    fn index_command(&mut self, kind: IndexKind, columns: &[&str], name: Option<&str>) {
        let columns = to_strings(columns);
        let name = name.map_or_else(
            || index_name(&self.table, &columns, kind.suffix()),
            str::to_string,
        );
        self.commands
            .push(Command::Index(IndexCommand { kind, name, columns }));
    }

    /// Drops an index.
    pub fn drop_index(&mut self, name: impl Into<String>) {
        self.drop_index_command(IndexKind::Index, name.into());
    }

    /// Drops a unique index.
    pub fn drop_unique(&mut self, name: impl Into<String>) {
        self.drop_index_command(IndexKind::Unique, name.into());
    }

    /// Drops the primary key.
    pub fn drop_primary(&mut self, name: Option<&str>) {
        let name = name.map_or_else(
            || index_name(&self.table, &[], IndexKind::Primary.suffix()),
            str::to_string,
        );
        self.drop_index_command(IndexKind::Primary, name);
    }

    /// Drops a full-text index.
    pub fn drop_fulltext(&mut self, name: impl Into<String>) {
        self.drop_index_command(IndexKind::Fulltext, name.into());
    }

    /// Drops a spatial index.
    pub fn drop_spatial_index(&mut self, name: impl Into<String>) {
        self.drop_index_command(IndexKind::Spatial, name.into());
    }

    fn drop_index_command(&mut self, kind: IndexKind, name: String) {
        self.commands
            .push(Command::DropIndex(DropIndexCommand { kind, name }));
    }

    /// Renames an index.
    pub fn rename_index(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.commands.push(Command::RenameIndex {
            from: from.into(),
            to: to.into(),
        });
    }

    /// Adds a foreign key. An empty name is inferred from the columns.
    pub fn foreign(&mut self, foreign: ForeignKeyCommand) {
        self.commands.push(Command::Foreign(foreign));
    }

    /// Drops a foreign key.
    pub fn drop_foreign(&mut self, name: impl Into<String>) {
        self.commands
            .push(Command::DropForeign { name: name.into() });
    }

    /// Renames the table.
    pub fn rename(&mut self, to: impl Into<String>) {
        self.commands.push(Command::Rename { to: to.into() });
    }

    /// Drops the table.
    pub fn drop_table(&mut self) {
        self.commands.push(Command::Drop);
    }

    /// Drops the table if it exists.
    pub fn drop_table_if_exists(&mut self) {
        self.commands.push(Command::DropIfExists);
    }

    // ==================== Compilation ====================

    /// Returns the commands in compilation order: the implied `create`, or
    /// `change` then `add`, followed by the declared commands, followed by
    /// the indexes requested through column modifiers. Missing index and
    /// foreign key names are filled in.
    #[must_use]
    pub fn ordered_commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.commands.len() + 2);

        if self.create {
            commands.push(Command::Create);
        } else {
            if self.columns.iter().any(|c| c.change) {
                commands.push(Command::Change);
            }
            if self.columns.iter().any(|c| !c.change) {
                commands.push(Command::Add);
            }
        }

        commands.extend(self.commands.iter().map(|c| self.with_default_name(c)));

        for column in &self.columns {
            for index in &column.indexes {
                let columns = vec![column.name.clone()];
                let name = index
                    .name
                    .clone()
                    .unwrap_or_else(|| index_name(&self.table, &columns, index.kind.suffix()));
                commands.push(Command::Index(IndexCommand {
                    kind: index.kind,
                    name,
                    columns,
                }));
            }
        }

        commands
    }

    fn with_default_name(&self, command: &Command) -> Command {
        match command {
            Command::Index(index) if index.name.is_empty() => Command::Index(IndexCommand {
                name: index_name(&self.table, &index.columns, index.kind.suffix()),
                ..index.clone()
            }),
            Command::Foreign(foreign) if foreign.name.is_empty() => {
                Command::Foreign(ForeignKeyCommand {
                    name: index_name(&self.table, &foreign.columns, "foreign"),
                    ..foreign.clone()
                })
            }
            other => other.clone(),
        }
    }

    /// Compiles the blueprint into SQL statements for `grammar`.
    ///
    /// `connection` supplies the current table shape and its platform. When
    /// either the grammar or the platform cannot alter columns in place,
    /// `change`, `renameColumn` and `dropColumn` are realized through table
    /// rebuilds and every other command compiles afterwards against the
    /// rebuilt table.
    ///
    /// # Errors
    ///
    /// Fails before returning any statement when the blueprint is malformed,
    /// asks for an unsupported operation, or references unknown tables,
    /// columns or indexes.
    pub fn to_sql(
        &self,
        connection: &dyn Introspect,
        grammar: &dyn Grammar,
    ) -> Result<Vec<String>> {
        let platform = connection.dialect().grammar();
        self.validate(grammar, platform)?;

        let commands = self.ordered_commands();
        debug!(
            table = %self.table,
            dialect = %grammar.dialect(),
            platform = %platform.dialect(),
            commands = commands.len(),
            "Compiling blueprint"
        );

        let rebuild = !self.create
            && !(grammar.supports_native_column_alter() && platform.supports_native_column_alter());
        let (rebuilt, trailing): (Vec<Command>, Vec<Command>) = if rebuild {
            commands.into_iter().partition(Command::requires_rebuild)
        } else {
            (Vec::new(), commands)
        };

        if rebuilt.is_empty() {
            return self.compile_each(grammar, &trailing, connection);
        }

        let mut rebuilder = TableRebuilder::new(connection.table(&self.table)?);
        let mut statements = Vec::new();
        for command in &rebuilt {
            statements.extend(rebuilder.apply(self, command)?);
        }

        let overlay = Overlay::new(connection, rebuilder.into_snapshot());
        statements.extend(self.compile_each(grammar, &trailing, &overlay)?);
        Ok(statements)
    }

    fn compile_each(
        &self,
        grammar: &dyn Grammar,
        commands: &[Command],
        connection: &dyn Introspect,
    ) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for command in commands {
            statements.extend(grammar.compile(self, command, connection)?);
        }
        Ok(statements)
    }

    fn validate(&self, grammar: &dyn Grammar, platform: &dyn Grammar) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(invalid("table name must not be empty"));
        }
        if self.columns.iter().any(|c| c.name.trim().is_empty()) {
            return Err(invalid("column name must not be empty"));
        }

        for command in &self.commands {
            match command {
                Command::RenameColumn { from, to } | Command::RenameIndex { from, to }
                    if from.is_empty() || to.is_empty() =>
                {
                    return Err(invalid(format!("{} requires two names", command.name())));
                }
                Command::DropColumn { columns } if columns.is_empty() => {
                    return Err(invalid("dropColumn requires at least one column"));
                }
                Command::Index(index) if index.columns.is_empty() => {
                    return Err(invalid("index requires at least one column"));
                }
                Command::Foreign(foreign) if foreign.columns.is_empty() || foreign.on.is_empty() => {
                    return Err(invalid("foreign requires columns and a referenced table"));
                }
                _ => {}
            }
        }

        let parties = [grammar, platform];

        let column_rewrites = self
            .commands
            .iter()
            .filter(|c| matches!(c, Command::DropColumn { .. } | Command::RenameColumn { .. }))
            .count();
        if column_rewrites > 1 {
            if let Some(party) = parties
                .iter()
                .find(|g| !g.supports_multiple_column_rebuilds())
            {
                return Err(SchemaError::UnsupportedCombination {
                    dialect: party.dialect(),
                });
            }
        }

        if self
            .commands
            .iter()
            .any(|c| matches!(c, Command::DropForeign { .. }))
        {
            if let Some(party) = parties
                .iter()
                .find(|g| !g.supports_dropping_foreign_keys())
            {
                return Err(SchemaError::unsupported(
                    party.dialect(),
                    "dropping foreign keys (you would need to re-create the table)",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SchemaError {
    SchemaError::InvalidBlueprint(message.into())
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|&v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ForeignKeyAction;
    use crate::grammar::Dialect;
    use crate::introspect::{ColumnSnapshot, SchemaSnapshot, TableSnapshot};

    fn users(dialect: Dialect) -> SchemaSnapshot {
        SchemaSnapshot::new(dialect).with_table(
            TableSnapshot::new("users")
                .column(ColumnSnapshot::new("id", ColumnType::Integer).auto_increment())
                .column(ColumnSnapshot::new("name", ColumnType::String(255))),
        )
    }

    #[test]
    fn test_ordered_commands() {
        let blueprint = Blueprint::new("users", |table| {
            table.string("email").unique();
            table.integer("age").change();
            table.rename_column("name", "first_name");
        });

        let names: Vec<&str> = blueprint
            .ordered_commands()
            .iter()
            .map(Command::name)
            .collect();
        assert_eq!(names, vec!["change", "add", "renameColumn", "index"]);
    }

    #[test]
    fn test_create_ignores_change_flag() {
        let blueprint = Blueprint::create("users", |table| {
            table.id();
            table.string("name").change();
        });

        assert_eq!(blueprint.added_columns().len(), 2);
        assert!(blueprint.changed_columns().is_empty());
        assert_eq!(blueprint.ordered_commands(), vec![Command::Create]);
    }

    #[test]
    fn test_default_index_names() {
        let blueprint = Blueprint::new("users", |table| {
            table.index(&["first_name", "last_name"], None);
            table.unique(&["email"], Some("email_key"));
            table.foreign(ForeignKeyCommand::new(&["team_id"]).on("teams"));
            table.drop_primary(None);
            table.primary(&["id"], None);
        });

        let commands = blueprint.ordered_commands();
        assert!(matches!(
            &commands[0],
            Command::Index(i) if i.name == "users_first_name_last_name_index"
        ));
        assert!(matches!(&commands[1], Command::Index(i) if i.name == "email_key"));
        assert!(matches!(
            &commands[2],
            Command::Foreign(f) if f.name == "users_team_id_foreign" && f.references == ["id"]
        ));
        assert!(matches!(
            &commands[3],
            Command::DropIndex(d) if d.name == "users_primary"
        ));
        assert!(matches!(
            &commands[4],
            Command::Index(i) if i.name == "users_id_primary"
        ));
    }

    #[test]
    fn test_to_sql_does_not_mutate() {
        let blueprint = Blueprint::new("users", |table| {
            table.string("email").nullable();
        });
        let before = blueprint.clone();
        let connection = users(Dialect::MySql);

        let first = blueprint
            .to_sql(&connection, Dialect::MySql.grammar())
            .unwrap();
        let second = blueprint
            .to_sql(&connection, Dialect::MySql.grammar())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(blueprint, before);
    }

    #[test]
    fn test_empty_column_name_rejected() {
        let blueprint = Blueprint::new("users", |table| {
            table.string("");
        });
        let err = blueprint
            .to_sql(&users(Dialect::MySql), Dialect::MySql.grammar())
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidBlueprint(_)));
    }

    #[test]
    fn test_multiple_rewrites_rejected_on_sqlite_platform() {
        let blueprint = Blueprint::new("users", |table| {
            table.drop_column(&["name"]);
            table.rename_column("id", "key");
        });

        for dialect in Dialect::ALL {
            let err = blueprint
                .to_sql(&users(Dialect::Sqlite), dialect.grammar())
                .unwrap_err();
            assert!(matches!(
                err,
                SchemaError::UnsupportedCombination { .. }
            ));
        }

        let sql = blueprint
            .to_sql(&users(Dialect::MySql), Dialect::MySql.grammar())
            .unwrap();
        assert_eq!(sql.len(), 2);
    }

    #[test]
    fn test_drop_foreign_rejected_on_sqlite() {
        let blueprint = Blueprint::new("users", |table| {
            table.drop_foreign("users_team_id_foreign");
        });

        let err = blueprint
            .to_sql(&users(Dialect::Sqlite), Dialect::Postgres.grammar())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "SQLite doesn't support dropping foreign keys (you would need to re-create the table)."
        );

        let sql = blueprint
            .to_sql(&users(Dialect::Postgres), Dialect::Postgres.grammar())
            .unwrap();
        assert_eq!(
            sql,
            vec![r#"alter table "users" drop constraint "users_team_id_foreign""#]
        );
    }

    #[test]
    fn test_blueprint_from_json() {
        let blueprint: Blueprint = serde_json::from_str(
            r#"{
                "table": "posts",
                "columns": [{"name": "title", "type": {"string": 100}}],
                "commands": [
                    {"op": "foreign", "columns": ["user_id"], "references": ["id"],
                     "on": "users", "on_delete": "cascade"}
                ]
            }"#,
        )
        .unwrap();

        assert!(!blueprint.creating());
        let commands = blueprint.ordered_commands();
        assert_eq!(commands[0], Command::Add);
        assert!(matches!(
            &commands[1],
            Command::Foreign(f)
                if f.name == "posts_user_id_foreign"
                    && f.on_delete == Some(ForeignKeyAction::Cascade)
        ));
    }
}
