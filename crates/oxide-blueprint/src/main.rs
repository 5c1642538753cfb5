//! oxide-blueprint CLI
//!
//! Compiles JSON blueprints into SQL statements and inspects live SQLite
//! schemas. Statements are printed, never executed.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use oxide_blueprint::prelude::*;
use oxide_blueprint::{load_blueprint, load_snapshot};

/// Laravel-like schema blueprints for Rust.
#[derive(Parser)]
#[command(name = "oxide-blueprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database URL to introspect.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// JSON schema snapshot, used instead of the database when given.
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Grammar to compile with (defaults to the schema's dialect).
    #[arg(short, long, value_enum)]
    grammar: Option<GrammarArg>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum GrammarArg {
    Mysql,
    Postgres,
    Sqlite,
    Sqlserver,
}

impl From<GrammarArg> for Dialect {
    fn from(arg: GrammarArg) -> Self {
        match arg {
            GrammarArg::Mysql => Self::MySql,
            GrammarArg::Postgres => Self::Postgres,
            GrammarArg::Sqlite => Self::Sqlite,
            GrammarArg::Sqlserver => Self::SqlServer,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL statements for a JSON blueprint.
    Compile {
        /// Blueprint file.
        file: PathBuf,
    },

    /// Print the introspected definition of a table as JSON.
    Inspect {
        /// Table name (all tables if not specified).
        table: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Compile { ref file } => {
            let blueprint = load_blueprint(file)?;
            let connection = schema_for(&cli, &blueprint).await?;
            let dialect = cli.grammar.map_or(connection.dialect, Dialect::from);
            debug!(platform = %connection.dialect, grammar = %dialect, "Compiling blueprint");

            let statements = blueprint.to_sql(&connection, dialect.grammar())?;
            if statements.is_empty() {
                info!("Nothing to do for table '{}'.", blueprint.table());
            }
            for statement in statements {
                println!("{statement};");
            }
        }

        Commands::Inspect { ref table } => {
            let introspector = connect(&cli).await?;
            let output = match table {
                Some(table) => serde_json::to_string_pretty(&introspector.table(table).await?)?,
                None => serde_json::to_string_pretty(&introspector.snapshot_all().await?)?,
            };
            println!("{output}");
        }
    }

    Ok(())
}

async fn connect(cli: &Cli) -> anyhow::Result<SqliteIntrospector> {
    let url = cli
        .database
        .as_deref()
        .context("no database given (use --database or DATABASE_URL)")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to '{url}'"))?;
    Ok(SqliteIntrospector::new(pool))
}

/// Builds the schema the blueprint compiles against.
async fn schema_for(cli: &Cli, blueprint: &Blueprint) -> anyhow::Result<SchemaSnapshot> {
    if let Some(path) = &cli.snapshot {
        return Ok(load_snapshot(path)?);
    }

    if cli.database.is_some() {
        let introspector = connect(cli).await?;
        let mut snapshot = SchemaSnapshot::new(Dialect::Sqlite);
        match introspector.table(blueprint.table()).await {
            Ok(table) => snapshot.add_table(table),
            Err(IntrospectError::TableNotFound(_)) if blueprint.creating() => {}
            Err(e) => return Err(e.into()),
        }
        return Ok(snapshot);
    }

    let dialect = cli.grammar.map_or(Dialect::Sqlite, Dialect::from);
    info!("No schema given, compiling against an empty {dialect} schema.");
    Ok(SchemaSnapshot::new(dialect))
}
