//! The commands of the `filter-compiler` command line.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;

use filter_compiler_configuration::{self as configuration, Configuration, ParsedConfiguration};
use query_engine_execution::query::{PostgresExecutor, StatementExecutor};
use query_engine_metadata::metadata::{FieldLookup, Schema};
use query_engine_sql::sql;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::helpers::Env;
use query_engine_translation::translation::query::{self, pagination::PageInfo};
use query_engine_translation::translation::request::QueryRequest;

/// The commands the cli understands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write an empty configuration into a directory.
    Initialize {
        #[arg(long)]
        configuration: PathBuf,
    },
    /// Compile a request and print the statement, its parameters and the joins it uses.
    Compile(CompileArgs),
    /// Compile a request, run it and print the rows.
    Execute {
        #[command(flatten)]
        compile: CompileArgs,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Print the JSON Schema of the configuration format.
    PrintSchema,
}

#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// The directory holding `configuration.json`.
    #[arg(long)]
    pub configuration: PathBuf,
    /// The schema the request reads.
    #[arg(long)]
    pub collection: String,
    /// A file holding the request as JSON.
    #[arg(long)]
    pub request: PathBuf,
    /// Override how unknown field names are treated.
    #[arg(long, value_enum)]
    pub lookup: Option<FieldLookup>,
    /// Compile the `COUNT(*)` statement for the filter instead.
    #[arg(long)]
    pub count: bool,
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Serialize)]
struct CompileOutput {
    sql: String,
    params: Vec<sql::string::Param>,
    joins: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    edges: Vec<Edge>,
    page_info: PageInfo,
}

#[derive(Debug, Serialize)]
struct Edge {
    cursor: String,
    node: serde_json::Value,
}

/// Run a command, returning what should be printed.
pub async fn run(command: Command) -> anyhow::Result<String> {
    match command {
        Command::Initialize { configuration } => initialize(&configuration).await,
        Command::Compile(args) => compile(&args).await,
        Command::Execute {
            compile,
            database_url,
        } => execute(&compile, &database_url).await,
        Command::PrintSchema => Ok(serde_json::to_string_pretty(
            &configuration::generate_latest_schema(),
        )?),
    }
}

async fn initialize(dir: &Path) -> anyhow::Result<String> {
    configuration::write_parsed_configuration(&ParsedConfiguration::empty(), dir).await?;
    Ok(format!("wrote an empty configuration to {}", dir.display()))
}

async fn compile(args: &CompileArgs) -> anyhow::Result<String> {
    let (configuration, request) = load(args).await?;
    let schema = collection(&configuration, &args.collection)?;
    let env = env(&configuration, args.lookup);

    let plan = if args.count {
        query::translate_count(&env, schema, &request)?
    } else {
        query::translate(&env, schema, &request)?.plan
    };

    let statement = plan.query_sql();
    let output = CompileOutput {
        sql: if args.pretty {
            statement.pretty()
        } else {
            statement.sql
        },
        params: statement.params,
        joins: plan
            .query
            .joins
            .iter()
            .map(|join| join.alias.name.clone())
            .collect(),
    };
    to_json(&output, args.pretty)
}

async fn execute(args: &CompileArgs, database_url: &str) -> anyhow::Result<String> {
    let (configuration, request) = load(args).await?;
    let schema = collection(&configuration, &args.collection)?;
    let env = env(&configuration, args.lookup);
    let executor = PostgresExecutor::connect(database_url).await?;

    if args.count {
        let plan = query::translate_count(&env, schema, &request)?;
        let rows = executor.execute(&plan.query_sql()).await?;
        return to_json(&rows, args.pretty);
    }

    let compiled = query::translate(&env, schema, &request)?;
    let rows = executor.execute(&compiled.statement()).await?;
    if !request.uses_cursors() {
        return to_json(&rows, args.pretty);
    }

    let count = query::translate_count(&env, schema, &request)?;
    let total_count = total_count(&executor.execute(&count.query_sql()).await?)?;
    let connection = Connection {
        edges: rows
            .into_iter()
            .zip(0u64..)
            .map(|(node, index)| Edge {
                cursor: compiled.pagination.cursor_for(index),
                node,
            })
            .collect(),
        page_info: PageInfo::calculate(total_count, compiled.pagination),
    };
    to_json(&connection, args.pretty)
}

async fn load(args: &CompileArgs) -> anyhow::Result<(Configuration, QueryRequest)> {
    let parsed = configuration::parse_configuration(&args.configuration).await?;
    let configuration = configuration::make_runtime_configuration(parsed)?;

    let contents = tokio::fs::read_to_string(&args.request)
        .await
        .with_context(|| format!("reading {}", args.request.display()))?;
    let request = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", args.request.display()))?;

    Ok((configuration, request))
}

fn collection<'a>(configuration: &'a Configuration, name: &str) -> Result<&'a Schema, Error> {
    configuration
        .registry
        .get(name)
        .map(|schema| &**schema)
        .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
}

fn env(configuration: &Configuration, lookup: Option<FieldLookup>) -> Env<'_> {
    let env = Env::new(&configuration.settings);
    match lookup {
        Some(lookup) => env.with_lookup(lookup),
        None => env,
    }
}

fn total_count(rows: &[serde_json::Value]) -> anyhow::Result<u64> {
    rows.first()
        .and_then(|row| row.get("count"))
        .and_then(serde_json::Value::as_u64)
        .context("the count statement returned no count")
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}
