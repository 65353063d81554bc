//! The `lambda-sql` command: compile a query file under a configuration directory.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tokio::fs;

use query_engine_models::Query;
use query_engine_translation::translation;

/// The commands supported by the CLI.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Compile a query into SQL and its parameter list.
    Compile {
        /// The directory holding `configuration.json`.
        #[arg(long, value_name = "DIR")]
        configuration: PathBuf,
        /// A JSON file holding the query.
        #[arg(long, value_name = "FILE")]
        query: PathBuf,
        /// Lay the SQL out over several lines.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the JSON schema of the configuration file.
    Schema,
}

/// Run a command, returning what it prints.
pub async fn run(command: Command) -> anyhow::Result<String> {
    match command {
        Command::Compile {
            configuration,
            query,
            pretty,
        } => compile(&configuration, &query, pretty).await,
        Command::Schema => Ok(serde_json::to_string_pretty(
            &lambda_sql_configuration::configuration::configuration_jsonschema(),
        )?),
    }
}

async fn compile(
    configuration_dir: &Path,
    query_file: &Path,
    pretty: bool,
) -> anyhow::Result<String> {
    let parsed_configuration =
        lambda_sql_configuration::parse_configuration(configuration_dir).await?;
    let configuration = lambda_sql_configuration::make_runtime_configuration(parsed_configuration)?;

    let query: Query = serde_json::from_str(&fs::read_to_string(query_file).await?)?;
    tracing::info!("compiling {}", query_file.display());

    let plan =
        translation::query::translate(&configuration.metadata, &configuration.dialect, &query)?;
    let compiled = plan.query_sql();

    let sql = if pretty {
        sqlformat::format(
            &compiled.sql,
            &sqlformat::QueryParams::None,
            sqlformat::FormatOptions::default(),
        )
    } else {
        compiled.sql
    };
    Ok(format!("{sql}\n{}", serde_json::to_string(&compiled.params)?))
}
