use std::process::ExitCode;

use clap::Parser;

use lambda_sql_cli::{run, Command};

/// Compile LINQ-style queries into parameterized SQL.
#[derive(Debug, Parser)]
#[command(name = "lambda-sql", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args.command).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
