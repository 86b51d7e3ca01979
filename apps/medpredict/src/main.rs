//! # MedPredict Binary
//!
//! Entry point: sets up logging, parses arguments, dispatches to `cli`.

use clap::Parser;
use medpredict::api::ServerConfig;
use medpredict::cli::{self, Cli, CliError, Commands};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for a prediction refused because of invalid input.
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `--json` output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            models_dir,
            api_key,
            rate_limit,
            cors,
        } => {
            let config = ServerConfig {
                host,
                port,
                models_dir,
                api_key,
                rate_limit,
                cors,
            };
            cli::cmd_serve(config).await?;
        }
        Commands::Predict {
            disease,
            models_dir,
            fields,
            values,
            json,
        } => {
            let outcome = cli::cmd_predict(&models_dir, &disease, &fields, &values, json)?;
            if outcome.errors().is_some() {
                return Ok(ExitCode::from(EXIT_REJECTED));
            }
        }
        Commands::Schema { disease, json } => cli::cmd_schema(disease.as_deref(), json)?,
        Commands::Check { models_dir } => cli::cmd_check(&models_dir)?,
        Commands::Convert { input, output } => cli::cmd_convert(&input, &output)?,
    }
    Ok(ExitCode::SUCCESS)
}
