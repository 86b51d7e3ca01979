//! # CLI Interface
//!
//! clap-based commands. Each `cmd_*` function is usable on its own so the
//! integration tests can drive them without spawning a process.

use crate::api::{self, ServerConfig};
use crate::models;
use clap::{Parser, Subcommand};
use medpredict_core::{Disease, FormSchema, InputRecord, ModelRegistry, Outcome, submit, validate};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// Error type shared by all commands.
pub type CliError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "medpredict", version, about = "Multiple disease prediction system")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the prediction forms and JSON API over HTTP.
    Serve {
        #[arg(long, env = "MEDPREDICT_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, short, env = "MEDPREDICT_PORT", default_value_t = 8080)]
        port: u16,

        #[arg(long, env = "MEDPREDICT_MODELS_DIR", default_value = "models")]
        models_dir: PathBuf,

        /// Require this key (x-api-key or Bearer) on /api routes.
        #[arg(long, env = "MEDPREDICT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Maximum requests per second across all clients.
        #[arg(long, env = "MEDPREDICT_RATE_LIMIT")]
        rate_limit: Option<NonZeroU32>,

        /// Allow cross-origin requests from any origin.
        #[arg(long)]
        cors: bool,
    },

    /// Run one prediction from the command line.
    Predict {
        /// diabetes, heart or parkinsons
        disease: String,

        #[arg(long, env = "MEDPREDICT_MODELS_DIR", default_value = "models")]
        models_dir: PathBuf,

        /// Named value, e.g. `--field Glucose=120`. Repeatable.
        #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Positional values in schema order.
        #[arg(allow_negative_numbers = true, conflicts_with = "fields")]
        values: Vec<String>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show form schemas (field order, labels, plausible ranges).
    Schema {
        disease: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Load every model artifact and report what was found.
    Check {
        #[arg(long, env = "MEDPREDICT_MODELS_DIR", default_value = "models")]
        models_dir: PathBuf,
    },

    /// Re-encode a model artifact (format chosen by file extension).
    Convert { input: PathBuf, output: PathBuf },
}

// =============================================================================
// COMMANDS
// =============================================================================

pub async fn cmd_serve(config: ServerConfig) -> Result<(), CliError> {
    api::run_server(config).await
}

/// Split `KEY=VALUE` arguments.
fn parse_pairs(fields: &[String]) -> Result<Vec<(String, String)>, CliError> {
    fields
        .iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| -> CliError {
                    format!("expected KEY=VALUE, got '{arg}'").into()
                })
        })
        .collect()
}

pub fn cmd_predict(
    models_dir: &Path,
    disease: &str,
    fields: &[String],
    values: &[String],
    json: bool,
) -> Result<Outcome, CliError> {
    let disease: Disease = disease.parse()?;
    let schema = FormSchema::for_disease(disease);

    let record = if fields.is_empty() {
        Ok(InputRecord::new(values.iter().cloned()))
    } else {
        InputRecord::from_named(schema, parse_pairs(fields)?)
    };

    // Reject before touching the models directory
    let outcome = match record.and_then(|record| validate(schema, &record).map(|_| record)) {
        Ok(record) => {
            let mut registry = ModelRegistry::new();
            models::load_into(&mut registry, models_dir, disease)?;
            submit(&registry, disease, &record)?
        }
        Err(errors) => Outcome::Rejected { disease, errors },
    };

    if json {
        println!("{}", outcome_json(&outcome)?);
    } else {
        print!("{}", outcome.to_text());
    }
    Ok(outcome)
}

fn outcome_json(outcome: &Outcome) -> Result<String, serde_json::Error> {
    let value = match outcome {
        Outcome::Rejected { disease, errors } => serde_json::json!({
            "disease": disease,
            "errors": errors,
            "messages": errors.messages(),
        }),
        Outcome::Diagnosed {
            diagnosis,
            warnings,
            features,
        } => serde_json::json!({
            "disease": diagnosis.disease,
            "label": diagnosis.label,
            "severity": diagnosis.severity,
            "message": diagnosis.message,
            "warnings": warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "features": features,
        }),
    };
    serde_json::to_string_pretty(&value)
}

pub fn cmd_schema(disease: Option<&str>, json: bool) -> Result<(), CliError> {
    let schemas: Vec<&FormSchema> = match disease {
        Some(d) => vec![FormSchema::for_disease(d.parse()?)],
        None => FormSchema::all().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    for schema in schemas {
        println!("{} ({} fields)", schema.title, schema.arity());
        for (idx, field) in schema.fields.iter().enumerate() {
            let range = field
                .range
                .map(|r| format!("  [{r}]"))
                .unwrap_or_default();
            println!("  {:>2}. {:<26} {}{}", idx + 1, field.key, field.label, range);
        }
        println!();
    }
    Ok(())
}

pub fn cmd_check(models_dir: &Path) -> Result<(), CliError> {
    let mut registry = ModelRegistry::new();
    for disease in Disease::ALL {
        let path = models::load_into(&mut registry, models_dir, disease)?;
        let arity = registry.get(disease).map(|m| m.arity()).unwrap_or_default();
        println!("✓ {:<10} {} features  {}", disease.slug(), arity, path.display());
    }
    Ok(())
}

pub fn cmd_convert(input: &Path, output: &Path) -> Result<(), CliError> {
    let artifact = models::load_artifact(input)?;
    models::save_artifact(output, &artifact)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        kind = artifact.kind(),
        "Converted model artifact"
    );
    Ok(())
}
