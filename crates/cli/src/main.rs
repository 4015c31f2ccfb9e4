//! Deployment Template Validator CLI
//!
//! A command-line tool for validating deployment templates against chart
//! schemas and for inspecting resource quantities.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{quantity, validate};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use validator_lib::{observability, DirSchemaStore, TemplateValidator, ValidationLogger};

/// Deployment Template Validator CLI
#[derive(Parser)]
#[command(name = "dtv")]
#[command(author, version, about = "CLI for Deployment Template Validator", long_about = None)]
pub struct Cli {
    /// Directory holding <name>.json schema files (overrides DTV_SCHEMA_DIR)
    #[arg(long, global = true)]
    pub schema_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a deployment template against a named schema
    Validate {
        /// Template file (.json, .yaml or .yml), or - for JSON on stdin
        file: PathBuf,

        /// Schema name, resolved as <schema-dir>/<name>.json
        #[arg(long, short)]
        schema: String,
    },

    /// Parse a CPU or memory quantity
    Quantity {
        /// Quantity to parse, e.g. 50m or 1Gi
        value: String,

        /// Resource family the quantity belongs to
        #[arg(long, value_enum, default_value = "cpu")]
        family: quantity::FamilyArg,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::CliConfig::load()?;
    init_tracing(cli.verbose, config.log_json);

    let format = cli.format.or(config.default_format).unwrap_or_default();
    let schema_dir = cli.schema_dir.clone().unwrap_or(config.schema_dir);
    debug!(schema_dir = %schema_dir.display(), "CLI configured");

    // Execute command
    let ok = match cli.command {
        Commands::Validate { file, schema } => {
            let validator = TemplateValidator::with_resource_formats(DirSchemaStore::new(schema_dir))
                .with_logger(ValidationLogger::new("dtv"));
            validate::validate_file(&validator, &file, &schema, format)?
        }
        Commands::Quantity { value, family } => quantity::inspect_quantity(&value, family, format)?,
    };

    // stdout carries the report only
    if cli.print_metrics {
        eprint!("{}", observability::encode_metrics()?);
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
