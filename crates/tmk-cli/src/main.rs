//! # tmk CLI entry point
//!
//! Parses command-line arguments, loads the schema registry and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tmk_cli::check::{run_check, CheckArgs};
use tmk_cli::config::Config;
use tmk_cli::schemas::{run_schemas, SchemasArgs};
use tmk_schema::SchemaRegistry;

/// TMK document checker.
///
/// Validates Task, Method, and Knowledge documents against their JSON
/// Schemas and scores partially correct documents field by field.
#[derive(Parser, Debug)]
#[command(name = "tmk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Load `<Model>.schema.json` files from this directory instead of the
    /// bundled schemas.
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and score a TMK document.
    Check(CheckArgs),

    /// List the known models.
    Schemas(SchemasArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("tmk CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match dispatch(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<u8> {
    let config = Config::load_optional(cli.config.as_deref())?;

    let store = config.store(cli.schema_dir.as_deref());
    tracing::debug!(store = %store.describe(), "loading schemas");

    let registry = SchemaRegistry::new();
    registry.initialize(&store).await?;

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Check(args) => run_check(&args, &config, &registry, &mut stdout),
        Commands::Schemas(args) => run_schemas(&args, config.format, &registry, &mut stdout),
    }
}
