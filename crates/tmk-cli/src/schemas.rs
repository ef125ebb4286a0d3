//! # Schemas Subcommand
//!
//! Lists the known models and the shape of their schemas.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use tmk_schema::SchemaRegistry;

use crate::config::OutputFormat;

/// Arguments for `tmk schemas`.
#[derive(Args, Debug, Default)]
pub struct SchemasArgs {
    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Execute `tmk schemas`.
pub fn run_schemas(
    args: &SchemasArgs,
    default_format: OutputFormat,
    registry: &SchemaRegistry,
    out: &mut impl std::io::Write,
) -> Result<u8> {
    let models = registry.models()?;

    match args.format.unwrap_or(default_format) {
        OutputFormat::Text => {
            for model in &models {
                let node = model.node();
                writeln!(
                    out,
                    "{:<10} {} fields ({} required), max score {}",
                    model.name().as_str(),
                    node.properties().len(),
                    node.required().len(),
                    2 * node.properties().len()
                )?;
            }
        }
        OutputFormat::Json => {
            let listing: Vec<_> = models
                .iter()
                .map(|model| {
                    let node = model.node();
                    json!({
                        "name": model.name(),
                        "fields": node.properties().iter().map(|p| p.name()).collect::<Vec<_>>(),
                        "required": node.required(),
                    })
                })
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&listing)?)?;
        }
    }

    Ok(0)
}
