//! # Check Subcommand
//!
//! Validates and scores one TMK document, read from a file or stdin.
//!
//! Exit codes: 0 when the document is valid, 1 when it is invalid,
//! 2 when it could not be processed (malformed JSON, unknown model, I/O).

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use tmk_schema::{run, PipelineError, Request, SchemaRegistry};

use crate::config::{Config, OutputFormat};
use crate::render::{render_error_json, render_json, render_text};

/// Arguments for `tmk check`.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Document to check. Reads stdin when omitted or `-`.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Show the per-field score breakdown.
    #[arg(long)]
    pub detailed: bool,

    /// Print the raw validation errors for invalid documents.
    #[arg(long)]
    pub raw: bool,

    /// Repair key and enum casing before validating.
    #[arg(long)]
    pub fix: bool,

    /// Write the repaired document back to PATH. Needs auto-fix, from
    /// --fix or the config file.
    #[arg(long)]
    pub write: bool,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl CheckArgs {
    fn file(&self) -> Option<&Path> {
        self.path.as_deref().filter(|p| *p != Path::new("-"))
    }
}

/// Execute `tmk check`. Output goes to `out` so it can be captured.
pub fn run_check(
    args: &CheckArgs,
    config: &Config,
    registry: &SchemaRegistry,
    out: &mut impl std::io::Write,
) -> Result<u8> {
    let format = args.format.unwrap_or(config.format);
    let auto_fix = args.fix || config.auto_fix;

    if args.write && !auto_fix {
        bail!("--write needs auto-fix; pass --fix or set auto_fix in the config file");
    }
    if args.write && args.file().is_none() {
        bail!("--write needs a file path; stdin cannot be written back");
    }

    let raw_json = match args.file() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let request = Request {
        raw_json,
        detailed: args.detailed || config.detailed,
        show_raw_errors: args.raw || config.raw_errors,
        auto_fix,
    };

    let report = match run(registry, &request) {
        Ok(report) => report,
        Err(PipelineError::Registry(e)) => return Err(e.into()),
        Err(e) => {
            tracing::debug!(error = %e, "request rejected");
            match format {
                OutputFormat::Text => writeln!(out, "Error: {e}")?,
                OutputFormat::Json => writeln!(out, "{}", render_error_json(&e.to_string()))?,
            }
            return Ok(2);
        }
    };

    if args.write {
        if let (Some(path), Some(fixed)) = (args.file(), &report.normalized) {
            let mut text = serde_json::to_string_pretty(fixed)?;
            text.push('\n');
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote repaired document");
        }
    }

    let rendered = match format {
        OutputFormat::Text => render_text(&report)?,
        OutputFormat::Json => render_json(&report)?,
    };
    write!(out, "{rendered}")?;
    if format == OutputFormat::Json {
        writeln!(out)?;
    }

    Ok(if report.valid { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmk_schema::SchemaStore;

    async fn registry() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        registry.initialize(&SchemaStore::Bundled).await.unwrap();
        registry
    }

    fn write_doc(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("doc.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn check(args: &CheckArgs, config: &Config, registry: &SchemaRegistry) -> (u8, String) {
        let mut out = Vec::new();
        let code = run_check(args, config, registry, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn valid_document_exits_zero() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(
            dir.path(),
            r#"{"model":"Task","name":"brew","goal":{"makes":"tea"}}"#,
        );
        let args = CheckArgs {
            path: Some(path),
            detailed: true,
            ..CheckArgs::default()
        };
        let (code, out) = check(&args, &Config::default(), &registry);
        assert_eq!(code, 0);
        assert!(out.starts_with("Results for Task\nStatus: VALID\n"));
        assert!(out.contains("- goal: 2/2 (correct type)"));
    }

    #[tokio::test]
    async fn invalid_document_exits_one() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(dir.path(), r#"{"model":"Task","name":3}"#);
        let args = CheckArgs {
            path: Some(path),
            raw: true,
            ..CheckArgs::default()
        };
        let (code, out) = check(&args, &Config::default(), &registry);
        assert_eq!(code, 1);
        assert!(out.contains("Status: INVALID"));
        assert!(out.contains("\"keyword\": \"required\""));
    }

    #[tokio::test]
    async fn unknown_model_exits_two_with_message() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(dir.path(), r#"{"model":"Widget"}"#);
        let args = CheckArgs {
            path: Some(path),
            format: Some(OutputFormat::Json),
            ..CheckArgs::default()
        };
        let (code, out) = check(&args, &Config::default(), &registry);
        assert_eq!(code, 2);
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert!(value["message"].as_str().unwrap().contains("\"model\" field"));
    }

    #[tokio::test]
    async fn malformed_json_exits_two() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(dir.path(), "{ model: Task }");
        let args = CheckArgs {
            path: Some(path),
            ..CheckArgs::default()
        };
        let (code, out) = check(&args, &Config::default(), &registry);
        assert_eq!(code, 2);
        assert!(out.starts_with("Error: malformed JSON"));
    }

    #[tokio::test]
    async fn fix_and_write_rewrites_the_file() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(
            dir.path(),
            r#"{"MODEL":"task","Name":"brew","GOAL":{"makes":"tea"},"status":"draft"}"#,
        );
        let args = CheckArgs {
            path: Some(path.clone()),
            fix: true,
            write: true,
            ..CheckArgs::default()
        };
        let (code, _) = check(&args, &Config::default(), &registry);
        assert_eq!(code, 0);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!({
                "model": "Task",
                "name": "brew",
                "goal": { "makes": "tea" },
                "status": "Draft"
            })
        );
    }

    #[tokio::test]
    async fn config_supplies_defaults() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(dir.path(), r#"{"Model":"knowledge","name":"k","concepts":[]}"#);
        let config = Config {
            auto_fix: true,
            format: OutputFormat::Json,
            ..Config::default()
        };
        let args = CheckArgs {
            path: Some(path),
            ..CheckArgs::default()
        };
        let (code, out) = check(&args, &config, &registry);
        assert_eq!(code, 0);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["schemaName"], "Knowledge");
        assert_eq!(value["normalized"]["model"], "Knowledge");
    }

    #[tokio::test]
    async fn write_without_path_is_rejected() {
        let registry = registry().await;
        let args = CheckArgs {
            fix: true,
            write: true,
            ..CheckArgs::default()
        };
        let mut out = Vec::new();
        let err = run_check(&args, &Config::default(), &registry, &mut out).unwrap_err();
        assert!(err.to_string().contains("--write"));
    }

    #[tokio::test]
    async fn write_uses_auto_fix_from_config() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(
            dir.path(),
            r#"{"model":"task","NAME":"brew","goal":{"Makes":"tea"}}"#,
        );
        let config = Config {
            auto_fix: true,
            ..Config::default()
        };
        let args = CheckArgs {
            path: Some(path.clone()),
            write: true,
            ..CheckArgs::default()
        };
        let (code, _) = check(&args, &config, &registry);
        assert_eq!(code, 0);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!({ "model": "Task", "name": "brew", "goal": { "makes": "tea" } })
        );
    }

    #[tokio::test]
    async fn write_without_auto_fix_is_rejected() {
        let registry = registry().await;
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"model":"task"}"#;
        let path = write_doc(dir.path(), body);
        let args = CheckArgs {
            path: Some(path.clone()),
            write: true,
            ..CheckArgs::default()
        };
        let mut out = Vec::new();
        let err = run_check(&args, &Config::default(), &registry, &mut out).unwrap_err();
        assert!(err.to_string().contains("auto-fix"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
    }

    #[test]
    fn registry_errors_propagate() {
        let registry = SchemaRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(dir.path(), r#"{"model":"Task"}"#);
        let args = CheckArgs {
            path: Some(path),
            ..CheckArgs::default()
        };
        let mut out = Vec::new();
        let err = run_check(&args, &Config::default(), &registry, &mut out).unwrap_err();
        assert!(err.to_string().contains("not ready"));
    }
}
