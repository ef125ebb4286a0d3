//! # Report Rendering
//!
//! Turns a pipeline [`Report`] into text or JSON for stdout.

use std::fmt::Write as _;

use anyhow::Result;
use serde_json::json;

use tmk_schema::Report;

/// Human-readable report.
///
/// ```text
/// Results for Task
/// Status: INVALID
/// [ ...raw errors, when present... ]
/// Score: 3 / 4
/// - model: 1/2 (type: 42 is not of type "string")
/// - steps: 2/2 (vacuously correct)
/// ```
pub fn render_text(report: &Report) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Results for {}", report.schema_name)?;
    writeln!(
        out,
        "Status: {}",
        if report.valid { "VALID" } else { "INVALID" }
    )?;

    if let Some(errors) = &report.errors {
        writeln!(out, "{}", serde_json::to_string_pretty(errors)?)?;
    }

    writeln!(out, "Score: {} / {}", report.score, report.max)?;

    if let Some(fields) = &report.fields {
        for field in fields {
            writeln!(
                out,
                "- {}: {}/{} ({})",
                field.field, field.score, field.max, field.reason
            )?;
        }
    }

    Ok(out)
}

/// The report as pretty-printed JSON.
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// A request-level error as the structured `{"message": ...}` object.
pub fn render_error_json(message: &str) -> String {
    json!({ "message": message }).to_string()
}
