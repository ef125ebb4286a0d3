//! # Validation Pipeline
//!
//! End-to-end processing of one raw JSON document:
//!
//! ```text
//! raw text → parse → (auto-fix: repair `model`, resolve, repair document)
//!          → resolve model → validate → score → Report
//! ```
//!
//! Unparseable input and an unresolvable `model` are errors. Everything
//! else, including an invalid document, is data in the [`Report`].

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::conformance::Violation;
use crate::model::{selector_schema, ModelName};
use crate::node::SchemaNode;
use crate::normalize::{normalize, NormalizeError};
use crate::registry::{RegistryError, SchemaRegistry};
use crate::score::FieldScore;

/// One validation request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// The document as typed by the user.
    pub raw_json: String,
    /// Include the per-field score breakdown.
    pub detailed: bool,
    /// Include the checker's violations when the document is invalid.
    pub show_raw_errors: bool,
    /// Repair key and enum casing before validating.
    pub auto_fix: bool,
}

/// Result of a processed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Model whose schema governed the document.
    pub schema_name: ModelName,
    /// Whether the document conforms to the schema.
    pub valid: bool,
    /// Violations, when invalid and requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Violation>>,
    /// Points awarded.
    pub score: u32,
    /// Points available.
    pub max: u32,
    /// Per-field breakdown, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldScore>>,
    /// The repaired document, when auto-fix ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Value>,
}

/// Reasons a request could not be processed.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input is not JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The input is JSON but not an object.
    #[error("document must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found.
        found: &'static str,
    },

    /// `model` is missing or does not name a known schema.
    #[error("Invalid or missing \"model\" field. Must be Task, Method, or Knowledge.")]
    UnknownModel {
        /// The `model` value as found, rendered as JSON. `None` when absent.
        found: Option<String>,
    },

    /// Auto-fix found two keys resolving to the same property.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// The registry is not ready.
    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for PipelineError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownModel(name) => Self::UnknownModel {
                found: Some(Value::String(name).to_string()),
            },
            other => Self::Registry(other),
        }
    }
}

/// Process `request` against the models in `registry`.
///
/// # Errors
///
/// See [`PipelineError`]. A failure affects only this request.
pub fn run(registry: &SchemaRegistry, request: &Request) -> Result<Report, PipelineError> {
    registry.ensure_ready()?;

    let parsed: Value =
        serde_json::from_str(&request.raw_json).map_err(PipelineError::MalformedJson)?;
    let mut data = match parsed {
        Value::Object(map) => map,
        other => {
            return Err(PipelineError::NotAnObject {
                found: json_type(&other),
            })
        }
    };

    if request.auto_fix {
        data = normalize(&data, &SchemaNode::parse(&selector_schema()))?;
    }

    let model = registry.resolve(model_field(&data)?)?;

    let normalized = if request.auto_fix {
        data = model.normalize(&data)?;
        Some(Value::Object(data.clone()))
    } else {
        None
    };

    let outcome = model.validate(&Value::Object(data.clone()));
    let score = model.score(&data, request.detailed);

    tracing::info!(
        model = %model.name(),
        valid = outcome.valid,
        score = score.score,
        max = score.max,
        "validated document"
    );

    Ok(Report {
        schema_name: model.name(),
        valid: outcome.valid,
        errors: if request.show_raw_errors {
            outcome.errors
        } else {
            None
        },
        score: score.score,
        max: score.max,
        fields: score.fields,
        normalized,
    })
}

fn model_field(data: &Map<String, Value>) -> Result<&str, PipelineError> {
    match data.get("model") {
        Some(Value::String(name)) => Ok(name),
        Some(other) => Err(PipelineError::UnknownModel {
            found: Some(other.to_string()),
        }),
        None => Err(PipelineError::UnknownModel { found: None }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
