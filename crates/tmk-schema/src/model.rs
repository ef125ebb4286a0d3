//! # Model Names
//!
//! The fixed set of TMK models. A document selects its schema through a
//! top-level `model` field whose value must be one of these names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One of the three TMK models, each governed by its own schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelName {
    /// Goals, with their inputs, outputs, and candidate methods.
    Task,
    /// State machines that decompose a task.
    Method,
    /// Concepts and relations the other models reason over.
    Knowledge,
}

impl ModelName {
    /// Every model, in registry load order.
    pub const ALL: [ModelName; 3] = [ModelName::Task, ModelName::Method, ModelName::Knowledge];

    /// The canonical spelling used in documents and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Method => "Method",
            Self::Knowledge => "Knowledge",
        }
    }

    /// File name of the schema document, e.g. `Task.schema.json`.
    pub fn file_name(&self) -> String {
        format!("{}.schema.json", self.as_str())
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not exactly one of the known model names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModelName(pub String);

impl fmt::Display for UnknownModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model name: {}", self.0)
    }
}

impl std::error::Error for UnknownModelName {}

impl FromStr for ModelName {
    type Err = UnknownModelName;

    // Exact match only. Casing repair belongs to the normalizer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownModelName(s.to_string()))
    }
}

/// Schema used to repair the `model` field before the governing schema is
/// known.
///
/// Only `model` is declared, so every other key passes through untouched.
pub fn selector_schema() -> Value {
    let names: Vec<&str> = ModelName::ALL.iter().map(|m| m.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "model": { "type": "string", "enum": names }
        }
    })
}
