//! # Schema Conformance
//!
//! Thin adapter over the `jsonschema` crate. A [`Checker`] is compiled once
//! per schema and reports every violation (not just the first) as a
//! structured [`Violation`] record.
//!
//! Schemas are compiled against Draft 2020-12 with format assertions on.
//! Unknown keywords are ignored rather than rejected, so hand-written TMK
//! schemas with annotations the draft does not define still compile.

use std::fmt;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// A single violation reported by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON Pointer to the offending value in the instance. Empty for the root.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// The rule violated, e.g. `type`, `enum`, `required`.
    pub keyword: String,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    /// Whether this violation concerns the value at `pointer` or anything
    /// below it.
    pub fn is_under(&self, pointer: &str) -> bool {
        pointer_starts_with(&self.instance_path, pointer)
    }

    /// Whether the failing keyword sits at or below `schema_pointer`.
    /// `$ref` hops at the schema root are skipped, so `/$ref/properties/a`
    /// is from `/properties/a`.
    pub fn is_from(&self, schema_pointer: &str) -> bool {
        let mut path = self.schema_path.as_str();
        while let Some(rest) = path.strip_prefix("/$ref") {
            if !(rest.is_empty() || rest.starts_with('/')) {
                break;
            }
            path = rest;
        }
        pointer_starts_with(path, schema_pointer)
    }
}

fn pointer_starts_with(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}: {}", self.keyword, self.message)
        } else {
            write!(f, "{}: {}: {}", self.instance_path, self.keyword, self.message)
        }
    }
}

/// A compiled schema.
pub struct Checker {
    name: String,
    validator: Validator,
}

impl fmt::Debug for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checker").field("name", &self.name).finish()
    }
}

impl Checker {
    /// Compile `schema` into a checker. `name` only labels errors and logs.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if the schema itself is invalid.
    pub fn compile(name: impl Into<String>, schema: &Value) -> Result<Self, SchemaError> {
        let name = name.into();
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .should_validate_formats(true)
            .build(schema)
            .map_err(|e| SchemaError::Compile {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { name, validator })
    }

    /// Label given at compile time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `instance` satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every violation in `instance`, in the order the validator reports
    /// them. Empty when the instance is valid.
    pub fn check(&self, instance: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|e| {
                let schema_path = e.schema_path.to_string();
                Violation {
                    instance_path: e.instance_path.to_string(),
                    keyword: keyword_of(&schema_path),
                    schema_path,
                    message: e.to_string(),
                }
            })
            .collect()
    }
}

/// Keywords whose next schema path segment is a property name, pattern, or
/// array index rather than another keyword.
const NAMED_CHILDREN: &[&str] = &[
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
    "dependentRequired",
    "dependencies",
    "allOf",
    "anyOf",
    "oneOf",
    "prefixItems",
];

/// The last keyword on the schema path. A path that ends on a subschema
/// name or index means that subschema is `false`.
fn keyword_of(schema_path: &str) -> String {
    let mut keyword: Option<String> = None;
    let mut after_keyword = false;
    let mut ends_on_name = true;

    for raw in schema_path.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        let is_name = after_keyword
            && match keyword.as_deref() {
                Some(k) if NAMED_CHILDREN.contains(&k) => true,
                // Draft 7 tuple form: `items/0`.
                Some("items") => segment.parse::<usize>().is_ok(),
                _ => false,
            };
        if !is_name {
            keyword = Some(segment);
        }
        after_keyword = !is_name;
        ends_on_name = is_name;
    }

    match keyword {
        Some(k) if !ends_on_name => k,
        Some(k) if k == "dependentRequired" => k,
        _ => "false".to_string(),
    }
}

/// Escape a property name as a single JSON Pointer segment.
pub fn pointer_segment(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}
