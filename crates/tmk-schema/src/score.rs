//! # Field Scoring
//!
//! Grades a document field by field instead of pass/fail. Each declared
//! property is worth [`FIELD_MAX`] points:
//!
//! | Field state                        | Points |
//! |------------------------------------|--------|
//! | absent and required                | 0      |
//! | present but failing its schema     | 1      |
//! | present and valid                  | 2      |
//! | absent and optional                | 2      |
//!
//! A field is judged only against its own `properties` entry: a violation
//! counts if it sits at or below the field's JSON Pointer and was raised by
//! a keyword under `/properties/<field>`. Root-level `allOf`,
//! `patternProperties` and the like never cost a field its points.
//!
//! [`score`] runs an already-compiled checker for the whole schema once and
//! partitions its violations by field. [`score_with_singletons`] compiles
//! a one-property schema per field instead, for schemas that have not been
//! compiled ahead of time.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::conformance::{pointer_segment, Checker, Violation};
use crate::error::SchemaError;
use crate::node::SchemaNode;

/// Points available per declared field.
pub const FIELD_MAX: u8 = 2;

/// Why a field received its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReason {
    /// Absent and listed in `required`.
    MissingRequired,
    /// Absent and optional.
    VacuouslyCorrect,
    /// Present and valid.
    CorrectType,
    /// Present, with the first violation reported for it.
    Malformed {
        /// Rule violated.
        keyword: String,
        /// Checker message.
        message: String,
    },
    /// Present and invalid, but no violation could be attributed to it.
    ValidationFailed,
}

impl FieldReason {
    fn from_violation(v: &Violation) -> Self {
        Self::Malformed {
            keyword: v.keyword.clone(),
            message: v.message.clone(),
        }
    }
}

impl fmt::Display for FieldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired => f.write_str("missing required field"),
            Self::VacuouslyCorrect => f.write_str("vacuously correct"),
            Self::CorrectType => f.write_str("correct type"),
            Self::Malformed { keyword, message } => write!(f, "{keyword}: {message}"),
            Self::ValidationFailed => f.write_str("validation failed"),
        }
    }
}

impl Serialize for FieldReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Score for one declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldScore {
    /// Declared property name.
    pub field: String,
    /// Points awarded: 0, 1, or 2.
    pub score: u8,
    /// Always [`FIELD_MAX`].
    pub max: u8,
    /// Explanation of the award.
    pub reason: FieldReason,
}

/// Aggregate score for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    /// Sum of field scores.
    pub score: u32,
    /// `FIELD_MAX` times the number of declared properties.
    pub max: u32,
    /// Per-field breakdown in schema property order. Only present in
    /// detailed mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldScore>>,
}

impl ScoreReport {
    /// Score as a percentage of `max`. A schema with no properties scores 100.
    pub fn percent(&self) -> f64 {
        if self.max == 0 {
            100.0
        } else {
            f64::from(self.score) * 100.0 / f64::from(self.max)
        }
    }

    /// Look up one field's breakdown. `None` outside detailed mode.
    pub fn field(&self, name: &str) -> Option<&FieldScore> {
        self.fields.as_ref()?.iter().find(|f| f.field == name)
    }

    /// Whether every point was awarded.
    pub fn is_perfect(&self) -> bool {
        self.score == self.max
    }
}

/// Score `data` against `schema`, using `checker` compiled from the same
/// schema's JSON.
pub fn score(
    data: &Map<String, Value>,
    schema: &SchemaNode,
    checker: &Checker,
    detailed: bool,
) -> ScoreReport {
    let violations = checker.check(&Value::Object(data.clone()));
    let result: Result<ScoreReport, std::convert::Infallible> =
        tally(data, schema, detailed, |field, _, _| {
            let pointer = format!("/{}", pointer_segment(field));
            let origin = format!("/properties{pointer}");
            Ok(violations
                .iter()
                .find(|v| v.is_under(&pointer) && v.is_from(&origin))
                .map(FieldReason::from_violation))
        });
    match result {
        Ok(report) => report,
        Err(never) => match never {},
    }
}

/// Score `data` against `root` by compiling a one-property schema per
/// present field.
///
/// The root's `$defs` and `definitions` are carried into each per-field
/// schema so local references still resolve.
///
/// # Errors
///
/// Returns [`SchemaError::Compile`] if a per-field schema cannot be
/// compiled.
pub fn score_with_singletons(
    data: &Map<String, Value>,
    root: &Value,
    detailed: bool,
) -> Result<ScoreReport, SchemaError> {
    let schema = SchemaNode::parse(root);
    tally(data, &schema, detailed, |field, def, value| {
        let required: Vec<&str> = if schema.is_required(field) {
            vec![field]
        } else {
            Vec::new()
        };
        let mut singleton = json!({
            "type": "object",
            "properties": { field: def.raw() },
            "required": required,
        });
        for key in ["$defs", "definitions"] {
            if let Some(defs) = root.get(key) {
                singleton[key] = defs.clone();
            }
        }

        let checker = Checker::compile(format!("field {field}"), &singleton)?;
        let mut instance = Map::new();
        instance.insert(field.to_string(), value.clone());
        let instance = Value::Object(instance);

        if checker.is_valid(&instance) {
            return Ok(None);
        }
        let pointer = format!("/{}", pointer_segment(field));
        let reason = checker
            .check(&instance)
            .iter()
            .find(|v| v.instance_path.is_empty() || v.is_under(&pointer))
            .map_or(FieldReason::ValidationFailed, FieldReason::from_violation);
        Ok(Some(reason))
    })
}

/// Walk the declared fields and award points. `judge` is called only for
/// present fields and returns `None` when the value conforms or the reason
/// when it does not.
fn tally<E>(
    data: &Map<String, Value>,
    schema: &SchemaNode,
    detailed: bool,
    mut judge: impl FnMut(&str, &SchemaNode, &Value) -> Result<Option<FieldReason>, E>,
) -> Result<ScoreReport, E> {
    let mut score: u32 = 0;
    let mut max: u32 = 0;
    let mut fields = Vec::new();

    for property in schema.properties() {
        let field = property.name();
        max += u32::from(FIELD_MAX);

        let (points, reason) = match data.get(field) {
            None if schema.is_required(field) => (0, FieldReason::MissingRequired),
            None => (FIELD_MAX, FieldReason::VacuouslyCorrect),
            Some(value) => match judge(field, property.node(), value)? {
                None => (FIELD_MAX, FieldReason::CorrectType),
                Some(reason) => (1, reason),
            },
        };

        tracing::debug!(field, points, %reason, "scored field");
        score += u32::from(points);
        if detailed {
            fields.push(FieldScore {
                field: field.to_string(),
                score: points,
                max: FIELD_MAX,
                reason,
            });
        }
    }

    Ok(ScoreReport {
        score,
        max,
        fields: detailed.then_some(fields),
    })
}
