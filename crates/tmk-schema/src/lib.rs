//! # tmk-schema — TMK Document Validation
//!
//! Validates Task, Method, and Knowledge JSON documents against their
//! schemas and grades them with partial credit instead of pass/fail.
//!
//! ## Pipeline
//!
//! ```text
//! raw JSON ─▶ normalize (optional) ─▶ conformance check ─▶ field scoring ─▶ Report
//! ```
//!
//! - [`normalize`](mod@normalize) repairs sloppy casing of keys and enum values against
//!   the schema's canonical spelling.
//! - [`conformance`] compiles schemas with the `jsonschema` crate and
//!   reports structured [`Violation`]s.
//! - [`score`](mod@score) awards 0, 1, or 2 points per declared field.
//! - [`registry`] loads and compiles every model once, behind an explicit
//!   `Uninitialized → Loading → Ready | Failed` state machine.
//! - [`pipeline`] ties the steps together for one raw request.
//!
//! ## Crate Policy
//!
//! - Only malformed input, an unresolvable `model`, and key collisions are
//!   errors. Invalid documents and malformed fields are reported as data.
//! - No I/O outside [`store`]; everything else is a pure function of its
//!   inputs.

pub mod conformance;
pub mod error;
pub mod model;
pub mod node;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod score;
pub mod store;

pub use conformance::{Checker, Violation};
pub use error::SchemaError;
pub use model::{selector_schema, ModelName, UnknownModelName};
pub use node::{NodeType, Property, SchemaNode};
pub use normalize::{normalize, normalize_value, NormalizeError};
pub use pipeline::{run, PipelineError, Report, Request};
pub use registry::{
    CompiledModel, RegistryError, RegistryState, SchemaRegistry, ValidationOutcome,
};
pub use score::{score, score_with_singletons, FieldReason, FieldScore, ScoreReport, FIELD_MAX};
pub use store::SchemaStore;
