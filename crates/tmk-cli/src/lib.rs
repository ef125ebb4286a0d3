//! # tmk-cli — TMK Document Checker
//!
//! Command-line front end for `tmk-schema`: reads a Task, Method, or
//! Knowledge document, optionally repairs its casing, validates it and
//! prints the partial-credit score.
//!
//! ## Subcommands
//!
//! - `check` — Validate, score, and optionally repair one document
//! - `schemas` — List the loaded models and their fields
//!
//! Argument parsing lives here; all checking logic is in `tmk-schema`.

pub mod check;
pub mod config;
pub mod render;
pub mod schemas;
