//! # Schema Errors
//!
//! Failures that occur while loading or compiling schema documents. These
//! are operational errors: they are raised while the registry initializes
//! and never while a document is being scored.

use thiserror::Error;

/// Errors raised while reading or compiling a schema document.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema document could not be read from the store.
    #[error("failed to load schema {name}: {reason}")]
    Load {
        /// Schema file name or identifier.
        name: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The schema document is not valid JSON.
    #[error("schema {name} is not valid JSON: {source}")]
    Parse {
        /// Schema file name or identifier.
        name: String,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The schema could not be compiled into a checker.
    #[error("failed to compile schema {name}: {reason}")]
    Compile {
        /// Schema file name or identifier.
        name: String,
        /// Human-readable reason reported by the compiler.
        reason: String,
    },
}
