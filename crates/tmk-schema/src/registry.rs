//! # Compiled Schema Registry
//!
//! Holds one compiled checker per model. The registry is written exactly
//! once, by [`SchemaRegistry::initialize`], and is read-only afterwards.
//!
//! ## State machine
//!
//! ```text
//! Uninitialized ──initialize──▶ Loading ──▶ Ready
//!                                  │
//!                                  └──────▶ Failed ──initialize──▶ Loading
//! ```
//!
//! Every accessor fails fast with [`RegistryError::NotReady`] unless the
//! registry is `Ready`; no caller ever observes a partially loaded set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::conformance::{Checker, Violation};
use crate::error::SchemaError;
use crate::model::ModelName;
use crate::node::SchemaNode;
use crate::normalize::{normalize, NormalizeError};
use crate::score::{score, ScoreReport};
use crate::store::SchemaStore;

/// Observable lifecycle state of a [`SchemaRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// `initialize` has not been called.
    Uninitialized,
    /// Schemas are being fetched and compiled.
    Loading,
    /// Every model is compiled and available.
    Ready,
    /// The last `initialize` failed. It may be retried.
    Failed,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Errors returned by registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// An accessor was called before initialization completed.
    #[error("schema registry is not ready (state: {state})")]
    NotReady {
        /// State at the time of the call.
        state: RegistryState,
    },

    /// `initialize` was called while loading or after success.
    #[error("schema registry cannot be initialized while {state}")]
    AlreadyInitialized {
        /// State at the time of the call.
        state: RegistryState,
    },

    /// The requested name is not one of the known models.
    #[error("Unknown schema: {0}")]
    UnknownModel(String),

    /// A schema failed to load or compile during initialization.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Outcome of validating a whole document against a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// Whether the document conforms.
    pub valid: bool,
    /// Every violation, in checker order. `None` when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Violation>>,
}

/// A model's schema together with its compiled checker.
#[derive(Debug)]
pub struct CompiledModel {
    name: ModelName,
    schema: Value,
    node: SchemaNode,
    checker: Checker,
}

impl CompiledModel {
    /// Compile `schema` as the schema for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if the schema is invalid.
    pub fn compile(name: ModelName, schema: Value) -> Result<Self, SchemaError> {
        let checker = Checker::compile(name.file_name(), &schema)?;
        let node = SchemaNode::parse(&schema);
        Ok(Self {
            name,
            schema,
            node,
            checker,
        })
    }

    /// Which model this is.
    pub fn name(&self) -> ModelName {
        self.name
    }

    /// The schema document as loaded.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Structural view of the schema.
    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// Repair key and enum casing in `data`.
    ///
    /// # Errors
    ///
    /// See [`normalize`].
    pub fn normalize(&self, data: &Map<String, Value>) -> Result<Map<String, Value>, NormalizeError> {
        normalize(data, &self.node)
    }

    /// Check `data` against the full schema, collecting every violation.
    pub fn validate(&self, data: &Value) -> ValidationOutcome {
        let violations = self.checker.check(data);
        if violations.is_empty() {
            ValidationOutcome {
                valid: true,
                errors: None,
            }
        } else {
            ValidationOutcome {
                valid: false,
                errors: Some(violations),
            }
        }
    }

    /// Partial-credit score for `data`.
    pub fn score(&self, data: &Map<String, Value>, detailed: bool) -> ScoreReport {
        score(data, &self.node, &self.checker, detailed)
    }
}

type Models = BTreeMap<ModelName, Arc<CompiledModel>>;

enum Phase {
    Uninitialized,
    Loading,
    Ready(Arc<Models>),
    Failed(String),
}

impl Phase {
    fn state(&self) -> RegistryState {
        match self {
            Self::Uninitialized => RegistryState::Uninitialized,
            Self::Loading => RegistryState::Loading,
            Self::Ready(_) => RegistryState::Ready,
            Self::Failed(_) => RegistryState::Failed,
        }
    }
}

/// Write-once registry of compiled models.
pub struct SchemaRegistry {
    phase: RwLock<Phase>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("state", &self.state())
            .finish()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Create an uninitialized registry.
    pub fn new() -> Self {
        Self {
            phase: RwLock::new(Phase::Uninitialized),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RegistryState {
        self.phase.read().state()
    }

    /// Reason for the last failed initialization, if the registry is `Failed`.
    pub fn failure(&self) -> Option<String> {
        match &*self.phase.read() {
            Phase::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Fetch and compile every model from `store`.
    ///
    /// Allowed from `Uninitialized` or `Failed`. Either every model is
    /// compiled and the registry becomes `Ready`, or it becomes `Failed`
    /// and nothing is published.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyInitialized`] if called while
    /// `Loading` or `Ready`, and [`RegistryError::Schema`] if a schema
    /// cannot be loaded or compiled.
    pub async fn initialize(&self, store: &SchemaStore) -> Result<(), RegistryError> {
        {
            let mut phase = self.phase.write();
            let state = phase.state();
            if !matches!(state, RegistryState::Uninitialized | RegistryState::Failed) {
                return Err(RegistryError::AlreadyInitialized { state });
            }
            *phase = Phase::Loading;
        }

        let _reset = CancelledLoad(&self.phase);
        tracing::debug!(store = %store.describe(), "loading schemas");
        let loaded = load_models(store).await;

        let mut phase = self.phase.write();
        match loaded {
            Ok(models) => {
                tracing::info!(
                    store = %store.describe(),
                    models = models.len(),
                    "schema registry ready"
                );
                *phase = Phase::Ready(Arc::new(models));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(store = %store.describe(), error = %e, "schema registry failed to load");
                *phase = Phase::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    fn ready(&self) -> Result<Arc<Models>, RegistryError> {
        match &*self.phase.read() {
            Phase::Ready(models) => Ok(Arc::clone(models)),
            other => Err(RegistryError::NotReady {
                state: other.state(),
            }),
        }
    }

    /// Fail fast unless the registry is `Ready`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotReady`] otherwise.
    pub fn ensure_ready(&self) -> Result<(), RegistryError> {
        self.ready().map(|_| ())
    }

    /// Every compiled model, in [`ModelName::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotReady`] unless `Ready`.
    pub fn models(&self) -> Result<Vec<Arc<CompiledModel>>, RegistryError> {
        Ok(self.ready()?.values().cloned().collect())
    }

    /// The compiled model for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotReady`] unless `Ready`.
    pub fn model(&self, name: ModelName) -> Result<Arc<CompiledModel>, RegistryError> {
        let models = self.ready()?;
        models
            .get(&name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownModel(name.to_string()))
    }

    /// Resolve a model by its exact name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotReady`] unless `Ready`, then
    /// [`RegistryError::UnknownModel`] if `name` is not a known model.
    pub fn resolve(&self, name: &str) -> Result<Arc<CompiledModel>, RegistryError> {
        let models = self.ready()?;
        let model: ModelName = name
            .parse()
            .map_err(|_| RegistryError::UnknownModel(name.to_string()))?;
        models
            .get(&model)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownModel(name.to_string()))
    }

    /// Validate `data` against the schema named `name`.
    ///
    /// An invalid document is a successful return with `valid == false`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotReady`] or [`RegistryError::UnknownModel`].
    pub fn validate(&self, data: &Value, name: &str) -> Result<ValidationOutcome, RegistryError> {
        Ok(self.resolve(name)?.validate(data))
    }
}

/// Moves a registry left in `Loading` to `Failed` when the initializing
/// future is dropped before it publishes a result.
struct CancelledLoad<'a>(&'a RwLock<Phase>);

impl Drop for CancelledLoad<'_> {
    fn drop(&mut self) {
        let mut phase = self.0.write();
        if matches!(*phase, Phase::Loading) {
            tracing::warn!("schema loading was cancelled");
            *phase = Phase::Failed("schema loading was cancelled".to_string());
        }
    }
}

async fn load_models(store: &SchemaStore) -> Result<Models, SchemaError> {
    let mut models = Models::new();
    for name in ModelName::ALL {
        let schema = store.fetch(name).await?;
        let compiled = CompiledModel::compile(name, schema)?;
        tracing::debug!(
            model = %name,
            fields = compiled.node().properties().len(),
            "compiled schema"
        );
        models.insert(name, Arc::new(compiled));
    }
    Ok(models)
}
