//! # Configuration
//!
//! Optional YAML file supplying defaults for the `check` flags and the
//! schema location. Flags given on the command line always win.
//!
//! ```yaml
//! schema_dir: ./schemas
//! detailed: true
//! raw_errors: false
//! auto_fix: true
//! format: json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use tmk_schema::SchemaStore;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable report.
    #[default]
    Text,
    /// One JSON object per run.
    Json,
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory with `<Model>.schema.json` files. Relative paths are
    /// resolved against the config file's directory. Bundled schemas are
    /// used when unset.
    pub schema_dir: Option<PathBuf>,
    /// Default for `--detailed`.
    pub detailed: bool,
    /// Default for `--raw`.
    pub raw_errors: bool,
    /// Default for `--fix`.
    pub auto_fix: bool,
    /// Default for `--format`.
    pub format: OutputFormat,
}

impl Config {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        if let Some(dir) = config.schema_dir.as_mut() {
            if dir.is_relative() {
                if let Some(base) = path.parent() {
                    *dir = base.join(&*dir);
                }
            }
        }

        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Where schemas come from. `override_dir` (from `--schema-dir`) takes
    /// precedence over the config file.
    pub fn store(&self, override_dir: Option<&Path>) -> SchemaStore {
        match override_dir.or(self.schema_dir.as_deref()) {
            Some(dir) => SchemaStore::Directory(dir.to_path_buf()),
            None => SchemaStore::Bundled,
        }
    }
}
