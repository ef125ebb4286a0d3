//! # Schema Store
//!
//! Where schema documents come from. The three TMK schemas ship inside the
//! binary; a directory of `<Model>.schema.json` files can replace them.

use std::path::PathBuf;

use serde_json::Value;

use crate::error::SchemaError;
use crate::model::ModelName;

const BUNDLED_TASK: &str = include_str!("../../../schemas/Task.schema.json");
const BUNDLED_METHOD: &str = include_str!("../../../schemas/Method.schema.json");
const BUNDLED_KNOWLEDGE: &str = include_str!("../../../schemas/Knowledge.schema.json");

/// Source of schema documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchemaStore {
    /// Schemas compiled into the binary.
    #[default]
    Bundled,
    /// A directory holding `Task.schema.json`, `Method.schema.json`, and
    /// `Knowledge.schema.json`.
    Directory(PathBuf),
}

impl SchemaStore {
    /// Read and parse the schema for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Load`] if the file cannot be read and
    /// [`SchemaError::Parse`] if it is not JSON.
    pub async fn fetch(&self, model: ModelName) -> Result<Value, SchemaError> {
        let name = model.file_name();
        let text = match self {
            Self::Bundled => bundled_text(model).to_string(),
            Self::Directory(dir) => {
                let path = dir.join(&name);
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| SchemaError::Load {
                        name: path.display().to_string(),
                        reason: e.to_string(),
                    })?
            }
        };
        serde_json::from_str(&text).map_err(|source| SchemaError::Parse { name, source })
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Bundled => "bundled".to_string(),
            Self::Directory(dir) => dir.display().to_string(),
        }
    }
}

fn bundled_text(model: ModelName) -> &'static str {
    match model {
        ModelName::Task => BUNDLED_TASK,
        ModelName::Method => BUNDLED_METHOD,
        ModelName::Knowledge => BUNDLED_KNOWLEDGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bundled_schemas_parse_and_declare_model() {
        for model in ModelName::ALL {
            let schema = SchemaStore::Bundled.fetch(model).await.unwrap();
            assert_eq!(schema["title"], model.as_str());
            assert_eq!(
                schema["properties"]["model"]["enum"],
                serde_json::json!([model.as_str()])
            );
        }
    }

    #[tokio::test]
    async fn directory_store_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Task.schema.json"), r#"{"type":"object"}"#).unwrap();
        let store = SchemaStore::Directory(dir.path().to_path_buf());

        let schema = store.fetch(ModelName::Task).await.unwrap();
        assert_eq!(schema, serde_json::json!({ "type": "object" }));

        let err = store.fetch(ModelName::Method).await.unwrap_err();
        assert!(matches!(err, SchemaError::Load { .. }), "got {err}");
    }

    #[tokio::test]
    async fn directory_store_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Knowledge.schema.json"), "{ nope").unwrap();
        let store = SchemaStore::Directory(dir.path().to_path_buf());
        let err = store.fetch(ModelName::Knowledge).await.unwrap_err();
        assert!(matches!(err, SchemaError::Parse { ref name, .. } if name == "Knowledge.schema.json"));
    }
}
