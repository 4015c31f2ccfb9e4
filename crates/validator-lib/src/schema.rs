//! Schema lookup by name
//!
//! A missing schema is not an error: it means no constraint is declared for
//! that template kind and the caller accepts the template as is.

use crate::error::ValidatorError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default directory holding `<name>.json` schema files
pub const DEFAULT_SCHEMA_DIR: &str = "schema";

/// Source of JSON schemas, looked up by name on every validation
pub trait SchemaStore: Send + Sync {
    /// Load the named schema, or `None` when no such schema exists
    fn load(&self, name: &str) -> Result<Option<Value>, ValidatorError>;
}

/// Schemas stored as `<root>/<name>.json`
#[derive(Debug, Clone)]
pub struct DirSchemaStore {
    root: PathBuf,
}

impl Default for DirSchemaStore {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_DIR)
    }
}

impl DirSchemaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a schema name
    ///
    /// Names must stay inside the schema directory: empty names, path
    /// separators and dot-segments are rejected.
    pub fn schema_path(&self, name: &str) -> Result<PathBuf, ValidatorError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if invalid {
            return Err(ValidatorError::InvalidSchemaName(name.to_string()));
        }

        Ok(self.root.join(format!("{name}.json")))
    }
}

impl SchemaStore for DirSchemaStore {
    fn load(&self, name: &str) -> Result<Option<Value>, ValidatorError> {
        let path = self.schema_path(name)?;
        if !path.is_file() {
            debug!(schema = %name, path = %path.display(), "Schema file not found");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ValidatorError::SchemaRead {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;

        let schema = serde_json::from_str(&content).map_err(|source| ValidatorError::SchemaParse {
            name: name.to_string(),
            source,
        })?;

        debug!(schema = %name, path = %path.display(), "Loaded schema");
        Ok(Some(schema))
    }
}

/// Schemas held in memory, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaStore {
    schemas: HashMap<String, Value>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema, builder style
    pub fn with_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.insert(name, schema);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: Value) {
        self.schemas.insert(name.into(), schema);
    }
}

impl SchemaStore for InMemorySchemaStore {
    fn load(&self, name: &str) -> Result<Option<Value>, ValidatorError> {
        Ok(self.schemas.get(name).cloned())
    }
}

impl<S: SchemaStore + ?Sized> SchemaStore for std::sync::Arc<S> {
    fn load(&self, name: &str) -> Result<Option<Value>, ValidatorError> {
        (**self).load(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_schema_is_none() {
        let dir = TempDir::new().unwrap();
        let store = DirSchemaStore::new(dir.path());
        assert!(store.load("reference-chart_4-11-0").unwrap().is_none());
    }

    #[test]
    fn test_loads_schema_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("rollout.json"),
            r#"{ "type": "object", "required": ["resources"] }"#,
        )
        .unwrap();

        let store = DirSchemaStore::new(dir.path());
        let schema = store.load("rollout").unwrap().unwrap();
        assert_eq!(schema["required"], json!(["resources"]));
    }

    #[test]
    fn test_malformed_schema_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let store = DirSchemaStore::new(dir.path());
        let err = store.load("broken").unwrap_err();
        assert!(matches!(err, ValidatorError::SchemaParse { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_schema_names_cannot_escape_root() {
        let store = DirSchemaStore::default();
        assert_eq!(store.root(), Path::new(DEFAULT_SCHEMA_DIR));
        for name in ["", ".", "..", "../secrets", "nested/schema", "a\\b"] {
            assert!(
                matches!(store.load(name), Err(ValidatorError::InvalidSchemaName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemorySchemaStore::new().with_schema("deployment", json!({ "type": "object" }));
        assert_eq!(store.load("deployment").unwrap(), Some(json!({ "type": "object" })));
        assert!(store.load("statefulset").unwrap().is_none());
    }
}
