//! Collection definition and query template loading.
//!
//! Both accept a single `.json` file or a directory whose `.json` files are
//! loaded in name order. Definition files hold one definition or a list of
//! them. Query files hold a list of templates written in MongoDB extended
//! JSON, so `{"$oid": ...}` and `{"$date": ...}` values keep their BSON type.

use bson::Bson;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};
use workload_engine::QueryTemplate;
use workload_types::{CollectionDefinition, SchemaError};

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Provided path is not a JSON file: {0}")]
    NotJson(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid collection definition in {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("Invalid query file {path}: {message}")]
    Query { path: PathBuf, message: String },

    #[error("No collection definitions found in {0}")]
    Empty(PathBuf),
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// `.json` files at `path`, sorted by name when `path` is a directory.
pub fn json_files(path: &Path) -> Result<Vec<PathBuf>, DefinitionError> {
    if !path.exists() {
        return Err(DefinitionError::NotFound(path.to_path_buf()));
    }
    if path.is_file() {
        if !is_json(path) {
            return Err(DefinitionError::NotJson(path.to_path_buf()));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let io_error = |source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io_error)? {
        let entry_path = entry.map_err(io_error)?.path();
        if entry_path.is_file() && is_json(&entry_path) {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

fn read(path: &Path) -> Result<String, DefinitionError> {
    std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every collection definition at `path`.
///
/// Any unreadable or invalid file fails the whole load.
pub fn load_definitions(path: &Path) -> Result<Vec<CollectionDefinition>, DefinitionError> {
    let mut definitions = Vec::new();
    for file in json_files(path)? {
        let defs = CollectionDefinition::list_from_json(&read(&file)?).map_err(|source| {
            DefinitionError::Schema {
                path: file.clone(),
                source,
            }
        })?;
        info!("Loaded {} collection definition(s) from {}", defs.len(), file.display());
        definitions.extend(defs);
    }

    if definitions.is_empty() {
        return Err(DefinitionError::Empty(path.to_path_buf()));
    }
    Ok(definitions)
}

/// Parse one query file into templates.
pub fn parse_query_file(path: &Path, json: &str) -> Result<Vec<QueryTemplate>, DefinitionError> {
    let query_error = |message: String| DefinitionError::Query {
        path: path.to_path_buf(),
        message,
    };

    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| query_error(e.to_string()))?;
    let serde_json::Value::Array(entries) = value else {
        return Err(query_error("content is not a JSON list".to_string()));
    };

    let mut templates = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match Bson::try_from(entry) {
            Ok(Bson::Document(doc)) => templates.push(QueryTemplate::from_document(&doc)),
            Ok(other) => warn!(
                "Skipping query #{i} in {}: expected an object, got {other}",
                path.display()
            ),
            Err(e) => warn!("Skipping query #{i} in {}: {e}", path.display()),
        }
    }
    Ok(templates)
}

/// Load every query template at `path`.
///
/// A missing path or a non-JSON file is an error. Files that fail to parse
/// are logged and skipped.
pub fn load_queries(path: &Path) -> Result<Vec<QueryTemplate>, DefinitionError> {
    let files = json_files(path)?;
    if files.is_empty() {
        warn!("No .json query files found in path: {}", path.display());
    }

    let mut templates = Vec::new();
    for file in files {
        match read(&file).and_then(|json| parse_query_file(&file, &json)) {
            Ok(loaded) => {
                info!("Successfully loaded {} queries from {}.", loaded.len(), file.display());
                templates.extend(loaded);
            }
            Err(e) => error!("Failed to load query file: {e}"),
        }
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_file_keeps_extended_json_types() {
        let json = r#"[
            {"database": "airline", "collection": "flights", "operation": "find",
             "filter": {"_id": {"$oid": "65a1b2c3d4e5f60718293a4b"}, "gate": "<gate>"}},
            "not a query",
            {"database": "airline", "collection": "flights", "operation": "deleteOne",
             "filter": {"flight_id": "<int>"}}
        ]"#;
        let templates = parse_query_file(Path::new("q.json"), json).unwrap();
        assert_eq!(templates.len(), 2);

        let filter = match &templates[0].filter {
            Some(Bson::Document(doc)) => doc.clone(),
            other => panic!("unexpected filter {other:?}"),
        };
        assert!(matches!(filter.get("_id"), Some(Bson::ObjectId(_))));
        assert_eq!(filter.get_str("gate").unwrap(), "<gate>");
        assert_eq!(templates[1].operation.as_deref(), Some("deleteOne"));
    }

    #[test]
    fn test_parse_query_file_rejects_non_list() {
        let err = parse_query_file(Path::new("q.json"), r#"{"operation": "find"}"#).unwrap_err();
        assert!(err.to_string().contains("not a JSON list"));
    }
}
