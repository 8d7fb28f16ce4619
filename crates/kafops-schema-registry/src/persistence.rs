// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::memory::{RegistryMap, SchemaMeta, StoredSchema, StoredVersion};

const REGISTRY_FILE: &str = "registry.json";
const SCHEMA_FILE: &str = "schema.json";

#[derive(Debug, Serialize, Deserialize)]
struct RegistryMarker {
    name: String,
}

// ---------------------------------------------------------------------------
// FilePersistence
// ---------------------------------------------------------------------------

/// File-based persistence for [`MemoryCatalog`](crate::MemoryCatalog).
///
/// Layout:
///   `{directory}/{registry}/registry.json`
///   `{directory}/{registry}/{schema}/schema.json`
///   `{directory}/{registry}/{schema}/v{version}.json`
pub struct FilePersistence {
    directory: PathBuf,
}

impl FilePersistence {
    /// Create a new `FilePersistence` rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(directory: PathBuf) -> Result<Self, CatalogError> {
        create_dir(&directory)?;
        Ok(FilePersistence { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Record that a registry exists, even while it holds no schema.
    pub(crate) fn save_registry(&self, registry: &str) -> Result<(), CatalogError> {
        let dir = self.directory.join(encode_name(registry));
        create_dir(&dir)?;
        write_json(
            &dir.join(REGISTRY_FILE),
            &RegistryMarker {
                name: registry.to_string(),
            },
        )
    }

    /// Write one schema and all its versions. Existing files are overwritten.
    pub(crate) fn save_schema(
        &self,
        registry: &str,
        schema: &StoredSchema,
    ) -> Result<(), CatalogError> {
        self.save_registry(registry)?;

        let schema_dir = self
            .directory
            .join(encode_name(registry))
            .join(encode_name(&schema.meta.name));
        create_dir(&schema_dir)?;

        write_json(&schema_dir.join(SCHEMA_FILE), &schema.meta)?;
        for version in &schema.versions {
            write_json(
                &schema_dir.join(format!("v{}.json", version.version)),
                version,
            )?;
        }
        Ok(())
    }

    /// Load every registry found under the root directory.
    pub(crate) fn load(&self) -> Result<RegistryMap, CatalogError> {
        let mut registries = RegistryMap::new();

        if !self.directory.exists() {
            return Ok(registries);
        }

        for registry_dir in subdirectories(&self.directory)? {
            let marker_path = registry_dir.join(REGISTRY_FILE);
            if !marker_path.exists() {
                continue;
            }
            let marker: RegistryMarker = read_json(&marker_path)?;

            let mut schemas = BTreeMap::new();
            for schema_dir in subdirectories(&registry_dir)? {
                let meta_path = schema_dir.join(SCHEMA_FILE);
                if !meta_path.exists() {
                    continue;
                }
                let meta: SchemaMeta = read_json(&meta_path)?;
                let versions = load_versions(&schema_dir)?;
                if versions.is_empty() {
                    continue;
                }
                // The name inside the file wins over the encoded directory name.
                schemas.insert(meta.name.clone(), StoredSchema { meta, versions });
            }

            registries.insert(marker.name, schemas);
        }

        Ok(registries)
    }
}

fn load_versions(schema_dir: &Path) -> Result<Vec<StoredVersion>, CatalogError> {
    let entries = fs::read_dir(schema_dir).map_err(|e| {
        CatalogError::Io(format!(
            "failed to read schema dir {}: {}",
            schema_dir.display(),
            e
        ))
    })?;

    let mut versions: Vec<StoredVersion> = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| CatalogError::Io(format!("version file entry error: {}", e)))?;
        let path = entry.path();

        let fname = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if !fname.starts_with('v') || !fname.ends_with(".json") {
            continue;
        }

        versions.push(read_json(&path)?);
    }

    versions.sort_by_key(|v| v.version);
    Ok(versions)
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        CatalogError::Io(format!("failed to read directory {}: {}", dir.display(), e))
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CatalogError::Io(format!("directory entry error: {}", e)))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

fn create_dir(dir: &Path) -> Result<(), CatalogError> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| {
        CatalogError::Io(format!(
            "failed to create directory {}: {}",
            dir.display(),
            e
        ))
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CatalogError::Io(format!("serialization error: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| CatalogError::Io(format!("failed to write {}: {}", path.display(), e)))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let json = fs::read_to_string(path)
        .map_err(|e| CatalogError::Io(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        CatalogError::Io(format!("failed to deserialize {}: {}", path.display(), e))
    })
}

/// Encode a registry or schema name as a directory name.
///
/// Bytes outside `[A-Za-z0-9._-]` become `%XX`, so distinct names never share
/// a directory. `.` and `..` are escaped whole and the empty name maps to `%`.
fn encode_name(name: &str) -> String {
    if name.is_empty() {
        return "%".to_string();
    }
    let only_dots = name.chars().all(|c| c == '.');
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || byte == b'_'
            || byte == b'-'
            || (byte == b'.' && !only_dots);
        if keep {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaStatus;
    use crate::compatibility::CompatibilityMode;
    use chrono::Utc;

    fn stored(name: &str, definitions: &[&str]) -> StoredSchema {
        let now = Utc::now();
        StoredSchema {
            meta: SchemaMeta {
                name: name.to_string(),
                compatibility: CompatibilityMode::Full,
                created_time: now,
                updated_time: now,
            },
            versions: definitions
                .iter()
                .enumerate()
                .map(|(i, d)| StoredVersion {
                    version: i as u32 + 1,
                    definition: d.to_string(),
                    status: SchemaStatus::Available,
                    created_time: now,
                })
                .collect(),
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path().to_path_buf()).unwrap();

        persistence
            .save_schema("default", &stored("orders", &["{\"a\":1}", "{\"a\":2}"]))
            .unwrap();
        persistence
            .save_schema("default", &stored("com.shop:Payment", &["{}"]))
            .unwrap();
        persistence.save_registry("empty").unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded["empty"].is_empty());

        let orders = &loaded["default"]["orders"];
        assert_eq!(orders.meta.compatibility, CompatibilityMode::Full);
        assert_eq!(orders.versions.len(), 2);
        assert_eq!(orders.versions[1].definition, "{\"a\":2}");
        assert!(loaded["default"].contains_key("com.shop:Payment"));
    }

    #[test]
    fn directory_creation() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("nested").join("registry");
        assert!(!nested.exists());

        let _persistence = FilePersistence::new(nested.clone()).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn load_ignores_stray_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("not-a-registry")).unwrap();
        let persistence = FilePersistence::new(dir.path().to_path_buf()).unwrap();
        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn encode_name_escapes_special_chars() {
        assert_eq!(encode_name("com.shop:Payment"), "com.shop%3APayment");
        assert_eq!(encode_name("a/b\\c"), "a%2Fb%5Cc");
        assert_eq!(encode_name("orders-v1_raw"), "orders-v1_raw");
    }

    #[test]
    fn encode_name_is_collision_free() {
        assert_ne!(encode_name("a:b"), encode_name("a_b"));
        assert_ne!(encode_name("a%3Ab"), encode_name("a:b"));
        assert_eq!(encode_name("."), "%2E");
        assert_eq!(encode_name(".."), "%2E%2E");
        assert_eq!(encode_name(""), "%");
    }

    #[test]
    fn colliding_names_persist_separately() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path().to_path_buf()).unwrap();
        persistence.save_schema("default", &stored("a:b", &["{\"v\":1}"])).unwrap();
        persistence.save_schema("default", &stored("a_b", &["{\"v\":2}"])).unwrap();
        persistence.save_schema("default", &stored("..", &["{\"v\":3}"])).unwrap();

        let loaded = persistence.load().unwrap();
        let schemas = &loaded["default"];
        assert_eq!(schemas.len(), 3);
        assert_eq!(schemas["a:b"].versions[0].definition, "{\"v\":1}");
        assert_eq!(schemas["a_b"].versions[0].definition, "{\"v\":2}");
        assert_eq!(schemas[".."].versions[0].definition, "{\"v\":3}");
        assert!(!dir.path().join("schema.json").exists());
    }
}
