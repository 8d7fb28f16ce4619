// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process schema catalog.
//!
//! Enforces each schema's compatibility mode on new versions the way a real
//! registry does. Optionally mirrors every mutation to disk through
//! [`FilePersistence`], so a catalog opened on the same directory sees the
//! same schemas. Failures can be queued per operation and every call is
//! counted.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::avro;
use crate::catalog::{
    CatalogError, Registration, SchemaCatalog, SchemaRecord, SchemaStatus, SchemaSummary,
    SchemaVersion, Validity, DATA_FORMAT_AVRO,
};
use crate::compatibility::{self, CompatibilityMode};
use crate::persistence::FilePersistence;

/// Operations of [`SchemaCatalog`], used for failure injection and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    DescribeSchema,
    GetVersion,
    CreateSchema,
    RegisterVersion,
    ListSchemas,
    ListVersions,
    CheckValidity,
}

// ---------------------------------------------------------------------------
// Stored state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SchemaMeta {
    pub name: String,
    pub compatibility: CompatibilityMode,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredVersion {
    pub version: u32,
    pub definition: String,
    pub status: SchemaStatus,
    pub created_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredSchema {
    pub meta: SchemaMeta,
    /// Index 0 holds version 1.
    pub versions: Vec<StoredVersion>,
}

impl StoredSchema {
    fn latest(&self) -> Option<&StoredVersion> {
        self.versions.last()
    }
}

/// Registry name → schema name → schema.
pub(crate) type RegistryMap = BTreeMap<String, BTreeMap<String, StoredSchema>>;

fn schema_id(registry: &str, name: &str) -> String {
    format!("{}/{}", registry, name)
}

fn version_id(registry: &str, name: &str, version: u32) -> String {
    format!("{}/{}/v{}", registry, name, version)
}

fn schema_not_found(registry: &str, name: &str) -> CatalogError {
    CatalogError::NotFound(format!(
        "schema '{}' in registry '{}'",
        name, registry
    ))
}

#[derive(Debug, Default)]
struct State {
    registries: RegistryMap,
    failures: HashMap<CatalogOp, VecDeque<CatalogError>>,
    calls: HashMap<CatalogOp, u32>,
}

impl State {
    fn schema(&self, registry: &str, name: &str) -> Result<&StoredSchema, CatalogError> {
        self.registries
            .get(registry)
            .and_then(|schemas| schemas.get(name))
            .ok_or_else(|| schema_not_found(registry, name))
    }
}

// ---------------------------------------------------------------------------
// MemoryCatalog
// ---------------------------------------------------------------------------

/// Thread-safe schema catalog held in memory.
pub struct MemoryCatalog {
    state: Mutex<State>,
    persistence: Option<FilePersistence>,
}

impl MemoryCatalog {
    /// Empty, non-persistent catalog.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            persistence: None,
        }
    }

    /// Open a catalog, loading and persisting to `directory` when given.
    pub fn open(directory: Option<&Path>) -> Result<Self, CatalogError> {
        let Some(directory) = directory else {
            return Ok(Self::new());
        };

        let persistence = FilePersistence::new(directory.to_path_buf())?;
        let registries = persistence.load()?;
        info!(
            directory = %directory.display(),
            registries = registries.len(),
            "opened file-backed schema catalog"
        );

        Ok(Self {
            state: Mutex::new(State {
                registries,
                ..State::default()
            }),
            persistence: Some(persistence),
        })
    }

    /// Declare an empty registry. Existing registries are left untouched.
    pub fn create_registry(&self, registry: &str) -> Result<(), CatalogError> {
        if registry.is_empty() {
            return Err(CatalogError::InvalidInput(
                "registry name cannot be empty".to_string(),
            ));
        }
        let mut state = self.state.lock();
        if state.registries.contains_key(registry) {
            return Ok(());
        }
        if let Some(persistence) = &self.persistence {
            persistence.save_registry(registry)?;
        }
        state.registries.insert(registry.to_string(), BTreeMap::new());
        Ok(())
    }

    /// Builder form of [`create_registry`](Self::create_registry) for
    /// non-persistent catalogs.
    pub fn with_registry(self, registry: &str) -> Self {
        self.state
            .lock()
            .registries
            .entry(registry.to_string())
            .or_default();
        self
    }

    /// Queue an error for the next call of `op`.
    pub fn fail_next(&self, op: CatalogOp, err: CatalogError) {
        self.fail_times(op, err, 1);
    }

    /// Queue the same error for the next `times` calls of `op`.
    pub fn fail_times(&self, op: CatalogOp, err: CatalogError, times: usize) {
        let mut state = self.state.lock();
        let queue = state.failures.entry(op).or_default();
        for _ in 0..times {
            queue.push_back(err.clone());
        }
    }

    /// Number of times `op` was invoked, failed calls included.
    pub fn calls(&self, op: CatalogOp) -> u32 {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn version_count(&self, registry: &str, name: &str) -> usize {
        self.state
            .lock()
            .schema(registry, name)
            .map(|s| s.versions.len())
            .unwrap_or(0)
    }

    /// Count the call and pop an injected failure, if any.
    fn enter(&self, op: CatalogOp) -> Result<MutexGuard<'_, State>, CatalogError> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some(err) = state.failures.get_mut(&op).and_then(|q| q.pop_front()) {
            debug!(?op, error = %err, "injected catalog failure");
            return Err(err);
        }
        Ok(state)
    }

    fn persist(&self, registry: &str, schema: &StoredSchema) -> Result<(), CatalogError> {
        match &self.persistence {
            Some(persistence) => persistence.save_schema(registry, schema),
            None => Ok(()),
        }
    }

    fn summary(registry: &str, schema: &StoredSchema) -> SchemaSummary {
        SchemaSummary {
            name: schema.meta.name.clone(),
            id: schema_id(registry, &schema.meta.name),
            status: SchemaStatus::Available,
            data_format: DATA_FORMAT_AVRO.to_string(),
            compatibility: schema.meta.compatibility,
            latest_version: schema.latest().map(|v| v.version).unwrap_or(0),
            created_time: Some(schema.meta.created_time),
            updated_time: Some(schema.meta.updated_time),
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_valid(definition: &str) -> Result<(), CatalogError> {
    avro::validate(definition).map_err(|e| CatalogError::InvalidInput(e.to_string()))
}

impl SchemaCatalog for MemoryCatalog {
    fn describe_schema(&self, registry: &str, name: &str) -> Result<SchemaSummary, CatalogError> {
        let state = self.enter(CatalogOp::DescribeSchema)?;
        let schema = state.schema(registry, name)?;
        Ok(Self::summary(registry, schema))
    }

    fn get_version(
        &self,
        registry: &str,
        name: &str,
        version: Option<u32>,
    ) -> Result<SchemaRecord, CatalogError> {
        let state = self.enter(CatalogOp::GetVersion)?;
        let schema = state.schema(registry, name)?;

        let stored = match version {
            None => schema.latest(),
            Some(0) => None,
            Some(v) => schema.versions.get(v as usize - 1),
        }
        .ok_or_else(|| {
            CatalogError::NotFound(format!(
                "version {} of schema '{}' in registry '{}'",
                version.map(|v| v.to_string()).unwrap_or_else(|| "latest".into()),
                name,
                registry
            ))
        })?;

        Ok(SchemaRecord {
            name: name.to_string(),
            id: schema_id(registry, name),
            version_id: version_id(registry, name, stored.version),
            version: stored.version,
            definition: stored.definition.clone(),
            compatibility: schema.meta.compatibility,
            status: stored.status,
        })
    }

    /// Unknown registries are created on first use.
    fn create_schema(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        compatibility: CompatibilityMode,
    ) -> Result<Registration, CatalogError> {
        let mut state = self.enter(CatalogOp::CreateSchema)?;
        ensure_valid(definition)?;

        if state.schema(registry, name).is_ok() {
            return Err(CatalogError::AlreadyExists(format!(
                "schema '{}' in registry '{}'",
                name, registry
            )));
        }

        let now = Utc::now();
        let schema = StoredSchema {
            meta: SchemaMeta {
                name: name.to_string(),
                compatibility,
                created_time: now,
                updated_time: now,
            },
            versions: vec![StoredVersion {
                version: 1,
                definition: definition.to_string(),
                status: SchemaStatus::Available,
                created_time: now,
            }],
        };
        self.persist(registry, &schema)?;

        state
            .registries
            .entry(registry.to_string())
            .or_default()
            .insert(name.to_string(), schema);
        debug!(registry, name, %compatibility, "schema created");

        Ok(Registration {
            id: schema_id(registry, name),
            version: 1,
            created: true,
        })
    }

    fn register_version(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
    ) -> Result<Registration, CatalogError> {
        let mut state = self.enter(CatalogOp::RegisterVersion)?;
        ensure_valid(definition)?;

        let current = state.schema(registry, name)?;
        if let Some(existing) = current.versions.iter().find(|v| v.definition == definition) {
            return Ok(Registration {
                id: schema_id(registry, name),
                version: existing.version,
                created: false,
            });
        }

        let mode = current.meta.compatibility;
        if let Some(latest) = current.latest() {
            let result = compatibility::check_definitions(&latest.definition, definition)
                .map_err(|e| {
                    CatalogError::Unexpected(format!(
                        "stored version {} of '{}' is unreadable: {}",
                        latest.version, name, e
                    ))
                })?;
            if !mode.permits(result.compatibility) {
                return Err(CatalogError::Incompatible {
                    name: name.to_string(),
                    mode,
                    details: result.details,
                });
            }
        }

        let now = Utc::now();
        let mut updated = current.clone();
        let version = updated.versions.len() as u32 + 1;
        updated.versions.push(StoredVersion {
            version,
            definition: definition.to_string(),
            status: SchemaStatus::Available,
            created_time: now,
        });
        updated.meta.updated_time = now;
        self.persist(registry, &updated)?;

        if let Some(schemas) = state.registries.get_mut(registry) {
            schemas.insert(name.to_string(), updated);
        }
        debug!(registry, name, version, "schema version registered");

        Ok(Registration {
            id: schema_id(registry, name),
            version,
            created: true,
        })
    }

    fn list_schemas(&self, registry: &str) -> Result<Vec<SchemaSummary>, CatalogError> {
        let state = self.enter(CatalogOp::ListSchemas)?;
        let schemas = state
            .registries
            .get(registry)
            .ok_or_else(|| CatalogError::NotFound(format!("registry '{}'", registry)))?;
        Ok(schemas
            .values()
            .map(|schema| Self::summary(registry, schema))
            .collect())
    }

    fn list_versions(
        &self,
        registry: &str,
        name: &str,
    ) -> Result<Vec<SchemaVersion>, CatalogError> {
        let state = self.enter(CatalogOp::ListVersions)?;
        let schema = state.schema(registry, name)?;
        Ok(schema
            .versions
            .iter()
            .map(|v| SchemaVersion {
                version: v.version,
                status: v.status,
                created_time: Some(v.created_time),
                version_id: version_id(registry, name, v.version),
            })
            .collect())
    }

    fn check_validity(&self, definition: &str) -> Result<Validity, CatalogError> {
        drop(self.enter(CatalogOp::CheckValidity)?);
        Ok(match avro::validate(definition) {
            Ok(()) => Validity::valid(),
            Err(e) => Validity::invalid(e.to_string()),
        })
    }
}
