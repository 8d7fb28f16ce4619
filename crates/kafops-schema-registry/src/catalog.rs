// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema catalog seam.
//!
//! A catalog stores versioned schema definitions grouped by registry name.
//! [`MemoryCatalog`](crate::MemoryCatalog) and [`HttpCatalog`](crate::HttpCatalog)
//! implement it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compatibility::CompatibilityMode;

/// Data format recorded with every schema.
pub const DATA_FORMAT_AVRO: &str = "AVRO";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaStatus {
    #[default]
    Available,
    Pending,
    Deleting,
}

/// Catalog-level view of one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub name: String,
    /// Catalog-assigned identifier of the schema.
    pub id: String,
    pub status: SchemaStatus,
    pub data_format: String,
    pub compatibility: CompatibilityMode,
    pub latest_version: u32,
    pub created_time: Option<DateTime<Utc>>,
    pub updated_time: Option<DateTime<Utc>>,
}

/// One stored version with its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub name: String,
    /// Identifier of the schema, stable across versions.
    pub id: String,
    /// Identifier of this exact version.
    pub version_id: String,
    pub version: u32,
    pub definition: String,
    pub compatibility: CompatibilityMode,
    pub status: SchemaStatus,
}

/// Version listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub version: u32,
    pub status: SchemaStatus,
    pub created_time: Option<DateTime<Utc>>,
    /// Identifier of this exact version.
    pub version_id: String,
}

/// Result of a create or register call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Identifier of the schema, stable across versions.
    pub id: String,
    pub version: u32,
    /// `false` when the definition matched an existing version.
    pub created: bool,
}

/// Verdict of a catalog-side validity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validity {
    pub valid: bool,
    pub reason: Option<String>,
}

impl Validity {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("schema '{name}' is incompatible under {mode}: {}", .details.join("; "))]
    Incompatible {
        name: String,
        mode: CompatibilityMode,
        details: Vec<String>,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("catalog not ready: {0}")]
    NotReady(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("unexpected catalog response: {0}")]
    Unexpected(String),
}

impl CatalogError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::Connection(_) | CatalogError::Timeout(_) | CatalogError::NotReady(_)
        )
    }
}

// ---------------------------------------------------------------------------
// SchemaCatalog
// ---------------------------------------------------------------------------

/// Operations a schema catalog backend provides.
///
/// Every call is keyed by registry name and schema name.
pub trait SchemaCatalog: Send + Sync {
    fn describe_schema(&self, registry: &str, name: &str) -> Result<SchemaSummary, CatalogError>;

    /// `None` selects the latest version.
    fn get_version(
        &self,
        registry: &str,
        name: &str,
        version: Option<u32>,
    ) -> Result<SchemaRecord, CatalogError>;

    /// Create a schema with its first version; [`CatalogError::AlreadyExists`]
    /// if the name is taken.
    fn create_schema(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        compatibility: CompatibilityMode,
    ) -> Result<Registration, CatalogError>;

    /// Append a version to an existing schema, enforcing its compatibility
    /// mode. A definition identical to a stored version returns that version.
    fn register_version(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
    ) -> Result<Registration, CatalogError>;

    /// [`CatalogError::NotFound`] when the registry itself is unknown.
    fn list_schemas(&self, registry: &str) -> Result<Vec<SchemaSummary>, CatalogError>;

    fn list_versions(&self, registry: &str, name: &str)
        -> Result<Vec<SchemaVersion>, CatalogError>;

    fn check_validity(&self, definition: &str) -> Result<Validity, CatalogError>;
}

impl<T: SchemaCatalog + ?Sized> SchemaCatalog for Box<T> {
    fn describe_schema(&self, registry: &str, name: &str) -> Result<SchemaSummary, CatalogError> {
        (**self).describe_schema(registry, name)
    }

    fn get_version(
        &self,
        registry: &str,
        name: &str,
        version: Option<u32>,
    ) -> Result<SchemaRecord, CatalogError> {
        (**self).get_version(registry, name, version)
    }

    fn create_schema(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        compatibility: CompatibilityMode,
    ) -> Result<Registration, CatalogError> {
        (**self).create_schema(registry, name, definition, compatibility)
    }

    fn register_version(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
    ) -> Result<Registration, CatalogError> {
        (**self).register_version(registry, name, definition)
    }

    fn list_schemas(&self, registry: &str) -> Result<Vec<SchemaSummary>, CatalogError> {
        (**self).list_schemas(registry)
    }

    fn list_versions(
        &self,
        registry: &str,
        name: &str,
    ) -> Result<Vec<SchemaVersion>, CatalogError> {
        (**self).list_versions(registry, name)
    }

    fn check_validity(&self, definition: &str) -> Result<Validity, CatalogError> {
        (**self).check_validity(definition)
    }
}
