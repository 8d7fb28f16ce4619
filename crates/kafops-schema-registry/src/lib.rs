// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Avro schema registry for Kafka topics.
//!
//! Register, retrieve, list and compatibility-check Avro record schemas
//! against a [`SchemaCatalog`]: an in-memory catalog with optional file
//! persistence, or a Confluent-compatible registry over HTTP.
//!
//! # Example
//!
//! ```rust
//! use kafops_core::RetryPolicy;
//! use kafops_schema_registry::{MemoryCatalog, RegisterStatus, SchemaRegistryClient};
//!
//! let client = SchemaRegistryClient::new(MemoryCatalog::new(), "default")
//!     .with_retry_policy(RetryPolicy::immediate());
//!
//! let v1 = r#"{"type":"record","name":"Order","fields":[{"name":"id","type":"long"}]}"#;
//! let first = client.register_avro_schema(v1, "orders", "BACKWARD").unwrap();
//! let again = client.register_avro_schema(v1, "orders", "BACKWARD").unwrap();
//! assert_eq!(first.id, again.id);
//! assert_eq!(again.status, RegisterStatus::Unchanged);
//! ```

pub mod avro;
pub mod catalog;
pub mod client;
pub mod compatibility;
pub mod error;
pub mod http;
pub mod memory;
pub mod persistence;

use std::path::Path;

use kafops_core::Settings;

pub use catalog::{
    CatalogError, Registration, SchemaCatalog, SchemaRecord, SchemaStatus, SchemaSummary,
    SchemaVersion, Validity,
};
pub use client::{
    CompatibilityReport, RegisterOutcome, RegisterStatus, SchemaRegistryClient,
    DEFAULT_COMPATIBILITY,
};
pub use compatibility::{Compatibility, CompatibilityMode, CompatibilityResult};
pub use error::{SchemaErrorKind, SchemaRegistryError};
pub use http::{HttpCatalog, DEFAULT_HTTP_TIMEOUT};
pub use memory::{CatalogOp, MemoryCatalog};
pub use persistence::FilePersistence;

/// Open the catalog configured in `settings`.
///
/// `schema_registry_url` selects [`HttpCatalog`]; otherwise
/// `schema_registry_dir` selects a file-backed [`MemoryCatalog`].
pub fn open_catalog(settings: &Settings) -> Result<Box<dyn SchemaCatalog>, CatalogError> {
    if let Some(url) = settings.schema_registry_url.as_deref() {
        return Ok(Box::new(HttpCatalog::connect(url, DEFAULT_HTTP_TIMEOUT)?));
    }
    if let Some(dir) = settings.schema_registry_dir.as_deref() {
        let catalog = MemoryCatalog::open(Some(Path::new(dir)))?;
        catalog.create_registry(&settings.schema_registry_name)?;
        return Ok(Box::new(catalog));
    }
    Err(CatalogError::InvalidInput(
        "no schema catalog configured: set SCHEMA_REGISTRY_URL or SCHEMA_REGISTRY_DIR".to_string(),
    ))
}
