// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema registry operations bound to one registry name.

use kafops_core::{RetryPolicy, Settings};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::avro::{self, AvroError, RecordField};
use crate::catalog::{CatalogError, SchemaCatalog, SchemaRecord, SchemaSummary, SchemaVersion};
use crate::compatibility::{self, Compatibility, CompatibilityMode};
use crate::error::{SchemaErrorKind, SchemaRegistryError};

/// Mode used when the caller does not name one.
pub const DEFAULT_COMPATIBILITY: &str = "BACKWARD";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    /// First version of a new schema.
    Created,
    /// New version appended to an existing schema.
    NewVersion,
    /// Definition already stored; nothing was written.
    Unchanged,
}

/// Result of [`SchemaRegistryClient::register_avro_schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterOutcome {
    /// Identifier of the schema, stable across versions.
    pub id: String,
    pub name: String,
    pub version: u32,
    pub status: RegisterStatus,
}

/// Result of [`SchemaRegistryClient::compatibility_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    pub schema: String,
    pub compatible: bool,
    /// Version the candidate was compared with.
    pub compared_version: Option<u32>,
    /// Structural classification, when a comparison was possible.
    pub level: Option<Compatibility>,
    pub details: Vec<String>,
}

impl CompatibilityReport {
    fn verdict(schema: &str, compatible: bool, detail: impl Into<String>) -> Self {
        Self {
            schema: schema.to_string(),
            compatible,
            compared_version: None,
            level: None,
            details: vec![detail.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// SchemaRegistryClient
// ---------------------------------------------------------------------------

/// Schema registration and lookup against one catalog and registry name.
pub struct SchemaRegistryClient<S: SchemaCatalog> {
    catalog: S,
    registry: String,
    retry: RetryPolicy,
}

impl<S: SchemaCatalog> SchemaRegistryClient<S> {
    pub fn new(catalog: S, registry: impl Into<String>) -> Self {
        Self {
            catalog,
            registry: registry.into(),
            retry: RetryPolicy::query(),
        }
    }

    /// Client bound to the registry named in `settings`.
    pub fn from_settings(catalog: S, settings: &Settings) -> Self {
        Self::new(catalog, settings.schema_registry_name.clone())
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn catalog(&self) -> &S {
        &self.catalog
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Register an Avro definition under `name`.
    ///
    /// `compatibility` is one of `BACKWARD`, `FORWARD`, `FULL` or `NONE` and
    /// only applies when the schema is created. Registering the definition
    /// already stored as the latest version writes nothing and returns the
    /// existing identifier.
    pub fn register_avro_schema(
        &self,
        definition: &str,
        name: &str,
        compatibility: &str,
    ) -> Result<RegisterOutcome, SchemaRegistryError> {
        const OP: &str = "register_avro_schema";
        require_name(name, OP)?;

        avro::parse_json(definition).map_err(|e| {
            SchemaRegistryError::new(SchemaErrorKind::InvalidSchemaJson, OP, e.to_string()).on(name)
        })?;
        let mode: CompatibilityMode = compatibility.parse().map_err(|msg: String| {
            SchemaRegistryError::new(SchemaErrorKind::InvalidCompatibilityMode, OP, msg).on(name)
        })?;

        info!(
            schema = name,
            compatibility = %mode,
            registry = %self.registry,
            "registering Avro schema"
        );

        let result = self
            .retry
            .run(OP, |_ctx| self.register_once(definition, name, mode));

        match &result {
            Ok(outcome) => info!(
                schema = name,
                id = %outcome.id,
                version = outcome.version,
                status = ?outcome.status,
                "schema registration complete"
            ),
            Err(err) => {
                error!(schema = name, error_kind = %err.kind(), error = %err, "schema registration failed")
            }
        }
        result
    }

    fn register_once(
        &self,
        definition: &str,
        name: &str,
        mode: CompatibilityMode,
    ) -> Result<RegisterOutcome, SchemaRegistryError> {
        const OP: &str = "register_avro_schema";

        match self.catalog.get_version(&self.registry, name, None) {
            Ok(latest) => return self.register_existing(definition, name, latest),
            Err(CatalogError::NotFound(_)) => {}
            Err(err) => return Err(SchemaRegistryError::from_catalog(err, OP, name)),
        }

        match self
            .catalog
            .create_schema(&self.registry, name, definition, mode)
        {
            Ok(registration) => Ok(RegisterOutcome {
                id: registration.id,
                name: name.to_string(),
                version: registration.version,
                status: RegisterStatus::Created,
            }),
            Err(CatalogError::AlreadyExists(_)) => {
                info!(schema = name, "schema created concurrently, re-reading");
                let latest = self
                    .catalog
                    .get_version(&self.registry, name, None)
                    .map_err(|e| SchemaRegistryError::from_catalog(e, OP, name))?;
                self.register_existing(definition, name, latest)
            }
            Err(err) => Err(SchemaRegistryError::from_catalog(err, OP, name)),
        }
    }

    fn register_existing(
        &self,
        definition: &str,
        name: &str,
        latest: SchemaRecord,
    ) -> Result<RegisterOutcome, SchemaRegistryError> {
        const OP: &str = "register_avro_schema";

        if latest.definition == definition {
            info!(schema = name, version = latest.version, "schema already exists with same definition");
            let summary = self
                .catalog
                .describe_schema(&self.registry, name)
                .map_err(|e| SchemaRegistryError::from_catalog(e, OP, name))?;
            return Ok(RegisterOutcome {
                id: summary.id,
                name: name.to_string(),
                version: latest.version,
                status: RegisterStatus::Unchanged,
            });
        }

        let registration = self
            .catalog
            .register_version(&self.registry, name, definition)
            .map_err(|e| SchemaRegistryError::from_catalog(e, OP, name))?;

        Ok(RegisterOutcome {
            id: registration.id,
            name: name.to_string(),
            version: registration.version,
            status: if registration.created {
                RegisterStatus::NewVersion
            } else {
                RegisterStatus::Unchanged
            },
        })
    }

    /// Definition of `name` at `version`, latest when `None`.
    pub fn get_schema(
        &self,
        name: &str,
        version: Option<u32>,
    ) -> Result<String, SchemaRegistryError> {
        self.get_schema_record(name, version).map(|r| r.definition)
    }

    /// Like [`get_schema`](Self::get_schema), with the version metadata.
    pub fn get_schema_record(
        &self,
        name: &str,
        version: Option<u32>,
    ) -> Result<SchemaRecord, SchemaRegistryError> {
        const OP: &str = "get_schema";
        require_name(name, OP)?;
        if version == Some(0) {
            return Err(SchemaRegistryError::new(
                SchemaErrorKind::InvalidArgument,
                OP,
                "Schema versions start at 1",
            )
            .on(name));
        }

        let result = self.retry.run(OP, |_ctx| {
            self.catalog
                .get_version(&self.registry, name, version)
                .map_err(|e| SchemaRegistryError::from_catalog(e, OP, name))
        });

        match &result {
            Ok(record) => info!(schema = name, version = record.version, "schema retrieved"),
            Err(err) => error!(schema = name, error_kind = %err.kind(), error = %err, "failed to get schema"),
        }
        result
    }

    /// Every schema of the registry, sorted by name. An unknown registry
    /// yields an empty list.
    pub fn list_schemas(&self) -> Result<Vec<SchemaSummary>, SchemaRegistryError> {
        const OP: &str = "list_schemas";

        let result = self.retry.run(OP, |_ctx| {
            match self.catalog.list_schemas(&self.registry) {
                Ok(mut schemas) => {
                    schemas.sort_by(|a, b| a.name.cmp(&b.name));
                    Ok(schemas)
                }
                Err(CatalogError::NotFound(_)) => {
                    warn!(registry = %self.registry, "registry not found");
                    Ok(Vec::new())
                }
                Err(err) => Err(SchemaRegistryError::from_catalog(err, OP, &self.registry)),
            }
        });

        match &result {
            Ok(schemas) => info!(registry = %self.registry, count = schemas.len(), "schemas listed"),
            Err(err) => error!(registry = %self.registry, error = %err, "failed to list schemas"),
        }
        result
    }

    /// Whether `candidate` may replace the latest version of `name`.
    pub fn check_compatibility(
        &self,
        name: &str,
        candidate: &str,
    ) -> Result<bool, SchemaRegistryError> {
        self.compatibility_report(name, candidate)
            .map(|report| report.compatible)
    }

    /// Compatibility verdict with the structural changes behind it.
    ///
    /// With no prior registration any JSON candidate is compatible.
    /// Otherwise the catalog validates the candidate, and a field of the
    /// latest version missing from the candidate makes it incompatible unless
    /// the latest version declares a default for it.
    pub fn compatibility_report(
        &self,
        name: &str,
        candidate: &str,
    ) -> Result<CompatibilityReport, SchemaRegistryError> {
        const OP: &str = "check_compatibility";
        require_name(name, OP)?;

        avro::parse_json(candidate).map_err(|e| {
            SchemaRegistryError::new(
                SchemaErrorKind::InvalidSchemaJson,
                OP,
                format!("Invalid JSON in candidate schema: {}", e),
            )
            .on(name)
        })?;

        info!(schema = name, "checking schema compatibility");

        self.retry.run(OP, |_ctx| {
            let latest = match self.catalog.get_version(&self.registry, name, None) {
                Ok(latest) => latest,
                Err(CatalogError::NotFound(_)) => {
                    info!(schema = name, "no existing schema found, candidate is compatible");
                    return Ok(CompatibilityReport::verdict(
                        name,
                        true,
                        "no existing schema",
                    ));
                }
                Err(err) => return Err(SchemaRegistryError::from_catalog(err, OP, name)),
            };

            let validity = self
                .catalog
                .check_validity(candidate)
                .map_err(|e| SchemaRegistryError::from_catalog(e, OP, name))?;
            if !validity.valid {
                warn!(schema = name, reason = ?validity.reason, "candidate schema is not valid");
                return Ok(CompatibilityReport::verdict(
                    name,
                    false,
                    validity
                        .reason
                        .unwrap_or_else(|| "candidate schema is not valid".to_string()),
                ));
            }

            Ok(structural_report(name, &latest, candidate))
        })
    }

    /// Versions of `name`, newest first.
    pub fn get_schema_versions(
        &self,
        name: &str,
    ) -> Result<Vec<SchemaVersion>, SchemaRegistryError> {
        const OP: &str = "get_schema_versions";
        require_name(name, OP)?;

        let result = self.retry.run(OP, |_ctx| {
            self.catalog
                .list_versions(&self.registry, name)
                .map_err(|e| SchemaRegistryError::from_catalog(e, OP, name))
        });

        match result {
            Ok(mut versions) => {
                versions.sort_by(|a, b| b.version.cmp(&a.version));
                info!(schema = name, count = versions.len(), "schema versions retrieved");
                Ok(versions)
            }
            Err(err) => {
                error!(schema = name, error_kind = %err.kind(), error = %err, "failed to get schema versions");
                Err(err)
            }
        }
    }
}

fn fields_of(definition: &str) -> Result<Vec<RecordField>, AvroError> {
    avro::record_fields(&avro::parse_json(definition)?)
}

fn structural_report(name: &str, latest: &SchemaRecord, candidate: &str) -> CompatibilityReport {
    let (existing, proposed) = match (fields_of(&latest.definition), fields_of(candidate)) {
        (Ok(existing), Ok(proposed)) => (existing, proposed),
        (Err(e), _) | (_, Err(e)) => {
            warn!(
                schema = name,
                error = %e,
                "could not perform detailed compatibility check, assuming compatible"
            );
            let mut report = CompatibilityReport::verdict(
                name,
                true,
                format!("structural comparison unavailable: {}", e),
            );
            report.compared_version = Some(latest.version);
            return report;
        }
    };

    let removed = compatibility::removed_required_fields(&existing, &proposed);
    for field in &removed {
        warn!(schema = name, field = %field, "required field removed");
    }
    let result = compatibility::check_compatibility(&existing, &proposed);
    let compatible = removed.is_empty();
    if compatible {
        info!(schema = name, "schema compatibility check passed");
    }

    CompatibilityReport {
        schema: name.to_string(),
        compatible,
        compared_version: Some(latest.version),
        level: Some(result.compatibility),
        details: result.details,
    }
}

fn require_name(name: &str, operation: &'static str) -> Result<(), SchemaRegistryError> {
    if name.trim().is_empty() {
        return Err(SchemaRegistryError::new(
            SchemaErrorKind::InvalidArgument,
            operation,
            "Schema name cannot be empty",
        ));
    }
    Ok(())
}
