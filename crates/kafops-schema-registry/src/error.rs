// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema registry errors.

use std::fmt;

use kafops_core::Retryable;
use thiserror::Error;

use crate::catalog::CatalogError;

/// What went wrong, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaErrorKind {
    InvalidArgument,
    InvalidSchemaJson,
    InvalidCompatibilityMode,
    InvalidSchema,
    SchemaNotFound,
    IncompatibleSchema,
    Timeout,
    Connection,
    NotReady,
    Unexpected,
}

impl SchemaErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaErrorKind::InvalidArgument => "invalid_argument",
            SchemaErrorKind::InvalidSchemaJson => "invalid_schema_json",
            SchemaErrorKind::InvalidCompatibilityMode => "invalid_compatibility_mode",
            SchemaErrorKind::InvalidSchema => "invalid_schema",
            SchemaErrorKind::SchemaNotFound => "schema_not_found",
            SchemaErrorKind::IncompatibleSchema => "incompatible_schema",
            SchemaErrorKind::Timeout => "timeout",
            SchemaErrorKind::Connection => "connection",
            SchemaErrorKind::NotReady => "not_ready",
            SchemaErrorKind::Unexpected => "unexpected",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SchemaErrorKind::Timeout | SchemaErrorKind::Connection | SchemaErrorKind::NotReady
        )
    }
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every [`SchemaRegistryClient`](crate::SchemaRegistryClient) operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed{}: {message}", resource_suffix(.resource))]
pub struct SchemaRegistryError {
    kind: SchemaErrorKind,
    message: String,
    resource: Option<String>,
    operation: &'static str,
}

impl SchemaRegistryError {
    pub fn new(kind: SchemaErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource: None,
            operation,
        }
    }

    /// Attach the schema the operation targeted.
    pub fn on(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn kind(&self) -> SchemaErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub(crate) fn from_catalog(err: CatalogError, operation: &'static str, resource: &str) -> Self {
        let kind = match &err {
            CatalogError::NotFound(_) => SchemaErrorKind::SchemaNotFound,
            CatalogError::Incompatible { .. } => SchemaErrorKind::IncompatibleSchema,
            CatalogError::InvalidInput(_) => SchemaErrorKind::InvalidSchema,
            CatalogError::Connection(_) => SchemaErrorKind::Connection,
            CatalogError::Timeout(_) => SchemaErrorKind::Timeout,
            CatalogError::NotReady(_) => SchemaErrorKind::NotReady,
            CatalogError::AlreadyExists(_) | CatalogError::Io(_) | CatalogError::Unexpected(_) => {
                SchemaErrorKind::Unexpected
            }
        };
        Self::new(kind, operation, err.to_string()).on(resource)
    }
}

fn resource_suffix(resource: &Option<String>) -> String {
    resource
        .as_ref()
        .map(|r| format!(" for '{}'", r))
        .unwrap_or_default()
}

impl Retryable for SchemaRegistryError {
    fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    fn error_class(&self) -> &'static str {
        self.kind.as_str()
    }
}
