// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`SchemaCatalog`] over a Confluent-compatible registry REST API.
//!
//! The registry name selects a registry context: schema `orders` in registry
//! `billing` lives under subject `:.billing:orders`. The subject string is
//! the schema identifier; the registry's global schema id identifies a
//! version.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::avro;
use crate::catalog::{
    CatalogError, Registration, SchemaCatalog, SchemaRecord, SchemaStatus, SchemaSummary,
    SchemaVersion, Validity, DATA_FORMAT_AVRO,
};
use crate::compatibility::CompatibilityMode;

/// Request timeout used by [`HttpCatalog::connect`] callers that have no
/// better value.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const REGISTRY_MEDIA_TYPE: &str = "application/vnd.schemaregistry.v1+json";

// Registry error codes carried in the response body.
const OPERATION_TIMED_OUT: i64 = 50002;
const FORWARDING_FAILED: i64 = 50003;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VersionReply {
    id: i64,
    version: u32,
    schema: String,
}

#[derive(Debug, Deserialize)]
struct IdReply {
    id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigReply {
    compatibility_level: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaBody<'a> {
    schema: &'a str,
    schema_type: &'a str,
}

#[derive(Debug, Serialize)]
struct CompatibilityBody {
    compatibility: CompatibilityMode,
}

enum Reply<T> {
    Ok(T),
    Status { status: StatusCode, error: ErrorBody },
}

// ---------------------------------------------------------------------------
// HttpCatalog
// ---------------------------------------------------------------------------

/// Blocking HTTP client for a schema registry.
pub struct HttpCatalog {
    client: Client,
    base: Url,
}

impl HttpCatalog {
    /// Build a client for the registry at `base_url`.
    pub fn connect(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let base = Url::parse(base_url).map_err(|e| {
            CatalogError::InvalidInput(format!("invalid registry URL '{}': {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(CatalogError::InvalidInput(format!(
                "registry URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Connection(format!("failed to build HTTP client: {}", e)))?;

        info!(url = %base, timeout_s = timeout.as_secs(), "schema registry client ready");
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Subject carrying schema `name` of `registry`.
    pub fn subject(registry: &str, name: &str) -> String {
        format!(":.{}:{}", registry, name)
    }

    fn subject_prefix(registry: &str) -> String {
        format!(":.{}:", registry)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidInput("registry URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Reply<T>, CatalogError> {
        let response = request
            .header(ACCEPT, REGISTRY_MEDIA_TYPE)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "registry response");

        if status.is_success() {
            return response
                .json::<T>()
                .map(Reply::Ok)
                .map_err(|e| CatalogError::Unexpected(format!("undecodable response: {}", e)));
        }

        let error = response.json::<ErrorBody>().unwrap_or_default();
        Ok(Reply::Status { status, error })
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Reply<T>, CatalogError> {
        self.call(self.client.get(self.url(segments)?))
    }

    fn post_schema<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        definition: &str,
    ) -> Result<Reply<T>, CatalogError> {
        let body = SchemaBody {
            schema: definition,
            schema_type: DATA_FORMAT_AVRO,
        };
        self.call(
            self.client
                .post(self.url(segments)?)
                .header(CONTENT_TYPE, REGISTRY_MEDIA_TYPE)
                .json(&body),
        )
    }

    fn compatibility(&self, subject: &str) -> Result<CompatibilityMode, CatalogError> {
        let request = self
            .client
            .get(self.url(&["config", subject])?)
            .query(&[("defaultToGlobal", "true")]);

        match self.call::<ConfigReply>(request)? {
            Reply::Ok(reply) => parse_level(&reply.compatibility_level),
            Reply::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                Ok(CompatibilityMode::default())
            }
            Reply::Status { status, error } => Err(status_error(status, error)),
        }
    }

    fn version(
        &self,
        subject: &str,
        version: Option<u32>,
    ) -> Result<VersionReply, CatalogError> {
        let selector = version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "latest".to_string());

        match self.get::<VersionReply>(&["subjects", subject, "versions", selector.as_str()])? {
            Reply::Ok(reply) => Ok(reply),
            Reply::Status { status, error } if status == StatusCode::NOT_FOUND => Err(
                CatalogError::NotFound(format!("version {} of subject '{}': {}", selector, subject, error.message)),
            ),
            Reply::Status { status, error } => Err(status_error(status, error)),
        }
    }

    fn version_numbers(&self, subject: &str) -> Result<Vec<u32>, CatalogError> {
        match self.get::<Vec<u32>>(&["subjects", subject, "versions"])? {
            Reply::Ok(versions) => Ok(versions),
            Reply::Status { status, error } if status == StatusCode::NOT_FOUND => Err(
                CatalogError::NotFound(format!("subject '{}': {}", subject, error.message)),
            ),
            Reply::Status { status, error } => Err(status_error(status, error)),
        }
    }

    /// Version already holding `definition`, if any.
    fn lookup(&self, subject: &str, definition: &str) -> Result<Option<u32>, CatalogError> {
        match self.post_schema::<VersionReply>(&["subjects", subject], definition)? {
            Reply::Ok(reply) => Ok(Some(reply.version)),
            Reply::Status { status, .. } if status == StatusCode::NOT_FOUND => Ok(None),
            Reply::Status { status, error } => Err(status_error(status, error)),
        }
    }

    fn submit(
        &self,
        name: &str,
        subject: &str,
        definition: &str,
    ) -> Result<i64, CatalogError> {
        match self.post_schema::<IdReply>(&["subjects", subject, "versions"], definition)? {
            Reply::Ok(reply) => Ok(reply.id),
            Reply::Status { status, error } if status == StatusCode::CONFLICT => {
                Err(CatalogError::Incompatible {
                    name: name.to_string(),
                    mode: self.compatibility(subject)?,
                    details: vec![error.message],
                })
            }
            Reply::Status { status, error } => Err(status_error(status, error)),
        }
    }
}

fn parse_level(level: &str) -> Result<CompatibilityMode, CatalogError> {
    level
        .trim_end_matches("_TRANSITIVE")
        .parse()
        .map_err(|_| CatalogError::Unexpected(format!("unknown compatibility level '{}'", level)))
}

fn transport_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() {
        CatalogError::Connection(err.to_string())
    } else {
        CatalogError::Unexpected(err.to_string())
    }
}

fn status_error(status: StatusCode, error: ErrorBody) -> CatalogError {
    let message = if error.message.is_empty() {
        status.to_string()
    } else {
        format!("{} ({})", error.message, error.error_code)
    };

    match (status.as_u16(), error.error_code) {
        (_, OPERATION_TIMED_OUT) | (408, _) | (504, _) => CatalogError::Timeout(message),
        (_, FORWARDING_FAILED) | (429, _) | (502, _) | (503, _) => CatalogError::NotReady(message),
        (404, _) => CatalogError::NotFound(message),
        (409, _) => CatalogError::AlreadyExists(message),
        (400, _) | (422, _) => CatalogError::InvalidInput(message),
        _ => CatalogError::Unexpected(message),
    }
}

impl SchemaCatalog for HttpCatalog {
    fn describe_schema(&self, registry: &str, name: &str) -> Result<SchemaSummary, CatalogError> {
        let subject = Self::subject(registry, name);
        let latest = self.version(&subject, None)?;
        Ok(SchemaSummary {
            name: name.to_string(),
            id: subject.clone(),
            status: SchemaStatus::Available,
            data_format: DATA_FORMAT_AVRO.to_string(),
            compatibility: self.compatibility(&subject)?,
            latest_version: latest.version,
            created_time: None,
            updated_time: None,
        })
    }

    fn get_version(
        &self,
        registry: &str,
        name: &str,
        version: Option<u32>,
    ) -> Result<SchemaRecord, CatalogError> {
        let subject = Self::subject(registry, name);
        let reply = self.version(&subject, version)?;
        Ok(SchemaRecord {
            name: name.to_string(),
            id: subject.clone(),
            version_id: reply.id.to_string(),
            version: reply.version,
            definition: reply.schema,
            compatibility: self.compatibility(&subject)?,
            status: SchemaStatus::Available,
        })
    }

    fn create_schema(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
        compatibility: CompatibilityMode,
    ) -> Result<Registration, CatalogError> {
        let subject = Self::subject(registry, name);
        match self.version_numbers(&subject) {
            Ok(_) => return Err(CatalogError::AlreadyExists(format!("subject '{}'", subject))),
            Err(CatalogError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }

        let request = self
            .client
            .put(self.url(&["config", subject.as_str()])?)
            .header(CONTENT_TYPE, REGISTRY_MEDIA_TYPE)
            .json(&CompatibilityBody { compatibility });
        if let Reply::Status { status, error } = self.call::<serde_json::Value>(request)? {
            return Err(status_error(status, error));
        }

        let id = self.submit(name, &subject, definition)?;
        let version = self.lookup(&subject, definition)?.unwrap_or(1);
        debug!(subject = %subject, id, version, "subject created");

        Ok(Registration {
            id: subject,
            version,
            created: true,
        })
    }

    fn register_version(
        &self,
        registry: &str,
        name: &str,
        definition: &str,
    ) -> Result<Registration, CatalogError> {
        let subject = Self::subject(registry, name);
        self.version_numbers(&subject)?;

        if let Some(version) = self.lookup(&subject, definition)? {
            return Ok(Registration {
                id: subject,
                version,
                created: false,
            });
        }

        self.submit(name, &subject, definition)?;
        let version = self.lookup(&subject, definition)?.ok_or_else(|| {
            CatalogError::Unexpected(format!(
                "registered schema not found under subject '{}'",
                subject
            ))
        })?;

        Ok(Registration {
            id: subject,
            version,
            created: true,
        })
    }

    /// Registry contexts exist implicitly, so an unknown registry lists as empty.
    fn list_schemas(&self, registry: &str) -> Result<Vec<SchemaSummary>, CatalogError> {
        let prefix = Self::subject_prefix(registry);
        let request = self
            .client
            .get(self.url(&["subjects"])?)
            .query(&[("subjectPrefix", prefix.as_str())]);

        let subjects = match self.call::<Vec<String>>(request)? {
            Reply::Ok(subjects) => subjects,
            Reply::Status { status, error } => return Err(status_error(status, error)),
        };

        subjects
            .iter()
            .filter_map(|subject| subject.strip_prefix(&prefix))
            .map(|name| self.describe_schema(registry, name))
            .collect()
    }

    fn list_versions(
        &self,
        registry: &str,
        name: &str,
    ) -> Result<Vec<SchemaVersion>, CatalogError> {
        let subject = Self::subject(registry, name);
        self.version_numbers(&subject)?
            .into_iter()
            .map(|version| {
                let reply = self.version(&subject, Some(version))?;
                Ok(SchemaVersion {
                    version: reply.version,
                    status: SchemaStatus::Available,
                    created_time: None,
                    version_id: reply.id.to_string(),
                })
            })
            .collect()
    }

    /// The REST API has no standalone validation endpoint; definitions are
    /// checked against the Avro record structure locally.
    fn check_validity(&self, definition: &str) -> Result<Validity, CatalogError> {
        Ok(match avro::validate(definition) {
            Ok(()) => Validity::valid(),
            Err(e) => Validity::invalid(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: i64, message: &str) -> ErrorBody {
        ErrorBody {
            error_code: code,
            message: message.to_string(),
        }
    }

    #[test]
    fn subjects_carry_the_registry_context() {
        assert_eq!(HttpCatalog::subject("billing", "orders"), ":.billing:orders");
        assert_eq!(HttpCatalog::subject_prefix("billing"), ":.billing:");
    }

    #[test]
    fn urls_append_encoded_segments() {
        let catalog = HttpCatalog::connect("http://registry.local:8081/", DEFAULT_HTTP_TIMEOUT)
            .unwrap();
        let url = catalog
            .url(&["subjects", ":.default:orders", "versions", "latest"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://registry.local:8081/subjects/:.default:orders/versions/latest"
        );

        let nested = HttpCatalog::connect("http://gw.local/registry", DEFAULT_HTTP_TIMEOUT)
            .unwrap();
        assert_eq!(
            nested.url(&["subjects"]).unwrap().as_str(),
            "http://gw.local/registry/subjects"
        );
    }

    #[test]
    fn bad_urls_are_rejected() {
        assert!(matches!(
            HttpCatalog::connect("not a url", DEFAULT_HTTP_TIMEOUT),
            Err(CatalogError::InvalidInput(_))
        ));
        assert!(matches!(
            HttpCatalog::connect("mailto:ops@example.com", DEFAULT_HTTP_TIMEOUT),
            Err(CatalogError::InvalidInput(_))
        ));
    }

    #[test]
    fn statuses_map_to_catalog_errors() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, body(40401, "Subject not found")),
            CatalogError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, body(42201, "Invalid schema")),
            CatalogError::InvalidInput(_)
        ));
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, ErrorBody::default()).is_transient());
        assert!(status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            body(OPERATION_TIMED_OUT, "timed out")
        )
        .is_transient());
        assert!(!status_error(StatusCode::INTERNAL_SERVER_ERROR, body(50001, "store")).is_transient());
    }

    #[test]
    fn transitive_levels_fold_into_modes() {
        assert_eq!(parse_level("FULL_TRANSITIVE"), Ok(CompatibilityMode::Full));
        assert_eq!(parse_level("NONE"), Ok(CompatibilityMode::None));
        assert!(parse_level("SOMETHING").is_err());
    }
}
