// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide settings.
//!
//! Layering, lowest precedence first: built-in defaults, an optional TOML
//! file, then environment variables. The result is validated once.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::bootstrap::{BootstrapError, BootstrapResolver, SecurityPosture};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

/// Kafka security protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityProtocol {
    #[serde(rename = "SSL")]
    Ssl,
    #[serde(rename = "SASL_SSL")]
    SaslSsl,
}

impl SecurityProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityProtocol::Ssl => "SSL",
            SecurityProtocol::SaslSsl => "SASL_SSL",
        }
    }
}

impl FromStr for SecurityProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SSL" => Ok(SecurityProtocol::Ssl),
            "SASL_SSL" => Ok(SecurityProtocol::SaslSsl),
            other => Err(format!("expected SSL or SASL_SSL, got '{}'", other)),
        }
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SASL mechanism used with `SASL_SSL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaslMechanism {
    #[serde(rename = "SCRAM-SHA-512")]
    ScramSha512,
    #[serde(rename = "OAUTHBEARER")]
    OAuthBearer,
}

impl SaslMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaslMechanism::ScramSha512 => "SCRAM-SHA-512",
            SaslMechanism::OAuthBearer => "OAUTHBEARER",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCRAM-SHA-512" => Ok(SaslMechanism::ScramSha512),
            "OAUTHBEARER" => Ok(SaslMechanism::OAuthBearer),
            other => Err(format!(
                "expected SCRAM-SHA-512 or OAUTHBEARER, got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defaults applied to topics created without explicit sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDefaults {
    #[serde(default = "default_partitions")]
    pub partitions: i32,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: i32,

    #[serde(default = "default_min_insync_replicas")]
    pub min_insync_replicas: i32,
}

fn default_partitions() -> i32 {
    6
}

fn default_replication_factor() -> i32 {
    3
}

fn default_min_insync_replicas() -> i32 {
    2
}

impl Default for TopicDefaults {
    fn default() -> Self {
        Self {
            partitions: default_partitions(),
            replication_factor: default_replication_factor(),
            min_insync_replicas: default_min_insync_replicas(),
        }
    }
}

/// Settings shared by every kafops client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Cloud region handed to the bootstrap resolver and token provider.
    #[serde(default = "default_region")]
    pub region: String,

    /// Control-plane cluster identifier, resolved when no bootstrap is set.
    #[serde(default)]
    pub cluster_id: Option<String>,

    /// Explicit bootstrap servers (`host:port,...`).
    #[serde(default)]
    pub kafka_bootstrap: Option<String>,

    #[serde(default = "default_security_protocol")]
    pub security_protocol: SecurityProtocol,

    #[serde(default = "default_sasl_mechanism")]
    pub sasl_mechanism: SaslMechanism,

    #[serde(default)]
    pub sasl_username: Option<String>,

    #[serde(default)]
    pub sasl_password: Option<String>,

    #[serde(default)]
    pub ssl_ca_location: Option<String>,

    #[serde(default)]
    pub ssl_cert_location: Option<String>,

    #[serde(default)]
    pub ssl_key_location: Option<String>,

    /// Registry namespace every schema operation is bound to.
    #[serde(default = "default_schema_registry_name")]
    pub schema_registry_name: String,

    /// Base URL of an HTTP schema registry.
    #[serde(default)]
    pub schema_registry_url: Option<String>,

    /// Directory backing a local file-persisted schema catalog.
    #[serde(default)]
    pub schema_registry_dir: Option<String>,

    #[serde(default)]
    pub topic_defaults: TopicDefaults,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_security_protocol() -> SecurityProtocol {
    SecurityProtocol::SaslSsl
}

fn default_sasl_mechanism() -> SaslMechanism {
    SaslMechanism::OAuthBearer
}

fn default_schema_registry_name() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: default_region(),
            cluster_id: None,
            kafka_bootstrap: None,
            security_protocol: default_security_protocol(),
            sasl_mechanism: default_sasl_mechanism(),
            sasl_username: None,
            sasl_password: None,
            ssl_ca_location: None,
            ssl_cert_location: None,
            ssl_key_location: None,
            schema_registry_name: default_schema_registry_name(),
            schema_registry_url: None,
            schema_registry_dir: None,
            topic_defaults: TopicDefaults::default(),
            log_level: default_log_level(),
        }
    }
}

const REDACTED: &str = "********";

impl Settings {
    /// Defaults, then the optional TOML file, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                info!(path = %path.display(), "loading settings file");
                Self::parse_file(path)?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Self::parse_file(path.as_ref())?;
        settings.validate()?;
        Ok(settings)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay environment values fetched through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("REGION") {
            self.region = v;
        }
        if let Some(v) = get("KAFKA_CLUSTER_ID") {
            self.cluster_id = Some(v);
        }
        if let Some(v) = get("KAFKA_BOOTSTRAP") {
            self.kafka_bootstrap = Some(v);
        }
        if let Some(v) = get("KAFKA_SECURITY_PROTOCOL") {
            self.security_protocol = v.parse().map_err(|message| ConfigError::InvalidValue {
                key: "KAFKA_SECURITY_PROTOCOL".into(),
                message,
            })?;
        }
        if let Some(v) = get("KAFKA_SASL_MECHANISM") {
            self.sasl_mechanism = v.parse().map_err(|message| ConfigError::InvalidValue {
                key: "KAFKA_SASL_MECHANISM".into(),
                message,
            })?;
        }
        if let Some(v) = get("KAFKA_SASL_USERNAME") {
            self.sasl_username = Some(v);
        }
        if let Some(v) = get("KAFKA_SASL_PASSWORD") {
            self.sasl_password = Some(v);
        }
        if let Some(v) = get("SSL_CA_LOCATION") {
            self.ssl_ca_location = Some(v);
        }
        if let Some(v) = get("SSL_CERT_LOCATION") {
            self.ssl_cert_location = Some(v);
        }
        if let Some(v) = get("SSL_KEY_LOCATION") {
            self.ssl_key_location = Some(v);
        }
        if let Some(v) = get("SCHEMA_REGISTRY_NAME") {
            self.schema_registry_name = v;
        }
        if let Some(v) = get("SCHEMA_REGISTRY_URL") {
            self.schema_registry_url = Some(v);
        }
        if let Some(v) = get("SCHEMA_REGISTRY_DIR") {
            self.schema_registry_dir = Some(v);
        }
        if let Some(v) = get("DEFAULT_PARTITIONS") {
            self.topic_defaults.partitions = parse_int("DEFAULT_PARTITIONS", &v)?;
        }
        if let Some(v) = get("DEFAULT_REPLICATION_FACTOR") {
            self.topic_defaults.replication_factor = parse_int("DEFAULT_REPLICATION_FACTOR", &v)?;
        }
        if let Some(v) = get("DEFAULT_MIN_INSYNC_REPLICAS") {
            self.topic_defaults.min_insync_replicas =
                parse_int("DEFAULT_MIN_INSYNC_REPLICAS", &v)?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v.to_ascii_lowercase();
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security_protocol == SecurityProtocol::SaslSsl
            && self.sasl_mechanism == SaslMechanism::ScramSha512
        {
            let has_user = self.sasl_username.as_deref().is_some_and(|u| !u.is_empty());
            let has_pass = self.sasl_password.as_deref().is_some_and(|p| !p.is_empty());
            if !has_user || !has_pass {
                return Err(ConfigError::Invalid(
                    "KAFKA_SASL_USERNAME and KAFKA_SASL_PASSWORD are required when using SCRAM-SHA-512"
                        .into(),
                ));
            }
        }

        let defaults = &self.topic_defaults;
        if defaults.partitions < 1 {
            return Err(ConfigError::Invalid(format!(
                "default partitions must be at least 1, got {}",
                defaults.partitions
            )));
        }
        if defaults.replication_factor < 1 {
            return Err(ConfigError::Invalid(format!(
                "default replication factor must be at least 1, got {}",
                defaults.replication_factor
            )));
        }
        if defaults.min_insync_replicas < 1 {
            return Err(ConfigError::Invalid(format!(
                "default min.insync.replicas must be at least 1, got {}",
                defaults.min_insync_replicas
            )));
        }
        if defaults.min_insync_replicas >= defaults.replication_factor {
            return Err(ConfigError::Invalid(format!(
                "min.insync.replicas ({}) must be less than replication.factor ({})",
                defaults.min_insync_replicas, defaults.replication_factor
            )));
        }

        if self.schema_registry_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "schema registry name must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Endpoint family matching the configured protocol and mechanism.
    pub fn security_posture(&self) -> SecurityPosture {
        match (self.security_protocol, self.sasl_mechanism) {
            (SecurityProtocol::Ssl, _) => SecurityPosture::Tls,
            (SecurityProtocol::SaslSsl, SaslMechanism::ScramSha512) => SecurityPosture::SaslScram,
            (SecurityProtocol::SaslSsl, SaslMechanism::OAuthBearer) => SecurityPosture::SaslOAuth,
        }
    }

    /// Explicit bootstrap string if configured, otherwise ask `resolver`.
    pub fn bootstrap_servers(&self, resolver: &dyn BootstrapResolver) -> Result<String, ConfigError> {
        if let Some(bootstrap) = self.kafka_bootstrap.as_deref().filter(|b| !b.is_empty()) {
            debug!(servers = bootstrap, "using configured bootstrap servers");
            return Ok(bootstrap.to_string());
        }

        let cluster_id = self
            .cluster_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(BootstrapError::Unconfigured)?;

        let posture = self.security_posture();
        info!(cluster_id, %posture, "resolving bootstrap servers");
        let servers = resolver.resolve(cluster_id, posture)?;
        info!(servers = %servers, "bootstrap servers resolved");
        Ok(servers)
    }

    /// Kafka client properties for the given bootstrap servers.
    pub fn client_config(&self, bootstrap: &str) -> BTreeMap<String, String> {
        let mut config = BTreeMap::new();
        config.insert("bootstrap.servers".to_string(), bootstrap.to_string());
        config.insert(
            "security.protocol".to_string(),
            self.security_protocol.as_str().to_string(),
        );

        if self.security_protocol == SecurityProtocol::SaslSsl {
            config.insert(
                "sasl.mechanism".to_string(),
                self.sasl_mechanism.as_str().to_string(),
            );
            if self.sasl_mechanism == SaslMechanism::ScramSha512 {
                if let Some(user) = &self.sasl_username {
                    config.insert("sasl.username".to_string(), user.clone());
                }
                if let Some(pass) = &self.sasl_password {
                    config.insert("sasl.password".to_string(), pass.clone());
                }
            }
        }

        if let Some(ca) = &self.ssl_ca_location {
            config.insert("ssl.ca.location".to_string(), ca.clone());
        }
        if let Some(cert) = &self.ssl_cert_location {
            config.insert("ssl.certificate.location".to_string(), cert.clone());
        }
        if let Some(key) = &self.ssl_key_location {
            config.insert("ssl.key.location".to_string(), key.clone());
        }

        config
    }

    /// Copy with secrets masked, safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [&mut copy.sasl_password, &mut copy.ssl_key_location] {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        }
        copy
    }
}

fn parse_int(key: &str, value: &str) -> Result<i32, ConfigError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{}' is not an integer ({})", value, e),
        })
}
