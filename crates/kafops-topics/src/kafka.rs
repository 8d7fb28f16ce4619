// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `rdkafka`-backed [`ClusterAdmin`].
//!
//! The admin client runs its own polling thread, so each future is driven to
//! completion on the calling thread with `futures::executor::block_on`.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use futures::executor::block_on;
use kafops_core::{Settings, TokenProvider};
use rdkafka::admin::{
    AdminClient, AdminOptions, AlterConfig, NewTopic, ResourceSpecifier, TopicReplication,
};
use rdkafka::client::{ClientContext, OAuthToken};
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use tracing::{debug, error, info, warn};

use crate::cluster::{
    BrokerInfo, ClusterAdmin, ClusterError, ClusterMetadata, ConfigEntry, PartitionMetadata,
    TopicMetadata, TopicSpec,
};
use crate::profiles::TopicConfig;

const CLIENT_ID: &str = "kafops-admin";

/// Client context routing librdkafka logs to `tracing` and serving
/// OAUTHBEARER tokens from a [`TokenProvider`].
pub struct AdminContext {
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl ClientContext for AdminContext {
    const ENABLE_REFRESH_OAUTH_TOKEN: bool = true;

    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        match level {
            RDKafkaLogLevel::Emerg
            | RDKafkaLogLevel::Alert
            | RDKafkaLogLevel::Critical
            | RDKafkaLogLevel::Error => error!(target: "librdkafka", facility = fac, "{}", log_message),
            RDKafkaLogLevel::Warning => warn!(target: "librdkafka", facility = fac, "{}", log_message),
            RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => {
                info!(target: "librdkafka", facility = fac, "{}", log_message)
            }
            RDKafkaLogLevel::Debug => debug!(target: "librdkafka", facility = fac, "{}", log_message),
        }
    }

    fn generate_oauth_token(
        &self,
        _oauthbearer_config: Option<&str>,
    ) -> Result<OAuthToken, Box<dyn StdError>> {
        let provider = self
            .tokens
            .as_ref()
            .ok_or("OAUTHBEARER selected but no token provider configured")?;
        let token = provider.token()?;
        debug!(principal = %token.principal, "supplying OAUTHBEARER token");
        Ok(OAuthToken {
            lifetime_ms: token.expires_at_millis(),
            principal_name: token.principal,
            token: token.value,
        })
    }
}

/// Cluster handle over the Kafka admin API.
pub struct KafkaCluster {
    admin: AdminClient<AdminContext>,
    bootstrap: String,
}

impl KafkaCluster {
    /// Open an admin connection using the security settings of `settings`.
    pub fn connect(
        settings: &Settings,
        bootstrap: &str,
        tokens: Option<Arc<dyn TokenProvider>>,
    ) -> Result<Self, ClusterError> {
        Self::with_properties(&settings.client_config(bootstrap), tokens)
    }

    /// Open an admin connection from raw client properties.
    pub fn with_properties(
        properties: &BTreeMap<String, String>,
        tokens: Option<Arc<dyn TokenProvider>>,
    ) -> Result<Self, ClusterError> {
        let bootstrap = properties
            .get("bootstrap.servers")
            .cloned()
            .ok_or_else(|| ClusterError::InvalidRequest("bootstrap.servers is not set".into()))?;

        let admin: AdminClient<AdminContext> = admin_config(properties)
            .create_with_context(AdminContext { tokens })
            .map_err(|e| ClusterError::Connection(format!("failed to create admin client: {}", e)))?;

        info!(bootstrap = %bootstrap, "admin client created");
        Ok(Self { admin, bootstrap })
    }

    pub fn bootstrap(&self) -> &str {
        &self.bootstrap
    }

    fn options(timeout: Duration) -> AdminOptions {
        AdminOptions::new()
            .operation_timeout(Some(timeout))
            .request_timeout(Some(timeout))
    }
}

/// Client configuration for the admin handle. Topic auto-creation is
/// disabled so metadata requests never create what they ask about.
fn admin_config(properties: &BTreeMap<String, String>) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in properties {
        config.set(key.as_str(), value.as_str());
    }
    config.set("client.id", CLIENT_ID);
    config.set("allow.auto.create.topics", "false");
    config
}

fn map_code(
    code: RDKafkaErrorCode,
    resource: &str,
    operation: &str,
    timeout: Duration,
) -> ClusterError {
    match code {
        RDKafkaErrorCode::TopicAlreadyExists => ClusterError::TopicExists(resource.to_string()),
        RDKafkaErrorCode::UnknownTopicOrPartition | RDKafkaErrorCode::UnknownTopic => {
            ClusterError::UnknownTopic(resource.to_string())
        }
        RDKafkaErrorCode::OperationTimedOut | RDKafkaErrorCode::RequestTimedOut => {
            ClusterError::timeout(operation, timeout)
        }
        RDKafkaErrorCode::BrokerTransportFailure
        | RDKafkaErrorCode::AllBrokersDown
        | RDKafkaErrorCode::NetworkException
        | RDKafkaErrorCode::BrokerNotAvailable => ClusterError::Connection(code.to_string()),
        RDKafkaErrorCode::NotController | RDKafkaErrorCode::LeaderNotAvailable => {
            ClusterError::NotReady(code.to_string())
        }
        RDKafkaErrorCode::InvalidReplicationFactor
        | RDKafkaErrorCode::InvalidPartitions
        | RDKafkaErrorCode::InvalidConfig
        | RDKafkaErrorCode::PolicyViolation => {
            ClusterError::InvalidRequest(format!("{}: {}", resource, code))
        }
        RDKafkaErrorCode::TopicAuthorizationFailed | RDKafkaErrorCode::ClusterAuthorizationFailed => {
            ClusterError::Authorization(format!("{}: {}", resource, code))
        }
        RDKafkaErrorCode::UnsupportedVersion => ClusterError::Unsupported(code.to_string()),
        other => ClusterError::Broker {
            code: format!("{:?}", other),
            message: other.to_string(),
        },
    }
}

fn map_kafka_error(err: KafkaError, resource: &str, operation: &str, timeout: Duration) -> ClusterError {
    match err.rdkafka_error_code() {
        Some(code) => map_code(code, resource, operation, timeout),
        None => ClusterError::Connection(err.to_string()),
    }
}

impl ClusterAdmin for KafkaCluster {
    fn fetch_metadata(
        &self,
        topic: Option<&str>,
        timeout: Duration,
    ) -> Result<ClusterMetadata, ClusterError> {
        let metadata = self
            .admin
            .inner()
            .fetch_metadata(topic, timeout)
            .map_err(|e| map_kafka_error(e, topic.unwrap_or("*"), "fetch_metadata", timeout))?;

        let brokers = metadata
            .brokers()
            .iter()
            .map(|b| BrokerInfo {
                id: b.id(),
                host: b.host().to_string(),
                port: b.port(),
            })
            .collect();

        let topics = metadata
            .topics()
            .iter()
            .map(|t| TopicMetadata {
                name: t.name().to_string(),
                error: t.error().map(|e| RDKafkaErrorCode::from(e).to_string()),
                partitions: t
                    .partitions()
                    .iter()
                    .map(|p| PartitionMetadata {
                        id: p.id(),
                        leader: p.leader(),
                        replicas: p.replicas().to_vec(),
                        isr: p.isr().to_vec(),
                        error: p.error().map(|e| RDKafkaErrorCode::from(e).to_string()),
                    })
                    .collect(),
            })
            .collect();

        Ok(ClusterMetadata { brokers, topics })
    }

    fn create_topic(&self, spec: &TopicSpec, timeout: Duration) -> Result<(), ClusterError> {
        let mut new_topic = NewTopic::new(
            &spec.name,
            spec.partitions,
            TopicReplication::Fixed(spec.replication_factor),
        );
        for (key, value) in &spec.config {
            new_topic = new_topic.set(key, value);
        }

        let results = block_on(
            self.admin
                .create_topics(&[new_topic], &Self::options(timeout)),
        )
        .map_err(|e| map_kafka_error(e, &spec.name, "create_topics", timeout))?;

        for result in results {
            if let Err((topic, code)) = result {
                return Err(map_code(code, &topic, "create_topics", timeout));
            }
        }
        Ok(())
    }

    fn delete_topic(&self, name: &str, timeout: Duration) -> Result<(), ClusterError> {
        let results = block_on(self.admin.delete_topics(&[name], &Self::options(timeout)))
            .map_err(|e| map_kafka_error(e, name, "delete_topics", timeout))?;

        for result in results {
            if let Err((topic, code)) = result {
                return Err(map_code(code, &topic, "delete_topics", timeout));
            }
        }
        Ok(())
    }

    fn describe_config(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Vec<ConfigEntry>, ClusterError> {
        let resource = ResourceSpecifier::Topic(name);
        let results = block_on(
            self.admin
                .describe_configs(&[resource], &Self::options(timeout)),
        )
        .map_err(|e| map_kafka_error(e, name, "describe_configs", timeout))?;

        let mut entries = Vec::new();
        for result in results {
            let resource = result.map_err(|code| map_code(code, name, "describe_configs", timeout))?;
            entries.extend(resource.entries.into_iter().map(|e| ConfigEntry {
                name: e.name,
                value: e.value,
                is_default: e.is_default,
            }));
        }
        Ok(entries)
    }

    fn incremental_alter_config(
        &self,
        _name: &str,
        _changes: &TopicConfig,
        _timeout: Duration,
    ) -> Result<(), ClusterError> {
        Err(ClusterError::Unsupported(
            "IncrementalAlterConfigs is not exposed by the rdkafka admin client".into(),
        ))
    }

    fn alter_config(
        &self,
        name: &str,
        config: &TopicConfig,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        let mut alter = AlterConfig::new(ResourceSpecifier::Topic(name));
        for (key, value) in config {
            alter = alter.set(key, value);
        }

        let results = block_on(self.admin.alter_configs(&[alter], &Self::options(timeout)))
            .map_err(|e| map_kafka_error(e, name, "alter_configs", timeout))?;

        for result in results {
            if let Err((_, code)) = result {
                return Err(map_code(code, name, "alter_configs", timeout));
            }
        }
        Ok(())
    }
}
