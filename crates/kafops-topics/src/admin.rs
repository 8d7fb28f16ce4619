// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Idempotent topic lifecycle operations.
//!
//! Every operation follows the same shape: local validation first, then an
//! existence check and the mutating call inside one retry scope. Existence
//! conflicts reported by the cluster are idempotency signals, never errors.

use std::time::{Duration, Instant};

use kafops_core::{RetryPolicy, Settings, TopicDefaults};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cluster::{BrokerInfo, ClusterAdmin, ClusterError, TopicMetadata, TopicSpec};
use crate::error::{TopicAdminError, TopicErrorKind};
use crate::profiles::{
    self, ConfigWarning, TopicConfig, DEFAULT_PROFILE, MIN_INSYNC_REPLICAS,
};

/// Acknowledgement wait for create, alter and delete.
pub const MUTATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for list and describe.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Metadata timeout used by [`TopicAdminClient::health_check`].
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest legal topic name.
pub const MAX_TOPIC_NAME_LEN: usize = 249;

/// Prefix reserved for broker-internal topics.
pub const INTERNAL_TOPIC_PREFIX: &str = "__";

/// Check a topic name against broker naming rules.
pub fn validate_topic_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Topic name cannot be empty".to_string());
    }
    if name.len() > MAX_TOPIC_NAME_LEN {
        return Err(format!(
            "Topic name too long: {} characters (max {})",
            name.len(),
            MAX_TOPIC_NAME_LEN
        ));
    }
    if name == "." || name == ".." {
        return Err(format!("Topic name cannot be '{}'", name));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!(
            "Topic name '{}' contains invalid character '{}' (allowed: a-z, A-Z, 0-9, '.', '_', '-')",
            name, bad
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Requests and results
// ---------------------------------------------------------------------------

/// Parameters of [`TopicAdminClient::create_topic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTopicRequest {
    pub name: String,
    /// Falls back to the configured default when `None`.
    pub partitions: Option<i32>,
    /// Falls back to the configured default when `None`.
    pub replication_factor: Option<i32>,
    pub profile: String,
    pub overrides: TopicConfig,
}

impl CreateTopicRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: None,
            replication_factor: None,
            profile: DEFAULT_PROFILE.to_string(),
            overrides: TopicConfig::new(),
        }
    }

    pub fn partitions(mut self, partitions: i32) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn replication_factor(mut self, replication_factor: i32) -> Self {
        self.replication_factor = Some(replication_factor);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Add one configuration override.
    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn overrides(mut self, overrides: TopicConfig) -> Self {
        self.overrides.extend(overrides);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStatus {
    Created,
    AlreadyExisted,
}

/// Result of [`TopicAdminClient::create_topic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub status: CreateStatus,
    /// Topic definition that was (or would have been) submitted.
    pub spec: TopicSpec,
    pub warnings: Vec<ConfigWarning>,
}

impl CreateOutcome {
    pub fn created(&self) -> bool {
        self.status == CreateStatus::Created
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlterMode {
    Incremental,
    Full,
}

/// Result of [`TopicAdminClient::alter_topic_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlterOutcome {
    pub topic: String,
    pub mode: AlterMode,
    /// Keys submitted to the cluster.
    pub applied: TopicConfig,
    pub warnings: Vec<ConfigWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionDescription {
    pub partition: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
    pub error: Option<String>,
}

/// Point-in-time description of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicDescription {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    /// Non-default configuration only.
    pub config: TopicConfig,
    pub partition_details: Vec<PartitionDescription>,
}

impl TopicDescription {
    fn from_metadata(topic: &TopicMetadata, config: TopicConfig) -> Self {
        Self {
            name: topic.name.clone(),
            partitions: topic.partitions.len() as i32,
            replication_factor: topic.replication_factor(),
            config,
            partition_details: topic
                .partitions
                .iter()
                .map(|p| PartitionDescription {
                    partition: p.id,
                    leader: p.leader,
                    replicas: p.replicas.clone(),
                    isr: p.isr.clone(),
                    error: p.error.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of [`TopicAdminClient::health_check`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub broker_count: usize,
    pub topic_count: usize,
    pub response_time_ms: f64,
    pub brokers: Vec<BrokerInfo>,
    pub error: Option<String>,
}

impl HealthReport {
    /// Report for a cluster that could not be reached at all.
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            broker_count: 0,
            topic_count: 0,
            response_time_ms: 0.0,
            brokers: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// TopicAdminClient
// ---------------------------------------------------------------------------

/// Topic lifecycle client bound to one opened cluster handle.
pub struct TopicAdminClient<C: ClusterAdmin> {
    cluster: C,
    defaults: TopicDefaults,
    mutation_retry: RetryPolicy,
    query_retry: RetryPolicy,
}

impl<C: ClusterAdmin> TopicAdminClient<C> {
    pub fn new(cluster: C, defaults: TopicDefaults) -> Self {
        Self {
            cluster,
            defaults,
            mutation_retry: RetryPolicy::mutation(),
            query_retry: RetryPolicy::query(),
        }
    }

    /// Client using the topic defaults of `settings`.
    pub fn from_settings(cluster: C, settings: &Settings) -> Self {
        Self::new(cluster, settings.topic_defaults)
    }

    /// Replace the policies used for mutating and read-only calls.
    pub fn with_retry_policies(mut self, mutation: RetryPolicy, query: RetryPolicy) -> Self {
        self.mutation_retry = mutation;
        self.query_retry = query;
        self
    }

    /// Use one policy for every call.
    pub fn with_retry_policy(self, policy: RetryPolicy) -> Self {
        self.with_retry_policies(policy, policy)
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn defaults(&self) -> &TopicDefaults {
        &self.defaults
    }

    /// Resolve, merge and validate a create request without touching the
    /// cluster.
    pub fn prepare_topic(
        &self,
        request: &CreateTopicRequest,
    ) -> Result<(TopicSpec, Vec<ConfigWarning>), TopicAdminError> {
        const OP: &str = "create_topic";
        let name = request.name.as_str();

        validate_topic_name(name).map_err(|msg| {
            TopicAdminError::new(TopicErrorKind::InvalidArgument, OP, msg).on(name)
        })?;

        let partitions = request.partitions.unwrap_or(self.defaults.partitions);
        let replication_factor = request
            .replication_factor
            .unwrap_or(self.defaults.replication_factor);

        if partitions < 1 {
            return Err(TopicAdminError::new(
                TopicErrorKind::InvalidArgument,
                OP,
                format!("Partitions must be at least 1, got {}", partitions),
            )
            .on(name));
        }
        if replication_factor < 1 {
            return Err(TopicAdminError::new(
                TopicErrorKind::InvalidArgument,
                OP,
                format!("Replication factor must be at least 1, got {}", replication_factor),
            )
            .on(name));
        }

        let profile = profiles::get_profile(&request.profile)
            .map_err(|e| TopicAdminError::from_profile(e, OP, name))?;
        let mut config = profiles::merge_configs(&profile, &request.overrides);
        self.fill_defaults(&mut config);

        let warnings = profiles::validate_config(&config, replication_factor)
            .map_err(|e| TopicAdminError::from_profile(e, OP, name))?;

        Ok((
            TopicSpec {
                name: name.to_string(),
                partitions,
                replication_factor,
                config,
            },
            warnings,
        ))
    }

    /// Set `min.insync.replicas` from the defaults when neither the profile
    /// nor the overrides define it.
    fn fill_defaults(&self, config: &mut TopicConfig) {
        config
            .entry(MIN_INSYNC_REPLICAS.to_string())
            .or_insert_with(|| self.defaults.min_insync_replicas.to_string());
    }

    /// Create a topic from a profile plus overrides.
    ///
    /// An existing topic is left untouched and reported as
    /// [`CreateStatus::AlreadyExisted`], whatever its configuration.
    pub fn create_topic(
        &self,
        request: &CreateTopicRequest,
    ) -> Result<CreateOutcome, TopicAdminError> {
        const OP: &str = "create_topic";
        let (spec, warnings) = self.prepare_topic(request)?;
        let name = spec.name.as_str();

        let outcome = |status| CreateOutcome {
            status,
            spec: spec.clone(),
            warnings: warnings.clone(),
        };

        let result = self.mutation_retry.run(OP, |_ctx| {
            if self.lookup(name, QUERY_TIMEOUT, OP)?.is_some() {
                info!(topic = name, "topic already exists, skipping creation");
                return Ok(outcome(CreateStatus::AlreadyExisted));
            }

            match self.cluster.create_topic(&spec, MUTATION_TIMEOUT) {
                Ok(()) => {
                    info!(
                        topic = name,
                        partitions = spec.partitions,
                        replication_factor = spec.replication_factor,
                        profile = %request.profile,
                        "topic created"
                    );
                    Ok(outcome(CreateStatus::Created))
                }
                Err(ClusterError::TopicExists(_)) => {
                    info!(topic = name, "topic created concurrently, treating as existing");
                    Ok(outcome(CreateStatus::AlreadyExisted))
                }
                Err(ClusterError::Broker { code, message }) => Err(TopicAdminError::new(
                    TopicErrorKind::TopicCreationFailed,
                    OP,
                    format!("broker rejected creation ({}): {}", code, message),
                )
                .on(name)),
                Err(err) => Err(TopicAdminError::from_cluster(err, OP, name)),
            }
        });

        if let Err(err) = &result {
            error!(topic = name, error_kind = %err.kind(), error = %err, "topic creation failed");
        }
        result
    }

    /// Sorted user topic names, internal `__` topics excluded.
    pub fn list_topics(&self) -> Result<Vec<String>, TopicAdminError> {
        const OP: &str = "list_topics";

        let result: Result<Vec<String>, TopicAdminError> = self.query_retry.run(OP, |_ctx| {
            let metadata = self
                .cluster
                .fetch_metadata(None, QUERY_TIMEOUT)
                .map_err(|e| TopicAdminError::from_cluster(e, OP, "*"))?;

            let mut names: Vec<String> = metadata
                .topics
                .into_iter()
                .filter(|t| t.error.is_none() && !t.name.starts_with(INTERNAL_TOPIC_PREFIX))
                .map(|t| t.name)
                .collect();
            names.sort();
            Ok(names)
        });

        match &result {
            Ok(names) => info!(count = names.len(), "listed topics"),
            Err(err) => error!(error_kind = %err.kind(), error = %err, "failed to list topics"),
        }
        result
    }

    /// Partition layout plus non-default configuration of a topic.
    pub fn describe_topic(&self, name: &str) -> Result<TopicDescription, TopicAdminError> {
        const OP: &str = "describe_topic";
        require_name(name, OP)?;

        let topic = self.query_retry.run(OP, |_ctx| {
            self.lookup(name, QUERY_TIMEOUT, OP)?
                .ok_or_else(|| TopicAdminError::not_found(OP, name))
        })?;

        let config = match self.non_default_config(name, QUERY_TIMEOUT) {
            Ok(config) => config,
            Err(err) => {
                warn!(topic = name, error = %err, "could not fetch topic config, returning partitions only");
                TopicConfig::new()
            }
        };

        let description = TopicDescription::from_metadata(&topic, config);
        info!(
            topic = name,
            partitions = description.partitions,
            replication_factor = description.replication_factor,
            "described topic"
        );
        Ok(description)
    }

    /// Apply configuration changes to an existing topic.
    ///
    /// Uses incremental alteration; when the cluster does not support it,
    /// submits the current non-default configuration merged with `changes`
    /// so unrelated overrides survive.
    pub fn alter_topic_config(
        &self,
        name: &str,
        changes: &TopicConfig,
    ) -> Result<AlterOutcome, TopicAdminError> {
        const OP: &str = "alter_topic_config";
        require_name(name, OP)?;

        if changes.is_empty() {
            return Err(TopicAdminError::new(
                TopicErrorKind::InvalidArgument,
                OP,
                "No configuration changes given",
            )
            .on(name));
        }

        let result = self.mutation_retry.run(OP, |_ctx| {
            let topic = self
                .lookup(name, QUERY_TIMEOUT, OP)?
                .ok_or_else(|| TopicAdminError::not_found(OP, name))?;
            let warnings = validate_changes(changes, topic.replication_factor())
                .map_err(|e| TopicAdminError::from_profile(e, OP, name))?;

            match self
                .cluster
                .incremental_alter_config(name, changes, MUTATION_TIMEOUT)
            {
                Ok(()) => Ok(AlterOutcome {
                    topic: name.to_string(),
                    mode: AlterMode::Incremental,
                    applied: changes.clone(),
                    warnings,
                }),
                Err(ClusterError::Unsupported(what)) => {
                    warn!(topic = name, unsupported = %what, "incremental alter unsupported, falling back to full alter");
                    let current = self
                        .non_default_config(name, MUTATION_TIMEOUT)
                        .map_err(|e| TopicAdminError::from_cluster(e, OP, name))?;
                    let merged = profiles::merge_configs(&current, changes);
                    self.cluster
                        .alter_config(name, &merged, MUTATION_TIMEOUT)
                        .map_err(|e| TopicAdminError::from_cluster(e, OP, name))?;
                    Ok(AlterOutcome {
                        topic: name.to_string(),
                        mode: AlterMode::Full,
                        applied: merged,
                        warnings,
                    })
                }
                Err(err) => Err(TopicAdminError::from_cluster(err, OP, name)),
            }
        });

        match &result {
            Ok(outcome) => info!(
                topic = name,
                mode = ?outcome.mode,
                keys = ?changes.keys().collect::<Vec<_>>(),
                "topic configuration altered"
            ),
            Err(err) => error!(topic = name, error_kind = %err.kind(), error = %err, "failed to alter topic"),
        }
        result
    }

    /// Delete a topic; a missing topic is success.
    pub fn delete_topic(&self, name: &str) -> Result<DeleteOutcome, TopicAdminError> {
        const OP: &str = "delete_topic";
        require_name(name, OP)?;

        let result = self.mutation_retry.run(OP, |_ctx| {
            if self.lookup(name, QUERY_TIMEOUT, OP)?.is_none() {
                info!(topic = name, "topic does not exist, nothing to delete");
                return Ok(DeleteOutcome::NotFound);
            }

            match self.cluster.delete_topic(name, MUTATION_TIMEOUT) {
                Ok(()) => {
                    info!(topic = name, "topic deleted");
                    Ok(DeleteOutcome::Deleted)
                }
                Err(ClusterError::UnknownTopic(_)) => {
                    info!(topic = name, "topic deleted concurrently");
                    Ok(DeleteOutcome::NotFound)
                }
                Err(err) => Err(TopicAdminError::from_cluster(err, OP, name)),
            }
        });

        if let Err(err) = &result {
            error!(topic = name, error_kind = %err.kind(), error = %err, "failed to delete topic");
        }
        result
    }

    /// Query the cluster once. Never fails; problems land in the report.
    pub fn health_check(&self) -> HealthReport {
        let started = Instant::now();

        match self.cluster.fetch_metadata(None, HEALTH_TIMEOUT) {
            Ok(metadata) => {
                let report = HealthReport {
                    status: HealthStatus::Healthy,
                    broker_count: metadata.brokers.len(),
                    topic_count: metadata.topics.len(),
                    response_time_ms: elapsed_ms(started),
                    brokers: metadata.brokers,
                    error: None,
                };
                info!(
                    brokers = report.broker_count,
                    topics = report.topic_count,
                    response_time_ms = report.response_time_ms,
                    "cluster healthy"
                );
                report
            }
            Err(err) => {
                let report = HealthReport {
                    response_time_ms: elapsed_ms(started),
                    ..HealthReport::unreachable(err.to_string())
                };
                error!(error = %err, response_time_ms = report.response_time_ms, "cluster health check failed");
                report
            }
        }
    }

    /// Find `name` in the full topic listing. A metadata request naming a
    /// missing topic can auto-create it on brokers with
    /// `auto.create.topics.enable=true`.
    fn lookup(
        &self,
        name: &str,
        timeout: Duration,
        operation: &'static str,
    ) -> Result<Option<TopicMetadata>, TopicAdminError> {
        let metadata = self
            .cluster
            .fetch_metadata(None, timeout)
            .map_err(|e| TopicAdminError::from_cluster(e, operation, name))?;
        Ok(metadata.topic(name).cloned())
    }

    fn non_default_config(&self, name: &str, timeout: Duration) -> Result<TopicConfig, ClusterError> {
        let entries = self.cluster.describe_config(name, timeout)?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.is_default)
            .filter_map(|e| e.value.map(|v| (e.name, v)))
            .collect())
    }
}

fn require_name(name: &str, operation: &'static str) -> Result<(), TopicAdminError> {
    if name.is_empty() {
        return Err(TopicAdminError::new(
            TopicErrorKind::InvalidArgument,
            operation,
            "Topic name cannot be empty",
        ));
    }
    Ok(())
}

/// Validate only the keys a change touches.
fn validate_changes(
    changes: &TopicConfig,
    replication_factor: i32,
) -> Result<Vec<ConfigWarning>, profiles::ProfileError> {
    if changes.contains_key(MIN_INSYNC_REPLICAS) {
        profiles::check_min_insync(changes, replication_factor)?;
    }
    if changes.contains_key(profiles::COMPRESSION_TYPE) {
        profiles::check_compression(changes)?;
    }
    Ok(profiles::check_unclean_election(changes).into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCluster;

    fn client() -> TopicAdminClient<MemoryCluster> {
        TopicAdminClient::new(MemoryCluster::new(), TopicDefaults::default())
            .with_retry_policy(RetryPolicy::immediate())
    }

    #[test]
    fn test_topic_name_rules() {
        assert!(validate_topic_name("orders").is_ok());
        assert!(validate_topic_name("orders.v1_raw-events").is_ok());
        assert!(validate_topic_name(&"a".repeat(249)).is_ok());

        assert!(validate_topic_name("").is_err());
        assert!(validate_topic_name(&"a".repeat(250)).is_err());
        assert!(validate_topic_name("orders/v1").is_err());
        assert!(validate_topic_name("with space").is_err());
        assert!(validate_topic_name("..").is_err());
    }

    #[test]
    fn test_prepare_applies_defaults_and_profile() {
        let (spec, warnings) = client()
            .prepare_topic(&CreateTopicRequest::new("orders"))
            .unwrap();
        assert_eq!(spec.partitions, 6);
        assert_eq!(spec.replication_factor, 3);
        assert_eq!(spec.config["compression.type"], "snappy");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_fill_defaults_sets_missing_min_isr() {
        let defaults = TopicDefaults {
            partitions: 1,
            replication_factor: 5,
            min_insync_replicas: 3,
        };
        let client = TopicAdminClient::new(MemoryCluster::new(), defaults);

        let mut config = TopicConfig::new();
        config.insert("retention.ms".into(), "1".into());
        client.fill_defaults(&mut config);
        assert_eq!(config[MIN_INSYNC_REPLICAS], "3");
        assert_eq!(config["retention.ms"], "1");

        let mut explicit = TopicConfig::new();
        explicit.insert(MIN_INSYNC_REPLICAS.into(), "4".into());
        client.fill_defaults(&mut explicit);
        assert_eq!(explicit[MIN_INSYNC_REPLICAS], "4");
    }

    #[test]
    fn test_profile_min_isr_wins_over_defaults() {
        let defaults = TopicDefaults {
            partitions: 1,
            replication_factor: 5,
            min_insync_replicas: 3,
        };
        let client = TopicAdminClient::new(MemoryCluster::new(), defaults);
        let (spec, _) = client
            .prepare_topic(&CreateTopicRequest::new("orders"))
            .unwrap();
        assert_eq!(spec.config[MIN_INSYNC_REPLICAS], "2");
    }

    #[test]
    fn test_prepare_rejects_bad_arguments() {
        let c = client();
        let kind = |req: CreateTopicRequest| c.prepare_topic(&req).unwrap_err().kind();

        assert_eq!(kind(CreateTopicRequest::new("")), TopicErrorKind::InvalidArgument);
        assert_eq!(
            kind(CreateTopicRequest::new("t").partitions(0)),
            TopicErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(CreateTopicRequest::new("t").replication_factor(0)),
            TopicErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(CreateTopicRequest::new("t").profile("nope")),
            TopicErrorKind::ProfileNotFound
        );
        assert_eq!(
            kind(CreateTopicRequest::new("t").replication_factor(2)),
            TopicErrorKind::InvalidConfiguration
        );
        assert_eq!(
            kind(CreateTopicRequest::new("t").config("compression.type", "brotli")),
            TopicErrorKind::InvalidConfiguration
        );
    }

    #[test]
    fn test_validation_failure_never_reaches_cluster() {
        let c = client();
        let err = c
            .create_topic(&CreateTopicRequest::new("t").config("min.insync.replicas", "3"))
            .unwrap_err();
        assert_eq!(err.kind(), TopicErrorKind::InvalidConfiguration);
        assert_eq!(c.cluster().calls(crate::memory::ClusterOp::FetchMetadata), 0);
        assert_eq!(c.cluster().calls(crate::memory::ClusterOp::CreateTopic), 0);
    }

    #[test]
    fn test_validate_changes_only_checks_touched_keys() {
        let compression_only =
            TopicConfig::from([("compression.type".to_string(), "gzip".to_string())]);
        assert!(validate_changes(&compression_only, 1).is_ok());

        let isr = TopicConfig::from([("min.insync.replicas".to_string(), "3".to_string())]);
        assert!(validate_changes(&isr, 3).is_err());
    }

    #[test]
    fn test_health_report_on_empty_cluster() {
        let report = client().health_check();
        assert!(report.is_healthy());
        assert_eq!(report.broker_count, 3);
        assert_eq!(report.topic_count, 0);
        assert!(report.response_time_ms >= 0.0);
        assert!(report.error.is_none());
    }
}
