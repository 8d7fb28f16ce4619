// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Administrative endpoint abstraction.
//!
//! [`ClusterAdmin`] is the narrow surface the topic client needs from a
//! cluster. Every call is blocking and bounded by the timeout it is given.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::profiles::TopicConfig;

/// Errors reported by a cluster backend.
///
/// Conflicts are distinct variants so callers never inspect message text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("cluster not ready: {0}")]
    NotReady(String),

    #[error("topic already exists: {0}")]
    TopicExists(String),

    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("broker error {code}: {message}")]
    Broker { code: String, message: String },
}

impl ClusterError {
    /// Connection failures, timeouts and "not ready" may clear on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClusterError::Connection(_) | ClusterError::Timeout { .. } | ClusterError::NotReady(_)
        )
    }

    pub(crate) fn timeout(operation: &str, timeout: Duration) -> Self {
        ClusterError::Timeout {
            operation: operation.to_string(),
            timeout,
        }
    }
}

/// Broker endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

/// Partition placement snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionMetadata {
    pub id: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicMetadata {
    pub name: String,
    pub partitions: Vec<PartitionMetadata>,
    /// Topic-level error, e.g. when the requested topic is unknown.
    pub error: Option<String>,
}

impl TopicMetadata {
    /// Replica count of the first partition, 0 for a topic without partitions.
    pub fn replication_factor(&self) -> i32 {
        self.partitions
            .first()
            .map(|p| p.replicas.len() as i32)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterMetadata {
    pub brokers: Vec<BrokerInfo>,
    pub topics: Vec<TopicMetadata>,
}

impl ClusterMetadata {
    /// Metadata for `name` if the cluster reports it without a topic error.
    pub fn topic(&self, name: &str) -> Option<&TopicMetadata> {
        self.topics
            .iter()
            .find(|t| t.name == name && t.error.is_none())
    }
}

/// One topic configuration entry as described by the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub name: String,
    pub value: Option<String>,
    pub is_default: bool,
}

/// Everything needed to create one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    pub config: TopicConfig,
}

/// Blocking administrative operations against one cluster.
pub trait ClusterAdmin: Send + Sync {
    /// Cluster metadata, restricted to one topic when `topic` is given.
    fn fetch_metadata(
        &self,
        topic: Option<&str>,
        timeout: Duration,
    ) -> Result<ClusterMetadata, ClusterError>;

    /// Create a topic; an existing topic yields [`ClusterError::TopicExists`].
    fn create_topic(&self, spec: &TopicSpec, timeout: Duration) -> Result<(), ClusterError>;

    /// Delete a topic; a missing topic yields [`ClusterError::UnknownTopic`].
    fn delete_topic(&self, name: &str, timeout: Duration) -> Result<(), ClusterError>;

    /// Every configuration entry of a topic, defaults included.
    fn describe_config(&self, name: &str, timeout: Duration)
        -> Result<Vec<ConfigEntry>, ClusterError>;

    /// Set the given keys, leaving every other key untouched.
    ///
    /// Backends without incremental alteration return
    /// [`ClusterError::Unsupported`].
    fn incremental_alter_config(
        &self,
        name: &str,
        changes: &TopicConfig,
        timeout: Duration,
    ) -> Result<(), ClusterError>;

    /// Replace the topic's whole non-default configuration with `config`.
    fn alter_config(
        &self,
        name: &str,
        config: &TopicConfig,
        timeout: Duration,
    ) -> Result<(), ClusterError>;
}

impl<T: ClusterAdmin + ?Sized> ClusterAdmin for Box<T> {
    fn fetch_metadata(
        &self,
        topic: Option<&str>,
        timeout: Duration,
    ) -> Result<ClusterMetadata, ClusterError> {
        (**self).fetch_metadata(topic, timeout)
    }

    fn create_topic(&self, spec: &TopicSpec, timeout: Duration) -> Result<(), ClusterError> {
        (**self).create_topic(spec, timeout)
    }

    fn delete_topic(&self, name: &str, timeout: Duration) -> Result<(), ClusterError> {
        (**self).delete_topic(name, timeout)
    }

    fn describe_config(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Vec<ConfigEntry>, ClusterError> {
        (**self).describe_config(name, timeout)
    }

    fn incremental_alter_config(
        &self,
        name: &str,
        changes: &TopicConfig,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        (**self).incremental_alter_config(name, changes, timeout)
    }

    fn alter_config(
        &self,
        name: &str,
        config: &TopicConfig,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        (**self).alter_config(name, config, timeout)
    }
}

impl<T: ClusterAdmin + ?Sized> ClusterAdmin for Arc<T> {
    fn fetch_metadata(
        &self,
        topic: Option<&str>,
        timeout: Duration,
    ) -> Result<ClusterMetadata, ClusterError> {
        (**self).fetch_metadata(topic, timeout)
    }

    fn create_topic(&self, spec: &TopicSpec, timeout: Duration) -> Result<(), ClusterError> {
        (**self).create_topic(spec, timeout)
    }

    fn delete_topic(&self, name: &str, timeout: Duration) -> Result<(), ClusterError> {
        (**self).delete_topic(name, timeout)
    }

    fn describe_config(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Vec<ConfigEntry>, ClusterError> {
        (**self).describe_config(name, timeout)
    }

    fn incremental_alter_config(
        &self,
        name: &str,
        changes: &TopicConfig,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        (**self).incremental_alter_config(name, changes, timeout)
    }

    fn alter_config(
        &self,
        name: &str,
        config: &TopicConfig,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        (**self).alter_config(name, config, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(id: i32, replicas: &[i32]) -> PartitionMetadata {
        PartitionMetadata {
            id,
            leader: replicas[0],
            replicas: replicas.to_vec(),
            isr: replicas.to_vec(),
            error: None,
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(ClusterError::Connection("refused".into()).is_transient());
        assert!(ClusterError::timeout("create", Duration::from_secs(30)).is_transient());
        assert!(ClusterError::NotReady("controller moving".into()).is_transient());
        assert!(!ClusterError::TopicExists("t".into()).is_transient());
        assert!(!ClusterError::UnknownTopic("t".into()).is_transient());
        assert!(!ClusterError::Unsupported("x".into()).is_transient());
    }

    #[test]
    fn test_replication_factor_from_first_partition() {
        let topic = TopicMetadata {
            name: "orders".into(),
            partitions: vec![partition(0, &[1, 2, 3]), partition(1, &[2, 3])],
            error: None,
        };
        assert_eq!(topic.replication_factor(), 3);

        let empty = TopicMetadata {
            name: "empty".into(),
            partitions: Vec::new(),
            error: None,
        };
        assert_eq!(empty.replication_factor(), 0);
    }

    #[test]
    fn test_topic_lookup_skips_errored_entries() {
        let metadata = ClusterMetadata {
            brokers: Vec::new(),
            topics: vec![TopicMetadata {
                name: "ghost".into(),
                partitions: Vec::new(),
                error: Some("UnknownTopicOrPartition".into()),
            }],
        };
        assert!(metadata.topic("ghost").is_none());
    }

    #[test]
    fn test_shared_cluster_sees_writes() {
        let shared = Arc::new(crate::memory::MemoryCluster::new());
        let handle = Arc::clone(&shared);
        let spec = TopicSpec {
            name: "orders".into(),
            partitions: 1,
            replication_factor: 1,
            config: TopicConfig::new(),
        };
        handle.create_topic(&spec, Duration::from_secs(1)).unwrap();
        assert_eq!(shared.topic_names(), vec!["orders"]);
    }
}
