// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process cluster for tests and local experiments.
//!
//! Behaves like a small broker set: replica placement is round-robin over
//! the brokers, configuration entries not set on a topic report broker
//! defaults. Failures can be queued per operation and every call is counted.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cluster::{
    BrokerInfo, ClusterAdmin, ClusterError, ClusterMetadata, ConfigEntry, PartitionMetadata,
    TopicMetadata, TopicSpec,
};
use crate::profiles::TopicConfig;

/// Operations of [`ClusterAdmin`], used for failure injection and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterOp {
    FetchMetadata,
    CreateTopic,
    DeleteTopic,
    DescribeConfig,
    IncrementalAlterConfig,
    AlterConfig,
}

/// Broker-side values reported for keys a topic does not override.
const BROKER_DEFAULTS: &[(&str, &str)] = &[
    ("cleanup.policy", "delete"),
    ("compression.type", "producer"),
    ("max.message.bytes", "1048588"),
    ("min.insync.replicas", "1"),
    ("retention.bytes", "-1"),
    ("retention.ms", "604800000"),
    ("segment.bytes", "1073741824"),
    ("unclean.leader.election.enable", "false"),
];

#[derive(Debug, Clone)]
struct StoredTopic {
    partitions: i32,
    replication_factor: i32,
    config: TopicConfig,
}

#[derive(Debug)]
struct State {
    brokers: Vec<BrokerInfo>,
    topics: BTreeMap<String, StoredTopic>,
    failures: HashMap<ClusterOp, VecDeque<ClusterError>>,
    calls: HashMap<ClusterOp, u32>,
    incremental_alter: bool,
}

/// Thread-safe in-memory [`ClusterAdmin`].
#[derive(Debug)]
pub struct MemoryCluster {
    state: Mutex<State>,
}

impl MemoryCluster {
    /// Three brokers, no topics.
    pub fn new() -> Self {
        Self::with_brokers(3)
    }

    /// `count` brokers with ids starting at 1.
    pub fn with_brokers(count: i32) -> Self {
        let brokers = (1..=count)
            .map(|id| BrokerInfo {
                id,
                host: format!("broker-{}.local", id),
                port: 9092,
            })
            .collect();

        Self {
            state: Mutex::new(State {
                brokers,
                topics: BTreeMap::new(),
                failures: HashMap::new(),
                calls: HashMap::new(),
                incremental_alter: true,
            }),
        }
    }

    /// Make [`ClusterAdmin::incremental_alter_config`] report `Unsupported`.
    pub fn without_incremental_alter(self) -> Self {
        self.state.lock().incremental_alter = false;
        self
    }

    /// Insert a topic directly, bypassing counters and injected failures.
    pub fn seed_topic(&self, spec: TopicSpec) {
        self.state.lock().topics.insert(
            spec.name,
            StoredTopic {
                partitions: spec.partitions,
                replication_factor: spec.replication_factor,
                config: spec.config,
            },
        );
    }

    /// Queue an error returned by the next call of `op`.
    pub fn fail_next(&self, op: ClusterOp, error: ClusterError) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Queue `times` copies of `error` for `op`.
    pub fn fail_times(&self, op: ClusterOp, error: ClusterError, times: usize) {
        for _ in 0..times {
            self.fail_next(op, error.clone());
        }
    }

    /// Number of calls made to `op`, failed ones included.
    pub fn calls(&self, op: ClusterOp) -> u32 {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Current non-default configuration of a topic.
    pub fn topic_config(&self, name: &str) -> Option<TopicConfig> {
        self.state.lock().topics.get(name).map(|t| t.config.clone())
    }

    pub fn topic_names(&self) -> Vec<String> {
        self.state.lock().topics.keys().cloned().collect()
    }

    fn enter(state: &mut State, op: ClusterOp) -> Result<(), ClusterError> {
        *state.calls.entry(op).or_insert(0) += 1;
        match state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => {
                debug!(?op, error = %err, "injected failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn partitions_for(brokers: &[BrokerInfo], topic: &StoredTopic) -> Vec<PartitionMetadata> {
        let ids: Vec<i32> = brokers.iter().map(|b| b.id).collect();
        (0..topic.partitions)
            .map(|p| {
                let replicas: Vec<i32> = if ids.is_empty() {
                    Vec::new()
                } else {
                    (0..topic.replication_factor)
                        .map(|i| ids[(p + i) as usize % ids.len()])
                        .collect()
                };
                PartitionMetadata {
                    id: p,
                    leader: replicas.first().copied().unwrap_or(-1),
                    isr: replicas.clone(),
                    replicas,
                    error: None,
                }
            })
            .collect()
    }

    fn metadata_for(state: &State, name: &str, topic: &StoredTopic) -> TopicMetadata {
        TopicMetadata {
            name: name.to_string(),
            partitions: Self::partitions_for(&state.brokers, topic),
            error: None,
        }
    }
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterAdmin for MemoryCluster {
    fn fetch_metadata(
        &self,
        topic: Option<&str>,
        _timeout: Duration,
    ) -> Result<ClusterMetadata, ClusterError> {
        let mut state = self.state.lock();
        Self::enter(&mut state, ClusterOp::FetchMetadata)?;

        let topics = match topic {
            Some(name) => match state.topics.get(name) {
                Some(stored) => vec![Self::metadata_for(&state, name, stored)],
                None => vec![TopicMetadata {
                    name: name.to_string(),
                    partitions: Vec::new(),
                    error: Some("UnknownTopicOrPartition".to_string()),
                }],
            },
            None => state
                .topics
                .iter()
                .map(|(name, stored)| Self::metadata_for(&state, name, stored))
                .collect(),
        };

        Ok(ClusterMetadata {
            brokers: state.brokers.clone(),
            topics,
        })
    }

    fn create_topic(&self, spec: &TopicSpec, _timeout: Duration) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        Self::enter(&mut state, ClusterOp::CreateTopic)?;

        if state.topics.contains_key(&spec.name) {
            return Err(ClusterError::TopicExists(spec.name.clone()));
        }
        if spec.partitions < 1 {
            return Err(ClusterError::InvalidRequest(format!(
                "invalid partition count {}",
                spec.partitions
            )));
        }
        if spec.replication_factor < 1 || spec.replication_factor as usize > state.brokers.len() {
            return Err(ClusterError::InvalidRequest(format!(
                "replication factor {} larger than available brokers ({})",
                spec.replication_factor,
                state.brokers.len()
            )));
        }

        state.topics.insert(
            spec.name.clone(),
            StoredTopic {
                partitions: spec.partitions,
                replication_factor: spec.replication_factor,
                config: spec.config.clone(),
            },
        );
        Ok(())
    }

    fn delete_topic(&self, name: &str, _timeout: Duration) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        Self::enter(&mut state, ClusterOp::DeleteTopic)?;

        match state.topics.remove(name) {
            Some(_) => Ok(()),
            None => Err(ClusterError::UnknownTopic(name.to_string())),
        }
    }

    fn describe_config(
        &self,
        name: &str,
        _timeout: Duration,
    ) -> Result<Vec<ConfigEntry>, ClusterError> {
        let mut state = self.state.lock();
        Self::enter(&mut state, ClusterOp::DescribeConfig)?;

        let topic = state
            .topics
            .get(name)
            .ok_or_else(|| ClusterError::UnknownTopic(name.to_string()))?;

        let mut entries: BTreeMap<String, ConfigEntry> = BROKER_DEFAULTS
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    ConfigEntry {
                        name: k.to_string(),
                        value: Some(v.to_string()),
                        is_default: true,
                    },
                )
            })
            .collect();

        for (key, value) in &topic.config {
            entries.insert(
                key.clone(),
                ConfigEntry {
                    name: key.clone(),
                    value: Some(value.clone()),
                    is_default: false,
                },
            );
        }

        Ok(entries.into_values().collect())
    }

    fn incremental_alter_config(
        &self,
        name: &str,
        changes: &TopicConfig,
        _timeout: Duration,
    ) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        Self::enter(&mut state, ClusterOp::IncrementalAlterConfig)?;

        if !state.incremental_alter {
            return Err(ClusterError::Unsupported(
                "IncrementalAlterConfigs".to_string(),
            ));
        }

        let topic = state
            .topics
            .get_mut(name)
            .ok_or_else(|| ClusterError::UnknownTopic(name.to_string()))?;
        topic
            .config
            .extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn alter_config(
        &self,
        name: &str,
        config: &TopicConfig,
        _timeout: Duration,
    ) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        Self::enter(&mut state, ClusterOp::AlterConfig)?;

        let topic = state
            .topics
            .get_mut(name)
            .ok_or_else(|| ClusterError::UnknownTopic(name.to_string()))?;
        topic.config = config.clone();
        Ok(())
    }
}
