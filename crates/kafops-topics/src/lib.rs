// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kafka topic administration.
//!
//! Idempotent create, list, describe, alter, delete and health-check
//! operations over a [`ClusterAdmin`] backend, with topic configuration built
//! from named profiles.
//!
//! # Features
//!
//! - **Profiles**: four built-in configuration profiles with merge and validation
//! - **Idempotency**: create of an existing topic and delete of a missing one succeed
//! - **Retry**: transient failures retried with exponential backoff
//! - **Backends**: [`MemoryCluster`] always, [`KafkaCluster`] with the `kafka` feature
//!
//! # Example
//!
//! ```rust
//! use kafops_core::{RetryPolicy, TopicDefaults};
//! use kafops_topics::{CreateTopicRequest, MemoryCluster, TopicAdminClient};
//!
//! let client = TopicAdminClient::new(MemoryCluster::new(), TopicDefaults::default())
//!     .with_retry_policy(RetryPolicy::immediate());
//!
//! let outcome = client
//!     .create_topic(&CreateTopicRequest::new("orders").profile("low_latency"))
//!     .unwrap();
//! assert!(outcome.created());
//! assert_eq!(client.list_topics().unwrap(), vec!["orders"]);
//! ```

pub mod admin;
pub mod cluster;
pub mod error;
pub mod memory;
pub mod profiles;

#[cfg(feature = "kafka")]
pub mod kafka;

pub use admin::{
    validate_topic_name, AlterMode, AlterOutcome, CreateOutcome, CreateStatus,
    CreateTopicRequest, DeleteOutcome, HealthReport, HealthStatus, PartitionDescription,
    TopicAdminClient, TopicDescription,
};
pub use cluster::{
    BrokerInfo, ClusterAdmin, ClusterError, ClusterMetadata, ConfigEntry, PartitionMetadata,
    TopicMetadata, TopicSpec,
};
pub use error::{TopicAdminError, TopicErrorKind};
pub use memory::{ClusterOp, MemoryCluster};
pub use profiles::{ConfigWarning, ProfileError, TopicConfig, TopicProfile};

#[cfg(feature = "kafka")]
pub use kafka::KafkaCluster;
