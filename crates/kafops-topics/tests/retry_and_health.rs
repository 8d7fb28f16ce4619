// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Retry discipline and health reporting with injected cluster failures.

use std::time::Duration;

use kafops_core::{RetryPolicy, TopicDefaults};
use kafops_topics::{
    ClusterError, ClusterOp, CreateTopicRequest, HealthStatus, MemoryCluster, TopicAdminClient,
    TopicErrorKind,
};

fn client() -> TopicAdminClient<MemoryCluster> {
    TopicAdminClient::new(MemoryCluster::new(), TopicDefaults::default())
        .with_retry_policy(RetryPolicy::immediate())
}

fn timeout() -> ClusterError {
    ClusterError::Timeout {
        operation: "fetch_metadata".into(),
        timeout: Duration::from_secs(10),
    }
}

#[test]
fn test_list_topics_exhausts_three_attempts() {
    let client = client();
    client
        .cluster()
        .fail_times(ClusterOp::FetchMetadata, timeout(), 3);

    let err = client.list_topics().unwrap_err();
    assert_eq!(err.kind(), TopicErrorKind::Timeout);
    assert_eq!(err.message(), timeout().to_string());
    assert_eq!(client.cluster().calls(ClusterOp::FetchMetadata), 3);
}

#[test]
fn test_list_topics_recovers_before_ceiling() {
    let client = client();
    client.create_topic(&CreateTopicRequest::new("orders")).unwrap();
    let before = client.cluster().calls(ClusterOp::FetchMetadata);

    client
        .cluster()
        .fail_times(ClusterOp::FetchMetadata, ClusterError::Connection("refused".into()), 2);

    assert_eq!(client.list_topics().unwrap(), vec!["orders"]);
    assert_eq!(client.cluster().calls(ClusterOp::FetchMetadata) - before, 3);
}

#[test]
fn test_non_transient_error_uses_one_attempt() {
    let client = client();
    client.cluster().fail_next(
        ClusterOp::FetchMetadata,
        ClusterError::Authorization("DescribeCluster denied".into()),
    );

    let err = client.list_topics().unwrap_err();
    assert_eq!(err.kind(), TopicErrorKind::Unexpected);
    assert_eq!(client.cluster().calls(ClusterOp::FetchMetadata), 1);
}

#[test]
fn test_broker_failure_on_create_is_retried() {
    let client = client();
    client.cluster().fail_next(
        ClusterOp::CreateTopic,
        ClusterError::Broker {
            code: "KafkaStorageError".into(),
            message: "disk unavailable".into(),
        },
    );

    let outcome = client
        .create_topic(&CreateTopicRequest::new("orders"))
        .unwrap();
    assert!(outcome.created());
    assert_eq!(client.cluster().calls(ClusterOp::CreateTopic), 2);
}

#[test]
fn test_create_gives_up_with_creation_failed() {
    let client = client();
    client.cluster().fail_times(
        ClusterOp::CreateTopic,
        ClusterError::Broker {
            code: "KafkaStorageError".into(),
            message: "disk unavailable".into(),
        },
        3,
    );

    let err = client
        .create_topic(&CreateTopicRequest::new("orders"))
        .unwrap_err();
    assert_eq!(err.kind(), TopicErrorKind::TopicCreationFailed);
    assert_eq!(err.operation(), "create_topic");
    assert_eq!(client.cluster().calls(ClusterOp::CreateTopic), 3);
}

#[test]
fn test_health_check_reports_unhealthy_instead_of_failing() {
    let client = client();
    client
        .cluster()
        .fail_next(ClusterOp::FetchMetadata, ClusterError::Connection("all brokers down".into()));

    let report = client.health_check();
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(report.broker_count, 0);
    assert!(report.error.as_deref().unwrap().contains("all brokers down"));
    assert_eq!(client.cluster().calls(ClusterOp::FetchMetadata), 1);
}

#[test]
fn test_health_check_counts_brokers_and_topics() {
    let client = TopicAdminClient::new(MemoryCluster::with_brokers(5), TopicDefaults::default())
        .with_retry_policy(RetryPolicy::immediate());
    client.create_topic(&CreateTopicRequest::new("a")).unwrap();
    client.create_topic(&CreateTopicRequest::new("b")).unwrap();

    let report = client.health_check();
    assert!(report.is_healthy());
    assert_eq!(report.broker_count, 5);
    assert_eq!(report.topic_count, 2);
    assert_eq!(report.brokers[0].host, "broker-1.local");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "healthy");
}
