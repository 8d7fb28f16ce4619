// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic administration errors.

use std::fmt;

use kafops_core::Retryable;
use thiserror::Error;

use crate::cluster::ClusterError;
use crate::profiles::ProfileError;

/// What went wrong, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicErrorKind {
    InvalidArgument,
    InvalidConfiguration,
    ProfileNotFound,
    TopicNotFound,
    TopicCreationFailed,
    Timeout,
    Connection,
    NotReady,
    Unexpected,
}

impl TopicErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicErrorKind::InvalidArgument => "invalid_argument",
            TopicErrorKind::InvalidConfiguration => "invalid_configuration",
            TopicErrorKind::ProfileNotFound => "profile_not_found",
            TopicErrorKind::TopicNotFound => "topic_not_found",
            TopicErrorKind::TopicCreationFailed => "topic_creation_failed",
            TopicErrorKind::Timeout => "timeout",
            TopicErrorKind::Connection => "connection",
            TopicErrorKind::NotReady => "not_ready",
            TopicErrorKind::Unexpected => "unexpected",
        }
    }

    /// Kinds a retry may clear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TopicErrorKind::Timeout
                | TopicErrorKind::Connection
                | TopicErrorKind::NotReady
                | TopicErrorKind::TopicCreationFailed
        )
    }
}

impl fmt::Display for TopicErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every [`TopicAdminClient`](crate::TopicAdminClient) operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed{}: {message}", resource_suffix(.resource))]
pub struct TopicAdminError {
    kind: TopicErrorKind,
    message: String,
    resource: Option<String>,
    operation: &'static str,
}

impl TopicAdminError {
    pub fn new(kind: TopicErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource: None,
            operation,
        }
    }

    /// Attach the topic the operation targeted.
    pub fn on(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn kind(&self) -> TopicErrorKind {
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

    /// Map a backend error onto the component taxonomy.
    pub(crate) fn from_cluster(err: ClusterError, operation: &'static str, resource: &str) -> Self {
        let kind = match &err {
            ClusterError::Connection(_) => TopicErrorKind::Connection,
            ClusterError::Timeout { .. } => TopicErrorKind::Timeout,
            ClusterError::NotReady(_) => TopicErrorKind::NotReady,
            ClusterError::UnknownTopic(_) => TopicErrorKind::TopicNotFound,
            ClusterError::InvalidRequest(_) => TopicErrorKind::InvalidArgument,
            ClusterError::TopicExists(_)
            | ClusterError::Unsupported(_)
            | ClusterError::Authorization(_)
            | ClusterError::Broker { .. } => TopicErrorKind::Unexpected,
        };
        Self::new(kind, operation, err.to_string()).on(resource)
    }

    pub(crate) fn from_profile(err: ProfileError, operation: &'static str, resource: &str) -> Self {
        let kind = match &err {
            ProfileError::NotFound { .. } => TopicErrorKind::ProfileNotFound,
            ProfileError::InvalidConfiguration(_) => TopicErrorKind::InvalidConfiguration,
        };
        Self::new(kind, operation, err.to_string()).on(resource)
    }

    pub(crate) fn not_found(operation: &'static str, topic: &str) -> Self {
        Self::new(
            TopicErrorKind::TopicNotFound,
            operation,
            format!("Topic '{}' does not exist", topic),
        )
        .on(topic)
    }
}

fn resource_suffix(resource: &Option<String>) -> String {
    resource
        .as_ref()
        .map(|r| format!(" for '{}'", r))
        .unwrap_or_default()
}

impl Retryable for TopicAdminError {
    fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    fn error_class(&self) -> &'static str {
        self.kind.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn display_includes_operation_and_resource() {
        let err = TopicAdminError::not_found("describe_topic", "orders");
        assert_eq!(
            err.to_string(),
            "describe_topic failed for 'orders': Topic 'orders' does not exist"
        );

        let bare = TopicAdminError::new(TopicErrorKind::Connection, "list_topics", "refused");
        assert_eq!(bare.to_string(), "list_topics failed: refused");
    }

    #[test]
    fn cluster_errors_map_structurally() {
        let timeout = TopicAdminError::from_cluster(
            ClusterError::Timeout {
                operation: "metadata".into(),
                timeout: Duration::from_secs(10),
            },
            "list_topics",
            "*",
        );
        assert_eq!(timeout.kind(), TopicErrorKind::Timeout);
        assert!(timeout.is_transient());

        let missing = TopicAdminError::from_cluster(
            ClusterError::UnknownTopic("x".into()),
            "alter_topic_config",
            "x",
        );
        assert_eq!(missing.kind(), TopicErrorKind::TopicNotFound);
        assert!(!missing.is_transient());
        assert_eq!(missing.resource(), Some("x"));
    }

    #[test]
    fn creation_failure_is_retryable() {
        let err = TopicAdminError::new(TopicErrorKind::TopicCreationFailed, "create_topic", "boom");
        assert!(err.is_transient());
        assert_eq!(err.error_class(), "topic_creation_failed");
    }
}
