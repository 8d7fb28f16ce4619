// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collaborator seams for connection resolution and authentication.
//!
//! Resolving a cluster identifier to broker endpoints and minting bearer
//! tokens both belong to the hosting cloud. They are consumed here through
//! [`BootstrapResolver`] and [`TokenProvider`] so the admin clients stay
//! independent of any particular control plane.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// How the client authenticates, which selects the endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityPosture {
    /// Mutual TLS, no SASL.
    Tls,
    /// SASL/SCRAM-SHA-512 over TLS.
    SaslScram,
    /// SASL/OAUTHBEARER over TLS.
    SaslOAuth,
}

impl SecurityPosture {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityPosture::Tls => "tls",
            SecurityPosture::SaslScram => "sasl_scram",
            SecurityPosture::SaslOAuth => "sasl_oauth",
        }
    }
}

impl fmt::Display for SecurityPosture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bootstrap resolution failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("cluster not found: {0}")]
    NotFound(String),

    #[error("cluster {cluster} exposes no {posture} endpoint")]
    NoEndpoint {
        cluster: String,
        posture: SecurityPosture,
    },

    #[error("no bootstrap servers configured: set KAFKA_BOOTSTRAP or KAFKA_CLUSTER_ID")]
    Unconfigured,

    #[error("bootstrap resolution failed: {0}")]
    Failed(String),
}

/// Maps a cluster identifier to a bootstrap connection string.
pub trait BootstrapResolver: Send + Sync {
    fn resolve(&self, cluster_id: &str, posture: SecurityPosture) -> Result<String, BootstrapError>;
}

/// Resolver backed by a fixed endpoint table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    endpoints: HashMap<(String, SecurityPosture), String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint for a cluster and posture.
    pub fn with_endpoint(
        mut self,
        cluster_id: impl Into<String>,
        posture: SecurityPosture,
        bootstrap: impl Into<String>,
    ) -> Self {
        self.endpoints
            .insert((cluster_id.into(), posture), bootstrap.into());
        self
    }

    fn knows_cluster(&self, cluster_id: &str) -> bool {
        self.endpoints.keys().any(|(id, _)| id == cluster_id)
    }
}

impl BootstrapResolver for StaticResolver {
    fn resolve(&self, cluster_id: &str, posture: SecurityPosture) -> Result<String, BootstrapError> {
        if let Some(endpoint) = self.endpoints.get(&(cluster_id.to_string(), posture)) {
            debug!(cluster_id, %posture, endpoint = %endpoint, "resolved bootstrap endpoint");
            return Ok(endpoint.clone());
        }
        if self.knows_cluster(cluster_id) {
            Err(BootstrapError::NoEndpoint {
                cluster: cluster_id.to_string(),
                posture,
            })
        } else {
            Err(BootstrapError::NotFound(cluster_id.to_string()))
        }
    }
}

/// Resolver used when no control plane is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl BootstrapResolver for NoResolver {
    fn resolve(&self, cluster_id: &str, _posture: SecurityPosture) -> Result<String, BootstrapError> {
        Err(BootstrapError::Failed(format!(
            "no resolver available for cluster {}; set KAFKA_BOOTSTRAP",
            cluster_id
        )))
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Bearer token handed to the OAUTHBEARER handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub principal: String,
    pub expires_at: SystemTime,
}

impl BearerToken {
    /// Token lifetime left at `now`, zero once expired.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        self.expires_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }

    /// Milliseconds since the Unix epoch, as the OAUTHBEARER hook expects.
    pub fn expires_at_millis(&self) -> i64 {
        self.expires_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"<redacted>")
            .field("principal", &self.principal)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token acquisition failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("token acquisition failed: {0}")]
pub struct TokenError(pub String);

/// Supplies bearer tokens for cluster authentication.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Result<BearerToken, TokenError>;
}

/// Reuses the last token until it is within `refresh_margin` of expiry.
pub struct CachedTokenProvider {
    inner: Arc<dyn TokenProvider>,
    refresh_margin: Duration,
    cached: Mutex<Option<BearerToken>>,
}

impl CachedTokenProvider {
    pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

    pub fn new(inner: Arc<dyn TokenProvider>) -> Self {
        Self::with_margin(inner, Self::DEFAULT_REFRESH_MARGIN)
    }

    pub fn with_margin(inner: Arc<dyn TokenProvider>, refresh_margin: Duration) -> Self {
        Self {
            inner,
            refresh_margin,
            cached: Mutex::new(None),
        }
    }
}

impl TokenProvider for CachedTokenProvider {
    fn token(&self) -> Result<BearerToken, TokenError> {
        let mut cached = self.cached.lock();
        if let Some(token) = cached.as_ref() {
            if token.remaining(SystemTime::now()) > self.refresh_margin {
                debug!(principal = %token.principal, "using cached bearer token");
                return Ok(token.clone());
            }
        }

        let fresh = self.inner.token()?;
        info!(
            principal = %fresh.principal,
            expires_in_secs = fresh.remaining(SystemTime::now()).as_secs(),
            "bearer token refreshed"
        );
        *cached = Some(fresh.clone());
        Ok(fresh)
    }
}

impl fmt::Debug for CachedTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedTokenProvider")
            .field("refresh_margin", &self.refresh_margin)
            .field("cached", &self.cached.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProvider {
        calls: AtomicU32,
        lifetime: Duration,
    }

    impl TokenProvider for CountingProvider {
        fn token(&self) -> Result<BearerToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(BearerToken {
                value: format!("token-{}", n),
                principal: "admin".into(),
                expires_at: SystemTime::now() + self.lifetime,
            })
        }
    }

    #[test]
    fn test_static_resolver_lookup() {
        let resolver = StaticResolver::new()
            .with_endpoint("prod", SecurityPosture::SaslOAuth, "b-1:9098,b-2:9098")
            .with_endpoint("prod", SecurityPosture::Tls, "b-1:9094");

        assert_eq!(
            resolver.resolve("prod", SecurityPosture::SaslOAuth).unwrap(),
            "b-1:9098,b-2:9098"
        );
        assert_eq!(
            resolver.resolve("prod", SecurityPosture::SaslScram),
            Err(BootstrapError::NoEndpoint {
                cluster: "prod".into(),
                posture: SecurityPosture::SaslScram,
            })
        );
        assert_eq!(
            resolver.resolve("staging", SecurityPosture::Tls),
            Err(BootstrapError::NotFound("staging".into()))
        );
    }

    #[test]
    fn test_no_resolver_fails() {
        let err = NoResolver.resolve("prod", SecurityPosture::Tls).unwrap_err();
        assert!(err.to_string().contains("KAFKA_BOOTSTRAP"));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken {
            value: "secret".into(),
            principal: "admin".into(),
            expires_at: SystemTime::UNIX_EPOCH + Duration::from_millis(1500),
        };
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("secret"));
        assert_eq!(token.expires_at_millis(), 1500);
        assert_eq!(token.remaining(SystemTime::now()), Duration::ZERO);
    }

    #[test]
    fn test_cached_provider_reuses_fresh_token() {
        let inner = Arc::new(CountingProvider {
            calls: AtomicU32::new(0),
            lifetime: Duration::from_secs(900),
        });
        let cached = CachedTokenProvider::new(inner.clone());

        assert_eq!(cached.token().unwrap().value, "token-1");
        assert_eq!(cached.token().unwrap().value, "token-1");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_provider_refreshes_near_expiry() {
        let inner = Arc::new(CountingProvider {
            calls: AtomicU32::new(0),
            lifetime: Duration::from_secs(30),
        });
        let cached = CachedTokenProvider::new(inner.clone());

        assert_eq!(cached.token().unwrap().value, "token-1");
        assert_eq!(cached.token().unwrap().value, "token-2");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
