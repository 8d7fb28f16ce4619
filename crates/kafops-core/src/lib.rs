// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared building blocks for the kafops admin clients.
//!
//! - **Settings**: process-wide configuration (defaults, TOML file, environment)
//! - **Retry**: bounded exponential-backoff wrapper for remote calls
//! - **Bootstrap**: seams for the external bootstrap resolver and token provider
//!
//! # Example
//!
//! ```rust,ignore
//! use kafops_core::{RetryPolicy, Settings};
//!
//! let settings = Settings::load(None)?;
//! let topics = RetryPolicy::query().run("list_topics", |_ctx| fetch_topics())?;
//! ```

pub mod bootstrap;
pub mod retry;
pub mod settings;

pub use bootstrap::{
    BearerToken, BootstrapError, BootstrapResolver, CachedTokenProvider, NoResolver, SecurityPosture,
    StaticResolver, TokenError, TokenProvider,
};
pub use retry::{RetryContext, RetryPolicy, Retryable};
pub use settings::{ConfigError, SaslMechanism, SecurityProtocol, Settings, TopicDefaults};
