// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in topic configuration profiles.
//!
//! Four profiles tuned for distinct workloads:
//!
//! - `general_throughput`: balanced settings for most workloads (default)
//! - `low_latency`: small segments, lz4, relaxed ISR
//! - `compaction_log`: key-compacted state stores and changelogs
//! - `long_retention`: 14-day retention with zstd for audit data
//!
//! Profiles are constant tables. [`get_profile`] hands out an owned copy,
//! so callers can layer overrides without touching the table.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Topic configuration as the broker receives it: string keys and values.
pub type TopicConfig = BTreeMap<String, String>;

pub const MIN_INSYNC_REPLICAS: &str = "min.insync.replicas";
pub const COMPRESSION_TYPE: &str = "compression.type";
pub const UNCLEAN_LEADER_ELECTION: &str = "unclean.leader.election.enable";

/// Profile applied when a caller names none.
pub const DEFAULT_PROFILE: &str = "general_throughput";

/// Accepted `compression.type` values.
pub const VALID_COMPRESSION: &[&str] = &["none", "gzip", "snappy", "lz4", "zstd"];

/// Qualitative trade-offs of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerformanceNotes {
    pub throughput: &'static str,
    pub latency: &'static str,
    pub durability: &'static str,
    pub storage: &'static str,
    pub use_case: &'static str,
}

/// A named, immutable configuration profile.
#[derive(Debug, Clone, Copy)]
pub struct TopicProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub settings: &'static [(&'static str, &'static str)],
    pub notes: PerformanceNotes,
}

impl TopicProfile {
    /// Owned copy of the profile settings.
    pub fn to_config(&self) -> TopicConfig {
        self.settings
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

const GENERAL_THROUGHPUT: TopicProfile = TopicProfile {
    name: "general_throughput",
    description: "Balanced performance for most workloads (default)",
    settings: &[
        ("min.insync.replicas", "2"),
        ("unclean.leader.election.enable", "false"),
        ("compression.type", "snappy"),
        ("retention.ms", "259200000"),
        ("segment.ms", "3600000"),
        ("segment.bytes", "1073741824"),
        ("message.timestamp.type", "CreateTime"),
        ("max.message.bytes", "1048576"),
        ("delete.retention.ms", "86400000"),
        ("file.delete.delay.ms", "60000"),
        ("replica.lag.time.max.ms", "30000"),
    ],
    notes: PerformanceNotes {
        throughput: "High - optimized for sustained throughput",
        latency: "Medium - balanced approach",
        durability: "High - min.insync.replicas=2, no unclean elections",
        storage: "Medium - 3-day retention with snappy compression",
        use_case: "Most production workloads, event streaming",
    },
};

const LOW_LATENCY: TopicProfile = TopicProfile {
    name: "low_latency",
    description: "Optimized for minimal latency with relaxed durability",
    settings: &[
        ("min.insync.replicas", "1"),
        ("unclean.leader.election.enable", "false"),
        ("compression.type", "lz4"),
        ("segment.ms", "1800000"),
        ("segment.bytes", "536870912"),
        ("retention.ms", "86400000"),
        ("message.timestamp.type", "CreateTime"),
        ("max.message.bytes", "1048576"),
        ("delete.retention.ms", "3600000"),
        ("file.delete.delay.ms", "30000"),
        ("replica.lag.time.max.ms", "10000"),
    ],
    notes: PerformanceNotes {
        throughput: "Medium - optimized for speed over throughput",
        latency: "Low - smaller segments, lz4 compression, relaxed ISR",
        durability: "Medium - min.insync.replicas=1 for faster writes",
        storage: "Low - 1-day retention, frequent cleanup",
        use_case: "Real-time applications, trading systems, IoT",
    },
};

const COMPACTION_LOG: TopicProfile = TopicProfile {
    name: "compaction_log",
    description: "For key-based compacted topics (state stores, changelogs)",
    settings: &[
        ("cleanup.policy", "compact"),
        ("min.cleanable.dirty.ratio", "0.5"),
        ("min.compaction.lag.ms", "0"),
        ("max.compaction.lag.ms", "604800000"),
        ("min.insync.replicas", "2"),
        ("unclean.leader.election.enable", "false"),
        ("compression.type", "snappy"),
        ("segment.ms", "3600000"),
        ("segment.bytes", "1073741824"),
        ("delete.retention.ms", "86400000"),
        ("message.timestamp.type", "CreateTime"),
        ("max.message.bytes", "1048576"),
        ("segment.index.bytes", "10485760"),
        ("file.delete.delay.ms", "60000"),
    ],
    notes: PerformanceNotes {
        throughput: "Medium - compaction overhead affects performance",
        latency: "Medium - standard settings with compaction",
        durability: "High - designed for state store reliability",
        storage: "Variable - depends on key cardinality and update patterns",
        use_case: "Kafka Streams state stores, CDC, configuration topics",
    },
};

const LONG_RETENTION: TopicProfile = TopicProfile {
    name: "long_retention",
    description: "Extended retention for audit/compliance scenarios",
    settings: &[
        ("retention.ms", "1209600000"),
        ("retention.bytes", "-1"),
        ("min.insync.replicas", "2"),
        ("unclean.leader.election.enable", "false"),
        ("compression.type", "zstd"),
        ("segment.ms", "86400000"),
        ("segment.bytes", "2147483648"),
        ("message.timestamp.type", "CreateTime"),
        ("max.message.bytes", "1048576"),
        ("delete.retention.ms", "86400000"),
        ("file.delete.delay.ms", "300000"),
        ("segment.index.bytes", "52428800"),
        ("replica.lag.time.max.ms", "60000"),
    ],
    notes: PerformanceNotes {
        throughput: "Medium - larger segments reduce overhead",
        latency: "Medium-High - zstd compression adds CPU overhead",
        durability: "High - optimized for long-term data retention",
        storage: "High - 14-day retention with maximum compression",
        use_case: "Audit logs, compliance data, data lake ingestion",
    },
};

/// All built-in profiles, in presentation order.
pub const PROFILES: &[TopicProfile] = &[
    GENERAL_THROUGHPUT,
    LOW_LATENCY,
    COMPACTION_LOG,
    LONG_RETENTION,
];

/// Profile lookup and validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Profile '{name}' not found. Available profiles: {}", .available.join(", "))]
    NotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("{0}")]
    InvalidConfiguration(String),
}

/// Non-fatal finding from [`validate_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigWarning {
    pub key: String,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Names of every built-in profile.
pub fn profile_names() -> Vec<&'static str> {
    PROFILES.iter().map(|p| p.name).collect()
}

/// Static profile definition by name.
pub fn find_profile(name: &str) -> Option<&'static TopicProfile> {
    PROFILES.iter().find(|p| p.name == name)
}

/// Fresh copy of a profile's configuration.
pub fn get_profile(name: &str) -> Result<TopicConfig, ProfileError> {
    find_profile(name)
        .map(TopicProfile::to_config)
        .ok_or_else(|| ProfileError::NotFound {
            name: name.to_string(),
            available: profile_names().into_iter().map(String::from).collect(),
        })
}

/// Right-biased merge: override values win, no key is removed.
pub fn merge_configs(profile: &TopicConfig, overrides: &TopicConfig) -> TopicConfig {
    let mut merged = profile.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Check a complete topic configuration against its replication factor.
///
/// Returns the non-fatal warnings (already logged) on success.
pub fn validate_config(
    config: &TopicConfig,
    replication_factor: i32,
) -> Result<Vec<ConfigWarning>, ProfileError> {
    check_min_insync(config, replication_factor)?;
    check_compression(config)?;
    Ok(check_unclean_election(config).into_iter().collect())
}

/// `min.insync.replicas` (absent counts as 1) must be an integer below the
/// replication factor.
pub fn check_min_insync(config: &TopicConfig, replication_factor: i32) -> Result<(), ProfileError> {
    let min_isr = match config.get(MIN_INSYNC_REPLICAS) {
        Some(raw) => raw.trim().parse::<i32>().map_err(|_| {
            ProfileError::InvalidConfiguration(format!(
                "min.insync.replicas must be an integer, got '{}'",
                raw
            ))
        })?,
        None => 1,
    };

    if min_isr >= replication_factor {
        return Err(ProfileError::InvalidConfiguration(format!(
            "min.insync.replicas ({}) must be less than replication factor ({})",
            min_isr, replication_factor
        )));
    }
    Ok(())
}

/// `compression.type` (absent counts as `none`) must be a known codec.
pub fn check_compression(config: &TopicConfig) -> Result<(), ProfileError> {
    let compression = config
        .get(COMPRESSION_TYPE)
        .map(String::as_str)
        .unwrap_or("none");

    if !VALID_COMPRESSION.contains(&compression) {
        return Err(ProfileError::InvalidConfiguration(format!(
            "Invalid compression.type '{}'. Valid options: {}",
            compression,
            VALID_COMPRESSION.join(", ")
        )));
    }
    Ok(())
}

/// Warn when unclean leader election is enabled.
pub fn check_unclean_election(config: &TopicConfig) -> Option<ConfigWarning> {
    let enabled = config
        .get(UNCLEAN_LEADER_ELECTION)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
    if !enabled {
        return None;
    }

    let warning = ConfigWarning {
        key: UNCLEAN_LEADER_ELECTION.to_string(),
        message: "unclean.leader.election.enable=true can cause data loss. \
                  Consider setting to false for production workloads."
            .to_string(),
    };
    warn!(key = %warning.key, "{}", warning.message);
    Some(warning)
}

/// Profile name to description.
pub fn list_profiles() -> BTreeMap<&'static str, &'static str> {
    PROFILES.iter().map(|p| (p.name, p.description)).collect()
}

/// Profile name to qualitative performance notes.
pub fn performance_notes() -> BTreeMap<&'static str, PerformanceNotes> {
    PROFILES.iter().map(|p| (p.name, p.notes)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> TopicConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_get_profile_returns_independent_copy() {
        for name in profile_names() {
            let mut first = get_profile(name).unwrap();
            first.insert("retention.ms".into(), "1".into());
            first.remove(MIN_INSYNC_REPLICAS);

            let second = get_profile(name).unwrap();
            assert_ne!(first, second, "profile {} was mutated", name);
            assert!(second.contains_key(MIN_INSYNC_REPLICAS));
        }
    }

    #[test]
    fn test_unknown_profile_lists_available() {
        let err = get_profile("turbo").unwrap_err();
        match &err {
            ProfileError::NotFound { name, available } => {
                assert_eq!(name, "turbo");
                assert_eq!(available.len(), 4);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains("general_throughput, low_latency, compaction_log, long_retention"));
    }

    #[test]
    fn test_profile_values() {
        let general = get_profile("general_throughput").unwrap();
        assert_eq!(general["min.insync.replicas"], "2");
        assert_eq!(general["compression.type"], "snappy");
        assert_eq!(general["retention.ms"], "259200000");

        let low = get_profile("low_latency").unwrap();
        assert_eq!(low["compression.type"], "lz4");
        assert_eq!(low["min.insync.replicas"], "1");

        let compact = get_profile("compaction_log").unwrap();
        assert_eq!(compact["cleanup.policy"], "compact");
        assert!(!compact.contains_key("retention.ms"));

        let long = get_profile("long_retention").unwrap();
        assert_eq!(long["retention.bytes"], "-1");
        assert_eq!(long["compression.type"], "zstd");
    }

    #[test]
    fn test_merge_identity_and_override() {
        let profile = get_profile("general_throughput").unwrap();
        assert_eq!(merge_configs(&profile, &TopicConfig::new()), profile);

        let merged = merge_configs(&profile, &config(&[("compression.type", "gzip"), ("x.y", "z")]));
        assert_eq!(merged["compression.type"], "gzip");
        assert_eq!(merged["x.y"], "z");
        assert_eq!(merged.len(), profile.len() + 1);
        assert_eq!(merged["retention.ms"], profile["retention.ms"]);
    }

    #[test]
    fn test_validate_min_isr_boundary() {
        for rf in 1..=5 {
            for isr in 0..=6 {
                let cfg = config(&[("min.insync.replicas", &isr.to_string())]);
                let result = validate_config(&cfg, rf);
                assert_eq!(result.is_err(), isr >= rf, "isr={} rf={}", isr, rf);
            }
        }
    }

    #[test]
    fn test_validate_absent_min_isr_counts_as_one() {
        assert!(validate_config(&TopicConfig::new(), 2).is_ok());
        assert!(validate_config(&TopicConfig::new(), 1).is_err());
    }

    #[test]
    fn test_validate_rejects_non_integer_min_isr() {
        let err = validate_config(&config(&[("min.insync.replicas", "two")]), 3).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_validate_compression() {
        for codec in VALID_COMPRESSION {
            assert!(validate_config(&config(&[("compression.type", *codec)]), 3).is_ok());
        }
        let err = validate_config(&config(&[("compression.type", "brotli")]), 3).unwrap_err();
        assert!(err.to_string().contains("brotli"));
    }

    #[test]
    fn test_unclean_election_warns() {
        let warnings =
            validate_config(&config(&[("unclean.leader.election.enable", "true")]), 3).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, UNCLEAN_LEADER_ELECTION);

        let warnings =
            validate_config(&config(&[("unclean.leader.election.enable", "false")]), 3).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_every_builtin_profile_validates_at_rf3() {
        for profile in PROFILES {
            let warnings = validate_config(&profile.to_config(), 3).unwrap();
            assert!(warnings.is_empty(), "{} produced warnings", profile.name);
        }
    }

    #[test]
    fn test_listing() {
        let listed = list_profiles();
        assert_eq!(listed.len(), 4);
        assert_eq!(
            listed["general_throughput"],
            "Balanced performance for most workloads (default)"
        );

        let notes = performance_notes();
        assert_eq!(notes["low_latency"].latency, "Low - smaller segments, lz4 compression, relaxed ISR");
    }
}
