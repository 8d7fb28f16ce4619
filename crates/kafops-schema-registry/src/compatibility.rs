// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::avro::{self, AvroError, RecordField};

// ---------------------------------------------------------------------------
// CompatibilityMode
// ---------------------------------------------------------------------------

/// Rule a catalog enforces when a new version of a schema is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityMode {
    /// New schema can read data written with the previous one.
    #[default]
    Backward,
    /// Previous schema can read data written with the new one.
    Forward,
    /// Both directions.
    Full,
    /// No enforcement.
    None,
}

impl CompatibilityMode {
    pub const ALL: [CompatibilityMode; 4] = [
        CompatibilityMode::Backward,
        CompatibilityMode::Forward,
        CompatibilityMode::Full,
        CompatibilityMode::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityMode::Backward => "BACKWARD",
            CompatibilityMode::Forward => "FORWARD",
            CompatibilityMode::Full => "FULL",
            CompatibilityMode::None => "NONE",
        }
    }

    /// Whether a change classified as `level` may be registered under this mode.
    pub fn permits(&self, level: Compatibility) -> bool {
        match self {
            CompatibilityMode::None => true,
            CompatibilityMode::Backward => {
                matches!(level, Compatibility::Full | Compatibility::Backward)
            }
            CompatibilityMode::Forward => {
                matches!(level, Compatibility::Full | Compatibility::Forward)
            }
            CompatibilityMode::Full => level == Compatibility::Full,
        }
    }
}

impl FromStr for CompatibilityMode {
    type Err = String;

    /// Case-sensitive: only the upper-case names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!(
                    "Invalid compatibility '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

impl fmt::Display for CompatibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Compatibility level
// ---------------------------------------------------------------------------

/// How two versions of a record relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    /// Readable in both directions.
    Full,
    /// New schema can read data written by old schema.
    Backward,
    /// Old schema can read data written by new schema.
    Forward,
    /// Neither direction works.
    Breaking,
}

// ---------------------------------------------------------------------------
// CompatibilityResult
// ---------------------------------------------------------------------------

/// Detailed result of comparing two record versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityResult {
    pub compatibility: Compatibility,
    /// Human-readable description of each structural change.
    pub details: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Classify the change from `old` to `new`.
///
/// An added field breaks backward reads unless it has a default in `new`; a
/// removed field breaks forward reads unless it had a default in `old`; a
/// changed type breaks both.
pub fn check_compatibility(old: &[RecordField], new: &[RecordField]) -> CompatibilityResult {
    let old_map: HashMap<&str, &RecordField> =
        old.iter().map(|f| (f.name.as_str(), f)).collect();
    let new_map: HashMap<&str, &RecordField> =
        new.iter().map(|f| (f.name.as_str(), f)).collect();

    let mut details = Vec::new();
    let mut backward = true;
    let mut forward = true;

    for nf in new {
        if !old_map.contains_key(nf.name.as_str()) {
            if nf.has_default {
                details.push(format!("added field: {} {}", nf.type_repr, nf.name));
            } else {
                details.push(format!(
                    "added field without default: {} {}",
                    nf.type_repr, nf.name
                ));
                backward = false;
            }
        }
    }

    for of in old {
        match new_map.get(of.name.as_str()) {
            None if of.has_default => {
                details.push(format!("removed field: {} {}", of.type_repr, of.name));
            }
            None => {
                details.push(format!(
                    "removed field without default: {} {}",
                    of.type_repr, of.name
                ));
                forward = false;
            }
            Some(nf) if nf.type_repr != of.type_repr => {
                details.push(format!(
                    "changed type of {}: {} -> {}",
                    of.name, of.type_repr, nf.type_repr
                ));
                backward = false;
                forward = false;
            }
            Some(_) => {}
        }
    }

    if details.is_empty() {
        details.push("schemas are structurally identical".to_string());
    }

    let compatibility = match (backward, forward) {
        (true, true) => Compatibility::Full,
        (true, false) => Compatibility::Backward,
        (false, true) => Compatibility::Forward,
        (false, false) => Compatibility::Breaking,
    };

    CompatibilityResult {
        compatibility,
        details,
    }
}

/// Parse two definitions and compare them.
pub fn check_definitions(old: &str, new: &str) -> Result<CompatibilityResult, AvroError> {
    let old_fields = avro::record_fields(&avro::parse_json(old)?)?;
    let new_fields = avro::record_fields(&avro::parse_json(new)?)?;
    Ok(check_compatibility(&old_fields, &new_fields))
}

/// Fields of `old` missing from `new` that carry no default in `old`.
pub fn removed_required_fields(old: &[RecordField], new: &[RecordField]) -> Vec<String> {
    old.iter()
        .filter(|of| !of.has_default && !new.iter().any(|nf| nf.name == of.name))
        .map(|of| of.name.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
