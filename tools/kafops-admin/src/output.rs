// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Result and error rendering.
//!
//! Every command prints exactly one document on stdout: a JSON object with
//! `"status": "success"` and the operation name, or a table when
//! `--format table` is selected. Failures print a JSON error object.

use clap::ValueEnum;
use colored::Colorize;
use kafops_core::ConfigError;
use kafops_schema_registry::{CatalogError, SchemaRegistryError};
use kafops_topics::TopicAdminError;
use serde_json::{json, Map, Value};
use tabled::{Table, Tabled};
use thiserror::Error;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Table,
}

/// Invalid command-line input detected after parsing.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

/// Wrap `fields` in the success envelope.
pub fn success(operation: &str, fields: Value) -> Value {
    let mut doc = Map::new();
    doc.insert("status".into(), json!("success"));
    doc.insert("operation".into(), json!(operation));
    if let Value::Object(extra) = fields {
        doc.extend(extra);
    }
    Value::Object(doc)
}

pub fn print_success(operation: &str, fields: Value) {
    print_json(&success(operation, fields));
}

/// Error envelope for `err`, classified by its concrete type.
pub fn failure(operation: &str, err: &anyhow::Error) -> Value {
    json!({
        "status": "error",
        "operation": operation,
        "error": format!("{:#}", err),
        "error_kind": error_kind(err),
    })
}

pub fn print_error(operation: &str, err: &anyhow::Error) {
    print_json(&failure(operation, err));
}

/// Stable machine-readable class of `err`.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<TopicAdminError>() {
            return e.kind().as_str();
        }
        if let Some(e) = cause.downcast_ref::<SchemaRegistryError>() {
            return e.kind().as_str();
        }
        if cause.downcast_ref::<CatalogError>().is_some() {
            return "catalog";
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "configuration";
        }
        if cause.downcast_ref::<UsageError>().is_some() {
            return "invalid_argument";
        }
    }
    "unexpected"
}

fn print_json(doc: &Value) {
    match serde_json::to_string_pretty(doc) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Print `rows` under `title`, or `empty` when there are none.
pub fn print_table<T: Tabled>(title: &str, rows: Vec<T>, empty: &str) {
    println!("{}", title.cyan().bold());
    if rows.is_empty() {
        println!("  {}", empty.yellow());
        return;
    }
    println!("{}", Table::new(rows));
}

/// Key/value view of a flat JSON object.
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn field_rows(fields: &Value) -> Vec<FieldRow> {
    let Some(object) = fields.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .map(|(field, value)| FieldRow {
            field: field.clone(),
            value: plain(value),
        })
        .collect()
}

/// Render a JSON value without quotes around strings.
pub fn plain(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
