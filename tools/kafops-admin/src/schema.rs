// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `schema` commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use kafops_core::Settings;
use kafops_schema_registry::{
    open_catalog, SchemaCatalog, SchemaRegistryClient, DEFAULT_COMPATIBILITY,
};
use serde_json::{json, Value};
use tabled::Tabled;

use crate::output::{self, Format, UsageError};

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Register an Avro schema from a file
    Register {
        /// Path to the .avsc file
        #[arg(short, long)]
        file: PathBuf,

        /// Schema name
        #[arg(short, long)]
        name: String,

        /// Compatibility mode applied when the schema is created
        #[arg(long = "compat", default_value = DEFAULT_COMPATIBILITY)]
        compatibility: String,
    },

    /// Print a schema definition
    Get {
        /// Schema name
        #[arg(short, long)]
        name: String,

        /// Version number (latest when omitted)
        #[arg(short, long)]
        version: Option<u32>,
    },

    /// List schemas in the registry
    List,

    /// Check a candidate schema against the latest registered version
    CheckCompatibility {
        /// Path to the candidate .avsc file
        #[arg(short, long)]
        file: PathBuf,

        /// Schema name
        #[arg(short, long)]
        name: String,
    },

    /// List the versions of a schema
    Versions {
        /// Schema name
        #[arg(short, long)]
        name: String,
    },
}

impl SchemaCommand {
    pub fn operation(&self) -> &'static str {
        match self {
            SchemaCommand::Register { .. } => "register_schema",
            SchemaCommand::Get { .. } => "get_schema",
            SchemaCommand::List => "list_schemas",
            SchemaCommand::CheckCompatibility { .. } => "check_compatibility",
            SchemaCommand::Versions { .. } => "list_schema_versions",
        }
    }
}

pub fn run(command: SchemaCommand, settings: &Settings, format: Format) -> Result<()> {
    let catalog = open_catalog(settings).context("opening schema catalog")?;
    let client = SchemaRegistryClient::from_settings(catalog, settings);
    execute(command, &client, format)
}

fn execute<S: SchemaCatalog>(
    command: SchemaCommand,
    client: &SchemaRegistryClient<S>,
    format: Format,
) -> Result<()> {
    let operation = command.operation();
    match command {
        SchemaCommand::Register {
            file,
            name,
            compatibility,
        } => {
            let definition = read_schema_file(&file)?;
            let outcome = client.register_avro_schema(&definition, &name, &compatibility)?;
            output::print_success(
                operation,
                json!({
                    "schema_name": outcome.name,
                    "schema_id": outcome.id,
                    "version": outcome.version,
                    "result": outcome.status,
                    "compatibility": compatibility,
                    "file": file.display().to_string(),
                }),
            );
        }
        SchemaCommand::Get { name, version } => {
            let record = client.get_schema_record(&name, version)?;
            let definition: Value = serde_json::from_str(&record.definition)
                .unwrap_or(Value::String(record.definition.clone()));
            let fields = json!({
                "schema_name": record.name,
                "schema_id": record.id,
                "version_id": record.version_id,
                "version": record.version,
                "compatibility": record.compatibility,
                "status": record.status,
                "schema_definition": definition,
            });
            match format {
                Format::Json => output::print_success(operation, fields),
                Format::Table => {
                    println!("{}", serde_json::to_string_pretty(&definition)?);
                }
            }
        }
        SchemaCommand::List => {
            let schemas = client.list_schemas()?;
            match format {
                Format::Json => output::print_success(
                    operation,
                    json!({ "count": schemas.len(), "schemas": schemas }),
                ),
                Format::Table => {
                    let rows = schemas
                        .iter()
                        .map(|s| SchemaRow {
                            name: s.name.clone(),
                            latest_version: s.latest_version,
                            compatibility: s.compatibility.to_string(),
                            status: output::plain(&json!(s.status)),
                            updated: timestamp(s.updated_time),
                        })
                        .collect();
                    output::print_table(
                        &format!("Schemas in '{}'", client.registry()),
                        rows,
                        "No schemas",
                    );
                }
            }
        }
        SchemaCommand::CheckCompatibility { file, name } => {
            let candidate = read_schema_file(&file)?;
            let report = client.compatibility_report(&name, &candidate)?;
            output::print_success(
                operation,
                json!({
                    "schema_name": name,
                    "candidate_file": file.display().to_string(),
                    "compatible": report.compatible,
                    "compared_version": report.compared_version,
                    "level": report.level,
                    "details": report.details,
                }),
            );
        }
        SchemaCommand::Versions { name } => {
            let versions = client.get_schema_versions(&name)?;
            match format {
                Format::Json => output::print_success(
                    operation,
                    json!({ "schema_name": name, "count": versions.len(), "versions": versions }),
                ),
                Format::Table => {
                    let rows = versions
                        .iter()
                        .map(|v| VersionRow {
                            version: v.version,
                            status: output::plain(&json!(v.status)),
                            created: timestamp(v.created_time),
                        })
                        .collect();
                    output::print_table(&format!("Versions of '{}'", name), rows, "No versions");
                }
            }
        }
    }
    Ok(())
}

fn read_schema_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(UsageError(format!("Schema file not found: {}", path.display())).into());
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn timestamp(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Latest")]
    latest_version: u32,
    #[tabled(rename = "Compatibility")]
    compatibility: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

#[derive(Tabled)]
struct VersionRow {
    #[tabled(rename = "Version")]
    version: u32,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kafops_core::RetryPolicy;
    use kafops_schema_registry::MemoryCatalog;

    const ORDER_V1: &str =
        r#"{"type":"record","name":"Order","fields":[{"name":"id","type":"long"}]}"#;

    fn client() -> SchemaRegistryClient<MemoryCatalog> {
        SchemaRegistryClient::new(MemoryCatalog::new(), "default")
            .with_retry_policy(RetryPolicy::immediate())
    }

    #[test]
    fn register_reads_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("order.avsc");
        fs::write(&file, ORDER_V1).unwrap();

        let client = client();
        execute(
            SchemaCommand::Register {
                file,
                name: "orders".into(),
                compatibility: DEFAULT_COMPATIBILITY.into(),
            },
            &client,
            Format::Json,
        )
        .unwrap();
        assert_eq!(client.get_schema("orders", None).unwrap(), ORDER_V1);
    }

    #[test]
    fn missing_schema_file_is_a_usage_error() {
        let err = execute(
            SchemaCommand::CheckCompatibility {
                file: PathBuf::from("/nonexistent/order.avsc"),
                name: "orders".into(),
            },
            &client(),
            Format::Json,
        )
        .unwrap_err();
        assert_eq!(output::error_kind(&err), "invalid_argument");
    }

    #[test]
    fn get_unknown_schema_reports_not_found() {
        let err = execute(
            SchemaCommand::Get {
                name: "ghost".into(),
                version: None,
            },
            &client(),
            Format::Json,
        )
        .unwrap_err();
        assert_eq!(output::error_kind(&err), "schema_not_found");
    }

    #[test]
    fn timestamp_formats_or_dashes() {
        assert_eq!(timestamp(None), "-");
        let t = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp(Some(t)), "2026-01-02 03:04:05");
    }
}
