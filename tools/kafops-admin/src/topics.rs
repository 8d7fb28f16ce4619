// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `topics` and `health` commands.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Subcommand;
use kafops_core::Settings;
use kafops_topics::profiles::{self, DEFAULT_PROFILE};
use kafops_topics::{
    ClusterAdmin, CreateTopicRequest, DeleteOutcome, HealthReport, TopicAdminClient, TopicConfig,
};
use serde_json::json;
use tabled::Tabled;

use crate::output::{self, Format};

#[derive(Subcommand, Debug)]
pub enum TopicsCommand {
    /// Create a topic from a configuration profile
    Create {
        /// Topic name
        name: String,

        /// Number of partitions (cluster default when omitted)
        #[arg(short, long)]
        partitions: Option<i32>,

        /// Replication factor (cluster default when omitted)
        #[arg(short, long = "replication")]
        replication_factor: Option<i32>,

        /// Configuration profile
        #[arg(long, default_value = DEFAULT_PROFILE)]
        profile: String,

        /// Config override in key=value form (repeatable)
        #[arg(short, long = "config", value_parser = parse_key_val)]
        config: Vec<(String, String)>,
    },

    /// List topics
    List,

    /// Show partitions, replicas and configuration of a topic
    Describe {
        /// Topic name
        name: String,
    },

    /// Change topic configuration
    AlterConfig {
        /// Topic name
        name: String,

        /// Config entry in key=value form (repeatable)
        #[arg(short, long = "config", value_parser = parse_key_val, required = true)]
        config: Vec<(String, String)>,
    },

    /// Delete a topic
    Delete {
        /// Topic name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the available configuration profiles
    Profiles,
}

impl TopicsCommand {
    pub fn operation(&self) -> &'static str {
        match self {
            TopicsCommand::Create { .. } => "create_topic",
            TopicsCommand::List => "list_topics",
            TopicsCommand::Describe { .. } => "describe_topic",
            TopicsCommand::AlterConfig { .. } => "alter_topic_config",
            TopicsCommand::Delete { .. } => "delete_topic",
            TopicsCommand::Profiles => "list_profiles",
        }
    }
}

/// Parse a `key=value` argument.
pub fn parse_key_val(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("Config must be in key=value format: {}", arg)),
    }
}

/// Connects with the static bootstrap list only. Cluster-id resolution and
/// OAUTHBEARER tokens need a resolver and token provider supplied through
/// the library API.
#[cfg(feature = "kafka")]
fn open_cluster(settings: &Settings) -> Result<Box<dyn ClusterAdmin>> {
    use anyhow::Context;
    use kafops_core::NoResolver;
    use kafops_topics::KafkaCluster;

    let bootstrap = settings
        .bootstrap_servers(&NoResolver)
        .context("resolving bootstrap servers")?;
    let cluster = KafkaCluster::connect(settings, &bootstrap, None)
        .context("connecting to Kafka cluster")?;
    Ok(Box::new(cluster))
}

#[cfg(not(feature = "kafka"))]
fn open_cluster(_settings: &Settings) -> Result<Box<dyn ClusterAdmin>> {
    Err(output::UsageError(
        "topic commands need a Kafka backend: rebuild kafops-admin with the `kafka` feature"
            .to_string(),
    )
    .into())
}

fn admin_client(settings: &Settings) -> Result<TopicAdminClient<Box<dyn ClusterAdmin>>> {
    Ok(TopicAdminClient::from_settings(
        open_cluster(settings)?,
        settings,
    ))
}

pub fn run(command: TopicsCommand, settings: &Settings, format: Format) -> Result<()> {
    if let TopicsCommand::Delete { name, yes: false } = &command {
        if !confirm(&format!("Delete topic '{}'?", name))? {
            output::print_success(
                command.operation(),
                json!({ "topic": name, "cancelled": true, "message": "Operation cancelled." }),
            );
            return Ok(());
        }
    }
    execute(command, || admin_client(settings), format)
}

/// Run a topic command. `connect` is only called by commands that need
/// the cluster.
fn execute<C, F>(command: TopicsCommand, connect: F, format: Format) -> Result<()>
where
    C: ClusterAdmin,
    F: FnOnce() -> Result<TopicAdminClient<C>>,
{
    let operation = command.operation();
    match command {
        TopicsCommand::Create {
            name,
            partitions,
            replication_factor,
            profile,
            config,
        } => {
            let client = connect()?;
            let overrides: TopicConfig = config.into_iter().collect();
            let mut request = CreateTopicRequest::new(&name)
                .profile(&profile)
                .overrides(overrides.clone());
            if let Some(partitions) = partitions {
                request = request.partitions(partitions);
            }
            if let Some(replication_factor) = replication_factor {
                request = request.replication_factor(replication_factor);
            }
            let outcome = client.create_topic(&request)?;
            output::print_success(
                operation,
                json!({
                    "topic": outcome.spec.name,
                    "created": outcome.created(),
                    "result": outcome.status,
                    "partitions": outcome.spec.partitions,
                    "replication_factor": outcome.spec.replication_factor,
                    "profile": profile,
                    "config_overrides": overrides,
                    "warnings": outcome.warnings,
                }),
            );
        }
        TopicsCommand::List => {
            let client = connect()?;
            let topics = client.list_topics()?;
            match format {
                Format::Json => output::print_success(
                    operation,
                    json!({ "count": topics.len(), "topics": topics }),
                ),
                Format::Table => {
                    let rows = topics.into_iter().map(|name| TopicRow { name }).collect();
                    output::print_table("Topics", rows, "No topics");
                }
            }
        }
        TopicsCommand::Describe { name } => {
            let client = connect()?;
            let description = client.describe_topic(&name)?;
            match format {
                Format::Json => output::print_success(operation, json!(description)),
                Format::Table => {
                    let config_rows = description
                        .config
                        .iter()
                        .map(|(key, value)| output::FieldRow {
                            field: key.clone(),
                            value: value.clone(),
                        })
                        .collect();
                    let partition_rows = description
                        .partition_details
                        .iter()
                        .map(|p| PartitionRow {
                            partition: p.partition,
                            leader: p.leader,
                            replicas: join_ids(&p.replicas),
                            isr: join_ids(&p.isr),
                        })
                        .collect();
                    output::print_table(
                        &format!(
                            "Topic {} ({} partitions, RF {})",
                            description.name,
                            description.partitions,
                            description.replication_factor
                        ),
                        partition_rows,
                        "No partitions",
                    );
                    output::print_table("Configuration", config_rows, "No configuration");
                }
            }
        }
        TopicsCommand::AlterConfig { name, config } => {
            let client = connect()?;
            let changes: TopicConfig = config.into_iter().collect();
            let outcome = client.alter_topic_config(&name, &changes)?;
            output::print_success(
                operation,
                json!({
                    "topic": outcome.topic,
                    "config_changes": outcome.applied,
                    "mode": outcome.mode,
                    "warnings": outcome.warnings,
                }),
            );
        }
        TopicsCommand::Delete { name, .. } => {
            let client = connect()?;
            let outcome = client.delete_topic(&name)?;
            output::print_success(
                operation,
                json!({ "topic": name, "deleted": outcome == DeleteOutcome::Deleted, "outcome": outcome }),
            );
        }
        TopicsCommand::Profiles => profiles_output(format),
    }
    Ok(())
}

fn profiles_output(format: Format) {
    let descriptions = profiles::list_profiles();
    let notes = profiles::performance_notes();
    match format {
        Format::Json => {
            let profiles: serde_json::Map<String, serde_json::Value> = descriptions
                .iter()
                .map(|(name, description)| {
                    (
                        name.to_string(),
                        json!({
                            "description": description,
                            "performance": notes.get(name),
                        }),
                    )
                })
                .collect();
            output::print_success("list_profiles", json!({ "profiles": profiles }));
        }
        Format::Table => {
            let rows = descriptions
                .iter()
                .map(|(name, description)| {
                    let note = notes.get(name);
                    ProfileRow {
                        name: name.to_string(),
                        description: description.to_string(),
                        throughput: note.map(|n| n.throughput).unwrap_or("-").to_string(),
                        latency: note.map(|n| n.latency).unwrap_or("-").to_string(),
                        durability: note.map(|n| n.durability).unwrap_or("-").to_string(),
                    }
                })
                .collect();
            output::print_table("Topic Profiles", rows, "No profiles");
        }
    }
}

/// `health` command: always reports, even when the cluster is unreachable.
pub fn health(settings: &Settings, format: Format) -> Result<()> {
    let report = match admin_client(settings) {
        Ok(client) => client.health_check(),
        Err(e) => HealthReport::unreachable(format!("{:#}", e)),
    };
    health_output(&report, format);
    Ok(())
}

fn health_output(report: &HealthReport, format: Format) {
    match format {
        Format::Json => output::print_success("health_check", json!(report)),
        Format::Table => {
            let rows = report
                .brokers
                .iter()
                .map(|b| BrokerRow {
                    id: b.id,
                    host: b.host.clone(),
                    port: b.port,
                })
                .collect();
            let title = if report.is_healthy() {
                format!(
                    "Cluster healthy: {} brokers, {} topics, {:.1} ms",
                    report.broker_count, report.topic_count, report.response_time_ms
                )
            } else {
                format!(
                    "Cluster unhealthy: {}",
                    report.error.as_deref().unwrap_or("unknown error")
                )
            };
            output::print_table(&title, rows, "No brokers");
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}

fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Tabled)]
struct TopicRow {
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct PartitionRow {
    #[tabled(rename = "Partition")]
    partition: i32,
    #[tabled(rename = "Leader")]
    leader: i32,
    #[tabled(rename = "Replicas")]
    replicas: String,
    #[tabled(rename = "ISR")]
    isr: String,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Throughput")]
    throughput: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Durability")]
    durability: String,
}

#[derive(Tabled)]
struct BrokerRow {
    #[tabled(rename = "ID")]
    id: i32,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Port")]
    port: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use anyhow::anyhow;
    use kafops_core::{RetryPolicy, TopicDefaults};
    use kafops_topics::MemoryCluster;

    fn connect_to(
        cluster: &Arc<MemoryCluster>,
    ) -> impl FnOnce() -> Result<TopicAdminClient<Arc<MemoryCluster>>> {
        let cluster = Arc::clone(cluster);
        move || {
            Ok(TopicAdminClient::new(cluster, TopicDefaults::default())
                .with_retry_policy(RetryPolicy::immediate()))
        }
    }

    fn unreachable_cluster() -> Result<TopicAdminClient<MemoryCluster>> {
        Err(anyhow!("no cluster configured"))
    }

    #[test]
    fn parse_key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("retention.ms=604800000").unwrap(),
            ("retention.ms".to_string(), "604800000".to_string())
        );
        assert_eq!(
            parse_key_val("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
    }

    #[test]
    fn parse_key_val_rejects_missing_equals() {
        let err = parse_key_val("retention.ms").unwrap_err();
        assert_eq!(err, "Config must be in key=value format: retention.ms");
        assert!(parse_key_val("=5").is_err());
    }

    #[test]
    fn create_then_delete_against_memory_cluster() {
        let cluster = Arc::new(MemoryCluster::new());
        execute(
            TopicsCommand::Create {
                name: "orders".into(),
                partitions: Some(3),
                replication_factor: Some(3),
                profile: DEFAULT_PROFILE.into(),
                config: vec![("retention.ms".into(), "3600000".into())],
            },
            connect_to(&cluster),
            Format::Json,
        )
        .unwrap();
        assert_eq!(cluster.topic_names(), vec!["orders"]);

        execute(
            TopicsCommand::Delete {
                name: "orders".into(),
                yes: true,
            },
            connect_to(&cluster),
            Format::Table,
        )
        .unwrap();
        assert!(cluster.topic_names().is_empty());
    }

    #[test]
    fn describe_missing_topic_fails() {
        let err = execute(
            TopicsCommand::Describe {
                name: "ghost".into(),
            },
            connect_to(&Arc::new(MemoryCluster::new())),
            Format::Json,
        )
        .unwrap_err();
        assert_eq!(output::error_kind(&err), "topic_not_found");
    }

    #[test]
    fn profiles_need_no_cluster() {
        execute(TopicsCommand::Profiles, unreachable_cluster, Format::Json).unwrap();
        execute(TopicsCommand::Profiles, unreachable_cluster, Format::Table).unwrap();
    }

    #[test]
    fn cluster_commands_surface_connection_errors() {
        let err = execute(TopicsCommand::List, unreachable_cluster, Format::Json).unwrap_err();
        assert_eq!(err.to_string(), "no cluster configured");
    }
}
