// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kafka Administration CLI
//!
//! Command-line tool for managing topics and Avro schemas.
//!
//! # Usage
//!
//! ```bash
//! # Create a topic from a profile
//! kafops-admin topics create orders --profile low_latency -p 6 -c retention.ms=86400000
//!
//! # Register a schema
//! kafops-admin schema register -f order.avsc -n orders --compat BACKWARD
//!
//! # Cluster health as a table
//! kafops-admin --format table health
//! ```
//!
//! Results go to stdout as JSON; logs go to stderr.

mod output;
mod schema;
mod topics;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kafops_core::Settings;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use output::Format;
use schema::SchemaCommand;
use topics::TopicsCommand;

/// Kafka Administration CLI
#[derive(Parser, Debug)]
#[command(name = "kafops-admin")]
#[command(about = "Kafka topic and schema registry administration")]
#[command(
    long_about = "Kafka topic and schema registry administration.\n\n\
Cluster commands connect to the brokers listed in KAFKA_BOOTSTRAP (or \
`kafka_bootstrap` in the settings file). This tool does not resolve \
KAFKA_CLUSTER_ID to a bootstrap endpoint and has no OAUTHBEARER token \
provider: use SSL, SASL with static credentials, or PLAINTEXT."
)]
#[command(version)]
struct Args {
    /// TOML settings file (environment variables override it)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Log level filter (settings `log_level` when omitted)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Result format
    #[arg(long, global = true, value_enum, default_value_t = Format::Json)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Topic management (needs KAFKA_BOOTSTRAP)
    #[command(subcommand)]
    Topics(TopicsCommand),

    /// Schema registry management
    #[command(subcommand)]
    Schema(SchemaCommand),

    /// Check cluster connectivity (needs KAFKA_BOOTSTRAP)
    Health,

    /// Show effective settings with secrets masked
    Config,

    /// Show version information
    Version,
}

impl Commands {
    fn operation(&self) -> &'static str {
        match self {
            Commands::Topics(cmd) => cmd.operation(),
            Commands::Schema(cmd) => cmd.operation(),
            Commands::Health => "health_check",
            Commands::Config => "show_config",
            Commands::Version => "show_version",
        }
    }
}

fn main() {
    let args = Args::parse();
    let operation = args.command.operation();

    if let Err(e) = run(args) {
        output::print_error(operation, &e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if let Commands::Version = args.command {
        output::print_success(
            "show_version",
            json!({ "name": "kafops-admin", "version": env!("CARGO_PKG_VERSION") }),
        );
        return Ok(());
    }

    let settings = Settings::load(args.settings.as_deref()).context("loading settings")?;
    init_tracing(
        args.log_level.as_deref().unwrap_or(&settings.log_level),
        args.log_json,
    );
    debug!(operation = args.command.operation(), "settings loaded");

    match args.command {
        Commands::Topics(cmd) => topics::run(cmd, &settings, args.format),
        Commands::Schema(cmd) => schema::run(cmd, &settings, args.format),
        Commands::Health => topics::health(&settings, args.format),
        Commands::Config => {
            let redacted = serde_json::to_value(settings.redacted())?;
            match args.format {
                Format::Json => output::print_success("show_config", json!({ "config": redacted })),
                Format::Table => output::print_table(
                    "Configuration",
                    output::field_rows(&redacted),
                    "No settings",
                ),
            }
            Ok(())
        }
        Commands::Version => Ok(()),
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
