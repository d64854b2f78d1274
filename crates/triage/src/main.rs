// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triage - healthcare inbox triage.
//!
//! This is the binary entry point: batch processing, the HTTP surface, and
//! maintenance commands.

mod process;
mod reclassify;
mod serve;
mod shutdown;
mod wiring;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use triage_config::{ConfigError, TriageConfig};
use triage_core::{PluginAdapter, TriageError};

/// Triage - classify patient inbox messages by urgency.
#[derive(Parser, Debug)]
#[command(name = "triage", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this TOML file instead of the default locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database and apply migrations.
    InitDb,
    /// Classify and store every message in a CSV file.
    Process {
        /// CSV with columns message_id, subject, message, datetime.
        csv: PathBuf,
    },
    /// Run the HTTP query and update API.
    Serve {
        /// Host address to bind (overrides gateway.host).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides gateway.port).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Classify a stored message again.
    Reclassify {
        message_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            triage_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Commands::InitDb => init_db(&config).await.map(|()| 0),
        Commands::Process { csv } => process::run_process(&config, &csv).await,
        Commands::Serve { host, port } => serve::run_serve(&config, host, port).await.map(|()| 0),
        Commands::Reclassify { message_id } => {
            reclassify::run_reclassify(&config, &message_id).await.map(|()| 0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TriageConfig, Vec<ConfigError>> {
    match path {
        Some(path) => triage_config::load_and_validate_path(path),
        None => triage_config::load_and_validate(),
    }
}

async fn init_db(config: &TriageConfig) -> Result<(), TriageError> {
    let storage = wiring::open_storage(config).await?;
    storage.shutdown().await?;
    println!(
        "{} Database initialized at {}",
        "✓".green(),
        config.storage.database_path
    );
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("triage={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
