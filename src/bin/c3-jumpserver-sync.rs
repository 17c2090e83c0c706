// Copyright (c) 2025 - Cowboy AI, Inc.
//! C3 → JumpServer Sync
//!
//! Mirrors the OpenC3 CMDB into JumpServer: department tree as nodes,
//! Linux hosts as assets, user authorization levels as asset permissions.
//!
//! Run with: cargo run --bin c3-jumpserver-sync -- --config sync.toml sync
//!
//! Secrets may come from the environment instead of the file:
//! `JUMPSERVER_URL`, `JUMPSERVER_KEY_ID`, `JUMPSERVER_SECRET`, `CMDB_URL`,
//! `CMDB_API_KEY`.

use anyhow::{Context, Result};
use cim_asset_sync::{
    JumpServerClient, OpenC3Client, Phase, SyncConfig, SyncReport, SyncResult, SyncRunner,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "c3-jumpserver-sync", version, about = "Sync OpenC3 CMDB into JumpServer")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SYNC_CONFIG", default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a reconciliation pass
    Sync {
        /// Phases to run: nodes, hosts, permissions (default: all)
        #[arg(long = "phase")]
        phases: Vec<Phase>,
    },
    /// Validate the configuration and probe both endpoints
    CheckConfig,
}

/// `RUST_LOG` when set and valid, otherwise info (debug with `--verbose`)
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .init();
}

fn connect(config: &SyncConfig) -> SyncResult<(OpenC3Client, JumpServerClient)> {
    Ok((
        OpenC3Client::new(&config.cmdb)?,
        JumpServerClient::new(&config.jumpserver)?,
    ))
}

fn log_report(report: &SyncReport) {
    if let Some(nodes) = &report.nodes {
        info!(
            "Nodes: created {}, deleted {}, failed {}",
            nodes.created, nodes.deleted, nodes.failed
        );
    }
    if let Some(hosts) = &report.hosts {
        info!(
            "Hosts: added {}, updated {}, failed {}, deleted {}, delete failed {}",
            hosts.added, hosts.updated, hosts.failed, hosts.deleted, hosts.delete_failed
        );
    }
    if let Some(perms) = &report.permissions {
        info!(
            "Permissions: created {}, updated {}, deleted {}, failed {}, skipped {}",
            perms.created, perms.updated, perms.deleted, perms.failed, perms.skipped
        );
    }
    if let Some(settle) = &report.settle {
        info!(
            "Settle: created {}, deleted {}, failed {}",
            settle.created, settle.deleted, settle.failed
        );
    }
}

async fn sync(config: &SyncConfig, phases: Vec<Phase>) -> Result<bool> {
    let phases = if phases.is_empty() {
        Phase::ALL.to_vec()
    } else {
        phases
    };
    info!(
        "Starting sync: {}",
        phases.iter().map(Phase::as_str).collect::<Vec<_>>().join(", ")
    );

    let (cmdb, store) = connect(config).context("Failed to create API clients")?;
    let report = SyncRunner::new(&cmdb, &store, config).run(&phases).await;
    log_report(&report);
    Ok(report.success)
}

async fn check_config(config: &SyncConfig) -> Result<bool> {
    info!("Configuration is valid:");
    info!("  - JumpServer URL: {}", config.jumpserver.url);
    info!("  - CMDB URL: {}", config.cmdb.url);
    info!("  - Node root: {}", config.codec.root());
    info!("  - Template mappings: {}", config.templates.mappings().len());
    info!("  - Excluded addresses: {}", config.excluded.len());
    info!("  - Permission prefix: {}", config.permission_prefix);

    let (cmdb, store) = connect(config).context("Failed to create API clients")?;
    let mut healthy = true;
    if let Err(e) = cmdb.health_check().await {
        error!("CMDB check failed: {}", e);
        healthy = false;
    }
    if let Err(e) = store.health_check().await {
        error!("JumpServer check failed: {}", e);
        healthy = false;
    }
    if healthy {
        info!("Both endpoints reachable");
    }
    Ok(healthy)
}

async fn run(cli: Cli) -> Result<bool> {
    let config = SyncConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Command::Sync { phases } => sync(&config, phases).await,
        Command::CheckConfig => check_config(&config).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
