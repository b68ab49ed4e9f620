// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Berth Supervisor - Deployable-Unit Fleet Supervisor Daemon
//!
//! Watches a directory tree for deployable units and converges the set of
//! running workloads to what is on disk:
//! - New unit directory → workload started on its configured port
//! - Changed unit directory → workload restarted
//! - Vanished unit directory → workload stopped
//! - Broken unit → directory quarantined, never retried

use std::sync::Arc;
use tracing::{info, warn};

use berth_supervisor::config::Config;
use berth_supervisor::launcher::Launcher;
use berth_supervisor::launcher::process::ProcessLauncher;
use berth_supervisor::runtime::SupervisorRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "berth_supervisor=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        watch_root = %config.watch_root.display(),
        startup_delay_ms = config.startup_delay.as_millis() as u64,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Starting Berth Supervisor"
    );

    // First run on a fresh machine: the watch root may not exist yet.
    if !config.watch_root.is_dir() {
        std::fs::create_dir_all(&config.watch_root)?;
        info!(watch_root = %config.watch_root.display(), "Created watch root");
    }

    let launcher = Arc::new(ProcessLauncher::new(config.stop_grace));
    info!(launcher_type = launcher.launcher_type(), "Launcher initialized");

    // Start the runtime
    let runtime = SupervisorRuntime::builder()
        .watch_root(&config.watch_root)
        .launcher(launcher)
        .startup_delay(config.startup_delay)
        .poll_interval(config.poll_interval)
        .build()?
        .start();

    info!("Supervisor ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Graceful shutdown
    runtime.shutdown().await?;

    info!("Berth Supervisor shut down");

    Ok(())
}
