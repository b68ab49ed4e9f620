// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable runtime for berth-supervisor.
//!
//! This module provides [`SupervisorRuntime`] which allows embedding the
//! supervisor into an existing tokio application instead of running it as a
//! standalone daemon.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use berth_supervisor::launcher::process::ProcessLauncher;
//! use berth_supervisor::runtime::SupervisorRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let launcher = Arc::new(ProcessLauncher::new(Duration::from_secs(5)));
//!
//!     let runtime = SupervisorRuntime::builder()
//!         .watch_root("apps")
//!         .launcher(launcher)
//!         .build()?
//!         .start();
//!
//!     // ... run your application ...
//!
//!     runtime.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Notify;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::launcher::{CancelToken, Launcher};
use crate::manager::FleetManager;
use crate::reconciler::{Reconciler, ReconcilerConfig};
use crate::unit_registry::UnitRegistry;
use crate::workload_registry::WorkloadRegistry;

/// Builder for creating a [`SupervisorRuntime`].
pub struct SupervisorRuntimeBuilder {
    watch_root: PathBuf,
    launcher: Option<Arc<dyn Launcher>>,
    startup_delay: Duration,
    poll_interval: Duration,
    notifications: Option<UnboundedSender<String>>,
}

impl Default for SupervisorRuntimeBuilder {
    fn default() -> Self {
        let defaults = ReconcilerConfig::default();
        Self {
            watch_root: PathBuf::from("apps"),
            launcher: None,
            startup_delay: defaults.startup_delay,
            poll_interval: defaults.poll_interval,
            notifications: None,
        }
    }
}

impl SupervisorRuntimeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the watch root directory.
    ///
    /// Default: `apps`
    pub fn watch_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch_root = path.into();
        self
    }

    /// Set the workload launcher (required).
    pub fn launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Set the warm-up delay before the first reconciliation cycle.
    ///
    /// Default: 2.5 seconds
    pub fn startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Set the sleep between reconciliation cycles.
    ///
    /// Default: 100 milliseconds
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set a channel that receives the name of every newly hosted unit.
    pub fn notifications(mut self, sender: UnboundedSender<String>) -> Self {
        self.notifications = Some(sender);
        self
    }

    /// Build the runtime configuration.
    ///
    /// Fails fast if the launcher is missing or the watch root does not
    /// exist.
    pub fn build(self) -> Result<SupervisorRuntimeConfig> {
        let launcher = self
            .launcher
            .ok_or_else(|| anyhow::anyhow!("launcher is required"))?;

        let units = Arc::new(UnitRegistry::new(self.watch_root)?);
        let workloads = Arc::new(match self.notifications {
            Some(sender) => WorkloadRegistry::with_notifications(sender),
            None => WorkloadRegistry::new(),
        });

        Ok(SupervisorRuntimeConfig {
            units,
            workloads,
            launcher,
            reconciler: ReconcilerConfig {
                startup_delay: self.startup_delay,
                poll_interval: self.poll_interval,
            },
        })
    }
}

/// Configuration for a [`SupervisorRuntime`].
pub struct SupervisorRuntimeConfig {
    units: Arc<UnitRegistry>,
    workloads: Arc<WorkloadRegistry>,
    launcher: Arc<dyn Launcher>,
    reconciler: ReconcilerConfig,
}

impl SupervisorRuntimeConfig {
    /// Start the runtime, spawning the reconciliation loop task.
    pub fn start(self) -> SupervisorRuntime {
        let manager = Arc::new(FleetManager::new(
            self.units.clone(),
            self.workloads.clone(),
            self.launcher,
        ));
        let reconciler = Reconciler::new(self.units.clone(), manager, self.reconciler);
        let reconciler_shutdown = reconciler.shutdown_handle();
        let cancel = reconciler.cancel_token();

        let reconciler_handle = tokio::spawn(async move {
            reconciler.run().await;
        });

        info!("SupervisorRuntime started");

        SupervisorRuntime {
            reconciler_handle,
            reconciler_shutdown,
            cancel,
            units: self.units,
            workloads: self.workloads,
        }
    }
}

/// A running supervisor instance that can be embedded in an application.
///
/// The runtime manages the reconciliation loop task. Call
/// [`shutdown`](Self::shutdown) for graceful termination: in-flight
/// lifecycle commands are cancelled, every hosted workload is stopped, and
/// the loop task is joined.
pub struct SupervisorRuntime {
    reconciler_handle: JoinHandle<()>,
    reconciler_shutdown: Arc<Notify>,
    cancel: CancelToken,
    units: Arc<UnitRegistry>,
    workloads: Arc<WorkloadRegistry>,
}

impl SupervisorRuntime {
    /// Create a new builder for configuring the runtime.
    pub fn builder() -> SupervisorRuntimeBuilder {
        SupervisorRuntimeBuilder::new()
    }

    /// The deployable-unit registry backing this runtime.
    pub fn unit_registry(&self) -> &Arc<UnitRegistry> {
        &self.units
    }

    /// The workload handle registry backing this runtime.
    pub fn workload_registry(&self) -> &Arc<WorkloadRegistry> {
        &self.workloads
    }

    /// Check if the reconciliation loop is still running.
    pub fn is_running(&self) -> bool {
        !self.reconciler_handle.is_finished()
    }

    /// Gracefully shut down the runtime.
    pub async fn shutdown(self) -> Result<()> {
        info!("SupervisorRuntime shutting down...");

        self.cancel.store(true, Ordering::SeqCst);
        self.reconciler_shutdown.notify_one();

        if let Err(e) = self.reconciler_handle.await {
            error!("Reconciler task panicked: {}", e);
            return Err(anyhow::anyhow!("reconciler task panicked: {e}"));
        }

        info!("SupervisorRuntime shutdown complete");
        Ok(())
    }
}
