// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reconciliation loop.
//!
//! A periodic driver with two states: a warm-up delay while the process
//! finishes starting, then a steady-state cycle of diff → dispatch → drain →
//! sleep. Cycles are strictly serialized; a cycle's errors are logged and
//! swallowed so the loop only ever terminates through cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::launcher::CancelToken;
use crate::manager::FleetManager;
use crate::unit_registry::UnitRegistry;

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Warm-up delay before the first cycle.
    pub startup_delay: Duration,
    /// Sleep between cycles.
    pub poll_interval: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(2500),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Periodic driver that converges hosted state to discovered state.
pub struct Reconciler {
    units: Arc<UnitRegistry>,
    manager: Arc<FleetManager>,
    config: ReconcilerConfig,
    shutdown: Arc<Notify>,
    cancel: CancelToken,
}

impl Reconciler {
    /// Create a reconciler over the unit registry and fleet manager.
    pub fn new(
        units: Arc<UnitRegistry>,
        manager: Arc<FleetManager>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            units,
            manager,
            config,
            shutdown: Arc::new(Notify::new()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// The cancellation token threaded through every cycle's commands.
    ///
    /// Setting it aborts in-flight lifecycle work promptly; the shutdown
    /// handle only interrupts the loop between cycles.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the reconciliation loop until shutdown is signalled.
    ///
    /// On exit the fleet manager is disposed (stopping every hosted
    /// workload) and the known-units map is cleared.
    pub async fn run(&self) {
        info!(
            watch_root = %self.units.watch_root().display(),
            startup_delay_ms = self.config.startup_delay.as_millis() as u64,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Reconciler started"
        );

        tokio::select! {
            biased;

            _ = self.shutdown.notified() => {
                info!("Reconciler received shutdown signal during warm-up");
                self.dispose().await;
                return;
            }

            _ = tokio::time::sleep(self.config.startup_delay) => {}
        }

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Reconciler received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {
                    if let Err(e) = self.run_cycle().await {
                        error!(error = %e, "Reconciliation cycle failed");
                    }
                }
            }
        }

        self.dispose().await;
        info!("Reconciler stopped");
    }

    /// Run one reconciliation cycle: compute the three diff sets, enqueue the
    /// matching commands, and drain the queue.
    pub async fn run_cycle(&self) -> Result<()> {
        let new_units = self.units.list_new_units().await?;
        let updated_units = self.units.list_updated_units().await?;
        let removed_units = self.units.list_removed_units().await?;

        if !new_units.is_empty() || !updated_units.is_empty() || !removed_units.is_empty() {
            debug!(
                new = new_units.len(),
                updated = updated_units.len(),
                removed = removed_units.len(),
                "Reconciliation diff computed"
            );
        }

        for unit in new_units {
            self.manager.add_host(unit);
        }
        for unit in updated_units {
            self.manager.update_host(unit);
        }
        for unit in removed_units {
            self.manager.shutdown_host(unit);
        }

        self.manager.persist(Some(self.cancel.clone())).await
    }

    async fn dispose(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.manager.dispose().await;
        self.units.clear();
    }
}
