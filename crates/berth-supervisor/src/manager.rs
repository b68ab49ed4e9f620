// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fleet manager.
//!
//! Owns the command queue. Reconciliation results are translated into
//! enqueued commands; `persist` drains the queue, launching every pending
//! command concurrently and joining on the whole batch. A failed command is
//! logged and answered with an immediate Quarantine of the offending unit.
//! The manager never inspects the filesystem itself.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, warn};

use crate::command::{Command, CommandKind, CommandRequest, is_cancelled};
use crate::error::{Error, Result};
use crate::launcher::{CancelToken, Launcher};
use crate::unit::DeployableUnit;
use crate::unit_registry::UnitRegistry;
use crate::workload_registry::WorkloadRegistry;

/// Translates diff sets into lifecycle commands and executes them.
pub struct FleetManager {
    queue: Mutex<VecDeque<Command>>,
    pending: Mutex<HashSet<String>>,
    units: Arc<UnitRegistry>,
    workloads: Arc<WorkloadRegistry>,
    launcher: Arc<dyn Launcher>,
}

impl FleetManager {
    /// Create a manager over the two registries and a launcher.
    pub fn new(
        units: Arc<UnitRegistry>,
        workloads: Arc<WorkloadRegistry>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            pending: Mutex::new(HashSet::new()),
            units,
            workloads,
            launcher,
        }
    }

    /// Enqueue a Create for a newly discovered unit.
    pub fn add_host(&self, unit: Arc<DeployableUnit>) -> &Self {
        self.enqueue(CommandKind::Create, unit)
    }

    /// Enqueue an Update (shutdown-then-create) for a changed unit.
    pub fn update_host(&self, unit: Arc<DeployableUnit>) -> &Self {
        self.enqueue(CommandKind::Update, unit)
    }

    /// Enqueue a Shutdown for a removed unit.
    pub fn shutdown_host(&self, unit: Arc<DeployableUnit>) -> &Self {
        self.enqueue(CommandKind::Shutdown, unit)
    }

    /// Number of commands waiting in the queue.
    pub fn pending_commands(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drain the queue, executing every pending command concurrently.
    ///
    /// Each command failure is logged and answered with an immediate
    /// Quarantine of the failing unit, executed outside the main queue.
    /// Returns an error if any command in the batch ultimately failed, or
    /// if a quarantine move itself failed (fatal: retrying against a
    /// half-moved directory is unsafe).
    pub async fn persist(&self, token: Option<CancelToken>) -> Result<()> {
        let mut tasks = Vec::new();
        loop {
            if is_cancelled(&token) {
                break;
            }
            let Some(command) = self.queue.lock().pop_front() else {
                break;
            };
            let task_token = token.clone();
            tasks.push(tokio::spawn(async move {
                command.execute(task_token).await
            }));
        }
        self.pending.lock().clear();

        let mut failed = 0usize;
        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    error!(
                        kind = %e.kind,
                        unit = %e.unit.name(),
                        error = %e.source,
                        "Lifecycle command failed, quarantining unit"
                    );
                    self.quarantine(e.unit.clone(), token.clone()).await?;
                }
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "Lifecycle command task panicked");
                }
            }
        }

        if failed > 0 {
            return Err(Error::CommandsFailed { failed });
        }
        Ok(())
    }

    /// Clear the pending queue and stop every registered workload handle.
    /// Idempotent.
    pub async fn dispose(&self) {
        self.queue.lock().clear();
        self.pending.lock().clear();
        for handle in self.workloads.drain() {
            if let Err(e) = handle.stop(None).await {
                warn!(error = %e, "Failed to stop workload during dispose");
            }
        }
    }

    fn enqueue(&self, kind: CommandKind, unit: Arc<DeployableUnit>) -> &Self {
        // One in-flight command per unit and cycle: a name already pending
        // is refused rather than double-dispatched.
        if !self.pending.lock().insert(unit.name().to_string()) {
            warn!(
                unit = %unit.name(),
                kind = %kind,
                "A command for this unit is already pending, skipping"
            );
            return self;
        }

        let command = self.request(unit).build(kind);
        self.queue.lock().push_back(command);
        self
    }

    fn request(&self, unit: Arc<DeployableUnit>) -> CommandRequest {
        CommandRequest::new(
            unit,
            self.units.clone(),
            self.workloads.clone(),
            self.launcher.clone(),
        )
    }

    async fn quarantine(&self, unit: Arc<DeployableUnit>, token: Option<CancelToken>) -> Result<()> {
        let command = self.request(unit).build(CommandKind::Quarantine);
        command.execute(token).await.map_err(|e| e.source)
    }
}
