// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shutdown command - stop a hosted unit and forget it.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::launcher::CancelToken;
use crate::unit::DeployableUnit;
use crate::unit_registry::UnitRegistry;
use crate::workload_registry::WorkloadRegistry;

use super::is_cancelled;

/// Stops a unit's workload, unregisters its handle, and removes the unit
/// from the known map.
///
/// Idempotent: a unit with no registered handle is treated as already
/// stopped and is still forgotten.
pub struct ShutdownCommand {
    unit: Arc<DeployableUnit>,
    units: Arc<UnitRegistry>,
    workloads: Arc<WorkloadRegistry>,
}

impl ShutdownCommand {
    pub(crate) fn new(
        unit: Arc<DeployableUnit>,
        units: Arc<UnitRegistry>,
        workloads: Arc<WorkloadRegistry>,
    ) -> Self {
        Self {
            unit,
            units,
            workloads,
        }
    }

    pub(crate) fn unit(&self) -> &Arc<DeployableUnit> {
        &self.unit
    }

    pub(crate) async fn execute(&self, token: Option<CancelToken>) -> Result<()> {
        if is_cancelled(&token) {
            return Err(Error::Cancelled);
        }

        match self.workloads.lookup(&self.unit) {
            None => {
                debug!(
                    unit = %self.unit.name(),
                    "No handle registered, treating as already stopped"
                );
            }
            Some(handle) => {
                debug!(
                    unit = %self.unit.name(),
                    key = ?self.unit.hosted_key(),
                    "Stopping unit"
                );
                handle.stop(token).await?;
                self.workloads.unregister(&self.unit);
                debug!(unit = %self.unit.name(), "Unit stopped");
            }
        }

        self.units.forget(self.unit.name());
        Ok(())
    }
}
