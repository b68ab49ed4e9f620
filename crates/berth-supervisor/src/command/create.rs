// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Create command - host a deployable unit.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::launcher::{CancelToken, LaunchSpec, Launcher};
use crate::unit::{DeployableUnit, UnitConfig};
use crate::unit_registry::UnitRegistry;
use crate::workload_registry::WorkloadRegistry;

use super::is_cancelled;

/// Validates a unit's files, launches its workload, and records it as hosted.
pub struct CreateCommand {
    unit: Arc<DeployableUnit>,
    units: Arc<UnitRegistry>,
    workloads: Arc<WorkloadRegistry>,
    launcher: Arc<dyn Launcher>,
}

impl CreateCommand {
    pub(crate) fn new(
        unit: Arc<DeployableUnit>,
        units: Arc<UnitRegistry>,
        workloads: Arc<WorkloadRegistry>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            unit,
            units,
            workloads,
            launcher,
        }
    }

    pub(crate) fn unit(&self) -> &Arc<DeployableUnit> {
        &self.unit
    }

    pub(crate) async fn execute(&self, token: Option<CancelToken>) -> Result<()> {
        if is_cancelled(&token) {
            return Err(Error::Cancelled);
        }

        let dir = self.unit.path();
        if !dir.is_dir() {
            return Err(Error::UnitDirectoryNotFound(dir.to_path_buf()));
        }

        let artifact_path = self.unit.artifact_path();
        if !artifact_path.is_file() {
            return Err(Error::UnitFileMissing(artifact_path));
        }
        let config_path = self.unit.config_path();
        if !config_path.is_file() {
            return Err(Error::UnitFileMissing(config_path));
        }
        debug!(unit = %self.unit.name(), "Unit directory validated");

        let config = UnitConfig::load(&config_path).await?;
        if config.port < 1 || config.port > i64::from(u16::MAX) {
            return Err(Error::InvalidPort(config.port));
        }
        let port = config.port as u16;

        if is_cancelled(&token) {
            return Err(Error::Cancelled);
        }

        let spec = LaunchSpec {
            unit_name: self.unit.name().to_string(),
            unit_dir: dir.to_path_buf(),
            artifact_path,
            config_path,
            port,
        };
        let handle = self.launcher.start(&spec).await?;

        self.unit.set_port(port);
        self.workloads.register(&self.unit, handle)?;
        self.units.persist(std::slice::from_ref(&self.unit));

        info!(unit = %self.unit.name(), port = port, "Unit hosted");
        Ok(())
    }
}
