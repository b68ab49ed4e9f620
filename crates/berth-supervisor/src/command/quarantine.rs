// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Quarantine command - move a failing unit out of the watch root.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::launcher::CancelToken;
use crate::unit::DeployableUnit;
use crate::unit_registry::QUARANTINE_DIR_NAME;

/// Moves a unit's backing directory to a per-run-unique path under the
/// quarantine area, so future scans never reconsider it.
///
/// This is the supervisor's terminal failure-isolation action. It does not
/// touch the registries: the next cycle's removed-diff takes care of
/// forgetting the unit.
pub struct QuarantineCommand {
    unit: Arc<DeployableUnit>,
}

impl QuarantineCommand {
    pub(crate) fn new(unit: Arc<DeployableUnit>) -> Self {
        Self { unit }
    }

    pub(crate) fn unit(&self) -> &Arc<DeployableUnit> {
        &self.unit
    }

    pub(crate) async fn execute(&self, _token: Option<CancelToken>) -> Result<()> {
        let dir = self.unit.path();
        let Some(parent) = dir.parent() else {
            return Err(Error::InvalidArgument(format!(
                "unit path {} has no parent directory",
                dir.display()
            )));
        };

        let quarantine_root = parent.join(QUARANTINE_DIR_NAME);
        tokio::fs::create_dir_all(&quarantine_root).await?;

        let destination = quarantine_root.join(format!("{}-{}", Uuid::new_v4(), self.unit.name()));
        tokio::fs::rename(dir, &destination).await?;

        warn!(
            unit = %self.unit.name(),
            destination = %destination.display(),
            "Unit quarantined"
        );
        Ok(())
    }
}
