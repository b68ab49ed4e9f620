// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Update command - re-host a changed unit.

use std::sync::Arc;

use tracing::info;

use crate::launcher::CancelToken;
use crate::unit::DeployableUnit;

use super::{CommandError, CommandKind, CreateCommand, ShutdownCommand};

/// Fixed-order composition: shutdown the running workload, then create a
/// fresh one. The shutdown always completes (or fails) before the create
/// begins; a partial failure surfaces as the failing phase's error.
pub struct UpdateCommand {
    unit: Arc<DeployableUnit>,
    shutdown: ShutdownCommand,
    create: CreateCommand,
}

impl UpdateCommand {
    pub(crate) fn new(
        unit: Arc<DeployableUnit>,
        shutdown: ShutdownCommand,
        create: CreateCommand,
    ) -> Self {
        Self {
            unit,
            shutdown,
            create,
        }
    }

    pub(crate) fn unit(&self) -> &Arc<DeployableUnit> {
        &self.unit
    }

    pub(crate) async fn execute(&self, token: Option<CancelToken>) -> Result<(), CommandError> {
        info!(unit = %self.unit.name(), "Restarting unit");

        self.shutdown
            .execute(token.clone())
            .await
            .map_err(|e| CommandError::new(CommandKind::Shutdown, self.unit.clone(), e))?;

        self.create
            .execute(token)
            .await
            .map_err(|e| CommandError::new(CommandKind::Create, self.unit.clone(), e))?;

        Ok(())
    }
}
