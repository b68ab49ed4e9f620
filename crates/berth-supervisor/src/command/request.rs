// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command build requests.
//!
//! A [`CommandRequest`] is the immutable set of inputs one command needs:
//! the unit plus the collaborators commands depend on. `build` consumes the
//! request, so a request can never leak stale inputs into a later command.

use std::sync::Arc;

use crate::launcher::Launcher;
use crate::unit::DeployableUnit;
use crate::unit_registry::UnitRegistry;
use crate::workload_registry::WorkloadRegistry;

use super::{
    Command, CommandKind, CreateCommand, QuarantineCommand, ShutdownCommand, UpdateCommand,
};

/// Per-command build request.
pub struct CommandRequest {
    unit: Arc<DeployableUnit>,
    units: Arc<UnitRegistry>,
    workloads: Arc<WorkloadRegistry>,
    launcher: Arc<dyn Launcher>,
}

impl CommandRequest {
    /// Assemble a request for one unit against the supervisor's collaborators.
    pub fn new(
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

    /// Build the command for a kind, consuming the request.
    pub fn build(self, kind: CommandKind) -> Command {
        match kind {
            CommandKind::Create => Command::Create(self.create()),
            CommandKind::Shutdown => Command::Shutdown(self.shutdown()),
            CommandKind::Update => {
                let shutdown = self.shutdown();
                let create = self.create();
                Command::Update(UpdateCommand::new(self.unit, shutdown, create))
            }
            CommandKind::Quarantine => {
                Command::Quarantine(QuarantineCommand::new(self.unit))
            }
        }
    }

    fn create(&self) -> CreateCommand {
        CreateCommand::new(
            self.unit.clone(),
            self.units.clone(),
            self.workloads.clone(),
            self.launcher.clone(),
        )
    }

    fn shutdown(&self) -> ShutdownCommand {
        ShutdownCommand::new(self.unit.clone(), self.units.clone(), self.workloads.clone())
    }
}
