// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lifecycle commands.
//!
//! Each command is a single, stateless unit of work over one deployable unit.
//! The variant set is closed: dispatch is an exhaustive match on
//! [`CommandKind`], and every failure crosses the module boundary as a
//! [`CommandError`] carrying the command kind, the offending unit, and the
//! underlying cause, which is the only shape the fleet manager inspects.

mod create;
mod quarantine;
mod request;
mod shutdown;
mod update;

pub use create::CreateCommand;
pub use quarantine::QuarantineCommand;
pub use request::CommandRequest;
pub use shutdown::ShutdownCommand;
pub use update::UpdateCommand;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::error::Error;
use crate::launcher::CancelToken;
use crate::unit::DeployableUnit;

/// The closed set of lifecycle command kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Host a newly discovered unit.
    Create,
    /// Stop a hosted unit and forget it.
    Shutdown,
    /// Re-host a changed unit (shutdown, then create).
    Update,
    /// Move a permanently failing unit out of the watch root.
    Quarantine,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Create => "Create",
            CommandKind::Shutdown => "Shutdown",
            CommandKind::Update => "Update",
            CommandKind::Quarantine => "Quarantine",
        };
        f.write_str(name)
    }
}

/// Uniform failure wrapper for command execution.
#[derive(Debug, thiserror::Error)]
#[error("{} command failed for unit {}: {}", .kind, .unit.name(), .source)]
pub struct CommandError {
    /// Kind of the command that failed.
    pub kind: CommandKind,
    /// The unit the command was operating on.
    pub unit: Arc<DeployableUnit>,
    /// The underlying cause.
    #[source]
    pub source: Error,
}

impl CommandError {
    pub(crate) fn new(kind: CommandKind, unit: Arc<DeployableUnit>, source: Error) -> Self {
        Self { kind, unit, source }
    }
}

/// A lifecycle command, ready to execute exactly once.
pub enum Command {
    /// Host a unit.
    Create(CreateCommand),
    /// Stop and forget a unit.
    Shutdown(ShutdownCommand),
    /// Re-host a unit.
    Update(UpdateCommand),
    /// Quarantine a unit's directory.
    Quarantine(QuarantineCommand),
}

impl Command {
    /// Kind tag of this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create(_) => CommandKind::Create,
            Command::Shutdown(_) => CommandKind::Shutdown,
            Command::Update(_) => CommandKind::Update,
            Command::Quarantine(_) => CommandKind::Quarantine,
        }
    }

    /// The unit this command operates on.
    pub fn unit(&self) -> &Arc<DeployableUnit> {
        match self {
            Command::Create(cmd) => cmd.unit(),
            Command::Shutdown(cmd) => cmd.unit(),
            Command::Update(cmd) => cmd.unit(),
            Command::Quarantine(cmd) => cmd.unit(),
        }
    }

    /// Execute the command, wrapping any underlying failure into a
    /// [`CommandError`] at this outermost boundary.
    pub async fn execute(&self, token: Option<CancelToken>) -> Result<(), CommandError> {
        match self {
            Command::Create(cmd) => cmd
                .execute(token)
                .await
                .map_err(|e| CommandError::new(CommandKind::Create, cmd.unit().clone(), e)),
            Command::Shutdown(cmd) => cmd
                .execute(token)
                .await
                .map_err(|e| CommandError::new(CommandKind::Shutdown, cmd.unit().clone(), e)),
            // An update surfaces its failing sub-command's error unchanged,
            // so a partial failure is attributed to the phase that broke.
            Command::Update(cmd) => cmd.execute(token).await,
            Command::Quarantine(cmd) => cmd
                .execute(token)
                .await
                .map_err(|e| CommandError::new(CommandKind::Quarantine, cmd.unit().clone(), e)),
        }
    }
}

/// Whether a cancellation token has fired.
pub(crate) fn is_cancelled(token: &Option<CancelToken>) -> bool {
    token
        .as_ref()
        .map(|t| t.load(Ordering::SeqCst))
        .unwrap_or(false)
}
