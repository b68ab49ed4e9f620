// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for berth-supervisor.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Supervisor errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A required argument was blank or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The watch root directory does not exist.
    #[error("Watch root not found: {}", .0.display())]
    WatchRootNotFound(PathBuf),

    /// A unit's backing directory vanished before a command ran against it.
    #[error("Unit directory not found: {}", .0.display())]
    UnitDirectoryNotFound(PathBuf),

    /// A unit is missing its workload artifact or configuration file.
    #[error("Unit file missing: {}", .0.display())]
    UnitFileMissing(PathBuf),

    /// The unit configuration declares an unusable port.
    #[error("Invalid port {0} in unit configuration")]
    InvalidPort(i64),

    /// A freshly generated hosted key was already registered.
    #[error("Hosted key collision: {0}")]
    KeyCollision(Uuid),

    /// Workload launch or stop failed.
    #[error("Launcher error: {0}")]
    Launcher(#[from] crate::launcher::LauncherError),

    /// Execution was cancelled.
    #[error("Execution cancelled")]
    Cancelled,

    /// One or more lifecycle commands failed during a queue drain.
    #[error("{failed} lifecycle command(s) failed")]
    CommandsFailed {
        /// Number of commands that failed in the drained batch.
        failed: usize,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type using the supervisor [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
