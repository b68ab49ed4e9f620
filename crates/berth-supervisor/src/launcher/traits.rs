// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Launcher trait definitions.
//!
//! Defines the abstract interface the supervisor needs from the thing that
//! actually boots a workload and exposes it on a network port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use thiserror::Error;

/// Errors from launcher operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LauncherError {
    /// The configured port is already bound by another process.
    #[error("Port {0} is already in use")]
    PortInUse(u16),

    /// Workload process failed to start.
    #[error("Workload start failed: {0}")]
    StartFailed(String),

    /// Workload process failed to stop.
    #[error("Workload stop failed: {0}")]
    StopFailed(String),

    /// Execution was cancelled.
    #[error("Execution cancelled")]
    Cancelled,

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for launcher operations.
pub type Result<T> = std::result::Result<T, LauncherError>;

/// Cancellation token for aborting in-flight lifecycle work.
pub type CancelToken = Arc<AtomicBool>;

/// Everything a launcher needs to start one workload.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Unit name (used for logging and handle identification)
    pub unit_name: String,
    /// The unit's backing directory, used as the workload's working directory
    pub unit_dir: PathBuf,
    /// Path to the workload artifact to execute
    pub artifact_path: PathBuf,
    /// Path to the unit's configuration file
    pub config_path: PathBuf,
    /// Network port the workload must bind
    pub port: u16,
}

/// Trait for workload launchers.
///
/// Launchers are pure execution engines: they start a workload and hand back
/// a handle. Registration and bookkeeping are the caller's concern.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Launcher type identifier (e.g., "process", "mock").
    fn launcher_type(&self) -> &'static str;

    /// Start a workload and return a handle to the running instance.
    async fn start(&self, spec: &LaunchSpec) -> Result<Arc<dyn WorkloadHandle>>;
}

/// Handle for a running workload instance.
///
/// Owned exclusively by the workload handle registry while active.
#[async_trait]
pub trait WorkloadHandle: std::fmt::Debug + Send + Sync {
    /// Port the workload occupies.
    fn port(&self) -> u16;

    /// When the workload was started.
    fn started_at(&self) -> DateTime<Utc>;

    /// Process ID of the workload, when the launcher tracks one.
    fn pid(&self) -> Option<u32> {
        None
    }

    /// Stop the workload. Idempotent: stopping an already-stopped workload
    /// succeeds.
    async fn stop(&self, token: Option<CancelToken>) -> Result<()>;
}
