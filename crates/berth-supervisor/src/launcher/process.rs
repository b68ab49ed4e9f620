// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process launcher - runs workloads as independent OS processes.
//!
//! Each workload artifact is spawned as its own child process with the
//! configured port in its environment, so a broken workload cannot corrupt
//! the supervisor. Stopping sends SIGTERM, waits out a grace period, and
//! falls back to SIGKILL.

use std::process::Stdio;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::traits::{CancelToken, LaunchSpec, Launcher, LauncherError, Result, WorkloadHandle};

/// Launcher that spawns workload artifacts as child processes.
pub struct ProcessLauncher {
    stop_grace: Duration,
}

impl ProcessLauncher {
    /// Create a launcher with the given SIGTERM-to-SIGKILL grace period.
    pub fn new(stop_grace: Duration) -> Self {
        Self { stop_grace }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    fn launcher_type(&self) -> &'static str {
        "process"
    }

    async fn start(&self, spec: &LaunchSpec) -> Result<Arc<dyn WorkloadHandle>> {
        // Surface a port conflict before paying for a spawn. The probe is
        // dropped immediately so the workload can bind the port itself.
        match tokio::net::TcpListener::bind(("127.0.0.1", spec.port)).await {
            Ok(probe) => drop(probe),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                return Err(LauncherError::PortInUse(spec.port));
            }
            Err(e) => return Err(LauncherError::Io(e)),
        }

        let mut command = Command::new(&spec.artifact_path);
        command
            .current_dir(&spec.unit_dir)
            .env("PORT", spec.port.to_string())
            .arg("--config")
            .arg(&spec.config_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            LauncherError::StartFailed(format!("spawn {}: {e}", spec.artifact_path.display()))
        })?;
        let pid = child.id();

        info!(
            unit = %spec.unit_name,
            port = spec.port,
            pid = ?pid,
            "Workload process started"
        );

        Ok(Arc::new(ProcessHandle {
            unit_name: spec.unit_name.clone(),
            port: spec.port,
            pid,
            started_at: Utc::now(),
            stop_grace: self.stop_grace,
            child: tokio::sync::Mutex::new(Some(child)),
        }))
    }
}

/// Handle wrapping a spawned workload process.
#[derive(Debug)]
pub struct ProcessHandle {
    unit_name: String,
    port: u16,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    stop_grace: Duration,
    child: tokio::sync::Mutex<Option<Child>>,
}

#[async_trait]
impl WorkloadHandle for ProcessHandle {
    fn port(&self) -> u16 {
        self.port
    }

    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn stop(&self, token: Option<CancelToken>) -> Result<()> {
        let Some(mut child) = self.child.lock().await.take() else {
            debug!(unit = %self.unit_name, "Workload already stopped");
            return Ok(());
        };

        let cancelled = token
            .map(|t| t.load(Ordering::SeqCst))
            .unwrap_or(false);

        // Graceful path: SIGTERM and wait out the grace period. Skipped when
        // cancellation already fired, where a prompt kill is wanted.
        if !cancelled && let Some(pid) = self.pid {
            // Failure to signal means the process is already gone.
            let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            match tokio::time::timeout(self.stop_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(
                        unit = %self.unit_name,
                        pid = pid,
                        status = %status,
                        "Workload process exited"
                    );
                    return Ok(());
                }
                Ok(Err(e)) => return Err(LauncherError::Io(e)),
                Err(_) => {
                    warn!(
                        unit = %self.unit_name,
                        pid = pid,
                        grace_secs = self.stop_grace.as_secs(),
                        "Workload did not exit within grace period, killing"
                    );
                }
            }
        }

        child.kill().await.map_err(LauncherError::Io)?;
        debug!(unit = %self.unit_name, "Workload process killed");
        Ok(())
    }
}
