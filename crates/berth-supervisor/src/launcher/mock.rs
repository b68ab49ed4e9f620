// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock launcher for testing.
//!
//! A simple launcher implementation that simulates workload execution
//! without spawning processes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::traits::{CancelToken, LaunchSpec, Launcher, LauncherError, Result, WorkloadHandle};

/// Mock launcher for testing.
pub struct MockLauncher {
    handles: Mutex<HashMap<String, Arc<MockHandle>>>,
    starts: AtomicUsize,
    /// If true, every start fails.
    pub fail_start: bool,
    /// If true, every handle's stop fails.
    pub fail_stop: bool,
    /// Optional delay to simulate launch time (in milliseconds).
    pub start_delay_ms: u64,
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLauncher {
    /// Create a mock launcher whose workloads start and stop cleanly.
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            starts: AtomicUsize::new(0),
            fail_start: false,
            fail_stop: false,
            start_delay_ms: 0,
        }
    }

    /// Create a mock launcher that fails every start.
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new()
        }
    }

    /// Create a mock launcher whose handles fail to stop.
    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::new()
        }
    }

    /// Number of successful starts so far.
    pub fn started_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// The most recent handle started for a unit name, if any.
    pub async fn handle_for(&self, unit_name: &str) -> Option<Arc<MockHandle>> {
        self.handles.lock().await.get(unit_name).cloned()
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    fn launcher_type(&self) -> &'static str {
        "mock"
    }

    async fn start(&self, spec: &LaunchSpec) -> Result<Arc<dyn WorkloadHandle>> {
        if self.start_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.start_delay_ms)).await;
        }

        if self.fail_start {
            return Err(LauncherError::StartFailed("mock start failure".to_string()));
        }

        let handle = Arc::new(MockHandle {
            unit_name: spec.unit_name.clone(),
            port: spec.port,
            started_at: Utc::now(),
            fail_stop: self.fail_stop,
            stopped: AtomicBool::new(false),
        });

        self.handles
            .lock()
            .await
            .insert(spec.unit_name.clone(), handle.clone());
        self.starts.fetch_add(1, Ordering::SeqCst);

        Ok(handle)
    }
}

/// Handle produced by [`MockLauncher`], recording whether it was stopped.
#[derive(Debug)]
pub struct MockHandle {
    unit_name: String,
    port: u16,
    started_at: DateTime<Utc>,
    fail_stop: bool,
    stopped: AtomicBool,
}

impl MockHandle {
    /// The unit this handle was started for.
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Whether `stop` was called successfully on this handle.
    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkloadHandle for MockHandle {
    fn port(&self) -> u16 {
        self.port
    }

    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    async fn stop(&self, _token: Option<CancelToken>) -> Result<()> {
        if self.fail_stop {
            return Err(LauncherError::StopFailed("mock stop failure".to_string()));
        }
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn spec(name: &str, port: u16) -> LaunchSpec {
        LaunchSpec {
            unit_name: name.to_string(),
            unit_dir: PathBuf::from("/tmp/apps").join(name),
            artifact_path: PathBuf::from("/tmp/apps").join(name).join(format!("{name}.bin")),
            config_path: PathBuf::from("/tmp/apps").join(name).join("workload.json"),
            port,
        }
    }

    #[tokio::test]
    async fn test_start_records_handle() {
        let launcher = MockLauncher::new();
        let handle = launcher.start(&spec("orders", 6010)).await.unwrap();

        assert_eq!(handle.port(), 6010);
        assert_eq!(launcher.started_count(), 1);
        assert!(launcher.handle_for("orders").await.is_some());
    }

    #[tokio::test]
    async fn test_failing_launcher_rejects_start() {
        let launcher = MockLauncher::failing();
        let err = launcher.start(&spec("orders", 6010)).await.unwrap_err();

        assert!(matches!(err, LauncherError::StartFailed(_)));
        assert_eq!(launcher.started_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_marks_handle_stopped() {
        let launcher = MockLauncher::new();
        launcher.start(&spec("orders", 6010)).await.unwrap();

        let handle = launcher.handle_for("orders").await.unwrap();
        assert!(!handle.stopped());

        handle.stop(None).await.unwrap();
        assert!(handle.stopped());
    }

    #[tokio::test]
    async fn test_failing_stop() {
        let launcher = MockLauncher::failing_stop();
        launcher.start(&spec("orders", 6010)).await.unwrap();

        let handle = launcher.handle_for("orders").await.unwrap();
        let err = handle.stop(None).await.unwrap_err();

        assert!(matches!(err, LauncherError::StopFailed(_)));
        assert!(!handle.stopped());
    }
}
