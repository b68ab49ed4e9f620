// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for lifecycle commands (Create, Shutdown, Update, Quarantine).

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tempfile::TempDir;

use berth_supervisor::command::{CommandKind, CommandRequest};
use berth_supervisor::error::Error;
use berth_supervisor::launcher::process::ProcessLauncher;
use berth_supervisor::launcher::{Launcher, LauncherError, MockLauncher};
use berth_supervisor::unit::DeployableUnit;
use berth_supervisor::unit_registry::{QUARANTINE_DIR_NAME, UnitRegistry};
use berth_supervisor::workload_registry::WorkloadRegistry;

use common::{make_unit_dir, unit_for};

struct Fixture {
    temp_dir: TempDir,
    units: Arc<UnitRegistry>,
    workloads: Arc<WorkloadRegistry>,
    launcher: Arc<MockLauncher>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_launcher(MockLauncher::new())
    }

    fn with_launcher(launcher: MockLauncher) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let units = Arc::new(UnitRegistry::new(temp_dir.path()).unwrap());
        Self {
            temp_dir,
            units,
            workloads: Arc::new(WorkloadRegistry::new()),
            launcher: Arc::new(launcher),
        }
    }

    fn request(&self, unit: &Arc<DeployableUnit>) -> CommandRequest {
        CommandRequest::new(
            unit.clone(),
            self.units.clone(),
            self.workloads.clone(),
            self.launcher.clone(),
        )
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_hosts_unit() {
    let fixture = Fixture::new();
    make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Create);
    command.execute(None).await.unwrap();

    assert!(unit.is_hosted());
    assert_eq!(unit.port(), Some(6010));
    assert!(fixture.units.is_known("orders"));
    assert_eq!(fixture.workloads.len(), 1);
    assert!(fixture.workloads.lookup(&unit).is_some());
}

#[tokio::test]
async fn test_create_fails_when_directory_missing() {
    let fixture = Fixture::new();
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Create);
    let err = command.execute(None).await.unwrap_err();

    assert_eq!(err.kind, CommandKind::Create);
    assert_eq!(err.unit.name(), "orders");
    assert!(matches!(err.source, Error::UnitDirectoryNotFound(_)));
}

#[tokio::test]
async fn test_create_fails_when_config_missing() {
    let fixture = Fixture::new();
    let dir = fixture.temp_dir.path().join("orders");
    std::fs::create_dir(&dir).unwrap();
    common::write_artifact(&dir, "orders");
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Create);
    let err = command.execute(None).await.unwrap_err();

    assert_eq!(err.kind, CommandKind::Create);
    match err.source {
        Error::UnitFileMissing(path) => {
            assert!(path.ends_with("workload.json"), "missing path: {path:?}");
        }
        other => panic!("expected UnitFileMissing, got {other:?}"),
    }
    assert!(!unit.is_hosted());
    assert!(!fixture.units.is_known("orders"));
}

#[tokio::test]
async fn test_create_fails_when_artifact_missing() {
    let fixture = Fixture::new();
    let dir = fixture.temp_dir.path().join("orders");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("workload.json"), r#"{"port": 6010}"#).unwrap();
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Create);
    let err = command.execute(None).await.unwrap_err();

    match err.source {
        Error::UnitFileMissing(path) => {
            assert!(path.ends_with("orders.bin"), "missing path: {path:?}");
        }
        other => panic!("expected UnitFileMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_fails_on_nonpositive_port() {
    let fixture = Fixture::new();
    make_unit_dir(fixture.temp_dir.path(), "orders", 0);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Create);
    let err = command.execute(None).await.unwrap_err();

    assert!(matches!(err.source, Error::InvalidPort(0)));
    assert!(fixture.workloads.is_empty());
}

#[tokio::test]
async fn test_create_propagates_launch_failure() {
    let fixture = Fixture::with_launcher(MockLauncher::failing());
    make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Create);
    let err = command.execute(None).await.unwrap_err();

    assert!(matches!(
        err.source,
        Error::Launcher(LauncherError::StartFailed(_))
    ));
    assert!(!unit.is_hosted());
    assert!(!fixture.units.is_known("orders"));
}

#[tokio::test]
async fn test_create_fails_when_port_already_bound() {
    let temp_dir = TempDir::new().unwrap();
    let units = Arc::new(UnitRegistry::new(temp_dir.path()).unwrap());
    let workloads = Arc::new(WorkloadRegistry::new());
    let launcher: Arc<dyn Launcher> = Arc::new(ProcessLauncher::default());

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    make_unit_dir(temp_dir.path(), "orders", i64::from(port));
    let unit = unit_for(temp_dir.path(), "orders");

    let command =
        CommandRequest::new(unit, units, workloads, launcher).build(CommandKind::Create);
    let err = command.execute(None).await.unwrap_err();

    assert!(matches!(
        err.source,
        Error::Launcher(LauncherError::PortInUse(p)) if p == port
    ));
}

#[tokio::test]
async fn test_create_aborts_when_cancelled() {
    let fixture = Fixture::new();
    make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");
    let token = Arc::new(AtomicBool::new(true));

    let command = fixture.request(&unit).build(CommandKind::Create);
    let err = command.execute(Some(token)).await.unwrap_err();

    assert!(matches!(err.source, Error::Cancelled));
    assert_eq!(fixture.launcher.started_count(), 0);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_without_handle_still_forgets_unit() {
    let fixture = Fixture::new();
    let unit = unit_for(fixture.temp_dir.path(), "orders");
    fixture.units.persist(&[unit.clone()]);

    let command = fixture.request(&unit).build(CommandKind::Shutdown);
    command.execute(None).await.unwrap();

    assert!(!fixture.units.is_known("orders"));
}

#[tokio::test]
async fn test_shutdown_stops_unregisters_and_forgets() {
    let fixture = Fixture::new();
    make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let create = fixture.request(&unit).build(CommandKind::Create);
    create.execute(None).await.unwrap();
    let handle = fixture.launcher.handle_for("orders").await.unwrap();

    let shutdown = fixture.request(&unit).build(CommandKind::Shutdown);
    shutdown.execute(None).await.unwrap();

    assert!(handle.stopped());
    assert!(fixture.workloads.is_empty());
    assert!(!fixture.units.is_known("orders"));
}

#[tokio::test]
async fn test_shutdown_stop_failure_keeps_unit_known() {
    let fixture = Fixture::with_launcher(MockLauncher::failing_stop());
    make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let create = fixture.request(&unit).build(CommandKind::Create);
    create.execute(None).await.unwrap();

    let shutdown = fixture.request(&unit).build(CommandKind::Shutdown);
    let err = shutdown.execute(None).await.unwrap_err();

    assert_eq!(err.kind, CommandKind::Shutdown);
    // The failed stop left the world untouched for the quarantine pass.
    assert!(fixture.units.is_known("orders"));
    assert_eq!(fixture.workloads.len(), 1);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_restarts_unit() {
    let fixture = Fixture::new();
    make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let create = fixture.request(&unit).build(CommandKind::Create);
    create.execute(None).await.unwrap();
    let first_handle = fixture.launcher.handle_for("orders").await.unwrap();

    let update = fixture.request(&unit).build(CommandKind::Update);
    update.execute(None).await.unwrap();

    assert!(first_handle.stopped());
    assert_eq!(fixture.launcher.started_count(), 2);
    assert_eq!(fixture.workloads.len(), 1);
    assert!(fixture.units.is_known("orders"));
}

#[tokio::test]
async fn test_update_partial_failure_surfaces_create_error() {
    let fixture = Fixture::new();
    let dir = make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let create = fixture.request(&unit).build(CommandKind::Create);
    create.execute(None).await.unwrap();
    let first_handle = fixture.launcher.handle_for("orders").await.unwrap();

    // Break the unit so the re-create phase fails.
    std::fs::remove_file(dir.join("workload.json")).unwrap();

    let update = fixture.request(&unit).build(CommandKind::Update);
    let err = update.execute(None).await.unwrap_err();

    assert_eq!(err.kind, CommandKind::Create);
    assert!(matches!(err.source, Error::UnitFileMissing(_)));
    // The shutdown phase completed before the create phase broke.
    assert!(first_handle.stopped());
    assert!(fixture.workloads.is_empty());
}

// ============================================================================
// Quarantine
// ============================================================================

#[tokio::test]
async fn test_quarantine_moves_unit_directory() {
    let fixture = Fixture::new();
    let dir = make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Quarantine);
    command.execute(None).await.unwrap();

    assert!(!dir.exists());

    let quarantine_root = fixture.temp_dir.path().join(QUARANTINE_DIR_NAME);
    let entries: Vec<_> = std::fs::read_dir(&quarantine_root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].ends_with("-orders"), "entry: {}", entries[0]);
}

#[tokio::test]
async fn test_quarantine_fails_when_directory_missing() {
    let fixture = Fixture::new();
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Quarantine);
    let err = command.execute(None).await.unwrap_err();

    assert_eq!(err.kind, CommandKind::Quarantine);
    assert!(matches!(err.source, Error::Io(_)));
}

#[tokio::test]
async fn test_quarantined_unit_is_not_rediscovered() {
    let fixture = Fixture::new();
    make_unit_dir(fixture.temp_dir.path(), "orders", 6010);
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Quarantine);
    command.execute(None).await.unwrap();

    let discovered = fixture.units.list_new_units().await.unwrap();
    assert!(discovered.is_empty());
}

// ============================================================================
// CommandError
// ============================================================================

#[tokio::test]
async fn test_command_error_names_kind_and_unit() {
    let fixture = Fixture::new();
    let unit = unit_for(fixture.temp_dir.path(), "orders");

    let command = fixture.request(&unit).build(CommandKind::Create);
    let err = command.execute(None).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Create"), "message: {message}");
    assert!(message.contains("orders"), "message: {message}");
}
