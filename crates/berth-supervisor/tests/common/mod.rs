// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for supervisor integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use berth_supervisor::unit::DeployableUnit;

/// Create an eligible unit directory under `root`: the artifact
/// `<name>.bin` (a small shell script, so it is also spawnable) and a
/// `workload.json` declaring `port`.
pub fn make_unit_dir(root: &Path, name: &str, port: i64) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    write_artifact(&dir, name);
    std::fs::write(
        dir.join("workload.json"),
        format!(r#"{{"port": {port}}}"#),
    )
    .unwrap();
    dir
}

/// Write an executable `<name>.bin` artifact into `dir`.
pub fn write_artifact(dir: &Path, name: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(format!("{name}.bin"));
    std::fs::write(&path, "#!/bin/sh\nexec sleep 30\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Build a unit object the way a scan would, stamped with the current time.
pub fn unit_for(root: &Path, name: &str) -> Arc<DeployableUnit> {
    Arc::new(DeployableUnit::new(name, root.join(name), Utc::now()))
}

/// Reserve a free TCP port by binding to an ephemeral one and releasing it.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
