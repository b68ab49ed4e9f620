// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Deployable-unit model.
//!
//! A deployable unit is a named subdirectory of the watch root containing a
//! workload artifact (`<name>.bin`) and a fixed-name configuration file
//! (`workload.json`). Identity (`name`, `path`) is immutable; hosting state
//! is only mutated through [`DeployableUnit::mark_hosted`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;

/// File extension of the workload artifact inside a unit directory.
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Fixed name of the per-unit configuration file.
pub const CONFIG_FILE_NAME: &str = "workload.json";

/// A deployable unit discovered under the watch root.
#[derive(Debug)]
pub struct DeployableUnit {
    name: String,
    path: PathBuf,
    state: Mutex<HostingState>,
}

#[derive(Debug, Clone)]
struct HostingState {
    last_modified: DateTime<Utc>,
    hosted_key: Option<Uuid>,
    hosted_at: Option<DateTime<Utc>>,
    port: Option<u16>,
}

impl DeployableUnit {
    /// Create a unit from its directory name, path, and last-write timestamp.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            state: Mutex::new(HostingState {
                last_modified,
                hosted_key: None,
                hosted_at: None,
                port: None,
            }),
        }
    }

    /// Unit name, unique within the watch root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem location of the unit's backing directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Derived location of the workload artifact (`<name>.bin`).
    pub fn artifact_path(&self) -> PathBuf {
        self.path.join(format!("{}.{ARTIFACT_EXTENSION}", self.name))
    }

    /// Derived location of the unit configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE_NAME)
    }

    /// Source-of-truth timestamp for change detection.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.state.lock().last_modified
    }

    /// Opaque identifier binding this unit to its running workload handle.
    ///
    /// `Some` if and only if the unit is hosted.
    pub fn hosted_key(&self) -> Option<Uuid> {
        self.state.lock().hosted_key
    }

    /// When the unit was last marked hosted.
    pub fn hosted_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().hosted_at
    }

    /// How long the unit has been hosted.
    pub fn hosted_for(&self) -> Option<chrono::Duration> {
        self.hosted_at().map(|at| Utc::now() - at)
    }

    /// Whether the unit currently has a running workload.
    pub fn is_hosted(&self) -> bool {
        self.state.lock().hosted_key.is_some()
    }

    /// Network port assigned to the hosted workload.
    pub fn port(&self) -> Option<u16> {
        self.state.lock().port
    }

    /// Record the port the workload was launched on.
    pub fn set_port(&self, port: u16) {
        self.state.lock().port = Some(port);
    }

    /// Atomically bind the unit to a hosted key.
    ///
    /// Also refreshes `last_modified` so a just-created instance is not
    /// immediately reported as updated by the next scan.
    pub fn mark_hosted(&self, key: Uuid) {
        let now = Utc::now();
        let mut state = self.state.lock();
        state.hosted_key = Some(key);
        state.hosted_at = Some(now);
        state.last_modified = now;
    }
}

/// Per-unit configuration parsed from `workload.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Network port the workload must be exposed on.
    #[serde(default)]
    pub port: i64,
}

impl UnitConfig {
    /// Read and parse a unit configuration file.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
