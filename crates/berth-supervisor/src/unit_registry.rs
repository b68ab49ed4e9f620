// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Deployable-unit registry.
//!
//! Scans the watch root, classifies units into the three diff sets (new,
//! updated, removed), and tracks the known-units map: the supervisor's
//! belief about what is currently hosted. The registry only classifies;
//! it never issues lifecycle commands.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::unit::{ARTIFACT_EXTENSION, CONFIG_FILE_NAME, DeployableUnit};

/// Reserved subdirectory of the watch root holding quarantined units.
///
/// Always excluded from scanning.
pub const QUARANTINE_DIR_NAME: &str = ".quarantine";

/// In-memory registry of known deployable units.
///
/// The known-units map is rebuilt from a fresh scan after a restart; nothing
/// is persisted across runs.
#[derive(Debug)]
pub struct UnitRegistry {
    watch_root: PathBuf,
    known: Mutex<HashMap<String, Arc<DeployableUnit>>>,
}

impl UnitRegistry {
    /// Create a registry over a watch root.
    ///
    /// Fails fast if the path is blank or the directory does not exist.
    pub fn new(watch_root: impl Into<PathBuf>) -> Result<Self> {
        let watch_root = watch_root.into();
        if watch_root.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("watch root path is blank".into()));
        }
        if !watch_root.is_dir() {
            return Err(Error::WatchRootNotFound(watch_root));
        }
        Ok(Self {
            watch_root,
            known: Mutex::new(HashMap::new()),
        })
    }

    /// The directory this registry scans.
    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    /// Discover units present on disk but not yet known.
    ///
    /// A qualifying directory is an immediate, non-empty subdirectory of the
    /// watch root (quarantine excluded) containing `<name>.bin` and
    /// `workload.json`. A missing watch root yields an empty set, never an
    /// error.
    pub async fn list_new_units(&self) -> Result<Vec<Arc<DeployableUnit>>> {
        let known: HashSet<String> = self.known.lock().keys().cloned().collect();
        let mut units = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.watch_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(units),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == QUARANTINE_DIR_NAME || known.contains(&name) {
                continue;
            }
            if !has_files(&path).await || !has_required_files(&path, &name) {
                continue;
            }
            let Some(modified) = dir_modified(&path).await else {
                warn!(path = %path.display(), "Failed to read directory timestamp, skipping");
                continue;
            };
            units.push(Arc::new(DeployableUnit::new(name, path, modified)));
        }

        Ok(units)
    }

    /// Known, hosted units whose directory changed since they were recorded.
    ///
    /// A unit qualifies when its backing directory still exists, still has
    /// files, still carries the artifact and configuration file, and its
    /// last-write timestamp is strictly newer than the registry's stored one.
    pub async fn list_updated_units(&self) -> Result<Vec<Arc<DeployableUnit>>> {
        let known: Vec<Arc<DeployableUnit>> = self.known.lock().values().cloned().collect();
        let mut units = Vec::new();

        for unit in known {
            if !unit.is_hosted() {
                continue;
            }
            let dir = unit.path();
            if !dir.is_dir() || !has_files(dir).await || !has_required_files(dir, unit.name()) {
                continue;
            }
            let Some(modified) = dir_modified(dir).await else {
                continue;
            };
            if modified > unit.last_modified() {
                units.push(unit);
            }
        }

        Ok(units)
    }

    /// Known units whose backing directory no longer exists under the watch
    /// root.
    ///
    /// When the watch root has no subdirectories at all, every known unit is
    /// considered removed.
    pub async fn list_removed_units(&self) -> Result<Vec<Arc<DeployableUnit>>> {
        let mut present = HashSet::new();

        let mut entries = match tokio::fs::read_dir(&self.watch_root).await {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        if let Some(entries) = entries.as_mut() {
            while let Some(entry) = entries.next_entry().await? {
                if !entry.path().is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().to_string();
                if name != QUARANTINE_DIR_NAME {
                    present.insert(name);
                }
            }
        }

        Ok(self
            .known
            .lock()
            .values()
            .filter(|unit| !present.contains(unit.name()))
            .cloned()
            .collect())
    }

    /// Record units as known. First registration wins; an already-known name
    /// is left untouched.
    pub fn persist(&self, units: &[Arc<DeployableUnit>]) {
        let mut known = self.known.lock();
        for unit in units {
            known
                .entry(unit.name().to_string())
                .or_insert_with(|| unit.clone());
        }
    }

    /// Remove a unit from the known map. No-op if absent.
    pub fn forget(&self, name: &str) {
        self.known.lock().remove(name);
    }

    /// Look up a known unit by name.
    pub fn get(&self, name: &str) -> Option<Arc<DeployableUnit>> {
        self.known.lock().get(name).cloned()
    }

    /// Whether a unit name is currently known.
    pub fn is_known(&self, name: &str) -> bool {
        self.known.lock().contains_key(name)
    }

    /// Number of currently known units.
    pub fn known_count(&self) -> usize {
        self.known.lock().len()
    }

    /// Drop every known unit.
    pub fn clear(&self) {
        self.known.lock().clear();
    }
}

/// Whether a directory contains at least one file.
async fn has_files(dir: &Path) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return false;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.path().is_file() {
            return true;
        }
    }
    false
}

/// Whether a unit directory carries its artifact and configuration file.
fn has_required_files(dir: &Path, name: &str) -> bool {
    dir.join(format!("{name}.{ARTIFACT_EXTENSION}")).is_file()
        && dir.join(CONFIG_FILE_NAME).is_file()
}

/// Last-write timestamp of a directory, if readable.
async fn dir_modified(dir: &Path) -> Option<DateTime<Utc>> {
    let metadata = tokio::fs::metadata(dir).await.ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
