// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workload handle registry.
//!
//! Maps opaque hosted keys to running workload handles. A handle is reachable
//! from exactly one key while registered; the manager guarantees no second
//! Create is issued for a unit before its Shutdown completes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::launcher::WorkloadHandle;
use crate::unit::DeployableUnit;

/// In-memory registry of running workload handles keyed by hosted key.
pub struct WorkloadRegistry {
    handles: Mutex<HashMap<Uuid, Arc<dyn WorkloadHandle>>>,
    notifications: Option<UnboundedSender<String>>,
}

impl WorkloadRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            notifications: None,
        }
    }

    /// Create a registry that emits the name of every newly hosted unit to a
    /// notification channel. The emission is best-effort; a closed receiver
    /// never fails a registration.
    pub fn with_notifications(sender: UnboundedSender<String>) -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            notifications: Some(sender),
        }
    }

    /// Bind a freshly generated hosted key to a handle and mark the unit
    /// hosted.
    ///
    /// Returns the generated key. Fails if the key is somehow already
    /// registered.
    pub fn register(
        &self,
        unit: &Arc<DeployableUnit>,
        handle: Arc<dyn WorkloadHandle>,
    ) -> Result<Uuid> {
        let key = Uuid::new_v4();
        {
            let mut handles = self.handles.lock();
            if handles.contains_key(&key) {
                return Err(Error::KeyCollision(key));
            }
            handles.insert(key, handle);
        }
        unit.mark_hosted(key);
        info!(unit = %unit.name(), key = %key, "Registered workload handle");

        if let Some(sender) = &self.notifications
            && sender.send(unit.name().to_string()).is_err()
        {
            debug!(unit = %unit.name(), "Notification channel closed, dropping hosting event");
        }

        Ok(key)
    }

    /// Remove the handle keyed by the unit's hosted key. No-op if the unit is
    /// not hosted or the key is unknown.
    pub fn unregister(&self, unit: &DeployableUnit) {
        if let Some(key) = unit.hosted_key() {
            self.handles.lock().remove(&key);
            debug!(unit = %unit.name(), key = %key, "Unregistered workload handle");
        }
    }

    /// Resolve the handle for a unit's hosted key.
    pub fn lookup(&self, unit: &DeployableUnit) -> Option<Arc<dyn WorkloadHandle>> {
        let key = unit.hosted_key()?;
        self.handles.lock().get(&key).cloned()
    }

    /// Every currently registered handle.
    pub fn all(&self) -> Vec<Arc<dyn WorkloadHandle>> {
        self.handles.lock().values().cloned().collect()
    }

    /// Remove and return every registered handle. Used for bulk teardown.
    pub fn drain(&self) -> Vec<Arc<dyn WorkloadHandle>> {
        self.handles.lock().drain().map(|(_, handle)| handle).collect()
    }

    /// Number of registered handles.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Whether no handles are registered.
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

impl Default for WorkloadRegistry {
    fn default() -> Self {
        Self::new()
    }
}
