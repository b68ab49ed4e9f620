// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for berth-supervisor.

use std::path::PathBuf;
use std::time::Duration;

/// Supervisor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for deployable units
    pub watch_root: PathBuf,
    /// Warm-up delay before the first reconciliation cycle
    pub startup_delay: Duration,
    /// Sleep between reconciliation cycles
    pub poll_interval: Duration,
    /// Grace period between SIGTERM and SIGKILL when stopping a workload
    pub stop_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let watch_root =
            PathBuf::from(std::env::var("BERTH_WATCH_ROOT").unwrap_or_else(|_| "apps".to_string()));

        let startup_delay = millis_var("BERTH_STARTUP_DELAY_MS", 2500)?;
        let poll_interval = millis_var("BERTH_POLL_INTERVAL_MS", 100)?;
        let stop_grace = millis_var("BERTH_STOP_GRACE_MS", 5000)?;

        Ok(Self {
            watch_root,
            startup_delay,
            poll_interval,
            stop_grace,
        })
    }
}

fn millis_var(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidMillis(name)),
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a non-numeric millisecond value.
    #[error("Invalid millisecond value for {0}")]
    InvalidMillis(&'static str),
}
