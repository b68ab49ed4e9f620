// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Berth Supervisor - Deployable-Unit Fleet Reconciliation
//!
//! This crate supervises a single node's fleet of deployable units: packaged
//! workloads dropped into a watch directory together with their
//! configuration. A periodic reconciliation loop compares what is on disk
//! against what is currently hosted and issues lifecycle commands to
//! converge the two.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Watch Root (apps/)                        │
//! │   orders/orders.bin + workload.json     billing/billing.bin …   │
//! └──────────────────────────────────────────────────────────────────┘
//!                │ scan (new / updated / removed)
//!                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      berth-supervisor (This Crate)               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌─────────┐  │
//! │  │    Unit     │  │ Reconciler  │  │    Fleet    │  │ Workload│  │
//! │  │  Registry   │─▶│   (loop)    │─▶│   Manager   │─▶│ Registry│  │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └─────────┘  │
//! │                                          │ Create/Shutdown/      │
//! │                                          │ Update/Quarantine     │
//! └──────────────────────────────────────────┼───────────────────────┘
//!                                            │ spawn / stop
//!                                            ▼
//!                              ┌─────────────────────────┐
//!                              │   Workload Processes    │
//!                              │  (one port per unit)    │
//!                              └─────────────────────────┘
//! ```
//!
//! # Reconciliation cycle
//!
//! After a warm-up delay, each cycle:
//!
//! 1. asks the [`unit_registry::UnitRegistry`] for the three diff sets,
//! 2. enqueues a Create per new unit, an Update per changed unit, and a
//!    Shutdown per vanished unit on the [`manager::FleetManager`],
//! 3. drains the queue, executing the batch concurrently,
//! 4. sleeps a fixed interval.
//!
//! A command that fails has its unit moved to the `.quarantine/` area and is
//! never reconsidered; the loop itself only terminates through cancellation.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BERTH_WATCH_ROOT` | `apps` | Directory scanned for deployable units |
//! | `BERTH_STARTUP_DELAY_MS` | `2500` | Warm-up delay before the first cycle |
//! | `BERTH_POLL_INTERVAL_MS` | `100` | Sleep between reconciliation cycles |
//! | `BERTH_STOP_GRACE_MS` | `5000` | SIGTERM-to-SIGKILL grace when stopping |
//!
//! # Modules
//!
//! - [`config`]: Supervisor configuration from environment variables
//! - [`error`]: Error types for supervisor operations
//! - [`unit`]: The deployable-unit model
//! - [`unit_registry`]: Watch-root scanning and the known-units map
//! - [`workload_registry`]: Hosted-key to workload-handle mapping
//! - [`launcher`]: Workload execution backends (process, mock)
//! - [`command`]: Lifecycle commands and their uniform failure wrapping
//! - [`manager`]: Command queue and concurrent drain
//! - [`reconciler`]: The periodic reconciliation loop
//! - [`runtime`]: Embeddable runtime wiring all of the above

#![deny(missing_docs)]

/// Supervisor configuration loaded from environment variables.
pub mod config;

/// Error types for supervisor operations.
pub mod error;

/// The deployable-unit model.
pub mod unit;

/// Watch-root scanning, diff classification, and the known-units map.
pub mod unit_registry;

/// Hosted-key to workload-handle mapping.
pub mod workload_registry;

/// Workload execution backends (process, mock).
pub mod launcher;

/// Lifecycle commands and their uniform failure wrapping.
pub mod command;

/// Command queue and concurrent drain with quarantine-on-failure.
pub mod manager;

/// The periodic reconciliation loop.
pub mod reconciler;

/// Embeddable runtime for the supervisor.
pub mod runtime;

pub use config::Config;
pub use error::Error;
