// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-orchestrator: the singleton control plane.
//!
//! Every scan it reads the relay heartbeat hash, reconciles
//! `Events.is_live`, drains and tears down workers for expired events,
//! garbage-collects orphans and ensures the worker triplet (processor,
//! logger, optional control-log) for every live event. Worker lifecycle
//! goes through [`driver::WorkerDriver`]; the in-repo driver spawns local
//! processes, a cluster driver lives behind the same seam.

pub mod driver;
pub mod scan;

pub use driver::{DriverError, ProcessDriver, WorkerDriver, WorkerSpec};
pub use scan::{Orchestrator, ScanPorts};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("bus error: {0}")]
    Bus(#[from] pw_bus::BusError),

    #[error("storage error: {0}")]
    Storage(#[from] pw_storage::StorageError),

    #[error("driver error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
}
