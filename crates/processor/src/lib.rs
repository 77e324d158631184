// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-processor: the per-event worker.
//!
//! One instance owns one live event. It is the single reader of the
//! event's bus stream and the single writer of its `SessionState`:
//! ingest → decode → aggregate → enrich → broadcast → persist, with a 5 s
//! full-snapshot cadence on the side.

pub mod aggregate;
pub mod broadcast;
pub mod caches;
pub mod consumer;
pub mod enricher;
pub mod env;
pub mod health;
pub mod metrics;
pub mod monitor;
pub mod penalties;
pub mod pipeline;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod testkit;

pub use aggregate::{Aggregator, FrameEffects, LapCompletion};
pub use broadcast::{BusPatchSink, PatchSink};
pub use caches::{BusCaches, DriverCache, PenaltyCache};
pub use env::Config;
pub use metrics::ProcessorMetrics;
pub use monitor::{MonitorEvent, SessionMonitor};
pub use pipeline::Pipeline;
pub use state::StateHandle;
pub use store::SessionStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("bus error: {0}")]
    Bus(#[from] pw_bus::BusError),

    #[error("storage error: {0}")]
    Storage(#[from] pw_storage::StorageError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] pw_core::SnapshotError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid environment variable {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}
