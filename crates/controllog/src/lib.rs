// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-controllog: the per-event control-log aggregator.
//!
//! A separate worker so sanctioning-source polling cadence is independent
//! of timing. Every minute it pulls the external control log, diffs
//! against its local cache, pushes per-car updates toward subscribers and
//! refreshes the shared cache (full snapshot, per-car slices, penalties
//! hash), then garbage-collects cars that left the log.

pub mod aggregator;
pub mod cache;
pub mod metrics;
pub mod sink;
pub mod source;

pub use aggregator::Aggregator;
pub use cache::{CacheChanges, ControlLogCache};
pub use metrics::ControlLogMetrics;
pub use sink::{BusLogSink, LogSink};
pub use source::{ControlLogSource, HttpControlLogSource, SourceError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("bus error: {0}")]
    Bus(#[from] pw_bus::BusError),

    #[error("source error: {0}")]
    Source(#[from] source::SourceError),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid environment variable {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}
