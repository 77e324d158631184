// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-codecs: wire codecs for the timing protocols Pitwall ingests.
//!
//! Two trackside protocols feed the per-event stream: RMonitor (legacy
//! ASCII, CRLF-delimited) and Multiloop (length-prefixed binary with richer
//! per-car data). Decode failures never terminate a pipeline; callers log
//! the offending input, bump a counter and move on.

pub mod framing;
pub mod multiloop;
pub mod rmonitor;

use pw_core::DriverInfo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use framing::LineAssembler;
pub use multiloop::MultiloopMessage;
pub use rmonitor::RMonitorRecord;

#[derive(Debug, Error)]
pub enum CodecError {
    /// An RMonitor line that could not be parsed; carries the full line.
    #[error("invalid RMonitor record: {line}")]
    InvalidRecord { line: String },

    /// A Multiloop frame that could not be parsed.
    #[error("invalid Multiloop frame ({len} bytes)")]
    InvalidFrame { len: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of a per-event bus stream, in arrival order.
///
/// The hub appends these; the owning processor is the single reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEnvelope {
    RMonitor {
        session_id: u32,
        line: String,
    },
    Multiloop {
        session_id: u32,
        frame: Vec<u8>,
    },
    SessionChange {
        session_id: u32,
        session_name: String,
        local_tz_offset_hours: i32,
    },
    DriverInfo(DriverInfo),
    Reset,
}

/// A fully decoded stream entry, dispatched on by the processor pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum WireRecord {
    RMonitor(RMonitorRecord),
    Multiloop(MultiloopMessage),
    SessionChange {
        session_id: u32,
        session_name: String,
        local_tz_offset_hours: i32,
    },
    DriverInfo(DriverInfo),
    Reset,
}

impl StreamEnvelope {
    /// Session the entry belongs to, where the entry is session-scoped.
    pub fn session_id(&self) -> Option<u32> {
        match self {
            StreamEnvelope::RMonitor { session_id, .. }
            | StreamEnvelope::Multiloop { session_id, .. }
            | StreamEnvelope::SessionChange { session_id, .. } => Some(*session_id),
            StreamEnvelope::DriverInfo(_) | StreamEnvelope::Reset => None,
        }
    }

    /// Decode the envelope payload into a typed record.
    pub fn decode(self) -> Result<WireRecord, CodecError> {
        match self {
            StreamEnvelope::RMonitor { line, .. } => {
                Ok(WireRecord::RMonitor(rmonitor::parse_line(&line)?))
            }
            StreamEnvelope::Multiloop { frame, .. } => {
                Ok(WireRecord::Multiloop(multiloop::parse_frame(&frame)?))
            }
            StreamEnvelope::SessionChange {
                session_id,
                session_name,
                local_tz_offset_hours,
            } => Ok(WireRecord::SessionChange {
                session_id,
                session_name,
                local_tz_offset_hours,
            }),
            StreamEnvelope::DriverInfo(info) => Ok(WireRecord::DriverInfo(info)),
            StreamEnvelope::Reset => Ok(WireRecord::Reset),
        }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
