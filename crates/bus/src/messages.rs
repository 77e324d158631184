// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed payloads for the control channels between processor, aggregator
//! and hub.
//!
//! Patch traffic for an event rides `keys::event_patches(event)` as JSON;
//! snapshot bytes (MessagePack / legacy gzip) are base64-wrapped since
//! those channels carry text. `published_at_ms` is a monotonic publish
//! stamp: a subscriber applies its bootstrap snapshot first, then every
//! patch stamped at or after the snapshot.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pw_core::{CarControlLogs, CarPositionPatch, EventId, SessionStatePatch};
use serde::{Deserialize, Serialize};

/// A message on an event's patch channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchMessage {
    Session {
        patch: SessionStatePatch,
        published_at_ms: u64,
    },
    Cars {
        patches: Vec<CarPositionPatch>,
        published_at_ms: u64,
    },
    /// Authoritative reset: subscribers drop their car state.
    Reset { published_at_ms: u64 },
    /// Full snapshot; targeted at one connection when `connection_id` is
    /// set, otherwise a group broadcast.
    FullStatus {
        snapshot_b64: String,
        legacy_gzip_b64: String,
        published_at_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connection_id: Option<String>,
    },
}

/// A message on an event's control-log push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlLogMessage {
    pub event_id: EventId,
    pub logs: CarControlLogs,
    /// Targeted at one connection when set, otherwise pushed to the car's
    /// subscriber group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
}

/// Fan-in request on `keys::SEND_FULL_STATUS`: the hub asks the owning
/// processor to push a snapshot to one freshly subscribed connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    pub event_id: EventId,
    pub connection_id: String,
}

/// Fan-in request on `keys::SEND_CONTROL_LOG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlLogRequest {
    pub event_id: EventId,
    pub car_number: String,
    pub connection_id: String,
}

pub fn encode_b64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode_b64(text: &str) -> Option<Vec<u8>> {
    BASE64.decode(text).ok()
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
