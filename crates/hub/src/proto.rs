// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shape of the push channel: JSON text frames, method-tagged.

use pw_core::{CarControlLogs, CarPositionPatch, SessionStatePatch};
use serde::{Deserialize, Serialize};

/// Client → server methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ClientCommand {
    /// Relay: append RMonitor records to the event stream. Deliberately no
    /// per-call tenant check on this hot path; ownership is enforced when
    /// the session row is committed.
    SendRMonitor {
        event_id: i64,
        session_id: u32,
        command: String,
    },
    /// Relay: append a Multiloop frame (base64) to the event stream.
    SendMultiloop {
        event_id: i64,
        session_id: u32,
        frame_b64: String,
    },
    /// Relay: announce a timing-system run. Tenant-checked; the reserved
    /// session id is rejected here at the ingress.
    SendSessionChange {
        event_id: i64,
        session_id: u32,
        session_name: String,
        local_tz_offset_hours: i32,
    },

    SubscribeToEvent { event_id: i64 },
    SubscribeToEventV2 { event_id: i64 },
    UnsubscribeFromEvent { event_id: i64 },
    UnsubscribeFromEventV2 { event_id: i64 },

    SubscribeToControlLogs { event_id: i64 },
    UnsubscribeFromControlLogs { event_id: i64 },
    SubscribeToCarControlLogs { event_id: i64, car_number: String },
    UnsubscribeFromCarControlLogs { event_id: i64, car_number: String },

    SubscribeToInCarDriverEvent { event_id: i64, car_number: String },
    SubscribeToInCarDriverEventV2 { event_id: i64, car_number: String },
    UnsubscribeFromInCarDriverEvent { event_id: i64, car_number: String },
    UnsubscribeFromInCarDriverEventV2 { event_id: i64, car_number: String },
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ServerEvent {
    ReceiveSessionPatch { patch: SessionStatePatch },
    ReceiveCarPatches { patches: Vec<CarPositionPatch> },
    ReceiveReset {},
    ReceiveControlLog { logs: CarControlLogs },
    /// Driver-targeted context for in-car displays.
    ReceiveInCarUpdate { payload: serde_json::Value },
    /// Full snapshot, MessagePack base64 (v2 clients).
    ReceiveFullStatus { snapshot_b64: String },
    /// Legacy v1 full payload: gzip JSON base64.
    ReceiveMessage { payload_b64: String },
}

impl ClientCommand {
    /// Only relays may call the Send* methods.
    pub fn is_relay_method(&self) -> bool {
        matches!(
            self,
            ClientCommand::SendRMonitor { .. }
                | ClientCommand::SendMultiloop { .. }
                | ClientCommand::SendSessionChange { .. }
        )
    }
}

#[cfg(test)]
#[path = "proto_tests.rs"]
mod tests;
