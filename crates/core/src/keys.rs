// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus and cache key layout.
//!
//! Every key the system touches is built here so writers and readers can
//! never drift apart. Per-event keys are single-writer (the owning
//! processor or aggregator), many-reader.

use crate::id::EventId;

/// Hash of `relay-heartbeat-{event}` fields → [`crate::RelayConnectionEventEntry`] JSON.
pub const RELAY_EVENT_CONNECTIONS: &str = "relay-event-connections";

/// Pub/sub channel: "push a full snapshot to this connection id".
pub const SEND_FULL_STATUS: &str = "send-full-status";

/// Pub/sub channel: "push a per-car control-log slice to this connection id".
pub const SEND_CONTROL_LOG: &str = "send-control-log";

/// Pub/sub channel carrying a JSON array of event ids being shut down.
pub const EVENT_SHUTDOWN_SIGNAL: &str = "event-shutdown-signal";

/// Field name of a relay's heartbeat entry inside [`RELAY_EVENT_CONNECTIONS`].
pub fn relay_heartbeat(event: EventId) -> String {
    format!("relay-heartbeat-{event}")
}

/// Per-event bus stream carrying timing frames in arrival order.
pub fn event_stream(event: EventId) -> String {
    format!("event-stream-{event}")
}

/// Stream-entry field name for RMonitor payloads of one session.
pub fn event_rmon_stream_field(event: EventId, session: u32) -> String {
    format!("rmon-{event}-{session}")
}

/// Driver identity JSON by `(event, car number)`.
pub fn event_driver(event: EventId, car_number: &str) -> String {
    format!("driver-evt-{event}-car-{car_number}")
}

/// Driver identity JSON by transponder id.
pub fn driver_transponder(transponder_id: u32) -> String {
    format!("driver-transponder-{transponder_id}")
}

/// Full control-log snapshot for an event.
pub fn control_log(event: EventId) -> String {
    format!("control-log-evt-{event}")
}

/// Per-car control-log slice.
pub fn control_log_car(event: EventId, car_number: &str) -> String {
    format!("control-log-evt-{event}-car-{car_number}")
}

/// Glob pattern matching every per-car control-log key of an event.
pub fn control_log_car_pattern(event: EventId) -> String {
    format!("control-log-evt-{event}-car-*")
}

/// Hash of car number → [`crate::CarPenalty`] JSON.
pub fn control_log_car_penalties(event: EventId) -> String {
    format!("control-log-evt-{event}-penalties")
}

/// Per-event set of subscribed UI connection ids.
pub fn status_event_connections(event: EventId) -> String {
    format!("status-event-connections-{event}")
}

/// Latest full-snapshot cache entry for an event (MessagePack bytes).
pub fn event_snapshot(event: EventId) -> String {
    format!("event-snapshot-{event}")
}

/// Pub/sub channel the processor broadcasts patches and resets on; the hub
/// forwards them to the event's subscriber group.
pub fn event_patches(event: EventId) -> String {
    format!("event-patches-{event}")
}

/// Pub/sub channel the control-log aggregator pushes per-car updates on;
/// the hub forwards them to car and whole-event subscriber groups.
pub fn control_log_push(event: EventId) -> String {
    format!("control-log-push-{event}")
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
