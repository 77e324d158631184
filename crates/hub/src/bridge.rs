// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus → WebSocket bridging.
//!
//! One bridge task per event with at least one subscriber: it listens on
//! the event's patch channel and control-log push channel and fans the
//! traffic into the right groups. v2 subscribers get patches and
//! MessagePack snapshots; v1 subscribers only understand the legacy gzip
//! full payload.

use crate::groups::{names, Registry};
use crate::proto::ServerEvent;
use pw_bus::{Bus, BusMessage, ControlLogMessage, PatchMessage};
use pw_core::{keys, EventId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Spawned bridge tasks, one per event.
#[derive(Default)]
pub struct BridgeManager {
    bridges: Mutex<HashMap<EventId, tokio::task::JoinHandle<()>>>,
}

impl BridgeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the event's bridge is running.
    pub fn ensure(&self, bus: &Bus, event: EventId, registry: Arc<Registry>) {
        let mut bridges = self.bridges.lock();
        if bridges.contains_key(&event) {
            return;
        }
        let handle = tokio::spawn(run(bus.clone(), event, registry));
        bridges.insert(event, handle);
    }

    pub fn shutdown(&self) {
        for (_, handle) in self.bridges.lock().drain() {
            handle.abort();
        }
    }
}

async fn run(bus: Bus, event: EventId, registry: Arc<Registry>) {
    let mut subscription = bus.subscriber().subscribe(vec![
        keys::event_patches(event),
        keys::control_log_push(event),
    ]);
    debug!(%event, "bridge started");

    while let Some(message) = subscription.recv().await {
        route(event, &message, &registry);
    }
    warn!(%event, "bridge subscription ended");
}

/// Route one bus message into subscriber groups.
pub fn route(event: EventId, message: &BusMessage, registry: &Registry) {
    if message.channel == keys::event_patches(event) {
        match serde_json::from_str::<PatchMessage>(&message.payload) {
            Ok(patch) => route_patch(event, patch, registry),
            Err(err) => warn!(%err, "unreadable patch message"),
        }
    } else if message.channel == keys::control_log_push(event) {
        match serde_json::from_str::<ControlLogMessage>(&message.payload) {
            Ok(update) => route_control_log(event, update, registry),
            Err(err) => warn!(%err, "unreadable control log message"),
        }
    }
}

fn route_patch(event: EventId, message: PatchMessage, registry: &Registry) {
    match message {
        PatchMessage::Session { patch, .. } => {
            registry.broadcast(
                &names::event_v2(event),
                &ServerEvent::ReceiveSessionPatch { patch },
            );
        }
        PatchMessage::Cars { patches, .. } => {
            // In-car displays watch their own car's patches
            for patch in &patches {
                let group = names::in_car(event, &patch.number);
                let payload = match serde_json::to_value(patch) {
                    Ok(payload) => payload,
                    Err(_) => continue,
                };
                registry.broadcast(&group, &ServerEvent::ReceiveInCarUpdate { payload });
            }
            registry.broadcast(
                &names::event_v2(event),
                &ServerEvent::ReceiveCarPatches { patches },
            );
        }
        PatchMessage::Reset { .. } => {
            registry.broadcast(&names::event_v2(event), &ServerEvent::ReceiveReset {});
        }
        PatchMessage::FullStatus {
            snapshot_b64,
            legacy_gzip_b64,
            connection_id,
            ..
        } => match connection_id {
            Some(connection_id) => {
                // Targeted bootstrap: pick the encoding the connection's
                // protocol version understands
                let event_message = if registry.is_member(&names::event_v1(event), &connection_id)
                {
                    ServerEvent::ReceiveMessage {
                        payload_b64: legacy_gzip_b64,
                    }
                } else {
                    ServerEvent::ReceiveFullStatus {
                        snapshot_b64,
                    }
                };
                registry.send_to(&connection_id, &event_message);
            }
            None => {
                registry.broadcast(
                    &names::event_v2(event),
                    &ServerEvent::ReceiveFullStatus { snapshot_b64 },
                );
                registry.broadcast(
                    &names::event_v1(event),
                    &ServerEvent::ReceiveMessage {
                        payload_b64: legacy_gzip_b64,
                    },
                );
            }
        },
    }
}

fn route_control_log(event: EventId, message: ControlLogMessage, registry: &Registry) {
    let car_number = message.logs.car_number.clone();
    let server_event = ServerEvent::ReceiveControlLog {
        logs: message.logs,
    };
    match message.connection_id {
        Some(connection_id) => {
            registry.send_to(&connection_id, &server_event);
        }
        None => {
            registry.broadcast(&names::control_log(event), &server_event);
            registry.broadcast(
                &names::car_control_log(event, &car_number),
                &server_event,
            );
        }
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
