// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed helpers over the relay heartbeat hash and shutdown channel.

use crate::{Bus, BusError};
use pw_core::{keys, EventId, RelayConnectionEventEntry};

impl Bus {
    /// Record (or refresh) a relay's heartbeat for its event. Each relay
    /// writes only its own field.
    pub async fn record_relay_heartbeat(
        &self,
        entry: &RelayConnectionEventEntry,
    ) -> Result<(), BusError> {
        self.hash_set_json(
            keys::RELAY_EVENT_CONNECTIONS,
            &keys::relay_heartbeat(entry.event_id),
            entry,
        )
        .await
    }

    /// Scan every heartbeat entry. Fields that fail to parse are skipped;
    /// the orchestrator garbage-collects them by event id.
    pub async fn read_relay_heartbeats(
        &self,
    ) -> Result<Vec<RelayConnectionEventEntry>, BusError> {
        let raw = self.hash_entries(keys::RELAY_EVENT_CONNECTIONS).await?;
        let mut entries = Vec::with_capacity(raw.len());
        for (field, bytes) in raw {
            match serde_json::from_slice(&bytes) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(field, %err, "dropping unreadable heartbeat entry");
                }
            }
        }
        Ok(entries)
    }

    pub async fn delete_relay_heartbeat(&self, event: EventId) -> Result<(), BusError> {
        self.hash_delete(keys::RELAY_EVENT_CONNECTIONS, &keys::relay_heartbeat(event))
            .await
    }

    /// Fan out the pre-shutdown signal for a set of events.
    pub async fn publish_shutdown_signal(&self, events: &[EventId]) -> Result<(), BusError> {
        self.publish_json(keys::EVENT_SHUTDOWN_SIGNAL, &events).await
    }
}
