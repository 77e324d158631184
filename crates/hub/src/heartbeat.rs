// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay heartbeat throttling.
//!
//! Every relay frame could refresh the heartbeat hash, but a frame can
//! arrive dozens of times a second; the tracker limits hash writes to one
//! per event per interval. It also remembers which `(connection, event)`
//! pairs have had their relay-log row written.

use parking_lot::Mutex;
use pw_core::EventId;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Minimum spacing between heartbeat hash writes per event.
const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Default)]
pub struct HeartbeatTracker {
    last_refresh: Mutex<HashMap<EventId, Instant>>,
    logged: Mutex<HashSet<(String, EventId)>>,
}

impl HeartbeatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the event's heartbeat entry should be written now; the
    /// call itself stamps the refresh.
    pub fn should_refresh(&self, event: EventId) -> bool {
        let mut last = self.last_refresh.lock();
        match last.get(&event) {
            Some(at) if at.elapsed() < REFRESH_INTERVAL => false,
            _ => {
                last.insert(event, Instant::now());
                true
            }
        }
    }

    /// True exactly once per `(connection, event)`.
    pub fn first_sighting(&self, connection_id: &str, event: EventId) -> bool {
        self.logged
            .lock()
            .insert((connection_id.to_string(), event))
    }

    pub fn forget_connection(&self, connection_id: &str) {
        self.logged
            .lock()
            .retain(|(conn, _)| conn != connection_id);
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
