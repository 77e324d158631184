// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection and group registry.
//!
//! Each connection owns an unbounded outbound queue drained by its writer
//! task; broadcast never blocks on a slow client (the socket task drops
//! the connection if its queue backs up past the socket). All registry
//! operations are lock-only, no I/O.

use crate::proto::ServerEvent;
use parking_lot::RwLock;
use pw_core::EventId;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

/// Group name helpers; the shapes the aggregator and processor address.
pub mod names {
    use super::EventId;

    /// v2 subscribers of an event (patches + msgpack snapshots).
    pub fn event_v2(event: EventId) -> String {
        format!("evt-{event}-v2")
    }

    /// v1 subscribers of an event (legacy gzip payloads).
    pub fn event_v1(event: EventId) -> String {
        format!("evt-{event}-v1")
    }

    /// Whole-event control-log watchers.
    pub fn control_log(event: EventId) -> String {
        format!("{event}-cl")
    }

    /// Single-car control-log watchers.
    pub fn car_control_log(event: EventId, car: &str) -> String {
        format!("{event}-{car}")
    }

    /// In-car driver displays for one car.
    pub fn in_car(event: EventId, car: &str) -> String {
        format!("{event}-incar-{car}")
    }
}

#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<String, mpsc::UnboundedSender<ServerEvent>>,
    groups: HashMap<String, HashSet<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound queue.
    pub fn connect(&self, connection_id: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .write()
            .connections
            .insert(connection_id.to_string(), tx);
        rx
    }

    /// Drop the connection and every group membership it held.
    pub fn disconnect(&self, connection_id: &str) {
        let mut inner = self.inner.write();
        inner.connections.remove(connection_id);
        for members in inner.groups.values_mut() {
            members.remove(connection_id);
        }
        inner.groups.retain(|_, members| !members.is_empty());
    }

    pub fn join(&self, group: &str, connection_id: &str) {
        self.inner
            .write()
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(connection_id.to_string());
    }

    pub fn leave(&self, group: &str, connection_id: &str) {
        let mut inner = self.inner.write();
        if let Some(members) = inner.groups.get_mut(group) {
            members.remove(connection_id);
            if members.is_empty() {
                inner.groups.remove(group);
            }
        }
    }

    pub fn is_member(&self, group: &str, connection_id: &str) -> bool {
        self.inner
            .read()
            .groups
            .get(group)
            .is_some_and(|members| members.contains(connection_id))
    }

    /// Fan an event out to every member of a group. Connections whose
    /// queue is gone are skipped; disconnect cleanup removes them.
    pub fn broadcast(&self, group: &str, event: &ServerEvent) -> usize {
        let inner = self.inner.read();
        let Some(members) = inner.groups.get(group) else {
            return 0;
        };
        let mut delivered = 0;
        for connection_id in members {
            if let Some(tx) = inner.connections.get(connection_id) {
                if tx.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Deliver to one connection.
    pub fn send_to(&self, connection_id: &str, event: &ServerEvent) -> bool {
        self.inner
            .read()
            .connections
            .get(connection_id)
            .map(|tx| tx.send(event.clone()).is_ok())
            .unwrap_or(false)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }
}

#[cfg(test)]
#[path = "groups_tests.rs"]
mod tests;
