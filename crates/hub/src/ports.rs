// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hub's outward-facing operations, behind one seam so command
//! handling is testable without live Redis/Postgres.

use crate::HubError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pw_bus::{Bus, ControlLogRequest, SnapshotRequest};
use pw_codecs::StreamEnvelope;
use pw_core::{keys, EventId, OrgId, RelayConnectionEventEntry, SessionId};
use pw_storage::Db;

#[async_trait]
pub trait HubPorts: Send + Sync {
    /// Append raw RMonitor records to the event stream (hot path).
    async fn append_rmonitor(
        &self,
        event: EventId,
        session: u32,
        command: &str,
    ) -> Result<(), HubError>;

    /// Append one Multiloop frame (already base64) to the event stream.
    async fn append_multiloop(
        &self,
        event: EventId,
        session: u32,
        frame_b64: &str,
    ) -> Result<(), HubError>;

    /// Append a JSON control envelope (session change, driver info, reset).
    async fn append_message(
        &self,
        event: EventId,
        envelope: &StreamEnvelope,
    ) -> Result<(), HubError>;

    async fn org_owns_event(&self, org: OrgId, event: EventId) -> Result<bool, HubError>;

    async fn create_session(
        &self,
        event: EventId,
        session: SessionId,
        name: &str,
        tz_offset_hours: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, HubError>;

    async fn record_heartbeat(&self, entry: &RelayConnectionEventEntry) -> Result<(), HubError>;

    async fn insert_relay_log(
        &self,
        event: EventId,
        org: OrgId,
        connection_id: &str,
        relay_version: &str,
        now: DateTime<Utc>,
    ) -> Result<(), HubError>;

    async fn add_status_connection(
        &self,
        event: EventId,
        connection_id: &str,
    ) -> Result<(), HubError>;

    async fn remove_status_connection(
        &self,
        event: EventId,
        connection_id: &str,
    ) -> Result<(), HubError>;

    /// Ask the owning processor to push a snapshot to one connection.
    async fn request_snapshot(&self, request: &SnapshotRequest) -> Result<(), HubError>;

    /// Ask the control-log aggregator for a per-car slice.
    async fn request_control_log(&self, request: &ControlLogRequest) -> Result<(), HubError>;
}

/// Production ports over the bus and database.
#[derive(Clone)]
pub struct BusDbPorts {
    bus: Bus,
    db: Db,
}

impl BusDbPorts {
    pub fn new(bus: Bus, db: Db) -> Self {
        Self { bus, db }
    }
}

#[async_trait]
impl HubPorts for BusDbPorts {
    async fn append_rmonitor(
        &self,
        event: EventId,
        session: u32,
        command: &str,
    ) -> Result<(), HubError> {
        self.bus
            .stream_append(
                &keys::event_stream(event),
                &keys::event_rmon_stream_field(event, session),
                command,
            )
            .await?;
        Ok(())
    }

    async fn append_multiloop(
        &self,
        event: EventId,
        session: u32,
        frame_b64: &str,
    ) -> Result<(), HubError> {
        let field = format!("mloop-{event}-{session}");
        self.bus
            .stream_append(&keys::event_stream(event), &field, frame_b64)
            .await?;
        Ok(())
    }

    async fn append_message(
        &self,
        event: EventId,
        envelope: &StreamEnvelope,
    ) -> Result<(), HubError> {
        let payload = serde_json::to_string(envelope)?;
        self.bus
            .stream_append(&keys::event_stream(event), "message", &payload)
            .await?;
        Ok(())
    }

    async fn org_owns_event(&self, org: OrgId, event: EventId) -> Result<bool, HubError> {
        Ok(self.db.org_owns_event(org, event).await?)
    }

    async fn create_session(
        &self,
        event: EventId,
        session: SessionId,
        name: &str,
        tz_offset_hours: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, HubError> {
        Ok(self
            .db
            .create_session_if_absent(event, session, name, tz_offset_hours, now)
            .await?)
    }

    async fn record_heartbeat(&self, entry: &RelayConnectionEventEntry) -> Result<(), HubError> {
        self.bus.record_relay_heartbeat(entry).await?;
        Ok(())
    }

    async fn insert_relay_log(
        &self,
        event: EventId,
        org: OrgId,
        connection_id: &str,
        relay_version: &str,
        now: DateTime<Utc>,
    ) -> Result<(), HubError> {
        self.db
            .insert_relay_log(event, org, connection_id, relay_version, now)
            .await?;
        Ok(())
    }

    async fn add_status_connection(
        &self,
        event: EventId,
        connection_id: &str,
    ) -> Result<(), HubError> {
        self.bus
            .set_add(&keys::status_event_connections(event), connection_id)
            .await?;
        Ok(())
    }

    async fn remove_status_connection(
        &self,
        event: EventId,
        connection_id: &str,
    ) -> Result<(), HubError> {
        self.bus
            .set_remove(&keys::status_event_connections(event), connection_id)
            .await?;
        Ok(())
    }

    async fn request_snapshot(&self, request: &SnapshotRequest) -> Result<(), HubError> {
        self.bus.publish_json(keys::SEND_FULL_STATUS, request).await?;
        Ok(())
    }

    async fn request_control_log(&self, request: &ControlLogRequest) -> Result<(), HubError> {
        self.bus.publish_json(keys::SEND_CONTROL_LOG, request).await?;
        Ok(())
    }
}
