// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client command dispatch.
//!
//! Authorization failures are warn-logged and swallowed: a misbehaving
//! client sees silence, other clients see nothing at all.

use crate::auth::{Claims, ClientKind};
use crate::groups::{names, Registry};
use crate::heartbeat::HeartbeatTracker;
use crate::ports::HubPorts;
use crate::proto::ClientCommand;
use crate::HubError;
use pw_bus::{ControlLogRequest, SnapshotRequest};
use pw_codecs::StreamEnvelope;
use pw_core::{Clock, EventId, OrgId, RelayConnectionEventEntry, SessionId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub connection_id: String,
    pub claims: Claims,
    pub relay_version: String,
}

pub struct CommandHandler<P: HubPorts, C: Clock> {
    ports: Arc<P>,
    registry: Arc<Registry>,
    heartbeats: HeartbeatTracker,
    clock: C,
}

impl<P: HubPorts, C: Clock> CommandHandler<P, C> {
    pub fn new(ports: Arc<P>, registry: Arc<Registry>, clock: C) -> Self {
        Self {
            ports,
            registry,
            heartbeats: HeartbeatTracker::new(),
            clock,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn handle(
        &self,
        ctx: &ConnectionContext,
        command: ClientCommand,
    ) -> Result<(), HubError> {
        if command.is_relay_method() && ctx.claims.kind() != ClientKind::Relay {
            warn!(
                connection = %ctx.connection_id,
                sub = %ctx.claims.sub,
                "non-relay client attempted a relay method"
            );
            return Ok(());
        }

        match command {
            ClientCommand::SendRMonitor {
                event_id,
                session_id,
                command,
            } => {
                let event = EventId::new(event_id);
                self.relay_liveness(ctx, event).await?;
                self.ports.append_rmonitor(event, session_id, &command).await
            }

            ClientCommand::SendMultiloop {
                event_id,
                session_id,
                frame_b64,
            } => {
                let event = EventId::new(event_id);
                self.relay_liveness(ctx, event).await?;
                self.ports
                    .append_multiloop(event, session_id, &frame_b64)
                    .await
            }

            ClientCommand::SendSessionChange {
                event_id,
                session_id,
                session_name,
                local_tz_offset_hours,
            } => {
                self.on_session_change(
                    ctx,
                    EventId::new(event_id),
                    SessionId::new(session_id),
                    &session_name,
                    local_tz_offset_hours,
                )
                .await
            }

            ClientCommand::SubscribeToEvent { event_id } => {
                self.subscribe_event(ctx, EventId::new(event_id), names::event_v1).await
            }
            ClientCommand::SubscribeToEventV2 { event_id } => {
                self.subscribe_event(ctx, EventId::new(event_id), names::event_v2).await
            }
            ClientCommand::UnsubscribeFromEvent { event_id } => {
                self.unsubscribe_event(ctx, EventId::new(event_id), names::event_v1).await
            }
            ClientCommand::UnsubscribeFromEventV2 { event_id } => {
                self.unsubscribe_event(ctx, EventId::new(event_id), names::event_v2).await
            }

            ClientCommand::SubscribeToControlLogs { event_id } => {
                self.registry
                    .join(&names::control_log(EventId::new(event_id)), &ctx.connection_id);
                Ok(())
            }
            ClientCommand::UnsubscribeFromControlLogs { event_id } => {
                self.registry
                    .leave(&names::control_log(EventId::new(event_id)), &ctx.connection_id);
                Ok(())
            }

            ClientCommand::SubscribeToCarControlLogs {
                event_id,
                car_number,
            } => {
                let event = EventId::new(event_id);
                self.registry
                    .join(&names::car_control_log(event, &car_number), &ctx.connection_id);
                self.ports
                    .request_control_log(&ControlLogRequest {
                        event_id: event,
                        car_number,
                        connection_id: ctx.connection_id.clone(),
                    })
                    .await
            }
            ClientCommand::UnsubscribeFromCarControlLogs {
                event_id,
                car_number,
            } => {
                self.registry.leave(
                    &names::car_control_log(EventId::new(event_id), &car_number),
                    &ctx.connection_id,
                );
                Ok(())
            }

            ClientCommand::SubscribeToInCarDriverEvent {
                event_id,
                car_number,
            }
            | ClientCommand::SubscribeToInCarDriverEventV2 {
                event_id,
                car_number,
            } => {
                self.registry.join(
                    &names::in_car(EventId::new(event_id), &car_number),
                    &ctx.connection_id,
                );
                Ok(())
            }
            ClientCommand::UnsubscribeFromInCarDriverEvent {
                event_id,
                car_number,
            }
            | ClientCommand::UnsubscribeFromInCarDriverEventV2 {
                event_id,
                car_number,
            } => {
                self.registry.leave(
                    &names::in_car(EventId::new(event_id), &car_number),
                    &ctx.connection_id,
                );
                Ok(())
            }
        }
    }

    /// Subscribed events for disconnect cleanup of the per-event sets.
    pub async fn on_disconnect(&self, ctx: &ConnectionContext, events: &[EventId]) {
        for &event in events {
            if let Err(err) = self
                .ports
                .remove_status_connection(event, &ctx.connection_id)
                .await
            {
                debug!(%err, %event, "status connection cleanup failed");
            }
        }
        self.heartbeats.forget_connection(&ctx.connection_id);
        self.registry.disconnect(&ctx.connection_id);
    }

    async fn on_session_change(
        &self,
        ctx: &ConnectionContext,
        event: EventId,
        session: SessionId,
        name: &str,
        tz_offset_hours: i32,
    ) -> Result<(), HubError> {
        if session.is_reserved() {
            warn!(%event, "rejecting session change with reserved session id");
            return Ok(());
        }

        let org = match ctx.claims.org_id {
            Some(org) => OrgId::new(org),
            None => {
                warn!(%event, "relay without org claim sent a session change");
                return Ok(());
            }
        };
        if !self.ports.org_owns_event(org, event).await? {
            warn!(%event, %org, "session change for an event the org does not own");
            return Ok(());
        }

        let now = self.clock.now();
        let created = self
            .ports
            .create_session(event, session, name, tz_offset_hours, now)
            .await?;
        if created {
            info!(%event, %session, name, "session row created");
        }

        self.ports
            .append_message(
                event,
                &StreamEnvelope::SessionChange {
                    session_id: session.value(),
                    session_name: name.to_string(),
                    local_tz_offset_hours: tz_offset_hours,
                },
            )
            .await
    }

    /// Heartbeat hash upkeep plus the one-time relay log row.
    async fn relay_liveness(
        &self,
        ctx: &ConnectionContext,
        event: EventId,
    ) -> Result<(), HubError> {
        let org = match ctx.claims.org_id {
            Some(org) => OrgId::new(org),
            None => return Ok(()),
        };
        let now = self.clock.now();

        if self.heartbeats.first_sighting(&ctx.connection_id, event) {
            if let Err(err) = self
                .ports
                .insert_relay_log(event, org, &ctx.connection_id, &ctx.relay_version, now)
                .await
            {
                debug!(%err, "relay log insert failed");
            }
        }

        if self.heartbeats.should_refresh(event) {
            self.ports
                .record_heartbeat(&RelayConnectionEventEntry {
                    connection_id: ctx.connection_id.clone(),
                    event_id: event,
                    org_id: org,
                    timestamp: now,
                    relay_version: ctx.relay_version.clone(),
                })
                .await?;
        }
        Ok(())
    }

    async fn subscribe_event(
        &self,
        ctx: &ConnectionContext,
        event: EventId,
        group: fn(EventId) -> String,
    ) -> Result<(), HubError> {
        self.registry.join(&group(event), &ctx.connection_id);
        self.ports
            .add_status_connection(event, &ctx.connection_id)
            .await?;
        // Fresh subscribers bootstrap from a snapshot
        self.ports
            .request_snapshot(&SnapshotRequest {
                event_id: event,
                connection_id: ctx.connection_id.clone(),
            })
            .await
    }

    async fn unsubscribe_event(
        &self,
        ctx: &ConnectionContext,
        event: EventId,
        group: fn(EventId) -> String,
    ) -> Result<(), HubError> {
        self.registry.leave(&group(event), &ctx.connection_id);
        let still_member = self
            .registry
            .is_member(&names::event_v1(event), &ctx.connection_id)
            || self
                .registry
                .is_member(&names::event_v2(event), &ctx.connection_id);
        if !still_member {
            self.ports
                .remove_status_connection(event, &ctx.connection_id)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
