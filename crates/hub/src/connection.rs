// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-socket lifecycle: one reader loop, one writer task.
//!
//! The writer drains the connection's registry queue; the reader parses
//! commands, keeps the event's bus bridge alive, and tracks which events
//! the connection subscribed to so disconnect can clean the per-event
//! connection sets.

use crate::bridge::BridgeManager;
use crate::commands::{CommandHandler, ConnectionContext};
use crate::ports::BusDbPorts;
use crate::proto::ClientCommand;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use pw_bus::Bus;
use pw_core::{EventId, SystemClock};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub type ProdHandler = CommandHandler<BusDbPorts, SystemClock>;

pub async fn run_connection(
    socket: WebSocket,
    ctx: ConnectionContext,
    handler: Arc<ProdHandler>,
    bus: Bus,
    bridges: Arc<BridgeManager>,
) {
    let registry = Arc::clone(handler.registry());
    let mut outbound = registry.connect(&ctx.connection_id);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(%err, "unserializable server event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let mut subscribed_events: HashSet<EventId> = HashSet::new();
    while let Some(message) = ws_rx.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                debug!(connection = %ctx.connection_id, %err, "socket read error");
                break;
            }
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Pings are answered by the socket layer
            _ => continue,
        };

        match serde_json::from_str::<ClientCommand>(&text) {
            Ok(command) => {
                note_subscription(&command, &mut subscribed_events, &bus, &bridges, &handler);
                if let Err(err) = handler.handle(&ctx, command).await {
                    warn!(connection = %ctx.connection_id, %err, "command failed");
                }
            }
            Err(err) => {
                warn!(connection = %ctx.connection_id, %err, "unparseable command");
            }
        }
    }

    let events: Vec<EventId> = subscribed_events.into_iter().collect();
    handler.on_disconnect(&ctx, &events).await;
    writer.abort();
    debug!(connection = %ctx.connection_id, "connection closed");
}

/// Any subscription implies the event's bridge must be up; event-group
/// subscriptions are remembered for status-set cleanup.
fn note_subscription(
    command: &ClientCommand,
    subscribed_events: &mut HashSet<EventId>,
    bus: &Bus,
    bridges: &BridgeManager,
    handler: &Arc<ProdHandler>,
) {
    let event = match command {
        ClientCommand::SubscribeToEvent { event_id }
        | ClientCommand::SubscribeToEventV2 { event_id } => {
            subscribed_events.insert(EventId::new(*event_id));
            Some(EventId::new(*event_id))
        }
        ClientCommand::SubscribeToControlLogs { event_id }
        | ClientCommand::SubscribeToCarControlLogs { event_id, .. }
        | ClientCommand::SubscribeToInCarDriverEvent { event_id, .. }
        | ClientCommand::SubscribeToInCarDriverEventV2 { event_id, .. } => {
            Some(EventId::new(*event_id))
        }
        _ => None,
    };
    if let Some(event) = event {
        bridges.ensure(bus, event, Arc::clone(handler.registry()));
    }
}
