// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-hub: the duplex push channel between relays, UI clients and the
//! per-event pipelines.
//!
//! Relays push timing frames in; the hub appends them to per-event bus
//! streams. UI clients subscribe to event groups; the hub bridges the
//! processors' patch channels onto WebSocket fan-out. Authentication is
//! bearer-JWT on connect; authorization failures are warn-logged and
//! ignored, never surfaced to other clients.

pub mod auth;
pub mod bridge;
pub mod commands;
pub mod connection;
pub mod groups;
pub mod heartbeat;
pub mod ports;
pub mod proto;
pub mod server;

pub use auth::{AuthError, Claims, ClientKind};
pub use commands::CommandHandler;
pub use groups::Registry;
pub use proto::{ClientCommand, ServerEvent};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("bus error: {0}")]
    Bus(#[from] pw_bus::BusError),

    #[error("storage error: {0}")]
    Storage(#[from] pw_storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
}
