// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pw-bus: Redis-backed message bus and shared cache.
//!
//! Per-event timing frames ride an append-only stream (single writer: the
//! hub; single reader: the owning processor). Relay heartbeats live in a
//! hash, snapshot/control-log entries in plain keys, and control messages
//! on pub/sub channels. All handles are cheap clones over one multiplexed
//! connection.

mod heartbeat;
mod messages;
mod pubsub;
mod stream;

pub use heartbeat::*;
pub use messages::{
    decode_b64, encode_b64, ControlLogMessage, ControlLogRequest, PatchMessage, SnapshotRequest,
};
pub use pubsub::{BusMessage, Subscriber, Subscription};
pub use stream::StreamEntry;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared bus handle. Clone freely; all clones multiplex one connection
/// that the manager re-establishes on failure.
#[derive(Clone)]
pub struct Bus {
    pub(crate) client: redis::Client,
    pub(crate) manager: ConnectionManager,
}

impl Bus {
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client.clone()).await?;
        Ok(Self { client, manager })
    }

    /// Round-trip liveness probe for health endpoints.
    pub async fn ping(&self) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    // ── Plain keys ──────────────────────────────────────────────────────

    pub async fn set_bytes(&self, key: &str, value: &[u8]) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, BusError> {
        let mut conn = self.manager.clone();
        Ok(conn.get(key).await?)
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), BusError> {
        self.set_bytes(key, &serde_json::to_vec(value)?).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, BusError> {
        match self.get_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Keys matching a glob pattern, via cursor scan (never KEYS).
    pub async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, BusError> {
        let mut conn = self.manager.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(keys)
    }

    // ── Hashes ──────────────────────────────────────────────────────────

    pub async fn hash_set_json<T: Serialize>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        conn.hset::<_, _, _, ()>(key, field, serde_json::to_vec(value)?)
            .await?;
        Ok(())
    }

    pub async fn hash_get_json<T: DeserializeOwned>(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<T>, BusError> {
        let mut conn = self.manager.clone();
        let bytes: Option<Vec<u8>> = conn.hget(key, field).await?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every `(field, raw value)` pair of a hash.
    pub async fn hash_entries(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>, BusError> {
        let mut conn = self.manager.clone();
        Ok(conn.hgetall(key).await?)
    }

    pub async fn hash_delete(&self, key: &str, field: &str) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        conn.hdel::<_, _, ()>(key, field).await?;
        Ok(())
    }

    // ── Sets ────────────────────────────────────────────────────────────

    pub async fn set_add(&self, key: &str, member: &str) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        conn.sadd::<_, _, ()>(key, member).await?;
        Ok(())
    }

    pub async fn set_remove(&self, key: &str, member: &str) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        conn.srem::<_, _, ()>(key, member).await?;
        Ok(())
    }

    pub async fn set_members(&self, key: &str) -> Result<Vec<String>, BusError> {
        let mut conn = self.manager.clone();
        Ok(conn.smembers(key).await?)
    }

    // ── Pub/sub (publish side; see `pubsub` for subscriptions) ──────────

    pub async fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        conn.publish::<_, _, ()>(channel, payload).await?;
        Ok(())
    }

    pub async fn publish_json<T: Serialize>(
        &self,
        channel: &str,
        value: &T,
    ) -> Result<(), BusError> {
        self.publish(channel, &serde_json::to_string(value)?).await
    }

    /// Subscriber factory; each subscriber owns its own connection because
    /// a subscribed Redis connection cannot multiplex commands.
    pub fn subscriber(&self) -> Subscriber {
        Subscriber::new(self.client.clone())
    }
}
