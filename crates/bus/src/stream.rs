// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-event streams.
//!
//! One stream per event carries timing frames in arrival order. The hub is
//! the single appender and the owning processor the single reader; the
//! reader owns its cursor, so no consumer groups are involved.

use crate::{Bus, BusError};
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;

/// One stream entry: the bus-assigned id plus its field/value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

impl StreamEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Bus {
    /// Append one field/value entry; returns the assigned stream id.
    pub async fn stream_append(
        &self,
        key: &str,
        field: &str,
        payload: &str,
    ) -> Result<String, BusError> {
        let mut conn = self.connection();
        let id: String = conn.xadd(key, "*", &[(field, payload)]).await?;
        Ok(id)
    }

    /// Read up to `count` entries after `cursor`, blocking up to `block_ms`
    /// when the stream is dry. Returns an empty batch on timeout.
    pub async fn stream_read(
        &self,
        key: &str,
        cursor: &str,
        count: usize,
        block_ms: u64,
    ) -> Result<Vec<StreamEntry>, BusError> {
        let mut conn = self.connection();
        let options = StreamReadOptions::default()
            .count(count)
            .block(block_ms as usize);
        // A blocking read that times out yields nil, not an empty reply
        let reply: Option<StreamReadReply> =
            conn.xread_options(&[key], &[cursor], &options).await?;
        let Some(reply) = reply else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for stream_key in reply.keys {
            for id in stream_key.ids {
                let mut fields = Vec::with_capacity(id.map.len());
                for (name, value) in id.map {
                    let value: String = redis::from_redis_value(&value)?;
                    fields.push((name, value));
                }
                entries.push(StreamEntry { id: id.id, fields });
            }
        }
        Ok(entries)
    }

    /// Drop the whole stream (event shutdown cleanup).
    pub async fn stream_delete(&self, key: &str) -> Result<(), BusError> {
        self.delete(key).await
    }

    pub(crate) fn connection(&self) -> redis::aio::ConnectionManager {
        self.manager.clone()
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
