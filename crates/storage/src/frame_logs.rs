// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RelayFrameLogs`: raw relay traffic captured by the logger worker.
//!
//! One row per stream entry, verbatim, so events can be replayed and
//! protocol issues diagnosed after the fact. Archived with the event and
//! purged afterwards.

use crate::{Db, StorageError};
use chrono::{DateTime, Utc};
use pw_core::EventId;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct RelayFrameLogRow {
    pub event_id: i64,
    pub stream_id: String,
    pub field: String,
    pub payload: String,
    pub logged_at: DateTime<Utc>,
}

impl Db {
    pub async fn insert_frame_log(
        &self,
        event: EventId,
        stream_id: &str,
        field: &str,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO relay_frame_logs (event_id, stream_id, field, payload, logged_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING",
        )
        .bind(event.value())
        .bind(stream_id)
        .bind(field)
        .bind(payload)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn frame_logs_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<RelayFrameLogRow>, StorageError> {
        let rows = sqlx::query_as::<_, RelayFrameLogRow>(
            "SELECT event_id, stream_id, field, payload, logged_at \
             FROM relay_frame_logs WHERE event_id = $1 ORDER BY stream_id",
        )
        .bind(event.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Resume point for the logger worker after a restart.
    pub async fn last_logged_stream_id(
        &self,
        event: EventId,
    ) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT stream_id FROM relay_frame_logs WHERE event_id = $1 \
             ORDER BY stream_id DESC LIMIT 1",
        )
        .bind(event.value())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
