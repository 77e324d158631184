// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Sessions` rows and session finalization.
//!
//! A session row is created by the hub on the first session-change from a
//! relay and finalized by the session monitor. Creation uses
//! read-before-insert to stay idempotent across reconnects; finalization
//! (row update + result upsert) is one transaction.

use crate::{Db, StorageError};
use chrono::{DateTime, Utc};
use pw_core::{CarControlLogs, EventId, SessionId, SessionState};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SessionRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub is_live: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub local_tz_offset: i32,
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SessionResultRow {
    pub event_id: i64,
    pub session_id: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub state: Json<SessionState>,
    pub control_logs: Json<Vec<CarControlLogs>>,
}

impl Db {
    /// Insert a session row unless one already exists; returns whether a
    /// row was created. Marks every other session of the event not-live.
    pub async fn create_session_if_absent(
        &self,
        event: EventId,
        session: SessionId,
        name: &str,
        local_tz_offset: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM sessions WHERE event_id = $1 AND id = $2")
                .bind(event.value())
                .bind(session.value() as i64)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            tx.commit().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE sessions SET is_live = FALSE WHERE event_id = $1")
            .bind(event.value())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO sessions (id, event_id, name, is_live, start_time, last_updated, local_tz_offset) \
             VALUES ($1, $2, $3, TRUE, $4, $4, $5)",
        )
        .bind(session.value() as i64)
        .bind(event.value())
        .bind(name)
        .bind(now)
        .bind(local_tz_offset)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn sessions_for_event(&self, event: EventId) -> Result<Vec<SessionRow>, StorageError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            "SELECT id, event_id, name, is_live, start_time, end_time, last_updated, local_tz_offset \
             FROM sessions WHERE event_id = $1 ORDER BY id",
        )
        .bind(event.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Debounced keep-alive stamp while frames flow.
    pub async fn touch_session(
        &self,
        event: EventId,
        session: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE sessions SET last_updated = $3 WHERE event_id = $1 AND id = $2")
            .bind(event.value())
            .bind(session.value() as i64)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Terminal transition: close the session row and upsert its result in
    /// one transaction.
    pub async fn finalize_session(
        &self,
        event: EventId,
        session: SessionId,
        terminal_state: &SessionState,
        control_logs: &[CarControlLogs],
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE sessions SET is_live = FALSE, end_time = $3, last_updated = $3 \
             WHERE event_id = $1 AND id = $2",
        )
        .bind(event.value())
        .bind(session.value() as i64)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO session_results (event_id, session_id, start_time, state, control_logs) \
             SELECT $1, $2, s.start_time, $3, $4 FROM sessions s \
             WHERE s.event_id = $1 AND s.id = $2 \
             ON CONFLICT (event_id, session_id) \
             DO UPDATE SET state = EXCLUDED.state, control_logs = EXCLUDED.control_logs",
        )
        .bind(event.value())
        .bind(session.value() as i64)
        .bind(Json(terminal_state))
        .bind(Json(control_logs))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn session_results(
        &self,
        event: EventId,
    ) -> Result<Vec<SessionResultRow>, StorageError> {
        let rows = sqlx::query_as::<_, SessionResultRow>(
            "SELECT event_id, session_id, start_time, state, control_logs \
             FROM session_results WHERE event_id = $1 ORDER BY session_id",
        )
        .bind(event.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
