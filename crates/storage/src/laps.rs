// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CarLapLogs`: streamed lap completions and `FlagLog` transitions.

use crate::{Db, StorageError};
use chrono::{DateTime, Utc};
use pw_core::{EventId, Flag, SessionId};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct CarLapLogRow {
    pub event_id: i64,
    pub session_id: i64,
    pub car_number: String,
    pub lap_number: i32,
    pub lap_time: String,
    pub total_time: String,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct FlagLogRow {
    pub event_id: i64,
    pub session_id: i64,
    pub flag: String,
    pub started_at: DateTime<Utc>,
}

impl Db {
    pub async fn insert_lap_log(
        &self,
        event: EventId,
        session: SessionId,
        car_number: &str,
        lap_number: u32,
        lap_time: &str,
        total_time: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO car_lap_logs \
             (event_id, session_id, car_number, lap_number, lap_time, total_time, logged_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.value())
        .bind(session.value() as i64)
        .bind(car_number)
        .bind(lap_number as i32)
        .bind(lap_time)
        .bind(total_time)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn laps_for_session(
        &self,
        event: EventId,
        session: i64,
    ) -> Result<Vec<CarLapLogRow>, StorageError> {
        let rows = sqlx::query_as::<_, CarLapLogRow>(
            "SELECT event_id, session_id, car_number, lap_number, lap_time, total_time, logged_at \
             FROM car_lap_logs WHERE event_id = $1 AND session_id = $2 \
             ORDER BY car_number, lap_number",
        )
        .bind(event.value())
        .bind(session)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert_flag_log(
        &self,
        event: EventId,
        session: SessionId,
        flag: Flag,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO flag_logs (event_id, session_id, flag, started_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(event.value())
        .bind(session.value() as i64)
        .bind(flag.to_string())
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn flags_for_session(
        &self,
        event: EventId,
        session: i64,
    ) -> Result<Vec<FlagLogRow>, StorageError> {
        let rows = sqlx::query_as::<_, FlagLogRow>(
            "SELECT event_id, session_id, flag, started_at \
             FROM flag_logs WHERE event_id = $1 AND session_id = $2 ORDER BY started_at",
        )
        .bind(event.value())
        .bind(session)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
