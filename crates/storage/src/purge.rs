// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-archive purges. Purge ordering is the archive service's concern;
//! these statements only ever run after the archive flag flip commits.

use crate::{Db, StorageError};
use pw_core::EventId;

impl Db {
    /// Drop `CarLastLaps` rows once an event's archive has landed.
    pub async fn purge_car_last_laps(&self, event: EventId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM car_last_laps WHERE event_id = $1")
            .bind(event.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Full relational purge for simulated events (no archive step).
    pub async fn purge_event_rows(&self, event: EventId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        for table in [
            "car_last_laps",
            "car_lap_logs",
            "flag_logs",
            "relay_logs",
            "relay_frame_logs",
            "session_results",
            "sessions",
        ] {
            let statement = format!("DELETE FROM {table} WHERE event_id = $1");
            sqlx::query(&statement)
                .bind(event.value())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// X2 decoder passing records; archived with the event, then dropped.
    pub async fn x2_passings_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<X2PassingRow>, StorageError> {
        let rows = sqlx::query_as::<_, X2PassingRow>(
            "SELECT event_id, transponder_id, loop_name, passing_time \
             FROM x2_passings WHERE event_id = $1 ORDER BY passing_time",
        )
        .bind(event.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn purge_x2_passings(&self, event: EventId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM x2_passings WHERE event_id = $1")
            .bind(event.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct X2PassingRow {
    pub event_id: i64,
    pub transponder_id: i64,
    pub loop_name: String,
    pub passing_time: chrono::DateTime<chrono::Utc>,
}
