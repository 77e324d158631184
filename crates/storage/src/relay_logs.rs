// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RelayLogs`: relay connection records for fleet diagnostics.

use crate::{Db, StorageError};
use chrono::{DateTime, Utc};
use pw_core::{EventId, OrgId};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct RelayLogRow {
    pub event_id: i64,
    pub org_id: i64,
    pub connection_id: String,
    pub relay_version: String,
    pub connected_at: DateTime<Utc>,
}

impl Db {
    pub async fn insert_relay_log(
        &self,
        event: EventId,
        org: OrgId,
        connection_id: &str,
        relay_version: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO relay_logs (event_id, org_id, connection_id, relay_version, connected_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.value())
        .bind(org.value())
        .bind(connection_id)
        .bind(relay_version)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn relay_logs_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<RelayLogRow>, StorageError> {
        let rows = sqlx::query_as::<_, RelayLogRow>(
            "SELECT event_id, org_id, connection_id, relay_version, connected_at \
             FROM relay_logs WHERE event_id = $1 ORDER BY connected_at",
        )
        .bind(event.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
