// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Events` rows: liveness reconciliation and archive eligibility.

use crate::{Db, StorageError};
use chrono::{DateTime, Utc};
use pw_core::{EventId, OrgId};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct EventRow {
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_live: bool,
    pub is_archived: bool,
    pub is_simulation: bool,
}

impl EventRow {
    pub fn event_id(&self) -> EventId {
        EventId::new(self.id)
    }

    pub fn org(&self) -> OrgId {
        OrgId::new(self.org_id)
    }
}

impl Db {
    /// Reconcile `is_live` against the set of heartbeated events in one
    /// statement: members become live, everything else goes cold.
    pub async fn set_live_events(&self, live: &[EventId]) -> Result<(), StorageError> {
        let ids: Vec<i64> = live.iter().map(|e| e.value()).collect();
        sqlx::query("UPDATE events SET is_live = (id = ANY($1))")
            .bind(&ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn event(&self, event: EventId) -> Result<Option<EventRow>, StorageError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, org_id, name, start_date, end_date, is_live, is_archived, is_simulation \
             FROM events WHERE id = $1",
        )
        .bind(event.value())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// The tenant check for session creation.
    pub async fn org_owns_event(&self, org: OrgId, event: EventId) -> Result<bool, StorageError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM events WHERE id = $1 AND org_id = $2")
                .bind(event.value())
                .bind(org.value())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Events eligible for archival: ended more than a day ago, not live,
    /// not simulated, not already archived.
    pub async fn archivable_events(&self, now: DateTime<Utc>) -> Result<Vec<EventRow>, StorageError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, org_id, name, start_date, end_date, is_live, is_archived, is_simulation \
             FROM events \
             WHERE is_archived = FALSE \
               AND end_date < $1 - INTERVAL '1 day' \
               AND is_live = FALSE \
               AND is_simulation = FALSE \
             ORDER BY end_date",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Simulated events old enough to purge without archiving.
    pub async fn purgeable_simulated_events(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventRow>, StorageError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, org_id, name, start_date, end_date, is_live, is_archived, is_simulation \
             FROM events \
             WHERE is_simulation = TRUE AND end_date < $1 - INTERVAL '1 day'",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_archived(&self, event: EventId) -> Result<(), StorageError> {
        sqlx::query("UPDATE events SET is_archived = TRUE WHERE id = $1")
            .bind(event.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
