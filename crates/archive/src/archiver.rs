// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-event archival.
//!
//! Layout under the store root:
//!
//! ```text
//! events/{event}/event.json
//! events/{event}/logs/relay-connections.json
//! events/{event}/logs/frames.json
//! events/{event}/sessions/{session}/laps.json
//! events/{event}/x2/passings.json
//! events/{event}/sessions/{session}/flags.json
//! events/{event}/sessions/{session}/result.json
//! events/{event}/competitors.json
//! ```
//!
//! Step order is fixed (logs, laps, X2, flags, competitors); the archived
//! flag flips only after every step landed, and the hot-row purge runs
//! only after the flip.

use crate::mailer::FailureMailer;
use crate::ports::ArchiveDb;
use crate::store::ObjectStore;
use crate::ArchiveError;
use chrono::{DateTime, Utc};
use pw_storage::EventRow;
use serde::Serialize;
use tracing::{error, info};

pub struct Archiver<D: ArchiveDb, O: ObjectStore, M: FailureMailer> {
    db: D,
    store: O,
    mailer: M,
}

/// Outcome of one archival run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub archived: u32,
    pub failed: u32,
    pub purged_simulated: u32,
}

impl RunOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl<D: ArchiveDb, O: ObjectStore, M: FailureMailer> Archiver<D, O, M> {
    pub fn new(db: D, store: O, mailer: M) -> Self {
        Self { db, store, mailer }
    }

    /// Archive every eligible event. Failures are isolated per event and
    /// reported by mail; the run continues.
    pub async fn run_archive(&self, now: DateTime<Utc>) -> Result<RunOutcome, ArchiveError> {
        let mut outcome = RunOutcome::default();
        for event in self.db.archivable_events(now).await? {
            let id = event.event_id();
            match self.archive_event(&event).await {
                Ok(()) => {
                    self.db.mark_archived(id).await?;
                    let purged = self.db.purge_car_last_laps(id).await?;
                    info!(event = %id, purged, "event archived");
                    outcome.archived += 1;
                }
                Err(err) => {
                    error!(event = %id, %err, "event archival failed");
                    self.mailer
                        .send(
                            &format!("Archive failed for event {id}"),
                            &format!("{} ({}): {err}", event.name, id),
                        )
                        .await;
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Simulated events are purged without archiving.
    pub async fn run_simulated_purge(
        &self,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome, ArchiveError> {
        let mut outcome = RunOutcome::default();
        for event in self.db.purgeable_simulated_events(now).await? {
            let id = event.event_id();
            self.db.purge_event_rows(id).await?;
            info!(event = %id, "simulated event purged");
            outcome.purged_simulated += 1;
        }
        Ok(outcome)
    }

    async fn archive_event(&self, event: &EventRow) -> Result<(), ArchiveError> {
        let id = event.event_id();
        let sessions = self.db.sessions_for_event(id).await?;

        self.put_json(&format!("events/{id}/event.json"), event).await?;

        // 1. Event logs
        let relay_logs = self.db.relay_logs_for_event(id).await?;
        self.put_json(&format!("events/{id}/logs/relay-connections.json"), &relay_logs)
            .await?;
        let frames = self.db.frame_logs_for_event(id).await?;
        self.put_json(&format!("events/{id}/logs/frames.json"), &frames)
            .await?;

        // 2. Laps, per session
        for session in &sessions {
            let laps = self.db.laps_for_session(id, session.id).await?;
            self.put_json(
                &format!("events/{id}/sessions/{}/laps.json", session.id),
                &laps,
            )
            .await?;
        }

        // 3. X2 device data
        let passings = self.db.x2_passings_for_event(id).await?;
        self.put_json(&format!("events/{id}/x2/passings.json"), &passings)
            .await?;

        // 4. Flags, per session
        for session in &sessions {
            let flags = self.db.flags_for_session(id, session.id).await?;
            self.put_json(
                &format!("events/{id}/sessions/{}/flags.json", session.id),
                &flags,
            )
            .await?;
        }

        // 5. Competitor metadata and terminal results
        let results = self.db.session_results(id).await?;
        for result in &results {
            self.put_json(
                &format!("events/{id}/sessions/{}/result.json", result.session_id),
                result,
            )
            .await?;
        }
        let competitors: Vec<_> = results
            .last()
            .map(|result| result.state.0.event_entries.clone())
            .unwrap_or_default();
        self.put_json(&format!("events/{id}/competitors.json"), &competitors)
            .await?;

        Ok(())
    }

    async fn put_json<T: Serialize>(&self, path: &str, value: &T) -> Result<(), ArchiveError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.store.put(path, &bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "archiver_tests.rs"]
mod tests;
