// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database seam for the archiver.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pw_core::EventId;
use pw_storage::{
    CarLapLogRow, Db, EventRow, FlagLogRow, RelayFrameLogRow, RelayLogRow, SessionResultRow,
    SessionRow, StorageError, X2PassingRow,
};

#[async_trait]
pub trait ArchiveDb: Send + Sync {
    async fn archivable_events(&self, now: DateTime<Utc>) -> Result<Vec<EventRow>, StorageError>;
    async fn purgeable_simulated_events(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventRow>, StorageError>;
    async fn sessions_for_event(&self, event: EventId) -> Result<Vec<SessionRow>, StorageError>;
    async fn relay_logs_for_event(&self, event: EventId) -> Result<Vec<RelayLogRow>, StorageError>;
    async fn frame_logs_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<RelayFrameLogRow>, StorageError>;
    async fn laps_for_session(
        &self,
        event: EventId,
        session: i64,
    ) -> Result<Vec<CarLapLogRow>, StorageError>;
    async fn flags_for_session(
        &self,
        event: EventId,
        session: i64,
    ) -> Result<Vec<FlagLogRow>, StorageError>;
    async fn x2_passings_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<X2PassingRow>, StorageError>;
    async fn session_results(&self, event: EventId)
        -> Result<Vec<SessionResultRow>, StorageError>;
    async fn mark_archived(&self, event: EventId) -> Result<(), StorageError>;
    async fn purge_car_last_laps(&self, event: EventId) -> Result<u64, StorageError>;
    async fn purge_event_rows(&self, event: EventId) -> Result<(), StorageError>;
}

macro_rules! delegate {
    ($(async fn $name:ident(&self $(, $arg:ident : $ty:ty)*) -> $ret:ty;)*) => {
        #[async_trait]
        impl ArchiveDb for Db {
            $(
                async fn $name(&self $(, $arg: $ty)*) -> $ret {
                    Db::$name(self $(, $arg)*).await
                }
            )*
        }
    };
}

delegate! {
    async fn archivable_events(&self, now: DateTime<Utc>) -> Result<Vec<EventRow>, StorageError>;
    async fn purgeable_simulated_events(&self, now: DateTime<Utc>) -> Result<Vec<EventRow>, StorageError>;
    async fn sessions_for_event(&self, event: EventId) -> Result<Vec<SessionRow>, StorageError>;
    async fn relay_logs_for_event(&self, event: EventId) -> Result<Vec<RelayLogRow>, StorageError>;
    async fn frame_logs_for_event(&self, event: EventId) -> Result<Vec<RelayFrameLogRow>, StorageError>;
    async fn laps_for_session(&self, event: EventId, session: i64) -> Result<Vec<CarLapLogRow>, StorageError>;
    async fn flags_for_session(&self, event: EventId, session: i64) -> Result<Vec<FlagLogRow>, StorageError>;
    async fn x2_passings_for_event(&self, event: EventId) -> Result<Vec<X2PassingRow>, StorageError>;
    async fn session_results(&self, event: EventId) -> Result<Vec<SessionResultRow>, StorageError>;
    async fn mark_archived(&self, event: EventId) -> Result<(), StorageError>;
    async fn purge_car_last_laps(&self, event: EventId) -> Result<u64, StorageError>;
    async fn purge_event_rows(&self, event: EventId) -> Result<(), StorageError>;
}
