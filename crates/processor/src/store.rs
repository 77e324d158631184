// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence seam for the pipeline.

use crate::aggregate::LapCompletion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pw_core::{CarControlLogs, EventId, Flag, SessionId, SessionState};
use pw_storage::{Db, StorageError};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn finalize_session(
        &self,
        event: EventId,
        session: SessionId,
        terminal_state: &SessionState,
        control_logs: &[CarControlLogs],
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn touch_session(
        &self,
        event: EventId,
        session: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn insert_lap(
        &self,
        event: EventId,
        session: SessionId,
        lap: &LapCompletion,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn insert_flag(
        &self,
        event: EventId,
        session: SessionId,
        flag: Flag,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

#[async_trait]
impl SessionStore for Db {
    async fn finalize_session(
        &self,
        event: EventId,
        session: SessionId,
        terminal_state: &SessionState,
        control_logs: &[CarControlLogs],
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Db::finalize_session(self, event, session, terminal_state, control_logs, now).await
    }

    async fn touch_session(
        &self,
        event: EventId,
        session: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Db::touch_session(self, event, session, now).await
    }

    async fn insert_lap(
        &self,
        event: EventId,
        session: SessionId,
        lap: &LapCompletion,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Db::insert_lap_log(
            self,
            event,
            session,
            &lap.car_number,
            lap.lap_number,
            &lap.lap_time,
            &lap.total_time,
            now,
        )
        .await
    }

    async fn insert_flag(
        &self,
        event: EventId,
        session: SessionId,
        flag: Flag,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Db::insert_flag_log(self, event, session, flag, at).await
    }
}
