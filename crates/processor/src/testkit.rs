// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for the pipeline's ports.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::aggregate::LapCompletion;
use crate::broadcast::PatchSink;
use crate::caches::{DriverCache, PenaltyCache};
use crate::store::SessionStore;
use crate::PipelineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pw_bus::{BusError, PatchMessage};
use pw_core::{CarControlLogs, CarPenalty, DriverInfo, EventId, Flag, SessionId, SessionState};
use pw_storage::StorageError;
use std::collections::HashMap;
use std::sync::Arc;

/// Records every published message and snapshot cache write.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub messages: Arc<Mutex<Vec<PatchMessage>>>,
    pub cached_snapshots: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<PatchMessage> {
        self.messages.lock().clone()
    }

    pub fn reset_count(&self) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|m| matches!(m, PatchMessage::Reset { .. }))
            .count()
    }
}

#[async_trait]
impl PatchSink for RecordingSink {
    async fn publish(&self, message: &PatchMessage) -> Result<(), PipelineError> {
        self.messages.lock().push(message.clone());
        Ok(())
    }

    async fn cache_snapshot(&self, bytes: &[u8]) -> Result<(), PipelineError> {
        self.cached_snapshots.lock().push(bytes.to_vec());
        Ok(())
    }
}

/// In-memory session store.
#[derive(Clone, Default)]
pub struct FakeStore {
    pub finalized: Arc<Mutex<Vec<(SessionId, SessionState, Vec<CarControlLogs>)>>>,
    pub touched: Arc<Mutex<Vec<SessionId>>>,
    pub laps: Arc<Mutex<Vec<LapCompletion>>>,
    pub flags: Arc<Mutex<Vec<Flag>>>,
    /// When set, `insert_lap` fails this many times before succeeding.
    pub lap_failures_remaining: Arc<Mutex<u32>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finalized_sessions(&self) -> Vec<SessionId> {
        self.finalized.lock().iter().map(|(s, _, _)| *s).collect()
    }
}

#[allow(clippy::unwrap_used)]
fn injected_error() -> StorageError {
    // Any StorageError will do for failure injection
    StorageError::Json(serde_json::from_str::<i32>("not json").unwrap_err())
}

#[async_trait]
impl SessionStore for FakeStore {
    async fn finalize_session(
        &self,
        _event: EventId,
        session: SessionId,
        terminal_state: &SessionState,
        control_logs: &[CarControlLogs],
        _now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.finalized
            .lock()
            .push((session, terminal_state.clone(), control_logs.to_vec()));
        Ok(())
    }

    async fn touch_session(
        &self,
        _event: EventId,
        session: SessionId,
        _now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.touched.lock().push(session);
        Ok(())
    }

    async fn insert_lap(
        &self,
        _event: EventId,
        _session: SessionId,
        lap: &LapCompletion,
        _now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        {
            let mut failures = self.lap_failures_remaining.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(injected_error());
            }
        }
        self.laps.lock().push(lap.clone());
        Ok(())
    }

    async fn insert_flag(
        &self,
        _event: EventId,
        _session: SessionId,
        flag: Flag,
        _at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.flags.lock().push(flag);
        Ok(())
    }
}

/// In-memory driver + penalty caches.
#[derive(Clone, Default)]
pub struct FakeCaches {
    pub drivers_by_car: Arc<Mutex<HashMap<(i64, String), DriverInfo>>>,
    pub drivers_by_transponder: Arc<Mutex<HashMap<u32, DriverInfo>>>,
    pub penalties: Arc<Mutex<HashMap<String, CarPenalty>>>,
    pub logs: Arc<Mutex<Vec<CarControlLogs>>>,
}

impl FakeCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_driver(&self, event: EventId, info: DriverInfo) {
        if !info.car_number.is_empty() {
            self.drivers_by_car
                .lock()
                .insert((event.value(), info.car_number.clone()), info.clone());
        }
        if info.transponder_id > 0 {
            self.drivers_by_transponder
                .lock()
                .insert(info.transponder_id, info);
        }
    }

    pub fn set_penalty(&self, car: &str, warnings: u32, laps: u32) {
        self.penalties
            .lock()
            .insert(car.to_string(), CarPenalty { warnings, laps });
    }
}

#[async_trait]
impl DriverCache for FakeCaches {
    async fn lookup(
        &self,
        event: EventId,
        car_number: &str,
        transponder_id: u32,
    ) -> Result<Option<DriverInfo>, BusError> {
        if !car_number.is_empty() {
            if let Some(info) = self
                .drivers_by_car
                .lock()
                .get(&(event.value(), car_number.to_string()))
            {
                return Ok(Some(info.clone()));
            }
        }
        if transponder_id > 0 {
            return Ok(self
                .drivers_by_transponder
                .lock()
                .get(&transponder_id)
                .cloned());
        }
        Ok(None)
    }
}

#[async_trait]
impl PenaltyCache for FakeCaches {
    async fn penalties(&self, _event: EventId) -> Result<HashMap<String, CarPenalty>, BusError> {
        Ok(self.penalties.lock().clone())
    }

    async fn full_logs(&self, _event: EventId) -> Result<Vec<CarControlLogs>, BusError> {
        Ok(self.logs.lock().clone())
    }
}
