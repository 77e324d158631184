// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read seams over the shared driver and control-log caches.

use async_trait::async_trait;
use pw_bus::{Bus, BusError};
use pw_core::{keys, CarControlLogs, CarPenalty, DriverInfo, EventId};
use std::collections::HashMap;
use tracing::trace;

#[async_trait]
pub trait DriverCache: Send + Sync {
    /// Resolve a car's driver: by `(event, car number)` first, then by
    /// transponder.
    async fn lookup(
        &self,
        event: EventId,
        car_number: &str,
        transponder_id: u32,
    ) -> Result<Option<DriverInfo>, BusError>;
}

#[async_trait]
pub trait PenaltyCache: Send + Sync {
    /// Current car → penalty snapshot for the event.
    async fn penalties(&self, event: EventId) -> Result<HashMap<String, CarPenalty>, BusError>;

    /// Full per-car control logs, persisted with the session result.
    async fn full_logs(&self, event: EventId) -> Result<Vec<CarControlLogs>, BusError>;
}

/// Production implementation over the shared bus cache keys.
#[derive(Clone)]
pub struct BusCaches {
    bus: Bus,
}

impl BusCaches {
    pub fn new(bus: Bus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl DriverCache for BusCaches {
    async fn lookup(
        &self,
        event: EventId,
        car_number: &str,
        transponder_id: u32,
    ) -> Result<Option<DriverInfo>, BusError> {
        if !car_number.is_empty() {
            if let Some(info) = self
                .bus
                .get_json::<DriverInfo>(&keys::event_driver(event, car_number))
                .await?
            {
                return Ok(Some(info));
            }
        }
        if transponder_id > 0 {
            return self
                .bus
                .get_json(&keys::driver_transponder(transponder_id))
                .await;
        }
        Ok(None)
    }
}

#[async_trait]
impl PenaltyCache for BusCaches {
    async fn penalties(&self, event: EventId) -> Result<HashMap<String, CarPenalty>, BusError> {
        let entries = self
            .bus
            .hash_entries(&keys::control_log_car_penalties(event))
            .await?;
        let mut snapshot = HashMap::with_capacity(entries.len());
        for (car, bytes) in entries {
            match serde_json::from_slice::<CarPenalty>(&bytes) {
                Ok(penalty) => {
                    snapshot.insert(car, penalty);
                }
                Err(err) => trace!(car, %err, "skipping unreadable penalty entry"),
            }
        }
        Ok(snapshot)
    }

    async fn full_logs(&self, event: EventId) -> Result<Vec<CarControlLogs>, BusError> {
        Ok(self
            .bus
            .get_json(&keys::control_log(event))
            .await?
            .unwrap_or_default())
    }
}
