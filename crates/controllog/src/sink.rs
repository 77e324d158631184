// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound seam: subscriber pushes and shared-cache writes.

use async_trait::async_trait;
use pw_bus::{Bus, BusError, ControlLogMessage};
use pw_core::{keys, CarControlLogs, CarPenalty, EventId};

#[async_trait]
pub trait LogSink: Send + Sync {
    /// Push an update toward subscribers (per-car and whole-event groups;
    /// targeted at one connection when the message carries one).
    async fn push(&self, message: &ControlLogMessage) -> Result<(), BusError>;

    async fn write_full(&self, event: EventId, logs: &[CarControlLogs]) -> Result<(), BusError>;

    async fn write_car(&self, event: EventId, logs: &CarControlLogs) -> Result<(), BusError>;

    async fn write_penalty(
        &self,
        event: EventId,
        car: &str,
        penalty: CarPenalty,
    ) -> Result<(), BusError>;

    async fn remove_car(&self, event: EventId, car: &str) -> Result<(), BusError>;

    /// Car numbers that currently have a per-car cache key.
    async fn cached_cars(&self, event: EventId) -> Result<Vec<String>, BusError>;

    /// Car numbers present in the penalties hash.
    async fn penalty_cars(&self, event: EventId) -> Result<Vec<String>, BusError>;
}

pub struct BusLogSink {
    bus: Bus,
}

impl BusLogSink {
    pub fn new(bus: Bus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl LogSink for BusLogSink {
    async fn push(&self, message: &ControlLogMessage) -> Result<(), BusError> {
        self.bus
            .publish_json(&keys::control_log_push(message.event_id), message)
            .await
    }

    async fn write_full(&self, event: EventId, logs: &[CarControlLogs]) -> Result<(), BusError> {
        self.bus.set_json(&keys::control_log(event), &logs).await
    }

    async fn write_car(&self, event: EventId, logs: &CarControlLogs) -> Result<(), BusError> {
        self.bus
            .set_json(&keys::control_log_car(event, &logs.car_number), logs)
            .await
    }

    async fn write_penalty(
        &self,
        event: EventId,
        car: &str,
        penalty: CarPenalty,
    ) -> Result<(), BusError> {
        self.bus
            .hash_set_json(&keys::control_log_car_penalties(event), car, &penalty)
            .await
    }

    async fn remove_car(&self, event: EventId, car: &str) -> Result<(), BusError> {
        self.bus.delete(&keys::control_log_car(event, car)).await?;
        self.bus
            .hash_delete(&keys::control_log_car_penalties(event), car)
            .await
    }

    async fn cached_cars(&self, event: EventId) -> Result<Vec<String>, BusError> {
        let prefix = keys::control_log_car(event, "");
        let cached = self
            .bus
            .scan_keys(&keys::control_log_car_pattern(event))
            .await?;
        Ok(cached
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    async fn penalty_cars(&self, event: EventId) -> Result<Vec<String>, BusError> {
        let entries = self
            .bus
            .hash_entries(&keys::control_log_car_penalties(event))
            .await?;
        Ok(entries.into_iter().map(|(car, _)| car).collect())
    }
}
