// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The poll → diff → push → cache → GC cycle.

use crate::cache::ControlLogCache;
use crate::metrics::ControlLogMetrics;
use crate::sink::LogSink;
use crate::source::ControlLogSource;
use crate::AggregatorError;
use pw_bus::{ControlLogMessage, ControlLogRequest};
use pw_core::{CarControlLogs, EventId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Aggregator<S: ControlLogSource, K: LogSink> {
    event_id: EventId,
    source: S,
    sink: K,
    cache: ControlLogCache,
    metrics: Arc<ControlLogMetrics>,
}

impl<S: ControlLogSource, K: LogSink> Aggregator<S, K> {
    pub fn new(event_id: EventId, source: S, sink: K, metrics: Arc<ControlLogMetrics>) -> Self {
        Self {
            event_id,
            source,
            sink,
            cache: ControlLogCache::new(),
            metrics,
        }
    }

    /// One poll cycle. Source failures only bump a counter; the previous
    /// cache keeps serving.
    pub async fn tick(&mut self) -> Result<(), AggregatorError> {
        self.metrics.requests.incr();
        let entries = match self.source.fetch().await {
            Ok(entries) => entries,
            Err(err) => {
                self.metrics.failures.incr();
                warn!(%err, "control log poll failed");
                return Ok(());
            }
        };
        self.metrics.entries_total.add(entries.len() as u64);

        let changes = self.cache.update(entries);
        if changes.is_empty() {
            debug!("control log unchanged");
            return Ok(());
        }
        info!(
            changed = changes.changed.len(),
            removed = changes.removed.len(),
            "control log changed"
        );

        // Push changed cars toward subscribers, then refresh the cache
        for logs in &changes.changed {
            self.sink
                .push(&ControlLogMessage {
                    event_id: self.event_id,
                    logs: logs.clone(),
                    connection_id: None,
                })
                .await?;
            self.sink.write_car(self.event_id, logs).await?;
        }

        self.sink.write_full(self.event_id, &self.cache.all()).await?;
        for (car, penalty) in self.cache.penalties() {
            self.sink.write_penalty(self.event_id, &car, penalty).await?;
        }

        self.gc().await?;
        Ok(())
    }

    /// Serve "UI opened details for car X" by pushing the current slice to
    /// exactly that connection.
    pub async fn on_request(&self, request: &ControlLogRequest) -> Result<(), AggregatorError> {
        if request.event_id != self.event_id {
            return Ok(());
        }
        let logs = self
            .cache
            .car(&request.car_number)
            .cloned()
            .unwrap_or_else(|| CarControlLogs {
                car_number: request.car_number.clone(),
                entries: Vec::new(),
            });
        self.sink
            .push(&ControlLogMessage {
                event_id: self.event_id,
                logs,
                connection_id: Some(request.connection_id.clone()),
            })
            .await?;
        Ok(())
    }

    /// Delete per-car keys and penalty hash entries for cars no longer in
    /// the log.
    async fn gc(&self) -> Result<(), AggregatorError> {
        let active: HashSet<String> = self
            .cache
            .all()
            .into_iter()
            .map(|logs| logs.car_number)
            .collect();

        for car in self.sink.cached_cars(self.event_id).await? {
            if !active.contains(&car) {
                debug!(car, "garbage-collecting control log cache entry");
                self.sink.remove_car(self.event_id, &car).await?;
            }
        }
        for car in self.sink.penalty_cars(self.event_id).await? {
            if !active.contains(&car) {
                self.sink.remove_car(self.event_id, &car).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod tests;
