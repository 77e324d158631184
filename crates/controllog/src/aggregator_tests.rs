// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sink::LogSink;
use crate::source::{ControlLogSource, SourceError};
use async_trait::async_trait;
use parking_lot::Mutex;
use pw_bus::BusError;
use pw_core::test_support::control_log_entry;
use pw_core::{CarPenalty, ControlLogEntry};
use std::collections::HashMap;

#[derive(Default)]
struct FakeSource {
    responses: Mutex<Vec<Result<Vec<ControlLogEntry>, ()>>>,
}

impl FakeSource {
    fn push_ok(&self, entries: Vec<ControlLogEntry>) {
        self.responses.lock().push(Ok(entries));
    }

    fn push_err(&self) {
        self.responses.lock().push(Err(()));
    }
}

#[async_trait]
impl ControlLogSource for &FakeSource {
    async fn fetch(&self) -> Result<Vec<ControlLogEntry>, SourceError> {
        match self.responses.lock().remove(0) {
            Ok(entries) => Ok(entries),
            Err(()) => Err(SourceError::UnknownType("injected".to_string())),
        }
    }
}

#[derive(Default)]
struct FakeSink {
    pushed: Mutex<Vec<ControlLogMessage>>,
    cars: Mutex<HashMap<String, CarControlLogs>>,
    penalties: Mutex<HashMap<String, CarPenalty>>,
    full: Mutex<Vec<CarControlLogs>>,
}

#[async_trait]
impl LogSink for &FakeSink {
    async fn push(&self, message: &ControlLogMessage) -> Result<(), BusError> {
        self.pushed.lock().push(message.clone());
        Ok(())
    }

    async fn write_full(&self, _event: EventId, logs: &[CarControlLogs]) -> Result<(), BusError> {
        *self.full.lock() = logs.to_vec();
        Ok(())
    }

    async fn write_car(&self, _event: EventId, logs: &CarControlLogs) -> Result<(), BusError> {
        self.cars.lock().insert(logs.car_number.clone(), logs.clone());
        Ok(())
    }

    async fn write_penalty(
        &self,
        _event: EventId,
        car: &str,
        penalty: CarPenalty,
    ) -> Result<(), BusError> {
        self.penalties.lock().insert(car.to_string(), penalty);
        Ok(())
    }

    async fn remove_car(&self, _event: EventId, car: &str) -> Result<(), BusError> {
        self.cars.lock().remove(car);
        self.penalties.lock().remove(car);
        Ok(())
    }

    async fn cached_cars(&self, _event: EventId) -> Result<Vec<String>, BusError> {
        Ok(self.cars.lock().keys().cloned().collect())
    }

    async fn penalty_cars(&self, _event: EventId) -> Result<Vec<String>, BusError> {
        Ok(self.penalties.lock().keys().cloned().collect())
    }
}

fn aggregator<'a>(
    source: &'a FakeSource,
    sink: &'a FakeSink,
) -> Aggregator<&'a FakeSource, &'a FakeSink> {
    Aggregator::new(
        EventId::new(1),
        source,
        sink,
        Arc::new(ControlLogMetrics::default()),
    )
}

#[tokio::test]
async fn penalty_growth_reaches_hash_and_subscribers() {
    let source = FakeSource::default();
    let sink = FakeSink::default();
    let mut aggregator = aggregator(&source, &sink);

    // Car 42 starts clean, then picks up (1 warning, 2 laps)
    source.push_ok(vec![control_log_entry("42", None, None)]);
    aggregator.tick().await.unwrap();
    assert_eq!(
        sink.penalties.lock().get("42"),
        Some(&CarPenalty { warnings: 0, laps: 0 })
    );

    source.push_ok(vec![
        control_log_entry("42", None, None),
        control_log_entry("42", Some(1), Some(2)),
    ]);
    aggregator.tick().await.unwrap();

    assert_eq!(
        sink.penalties.lock().get("42"),
        Some(&CarPenalty { warnings: 1, laps: 2 })
    );
    // A broadcast push carried the updated per-car log
    let pushed = sink.pushed.lock();
    let last = pushed.last().unwrap();
    assert_eq!(last.logs.car_number, "42");
    assert_eq!(last.logs.entries.len(), 2);
    assert!(last.connection_id.is_none());
}

#[tokio::test]
async fn unchanged_poll_pushes_nothing() {
    let source = FakeSource::default();
    let sink = FakeSink::default();
    let mut aggregator = aggregator(&source, &sink);

    let entries = vec![control_log_entry("42", Some(1), None)];
    source.push_ok(entries.clone());
    aggregator.tick().await.unwrap();
    let count = sink.pushed.lock().len();

    source.push_ok(entries);
    aggregator.tick().await.unwrap();
    assert_eq!(sink.pushed.lock().len(), count);
}

#[tokio::test]
async fn source_failure_keeps_previous_cache() {
    let source = FakeSource::default();
    let sink = FakeSink::default();
    let metrics = Arc::new(ControlLogMetrics::default());
    let mut aggregator = Aggregator::new(EventId::new(1), &source, &sink, Arc::clone(&metrics));

    source.push_ok(vec![control_log_entry("42", Some(1), None)]);
    aggregator.tick().await.unwrap();

    source.push_err();
    aggregator.tick().await.unwrap();

    assert_eq!(metrics.failures.get(), 1);
    assert_eq!(metrics.requests.get(), 2);
    // Cache still serves car 42
    assert!(sink.cars.lock().contains_key("42"));
}

#[tokio::test]
async fn gc_removes_cars_that_left_the_log() {
    let source = FakeSource::default();
    let sink = FakeSink::default();
    let mut aggregator = aggregator(&source, &sink);

    source.push_ok(vec![
        control_log_entry("42", Some(1), None),
        control_log_entry("7", None, None),
    ]);
    aggregator.tick().await.unwrap();
    assert!(sink.cars.lock().contains_key("7"));

    source.push_ok(vec![control_log_entry("42", Some(1), None)]);
    aggregator.tick().await.unwrap();

    assert!(!sink.cars.lock().contains_key("7"));
    assert!(!sink.penalties.lock().contains_key("7"));
    assert!(sink.cars.lock().contains_key("42"));
}

#[tokio::test]
async fn on_demand_request_targets_one_connection() {
    let source = FakeSource::default();
    let sink = FakeSink::default();
    let mut aggregator = aggregator(&source, &sink);

    source.push_ok(vec![control_log_entry("42", Some(1), None)]);
    aggregator.tick().await.unwrap();

    aggregator
        .on_request(&ControlLogRequest {
            event_id: EventId::new(1),
            car_number: "42".to_string(),
            connection_id: "conn-3".to_string(),
        })
        .await
        .unwrap();

    let pushed = sink.pushed.lock();
    let last = pushed.last().unwrap();
    assert_eq!(last.connection_id.as_deref(), Some("conn-3"));
    assert_eq!(last.logs.entries.len(), 1);

    // Requests for other events are ignored
    drop(pushed);
    let count = sink.pushed.lock().len();
    aggregator
        .on_request(&ControlLogRequest {
            event_id: EventId::new(2),
            car_number: "42".to_string(),
            connection_id: "conn-3".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(sink.pushed.lock().len(), count);
}

#[tokio::test]
async fn unknown_car_request_returns_empty_slice() {
    let source = FakeSource::default();
    let sink = FakeSink::default();
    let aggregator = aggregator(&source, &sink);

    aggregator
        .on_request(&ControlLogRequest {
            event_id: EventId::new(1),
            car_number: "99".to_string(),
            connection_id: "conn-1".to_string(),
        })
        .await
        .unwrap();

    let pushed = sink.pushed.lock();
    assert_eq!(pushed[0].logs.car_number, "99");
    assert!(pushed[0].logs.entries.is_empty());
}
