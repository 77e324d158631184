//! Control-log penalty propagation, end to end: external source →
//! aggregator → penalty hash → processor → car patch.

use crate::prelude::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use pw_bus::{BusError, ControlLogMessage, PatchMessage};
use pw_controllog::{Aggregator, ControlLogMetrics, ControlLogSource, LogSink, SourceError};
use pw_core::test_support::control_log_entry;
use pw_core::{CarControlLogs, CarPenalty, ControlLogEntry, EventId};
use pw_processor::testkit::FakeCaches;
use std::sync::Arc;

/// Source returning whatever the test queued.
#[derive(Default)]
struct QueuedSource {
    responses: Mutex<Vec<Vec<ControlLogEntry>>>,
}

#[async_trait]
impl ControlLogSource for &QueuedSource {
    async fn fetch(&self) -> Result<Vec<ControlLogEntry>, SourceError> {
        Ok(self.responses.lock().remove(0))
    }
}

/// Sink writing penalties straight into the processor's cache fake, the
/// way the shared hash couples the two workers in production.
struct SharedCacheSink {
    caches: FakeCaches,
}

#[async_trait]
impl LogSink for SharedCacheSink {
    async fn push(&self, _message: &ControlLogMessage) -> Result<(), BusError> {
        Ok(())
    }

    async fn write_full(&self, _event: EventId, logs: &[CarControlLogs]) -> Result<(), BusError> {
        *self.caches.logs.lock() = logs.to_vec();
        Ok(())
    }

    async fn write_car(&self, _event: EventId, _logs: &CarControlLogs) -> Result<(), BusError> {
        Ok(())
    }

    async fn write_penalty(
        &self,
        _event: EventId,
        car: &str,
        penalty: CarPenalty,
    ) -> Result<(), BusError> {
        self.caches.penalties.lock().insert(car.to_string(), penalty);
        Ok(())
    }

    async fn remove_car(&self, _event: EventId, car: &str) -> Result<(), BusError> {
        self.caches.penalties.lock().remove(car);
        Ok(())
    }

    async fn cached_cars(&self, _event: EventId) -> Result<Vec<String>, BusError> {
        Ok(Vec::new())
    }

    async fn penalty_cars(&self, _event: EventId) -> Result<Vec<String>, BusError> {
        Ok(self.caches.penalties.lock().keys().cloned().collect())
    }
}

#[tokio::test]
async fn penalty_growth_reaches_subscribers_as_a_car_patch() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",52474,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    let source = QueuedSource::default();
    let mut aggregator = Aggregator::new(
        EventId::new(1),
        &source,
        SharedCacheSink {
            caches: f.caches.clone(),
        },
        Arc::new(ControlLogMetrics::default()),
    );

    // Car 42 goes from clean to (1 warning, 2 laps)
    source.responses.lock().push(vec![control_log_entry("42", None, None)]);
    aggregator.tick().await.unwrap();
    f.pipeline.penalty_tick().await.unwrap();
    assert_eq!(
        f.pipeline.state().read(|s| s.car("42").unwrap().penalty_warnings),
        0
    );

    source.responses.lock().push(vec![
        control_log_entry("42", None, None),
        control_log_entry("42", Some(1), Some(2)),
    ]);
    aggregator.tick().await.unwrap();
    f.pipeline.penalty_tick().await.unwrap();

    // The hash entry
    assert_eq!(
        f.caches.penalties.lock().get("42"),
        Some(&CarPenalty { warnings: 1, laps: 2 })
    );
    // The broadcast car patch
    let messages = f.sink.messages();
    let PatchMessage::Cars { patches, .. } = messages.last().unwrap() else {
        panic!("expected car patches");
    };
    assert_eq!(patches[0].number, "42");
    assert_eq!(patches[0].penalty_warnings, Some(1));
    assert_eq!(patches[0].penalty_laps, Some(2));
    // And the state
    let (warnings, laps) = f
        .pipeline
        .state()
        .read(|s| (s.car("42").unwrap().penalty_warnings, s.car("42").unwrap().penalty_laps));
    assert_eq!((warnings, laps), (1, 2));
}

#[tokio::test]
async fn finalize_captures_control_logs_from_the_shared_cache() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();

    f.caches.logs.lock().push(CarControlLogs {
        car_number: "42".to_string(),
        entries: vec![control_log_entry("42", Some(1), None)],
    });

    f.pipeline.handle(session_change(11, "Race 2")).await.unwrap();

    let (_, _, logs) = f.store.finalized.lock()[0].clone();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].car_number, "42");
}
