//! Shared fixture: a pipeline wired to in-memory fakes.

use pw_codecs::StreamEnvelope;
use pw_core::{EventId, FakeClock, SessionId, RESERVED_SESSION_ID};
use pw_processor::testkit::{FakeCaches, FakeStore, RecordingSink};
use pw_processor::{Pipeline, ProcessorMetrics, StateHandle};
use std::sync::Arc;

pub type SpecPipeline = Pipeline<FakeStore, FakeCaches, FakeCaches, RecordingSink, FakeClock>;

pub struct Fixture {
    pub pipeline: SpecPipeline,
    pub sink: RecordingSink,
    pub store: FakeStore,
    pub caches: FakeCaches,
    pub clock: FakeClock,
}

pub fn fixture(event: i64) -> Fixture {
    let clock = FakeClock::new();
    let sink = RecordingSink::new();
    let store = FakeStore::new();
    let caches = FakeCaches::new();
    let state = StateHandle::new(EventId::new(event), SessionId::new(RESERVED_SESSION_ID));
    let pipeline = Pipeline::new(
        EventId::new(event),
        state,
        Arc::new(store.clone()),
        Arc::new(caches.clone()),
        Arc::new(caches.clone()),
        Arc::new(sink.clone()),
        clock.clone(),
        Arc::new(ProcessorMetrics::default()),
    );
    Fixture {
        pipeline,
        sink,
        store,
        caches,
        clock,
    }
}

pub fn rmon(session_id: u32, line: &str) -> StreamEnvelope {
    StreamEnvelope::RMonitor {
        session_id,
        line: line.to_string(),
    }
}

pub fn session_change(session_id: u32, name: &str) -> StreamEnvelope {
    StreamEnvelope::SessionChange {
        session_id,
        session_name: name.to_string(),
        local_tz_offset_hours: -7,
    }
}
