// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testkit::{FakeCaches, FakeStore, RecordingSink};
use pw_core::{EventId, FakeClock, RESERVED_SESSION_ID};

type TestPipeline = Pipeline<FakeStore, FakeCaches, FakeCaches, RecordingSink, FakeClock>;

struct Fixture {
    pipeline: TestPipeline,
    sink: RecordingSink,
    store: FakeStore,
    caches: FakeCaches,
    clock: FakeClock,
}

fn fixture() -> Fixture {
    let clock = FakeClock::new();
    let sink = RecordingSink::new();
    let store = FakeStore::new();
    let caches = FakeCaches::new();
    let state = StateHandle::new(EventId::new(1), SessionId::new(RESERVED_SESSION_ID));
    let pipeline = Pipeline::new(
        EventId::new(1),
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

fn rmon(session_id: u32, line: &str) -> StreamEnvelope {
    StreamEnvelope::RMonitor {
        session_id,
        line: line.to_string(),
    }
}

fn session_change(session_id: u32, name: &str) -> StreamEnvelope {
    StreamEnvelope::SessionChange {
        session_id,
        session_name: name.to_string(),
        local_tz_offset_hours: -7,
    }
}

#[tokio::test]
async fn reset_scenario_empties_cars_and_sends_one_reset() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();

    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",7001,\"A\",\"Driver\",\"USA\",1"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"13:00:00.000\",,Green"))
        .await
        .unwrap();
    f.pipeline.handle(rmon(10, "$I")).await.unwrap();

    assert!(f.pipeline.state().read(|s| s.car_positions.is_empty()));
    assert_eq!(f.sink.reset_count(), 1);
}

#[tokio::test]
async fn session_change_and_finalize_scenario() {
    let mut f = fixture();
    let mut finalized = f.pipeline.subscribe_finalized();

    f.pipeline.handle(session_change(10, "Qual")).await.unwrap();
    assert!(f.pipeline.state().read(|s| s.is_live));

    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",7001,\"A\",\"Driver\",\"USA\",1"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,20,\"00:20:00\",\"12:40:00.000\",\"00:00:00.000\",Green"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,0,\"00:00:00\",\"13:00:00.000\",\"00:20:00.000\",Checkered"))
        .await
        .unwrap();

    // Car 42 takes the checkered lap
    f.pipeline
        .handle(rmon(10, "$J,\"42\",\"00:02:00.000\",\"00:22:00.000\""))
        .await
        .unwrap();

    // 60 s of event time pass with no further lap changes
    f.pipeline
        .handle(rmon(10, "$F,0,\"00:00:00\",\"13:01:00.500\",\"00:21:00.000\",Checkered"))
        .await
        .unwrap();

    assert_eq!(f.store.finalized_sessions(), vec![SessionId::new(10)]);
    assert_eq!(finalized.try_recv().unwrap(), SessionId::new(10));
    assert!(!f.pipeline.state().read(|s| s.is_live));

    // The terminal state captured the car
    let (_, terminal, _) = f.store.finalized.lock()[0].clone();
    assert!(terminal.car("42").is_some());
}

#[tokio::test]
async fn reserved_session_id_never_starts_a_session() {
    let mut f = fixture();
    f.pipeline
        .handle(session_change(RESERVED_SESSION_ID, "Ghost"))
        .await
        .unwrap();

    assert!(f.pipeline.state().read(|s| !s.is_live));
    assert!(f.store.finalized.lock().is_empty());
    assert!(f.store.touched.lock().is_empty());
}

#[tokio::test]
async fn new_session_id_finalizes_prior_and_keeps_previous_state() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Qual")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",7001,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    f.pipeline.handle(session_change(11, "Race")).await.unwrap();

    assert_eq!(f.store.finalized_sessions(), vec![SessionId::new(10)]);
    assert_eq!(
        f.pipeline.state().read(|s| s.session_id),
        SessionId::new(11)
    );
    // Prior state retained for late readers
    let previous = f.pipeline.previous_session().unwrap();
    assert_eq!(previous.session_id, SessionId::new(10));
    assert!(previous.car("42").is_some());
}

#[tokio::test]
async fn identical_driver_info_emits_once() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",7001,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    let info = pw_core::DriverInfo {
        event_id: EventId::new(1),
        car_number: "42".to_string(),
        transponder_id: 7001,
        driver_id: "D1".to_string(),
        driver_name: "A".to_string(),
    };

    let before = f.sink.messages().len();
    f.pipeline
        .handle(StreamEnvelope::DriverInfo(info.clone()))
        .await
        .unwrap();
    let after_first = f.sink.messages().len();
    assert_eq!(after_first, before + 1);

    // Same assignment again: no patch (idempotent)
    f.pipeline
        .handle(StreamEnvelope::DriverInfo(info))
        .await
        .unwrap();
    assert_eq!(f.sink.messages().len(), after_first);
}

#[tokio::test]
async fn penalty_tick_patches_changed_cars() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",7001,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    f.caches.set_penalty("42", 1, 2);
    f.pipeline.penalty_tick().await.unwrap();

    let messages = f.sink.messages();
    let last = messages.last().unwrap();
    let PatchMessage::Cars { patches, .. } = last else {
        panic!("expected car patches");
    };
    assert_eq!(patches[0].number, "42");
    assert_eq!(patches[0].penalty_warnings, Some(1));
    assert_eq!(patches[0].penalty_laps, Some(2));

    // Unchanged snapshot publishes nothing further
    let count = f.sink.messages().len();
    f.pipeline.penalty_tick().await.unwrap();
    assert_eq!(f.sink.messages().len(), count);
}

#[tokio::test]
async fn sweep_clears_driver_missing_from_cache() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"7\",\"7\",7002,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();
    f.pipeline.state().write(|s| {
        s.car_mut("7").unwrap().driver_id = "D9".to_string();
        s.car_mut("7").unwrap().driver_name = "Stale".to_string();
    });

    f.pipeline.sweep_tick().await.unwrap();

    let messages = f.sink.messages();
    let PatchMessage::Cars { patches, .. } = messages.last().unwrap() else {
        panic!("expected car patches");
    };
    assert_eq!(patches[0].number, "7");
    assert_eq!(patches[0].driver_id, Some(String::new()));
    assert_eq!(patches[0].driver_name, Some(String::new()));
}

#[tokio::test]
async fn sweep_keeps_drivers_still_in_cache() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",7001,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    let info = pw_core::DriverInfo {
        event_id: EventId::new(1),
        car_number: "42".to_string(),
        transponder_id: 7001,
        driver_id: "D1".to_string(),
        driver_name: "A".to_string(),
    };
    f.caches.put_driver(EventId::new(1), info.clone());
    f.pipeline
        .handle(StreamEnvelope::DriverInfo(info))
        .await
        .unwrap();

    let count = f.sink.messages().len();
    f.pipeline.sweep_tick().await.unwrap();
    assert_eq!(f.sink.messages().len(), count);
}

#[tokio::test(start_paused = true)]
async fn lap_write_retries_then_succeeds() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    *f.store.lap_failures_remaining.lock() = 2;

    f.pipeline
        .handle(rmon(10, "$J,\"42\",\"00:02:00.000\",\"00:22:00.000\""))
        .await
        .unwrap();

    assert_eq!(f.store.laps.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn lap_write_drops_after_three_failures() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    *f.store.lap_failures_remaining.lock() = 10;

    f.pipeline
        .handle(rmon(10, "$J,\"42\",\"00:02:00.000\",\"00:22:00.000\""))
        .await
        .unwrap();

    // Dropped from persistence, but the state still reflects the lap
    assert!(f.store.laps.lock().is_empty());
    assert_eq!(
        f.pipeline.state().read(|s| s.car("42").unwrap().last_lap_completed),
        1
    );
}

#[tokio::test]
async fn undecodable_frame_is_skipped_not_fatal() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline.handle(rmon(10, "garbage line")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"13:00:00.000\",,Green"))
        .await
        .unwrap();

    assert_eq!(
        f.pipeline.state().read(|s| s.current_flag),
        pw_core::Flag::Green
    );
}

#[tokio::test]
async fn snapshot_tick_publishes_and_caches() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    let cached_before = f.sink.cached_snapshots.lock().len();

    f.pipeline.snapshot_tick().await.unwrap();

    let messages = f.sink.messages();
    let PatchMessage::FullStatus {
        snapshot_b64,
        legacy_gzip_b64,
        connection_id,
        ..
    } = messages.last().unwrap()
    else {
        panic!("expected full status");
    };
    assert!(connection_id.is_none());

    // Both encodings decode back to the same state
    let msgpack = pw_bus::decode_b64(snapshot_b64).unwrap();
    let state: SessionState = pw_core::snapshot::from_msgpack(&msgpack).unwrap();
    assert_eq!(state.session_id, SessionId::new(10));

    let gzip = pw_bus::decode_b64(legacy_gzip_b64).unwrap();
    let legacy: SessionState = pw_core::snapshot::from_gzip_json(&gzip).unwrap();
    assert_eq!(legacy, state);

    assert_eq!(f.sink.cached_snapshots.lock().len(), cached_before + 1);
}

#[tokio::test]
async fn targeted_snapshot_carries_connection_id() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .snapshot_for_connection("conn-7".to_string())
        .await
        .unwrap();

    let messages = f.sink.messages();
    let PatchMessage::FullStatus { connection_id, .. } = messages.last().unwrap() else {
        panic!("expected full status");
    };
    assert_eq!(connection_id.as_deref(), Some("conn-7"));
}

#[tokio::test]
async fn shutdown_under_checkered_finalizes() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"12:40:00.000\",,Green"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"13:00:00.000\",,Checkered"))
        .await
        .unwrap();

    f.pipeline.shutdown().await.unwrap();
    assert_eq!(f.store.finalized_sessions(), vec![SessionId::new(10)]);

    // Shutdown without checkered does not finalize (fresh fixture)
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline.shutdown().await.unwrap();
    assert!(f.store.finalized.lock().is_empty());
}

#[tokio::test]
async fn flag_changes_are_persisted() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"12:40:00.000\",,Green"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"12:50:00.000\",,Yellow"))
        .await
        .unwrap();

    assert_eq!(
        *f.store.flags.lock(),
        vec![pw_core::Flag::Green, pw_core::Flag::Yellow]
    );
}

#[tokio::test(start_paused = true)]
async fn last_updated_touch_is_debounced() {
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();

    for _ in 0..20 {
        f.pipeline
            .handle(rmon(10, "$G,1,\"42\",5,\"00:10:00.000\""))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    // Trailing edge fires once after the burst
    tokio::time::sleep(Duration::from_millis(1600)).await;

    let touched = f.store.touched.lock().clone();
    assert_eq!(touched.len(), 1);
    assert_eq!(touched[0], SessionId::new(10));
}

#[tokio::test]
async fn clock_is_not_consulted_for_event_time() {
    // The finish countdown runs on parsed event time, so advancing the
    // wall clock alone never finalizes a session.
    let mut f = fixture();
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"12:40:00.000\",,Green"))
        .await
        .unwrap();
    f.pipeline
        .handle(rmon(10, "$F,,,\"13:00:00.000\",,Checkered"))
        .await
        .unwrap();

    f.clock.advance_secs(3600);
    assert!(f.store.finalized.lock().is_empty());
}
