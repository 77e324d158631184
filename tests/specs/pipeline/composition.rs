//! Snapshot/patch composition: a late subscriber who applies the snapshot
//! and then every patch stamped at or after it converges on the state an
//! always-connected subscriber holds.

use crate::prelude::*;
use pw_bus::{decode_b64, PatchMessage};
use pw_core::{snapshot, SessionState};

/// Replay what a subscriber would do with a message feed.
struct Subscriber {
    state: Option<SessionState>,
}

impl Subscriber {
    fn new() -> Self {
        Self { state: None }
    }

    fn apply(&mut self, message: &PatchMessage) {
        match message {
            PatchMessage::FullStatus { snapshot_b64, .. } => {
                let bytes = decode_b64(snapshot_b64).unwrap();
                self.state = Some(snapshot::from_msgpack(&bytes).unwrap());
            }
            PatchMessage::Session { patch, .. } => {
                if let Some(state) = &mut self.state {
                    state.apply(patch);
                }
            }
            PatchMessage::Cars { patches, .. } => {
                if let Some(state) = &mut self.state {
                    for patch in patches {
                        state.upsert_car(&patch.number);
                        if let Some(car) = state.car_mut(&patch.number) {
                            car.apply(patch);
                        }
                    }
                }
            }
            PatchMessage::Reset { .. } => {
                if let Some(state) = &mut self.state {
                    state.clear_cars();
                }
            }
        }
    }
}

#[tokio::test]
async fn late_subscriber_converges_via_snapshot_plus_patches() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();

    // Early traffic
    for line in [
        "$A,\"42\",\"42\",52474,\"A\",\"Driver\",\"USA\",1",
        "$A,\"7\",\"7\",52001,\"B\",\"Pilot\",\"USA\",1",
        "$F,45,\"00:45:00\",\"13:00:00.000\",\"00:00:00.000\",Green",
        "$G,1,\"42\",5,\"00:10:00.000\"",
        "$G,2,\"7\",5,\"00:10:04.000\"",
    ] {
        f.pipeline.handle(rmon(10, line)).await.unwrap();
    }

    // The late subscriber joins here: a snapshot is published for it
    f.pipeline.snapshot_tick().await.unwrap();
    let snapshot_index = f.sink.messages().len() - 1;
    let snapshot_stamp = match &f.sink.messages()[snapshot_index] {
        PatchMessage::FullStatus { published_at_ms, .. } => *published_at_ms,
        _ => panic!("expected full status"),
    };

    // Traffic keeps flowing after the snapshot
    f.clock.advance_secs(1);
    for line in [
        "$F,44,\"00:44:00\",\"13:01:00.000\",\"00:01:00.000\",Green",
        "$J,\"42\",\"00:02:00.000\",\"00:12:00.000\"",
        "$G,1,\"42\",6,\"00:12:00.000\"",
        "$H,1,\"42\",6,\"00:01:58.000\"",
    ] {
        f.pipeline.handle(rmon(10, line)).await.unwrap();
    }

    // Late subscriber: snapshot first, then patches stamped >= snapshot
    let mut late = Subscriber::new();
    let messages = f.sink.messages();
    late.apply(&messages[snapshot_index]);
    for message in &messages[snapshot_index + 1..] {
        let stamp = match message {
            PatchMessage::Session { published_at_ms, .. }
            | PatchMessage::Cars { published_at_ms, .. }
            | PatchMessage::Reset { published_at_ms }
            | PatchMessage::FullStatus { published_at_ms, .. } => *published_at_ms,
        };
        if stamp >= snapshot_stamp {
            late.apply(message);
        }
    }

    // Always-connected subscriber: every message from the beginning,
    // bootstrapped by the snapshot published on session adoption
    let mut always = Subscriber::new();
    for message in &messages {
        always.apply(message);
    }

    let late_state = late.state.unwrap();
    let authoritative = f.pipeline.state().snapshot();
    assert_eq!(late_state, authoritative);
    assert_eq!(always.state.unwrap(), authoritative);
}

#[tokio::test]
async fn patches_applied_twice_are_idempotent() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline.snapshot_tick().await.unwrap();

    for line in [
        "$A,\"42\",\"42\",52474,\"A\",\"Driver\",\"USA\",1",
        "$G,1,\"42\",5,\"00:10:00.000\"",
    ] {
        f.pipeline.handle(rmon(10, line)).await.unwrap();
    }

    let messages = f.sink.messages();
    let mut subscriber = Subscriber::new();
    for message in &messages {
        subscriber.apply(message);
    }
    let once = subscriber.state.clone().unwrap();

    // Replay every patch a second time (at-least-once delivery)
    for message in &messages {
        if !matches!(message, PatchMessage::FullStatus { .. }) {
            subscriber.apply(message);
        }
    }
    assert_eq!(subscriber.state.unwrap(), once);
}
