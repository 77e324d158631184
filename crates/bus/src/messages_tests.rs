// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pw_core::SessionId;

#[test]
fn patch_message_round_trips() {
    let message = PatchMessage::Session {
        patch: SessionStatePatch {
            laps_to_go: Some(12),
            ..SessionStatePatch::new(SessionId::new(10))
        },
        published_at_ms: 1_700_000_000_000,
    };
    let json = serde_json::to_string(&message).unwrap();
    assert!(json.contains("\"session\""));
    let back: PatchMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, message);
}

#[test]
fn full_status_base64_round_trips() {
    let bytes = vec![0x00, 0x01, 0xfe, 0xff];
    let encoded = encode_b64(&bytes);
    assert_eq!(decode_b64(&encoded).unwrap(), bytes);
    assert!(decode_b64("not base64!!!").is_none());
}

#[test]
fn snapshot_request_shape() {
    let request = SnapshotRequest {
        event_id: EventId::new(1),
        connection_id: "conn-9".to_string(),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["eventId"], 1);
    assert_eq!(json["connectionId"], "conn-9");
}
