// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::multiloop::{CrossingStatus, LineCrossing, MultiloopBody};

#[test]
fn rmonitor_envelope_decodes_to_typed_record() {
    let envelope = StreamEnvelope::RMonitor {
        session_id: 10,
        line: "$F,45,\"00:45:00\",\"13:00:00.000\",\"00:00:00.000\",Green".to_string(),
    };
    assert_eq!(envelope.session_id(), Some(10));

    let record = envelope.decode().unwrap();
    assert!(matches!(
        record,
        WireRecord::RMonitor(RMonitorRecord::Heartbeat(_))
    ));
}

#[test]
fn multiloop_envelope_decodes_to_typed_record() {
    let frame = multiloop::encode_frame(&MultiloopMessage {
        message_number: 1,
        body: MultiloopBody::LineCrossing(LineCrossing {
            number: "42".to_string(),
            crossing: CrossingStatus::Pit,
        }),
    });
    let envelope = StreamEnvelope::Multiloop {
        session_id: 10,
        frame,
    };
    let record = envelope.decode().unwrap();
    assert!(matches!(record, WireRecord::Multiloop(_)));
}

#[test]
fn envelope_serde_round_trips_through_the_bus_encoding() {
    let envelope = StreamEnvelope::SessionChange {
        session_id: 10,
        session_name: "Qual".to_string(),
        local_tz_offset_hours: -7,
    };
    let json = serde_json::to_string(&envelope).unwrap();
    assert!(json.contains("\"session_change\""));
    let back: StreamEnvelope = serde_json::from_str(&json).unwrap();
    assert_eq!(back, envelope);
}

#[test]
fn malformed_rmonitor_line_surfaces_the_line() {
    let envelope = StreamEnvelope::RMonitor {
        session_id: 10,
        line: "not a record".to_string(),
    };
    let err = envelope.decode().unwrap_err();
    let CodecError::InvalidRecord { line } = err else {
        panic!("wrong error kind");
    };
    assert_eq!(line, "not a record");
}

#[test]
fn reset_and_driver_info_pass_through() {
    assert!(matches!(
        StreamEnvelope::Reset.decode().unwrap(),
        WireRecord::Reset
    ));

    let info = pw_core::DriverInfo::default();
    assert!(matches!(
        StreamEnvelope::DriverInfo(info).decode().unwrap(),
        WireRecord::DriverInfo(_)
    ));
}
