// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::EventId;
use proptest::prelude::*;

fn car(number: &str) -> CarPosition {
    let mut car = CarPosition::new(number);
    car.transponder_id = 7001;
    car.position_overall = 3;
    car.driver_id = "D1".to_string();
    car.driver_name = "A".to_string();
    car
}

#[test]
fn identical_cars_diff_to_empty_patch() {
    let a = car("42");
    let b = a.clone();
    let patch = a.diff(&b);
    assert!(patch.is_empty());
    assert_eq!(patch.number, "42");
}

#[test]
fn diff_carries_only_changed_fields() {
    let a = car("42");
    let mut b = a.clone();
    b.position_overall = 1;
    b.last_lap_completed = 12;

    let patch = a.diff(&b);
    assert_eq!(patch.position_overall, Some(1));
    assert_eq!(patch.last_lap_completed, Some(12));
    assert!(patch.transponder_id.is_none());
    assert!(patch.driver_id.is_none());
}

#[test]
fn apply_roundtrips_diff() {
    let a = car("42");
    let mut b = a.clone();
    b.best_lap = 9;
    b.best_lap_time = "00:01:02.345".to_string();
    b.in_pit = true;

    let patch = a.diff(&b);
    let mut applied = a.clone();
    applied.apply(&patch);
    assert_eq!(applied, b);

    // Idempotent: applying again changes nothing
    applied.apply(&patch);
    assert_eq!(applied, b);
}

#[test]
fn empty_string_clears_driver_fields() {
    let a = car("42");
    let mut b = a.clone();
    b.driver_id = String::new();
    b.driver_name = String::new();

    let patch = a.diff(&b);
    assert_eq!(patch.driver_id, Some(String::new()));
    assert_eq!(patch.driver_name, Some(String::new()));

    let mut applied = a.clone();
    applied.apply(&patch);
    assert!(applied.driver_id.is_empty());
    assert!(applied.driver_name.is_empty());
}

#[test]
fn completed_sections_replace_wholesale() {
    let mut a = car("42");
    a.completed_sections = vec![CompletedSection {
        number: "42".to_string(),
        section_id: "S1".to_string(),
        elapsed_time_ms: 1000,
        last_section_time_ms: 500,
        last_lap: 1,
    }];
    let mut b = a.clone();
    b.completed_sections.push(CompletedSection {
        number: "42".to_string(),
        section_id: "S2".to_string(),
        elapsed_time_ms: 2000,
        last_section_time_ms: 900,
        last_lap: 1,
    });

    let patch = a.diff(&b);
    let sections = patch.completed_sections.as_ref().unwrap();
    assert_eq!(sections.len(), 2);

    // Same sections in both: field absent entirely
    let patch = b.diff(&b.clone());
    assert!(patch.completed_sections.is_none());
}

#[test]
fn absent_fields_do_not_touch_state() {
    let mut state = car("42");
    let patch = CarPositionPatch {
        position_overall: Some(1),
        ..CarPositionPatch::new("42")
    };
    state.apply(&patch);
    assert_eq!(state.position_overall, 1);
    // Untouched fields keep prior values
    assert_eq!(state.transponder_id, 7001);
    assert_eq!(state.driver_id, "D1");
}

#[test]
fn session_patch_skips_serializing_absent_fields() {
    let mut patch = SessionStatePatch::new(SessionId::new(10));
    patch.laps_to_go = Some(20);
    let json = serde_json::to_value(&patch).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj.len(), 2); // sessionId + lapsToGo only
    assert!(obj.contains_key("sessionId"));
    assert!(obj.contains_key("lapsToGo"));
}

#[test]
fn session_diff_and_apply() {
    let prev = SessionState::new(EventId::new(1), SessionId::new(10));
    let mut next = prev.clone();
    next.laps_to_go = 45;
    next.current_flag = Flag::Green;
    next.event_entries.push(EventEntry {
        number: "42".to_string(),
        driver_name: "A. Driver".to_string(),
        team: "Team".to_string(),
        class_name: "GT3".to_string(),
    });

    let patch = prev.diff(&next);
    assert!(!patch.is_empty());
    assert_eq!(patch.laps_to_go, Some(45));
    assert_eq!(patch.current_flag, Some(Flag::Green));
    assert_eq!(patch.event_entries.as_ref().map(Vec::len), Some(1));

    let mut applied = prev.clone();
    applied.apply(&patch);
    // Cars travel separately; everything else must match
    assert_eq!(applied, next);
}

proptest! {
    // diff(S, S') applied to S always yields S', and a second application
    // is a no-op (patch minimality + idempotence).
    #[test]
    fn diff_apply_roundtrip(
        pos in 0u32..100,
        lap in 0u32..500,
        stops in 0u32..20,
        status in "[a-zA-Z ]{0,16}",
        driver in "[a-z]{0,8}",
    ) {
        let base = car("42");
        let mut next = base.clone();
        next.position_overall = pos;
        next.last_lap_completed = lap;
        next.pit_stop_count = stops;
        next.set_current_status(&status);
        next.driver_name = driver;

        let patch = base.diff(&next);
        let mut applied = base.clone();
        applied.apply(&patch);
        prop_assert_eq!(&applied, &next);

        applied.apply(&patch);
        prop_assert_eq!(&applied, &next);

        // Re-diffing after apply yields an empty patch
        prop_assert!(applied.diff(&next).is_empty());
    }
}
