// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pw_core::{EventId, SessionId};

fn state() -> SessionState {
    let mut state = SessionState::new(EventId::new(1), SessionId::new(10));
    state.upsert_car("42");
    state.upsert_car("7");
    state
}

#[test]
fn changed_penalties_patch_the_car() {
    let mut state = state();
    let mut snapshot = HashMap::new();
    snapshot.insert("42".to_string(), CarPenalty { warnings: 1, laps: 2 });

    let patches = apply_penalties(&mut state, &snapshot);
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].number, "42");
    assert_eq!(patches[0].penalty_warnings, Some(1));
    assert_eq!(patches[0].penalty_laps, Some(2));

    let car = state.car("42").unwrap();
    assert_eq!(car.penalty_warnings, 1);
    assert_eq!(car.penalty_laps, 2);
}

#[test]
fn unchanged_snapshot_is_silent() {
    let mut state = state();
    let mut snapshot = HashMap::new();
    snapshot.insert("42".to_string(), CarPenalty { warnings: 1, laps: 2 });

    apply_penalties(&mut state, &snapshot);
    assert!(apply_penalties(&mut state, &snapshot).is_empty());
}

#[test]
fn car_removed_from_hash_is_zeroed() {
    let mut state = state();
    let mut snapshot = HashMap::new();
    snapshot.insert("42".to_string(), CarPenalty { warnings: 1, laps: 0 });
    apply_penalties(&mut state, &snapshot);

    let patches = apply_penalties(&mut state, &HashMap::new());
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].penalty_warnings, Some(0));
    assert_eq!(state.car("42").unwrap().penalty_warnings, 0);
}

#[test]
fn cars_not_in_session_are_ignored() {
    let mut state = state();
    let mut snapshot = HashMap::new();
    snapshot.insert("99".to_string(), CarPenalty { warnings: 5, laps: 5 });
    assert!(apply_penalties(&mut state, &snapshot).is_empty());
}
