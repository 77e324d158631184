// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn refresh_is_throttled_per_event() {
    let tracker = HeartbeatTracker::new();
    let event = EventId::new(1);

    assert!(tracker.should_refresh(event));
    // Immediately after, the window is still open
    assert!(!tracker.should_refresh(event));
    // Other events refresh independently
    assert!(tracker.should_refresh(EventId::new(2)));
}

#[test]
fn first_sighting_fires_once_per_connection_event() {
    let tracker = HeartbeatTracker::new();
    let event = EventId::new(1);

    assert!(tracker.first_sighting("conn-1", event));
    assert!(!tracker.first_sighting("conn-1", event));
    assert!(tracker.first_sighting("conn-2", event));

    tracker.forget_connection("conn-1");
    assert!(tracker.first_sighting("conn-1", event));
}
