// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_is_stable_until_advanced() {
    let clock = FakeClock::new();
    let a = clock.now();
    let b = clock.now();
    assert_eq!(a, b);
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance_secs(60);
    assert_eq!(clock.now() - start, Duration::seconds(60));
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance_secs(5);
    assert_eq!(clock.now(), other.now());
}
