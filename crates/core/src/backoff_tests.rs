// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn doubles_to_cap() {
    let mut backoff = Backoff::bus();
    let delays: Vec<u64> = (0..7).map(|_| backoff.next().as_secs()).collect();
    assert_eq!(delays, [1, 2, 4, 8, 16, 30, 30]);
}

#[test]
fn reset_starts_over() {
    let mut backoff = Backoff::bus();
    backoff.next();
    backoff.next();
    backoff.reset();
    assert_eq!(backoff.next(), Duration::from_secs(1));
}
