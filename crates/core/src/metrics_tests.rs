// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn counter_accumulates() {
    let counter = Counter::new();
    counter.incr();
    counter.incr();
    counter.add(3);
    assert_eq!(counter.get(), 5);
}

#[test]
fn exposition_renders_prometheus_text() {
    let text = Exposition::new()
        .counter("decode_failures_total", "Frames that failed to decode", 2)
        .gauge("stream_cursor_age_ms", "Age of the stream cursor", 40)
        .render();

    assert!(text.contains("# TYPE decode_failures_total counter\n"));
    assert!(text.contains("decode_failures_total 2\n"));
    assert!(text.contains("# TYPE stream_cursor_age_ms gauge\n"));
    assert!(text.contains("stream_cursor_age_ms 40\n"));
}
