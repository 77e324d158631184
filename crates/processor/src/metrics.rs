// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processor counters and the liveness stamp the health endpoint reads.

use pw_core::metrics::{Counter, Exposition};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    pub frames_total: Counter,
    pub decode_failures: Counter,
    pub unsupported_multiloop: Counter,
    pub patches_published: Counter,
    pub snapshots_published: Counter,
    pub lap_log_failures: Counter,
    pub bus_reconnects: Counter,
    /// Epoch millis of the last pipeline loop pass; `/healthz/live` fails
    /// when this stops moving.
    last_loop_ms: AtomicU64,
}

impl ProcessorMetrics {
    pub fn mark_loop(&self, now_ms: u64) {
        self.last_loop_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn last_loop_ms(&self) -> u64 {
        self.last_loop_ms.load(Ordering::Relaxed)
    }

    pub fn render(&self) -> String {
        Exposition::new()
            .counter(
                "frames_total",
                "Stream entries consumed by the pipeline",
                self.frames_total.get(),
            )
            .counter(
                "decode_failures_total",
                "Frames dropped because they failed to decode",
                self.decode_failures.get(),
            )
            .counter(
                "multiloop_unsupported_total",
                "Multiloop sub-messages of kinds this backend drops",
                self.unsupported_multiloop.get(),
            )
            .counter(
                "patches_published_total",
                "Patch messages published to the push channel",
                self.patches_published.get(),
            )
            .counter(
                "snapshots_published_total",
                "Full snapshots published",
                self.snapshots_published.get(),
            )
            .counter(
                "lap_log_failures_total",
                "Lap rows dropped after exhausting retries",
                self.lap_log_failures.get(),
            )
            .counter(
                "bus_reconnects_total",
                "Bus stream reconnect attempts",
                self.bus_reconnects.get(),
            )
            .gauge(
                "pipeline_last_loop_ms",
                "Epoch millis of the last pipeline pass",
                self.last_loop_ms(),
            )
            .render()
    }
}
