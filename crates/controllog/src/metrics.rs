// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregator counters.

use pw_core::metrics::{Counter, Exposition};

#[derive(Debug, Default)]
pub struct ControlLogMetrics {
    pub requests: Counter,
    pub failures: Counter,
    pub entries_total: Counter,
}

impl ControlLogMetrics {
    pub fn render(&self) -> String {
        Exposition::new()
            .counter(
                "controllog_requests",
                "Polls against the external control-log source",
                self.requests.get(),
            )
            .counter(
                "controllog_failures",
                "Polls that failed",
                self.failures.get(),
            )
            .counter(
                "controllog_entries_total",
                "Entries received across all polls",
                self.entries_total.get(),
            )
            .render()
    }
}
