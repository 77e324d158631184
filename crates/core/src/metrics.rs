// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide counters with Prometheus text exposition.
//!
//! Deliberately tiny: atomic counters and a hand-rolled exposition
//! renderer, no registry crate.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Prometheus text-format builder.
#[derive(Debug, Default)]
pub struct Exposition {
    out: String,
}

impl Exposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(mut self, name: &str, help: &str, value: u64) -> Self {
        self.out.push_str(&format!("# HELP {name} {help}\n"));
        self.out.push_str(&format!("# TYPE {name} counter\n"));
        self.out.push_str(&format!("{name} {value}\n"));
        self
    }

    pub fn gauge(mut self, name: &str, help: &str, value: u64) -> Self {
        self.out.push_str(&format!("# HELP {name} {help}\n"));
        self.out.push_str(&format!("# TYPE {name} gauge\n"));
        self.out.push_str(&format!("{name} {value}\n"));
        self
    }

    pub fn render(self) -> String {
        self.out
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
