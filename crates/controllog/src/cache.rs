// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local control-log cache and diffing.

use pw_core::{CarControlLogs, CarPenalty, ControlLogEntry};
use std::collections::{BTreeMap, HashSet};

/// What changed between two polls.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CacheChanges {
    /// Cars whose entry list changed (new or updated), in car order.
    pub changed: Vec<CarControlLogs>,
    /// Cars that disappeared from the log entirely.
    pub removed: Vec<String>,
}

impl CacheChanges {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Per-car view of the external log, rebuilt every poll.
#[derive(Debug, Default)]
pub struct ControlLogCache {
    cars: BTreeMap<String, CarControlLogs>,
}

impl ControlLogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fresh pull into the cache, reporting per-car changes.
    /// Entries keep their published order within each car.
    pub fn update(&mut self, entries: Vec<ControlLogEntry>) -> CacheChanges {
        let mut next: BTreeMap<String, CarControlLogs> = BTreeMap::new();
        for entry in entries {
            if entry.car_number.is_empty() {
                continue;
            }
            next.entry(entry.car_number.clone())
                .or_insert_with(|| CarControlLogs {
                    car_number: entry.car_number.clone(),
                    entries: Vec::new(),
                })
                .entries
                .push(entry);
        }

        let mut changes = CacheChanges::default();
        for (car, logs) in &next {
            if self.cars.get(car) != Some(logs) {
                changes.changed.push(logs.clone());
            }
        }

        let current: HashSet<&String> = next.keys().collect();
        for car in self.cars.keys() {
            if !current.contains(car) {
                changes.removed.push(car.clone());
            }
        }

        self.cars = next;
        changes
    }

    /// Full snapshot, car-ordered.
    pub fn all(&self) -> Vec<CarControlLogs> {
        self.cars.values().cloned().collect()
    }

    pub fn car(&self, number: &str) -> Option<&CarControlLogs> {
        self.cars.get(number)
    }

    /// Current penalty totals per car.
    pub fn penalties(&self) -> Vec<(String, CarPenalty)> {
        self.cars
            .iter()
            .map(|(car, logs)| (car.clone(), logs.penalty()))
            .collect()
    }

    pub fn total_entries(&self) -> usize {
        self.cars.values().map(|l| l.entries.len()).sum()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
