// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame aggregation: apply a decoded record to the session state and
//! derive minimal patches.
//!
//! The aggregator snapshots the state before applying a record and diffs
//! afterwards, so every emitted patch is minimal by construction: a field
//! appears only when its value changed. Car patches are diffed per car;
//! session scalars are diffed as a unit.

mod multiloop;
mod rmonitor;
mod standings;

use chrono::{DateTime, Utc};
use pw_codecs::WireRecord;
use pw_core::{CarPosition, CarPositionPatch, Flag, SessionState, SessionStatePatch};
use std::collections::HashMap;

/// A completed lap to persist to `CarLapLogs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapCompletion {
    pub car_number: String,
    pub lap_number: u32,
    pub lap_time: String,
    pub total_time: String,
}

/// Everything one applied frame produced.
#[derive(Debug, Default)]
pub struct FrameEffects {
    pub session_patch: Option<SessionStatePatch>,
    pub car_patches: Vec<CarPositionPatch>,
    /// An RMonitor `$I` was seen; subscribers must drop car state.
    pub reset: bool,
    pub laps: Vec<LapCompletion>,
    /// The course flag changed to this value.
    pub flag_change: Option<Flag>,
    /// The frame was a Multiloop kind this backend drops.
    pub unsupported: bool,
}

/// Accumulated side effects while a handler mutates the state.
#[derive(Debug, Default)]
pub(crate) struct ApplyContext {
    pub reset: bool,
    pub laps: Vec<LapCompletion>,
    pub flag_change: Option<Flag>,
    pub unsupported: bool,
}

/// Per-session aggregation scratch: RMonitor class table and the
/// registration-number → car-number mapping `$G`/`$H`/`$J` records resolve
/// through.
#[derive(Debug, Default)]
pub struct Aggregator {
    classes: HashMap<u32, String>,
    reg_numbers: HashMap<String, String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop per-session scratch on session change.
    pub fn reset(&mut self) {
        self.classes.clear();
        self.reg_numbers.clear();
    }

    /// Apply one record under the session-state write lock and return the
    /// patches plus side effects. Never fails: unknown records are
    /// no-ops.
    pub fn apply(
        &mut self,
        state: &mut SessionState,
        record: &WireRecord,
        now: DateTime<Utc>,
    ) -> FrameEffects {
        let prev_scalars = state.without_cars();
        let prev_cars = state.car_positions.clone();

        let mut ctx = ApplyContext::default();
        match record {
            WireRecord::RMonitor(record) => rmonitor::apply(self, state, record, now, &mut ctx),
            WireRecord::Multiloop(message) => multiloop::apply(state, message, &mut ctx),
            // Session changes, driver info and resets are pipeline concerns
            _ => {}
        }

        let session_patch = {
            let patch = prev_scalars.diff(&state.without_cars());
            (!patch.is_empty()).then_some(patch)
        };

        let mut car_patches = Vec::new();
        if !ctx.reset {
            for car in &state.car_positions {
                let patch = match prev_cars.iter().find(|c| c.number == car.number) {
                    Some(prev) => prev.diff(car),
                    // Fresh car: diff against a blank record so every
                    // populated field travels
                    None => CarPosition::new(&car.number).diff(car),
                };
                if !patch.is_empty() {
                    car_patches.push(patch);
                }
            }
        }

        FrameEffects {
            session_patch,
            car_patches,
            reset: ctx.reset,
            laps: ctx.laps,
            flag_change: ctx.flag_change,
            unsupported: ctx.unsupported,
        }
    }

    pub(crate) fn class_name(&self, class_number: u32) -> Option<&str> {
        self.classes.get(&class_number).map(String::as_str)
    }

    /// Car number a timing-system registration number maps to; feeds that
    /// put the car number directly in the reg field resolve to themselves.
    pub(crate) fn car_number_for_reg<'a>(&'a self, reg: &'a str) -> &'a str {
        self.reg_numbers.get(reg).map(String::as_str).unwrap_or(reg)
    }
}
