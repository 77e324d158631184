// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-car state within a live session.

use crate::flag::Flag;
use serde::{Deserialize, Serialize};

/// Longest `current_status` string carried on the wire.
pub const MAX_STATUS_LEN: usize = 12;

/// Loop-section crossing record for one car.
///
/// Sections arrive from Multiloop as full vectors per frame; patches
/// replace the whole ordered list when any element differs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSection {
    pub number: String,
    pub section_id: String,
    pub elapsed_time_ms: u64,
    pub last_section_time_ms: u64,
    pub last_lap: u32,
}

/// Authoritative per-car state, keyed uniquely by `number` within a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPosition {
    /// Car number as printed on the entry list; unique and stable for the
    /// session's duration.
    pub number: String,
    pub transponder_id: u32,
    pub class_name: String,
    pub best_lap: u32,
    pub best_lap_time: String,
    pub gap_in_class: String,
    pub diff_in_class: String,
    pub gap_overall: String,
    pub diff_overall: String,
    pub total_time: String,
    pub last_lap_time: String,
    pub last_lap_completed: u32,
    pub position_overall: u32,
    pub position_in_class: u32,
    pub start_position_overall: u32,
    pub start_position_in_class: u32,
    pub positions_gained_overall: i32,
    pub positions_gained_in_class: i32,
    pub most_positions_gained_overall: bool,
    pub most_positions_gained_in_class: bool,
    pub penalty_warnings: u32,
    pub penalty_laps: u32,
    pub pit_entered: bool,
    pub pit_start_finish: bool,
    pub pit_exited: bool,
    pub in_pit: bool,
    pub lap_included_pit: bool,
    pub last_loop_name: String,
    pub is_stale: bool,
    pub track_flag: Flag,
    pub driver_id: String,
    pub driver_name: String,
    pub last_lap_pitted: u32,
    pub pit_stop_count: u32,
    pub laps_led_overall: u32,
    pub current_status: String,
    pub completed_sections: Vec<CompletedSection>,
}

impl CarPosition {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Self::default()
        }
    }

    /// Assign `current_status`, truncating to [`MAX_STATUS_LEN`] characters.
    ///
    /// Truncation happens at assignment so patch comparison always sees the
    /// on-wire form.
    pub fn set_current_status(&mut self, status: &str) {
        let status = status.trim();
        self.current_status = match status.char_indices().nth(MAX_STATUS_LEN) {
            Some((idx, _)) => status[..idx].to_string(),
            None => status.to_string(),
        };
    }
}

#[cfg(test)]
#[path = "car_tests.rs"]
mod tests;
