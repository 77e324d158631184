// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Externally sourced control-log incidents and the per-car penalty summary.

use serde::{Deserialize, Serialize};

/// One incident line from the sanctioning body's control log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlLogEntry {
    pub timestamp: String,
    pub order_id: u32,
    pub car_number: String,
    /// Second car involved, empty when the incident is single-car.
    pub other_car_number: String,
    pub status: String,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_warnings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_laps: Option<u32>,
}

/// Ordered incident list for one car.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarControlLogs {
    pub car_number: String,
    pub entries: Vec<ControlLogEntry>,
}

/// Summary of a car's accumulated penalties, stored in the per-event
/// penalties hash and patched onto the car when it changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPenalty {
    pub warnings: u32,
    pub laps: u32,
}

impl CarControlLogs {
    /// Sum the penalties carried by this car's entries.
    pub fn penalty(&self) -> CarPenalty {
        let mut total = CarPenalty::default();
        for entry in &self.entries {
            total.warnings += entry.penalty_warnings.unwrap_or(0);
            total.laps += entry.penalty_laps.unwrap_or(0);
        }
        total
    }
}

#[cfg(test)]
#[path = "control_log_tests.rs"]
mod tests;
