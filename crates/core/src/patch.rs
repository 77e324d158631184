// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Patch records and the diff/apply algebra.
//!
//! A patch is its entity with every field optional: absence means "no
//! change", `Some("")` clears a string field. `diff` emits only fields whose
//! value differs, so applying a patch to an up-to-date state is a no-op and
//! applying the same patch twice is idempotent.
//!
//! List-valued fields (flag history, entries, announcements, completed
//! sections) are compared positionally and replace wholesale when any
//! element differs.

use crate::announcement::Announcement;
use crate::car::{CarPosition, CompletedSection};
use crate::entry::EventEntry;
use crate::flag::{Flag, FlagDuration};
use crate::id::SessionId;
use crate::session_state::SessionState;
use serde::{Deserialize, Serialize};

/// Generate `diff`/`apply` on the entity and `is_empty` on the patch from a
/// single field list, so the three stay in lockstep.
macro_rules! patch_impl {
    ($entity:ident, $patch:ident, key: $key:ident, fields: [ $($f:ident),* $(,)? ]) => {
        impl $entity {
            /// Compute the patch that turns `self` into `next`.
            ///
            /// Only fields whose value differs are present; check
            /// `is_empty` on the result before emitting.
            pub fn diff(&self, next: &Self) -> $patch {
                let mut patch = $patch::new(next.$key.clone());
                $(
                    if self.$f != next.$f {
                        patch.$f = Some(next.$f.clone());
                    }
                )*
                patch
            }

            /// Assign every present field of `patch`; absent fields keep
            /// their existing value.
            pub fn apply(&mut self, patch: &$patch) {
                $(
                    if let Some(v) = &patch.$f {
                        self.$f = v.clone();
                    }
                )*
            }
        }

        impl $patch {
            pub fn is_empty(&self) -> bool {
                true $(&& self.$f.is_none())*
            }
        }
    };
}

/// Delta for one car, keyed by `number`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPositionPatch {
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transponder_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_lap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_lap_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_in_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_in_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_overall: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_overall: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lap_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lap_completed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_overall: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_in_class: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position_overall: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position_in_class: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions_gained_overall: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions_gained_in_class: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_positions_gained_overall: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_positions_gained_in_class: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_warnings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_laps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pit_entered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pit_start_finish: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pit_exited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_pit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lap_included_pit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_loop_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_stale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_flag: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lap_pitted: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pit_stop_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps_led_overall: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_sections: Option<Vec<CompletedSection>>,
}

impl CarPositionPatch {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Self::default()
        }
    }
}

patch_impl!(CarPosition, CarPositionPatch, key: number, fields: [
    transponder_id,
    class_name,
    best_lap,
    best_lap_time,
    gap_in_class,
    diff_in_class,
    gap_overall,
    diff_overall,
    total_time,
    last_lap_time,
    last_lap_completed,
    position_overall,
    position_in_class,
    start_position_overall,
    start_position_in_class,
    positions_gained_overall,
    positions_gained_in_class,
    most_positions_gained_overall,
    most_positions_gained_in_class,
    penalty_warnings,
    penalty_laps,
    pit_entered,
    pit_start_finish,
    pit_exited,
    in_pit,
    lap_included_pit,
    last_loop_name,
    is_stale,
    track_flag,
    driver_id,
    driver_name,
    last_lap_pitted,
    pit_stop_count,
    laps_led_overall,
    current_status,
    completed_sections,
]);

/// Delta for session-level state, keyed by `session_id`.
///
/// Car state travels separately as [`CarPositionPatch`] batches; everything
/// else a `SessionState` holds is patchable here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatePatch {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_practice_qualifying: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_flag: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_durations: Option<Vec<FlagDuration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps_to_go: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_go: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_race_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_laps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yellow_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yellow_laps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_yellows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_race_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_changes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_entries: Option<Vec<EventEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcements: Option<Vec<Announcement>>,
}

impl SessionStatePatch {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }
}

patch_impl!(SessionState, SessionStatePatch, key: session_id, fields: [
    session_name,
    is_live,
    is_practice_qualifying,
    current_flag,
    flag_durations,
    laps_to_go,
    time_to_go,
    running_race_time,
    local_time_of_day,
    green_time_ms,
    green_laps,
    yellow_time_ms,
    yellow_laps,
    number_of_yellows,
    red_time_ms,
    average_race_speed,
    lead_changes,
    event_entries,
    announcements,
]);

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
