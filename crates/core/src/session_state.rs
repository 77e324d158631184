// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authoritative in-memory snapshot of one live session.
//!
//! A `SessionState` is exclusively owned by the processor worker for its
//! event. It is replaced atomically on session change; the prior instance
//! is retained only long enough to write its final result row.

use crate::announcement::Announcement;
use crate::car::CarPosition;
use crate::entry::EventEntry;
use crate::flag::{Flag, FlagDuration};
use crate::id::{EventId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub session_name: String,
    pub is_live: bool,
    pub is_practice_qualifying: bool,
    pub current_flag: Flag,
    /// Ordered flag intervals; strictly monotonic by `started_at`, the last
    /// entry stays open (`ended_at = None`) while its flag is current.
    pub flag_durations: Vec<FlagDuration>,
    pub laps_to_go: u32,
    pub time_to_go: String,
    pub running_race_time: String,
    pub local_time_of_day: String,
    pub green_time_ms: u64,
    pub green_laps: u32,
    pub yellow_time_ms: u64,
    pub yellow_laps: u32,
    pub number_of_yellows: u32,
    pub red_time_ms: u64,
    pub average_race_speed: f64,
    pub lead_changes: u32,
    pub event_entries: Vec<EventEntry>,
    pub car_positions: Vec<CarPosition>,
    pub announcements: Vec<Announcement>,
}

impl SessionState {
    pub fn new(event_id: EventId, session_id: SessionId) -> Self {
        Self {
            event_id,
            session_id,
            session_name: String::new(),
            is_live: false,
            is_practice_qualifying: false,
            current_flag: Flag::Unknown,
            flag_durations: Vec::new(),
            laps_to_go: 0,
            time_to_go: String::new(),
            running_race_time: String::new(),
            local_time_of_day: String::new(),
            green_time_ms: 0,
            green_laps: 0,
            yellow_time_ms: 0,
            yellow_laps: 0,
            number_of_yellows: 0,
            red_time_ms: 0,
            average_race_speed: 0.0,
            lead_changes: 0,
            event_entries: Vec::new(),
            car_positions: Vec::new(),
            announcements: Vec::new(),
        }
    }

    /// Look up a car by number.
    pub fn car(&self, number: &str) -> Option<&CarPosition> {
        self.car_positions.iter().find(|c| c.number == number)
    }

    /// Mutable lookup by number.
    pub fn car_mut(&mut self, number: &str) -> Option<&mut CarPosition> {
        self.car_positions.iter_mut().find(|c| c.number == number)
    }

    /// Fetch the car with this number, inserting a fresh record at the tail
    /// if it is not present. Numbers stay unique within the session.
    pub fn upsert_car(&mut self, number: &str) -> &mut CarPosition {
        if let Some(idx) = self.car_positions.iter().position(|c| c.number == number) {
            &mut self.car_positions[idx]
        } else {
            self.car_positions.push(CarPosition::new(number));
            let last = self.car_positions.len() - 1;
            &mut self.car_positions[last]
        }
    }

    /// Resolve a transponder id back to its car number.
    pub fn car_number_for_transponder(&self, transponder_id: u32) -> Option<&str> {
        if transponder_id == 0 {
            return None;
        }
        self.car_positions
            .iter()
            .find(|c| c.transponder_id == transponder_id)
            .map(|c| c.number.as_str())
    }

    /// Drop all car state for the session (RMonitor `$I` reset).
    pub fn clear_cars(&mut self) {
        self.car_positions.clear();
    }

    /// Clone the session-level fields with an empty car list.
    ///
    /// The aggregator diffs session scalars against this before and after
    /// applying a record; cars are diffed individually, so cloning them
    /// per frame would be wasted work.
    pub fn without_cars(&self) -> SessionState {
        SessionState {
            event_id: self.event_id,
            session_id: self.session_id,
            session_name: self.session_name.clone(),
            is_live: self.is_live,
            is_practice_qualifying: self.is_practice_qualifying,
            current_flag: self.current_flag,
            flag_durations: self.flag_durations.clone(),
            laps_to_go: self.laps_to_go,
            time_to_go: self.time_to_go.clone(),
            running_race_time: self.running_race_time.clone(),
            local_time_of_day: self.local_time_of_day.clone(),
            green_time_ms: self.green_time_ms,
            green_laps: self.green_laps,
            yellow_time_ms: self.yellow_time_ms,
            yellow_laps: self.yellow_laps,
            number_of_yellows: self.number_of_yellows,
            red_time_ms: self.red_time_ms,
            average_race_speed: self.average_race_speed,
            lead_changes: self.lead_changes,
            event_entries: self.event_entries.clone(),
            car_positions: Vec::new(),
            announcements: self.announcements.clone(),
        }
    }

    /// Record a flag change, closing the open interval and opening a new one.
    ///
    /// Re-reporting the current flag is a no-op so repeated `$F` heartbeats
    /// do not fragment the history.
    pub fn set_flag(&mut self, flag: Flag, at: DateTime<Utc>) {
        if self.current_flag == flag && !self.flag_durations.is_empty() {
            return;
        }
        if let Some(open) = self.flag_durations.last_mut() {
            if open.ended_at.is_none() {
                open.ended_at = Some(at);
            }
        }
        self.flag_durations.push(FlagDuration::open(flag, at));
        self.current_flag = flag;
    }
}

#[cfg(test)]
#[path = "session_state_tests.rs"]
mod tests;
