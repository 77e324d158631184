// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::announcement::Announcement;
use crate::car::CarPosition;
use crate::control_log::{CarControlLogs, ControlLogEntry};
use crate::driver::DriverInfo;
use crate::entry::EventEntry;
use crate::flag::Flag;
use crate::id::{EventId, SessionId};
use crate::session_state::SessionState;

/// A populated session state: two cars, an entry list, a green flag.
pub fn sample_state() -> SessionState {
    let mut state = SessionState::new(EventId::new(1), SessionId::new(10));
    state.session_name = "Feature Race".to_string();
    state.is_live = true;
    state.laps_to_go = 45;
    state.time_to_go = "00:45:00".to_string();
    state.local_time_of_day = "13:00:00.000".to_string();
    state.current_flag = Flag::Green;

    state.event_entries.push(EventEntry {
        number: "42".to_string(),
        driver_name: "A. Driver".to_string(),
        team: "Apex Racing".to_string(),
        class_name: "GT3".to_string(),
    });

    let car = state.upsert_car("42");
    car.transponder_id = 7001;
    car.class_name = "GT3".to_string();
    car.position_overall = 1;
    car.position_in_class = 1;

    let car = state.upsert_car("7");
    car.transponder_id = 7002;
    car.class_name = "GT3".to_string();
    car.position_overall = 2;
    car.position_in_class = 2;

    state.announcements.push(Announcement {
        timestamp: "12:58:00".to_string(),
        priority: 1,
        text: "Track is live".to_string(),
    });

    state
}

pub fn sample_car(number: &str) -> CarPosition {
    let mut car = CarPosition::new(number);
    car.transponder_id = 7000;
    car.class_name = "GT3".to_string();
    car
}

pub fn driver_info(event: i64, car: &str, driver_id: &str, driver_name: &str) -> DriverInfo {
    DriverInfo {
        event_id: EventId::new(event),
        car_number: car.to_string(),
        transponder_id: 0,
        driver_id: driver_id.to_string(),
        driver_name: driver_name.to_string(),
    }
}

pub fn control_log_entry(car: &str, warnings: Option<u32>, laps: Option<u32>) -> ControlLogEntry {
    ControlLogEntry {
        timestamp: "13:05:00".to_string(),
        order_id: 1,
        car_number: car.to_string(),
        other_car_number: String::new(),
        status: "Reviewed".to_string(),
        note: "Contact turn 3".to_string(),
        penalty_warnings: warnings,
        penalty_laps: laps,
    }
}

pub fn car_logs(car: &str, entries: Vec<ControlLogEntry>) -> CarControlLogs {
    CarControlLogs {
        car_number: car.to_string(),
        entries,
    }
}
