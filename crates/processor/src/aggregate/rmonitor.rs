// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RMonitor record application.

use super::{standings, Aggregator, ApplyContext, LapCompletion};
use chrono::{DateTime, Utc};
use pw_codecs::rmonitor::RMonitorRecord;
use pw_core::{EventEntry, SessionState};

pub(crate) fn apply(
    aggregator: &mut Aggregator,
    state: &mut SessionState,
    record: &RMonitorRecord,
    now: DateTime<Utc>,
    ctx: &mut ApplyContext,
) {
    match record {
        RMonitorRecord::Competitor(competitor) => {
            let number = if competitor.number.is_empty() {
                competitor.reg_number.clone()
            } else {
                competitor.number.clone()
            };
            if number.is_empty() {
                return;
            }
            aggregator
                .reg_numbers
                .insert(competitor.reg_number.clone(), number.clone());

            let class_name = aggregator
                .class_name(competitor.class_number)
                .unwrap_or_default()
                .to_string();

            let car = state.upsert_car(&number);
            if competitor.transponder_id > 0 {
                car.transponder_id = competitor.transponder_id;
            }
            if !class_name.is_empty() {
                car.class_name = class_name.clone();
            }

            let driver_name =
                format!("{} {}", competitor.first_name, competitor.last_name).trim().to_string();
            upsert_entry(state, &number, &driver_name, &class_name);
        }

        RMonitorRecord::RaceInfo(info) => {
            state.session_name = info.description.clone();
        }

        RMonitorRecord::ClassInfo(class) => {
            aggregator
                .classes
                .insert(class.class_number, class.description.clone());
        }

        // Track settings carry nothing the session state models
        RMonitorRecord::Setting(_) => {}

        RMonitorRecord::Heartbeat(heartbeat) => {
            state.laps_to_go = heartbeat.laps_to_go;
            state.time_to_go = heartbeat.time_to_go.clone();
            state.local_time_of_day = heartbeat.time_of_day.clone();
            state.running_race_time = heartbeat.race_time.clone();
            if state.current_flag != heartbeat.flag {
                ctx.flag_change = Some(heartbeat.flag);
            }
            state.set_flag(heartbeat.flag, now);
        }

        RMonitorRecord::RacePosition(position) => {
            let number = aggregator.car_number_for_reg(&position.reg_number).to_string();
            if number.is_empty() {
                return;
            }
            let car = state.upsert_car(&number);
            car.position_overall = position.position;
            car.last_lap_completed = position.laps;
            car.total_time = position.total_time.clone();
            if car.start_position_overall == 0 && position.position > 0 {
                car.start_position_overall = position.position;
            }
            standings::recompute(state);
        }

        RMonitorRecord::BestLap(best) => {
            let number = aggregator.car_number_for_reg(&best.reg_number).to_string();
            if number.is_empty() {
                return;
            }
            let car = state.upsert_car(&number);
            car.best_lap = best.lap_number;
            car.best_lap_time = best.lap_time.clone();
        }

        RMonitorRecord::Init(_) => {
            state.clear_cars();
            aggregator.reg_numbers.clear();
            ctx.reset = true;
        }

        RMonitorRecord::LapComplete(lap) => {
            let number = aggregator.car_number_for_reg(&lap.reg_number).to_string();
            if number.is_empty() {
                return;
            }
            let car = state.upsert_car(&number);
            car.last_lap_time = lap.lap_time.clone();
            car.total_time = lap.total_time.clone();
            car.last_lap_completed += 1;
            if car.in_pit {
                car.lap_included_pit = true;
            }
            ctx.laps.push(LapCompletion {
                car_number: number,
                lap_number: car.last_lap_completed,
                lap_time: lap.lap_time.clone(),
                total_time: lap.total_time.clone(),
            });
            standings::recompute(state);
        }

        RMonitorRecord::Unknown { record_type } => {
            tracing::debug!(record_type, "skipping unknown RMonitor record type");
        }
    }
}

fn upsert_entry(state: &mut SessionState, number: &str, driver_name: &str, class_name: &str) {
    if let Some(entry) = state.event_entries.iter_mut().find(|e| e.number == number) {
        entry.driver_name = driver_name.to_string();
        if !class_name.is_empty() {
            entry.class_name = class_name.to_string();
        }
    } else {
        state.event_entries.push(EventEntry {
            number: number.to_string(),
            driver_name: driver_name.to_string(),
            team: String::new(),
            class_name: class_name.to_string(),
        });
    }
}
