// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiloop sub-message application.

use super::{standings, ApplyContext};
use pw_codecs::multiloop::{CrossingStatus, MultiloopBody, MultiloopMessage};
use pw_core::{Announcement, CompletedSection, SessionState};

pub(crate) fn apply(state: &mut SessionState, message: &MultiloopMessage, ctx: &mut ApplyContext) {
    match &message.body {
        MultiloopBody::Announcement(announcement) => {
            state.announcements.push(Announcement {
                timestamp: announcement.timestamp.clone(),
                priority: announcement.priority,
                text: announcement.text.clone(),
            });
        }

        MultiloopBody::CompletedLap(lap) => {
            if lap.number.is_empty() {
                return;
            }
            let car = state.upsert_car(&lap.number);
            if lap.start_position > 0 {
                car.start_position_overall = lap.start_position as u32;
            }
            car.laps_led_overall = lap.laps_led as u32;
            car.last_lap_pitted = lap.last_lap_pitted as u32;
            car.pit_stop_count = lap.pit_stop_count as u32;
            // Crossing start/finish while still in the lane
            if car.in_pit {
                car.pit_start_finish = true;
            }
            car.set_current_status(&lap.current_status);
            standings::recompute(state);
        }

        MultiloopBody::CompletedSection(section) => {
            if section.number.is_empty() {
                return;
            }
            let car = state.upsert_car(&section.number);
            car.last_loop_name = section.section_id.clone();
            let record = CompletedSection {
                number: section.number.clone(),
                section_id: section.section_id.clone(),
                elapsed_time_ms: section.elapsed_time_ms as u64,
                last_section_time_ms: section.last_section_time_ms as u64,
                last_lap: section.last_lap as u32,
            };
            match car
                .completed_sections
                .iter_mut()
                .find(|s| s.section_id == record.section_id)
            {
                Some(existing) => *existing = record,
                None => car.completed_sections.push(record),
            }
        }

        MultiloopBody::LineCrossing(crossing) => {
            if crossing.number.is_empty() {
                return;
            }
            let car = state.upsert_car(&crossing.number);
            match crossing.crossing {
                CrossingStatus::Pit => {
                    car.pit_entered = true;
                    car.in_pit = true;
                    car.lap_included_pit = true;
                }
                CrossingStatus::Track => {
                    if car.in_pit {
                        car.pit_exited = true;
                    }
                    car.in_pit = false;
                }
            }
        }

        MultiloopBody::FlagInformation(info) => {
            state.green_time_ms = info.green_time_ms as u64;
            state.green_laps = info.green_laps as u32;
            state.yellow_time_ms = info.yellow_time_ms as u64;
            state.yellow_laps = info.yellow_laps as u32;
            state.number_of_yellows = info.number_of_yellows as u32;
            state.red_time_ms = info.red_time_ms as u64;
            state.average_race_speed = info.average_race_speed as f64;
            state.lead_changes = info.lead_changes as u32;
        }

        MultiloopBody::RunInformation(run) => {
            state.session_name = run.run_name.clone();
            state.is_practice_qualifying = run.run_type.is_practice_qualifying();
        }

        MultiloopBody::Unsupported { kind } => {
            tracing::debug!(kind, "dropping unsupported Multiloop kind");
            ctx.unsupported = true;
        }
    }
}
