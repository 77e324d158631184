// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derived standings: in-class positions, gaps and positions-gained.
//!
//! The timing system only reports overall positions and total times;
//! everything here is computed. Runs after any record that moves a car.

use pw_core::{parse_clock_ms, SessionState};

pub(crate) fn recompute(state: &mut SessionState) {
    assign_class_positions(state);
    assign_positions_gained(state);
    assign_gaps(state);
}

/// Rank cars within each class by overall position; first assignment also
/// seeds the in-class starting position.
fn assign_class_positions(state: &mut SessionState) {
    let mut order: Vec<usize> = (0..state.car_positions.len())
        .filter(|&i| state.car_positions[i].position_overall > 0)
        .collect();
    order.sort_by_key(|&i| state.car_positions[i].position_overall);

    let mut per_class: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    for i in order {
        let class = state.car_positions[i].class_name.clone();
        let rank = per_class.entry(class).or_insert(0);
        *rank += 1;
        let car = &mut state.car_positions[i];
        car.position_in_class = *rank;
        if car.start_position_in_class == 0 {
            car.start_position_in_class = *rank;
        }
    }
}

fn assign_positions_gained(state: &mut SessionState) {
    for car in &mut state.car_positions {
        if car.start_position_overall > 0 && car.position_overall > 0 {
            car.positions_gained_overall =
                car.start_position_overall as i32 - car.position_overall as i32;
        }
        if car.start_position_in_class > 0 && car.position_in_class > 0 {
            car.positions_gained_in_class =
                car.start_position_in_class as i32 - car.position_in_class as i32;
        }
    }

    let best_overall = state
        .car_positions
        .iter()
        .map(|c| c.positions_gained_overall)
        .max()
        .unwrap_or(0);
    for car in &mut state.car_positions {
        car.most_positions_gained_overall =
            best_overall > 0 && car.positions_gained_overall == best_overall;
    }

    let mut best_in_class: std::collections::HashMap<String, i32> =
        std::collections::HashMap::new();
    for car in &state.car_positions {
        let best = best_in_class.entry(car.class_name.clone()).or_insert(i32::MIN);
        *best = (*best).max(car.positions_gained_in_class);
    }
    for car in &mut state.car_positions {
        let best = best_in_class.get(&car.class_name).copied().unwrap_or(0);
        car.most_positions_gained_in_class = best > 0 && car.positions_gained_in_class == best;
    }
}

/// Gap (to the leader) and diff (to the car ahead), overall and in class.
/// Cars on the same lap get a time delta, lapped cars a lap count.
fn assign_gaps(state: &mut SessionState) {
    let mut order: Vec<usize> = (0..state.car_positions.len())
        .filter(|&i| state.car_positions[i].position_overall > 0)
        .collect();
    order.sort_by_key(|&i| state.car_positions[i].position_overall);

    // Overall
    for (rank, &i) in order.iter().enumerate() {
        if rank == 0 {
            state.car_positions[i].gap_overall = String::new();
            state.car_positions[i].diff_overall = String::new();
            continue;
        }
        let leader = &state.car_positions[order[0]];
        let ahead = &state.car_positions[order[rank - 1]];
        let car = &state.car_positions[i];
        let gap = separation(leader, car);
        let diff = separation(ahead, car);
        let car = &mut state.car_positions[i];
        car.gap_overall = gap;
        car.diff_overall = diff;
    }

    // In class: same walk, restricted per class
    let mut seen_leader: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();
    let mut prev_in_class: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();
    for &i in &order {
        let class = state.car_positions[i].class_name.clone();
        match seen_leader.get(&class) {
            None => {
                seen_leader.insert(class.clone(), i);
                prev_in_class.insert(class, i);
                let car = &mut state.car_positions[i];
                car.gap_in_class = String::new();
                car.diff_in_class = String::new();
            }
            Some(&leader_idx) => {
                let ahead_idx = prev_in_class.get(&class).copied().unwrap_or(leader_idx);
                let gap = separation(&state.car_positions[leader_idx], &state.car_positions[i]);
                let diff = separation(&state.car_positions[ahead_idx], &state.car_positions[i]);
                prev_in_class.insert(class, i);
                let car = &mut state.car_positions[i];
                car.gap_in_class = gap;
                car.diff_in_class = diff;
            }
        }
    }
}

fn separation(ahead: &pw_core::CarPosition, behind: &pw_core::CarPosition) -> String {
    if ahead.last_lap_completed > behind.last_lap_completed {
        let laps = ahead.last_lap_completed - behind.last_lap_completed;
        return if laps == 1 {
            "1 lap".to_string()
        } else {
            format!("{laps} laps")
        };
    }
    match (
        parse_clock_ms(&ahead.total_time),
        parse_clock_ms(&behind.total_time),
    ) {
        (Some(a), Some(b)) if b >= a => format_gap_ms(b - a),
        _ => String::new(),
    }
}

/// Race gaps read as seconds under a minute, `M:SS.mmm` beyond.
fn format_gap_ms(ms: u64) -> String {
    let secs = ms / 1000;
    let millis = ms % 1000;
    if secs < 60 {
        format!("{}.{:03}", secs, millis)
    } else {
        format!("{}:{:02}.{:03}", secs / 60, secs % 60, millis)
    }
}
