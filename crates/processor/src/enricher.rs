// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver identity enrichment.
//!
//! Driver-info messages resolve to a car first by `(event, car number)`,
//! then by transponder through the session's own transponder map.
//! Application is idempotent: re-delivering the same assignment emits
//! nothing. The periodic sweep clears drivers that vanished from the
//! cache by patching empty strings, which UIs display as "no driver".

use pw_core::{CarPositionPatch, DriverInfo, SessionState};
use std::collections::HashMap;
use tracing::trace;

/// Apply one driver-info message. Returns the car patch when the assignment
/// actually changed something.
pub fn apply_driver_info(
    state: &mut SessionState,
    info: &DriverInfo,
) -> Option<CarPositionPatch> {
    let number = if !info.car_number.is_empty() {
        info.car_number.clone()
    } else {
        state
            .car_number_for_transponder(info.transponder_id)?
            .to_string()
    };

    let car = match state.car_mut(&number) {
        Some(car) => car,
        None => {
            trace!(car = %number, "driver info for a car not in the session");
            return None;
        }
    };

    if car.driver_id == info.driver_id && car.driver_name == info.driver_name {
        return None;
    }

    car.driver_id = info.driver_id.clone();
    car.driver_name = info.driver_name.clone();

    let mut patch = CarPositionPatch::new(&number);
    patch.driver_id = Some(info.driver_id.clone());
    patch.driver_name = Some(info.driver_name.clone());
    Some(patch)
}

/// Periodic sweep of every current car against the cache.
///
/// A car whose cached assignment differs picks it up (covers cars that
/// entered the session after their driver info was published); a car
/// carrying a driver with no cache entry gets its fields cleared
/// (explicit empty strings on the wire).
pub fn sweep(
    state: &mut SessionState,
    cache: &HashMap<String, DriverInfo>,
) -> Vec<CarPositionPatch> {
    let mut patches = Vec::new();
    for car in &mut state.car_positions {
        let (driver_id, driver_name) = match cache.get(&car.number) {
            Some(info) => (info.driver_id.clone(), info.driver_name.clone()),
            None => (String::new(), String::new()),
        };
        if car.driver_id == driver_id && car.driver_name == driver_name {
            continue;
        }
        car.driver_id = driver_id.clone();
        car.driver_name = driver_name.clone();

        let mut patch = CarPositionPatch::new(&car.number);
        patch.driver_id = Some(driver_id);
        patch.driver_name = Some(driver_name);
        patches.push(patch);
    }
    patches
}

#[cfg(test)]
#[path = "enricher_tests.rs"]
mod tests;
