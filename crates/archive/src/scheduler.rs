// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daily schedule: sleep to the next midnight in a fixed zone, run,
//! retry.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

/// Attempts per daily run.
pub const DAILY_ATTEMPTS: u32 = 3;

/// Spacing between same-day retries.
pub const RETRY_SPACING: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Back-off after an unexpected top-level failure.
pub const FAILURE_HOLDOFF: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// The next local midnight strictly after `now`, as a UTC instant.
///
/// On DST transition days where local midnight does not exist (or exists
/// twice), the earliest valid interpretation wins.
pub fn next_midnight(tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    let local_today = now.with_timezone(&tz).date_naive();
    let mut candidate = local_today;
    loop {
        candidate = candidate + Duration::days(1);
        let midnight = candidate.and_hms_opt(0, 0, 0).unwrap_or_default();
        if let Some(instant) = tz.from_local_datetime(&midnight).earliest() {
            let utc = instant.with_timezone(&Utc);
            if utc > now {
                return utc;
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
