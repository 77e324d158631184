// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timing-system clock field parsing.
//!
//! RMonitor carries `HH:MM:SS.mmm` time-of-day and elapsed fields (elapsed
//! may exceed 24 hours). Parsing is hand-rolled: the fields arrive tens of
//! times per second and the format never varies beyond an optional
//! fractional part.

/// Parse `HH:MM:SS.mmm` (or `HH:MM:SS`) into milliseconds.
///
/// Returns `None` for anything malformed; callers treat that as a field to
/// skip, never an error that stops the pipeline.
pub fn parse_clock_ms(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (hms, frac) = match s.split_once('.') {
        Some((hms, frac)) => (hms, Some(frac)),
        None => (s, None),
    };

    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes > 59 || seconds > 59 {
        return None;
    }

    let millis: u64 = match frac {
        Some(frac) if !frac.is_empty() => {
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Interpret up to three fractional digits as milliseconds
            let digits: String = frac.chars().take(3).collect();
            let value: u64 = digits.parse().ok()?;
            match digits.len() {
                1 => value * 100,
                2 => value * 10,
                _ => value,
            }
        }
        _ => 0,
    };

    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Format milliseconds back into `HH:MM:SS.mmm`.
pub fn format_clock_ms(ms: u64) -> String {
    let millis = ms % 1000;
    let secs = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis
    )
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
