// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RMonitor record parser.
//!
//! ASCII, CRLF-delimited, comma-separated, each record starting with a type
//! token (`$A` competitor, `$B` race info, `$C` class, `$E` setting, `$F`
//! heartbeat, `$G` race position, `$H` best lap, `$I` reset, `$J` lap
//! complete). Fields may or may not be double-quoted; trackside hardware
//! emits empty numeric fields which parse as zero.

use crate::CodecError;
use pw_core::Flag;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum RMonitorRecord {
    /// `$A`: competitor identity.
    Competitor(Competitor),
    /// `$B`: race/run information.
    RaceInfo(RaceInfo),
    /// `$C`: class descriptor.
    ClassInfo(ClassInfo),
    /// `$E`: track setting key/value.
    Setting(Setting),
    /// `$F`: heartbeat with flag state.
    Heartbeat(Heartbeat),
    /// `$G`: overall race position for one car.
    RacePosition(RacePosition),
    /// `$H`: best lap for one car.
    BestLap(BestLap),
    /// `$I`: authoritative reset: drop all car state for the session.
    Init(Init),
    /// `$J`: lap completion with last and total time.
    LapComplete(LapComplete),
    /// Any other `$…` token; callers log and skip.
    Unknown { record_type: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Competitor {
    pub reg_number: String,
    pub number: String,
    pub transponder_id: u32,
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub class_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceInfo {
    pub unique_number: u32,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassInfo {
    pub class_number: u32,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heartbeat {
    pub laps_to_go: u32,
    pub time_to_go: String,
    pub time_of_day: String,
    pub race_time: String,
    pub flag: Flag,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RacePosition {
    pub position: u32,
    pub reg_number: String,
    pub laps: u32,
    pub total_time: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BestLap {
    pub position: u32,
    pub reg_number: String,
    pub lap_number: u32,
    pub lap_time: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Init {
    pub time_of_day: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapComplete {
    pub reg_number: String,
    pub lap_time: String,
    pub total_time: String,
}

/// Parse one delimiter-stripped RMonitor line into a typed record.
pub fn parse_line(line: &str) -> Result<RMonitorRecord, CodecError> {
    let line = line.trim();
    if !line.starts_with('$') {
        return Err(invalid(line));
    }

    let (record_type, rest) = match line.split_once(',') {
        Some((t, rest)) => (t, rest),
        None => (line, ""),
    };
    let fields = split_fields(rest);

    match record_type {
        "$A" => Ok(RMonitorRecord::Competitor(Competitor {
            reg_number: text(&fields, 0),
            number: text(&fields, 1),
            transponder_id: num(&fields, 2, line)?,
            first_name: text(&fields, 3),
            last_name: text(&fields, 4),
            nationality: text(&fields, 5),
            class_number: num(&fields, 6, line)?,
        })),
        "$B" => Ok(RMonitorRecord::RaceInfo(RaceInfo {
            unique_number: num(&fields, 0, line)?,
            description: text(&fields, 1),
        })),
        "$C" => Ok(RMonitorRecord::ClassInfo(ClassInfo {
            class_number: num(&fields, 0, line)?,
            description: text(&fields, 1),
        })),
        "$E" => Ok(RMonitorRecord::Setting(Setting {
            name: text(&fields, 0),
            value: text(&fields, 1),
        })),
        "$F" => Ok(RMonitorRecord::Heartbeat(Heartbeat {
            laps_to_go: num(&fields, 0, line)?,
            time_to_go: text(&fields, 1),
            time_of_day: text(&fields, 2),
            race_time: text(&fields, 3),
            flag: Flag::from_rmonitor(&text(&fields, 4)),
        })),
        "$G" => Ok(RMonitorRecord::RacePosition(RacePosition {
            position: num(&fields, 0, line)?,
            reg_number: text(&fields, 1),
            laps: num(&fields, 2, line)?,
            total_time: text(&fields, 3),
        })),
        "$H" => Ok(RMonitorRecord::BestLap(BestLap {
            position: num(&fields, 0, line)?,
            reg_number: text(&fields, 1),
            lap_number: num(&fields, 2, line)?,
            lap_time: text(&fields, 3),
        })),
        "$I" => Ok(RMonitorRecord::Init(Init {
            time_of_day: text(&fields, 0),
        })),
        "$J" => Ok(RMonitorRecord::LapComplete(LapComplete {
            reg_number: text(&fields, 0),
            lap_time: text(&fields, 1),
            total_time: text(&fields, 2),
        })),
        _ => Ok(RMonitorRecord::Unknown {
            record_type: record_type.to_string(),
        }),
    }
}

fn invalid(line: &str) -> CodecError {
    CodecError::InvalidRecord {
        line: line.to_string(),
    }
}

/// Split a comma-separated record body, unquoting `"…"` fields.
///
/// RMonitor has no quote escaping; a quote only toggles whether commas are
/// field separators.
fn split_fields(rest: &str) -> Vec<String> {
    if rest.is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in rest.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Field as trimmed text; missing fields are empty.
fn text(fields: &[String], idx: usize) -> String {
    fields.get(idx).map(|f| f.trim().to_string()).unwrap_or_default()
}

/// Numeric field; empty or missing parses as zero, garbage is an error.
fn num<T: FromStr + Default>(fields: &[String], idx: usize, line: &str) -> Result<T, CodecError> {
    let raw = match fields.get(idx) {
        Some(f) => f.trim(),
        None => return Ok(T::default()),
    };
    if raw.is_empty() {
        return Ok(T::default());
    }
    raw.parse().map_err(|_| invalid(line))
}

#[cfg(test)]
#[path = "rmonitor_tests.rs"]
mod tests;
