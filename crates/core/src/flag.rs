// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Track flag state and flag interval records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Course flag as reported by the timing system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    #[default]
    Unknown,
    Green,
    Yellow,
    Red,
    White,
    Checkered,
    Black,
    /// "Code 35" speed-limited caution.
    Purple35,
}

impl Flag {
    /// Parse the flag token of an RMonitor `$F` heartbeat.
    ///
    /// Tokens arrive with inconsistent casing and padding from trackside
    /// hardware; anything unrecognized maps to [`Flag::Unknown`].
    pub fn from_rmonitor(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "green" => Flag::Green,
            "yellow" => Flag::Yellow,
            "red" => Flag::Red,
            "white" => Flag::White,
            "finish" | "checkered" => Flag::Checkered,
            "black" => Flag::Black,
            "purple" | "purple35" | "code 35" => Flag::Purple35,
            _ => Flag::Unknown,
        }
    }

    /// Flags under which cars are still circulating toward a finish.
    ///
    /// A transition from one of these to [`Flag::Checkered`] starts the
    /// session-finishing countdown.
    pub fn is_racing(&self) -> bool {
        matches!(self, Flag::Green | Flag::Yellow | Flag::White | Flag::Purple35)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Flag::Unknown => "Unknown",
            Flag::Green => "Green",
            Flag::Yellow => "Yellow",
            Flag::Red => "Red",
            Flag::White => "White",
            Flag::Checkered => "Checkered",
            Flag::Black => "Black",
            Flag::Purple35 => "Purple35",
        };
        write!(f, "{}", s)
    }
}

/// One interval in a session's ordered flag history.
///
/// The last interval has `ended_at = None` while its flag is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDuration {
    pub flag: Flag,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl FlagDuration {
    pub fn open(flag: Flag, started_at: DateTime<Utc>) -> Self {
        Self {
            flag,
            started_at,
            ended_at: None,
        }
    }
}

#[cfg(test)]
#[path = "flag_tests.rs"]
mod tests;
