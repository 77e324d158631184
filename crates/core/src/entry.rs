// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Competitor entry records from RMonitor `$A`/`$C` data.

use serde::{Deserialize, Serialize};

/// One competitor on the entry list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub number: String,
    pub driver_name: String,
    pub team: String,
    pub class_name: String,
}
