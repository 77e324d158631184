// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver identity records published by the external identification system.

use crate::id::EventId;
use serde::{Deserialize, Serialize};

/// Car-to-driver assignment for one event.
///
/// `car_number` may be empty when the upstream system only knows the
/// transponder; the enricher then resolves the number through the owning
/// session's transponder map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub event_id: EventId,
    pub car_number: String,
    pub transponder_id: u32,
    pub driver_id: String,
    pub driver_name: String,
}
