// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection-liveness records kept on the bus.

use crate::id::{EventId, OrgId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relay heartbeat entry, one per live event, stored in the relay hash.
///
/// Each relay owns its own key; the orchestrator is the only scanner. An
/// entry older than the heartbeat timeout marks its event for shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConnectionEventEntry {
    pub connection_id: String,
    pub event_id: EventId,
    pub org_id: OrgId,
    pub timestamp: DateTime<Utc>,
    pub relay_version: String,
}

/// UI connection record kept in the per-event connection set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConnection {
    pub connected_timestamp: DateTime<Utc>,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed_event_id: Option<EventId>,
}
