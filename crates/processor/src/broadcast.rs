// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound patch publishing.
//!
//! The pipeline talks to subscribers through this seam: production routes
//! everything over the event's bus patch channel (the hub forwards to its
//! WebSocket groups), tests record messages in memory.

use crate::PipelineError;
use async_trait::async_trait;
use pw_bus::{Bus, PatchMessage};
use pw_core::{keys, EventId};

#[async_trait]
pub trait PatchSink: Send + Sync {
    async fn publish(&self, message: &PatchMessage) -> Result<(), PipelineError>;

    /// Persist the latest full snapshot (MessagePack bytes) to the shared
    /// cache so new subscribers and admin endpoints can bootstrap.
    async fn cache_snapshot(&self, bytes: &[u8]) -> Result<(), PipelineError>;
}

/// Production sink: pub/sub channel + snapshot cache key for one event.
pub struct BusPatchSink {
    bus: Bus,
    channel: String,
    snapshot_key: String,
}

impl BusPatchSink {
    pub fn new(bus: Bus, event: EventId) -> Self {
        Self {
            bus,
            channel: keys::event_patches(event),
            snapshot_key: keys::event_snapshot(event),
        }
    }
}

#[async_trait]
impl PatchSink for BusPatchSink {
    async fn publish(&self, message: &PatchMessage) -> Result<(), PipelineError> {
        self.bus.publish_json(&self.channel, message).await?;
        Ok(())
    }

    async fn cache_snapshot(&self, bytes: &[u8]) -> Result<(), PipelineError> {
        self.bus.set_bytes(&self.snapshot_key, bytes).await?;
        Ok(())
    }
}
