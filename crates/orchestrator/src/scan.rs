// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciliation pass.
//!
//! Desired state comes from the relay heartbeat hash, actual state from
//! the worker driver. One pass: reconcile `Events.is_live`, drain and
//! tear down expired events (pre-shutdown publish, drain wait, then
//! deletion, strictly in that order), garbage-collect orphans, ensure the worker
//! triplet for every live event. Passes are idempotent: re-running on the
//! same heartbeat set creates and deletes nothing.

use crate::driver::{WorkerDriver, WorkerSpec};
use crate::OrchestratorError;
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use pw_bus::Bus;
use pw_core::{Clock, EventId, OrgId, RelayConnectionEventEntry};
use pw_storage::{Db, OrganizationRow};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// Heartbeats older than this mark their event for shutdown.
const HEARTBEAT_TIMEOUT_MINUTES: i64 = 10;

/// Bus- and database-facing operations of a pass.
#[async_trait]
pub trait ScanPorts: Send + Sync {
    async fn heartbeats(&self) -> Result<Vec<RelayConnectionEventEntry>, OrchestratorError>;
    async fn delete_heartbeat(&self, event: EventId) -> Result<(), OrchestratorError>;
    async fn publish_shutdown(&self, events: &[EventId]) -> Result<(), OrchestratorError>;
    async fn set_live_events(&self, events: &[EventId]) -> Result<(), OrchestratorError>;
    async fn organization(&self, org: OrgId) -> Result<Option<OrganizationRow>, OrchestratorError>;
}

/// Production ports over the bus and database.
pub struct BusDbScanPorts {
    bus: Bus,
    db: Db,
}

impl BusDbScanPorts {
    pub fn new(bus: Bus, db: Db) -> Self {
        Self { bus, db }
    }
}

#[async_trait]
impl ScanPorts for BusDbScanPorts {
    async fn heartbeats(&self) -> Result<Vec<RelayConnectionEventEntry>, OrchestratorError> {
        Ok(self.bus.read_relay_heartbeats().await?)
    }

    async fn delete_heartbeat(&self, event: EventId) -> Result<(), OrchestratorError> {
        Ok(self.bus.delete_relay_heartbeat(event).await?)
    }

    async fn publish_shutdown(&self, events: &[EventId]) -> Result<(), OrchestratorError> {
        Ok(self.bus.publish_shutdown_signal(events).await?)
    }

    async fn set_live_events(&self, events: &[EventId]) -> Result<(), OrchestratorError> {
        Ok(self.db.set_live_events(events).await?)
    }

    async fn organization(
        &self,
        org: OrgId,
    ) -> Result<Option<OrganizationRow>, OrchestratorError> {
        Ok(self.db.organization(org).await?)
    }
}

/// Connection material injected into created workers.
#[derive(Debug, Clone)]
pub struct WorkerEnv {
    pub database_url: String,
    pub redis_url: String,
    /// Base URL control-log workers poll; the org's source type and the
    /// event id are appended path segments.
    pub control_log_url_base: String,
}

pub struct Orchestrator<P: ScanPorts, W: WorkerDriver, C: Clock> {
    ports: P,
    driver: W,
    clock: C,
    worker_env: WorkerEnv,
    /// How long processors get to drain after the pre-shutdown publish.
    drain_wait: Duration,
}

impl<P: ScanPorts, W: WorkerDriver, C: Clock> Orchestrator<P, W, C> {
    pub fn new(ports: P, driver: W, clock: C, worker_env: WorkerEnv) -> Self {
        Self {
            ports,
            driver,
            clock,
            worker_env,
            drain_wait: Duration::from_secs(15),
        }
    }

    pub fn with_drain_wait(mut self, drain_wait: Duration) -> Self {
        self.drain_wait = drain_wait;
        self
    }

    /// One reconciliation pass.
    pub async fn pass(&self) -> Result<(), OrchestratorError> {
        let now = self.clock.now();
        let cutoff = now - ChronoDuration::minutes(HEARTBEAT_TIMEOUT_MINUTES);

        let heartbeats = self.ports.heartbeats().await?;
        let (active, expired): (Vec<_>, Vec<_>) = heartbeats
            .into_iter()
            .partition(|hb| hb.timestamp >= cutoff);

        // Liveness reconciliation: heartbeated events live, all else cold
        let active_ids: Vec<EventId> = active.iter().map(|hb| hb.event_id).collect();
        self.ports.set_live_events(&active_ids).await?;

        if !expired.is_empty() {
            self.teardown_expired(&expired).await?;
        }

        self.collect_orphans(&active_ids).await?;

        for heartbeat in &active {
            self.ensure_workers(heartbeat).await?;
        }
        Ok(())
    }

    /// Publish the pre-shutdown signal, give processors the drain window,
    /// then delete heartbeats and workers. Order matters: a processor must
    /// see the signal before its job disappears.
    async fn teardown_expired(
        &self,
        expired: &[RelayConnectionEventEntry],
    ) -> Result<(), OrchestratorError> {
        let events: Vec<EventId> = expired.iter().map(|hb| hb.event_id).collect();
        info!(?events, "heartbeats expired; signaling shutdown");
        self.ports.publish_shutdown(&events).await?;

        tokio::time::sleep(self.drain_wait).await;

        let running = self.driver.running().await?;
        for &event in &events {
            self.ports.delete_heartbeat(event).await?;
            let marker = format!("evt-{event}-");
            for name in running.iter().filter(|name| name.contains(&marker)) {
                info!(name, "deleting worker for expired event");
                self.driver.delete(name).await?;
            }
        }
        Ok(())
    }

    /// Delete workers whose name does not correspond to any live event.
    async fn collect_orphans(&self, active: &[EventId]) -> Result<(), OrchestratorError> {
        let markers: HashSet<String> = active
            .iter()
            .map(|event| format!("evt-{event}-"))
            .collect();

        for name in self.driver.running().await? {
            let owned = markers.iter().any(|marker| name.contains(marker));
            if !owned {
                warn!(name, "garbage-collecting orphaned worker");
                self.driver.delete(&name).await?;
            }
        }
        Ok(())
    }

    /// Ensure the event's worker triplet exists; absence-checked so the
    /// pass is idempotent.
    async fn ensure_workers(
        &self,
        heartbeat: &RelayConnectionEventEntry,
    ) -> Result<(), OrchestratorError> {
        let event = heartbeat.event_id;
        let org = match self.ports.organization(heartbeat.org_id).await? {
            Some(org) => org,
            None => {
                warn!(%event, org = %heartbeat.org_id, "heartbeat for unknown org");
                return Ok(());
            }
        };

        let running: HashSet<String> = self.driver.running().await?.into_iter().collect();
        let base_env = vec![
            ("EVENT_ID".to_string(), event.to_string()),
            ("ORG_ID".to_string(), heartbeat.org_id.to_string()),
            ("DATABASE_URL".to_string(), self.worker_env.database_url.clone()),
            ("REDIS_URL".to_string(), self.worker_env.redis_url.clone()),
        ];

        let mut specs = vec![
            WorkerSpec {
                name: format!("{}-evt-{event}-event-processor", org.short_name),
                binary: "event-processor".to_string(),
                env: base_env.clone(),
                service_port: Some(8080),
            },
            WorkerSpec {
                name: format!("{}-evt-{event}-logger", org.short_name),
                binary: "event-logger".to_string(),
                env: base_env.clone(),
                service_port: None,
            },
        ];

        if let Some(control_log_type) = &org.control_log_type {
            let mut env = base_env;
            env.push(("CONTROL_LOG_TYPE".to_string(), control_log_type.clone()));
            env.push((
                "CONTROL_LOG_URL".to_string(),
                format!(
                    "{}/{}/{}",
                    self.worker_env.control_log_url_base, control_log_type, event
                ),
            ));
            specs.push(WorkerSpec {
                name: format!("{}-evt-{event}-control-log", org.short_name),
                binary: "control-log".to_string(),
                env,
                service_port: None,
            });
        }

        for spec in specs {
            if !running.contains(&spec.name) {
                info!(name = %spec.name, %event, "creating worker");
                self.driver.create(&spec).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
