// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::driver::DriverError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pw_core::FakeClock;
use std::collections::HashMap;
use std::sync::Arc;

/// Records every side effect in arrival order so tests can assert the
/// publish → drain → delete ordering.
#[derive(Clone, Default)]
struct Recorder {
    ops: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn push(&self, op: impl Into<String>) {
        self.ops.lock().push(op.into());
    }

    fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }
}

#[derive(Clone, Default)]
struct FakePorts {
    recorder: Recorder,
    heartbeats: Arc<Mutex<Vec<RelayConnectionEventEntry>>>,
    orgs: Arc<Mutex<HashMap<i64, OrganizationRow>>>,
    live_sets: Arc<Mutex<Vec<Vec<EventId>>>>,
}

#[async_trait]
impl ScanPorts for FakePorts {
    async fn heartbeats(&self) -> Result<Vec<RelayConnectionEventEntry>, OrchestratorError> {
        Ok(self.heartbeats.lock().clone())
    }

    async fn delete_heartbeat(&self, event: EventId) -> Result<(), OrchestratorError> {
        self.recorder.push(format!("delete-heartbeat:{event}"));
        self.heartbeats.lock().retain(|hb| hb.event_id != event);
        Ok(())
    }

    async fn publish_shutdown(&self, events: &[EventId]) -> Result<(), OrchestratorError> {
        let ids: Vec<String> = events.iter().map(|e| e.to_string()).collect();
        self.recorder.push(format!("publish-shutdown:[{}]", ids.join(",")));
        Ok(())
    }

    async fn set_live_events(&self, events: &[EventId]) -> Result<(), OrchestratorError> {
        self.live_sets.lock().push(events.to_vec());
        Ok(())
    }

    async fn organization(
        &self,
        org: OrgId,
    ) -> Result<Option<OrganizationRow>, OrchestratorError> {
        Ok(self.orgs.lock().get(&org.value()).cloned())
    }
}

#[derive(Clone, Default)]
struct FakeDriver {
    recorder: Recorder,
    workers: Arc<Mutex<Vec<String>>>,
    specs: Arc<Mutex<Vec<WorkerSpec>>>,
}

#[async_trait]
impl WorkerDriver for FakeDriver {
    async fn running(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.workers.lock().clone())
    }

    async fn create(&self, spec: &WorkerSpec) -> Result<(), DriverError> {
        self.recorder.push(format!("create:{}", spec.name));
        self.workers.lock().push(spec.name.clone());
        self.specs.lock().push(spec.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), DriverError> {
        self.recorder.push(format!("delete:{name}"));
        self.workers.lock().retain(|w| w != name);
        Ok(())
    }
}

struct Fixture {
    orchestrator: Orchestrator<FakePorts, FakeDriver, FakeClock>,
    ports: FakePorts,
    driver: FakeDriver,
    clock: FakeClock,
    recorder: Recorder,
}

fn fixture() -> Fixture {
    let recorder = Recorder::default();
    let ports = FakePorts {
        recorder: recorder.clone(),
        ..FakePorts::default()
    };
    let driver = FakeDriver {
        recorder: recorder.clone(),
        ..FakeDriver::default()
    };
    let clock = FakeClock::new();
    let orchestrator = Orchestrator::new(
        ports.clone(),
        driver.clone(),
        clock.clone(),
        WorkerEnv {
            database_url: "postgres://db/pitwall".to_string(),
            redis_url: "redis://bus".to_string(),
            control_log_url_base: "https://controllog.example".to_string(),
        },
    );
    Fixture {
        orchestrator,
        ports,
        driver,
        clock,
        recorder,
    }
}

fn heartbeat(event: i64, org: i64, at: DateTime<Utc>) -> RelayConnectionEventEntry {
    RelayConnectionEventEntry {
        connection_id: format!("conn-{event}"),
        event_id: EventId::new(event),
        org_id: OrgId::new(org),
        timestamp: at,
        relay_version: "2.4.1".to_string(),
    }
}

fn org(id: i64, short: &str, control_log: Option<&str>) -> OrganizationRow {
    OrganizationRow {
        id,
        short_name: short.to_string(),
        control_log_type: control_log.map(str::to_string),
    }
}

#[tokio::test]
async fn active_heartbeat_creates_the_worker_triplet() {
    let f = fixture();
    f.ports.orgs.lock().insert(5, org(5, "acme", Some("wrl")));
    f.ports
        .heartbeats
        .lock()
        .push(heartbeat(100, 5, f.clock.now()));

    f.orchestrator.pass().await.unwrap();

    let workers = f.driver.workers.lock().clone();
    assert_eq!(
        workers,
        vec![
            "acme-evt-100-event-processor".to_string(),
            "acme-evt-100-logger".to_string(),
            "acme-evt-100-control-log".to_string(),
        ]
    );
    assert_eq!(f.ports.live_sets.lock().last().unwrap(), &vec![EventId::new(100)]);
}

#[tokio::test]
async fn org_without_control_log_gets_two_workers() {
    let f = fixture();
    f.ports.orgs.lock().insert(5, org(5, "acme", None));
    f.ports
        .heartbeats
        .lock()
        .push(heartbeat(100, 5, f.clock.now()));

    f.orchestrator.pass().await.unwrap();
    assert_eq!(f.driver.workers.lock().len(), 2);
}

#[tokio::test]
async fn back_to_back_passes_are_idempotent() {
    let f = fixture();
    f.ports.orgs.lock().insert(5, org(5, "acme", Some("wrl")));
    f.ports
        .heartbeats
        .lock()
        .push(heartbeat(100, 5, f.clock.now()));

    f.orchestrator.pass().await.unwrap();
    let after_first = f.recorder.ops();

    f.orchestrator.pass().await.unwrap();
    let after_second = f.recorder.ops();

    // Second pass added no creates and no deletes
    let new_ops: Vec<_> = after_second[after_first.len()..]
        .iter()
        .filter(|op| op.starts_with("create:") || op.starts_with("delete:"))
        .collect();
    assert!(new_ops.is_empty(), "unexpected ops: {new_ops:?}");
    assert_eq!(f.driver.workers.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn expired_heartbeat_signals_waits_then_deletes() {
    let f = fixture();
    f.ports.orgs.lock().insert(5, org(5, "acme", None));
    // Workers exist from an earlier life
    f.driver
        .workers
        .lock()
        .extend(["acme-evt-100-event-processor".to_string(), "acme-evt-100-logger".to_string()]);
    // Heartbeat is 11 minutes old
    let stale = f.clock.now() - chrono::Duration::minutes(11);
    f.ports.heartbeats.lock().push(heartbeat(100, 5, stale));

    let started = tokio::time::Instant::now();
    f.orchestrator.pass().await.unwrap();

    // The drain window elapsed between publish and deletion
    assert!(started.elapsed() >= std::time::Duration::from_secs(15));

    let ops = f.recorder.ops();
    let publish = ops.iter().position(|op| op == "publish-shutdown:[100]").unwrap();
    let heartbeat_delete = ops
        .iter()
        .position(|op| op == "delete-heartbeat:100")
        .unwrap();
    let worker_delete = ops
        .iter()
        .position(|op| op == "delete:acme-evt-100-event-processor")
        .unwrap();
    assert!(publish < heartbeat_delete);
    assert!(publish < worker_delete);
    assert!(f.driver.workers.lock().is_empty());
    // The event dropped out of the live set
    assert!(f.ports.live_sets.lock().last().unwrap().is_empty());
}

#[tokio::test]
async fn orphaned_workers_are_collected() {
    let f = fixture();
    f.ports.orgs.lock().insert(5, org(5, "acme", None));
    f.ports
        .heartbeats
        .lock()
        .push(heartbeat(100, 5, f.clock.now()));
    f.driver
        .workers
        .lock()
        .push("acme-evt-999-event-processor".to_string());

    f.orchestrator.pass().await.unwrap();

    let workers = f.driver.workers.lock().clone();
    assert!(!workers.iter().any(|w| w.contains("evt-999")));
    assert!(workers.iter().any(|w| w.contains("evt-100")));
}

#[tokio::test]
async fn control_log_worker_env_carries_source_coordinates() {
    let f = fixture();
    f.ports.orgs.lock().insert(5, org(5, "acme", Some("wrl")));
    f.ports
        .heartbeats
        .lock()
        .push(heartbeat(100, 5, f.clock.now()));

    f.orchestrator.pass().await.unwrap();

    let specs = f.driver.specs.lock().clone();
    let control_log = specs
        .iter()
        .find(|s| s.name == "acme-evt-100-control-log")
        .unwrap();
    assert_eq!(control_log.binary, "control-log");
    let env: HashMap<_, _> = control_log.env.iter().cloned().collect();
    assert_eq!(env.get("CONTROL_LOG_TYPE").map(String::as_str), Some("wrl"));
    assert_eq!(
        env.get("CONTROL_LOG_URL").map(String::as_str),
        Some("https://controllog.example/wrl/100")
    );
    assert_eq!(env.get("EVENT_ID").map(String::as_str), Some("100"));

    // The processor spec carries the paired service port
    let processor = specs
        .iter()
        .find(|s| s.name == "acme-evt-100-event-processor")
        .unwrap();
    assert_eq!(processor.service_port, Some(8080));
}

#[tokio::test]
async fn unknown_org_heartbeat_is_skipped() {
    let f = fixture();
    f.ports
        .heartbeats
        .lock()
        .push(heartbeat(100, 77, f.clock.now()));

    f.orchestrator.pass().await.unwrap();
    assert!(f.driver.workers.lock().is_empty());
}
