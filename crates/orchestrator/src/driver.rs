// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker job lifecycle.
//!
//! The orchestrator only speaks [`WorkerDriver`]; the process driver below
//! runs workers as local child processes for single-node deployments and
//! tests. The Kubernetes job/service surface of the cluster deployment is
//! a collaborator implementing the same trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to spawn worker {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown worker binary for {0}")]
    UnknownBinary(String),
}

/// What to run. Names are globally unique per event
/// (`{org-short}-evt-{event}-{role}`), which is what expiry teardown and
/// orphan GC match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    pub name: String,
    /// Binary role: `event-processor`, `event-logger` or `control-log`.
    pub binary: String,
    pub env: Vec<(String, String)>,
    /// The processor worker gets a paired service on this port.
    pub service_port: Option<u16>,
}

#[async_trait]
pub trait WorkerDriver: Send + Sync {
    /// Names of currently running workers.
    async fn running(&self) -> Result<Vec<String>, DriverError>;

    /// Create a worker (and its paired service if the spec asks for one).
    /// Callers check for absence first; creation is idempotent.
    async fn create(&self, spec: &WorkerSpec) -> Result<(), DriverError>;

    /// Tear down a worker and its paired service.
    async fn delete(&self, name: &str) -> Result<(), DriverError>;
}

/// Local-process driver.
pub struct ProcessDriver {
    bin_dir: PathBuf,
    children: Mutex<HashMap<String, Child>>,
}

impl ProcessDriver {
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Drop children that exited on their own.
    fn reap(&self) {
        let mut children = self.children.lock();
        children.retain(|name, child| match child.try_wait() {
            Ok(Some(status)) => {
                info!(name, %status, "worker exited");
                false
            }
            Ok(None) => true,
            Err(err) => {
                warn!(name, %err, "worker wait failed; dropping");
                false
            }
        });
    }
}

#[async_trait]
impl WorkerDriver for ProcessDriver {
    async fn running(&self) -> Result<Vec<String>, DriverError> {
        self.reap();
        Ok(self.children.lock().keys().cloned().collect())
    }

    async fn create(&self, spec: &WorkerSpec) -> Result<(), DriverError> {
        if self.children.lock().contains_key(&spec.name) {
            return Ok(());
        }

        let mut command = Command::new(self.bin_dir.join(&spec.binary));
        command.stdin(Stdio::null()).kill_on_drop(true);
        for (key, value) in &spec.env {
            command.env(key, value);
        }
        if let Some(port) = spec.service_port {
            command.env("HEALTH_ADDR", format!("0.0.0.0:{port}"));
        }

        let child = command.spawn().map_err(|source| DriverError::Spawn {
            name: spec.name.clone(),
            source,
        })?;
        info!(name = %spec.name, binary = %spec.binary, "worker started");
        self.children.lock().insert(spec.name.clone(), child);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), DriverError> {
        let child = self.children.lock().remove(name);
        if let Some(mut child) = child {
            if let Err(err) = child.start_kill() {
                warn!(name, %err, "worker kill failed");
            }
            let _ = child.wait().await;
            info!(name, "worker deleted");
        }
        Ok(())
    }
}
