// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processor configuration from environment variables.

use crate::PipelineError;
use pw_core::{EventId, OrgId};

/// Runtime configuration. All of it comes from the environment: the
/// orchestrator injects these when it creates the worker job.
#[derive(Debug, Clone)]
pub struct Config {
    pub event_id: EventId,
    pub org_id: OrgId,
    pub database_url: String,
    pub redis_url: String,
    /// URL prefix the deployment serves under; informational for logs.
    pub path_base: String,
    /// Bind address for health/metrics/state endpoints.
    pub health_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            event_id: EventId::new(parse_var("EVENT_ID")?),
            org_id: OrgId::new(parse_var("ORG_ID")?),
            database_url: require("DATABASE_URL")?,
            redis_url: require("REDIS_URL")?,
            path_base: std::env::var("PATH_BASE").unwrap_or_else(|_| "/status".to_string()),
            health_addr: std::env::var("HEALTH_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}

fn require(name: &'static str) -> Result<String, PipelineError> {
    std::env::var(name).map_err(|_| PipelineError::MissingEnv(name))
}

fn parse_var(name: &'static str) -> Result<i64, PipelineError> {
    let value = require(name)?;
    value.parse().map_err(|_| PipelineError::InvalidEnv { name, value })
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
