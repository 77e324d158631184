// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pluggable control-log sources.
//!
//! The actual scrapers for each sanctioning body run elsewhere and expose
//! the normalized entry list over HTTP; this side only knows how to fetch
//! and which source type an org configured.

use async_trait::async_trait;
use pw_core::ControlLogEntry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("control log request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unknown control log type: {0}")]
    UnknownType(String),
}

#[async_trait]
pub trait ControlLogSource: Send + Sync {
    /// Full current entry list, ordered as published.
    async fn fetch(&self) -> Result<Vec<ControlLogEntry>, SourceError>;
}

#[async_trait]
impl ControlLogSource for Box<dyn ControlLogSource> {
    async fn fetch(&self) -> Result<Vec<ControlLogEntry>, SourceError> {
        (**self).fetch().await
    }
}

/// Fetches the normalized JSON entry list a scraper service publishes.
pub struct HttpControlLogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpControlLogSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ControlLogSource for HttpControlLogSource {
    async fn fetch(&self) -> Result<Vec<ControlLogEntry>, SourceError> {
        let entries = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(entries)
    }
}

/// Resolve an org's configured source type to an implementation.
///
/// Every supported type is scraper-backed today, so they all resolve to
/// the HTTP source pointed at the type's endpoint.
pub fn create(
    control_log_type: &str,
    url: &str,
    client: reqwest::Client,
) -> Result<Box<dyn ControlLogSource>, SourceError> {
    match control_log_type {
        "" => Err(SourceError::UnknownType(control_log_type.to_string())),
        _ => Ok(Box::new(HttpControlLogSource::new(client, url))),
    }
}
