// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure notification seam.
//!
//! Mail transport is a collaborator; the in-repo implementation posts the
//! report to a configured webhook, and deployments without one fall back
//! to error logs.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

#[async_trait]
pub trait FailureMailer: Send + Sync {
    /// Best-effort: a failed send is logged, never propagated.
    async fn send(&self, subject: &str, body: &str);
}

#[async_trait]
impl<M: FailureMailer + ?Sized> FailureMailer for Arc<M> {
    async fn send(&self, subject: &str, body: &str) {
        (**self).send(subject, body).await;
    }
}

/// Posts `{subject, body}` JSON to a webhook.
pub struct WebhookMailer {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct Report<'a> {
    subject: &'a str,
    body: &'a str,
}

impl WebhookMailer {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FailureMailer for WebhookMailer {
    async fn send(&self, subject: &str, body: &str) {
        let result = self
            .client
            .post(&self.url)
            .json(&Report { subject, body })
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(err) = result {
            warn!(%err, subject, "failure mail delivery failed");
        }
    }
}

/// Fallback when no webhook is configured.
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl FailureMailer for LogMailer {
    async fn send(&self, subject: &str, body: &str) {
        error!(subject, body, "archive failure (no mail webhook configured)");
    }
}
