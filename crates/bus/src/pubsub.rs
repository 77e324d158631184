// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pub/sub subscriptions with reconnect.
//!
//! A subscribed Redis connection cannot run other commands, so each
//! subscriber owns a dedicated connection. On connection loss the task
//! backs off exponentially (1 s → 30 s), reconnects and resubscribes every
//! channel; messages published while disconnected are lost, which is fine
//! for this bus; periodic snapshots restore subscriber correctness.

use crate::BusError;
use futures::StreamExt;
use pw_core::Backoff;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub channel: String,
    pub payload: String,
}

/// Factory for channel subscriptions.
pub struct Subscriber {
    client: redis::Client,
}

/// Live subscription; messages arrive on `recv()`. Dropping it tears the
/// connection task down.
pub struct Subscription {
    rx: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }
}

impl Subscriber {
    pub(crate) fn new(client: redis::Client) -> Self {
        Self { client }
    }

    /// Subscribe to a fixed channel set. The spawned task keeps the
    /// subscription alive until the returned handle is dropped.
    pub fn subscribe(self, channels: Vec<String>) -> Subscription {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(run(self.client, channels, tx));
        Subscription { rx }
    }
}

async fn run(client: redis::Client, channels: Vec<String>, tx: mpsc::Sender<BusMessage>) {
    let mut backoff = Backoff::bus();
    loop {
        match connect_and_pump(&client, &channels, &tx).await {
            PumpEnd::ReceiverDropped => return,
            PumpEnd::ConnectionLost(err) => {
                let delay = backoff.next();
                warn!(%err, ?delay, "bus subscription lost; reconnecting");
                tokio::time::sleep(delay).await;
            }
            PumpEnd::Connected => {
                // A full pump session happened before the error; start the
                // backoff ladder over on the next failure.
                backoff.reset();
            }
        }
    }
}

enum PumpEnd {
    ReceiverDropped,
    ConnectionLost(BusError),
    Connected,
}

async fn connect_and_pump(
    client: &redis::Client,
    channels: &[String],
    tx: &mpsc::Sender<BusMessage>,
) -> PumpEnd {
    let mut pubsub = match client.get_async_pubsub().await {
        Ok(pubsub) => pubsub,
        Err(err) => return PumpEnd::ConnectionLost(err.into()),
    };
    for channel in channels {
        if let Err(err) = pubsub.subscribe(channel).await {
            return PumpEnd::ConnectionLost(err.into());
        }
    }
    debug!(?channels, "bus subscription established");

    let mut stream = pubsub.on_message();
    let mut delivered = false;
    while let Some(message) = stream.next().await {
        let channel = message.get_channel_name().to_string();
        let payload: String = match message.get_payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(channel, %err, "undecodable bus message payload");
                continue;
            }
        };
        delivered = true;
        if tx.send(BusMessage { channel, payload }).await.is_err() {
            return PumpEnd::ReceiverDropped;
        }
    }

    // The message stream ended: the connection dropped underneath us.
    if delivered {
        PumpEnd::Connected
    } else {
        PumpEnd::ConnectionLost(BusError::Redis(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "pubsub stream ended",
        ))))
    }
}
