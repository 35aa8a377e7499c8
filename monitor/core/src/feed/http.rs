//! HTTP Feed
//!
//! Backfill and live stream against the monitor server:
//!
//! - `GET {base}/initial` or `GET {base}/initial/{user}` → JSON array, newest-first
//! - `GET {base}/stream` → `text/event-stream`, one JSON entry per event
//!
//! The stream task reconnects on its own after a drop, up to
//! `reconnect_attempts` times, waiting `reconnect_delay` (or the server's
//! `retry:` value) between attempts. A successful connect resets the count.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::sse::SseDecoder;
use super::{BackfillSource, FeedError, LiveSource, PushEvent};
use crate::entry::LogEntry;

/// Capacity of the subscription channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// HTTP client for the monitor server
#[derive(Clone, Debug)]
pub struct HttpFeed {
    base_url: String,
    client: reqwest::Client,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
}

impl HttpFeed {
    /// Create a feed for `base_url` (e.g. `http://localhost:8080`)
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("hal-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(3),
        })
    }

    /// Set the stream's reconnect policy (0 attempts disables reconnecting)
    #[must_use]
    pub fn with_reconnect(mut self, attempts: u32, delay: Duration) -> Self {
        self.reconnect_attempts = attempts;
        self.reconnect_delay = delay;
        self
    }

    /// URL of the backfill endpoint
    #[must_use]
    pub fn backfill_url(&self, identity: Option<&str>) -> String {
        match identity {
            Some(user) => format!("{}/initial/{}", self.base_url, user.trim_matches('/')),
            None => format!("{}/initial", self.base_url),
        }
    }

    /// URL of the event stream
    #[must_use]
    pub fn stream_url(&self) -> String {
        format!("{}/stream", self.base_url)
    }
}

#[async_trait]
impl BackfillSource for HttpFeed {
    async fn fetch_backfill(&self, identity: Option<&str>) -> Result<Vec<LogEntry>, FeedError> {
        let url = self.backfill_url(identity);
        tracing::debug!(url = %url, "Fetching backfill");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Backfill(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Backfill(format!("{url} returned {status}")));
        }

        let records: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| FeedError::Backfill(e.to_string()))?;

        Ok(decode_records(records))
    }
}

/// Decode backfill records one by one so a single bad record costs only itself
fn decode_records(records: Vec<serde_json::Value>) -> Vec<LogEntry> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed backfill record");
                None
            }
        })
        .collect()
}

#[async_trait]
impl LiveSource for HttpFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<PushEvent>, FeedError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let feed = self.clone();
        tokio::spawn(async move { feed.stream_loop(tx).await });
        Ok(rx)
    }
}

impl HttpFeed {
    async fn stream_loop(self, tx: mpsc::Sender<PushEvent>) {
        let url = self.stream_url();
        let mut decoder = SseDecoder::new();
        let mut failures = 0u32;

        loop {
            decoder.reset();
            let reason = match self.read_stream(&url, &mut decoder, &tx).await {
                StreamEnd::ReceiverGone => return,
                StreamEnd::Dropped { reason, was_connected } => {
                    if was_connected {
                        failures = 0;
                    }
                    reason
                }
            };

            tracing::warn!(url = %url, reason = %reason, "Event stream disconnected");
            if tx.send(PushEvent::Disconnected { reason }).await.is_err() {
                return;
            }

            if failures >= self.reconnect_attempts {
                tracing::warn!(attempts = failures, "Event stream giving up");
                return;
            }
            failures += 1;

            let delay = decoder.retry().unwrap_or(self.reconnect_delay);
            tracing::info!(
                attempt = failures,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting event stream"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn read_stream(
        &self,
        url: &str,
        decoder: &mut SseDecoder,
        tx: &mpsc::Sender<PushEvent>,
    ) -> StreamEnd {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                return StreamEnd::Dropped {
                    reason: format!("{url} returned {}", response.status()),
                    was_connected: false,
                }
            }
            Err(e) => {
                return StreamEnd::Dropped {
                    reason: FeedError::Transport(e.to_string()).to_string(),
                    was_connected: false,
                }
            }
        };

        tracing::info!(url = %url, "Event stream connected");
        if tx.send(PushEvent::Connected).await.is_err() {
            return StreamEnd::ReceiverGone;
        }

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for payload in decoder.feed(&bytes) {
                        if tx.send(PushEvent::Message(payload)).await.is_err() {
                            return StreamEnd::ReceiverGone;
                        }
                    }
                }
                Err(e) => {
                    return StreamEnd::Dropped {
                        reason: FeedError::Transport(e.to_string()).to_string(),
                        was_connected: true,
                    }
                }
            }
        }

        StreamEnd::Dropped {
            reason: "server closed the stream".to_string(),
            was_connected: true,
        }
    }
}

enum StreamEnd {
    ReceiverGone,
    Dropped { reason: String, was_connected: bool },
}
