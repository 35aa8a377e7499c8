//! Entry Feeds
//!
//! Where entries come from. Two seams, both trait objects so tests and other
//! transports can stand in for the HTTP server:
//!
//! - [`BackfillSource`]: one-shot historical load, newest-first
//! - [`LiveSource`]: a push stream delivering one raw JSON payload per event
//!
//! [`HttpFeed`] implements both against the monitor server
//! (`/initial[/{user}]` and the `/stream` event stream).

mod http;
mod sse;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::entry::LogEntry;

pub use http::HttpFeed;
pub use sse::{SseDecoder, MAX_EVENT_BYTES};

/// Feed failures. None of these are fatal to rendering.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The initial load failed (connect, status, or body)
    #[error("Backfill request failed: {0}")]
    Backfill(String),

    /// The push stream could not be opened or broke
    #[error("Event stream transport failed: {0}")]
    Transport(String),
}

/// Events delivered by a [`LiveSource`] subscription
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushEvent {
    /// The transport is connected (sent on every successful (re)connect)
    Connected,
    /// One event payload, expected to be a JSON entry record
    Message(String),
    /// The transport dropped; more events follow only if it reconnects
    Disconnected {
        /// Why the connection ended
        reason: String,
    },
}

/// One-shot historical load
#[async_trait]
pub trait BackfillSource: Send + Sync {
    /// Fetch entries newest-first, optionally scoped to one identity
    async fn fetch_backfill(&self, identity: Option<&str>) -> Result<Vec<LogEntry>, FeedError>;
}

/// Continuous push stream
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Open the stream. Events arrive in emission order; the channel closes
    /// when the transport gives up.
    async fn subscribe(&self) -> Result<mpsc::Receiver<PushEvent>, FeedError>;
}
