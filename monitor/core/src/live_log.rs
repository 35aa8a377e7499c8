//! Live Log Coordinator
//!
//! Merges the one-shot backfill with the live push stream into a single,
//! order-correct log:
//!
//! ```text
//!  top ┌──────────────────────┐
//!      │ newest live entry    │  ◄── each live entry is prepended when its
//!      │ ...                  │      animation job starts
//!      │ newest backfill (tn) │
//!      │ ...                  │  ◄── backfill, shown complete, no typewriter
//!      │ oldest backfill (t1) │
//!  bot └──────────────────────┘
//! ```
//!
//! Live entries go through the [`AnimationQueue`], so at most one entry is
//! ever being revealed. The stream is subscribed before the backfill is
//! fetched; events that arrive meanwhile wait in the subscription channel and
//! are applied after the backfill is on screen.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::animation::{AnimationJob, AnimationQueue, AnimationTask, QueueError};
use crate::entry::{normalize_identity, LogEntry, ParseError};
use crate::feed::{BackfillSource, LiveSource, PushEvent};
use crate::surface::{EntryNode, LogSurface};

/// Why a live payload was not shown
#[derive(Debug, Error)]
pub enum LiveLogError {
    /// The payload was not an entry record
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The animation worker is gone
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Reveal speeds and display options for the log
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Show only this user's entries (normalized on use)
    pub identity: Option<String>,
    /// Show `[NAME]` lines (always off while an identity is selected)
    pub show_usernames: bool,
    /// Per-character delay for the timestamp line
    pub timestamp_speed: Duration,
    /// Per-character delay for the username line
    pub username_speed: Duration,
    /// Per-character delay for the message line
    pub message_speed: Duration,
    /// Per-character delay for the tags line
    pub tags_speed: Duration,
    /// How long the trailing cursor stays after an entry finishes
    pub cursor_grace: Duration,
    /// Pause between consecutive live entries
    pub entry_pause: Duration,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            identity: None,
            show_usernames: true,
            timestamp_speed: Duration::from_millis(35),
            username_speed: Duration::from_millis(25),
            message_speed: Duration::from_millis(75),
            tags_speed: Duration::from_millis(35),
            cursor_grace: Duration::from_millis(1500),
            entry_pause: Duration::ZERO,
        }
    }
}

impl LogConfig {
    /// Whether username lines are drawn
    #[must_use]
    pub fn displays_usernames(&self) -> bool {
        self.show_usernames && self.identity.is_none()
    }
}

/// What happened to a live entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Queued for animated display
    Scheduled,
    /// Dropped by the identity filter
    Filtered,
}

/// State of the live link, for status displays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    /// Not started yet
    Idle,
    /// Subscribed, waiting for the transport
    Connecting,
    /// Transport connected
    Live,
    /// Transport dropped; it may reconnect on its own
    Disconnected,
    /// The stream ended for good
    Closed,
}

/// Counters for what the coordinator has done
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Entries shown from the backfill
    pub backfilled: usize,
    /// Live entries queued for display
    pub scheduled: usize,
    /// Live entries dropped by the identity filter
    pub filtered: usize,
    /// Live payloads that failed to parse
    pub malformed: usize,
}

#[derive(Debug, Default)]
struct Counters {
    backfilled: AtomicUsize,
    scheduled: AtomicUsize,
    filtered: AtomicUsize,
    malformed: AtomicUsize,
}

/// Merges backfill and live entries onto a [`LogSurface`]
pub struct LiveLogCoordinator {
    config: LogConfig,
    identity: Option<String>,
    surface: LogSurface,
    queue: AnimationQueue,
    status: watch::Sender<LinkStatus>,
    counters: Counters,
}

impl LiveLogCoordinator {
    /// Create a coordinator drawing onto `surface`
    ///
    /// Spawns the animation worker, so this must run inside a tokio runtime.
    #[must_use]
    pub fn new(config: LogConfig, surface: LogSurface) -> Self {
        let identity = config.identity.as_deref().and_then(normalize_identity);
        let (status, _) = watch::channel(LinkStatus::Idle);
        Self {
            config,
            identity,
            surface,
            queue: AnimationQueue::spawn(),
            status,
            counters: Counters::default(),
        }
    }

    /// The surface entries are drawn onto
    #[must_use]
    pub fn surface(&self) -> &LogSurface {
        &self.surface
    }

    /// The animation queue live entries go through
    #[must_use]
    pub fn queue(&self) -> &AnimationQueue {
        &self.queue
    }

    /// The identity filter in effect, normalized
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Watch the live link state
    #[must_use]
    pub fn status(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> LogStats {
        LogStats {
            backfilled: self.counters.backfilled.load(Ordering::Relaxed),
            scheduled: self.counters.scheduled.load(Ordering::Relaxed),
            filtered: self.counters.filtered.load(Ordering::Relaxed),
            malformed: self.counters.malformed.load(Ordering::Relaxed),
        }
    }

    /// Subscribe to the live stream, show the backfill, then apply live
    /// entries until the stream closes.
    pub async fn run(&self, backfill: &dyn BackfillSource, live: &dyn LiveSource) {
        self.status.send_replace(LinkStatus::Connecting);
        let subscription = live.subscribe().await;

        self.load_backfill(backfill).await;

        match subscription {
            Ok(rx) => self.consume(rx).await,
            Err(e) => {
                tracing::warn!(error = %e, "Live stream unavailable");
                self.status.send_replace(LinkStatus::Closed);
            }
        }
    }

    /// Fetch and show the backfill. A failed fetch leaves the log empty.
    ///
    /// Returns the number of entries shown.
    pub async fn load_backfill(&self, source: &dyn BackfillSource) -> usize {
        match source.fetch_backfill(self.identity()).await {
            Ok(entries) => {
                let shown = self.show_backfill(entries);
                tracing::info!(entries = shown, identity = ?self.identity, "Backfill loaded");
                shown
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backfill failed, starting with an empty log");
                0
            }
        }
    }

    /// Show newest-first `entries` as complete text, newest at the top of the
    /// backfill block and the oldest at the bottom.
    pub fn show_backfill(&self, entries: Vec<LogEntry>) -> usize {
        let show_username = self.config.displays_usernames();
        let block_top = self.surface.len();
        let mut shown = 0;

        // Chronological order, each above the one before it
        for entry in entries.into_iter().rev() {
            self.surface
                .insert(block_top, EntryNode::complete(&entry, show_username));
            shown += 1;
        }

        self.counters.backfilled.fetch_add(shown, Ordering::Relaxed);
        shown
    }

    /// Apply live events until the channel closes
    pub async fn consume(&self, mut events: mpsc::Receiver<PushEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                PushEvent::Connected => {
                    self.status.send_replace(LinkStatus::Live);
                }
                PushEvent::Message(payload) => match self.accept_payload(&payload) {
                    Ok(Admission::Scheduled) => {
                        tracing::debug!(queued = self.queue.pending(), "Live entry scheduled");
                    }
                    Ok(Admission::Filtered) => {
                        tracing::trace!("Live entry filtered");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, bytes = payload.len(), "Dropping live payload");
                    }
                },
                PushEvent::Disconnected { reason } => {
                    tracing::warn!(reason = %reason, "Live stream disconnected");
                    self.status.send_replace(LinkStatus::Disconnected);
                }
            }
        }

        tracing::info!("Live stream ended");
        self.status.send_replace(LinkStatus::Closed);
    }

    /// Parse one live payload and schedule it
    ///
    /// # Errors
    ///
    /// Returns [`LiveLogError::Parse`] for malformed payloads (nothing is
    /// queued) or [`LiveLogError::Queue`] if the worker is gone.
    pub fn accept_payload(&self, payload: &str) -> Result<Admission, LiveLogError> {
        let entry = LogEntry::parse(payload).inspect_err(|_| {
            self.counters.malformed.fetch_add(1, Ordering::Relaxed);
        })?;
        Ok(self.accept_entry(&entry)?)
    }

    /// Filter one live entry and schedule it
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the animation worker is gone.
    pub fn accept_entry(&self, entry: &LogEntry) -> Result<Admission, QueueError> {
        if let Some(identity) = &self.identity {
            if !entry.matches_identity(identity) {
                self.counters.filtered.fetch_add(1, Ordering::Relaxed);
                return Ok(Admission::Filtered);
            }
        }

        self.queue.enqueue(self.entry_job(entry))?;
        self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        Ok(Admission::Scheduled)
    }

    /// Build the reveal job for one entry: timestamp, username, message with a
    /// trailing cursor, tags. The node goes on top of the log when the job
    /// starts.
    fn entry_job(&self, entry: &LogEntry) -> AnimationJob {
        let config = &self.config;
        let node = EntryNode::skeleton(entry, config.displays_usernames());

        let surface = self.surface.clone();
        let attached = node.clone();
        let mut job = AnimationJob::new()
            .on_start(move || surface.prepend(attached))
            .reveal(AnimationTask::new(
                node.timestamp.clone(),
                entry.timestamp_text(),
                config.timestamp_speed,
            ));

        if let (Some(slot), Some(text)) = (&node.username, entry.username_text()) {
            job = job.reveal(AnimationTask::new(slot.clone(), text, config.username_speed));
        }

        job = job.cursor(node.cursor.clone()).reveal(AnimationTask::new(
            node.message.clone(),
            entry.message(),
            config.message_speed,
        ));

        if let (Some(slot), Some(text)) = (&node.tags, entry.tags_text()) {
            job = job.reveal(AnimationTask::new(slot.clone(), text, config.tags_speed));
        }

        job.cursor_grace(config.cursor_grace)
            .pause_after(config.entry_pause)
    }
}
