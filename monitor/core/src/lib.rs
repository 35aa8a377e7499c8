//! Monitor Core - Headless Rendering Engine for the HAL Activity Monitor
//!
//! This crate provides the animated, sequential text rendering engine behind
//! the activity monitor, completely independent of any terminal framework.
//! A surface (the ratatui TUI, or a test harness) draws the shared document
//! model every frame; everything that mutates that model lives here.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Surfaces                                  │
//! │        ┌──────────────┐                ┌─────────────────┐        │
//! │        │  TUI (draws  │                │  Tests (inspect │        │
//! │        │  snapshots)  │                │  slot contents) │        │
//! │        └──────┬───────┘                └────────┬────────┘        │
//! └───────────────┼─────────────────────────────────┼─────────────────┘
//!                 │   LogSurface / BootScreen (shared, read-mostly)
//! ┌───────────────┼─────────────────────────────────┼─────────────────┐
//! │               │          MONITOR CORE           │                 │
//! │  ┌────────────┴───────────┐      ┌──────────────┴──────────────┐  │
//! │  │   LiveLogCoordinator   │      │     BootSequencePlayer      │  │
//! │  │  backfill + live feed  │      │  script + audio + skip      │  │
//! │  └────────────┬───────────┘      └──────────────┬──────────────┘  │
//! │  ┌────────────┴───────────┐                     │                 │
//! │  │     AnimationQueue     │                     │                 │
//! │  │  one job at a time     │                     │                 │
//! │  └────────────┬───────────┘                     │                 │
//! │               └──────────── typewriter ─────────┘                 │
//! │                        pause / CancelToken                        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Overview
//!
//! - [`entry`]: Log entry wire model and display formatting
//! - [`surface`]: Shared output surfaces with typed slot handles
//! - [`animation`]: Cancellable pauses, the typewriter, and the sequential queue
//! - [`feed`]: Backfill and live-stream sources (HTTP + server-sent events)
//! - [`live_log`]: The coordinator that merges backfill and live entries
//! - [`boot`]: The scripted boot sequence player and its skip triggers
//! - [`config`]: TOML/environment configuration
//!
//! # No Terminal Dependencies
//!
//! This crate has **zero** dependencies on ratatui or crossterm.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod boot;
pub mod config;
pub mod entry;
pub mod feed;
pub mod live_log;
pub mod surface;

pub use animation::{
    pause, reveal, reveal_until, AnimationJob, AnimationQueue, AnimationTask, CancelSignal,
    CancelToken, Paused, QueueError, Revealed,
};
pub use boot::{
    boot_script, AudioPlayer, BootConfig, BootSequencePlayer, LineStyle, PlaybackError,
    PlaybackState, ScriptLine, SilentAudio, SkipHandle, SkipTriggers,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, MonitorConfig, MonitorToml,
};
pub use entry::{normalize_identity, LogEntry, ParseError, Timestamp};
pub use feed::{BackfillSource, FeedError, HttpFeed, LiveSource, PushEvent, SseDecoder};
pub use live_log::{Admission, LinkStatus, LiveLogCoordinator, LiveLogError, LogConfig, LogStats};
pub use surface::{BootLine, BootScreen, BootSnapshot, CursorMarker, EntryNode, LogSurface, TextSlot};
