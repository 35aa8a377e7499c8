//! HAL Monitor TUI - Terminal interface for the activity monitor
//!
//! A full-screen terminal client: the HAL boot console plays once, then the
//! live work log takes over.
//!
//! # Architecture
//!
//! - **App**: Event loop, phase switching, frame rendering
//! - **Widgets**: The boot console and the scrollable work log
//! - **Audio**: Boot sound through an external player process
//! - **Theme**: HAL console palette

pub mod app;
pub mod audio;
pub mod theme;
pub mod widgets;

pub use app::{App, Phase};
