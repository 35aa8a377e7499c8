//! Boot audio seam
//!
//! The player owns exactly one [`AudioPlayer`] for the length of the
//! sequence. Failing to start is never fatal; the sequence plays silently.

use async_trait::async_trait;
use thiserror::Error;

/// Audio failed to start
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Nothing to play (no asset configured, or the asset is missing)
    #[error("audio unavailable: {0}")]
    Unavailable(String),

    /// The playback process could not be started
    #[error("failed to start audio player '{player}': {source}")]
    Spawn {
        /// Player program
        player: String,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },
}

/// Audio played during the boot sequence
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Start playback from the beginning
    async fn play(&self) -> Result<(), PlaybackError>;

    /// Stop playback and rewind. Safe to call when not playing.
    async fn stop(&self);
}

/// An [`AudioPlayer`] that plays nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

#[async_trait]
impl AudioPlayer for SilentAudio {
    async fn play(&self) -> Result<(), PlaybackError> {
        Ok(())
    }

    async fn stop(&self) {}
}
