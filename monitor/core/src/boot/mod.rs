//! Boot Sequence
//!
//! Plays the scripted boot screen once per session before the log appears.
//!
//! ```text
//!            start delay           every line revealed
//!   Idle ──────────────► Playing ──────────────────────► Complete
//!                           │                               │
//!                      skip │                               │ cursor, hold
//!                           ▼                               ▼
//!                        Skipped ──── notice ────────► hand-off (fade, dismiss)
//! ```
//!
//! State lives in a watch channel and moves forward only. A skip fires one
//! [`CancelSignal`]; the typewriter and every inter-line pause observe its
//! token, so the player notices within one character tick.

mod audio;
mod script;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::animation::{pause, reveal_until, CancelSignal, CancelToken, Paused, Revealed};
use crate::surface::BootScreen;

pub use audio::{AudioPlayer, PlaybackError, SilentAudio};
pub use script::{boot_script, LineStyle, ScriptLine, BOOT_SPEED, EXCHANGE_SPEED};

/// Notice shown after a skip
pub const INTERRUPTED_NOTICE: &str = "[ HAL  ] Boot sequence interrupted.";

/// Where the sequence is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Waiting for the start delay
    Idle,
    /// Revealing the script
    Playing,
    /// Interrupted by the user
    Skipped,
    /// Every line revealed
    Complete,
}

impl PlaybackState {
    /// Whether the sequence has reached a final state
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Skipped | Self::Complete)
    }
}

/// Delays around the script
#[derive(Clone, Debug)]
pub struct BootConfig {
    /// Wait before playback starts
    pub start_delay: Duration,
    /// How long the interrupted notice stays before hand-off
    pub skip_notice_delay: Duration,
    /// How long the final cursor stays before the fade
    pub complete_hold: Duration,
    /// Fade length on the completion path
    pub fade: Duration,
    /// How long key presses can skip
    pub skip_listener_window: Duration,
    /// Text of the interrupted notice
    pub notice: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(1200),
            skip_notice_delay: Duration::from_millis(600),
            complete_hold: Duration::from_millis(1000),
            fade: Duration::from_millis(1000),
            skip_listener_window: Duration::from_secs(30),
            notice: INTERRUPTED_NOTICE.to_string(),
        }
    }
}

// ============================================================================
// Skip
// ============================================================================

/// Requests a skip. Cheap to clone; every clone drives the same player.
#[derive(Clone, Debug)]
pub struct SkipHandle {
    state: Arc<watch::Sender<PlaybackState>>,
    signal: Arc<CancelSignal>,
}

impl SkipHandle {
    /// Move `Playing` to `Skipped` and cancel playback.
    ///
    /// Returns `true` only for the call that performed the transition; in any
    /// other state (or on a repeat) this does nothing.
    pub fn trigger(&self) -> bool {
        let skipped = self.state.send_if_modified(|state| {
            if *state == PlaybackState::Playing {
                *state = PlaybackState::Skipped;
                true
            } else {
                false
            }
        });

        if skipped {
            self.signal.cancel();
            tracing::info!("Boot sequence skipped");
        }
        skipped
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }
}

/// The two skip sources: key presses (for a bounded window) and pointer
/// clicks on the boot screen
#[derive(Debug)]
pub struct SkipTriggers {
    handle: SkipHandle,
    key_deadline: Instant,
    key_attached: bool,
}

impl SkipTriggers {
    /// Attach both listeners; the key listener detaches after `window`
    #[must_use]
    pub fn new(handle: SkipHandle, window: Duration) -> Self {
        Self {
            handle,
            key_deadline: Instant::now() + window,
            key_attached: true,
        }
    }

    /// A key was pressed. Returns whether it skipped.
    pub fn key(&mut self) -> bool {
        if !self.key_listener_alive() {
            return false;
        }
        let skipped = self.handle.trigger();
        if skipped {
            self.key_attached = false;
        }
        skipped
    }

    /// The boot screen was clicked. Returns whether it skipped.
    pub fn pointer(&self) -> bool {
        self.handle.trigger()
    }

    /// Whether key presses still skip
    #[must_use]
    pub fn key_listener_alive(&self) -> bool {
        self.key_attached
            && Instant::now() < self.key_deadline
            && !self.handle.state().is_finished()
    }

    /// When the key listener detaches
    #[must_use]
    pub fn key_deadline(&self) -> Instant {
        self.key_deadline
    }

    /// Detach the key listener now
    pub fn expire(&mut self) {
        if self.key_attached {
            tracing::debug!("Boot key listener detached");
        }
        self.key_attached = false;
    }
}

// ============================================================================
// Player
// ============================================================================

/// Plays a script onto a [`BootScreen`] with audio
pub struct BootSequencePlayer {
    config: BootConfig,
    script: Vec<ScriptLine>,
    screen: BootScreen,
    audio: Box<dyn AudioPlayer>,
    state: Arc<watch::Sender<PlaybackState>>,
    signal: Arc<CancelSignal>,
}

impl BootSequencePlayer {
    /// Create a player in `Idle`
    pub fn new(
        config: BootConfig,
        script: Vec<ScriptLine>,
        screen: BootScreen,
        audio: impl AudioPlayer + 'static,
    ) -> Self {
        let (state, _) = watch::channel(PlaybackState::Idle);
        Self {
            config,
            script,
            screen,
            audio: Box::new(audio),
            state: Arc::new(state),
            signal: Arc::new(CancelSignal::new()),
        }
    }

    /// A handle that can skip this player
    #[must_use]
    pub fn skip_handle(&self) -> SkipHandle {
        SkipHandle {
            state: Arc::clone(&self.state),
            signal: Arc::clone(&self.signal),
        }
    }

    /// Watch the playback state
    #[must_use]
    pub fn state(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// The screen this player draws onto
    #[must_use]
    pub fn screen(&self) -> &BootScreen {
        &self.screen
    }

    /// Play the sequence through hand-off and return the final state.
    ///
    /// Runs once; later calls return the final state immediately.
    pub async fn run(&self) -> PlaybackState {
        let current = *self.state.borrow();
        if current != PlaybackState::Idle {
            tracing::warn!(state = ?current, "Boot sequence already ran");
            return current;
        }

        pause(self.config.start_delay, &CancelToken::never()).await;
        self.state.send_replace(PlaybackState::Playing);
        tracing::info!(lines = self.script.len(), "Boot sequence playing");

        if let Err(e) = self.audio.play().await {
            tracing::warn!(error = %e, "Boot audio failed, continuing silently");
        }

        let token = self.signal.token();
        let finished = self.play_script(&token).await;
        self.audio.stop().await;

        if finished && self.complete() {
            self.screen.show_cursor();
            pause(self.config.complete_hold, &CancelToken::never()).await;
            self.hand_off(self.config.fade).await;
            tracing::info!("Boot sequence complete");
            PlaybackState::Complete
        } else {
            self.screen.clear();
            self.screen.show_notice(self.config.notice.as_str());
            pause(self.config.skip_notice_delay, &CancelToken::never()).await;
            self.hand_off(Duration::ZERO).await;
            PlaybackState::Skipped
        }
    }

    /// Reveal every line; `false` as soon as the token fires
    async fn play_script(&self, token: &CancelToken) -> bool {
        for (index, line) in self.script.iter().enumerate() {
            let slot = self.screen.push_line(line.style);
            if reveal_until(&slot, &line.text, line.speed, token).await == Revealed::Cancelled {
                tracing::debug!(line = index, "Boot reveal cancelled");
                return false;
            }
            if pause(line.post_delay, token).await == Paused::Cancelled {
                tracing::debug!(line = index, "Boot pause cancelled");
                return false;
            }
        }
        true
    }

    /// `Playing` to `Complete`, unless a skip got there first
    fn complete(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == PlaybackState::Playing {
                *state = PlaybackState::Complete;
                true
            } else {
                false
            }
        })
    }

    /// Shared by both exits: fade, then give the terminal to the log
    async fn hand_off(&self, fade: Duration) {
        self.screen.begin_fade();
        pause(fade, &CancelToken::never()).await;
        self.screen.dismiss();
    }
}
