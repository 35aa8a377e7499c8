//! Cancellable Pauses
//!
//! Every timed wait in the engine goes through [`pause`], so cancellation is
//! implemented in exactly one place. A [`CancelToken`] is a read-only view of
//! a [`CancelSignal`]; tokens that can never fire come from
//! [`CancelToken::never`].

use std::time::Duration;

use tokio::sync::watch;

/// Outcome of a [`pause`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paused {
    /// The full duration elapsed
    Elapsed,
    /// The token fired first (or had already fired)
    Cancelled,
}

/// The firing side of a cancellation flag
#[derive(Debug)]
pub struct CancelSignal {
    tx: watch::Sender<bool>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    /// Create an unfired signal
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A token observing this signal
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    /// Whether the signal has fired
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Read-only view of a [`CancelSignal`]
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that never fires
    #[must_use]
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested; never resolves otherwise
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Signal dropped without firing
                return std::future::pending().await;
            }
        }
    }
}

/// Wait for `duration` unless `token` fires first.
///
/// A zero duration still yields to the scheduler once so other tasks keep
/// running between back-to-back steps.
pub async fn pause(duration: Duration, token: &CancelToken) -> Paused {
    if token.is_cancelled() {
        return Paused::Cancelled;
    }

    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::select! {
            biased;
            () = token.cancelled() => return Paused::Cancelled,
            () = tokio::time::sleep(duration) => {}
        }
    }

    if token.is_cancelled() {
        Paused::Cancelled
    } else {
        Paused::Elapsed
    }
}
