//! Typewriter Reveal
//!
//! Writes a string into a [`TextSlot`] one character at a time, pausing
//! `speed` after each character.

use std::time::Duration;

use super::timing::{pause, CancelToken, Paused};
use crate::surface::TextSlot;

/// Outcome of [`reveal_until`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revealed {
    /// Every character was written
    Complete,
    /// The token fired; the slot holds a prefix of the text
    Cancelled,
}

/// Reveal `text` into `slot`, starting from an empty slot.
///
/// Runs to completion; see [`reveal_until`] for the cancellable form.
pub async fn reveal(slot: &TextSlot, text: &str, speed: Duration) {
    reveal_until(slot, text, speed, &CancelToken::never()).await;
}

/// Reveal `text` into `slot`, stopping at the first suspension point where
/// `token` has fired.
///
/// The token is checked before each character is written and raced against
/// each per-character pause, so no character is written after cancellation.
pub async fn reveal_until(
    slot: &TextSlot,
    text: &str,
    speed: Duration,
    token: &CancelToken,
) -> Revealed {
    slot.clear();
    for ch in text.chars() {
        if token.is_cancelled() {
            return Revealed::Cancelled;
        }
        slot.push(ch);
        if pause(speed, token).await == Paused::Cancelled {
            return Revealed::Cancelled;
        }
    }
    Revealed::Complete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::CancelSignal;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_reveal_paces_each_character() {
        let slot = TextSlot::new();
        let start = Instant::now();
        reveal(&slot, "HAL", Duration::from_millis(30)).await;
        assert_eq!(slot.text(), "HAL");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(90));
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_is_progressive() {
        let slot = TextSlot::new();
        let observer = slot.clone();
        let writer = tokio::spawn(async move {
            reveal(&slot, "abcd", Duration::from_millis(100)).await;
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(observer.text(), "ab");
        writer.await.unwrap();
        assert_eq!(observer.text(), "abcd");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_restarts_from_empty() {
        let slot = TextSlot::with_text("stale");
        reveal(&slot, "new", Duration::from_millis(1)).await;
        assert_eq!(slot.text(), "new");
    }

    #[tokio::test]
    async fn test_zero_speed_writes_everything() {
        let slot = TextSlot::new();
        reveal(&slot, "instant", Duration::ZERO).await;
        assert_eq!(slot.text(), "instant");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_zero_speed_yields_between_characters() {
        let text = "x".repeat(200);
        let slot = TextSlot::new();
        let observer = slot.clone();

        let sampler = tokio::spawn(async move {
            let mut seen = Vec::new();
            loop {
                let len = observer.text().len();
                seen.push(len);
                if len == 200 {
                    break seen;
                }
                tokio::task::yield_now().await;
            }
        });

        reveal(&slot, &text, Duration::ZERO).await;
        let seen = sampler.await.unwrap();
        assert!(
            seen.iter().any(|&len| len > 0 && len < 200),
            "no partial reveal observed: {seen:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_mid_reveal() {
        let signal = CancelSignal::new();
        let token = signal.token();
        let slot = TextSlot::new();
        let observer = slot.clone();

        let writer = tokio::spawn(async move {
            reveal_until(&slot, "Open the pod bay doors", Duration::from_millis(20), &token).await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        signal.cancel();

        assert_eq!(writer.await.unwrap(), Revealed::Cancelled);
        let written = observer.text();
        assert_eq!(written, "Ope");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(observer.text(), written);
    }

    #[tokio::test]
    async fn test_already_cancelled_writes_nothing() {
        let signal = CancelSignal::new();
        signal.cancel();
        let slot = TextSlot::new();
        let outcome = reveal_until(&slot, "text", Duration::from_millis(5), &signal.token()).await;
        assert_eq!(outcome, Revealed::Cancelled);
        assert!(slot.is_empty());
    }
}
