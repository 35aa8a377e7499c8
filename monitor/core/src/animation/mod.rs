//! Animation - Timed Reveals and Their Ordering
//!
//! Three layers, each built on the one before:
//!
//! - [`timing`]: one cancellable pause primitive ([`pause`]) and the
//!   [`CancelSignal`]/[`CancelToken`] pair checked at every suspension point
//! - [`typewriter`]: character-by-character reveal into a [`TextSlot`]
//! - [`queue`]: a single worker that runs [`AnimationJob`]s strictly one at a
//!   time in arrival order
//!
//! ```text
//! enqueue ──► [job][job][job] ──► worker ──► reveal ──► pause ──► slot
//!                                                         ▲
//!                                     CancelToken ────────┘ (boot only)
//! ```
//!
//! [`TextSlot`]: crate::surface::TextSlot

mod queue;
mod timing;
mod typewriter;

pub use queue::{AnimationJob, AnimationQueue, AnimationTask, QueueError};
pub use timing::{pause, CancelSignal, CancelToken, Paused};
pub use typewriter::{reveal, reveal_until, Revealed};
