//! Sequential Animation Queue
//!
//! One worker task drains an unbounded channel of [`AnimationJob`]s and runs
//! each to completion before taking the next, so reveals from different
//! entries never interleave on screen. `enqueue` never waits; a job that
//! arrives while the worker is busy simply waits its turn.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use super::timing::{pause, CancelToken};
use super::typewriter::reveal;
use crate::surface::{CursorMarker, TextSlot};

/// Errors from [`AnimationQueue::enqueue`]
#[derive(Debug, Error)]
pub enum QueueError {
    /// The worker is gone; nothing will run
    #[error("animation worker has stopped")]
    Closed,
}

/// One reveal: write `text` into `slot` at `speed` per character
#[derive(Clone, Debug)]
pub struct AnimationTask {
    /// Destination slot
    pub slot: TextSlot,
    /// Full text to reveal
    pub text: String,
    /// Delay after each character
    pub speed: Duration,
}

impl AnimationTask {
    /// Create a task
    pub fn new(slot: TextSlot, text: impl Into<String>, speed: Duration) -> Self {
        Self {
            slot,
            text: text.into(),
            speed,
        }
    }
}

enum Step {
    Reveal(AnimationTask),
    Cursor(CursorMarker),
}

type StartAction = Box<dyn FnOnce() + Send + 'static>;

/// A group of reveals that run back-to-back as one queue item
///
/// ```ignore
/// let job = AnimationJob::new()
///     .on_start(move || log.prepend(node))
///     .reveal(AnimationTask::new(ts_slot, "12:03", Duration::from_millis(35)))
///     .cursor(marker)
///     .reveal(AnimationTask::new(msg_slot, "deploy", Duration::from_millis(75)))
///     .cursor_grace(Duration::from_millis(1500));
/// queue.enqueue(job)?;
/// ```
#[derive(Default)]
pub struct AnimationJob {
    on_start: Option<StartAction>,
    steps: Vec<Step>,
    cursor_grace: Duration,
    post_pause: Duration,
}

impl AnimationJob {
    /// Create an empty job
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` when the worker picks this job up, before any reveal
    #[must_use]
    pub fn on_start(mut self, action: impl FnOnce() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(action));
        self
    }

    /// Append a reveal
    #[must_use]
    pub fn reveal(mut self, task: AnimationTask) -> Self {
        self.steps.push(Step::Reveal(task));
        self
    }

    /// Show `marker` at this point in the job
    #[must_use]
    pub fn cursor(mut self, marker: CursorMarker) -> Self {
        self.steps.push(Step::Cursor(marker));
        self
    }

    /// How long shown cursors stay after the last reveal (zero hides at once)
    #[must_use]
    pub fn cursor_grace(mut self, grace: Duration) -> Self {
        self.cursor_grace = grace;
        self
    }

    /// Pause after the last reveal before the next job starts
    #[must_use]
    pub fn pause_after(mut self, pause: Duration) -> Self {
        self.post_pause = pause;
        self
    }

    /// Number of reveals in this job
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Reveal(_)))
            .count()
    }

    async fn run(self) {
        if let Some(action) = self.on_start {
            action();
        }

        let mut cursors = Vec::new();
        for step in self.steps {
            match step {
                Step::Reveal(task) => reveal(&task.slot, &task.text, task.speed).await,
                Step::Cursor(marker) => {
                    marker.show();
                    cursors.push(marker);
                }
            }
        }

        if !cursors.is_empty() {
            if self.cursor_grace.is_zero() {
                cursors.iter().for_each(CursorMarker::hide);
            } else {
                let grace = self.cursor_grace;
                tokio::spawn(async move {
                    tokio::time::sleep(grace).await;
                    cursors.iter().for_each(CursorMarker::hide);
                });
            }
        }

        if !self.post_pause.is_zero() {
            pause(self.post_pause, &CancelToken::never()).await;
        }
    }
}

#[derive(Default)]
struct QueueShared {
    /// Enqueued but not yet finished (includes the active job)
    pending: AtomicUsize,
    completed: AtomicU64,
    idle: Notify,
}

/// FIFO runner for [`AnimationJob`]s with exactly one job active at a time
pub struct AnimationQueue {
    tx: mpsc::UnboundedSender<AnimationJob>,
    shared: Arc<QueueShared>,
    worker: JoinHandle<()>,
}

impl AnimationQueue {
    /// Spawn the worker on the current tokio runtime
    #[must_use]
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(QueueShared::default());
        let worker = tokio::spawn(run_worker(rx, Arc::clone(&shared)));
        Self { tx, shared, worker }
    }

    /// Add a job behind everything already queued
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the worker has stopped.
    pub fn enqueue(&self, job: AnimationJob) -> Result<(), QueueError> {
        self.shared.pending.fetch_add(1, Ordering::AcqRel);
        if self.tx.send(job).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    /// Jobs enqueued but not yet finished
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Jobs run to completion so far
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.shared.completed.load(Ordering::Acquire)
    }

    /// Resolve once every enqueued job has finished
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.pending() == 0 || self.worker.is_finished() {
                return;
            }
            notified.await;
        }
    }

    /// Stop accepting jobs, let queued jobs finish, and wait for the worker
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "Animation worker ended abnormally");
        }
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<AnimationJob>, shared: Arc<QueueShared>) {
    tracing::debug!("Animation worker started");
    while let Some(job) = rx.recv().await {
        let tasks = job.task_count();
        job.run().await;

        let done = shared.completed.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(job = done, tasks, "Animation job finished");

        if shared.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            shared.idle.notify_waiters();
        }
    }
    shared.idle.notify_waiters();
    tracing::debug!("Animation worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn task(slot: &TextSlot, text: &str) -> AnimationTask {
        AnimationTask::new(slot.clone(), text, Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_in_fifo_order() {
        let queue = AnimationQueue::spawn();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            let slot = TextSlot::new();
            queue
                .enqueue(
                    AnimationJob::new()
                        .on_start(move || order.lock().push(i))
                        .reveal(task(&slot, "xyz")),
                )
                .unwrap();
        }

        queue.wait_idle().await;
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.completed(), 5);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_does_not_wait_for_busy_worker() {
        let queue = AnimationQueue::spawn();
        let slot = TextSlot::new();
        queue
            .enqueue(AnimationJob::new().reveal(AnimationTask::new(
                slot.clone(),
                "a long reveal",
                Duration::from_secs(1),
            )))
            .unwrap();

        let before = tokio::time::Instant::now();
        queue.enqueue(AnimationJob::new()).unwrap();
        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(queue.pending(), 2);

        queue.wait_idle().await;
        assert_eq!(slot.text(), "a long reveal");
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_job_starts_only_after_previous_finished() {
        let queue = AnimationQueue::spawn();
        let first = TextSlot::new();
        let second = TextSlot::new();
        let seen_at_start = Arc::new(Mutex::new(None));

        queue
            .enqueue(AnimationJob::new().reveal(task(&first, "first job")))
            .unwrap();
        let observed = first.clone();
        let seen = Arc::clone(&seen_at_start);
        queue
            .enqueue(
                AnimationJob::new()
                    .on_start(move || *seen.lock() = Some(observed.text()))
                    .reveal(task(&second, "second")),
            )
            .unwrap();

        queue.wait_idle().await;
        assert_eq!(seen_at_start.lock().as_deref(), Some("first job"));
        assert_eq!(second.text(), "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_hidden_after_grace() {
        let queue = AnimationQueue::spawn();
        let slot = TextSlot::new();
        let cursor = CursorMarker::default();

        queue
            .enqueue(
                AnimationJob::new()
                    .cursor(cursor.clone())
                    .reveal(task(&slot, "msg"))
                    .cursor_grace(Duration::from_millis(1500)),
            )
            .unwrap();

        queue.wait_idle().await;
        assert!(cursor.is_visible());

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert!(!cursor.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_after_delays_next_job() {
        let queue = AnimationQueue::spawn();
        let started = Arc::new(Mutex::new(None));
        let marker = Arc::clone(&started);
        let origin = tokio::time::Instant::now();

        queue
            .enqueue(AnimationJob::new().pause_after(Duration::from_millis(500)))
            .unwrap();
        queue
            .enqueue(AnimationJob::new().on_start(move || {
                *marker.lock() = Some(origin.elapsed());
            }))
            .unwrap();

        queue.wait_idle().await;
        let started = (*started.lock()).expect("second job never started");
        assert!(started >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_wait_idle_on_empty_queue() {
        let queue = AnimationQueue::spawn();
        queue.wait_idle().await;
        assert_eq!(queue.completed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_queue() {
        let queue = AnimationQueue::spawn();
        let slot = TextSlot::new();
        queue.enqueue(AnimationJob::new().reveal(task(&slot, "bye"))).unwrap();
        queue.shutdown().await;
        assert_eq!(slot.text(), "bye");
    }

    #[test]
    fn test_task_count() {
        let slot = TextSlot::new();
        let job = AnimationJob::new()
            .reveal(task(&slot, "a"))
            .cursor(CursorMarker::default())
            .reveal(task(&slot, "b"));
        assert_eq!(job.task_count(), 2);
    }
}
