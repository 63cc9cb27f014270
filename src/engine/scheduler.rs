//! Poll scheduling
//!
//! Each sync engine owns exactly one [`PollScheduler`]. Lifecycle (view
//! mount/unmount, session change) goes through explicit `start`/`stop`
//! calls in one place instead of ad hoc timers scattered per view.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fixed-interval poll driver
///
/// Runs the tick callback on one background task. Ticks never overlap:
/// the next tick waits for the previous callback to finish, and a tick
/// that overran its interval fires after a fresh delay rather than in a
/// burst. Stopping (or dropping) the scheduler aborts the task; no
/// in-flight request is actively cancelled, so the engines discard stale
/// responses by session id instead.
///
/// # Examples
///
/// ```no_run
/// use deskwire::engine::PollScheduler;
/// use std::time::Duration;
///
/// # async fn example() {
/// let mut scheduler = PollScheduler::new(Duration::from_secs(5));
/// scheduler.start(|| {
///     Box::pin(async {
///         // fetch and reconcile here
///     })
/// });
/// // ... view unmounts ...
/// scheduler.stop();
/// # }
/// ```
pub struct PollScheduler {
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl PollScheduler {
    /// Creates a stopped scheduler with the given tick interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
        }
    }

    /// The configured tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the poll task is currently running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Start polling; replaces any previously running task
    ///
    /// The first tick fires immediately, so a freshly displayed view
    /// synchronizes without waiting a full interval.
    pub fn start<F>(&mut self, mut tick: F)
    where
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        self.stop();
        let interval = self.interval;

        self.handle = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                tick().await;
            }
        }));
    }

    /// Stop polling
    ///
    /// Idempotent; safe to call on a scheduler that never started.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
