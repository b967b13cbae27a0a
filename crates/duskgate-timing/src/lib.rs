//! Countdown and periodic timers for the Duskgate client.
//!
//! Frames used to own their own ad-hoc one-second timers for cast bars,
//! respawn clocks, and the like. This crate centralizes the two shapes
//! they actually need:
//!
//! - [`Countdown`] — a 1 Hz count from N down to 0 with a per-second
//!   callback, cancelable and restartable.
//! - [`Periodic`] — a fixed-period repeating task with an abort-on-drop
//!   guard, used by the client loop for the idle keepalive.
//!
//! Both ride on `tokio::time::interval`, so tests can drive them with the
//! paused clock instead of sleeping for real.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::trace;

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// A 1 Hz countdown: calls `on_tick(remaining)` once per second from the
/// starting total down to and including 0, then stops.
///
/// The first tick fires immediately with the full total, so a 3-second
/// countdown reports `3, 2, 1, 0` over three seconds of elapsed time.
/// Starting a countdown while one is running cancels the previous run;
/// dropping the handle cancels too.
#[derive(Default)]
pub struct Countdown {
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Creates an idle countdown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the countdown from `total_secs`.
    pub fn start<F>(&mut self, total_secs: u64, on_tick: F)
    where
        F: Fn(u64) + Send + 'static,
    {
        self.cancel();

        let task = tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            let mut remaining = total_secs;
            loop {
                interval.tick().await;
                on_tick(remaining);
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
            }
            trace!(total_secs, "countdown finished");
        });
        self.task = Some(task);
    }

    /// Stops the countdown without waiting for it to reach 0. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// `true` while a started countdown has not yet reached 0 or been
    /// cancelled.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Periodic
// ---------------------------------------------------------------------------

/// A repeating task that fires `f` every `period`, starting one period
/// after spawn. Aborted when the guard is dropped.
pub struct Periodic {
    task: JoinHandle<()>,
}

impl Periodic {
    /// Spawns the repeating task. The first invocation happens at
    /// `now + period`, not immediately — a keepalive has nothing to say
    /// the instant the connection opens.
    pub fn spawn<F>(period: Duration, mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                f();
            }
        });
        Self { task }
    }

    /// `true` until the task is aborted.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Periodic {
    fn drop(&mut self) {
        self.task.abort();
    }
}
