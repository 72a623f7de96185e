//! Cancellable fixed-interval loop
//!
//! Both the status poller and the readings poller run on a `PollLoop`. The loop
//! owns its task handle and an epoch counter; `stop()` bumps the epoch and
//! aborts the task. A tick that was already in flight when `stop()` ran holds
//! a stale `Liveness` and must check it before applying anything.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Token handed to a loop body; stays live until the loop that issued it stops
#[derive(Debug, Clone)]
pub struct Liveness {
    epoch: Arc<AtomicU64>,
    issued: u64,
}

impl Liveness {
    pub fn is_live(&self) -> bool {
        self.epoch.load(Ordering::Acquire) == self.issued
    }
}

/// A single background loop with idempotent start/stop
pub struct PollLoop {
    name: &'static str,
    epoch: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl PollLoop {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            epoch: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    /// True while a started loop has not been stopped and has not exited
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn `body` unless a loop is already running. Returns whether it started.
    pub fn start<F, Fut>(&mut self, body: F) -> bool
    where
        F: FnOnce(Liveness) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }

        let issued = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let liveness = Liveness {
            epoch: self.epoch.clone(),
            issued,
        };

        tracing::debug!("{} loop started", self.name);
        self.handle = Some(tokio::spawn(body(liveness)));
        true
    }

    /// Cancel the loop. Stopping a stopped loop is a no-op. Returns whether a loop was running.
    pub fn stop(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        // Invalidate first so a tick that is mid-request cannot apply its result
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let was_running = !handle.is_finished();
        handle.abort();
        if was_running {
            tracing::debug!("{} loop stopped", self.name);
        }
        was_running
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `tick` now and then every `period`, sequentially, until liveness is lost
///
/// Each tick is awaited to completion before the next one is scheduled, so a
/// slow request delays the following tick instead of overlapping it.
pub async fn every<F, Fut>(period: Duration, liveness: Liveness, mut tick: F)
where
    F: FnMut(Liveness) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !liveness.is_live() {
            break;
        }
        tick(liveness.clone()).await;
    }
}
