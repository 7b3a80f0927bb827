use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::context::AppContext;
use crate::workflow::check::check_and_notify;

pub const STARTUP_DELAY: Duration = Duration::from_secs(5);

/// Work run on every tick.
#[async_trait]
pub trait PollTarget: Send + Sync + 'static {
    async fn poll(&self);
}

#[async_trait]
impl PollTarget for AppContext {
    async fn poll(&self) {
        check_and_notify(self).await;
    }
}

struct PendingTimer {
    interval: Duration,
    handle: JoinHandle<()>,
}

/// Owns at most one timer task. Starting or restarting always aborts the
/// previous timer first; checks already spawned by it keep running.
pub struct PollScheduler {
    target: Arc<dyn PollTarget>,
    startup_delay: Duration,
    pending: Option<PendingTimer>,
}

impl PollScheduler {
    pub fn new(target: Arc<dyn PollTarget>, startup_delay: Duration) -> Self {
        Self {
            target,
            startup_delay,
            pending: None,
        }
    }

    /// Schedules a first check after the startup delay, then one per `interval`.
    pub fn start(&mut self, interval: Duration) {
        info!(
            interval_secs = interval.as_secs(),
            startup_delay_secs = self.startup_delay.as_secs(),
            "polling started"
        );
        self.schedule(interval, Some(self.startup_delay));
    }

    /// Replaces the pending timer with one on the new period. No catch-up check.
    pub fn restart(&mut self, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "polling rescheduled");
        self.schedule(interval, None);
    }

    pub fn stop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            debug!("polling stopped");
        }
    }

    pub fn pending_interval(&self) -> Option<Duration> {
        self.pending
            .as_ref()
            .filter(|pending| !pending.handle.is_finished())
            .map(|pending| pending.interval)
    }

    fn schedule(&mut self, interval: Duration, initial_delay: Option<Duration>) {
        self.stop();
        let target = Arc::clone(&self.target);
        let handle = tokio::spawn(async move {
            let first_tick = Instant::now() + interval;
            if let Some(delay) = initial_delay {
                time::sleep(delay).await;
                spawn_poll(&target);
            }
            let mut ticker = time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                spawn_poll(&target);
            }
        });
        self.pending = Some(PendingTimer { interval, handle });
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Each tick runs detached, so a slow check never delays the timer and two
/// checks may overlap.
fn spawn_poll(target: &Arc<dyn PollTarget>) {
    let target = Arc::clone(target);
    tokio::spawn(async move {
        target.poll().await;
    });
}
