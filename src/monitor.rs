use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::info;

use crate::config::{AppConfig, ConfigUpdate};
use crate::context::AppContext;
use crate::domain::version::VersionEntry;
use crate::error::AppResult;
use crate::scheduler::PollScheduler;
use crate::workflow::check::{CheckOutcome, fetch_latest_version, report_failure, run_check};

/// Operations exposed to the user: manual checks, config changes and the
/// polling lifecycle.
pub struct Monitor {
    ctx: Arc<AppContext>,
    scheduler: Mutex<PollScheduler>,
}

impl Monitor {
    pub fn new(ctx: AppContext, startup_delay: Duration) -> Self {
        let ctx = Arc::new(ctx);
        let scheduler = PollScheduler::new(ctx.clone(), startup_delay);
        Self {
            ctx,
            scheduler: Mutex::new(scheduler),
        }
    }

    pub async fn start(&self) -> AppResult<()> {
        let config = self.ctx.store.load().await?;
        self.ctx
            .notifier
            .set_sound_enabled(config.notification.sound_enabled);
        self.scheduler().start(config.notification.poll_interval());
        Ok(())
    }

    pub fn stop(&self) {
        self.scheduler().stop();
    }

    /// Runs one cycle immediately, independent of the timer.
    pub async fn check_now(&self) -> AppResult<CheckOutcome> {
        match run_check(&self.ctx).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                report_failure(&self.ctx, &err).await;
                Err(err)
            }
        }
    }

    /// The newest changelog entry as currently published. Leaves the tracking
    /// state alone.
    pub async fn latest_version(&self) -> AppResult<Option<VersionEntry>> {
        let revision = self.ctx.remote.fetch_latest_revision().await?;
        fetch_latest_version(self.ctx.remote.as_ref(), revision.as_ref()).await
    }

    pub async fn get_config(&self) -> AppResult<AppConfig> {
        self.ctx.store.load().await
    }

    /// Persists `update`, then applies the sound flag and, while polling, the
    /// poll interval.
    pub async fn update_config(&self, update: ConfigUpdate) -> AppResult<AppConfig> {
        let config = self.ctx.store.update(update).await?;
        self.ctx
            .notifier
            .set_sound_enabled(config.notification.sound_enabled);
        {
            let mut scheduler = self.scheduler();
            if scheduler.pending_interval().is_some() {
                scheduler.restart(config.notification.poll_interval());
            }
        }
        info!(
            enabled = config.notification.enabled,
            sound = config.notification.sound_enabled,
            interval_minutes = config.notification.poll_interval_minutes,
            "configuration updated"
        );
        Ok(config)
    }

    /// Re-reads the stored config and applies a changed sound flag or poll
    /// interval written by another process. Returns whether anything changed.
    pub async fn sync_config(&self) -> AppResult<bool> {
        let config = self.ctx.store.load().await?;
        let sound = config.notification.sound_enabled;
        let interval = config.notification.poll_interval();

        let mut changed = false;
        if self.ctx.notifier.sound_enabled() != sound {
            self.ctx.notifier.set_sound_enabled(sound);
            changed = true;
        }
        {
            let mut scheduler = self.scheduler();
            let pending = scheduler.pending_interval();
            if pending.is_some() && pending != Some(interval) {
                scheduler.restart(interval);
                changed = true;
            }
        }
        if changed {
            info!(
                sound,
                interval_minutes = config.notification.poll_interval_minutes,
                "picked up configuration change"
            );
        }
        Ok(changed)
    }

    pub async fn test_notification(&self) -> AppResult<()> {
        self.ctx.notifier.show_test().await
    }

    pub fn pending_interval(&self) -> Option<Duration> {
        self.scheduler().pending_interval()
    }

    fn scheduler(&self) -> MutexGuard<'_, PollScheduler> {
        self.scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
