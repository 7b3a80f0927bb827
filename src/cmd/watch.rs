use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::monitor::Monitor;

/// How often a running watcher looks for `config set` changes.
pub const CONFIG_REFRESH: Duration = Duration::from_secs(15);

/// Polls until Ctrl-C.
pub async fn run(monitor: &Monitor) -> AppResult<()> {
    monitor.start().await?;
    info!(
        interval = ?monitor.pending_interval(),
        "watching for changelog updates, Ctrl-C to stop"
    );
    follow_config(monitor, tokio::signal::ctrl_c()).await?;
    info!("shutting down");
    monitor.stop();
    Ok(())
}

/// Keeps the running monitor in step with the stored config until `shutdown`
/// resolves.
async fn follow_config<F>(monitor: &Monitor, shutdown: F) -> AppResult<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(shutdown);
    let mut refresh = time::interval_at(Instant::now() + CONFIG_REFRESH, CONFIG_REFRESH);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            result = &mut shutdown => return Ok(result?),
            _ = refresh.tick() => {
                if let Err(err) = monitor.sync_config().await {
                    warn!(error = %err, "failed to reload configuration");
                }
            }
        }
    }
}
