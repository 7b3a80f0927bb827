use chrono::Utc;
use clap::ValueEnum;
use tracing::{debug, info};

use crate::config::ConfigUpdate;
use crate::domain::revision::RevisionRef;
use crate::error::AppResult;
use crate::services::{ConfigStore, RemoteStateService};

/// What to do the first time a revision is seen with no stored state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FirstRunPolicy {
    /// Report the current changelog right away.
    #[default]
    Notify,
    /// Remember the current revision silently and report later changes only.
    Suppress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    Changed(RevisionRef),
    Unchanged,
}

/// Compares the host's latest revision with the stored one and commits a new
/// revision before reporting it.
///
/// The commit happens before anything is shown, so a failed notification is
/// not repeated on the next poll. Two overlapping checks may both commit; they
/// write the same fetched value, so the store converges.
pub async fn check_for_change(
    remote: &dyn RemoteStateService,
    store: &dyn ConfigStore,
    first_run: FirstRunPolicy,
) -> AppResult<ChangeOutcome> {
    let Some(revision) = remote.fetch_latest_revision().await? else {
        debug!("tracked file has no revision history");
        return Ok(ChangeOutcome::Unchanged);
    };

    let tracking = store.load().await?.tracking();
    if !tracking.differs_from(&revision.id) {
        debug!(revision = %revision.short_id(), "tracked file unchanged");
        return Ok(ChangeOutcome::Unchanged);
    }

    let first_check = tracking.is_first_check();
    store
        .update(ConfigUpdate::tracking(revision.id.clone(), Utc::now()))
        .await?;

    if first_check && first_run == FirstRunPolicy::Suppress {
        info!(revision = %revision.short_id(), "recorded initial revision");
        return Ok(ChangeOutcome::Unchanged);
    }

    info!(
        previous = tracking.last_known_revision_id.as_deref().unwrap_or("<none>"),
        previous_change = ?tracking.last_check_timestamp,
        revision = %revision.short_id(),
        author = revision.author.as_deref().unwrap_or("<unknown>"),
        authored_at = ?revision.authored_at,
        summary = revision.message.lines().next().unwrap_or_default(),
        "tracked file changed"
    );
    Ok(ChangeOutcome::Changed(revision))
}
