use tracing::{debug, error, info, warn};

use crate::changelog::{format_summary, format_title, latest_entry};
use crate::context::AppContext;
use crate::domain::revision::RevisionRef;
use crate::domain::version::VersionEntry;
use crate::error::{AppError, AppResult};
use crate::services::RemoteStateService;
use crate::workflow::detect::{ChangeOutcome, check_for_change};

const CONNECTION_ERROR_MESSAGE: &str =
    "Failed to check for updates. Please check your internet connection.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Unchanged,
    /// Changed, but notifications are switched off.
    Muted(RevisionRef),
    /// Changed, but the changelog had no version entry to report.
    NothingToReport(RevisionRef),
    Notified {
        entry: VersionEntry,
        revision: RevisionRef,
    },
}

/// Fetches and parses the changelog, tagging the newest entry with `revision`.
pub async fn fetch_latest_version(
    remote: &dyn RemoteStateService,
    revision: Option<&RevisionRef>,
) -> AppResult<Option<VersionEntry>> {
    let Some(content) = remote.fetch_file_content().await? else {
        debug!("tracked file has no content");
        return Ok(None);
    };
    let entry = latest_entry(&content).map(|entry| match revision {
        Some(revision) => entry.with_revision(revision.id.clone()),
        None => entry,
    });
    Ok(entry)
}

/// One poll cycle: detect, then fetch, parse, format and notify on change.
pub async fn run_check(ctx: &AppContext) -> AppResult<CheckOutcome> {
    let revision =
        match check_for_change(ctx.remote.as_ref(), ctx.store.as_ref(), ctx.first_run).await? {
            ChangeOutcome::Unchanged => return Ok(CheckOutcome::Unchanged),
            ChangeOutcome::Changed(revision) => revision,
        };

    let config = ctx.store.load().await?;
    if !config.notification.enabled {
        info!(revision = %revision.short_id(), "notifications disabled, skipping");
        return Ok(CheckOutcome::Muted(revision));
    }

    let Some(entry) = fetch_latest_version(ctx.remote.as_ref(), Some(&revision)).await? else {
        warn!(revision = %revision.short_id(), "changelog changed but no version entry found");
        return Ok(CheckOutcome::NothingToReport(revision));
    };

    let title = format_title(&config.github.repo, &entry);
    let body = format_summary(&entry, &ctx.limits);
    ctx.notifier
        .show_release(title, body, ctx.remote.history_url())
        .await?;

    info!(version = %entry.version, revision = %revision.short_id(), "release notification shown");
    Ok(CheckOutcome::Notified { entry, revision })
}

/// Runs a cycle and turns failures into log lines and, for connectivity
/// problems, a single error notification. Never fails.
pub async fn check_and_notify(ctx: &AppContext) -> Option<CheckOutcome> {
    match run_check(ctx).await {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            report_failure(ctx, &err).await;
            None
        }
    }
}

pub async fn report_failure(ctx: &AppContext, err: &AppError) {
    if !err.is_remote_unavailable() {
        error!(error = %err, "check for updates failed");
        return;
    }
    error!(error = %err, "failed to reach the source-control host");
    if let Err(notify_err) = ctx.notifier.show_error(CONNECTION_ERROR_MESSAGE).await {
        warn!(error = %notify_err, "failed to show error notification");
    }
}
