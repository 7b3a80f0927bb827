use async_trait::async_trait;

use crate::domain::revision::RevisionRef;
use crate::error::AppResult;

/// Read-only view of the tracked file on the source-control host.
///
/// `Ok(None)` means the host has nothing for the path; transport, auth and
/// rate-limit failures surface as `AppError::RemoteUnavailable`.
#[async_trait]
pub trait RemoteStateService: Send + Sync {
    async fn fetch_latest_revision(&self) -> AppResult<Option<RevisionRef>>;
    async fn fetch_file_content(&self) -> AppResult<Option<String>>;
    /// Browser URL for the tracked file's history.
    fn history_url(&self) -> String;
}
