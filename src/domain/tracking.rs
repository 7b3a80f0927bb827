use chrono::{DateTime, Utc};

/// What has already been reported to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingState {
    pub last_known_revision_id: Option<String>,
    pub last_check_timestamp: Option<DateTime<Utc>>,
}

impl TrackingState {
    /// A missing identifier counts as a change so the first check reports too.
    pub fn differs_from(&self, revision_id: &str) -> bool {
        self.last_known_revision_id.as_deref() != Some(revision_id)
    }

    pub fn is_first_check(&self) -> bool {
        self.last_known_revision_id.is_none()
    }
}
