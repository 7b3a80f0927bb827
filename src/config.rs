use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tracking::TrackingState;
use crate::error::{AppError, AppResult};

const APP_DIR_NAME: &str = "changelog-notifier";
const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_POLL_INTERVAL_MINUTES: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub github: GithubTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_revision_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub sound_enabled: bool,
    pub poll_interval_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GithubTarget {
    pub owner: String,
    pub repo: String,
    pub file_path: String,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub notification: Option<NotificationUpdate>,
    pub github: Option<GithubUpdate>,
    pub last_known_revision_id: Option<String>,
    pub last_check_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
    pub enabled: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub poll_interval_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubUpdate {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub file_path: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_enabled: true,
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
        }
    }
}

impl NotificationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_minutes) * 60)
    }
}

impl Default for GithubTarget {
    fn default() -> Self {
        Self {
            owner: "anthropics".to_string(),
            repo: "claude-code".to_string(),
            file_path: "CHANGELOG.md".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tracking(&self) -> TrackingState {
        TrackingState {
            last_known_revision_id: self.last_known_revision_id.clone(),
            last_check_timestamp: self.last_check_timestamp,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.notification.poll_interval_minutes == 0 {
            return Err(AppError::Configuration(
                "poll interval must be at least one minute".to_string(),
            ));
        }
        let target = &self.github;
        for (field, value) in [
            ("owner", &target.owner),
            ("repo", &target.repo),
            ("filePath", &target.file_path),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "github.{field} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Applies `update` on top of the current values. Leaves `self` untouched
    /// when the merged result does not validate.
    pub fn merge(&mut self, update: ConfigUpdate) -> AppResult<()> {
        let mut merged = self.clone();

        if let Some(notification) = update.notification {
            if let Some(enabled) = notification.enabled {
                merged.notification.enabled = enabled;
            }
            if let Some(sound_enabled) = notification.sound_enabled {
                merged.notification.sound_enabled = sound_enabled;
            }
            if let Some(minutes) = notification.poll_interval_minutes {
                merged.notification.poll_interval_minutes = minutes;
            }
        }

        if let Some(github) = update.github {
            if let Some(owner) = github.owner {
                merged.github.owner = owner.trim().to_string();
            }
            if let Some(repo) = github.repo {
                merged.github.repo = repo.trim().to_string();
            }
            if let Some(file_path) = github.file_path {
                merged.github.file_path = file_path.trim().trim_start_matches('/').to_string();
            }
            // A different file has its own history.
            if merged.github != self.github {
                merged.last_known_revision_id = None;
                merged.last_check_timestamp = None;
            }
        }

        if let Some(revision_id) = update.last_known_revision_id {
            merged.last_known_revision_id = Some(revision_id);
        }
        if let Some(timestamp) = update.last_check_timestamp {
            merged.last_check_timestamp = Some(timestamp);
        }

        merged.validate()?;
        *self = merged;
        Ok(())
    }
}

impl ConfigUpdate {
    pub fn tracking(revision_id: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            last_known_revision_id: Some(revision_id.into()),
            last_check_timestamp: Some(checked_at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        AppError::Configuration("unable to determine the user config directory".to_string())
    })?;
    Ok(base.join(APP_DIR_NAME))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}
