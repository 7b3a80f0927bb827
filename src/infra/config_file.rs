use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{AppConfig, ConfigUpdate};
use crate::error::{AppError, AppResult};
use crate::services::ConfigStore;

/// Stores the whole [`AppConfig`] as one pretty-printed JSON document.
///
/// The file is re-read on every load so edits made by another process
/// (`config set` while `watch` runs) are picked up.
pub struct JsonConfigStore {
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonConfigStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn read(&self) -> AppResult<AppConfig> {
        let config = match fs::read_to_string(&self.file_path).await {
            Ok(contents) if contents.trim().is_empty() => AppConfig::default(),
            Ok(contents) => serde_json::from_str::<AppConfig>(&contents).map_err(|err| {
                AppError::Configuration(format!(
                    "invalid config file {}: {err}",
                    self.file_path.display()
                ))
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.file_path.display(), "no config file, using defaults");
                AppConfig::default()
            }
            Err(err) => return Err(AppError::Io(err)),
        };
        config.validate()?;
        Ok(config)
    }

    async fn write(&self, config: &AppConfig) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(config)
            .map_err(|err| AppError::Configuration(format!("failed to encode config: {err}")))?;
        fs::write(&self.file_path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn load(&self) -> AppResult<AppConfig> {
        self.read().await
    }

    async fn update(&self, update: ConfigUpdate) -> AppResult<AppConfig> {
        let _guard = self.write_lock.lock().await;
        let mut config = self.read().await?;
        config.merge(update)?;
        self.write(&config).await?;
        debug!(path = %self.file_path.display(), "config saved");
        Ok(config)
    }
}
