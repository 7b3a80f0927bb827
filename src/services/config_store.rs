use async_trait::async_trait;

use crate::config::{AppConfig, ConfigUpdate};
use crate::error::AppResult;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> AppResult<AppConfig>;
    /// Merges `update` into the stored record and returns the result.
    async fn update(&self, update: ConfigUpdate) -> AppResult<AppConfig>;
}
