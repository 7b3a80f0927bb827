use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("notification error: {0}")]
    Notification(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, AppError::RemoteUnavailable(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
