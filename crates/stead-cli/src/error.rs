use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] stead_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Edited content is not valid JSON: {0}")]
    InvalidContent(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error(
        "Sync is not configured. Set STEAD_SYNC_URL (and optionally STEAD_COOKIES) to enable syncing."
    )]
    SyncNotConfigured,
}
