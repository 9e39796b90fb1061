//! Runtime error types

use spellcheck_core::TrackerError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("Tracker task is no longer running")]
    ChannelClosed,

    #[error("Task failed: {0}")]
    TaskJoin(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
