//! Error types for the Spellcheck tracker
//!
//! This module contains every error raised by the core: submission grammar
//! errors, collaborator failures (persistence, attachment storage, output
//! channel) and the main `TrackerError` type that unifies them all.

use crate::types::{PlayerName, RoundNumber};

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Ways a result message can fail the submission grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Message is empty")]
    MissingHeader,
    #[error("Header line {header:?} does not declare a round number")]
    InvalidRoundNumber { header: String },
    #[error("No guess rows follow the header")]
    EmptyGrid,
    #[error("Row {row} contains symbols other than result markers")]
    InvalidRow { row: usize },
    #[error("Row {row} has {actual} markers, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Grid of {rows} rows is too large to score")]
    GridTooLarge { rows: usize },
}

/// Durable snapshot store failures
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot encoding error: {reason}")]
    Encoding { reason: String },
    #[error("Snapshot store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Attachment blob store failures
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Attachment I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Attachment not found: {handle}")]
    NotFound { handle: String },
}

/// Output channel failures
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to post to channel {channel}: {reason}")]
    PostFailed { channel: String, reason: String },
    #[error("Failed to delete message {message}: {reason}")]
    DeleteFailed { message: String, reason: String },
}

// ----------------------------------------------------------------------------
// Tracker Error
// ----------------------------------------------------------------------------

/// Core error type for the Spellcheck tracker
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Invalid result format: {0}")]
    InvalidFormat(#[from] SubmissionError),

    #[error("Results are for round {declared}, currently accepting round {expected}")]
    RoundMismatch {
        expected: RoundNumber,
        declared: RoundNumber,
    },

    #[error("{player} has already submitted results for this round")]
    AlreadyCompleted { player: PlayerName },

    #[error("{player} is not registered")]
    NotRegistered { player: PlayerName },

    #[error("Round {round} has already been scored")]
    RoundClosed { round: RoundNumber },

    #[error("No registered players")]
    NoRegisteredPlayers,

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Attachment store error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("Output channel error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

impl TrackerError {
    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        TrackerError::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the initiator's input rather than by
    /// a failing collaborator
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidFormat(_)
                | TrackerError::RoundMismatch { .. }
                | TrackerError::AlreadyCompleted { .. }
                | TrackerError::NotRegistered { .. }
                | TrackerError::RoundClosed { .. }
                | TrackerError::NoRegisteredPlayers
        )
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type TrackerResult<T> = core::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(TrackerError::from(SubmissionError::EmptyGrid).is_recoverable());
        assert!(TrackerError::NoRegisteredPlayers.is_recoverable());
        assert!(!TrackerError::Persistence(PersistenceError::Unavailable {
            reason: "disk full".into()
        })
        .is_recoverable());
    }

    #[test]
    fn test_round_mismatch_message_names_both_rounds() {
        let err = TrackerError::RoundMismatch {
            expected: RoundNumber::new(12),
            declared: RoundNumber::new(11),
        };
        let text = err.to_string();
        assert!(text.contains("11"));
        assert!(text.contains("12"));
    }
}
