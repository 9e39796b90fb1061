//! Spellcheck Tracker Core
//!
//! This crate provides the game-session lifecycle and scoring engine for a daily
//! word-puzzle competition played inside a group chat. It owns player registration,
//! result-message parsing and scoring, tie-aware ranking, completion detection and
//! the day-boundary transitions that close one round and open the next.
//!
//! Everything that touches the outside world (chat platform, blob storage, durable
//! snapshots) is reached through the collaborator traits in [`storage`] and
//! [`channel`]; the tokio runtime that drives the coordinator lives in
//! `spellcheck-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod memory;
pub mod notices;
pub mod player;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod submission;
pub mod tally;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::{IdentityResolver, InboundAttachment, InboundMessage, OutputChannel};
pub use config::{ScheduleConfig, TrackerConfig};
pub use coordinator::{
    AttachmentReceipt, BoundaryReport, Collaborators, MessageDisposition, SessionCoordinator,
    SessionStatus, SubmissionReceipt,
};
pub use errors::{
    AttachmentError, OutputError, PersistenceError, SubmissionError, TrackerError, TrackerResult,
};
pub use player::Player;
pub use registry::{DeregisterOutcome, PlayerRegistry, RegisterOutcome};
pub use schedule::{BoundaryGuard, DailyBoundary, DaySchedule};
pub use session::{PendingAttachment, RoundPhase, Session};
pub use snapshot::{PlayerRecord, SessionSnapshot, SNAPSHOT_VERSION};
pub use storage::{AttachmentStore, SnapshotStore};
pub use submission::{Outcome, Submission, SubmissionParser, GRID_GRAMMAR_VERSION};
pub use tally::{competition_ranks, Scoreboard, Standing, TallyEngine};
pub use types::{
    AttachmentHandle, ChannelId, MessageRef, PlayerName, RoundNumber, SystemTimeSource,
    TimeSource,
};
