//! Spellcheck Tracker Runtime
//!
//! Runs a `SessionCoordinator` on tokio:
//! - `TrackerTask`: serializes every inbound event and boundary tick
//! - `BoundaryTimer`: one-shot sleeps until the next day boundary
//! - File-backed snapshot and attachment stores
//!
//! Front-ends start it through [`TrackerBuilder`] and talk to it through the
//! returned [`TrackerHandle`].

pub mod builder;
pub mod error;
pub mod scheduler;
pub mod storage;
pub mod tracker;

pub use builder::{TrackerBuilder, TrackerHandle};
pub use error::{RuntimeError, RuntimeResult};
pub use scheduler::BoundaryTimer;
pub use storage::{FileAttachmentStore, JsonSnapshotStore};
pub use tracker::{TickOutcome, TrackerCommand, TrackerReceiver, TrackerSender, TrackerTask};
