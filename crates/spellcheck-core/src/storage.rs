//! Storage abstractions
//!
//! The coordinator only needs two stores: a durable snapshot store for the
//! session, and a blob store for the screenshots players attach to their
//! results. Implementations live in the runtime crate (files) and in
//! [`crate::memory`] (tests).

use async_trait::async_trait;

use crate::errors::{AttachmentError, PersistenceError};
use crate::snapshot::SessionSnapshot;
use crate::types::{AttachmentHandle, PlayerName};

// ----------------------------------------------------------------------------
// Snapshot Store
// ----------------------------------------------------------------------------

/// Durable store for the session snapshot
///
/// `save` must not corrupt the previous snapshot when it fails part way;
/// callers treat a failed save as "nothing happened".
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist the snapshot, replacing the previous one
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError>;

    /// Load the last saved snapshot, `None` if nothing was ever saved
    async fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError>;
}

// ----------------------------------------------------------------------------
// Attachment Store
// ----------------------------------------------------------------------------

/// Blob store for player screenshots, keyed by player
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store a blob for the player, replacing any previous one
    async fn put(
        &self,
        player: &PlayerName,
        bytes: &[u8],
    ) -> Result<AttachmentHandle, AttachmentError>;

    /// Read a stored blob
    async fn get(&self, handle: &AttachmentHandle) -> Result<Vec<u8>, AttachmentError>;

    /// Remove a stored blob
    async fn delete(&self, handle: &AttachmentHandle) -> Result<(), AttachmentError>;

    /// Look up a blob left over from before a restart
    async fn find(&self, player: &PlayerName) -> Result<Option<AttachmentHandle>, AttachmentError>;
}
