//! In-memory collaborators
//!
//! Implementations of the collaborator traits that keep everything in
//! process memory. Used by tests and by the simulated console front-end.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::channel::{IdentityResolver, OutputChannel};
use crate::errors::{AttachmentError, OutputError, PersistenceError};
use crate::snapshot::SessionSnapshot;
use crate::storage::{AttachmentStore, SnapshotStore};
use crate::types::{AttachmentHandle, ChannelId, MessageRef, PlayerName};

fn poisoned() -> PersistenceError {
    PersistenceError::Unavailable {
        reason: "store lock poisoned".to_string(),
    }
}

// ----------------------------------------------------------------------------
// Snapshot Store
// ----------------------------------------------------------------------------

/// Snapshot store holding the last saved snapshot
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<MemorySnapshotState>,
}

#[derive(Debug, Default)]
struct MemorySnapshotState {
    snapshot: Option<SessionSnapshot>,
    fail_saves: bool,
    saves: usize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a snapshot, as if left by an earlier process
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.inner.lock() {
            state.snapshot = Some(snapshot);
        }
        store
    }

    /// Make every following save fail until switched back off
    pub fn fail_saves(&self, fail: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.fail_saves = fail;
        }
    }

    pub fn saved(&self) -> Option<SessionSnapshot> {
        self.inner.lock().ok().and_then(|s| s.snapshot.clone())
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|s| s.saves).unwrap_or_default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        let mut state = self.inner.lock().map_err(|_| poisoned())?;
        if state.fail_saves {
            return Err(PersistenceError::Unavailable {
                reason: "save failure injected".to_string(),
            });
        }
        state.snapshot = Some(snapshot.clone());
        state.saves += 1;
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError> {
        let state = self.inner.lock().map_err(|_| poisoned())?;
        Ok(state.snapshot.clone())
    }
}

// ----------------------------------------------------------------------------
// Attachment Store
// ----------------------------------------------------------------------------

/// Attachment store keyed by player name, one blob per player
#[derive(Debug, Default)]
pub struct MemoryAttachmentStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_for(player: &PlayerName) -> AttachmentHandle {
        AttachmentHandle::new(format!("{}.png", player))
    }

    /// Handles currently stored, sorted
    pub fn handles(&self) -> Vec<AttachmentHandle> {
        let mut handles: Vec<AttachmentHandle> = self
            .blobs
            .lock()
            .map(|b| b.keys().map(AttachmentHandle::new).collect())
            .unwrap_or_default();
        handles.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        handles
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_failed() -> AttachmentError {
    AttachmentError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "attachment store lock poisoned",
    ))
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn put(&self, player: &PlayerName, bytes: &[u8]) -> Result<AttachmentHandle, AttachmentError> {
        let handle = Self::handle_for(player);
        self.blobs
            .lock()
            .map_err(|_| lock_failed())?
            .insert(handle.as_str().to_string(), bytes.to_vec());
        Ok(handle)
    }

    async fn get(&self, handle: &AttachmentHandle) -> Result<Vec<u8>, AttachmentError> {
        self.blobs
            .lock()
            .map_err(|_| lock_failed())?
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| AttachmentError::NotFound {
                handle: handle.to_string(),
            })
    }

    async fn delete(&self, handle: &AttachmentHandle) -> Result<(), AttachmentError> {
        self.blobs
            .lock()
            .map_err(|_| lock_failed())?
            .remove(handle.as_str())
            .map(|_| ())
            .ok_or_else(|| AttachmentError::NotFound {
                handle: handle.to_string(),
            })
    }

    async fn find(&self, player: &PlayerName) -> Result<Option<AttachmentHandle>, AttachmentError> {
        let handle = Self::handle_for(player);
        let blobs = self.blobs.lock().map_err(|_| lock_failed())?;
        Ok(blobs.contains_key(handle.as_str()).then_some(handle))
    }
}

// ----------------------------------------------------------------------------
// Recording Channel
// ----------------------------------------------------------------------------

/// A message posted through [`RecordingChannel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub channel: ChannelId,
    pub text: String,
    pub attachment: Option<AttachmentHandle>,
}

/// Output channel that records everything it is asked to do
#[derive(Debug, Default)]
pub struct RecordingChannel {
    posts: Mutex<Vec<Post>>,
    deleted: Mutex<Vec<MessageRef>>,
    fail_posts: Mutex<bool>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Posted texts in order
    pub fn texts(&self) -> Vec<String> {
        self.posts().into_iter().map(|p| p.text).collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Drop recorded posts and deletions
    pub fn clear(&self) {
        if let Ok(mut posts) = self.posts.lock() {
            posts.clear();
        }
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.clear();
        }
    }

    /// Make every following post fail
    pub fn fail_posts(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_posts.lock() {
            *flag = fail;
        }
    }

    fn record(&self, post: Post) -> Result<(), OutputError> {
        if self.fail_posts.lock().map(|f| *f).unwrap_or(false) {
            return Err(OutputError::PostFailed {
                channel: post.channel.to_string(),
                reason: "post failure injected".to_string(),
            });
        }
        if let Ok(mut posts) = self.posts.lock() {
            posts.push(post);
        }
        Ok(())
    }
}

#[async_trait]
impl OutputChannel for RecordingChannel {
    async fn post(&self, channel: &ChannelId, text: &str) -> Result<(), OutputError> {
        self.record(Post {
            channel: channel.clone(),
            text: text.to_string(),
            attachment: None,
        })
    }

    async fn post_with_attachment(
        &self,
        channel: &ChannelId,
        text: &str,
        handle: &AttachmentHandle,
        _bytes: &[u8],
    ) -> Result<(), OutputError> {
        self.record(Post {
            channel: channel.clone(),
            text: text.to_string(),
            attachment: Some(handle.clone()),
        })
    }

    fn mention(&self, user: &PlayerName) -> String {
        format!("@{}", user)
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), OutputError> {
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(message.clone());
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Static Directory
// ----------------------------------------------------------------------------

/// Identity resolver that knows everyone except an explicit set of names
#[derive(Debug, Default, Clone)]
pub struct StaticDirectory {
    unknown: HashSet<String>,
}

impl StaticDirectory {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn with_unknown<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unknown: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl IdentityResolver for StaticDirectory {
    fn resolve_user(&self, name: &PlayerName) -> Option<String> {
        (!self.unknown.contains(name.as_str())).then(|| format!("@{}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attachment_store_is_keyed_by_player() {
        let store = MemoryAttachmentStore::new();
        let alice = PlayerName::new("alice");

        let first = store.put(&alice, b"one").await.unwrap();
        let second = store.put(&alice, b"two").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&first).await.unwrap(), b"two".to_vec());
        assert_eq!(store.find(&alice).await.unwrap(), Some(first.clone()));

        store.delete(&first).await.unwrap();
        assert!(store.find(&alice).await.unwrap().is_none());
        assert!(matches!(
            store.get(&first).await,
            Err(AttachmentError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_store_failure_injection() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&SessionSnapshot::default()).await.unwrap();
        store.fail_saves(true);
        assert!(store.save(&SessionSnapshot::default()).await.is_err());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_static_directory() {
        let directory = StaticDirectory::with_unknown(["ghost"]);
        assert_eq!(
            directory.resolve_user(&PlayerName::new("alice")).as_deref(),
            Some("@alice")
        );
        assert!(directory.resolve_user(&PlayerName::new("ghost")).is_none());
    }
}
