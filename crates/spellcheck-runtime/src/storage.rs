//! File-backed stores
//!
//! `JsonSnapshotStore` keeps the session snapshot as pretty-printed JSON and
//! replaces it with write-then-rename, so a crash mid-save leaves the previous
//! snapshot intact. `FileAttachmentStore` keeps one `<name>.png` per player in
//! a directory, which is also how stored screenshots are found again after a
//! restart.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use spellcheck_core::{
    AttachmentError, AttachmentHandle, AttachmentStore, PersistenceError, PlayerName,
    SessionSnapshot, SnapshotStore,
};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

// ----------------------------------------------------------------------------
// Snapshot Store
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        let encoded =
            serde_json::to_vec_pretty(snapshot).map_err(|e| PersistenceError::Encoding {
                reason: e.to_string(),
            })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).await?;
        file.write_all(&encoded).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp, &self.path).await?;

        debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistenceError::Encoding {
                reason: format!("{}: {}", self.path.display(), e),
            })
    }
}

// ----------------------------------------------------------------------------
// Attachment Store
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileAttachmentStore {
    dir: PathBuf,
}

impl FileAttachmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(player: &PlayerName) -> String {
        format!("{}.png", player)
    }

    fn path_of(&self, handle: &AttachmentHandle) -> PathBuf {
        self.dir.join(handle.as_str())
    }
}

fn not_found(handle: &AttachmentHandle, e: std::io::Error) -> AttachmentError {
    if e.kind() == ErrorKind::NotFound {
        AttachmentError::NotFound {
            handle: handle.to_string(),
        }
    } else {
        AttachmentError::Io(e)
    }
}

#[async_trait]
impl AttachmentStore for FileAttachmentStore {
    async fn put(&self, player: &PlayerName, bytes: &[u8]) -> Result<AttachmentHandle, AttachmentError> {
        fs::create_dir_all(&self.dir).await?;
        let handle = AttachmentHandle::new(Self::file_name(player));
        fs::write(self.path_of(&handle), bytes).await?;
        debug!("Stored {} bytes as {}", bytes.len(), handle);
        Ok(handle)
    }

    async fn get(&self, handle: &AttachmentHandle) -> Result<Vec<u8>, AttachmentError> {
        fs::read(self.path_of(handle))
            .await
            .map_err(|e| not_found(handle, e))
    }

    async fn delete(&self, handle: &AttachmentHandle) -> Result<(), AttachmentError> {
        fs::remove_file(self.path_of(handle))
            .await
            .map_err(|e| not_found(handle, e))
    }

    async fn find(&self, player: &PlayerName) -> Result<Option<AttachmentHandle>, AttachmentError> {
        let handle = AttachmentHandle::new(Self::file_name(player));
        match fs::metadata(self.path_of(&handle)).await {
            Ok(meta) if meta.is_file() => Ok(Some(handle)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
