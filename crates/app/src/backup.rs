//! Local cart backup.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use mockall::automock;
use thiserror::Error;
use tracing::debug;
use trolley::snapshot::Snapshot;

/// Errors raised by a [`BackupStore`].
#[derive(Debug, Error)]
pub enum BackupError {
    /// Reading or writing the backup failed.
    #[error("backup io error: {0}")]
    Io(#[from] io::Error),

    /// The stored backup is not a valid snapshot.
    #[error("backup is not a valid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage for the last known-good cart.
#[automock]
pub trait BackupStore: Send + Sync {
    /// Read the stored snapshot, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    fn load(&self) -> Result<Option<Snapshot>, BackupError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, snapshot: &Snapshot) -> Result<(), BackupError>;
}

/// Snapshot kept as a single JSON file.
#[derive(Debug, Clone)]
pub struct FileBackupStore {
    path: PathBuf,
}

impl FileBackupStore {
    /// Store the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");

        PathBuf::from(staging)
    }
}

impl BackupStore for FileBackupStore {
    fn load(&self) -> Result<Option<Snapshot>, BackupError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), BackupError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = self.staging_path();

        // Readers only ever see a complete snapshot.
        fs::write(&staging, serde_json::to_vec(snapshot)?)?;
        fs::rename(&staging, &self.path)?;

        debug!(path = %self.path.display(), items = snapshot.items.len(), "saved cart backup");

        Ok(())
    }
}

/// Snapshot kept in memory.
#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    slot: Mutex<Option<Snapshot>>,
}

impl MemoryBackupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }
}

impl BackupStore for MemoryBackupStore {
    fn load(&self) -> Result<Option<Snapshot>, BackupError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), BackupError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());

        Ok(())
    }
}
