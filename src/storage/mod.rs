//! Persistence of finished recordings.
//!
//! The store always works on the whole collection: callers read every
//! recording, change the list, and write it back. Two backends are provided, a
//! JSON document that mirrors the browser local-storage layout and a SQLite
//! database.

pub mod json;
pub mod sqlite;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

use crate::config::StorageBackend;

/// Failures reading or writing the recording collection.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored recordings are malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("recording database failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Unique recording identifier, a creation timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingId(pub i64);

impl RecordingId {
    /// Picks the id for a new recording created at `now_millis`.
    ///
    /// Uses the timestamp unless an existing id is equal or later, in which
    /// case it continues one past the largest existing id.
    pub fn next(existing: &[Recording], now_millis: i64) -> Self {
        let floor = existing
            .iter()
            .map(|r| r.id.0.saturating_add(1))
            .max()
            .unwrap_or(i64::MIN);
        Self(now_millis.max(floor))
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordingId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One finished, immutable recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: RecordingId,
    /// Encoded audio container (WAV), base64 text when serialized
    #[serde(with = "base64_audio")]
    pub audio: Vec<u8>,
    /// Elapsed time when the session stopped, `MM:SS`
    pub duration_label: String,
    /// Local creation time for display
    pub created_at: String,
}

/// Removes the recording with `id`, keeping the order of the rest.
///
/// Only the first match is removed; returns it if there was one.
pub fn remove_by_id(recordings: &mut Vec<Recording>, id: RecordingId) -> Option<Recording> {
    let index = recordings.iter().position(|r| r.id == id)?;
    Some(recordings.remove(index))
}

/// Whole-collection persistence for recordings.
pub trait RecordingStore {
    /// Reads every recording, oldest first.
    ///
    /// # Errors
    /// - If the backing storage cannot be read or holds malformed data
    fn try_load(&mut self) -> Result<Vec<Recording>, StorageError>;

    /// Replaces the stored collection with `recordings`.
    ///
    /// # Errors
    /// - If the backing storage cannot be written
    fn save_all(&mut self, recordings: &[Recording]) -> Result<(), StorageError>;

    /// Reads every recording, treating unreadable storage as empty.
    fn load(&mut self) -> Vec<Recording> {
        match self.try_load() {
            Ok(recordings) => recordings,
            Err(e) => {
                tracing::warn!("Treating recording store as empty: {}", e);
                Vec::new()
            }
        }
    }
}

impl<S: RecordingStore + ?Sized> RecordingStore for Box<S> {
    fn try_load(&mut self) -> Result<Vec<Recording>, StorageError> {
        (**self).try_load()
    }

    fn save_all(&mut self, recordings: &[Recording]) -> Result<(), StorageError> {
        (**self).save_all(recordings)
    }
}

/// Returns the data directory, `~/.local/share/voxmemo`.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the directory cannot be created
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("voxmemo");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Opens the configured backend inside `data_dir`.
pub fn open_store(backend: StorageBackend, data_dir: &Path) -> Box<dyn RecordingStore> {
    tracing::debug!("Opening {} recording store in {}", backend, data_dir.display());
    match backend {
        StorageBackend::Json => Box::new(JsonStore::new(data_dir)),
        StorageBackend::Sqlite => Box::new(SqliteStore::new(data_dir)),
    }
}

mod base64_audio {
    use super::*;
    use base64::Engine;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) fn sample_recording(id: i64, label: &str) -> Recording {
    Recording {
        id: RecordingId(id),
        audio: vec![b'R', b'I', b'F', b'F', 0, 1, 2, 255, id as u8],
        duration_label: label.to_string(),
        created_at: format!("2026-10-18 12:00:{:02}", id % 60),
    }
}
