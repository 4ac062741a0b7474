//! JSON document store.
//!
//! Keeps the whole collection as one JSON array in `recordings.json`, with the
//! audio embedded as base64 text.

use super::{Recording, RecordingStore, StorageError};
use std::fs;
use std::path::{Path, PathBuf};

/// Recording store backed by a single JSON file.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Creates a store for `<data_dir>/recordings.json`. The file is created on
    /// the first save.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("recordings.json"),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordingStore for JsonStore {
    fn try_load(&mut self) -> Result<Vec<Recording>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let recordings: Vec<Recording> = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} recordings from {}",
            recordings.len(),
            self.path.display()
        );
        Ok(recordings)
    }

    fn save_all(&mut self, recordings: &[Recording]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(recordings)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;

        tracing::debug!(
            "Saved {} recordings to {}",
            recordings.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sample_recording;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(dir.path());
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_order_and_bytes() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(dir.path());
        let recordings = vec![
            sample_recording(30, "00:03"),
            sample_recording(10, "01:00"),
            sample_recording(20, "00:00"),
        ];

        store.save_all(&recordings).unwrap();

        let mut reopened = JsonStore::new(dir.path());
        assert_eq!(reopened.load(), recordings);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.try_load(), Err(StorageError::Json(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_replaces_collection() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(dir.path());

        store
            .save_all(&[sample_recording(1, "00:01"), sample_recording(2, "00:02")])
            .unwrap();
        store.save_all(&[sample_recording(2, "00:02")]).unwrap();

        let ids: Vec<i64> = store.load().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2]);
    }
}
