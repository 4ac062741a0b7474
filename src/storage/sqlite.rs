//! SQLite recording store.
//!
//! Each recording is one row; `position` keeps the collection order so a
//! reload returns recordings exactly as they were saved.

use super::{Recording, RecordingId, RecordingStore, StorageError};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Recording store backed by `recordings.db`.
pub struct SqliteStore {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl SqliteStore {
    /// Creates a store for `<data_dir>/recordings.db`. Nothing is opened until
    /// the first read or write.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            database_path: data_dir.join("recordings.db"),
            connection: None,
        }
    }

    /// Opens the database on first use and creates the table if necessary.
    fn connection(&mut self) -> Result<&mut Connection, StorageError> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let connection = Connection::open(&self.database_path)?;
                connection.execute(
                    "CREATE TABLE IF NOT EXISTS recordings (
                        position INTEGER NOT NULL,
                        id INTEGER NOT NULL UNIQUE,
                        audio BLOB NOT NULL,
                        duration_label TEXT NOT NULL,
                        created_at TEXT NOT NULL
                    )",
                    [],
                )?;
                tracing::debug!("Opened recording database {}", self.database_path.display());
                connection
            }
        };

        Ok(self.connection.insert(connection))
    }
}

impl RecordingStore for SqliteStore {
    fn try_load(&mut self) -> Result<Vec<Recording>, StorageError> {
        let connection = self.connection()?;

        let mut statement = connection.prepare(
            "SELECT id, audio, duration_label, created_at FROM recordings ORDER BY position ASC",
        )?;

        let recordings = statement
            .query_map([], |row| {
                Ok(Recording {
                    id: RecordingId(row.get(0)?),
                    audio: row.get(1)?,
                    duration_label: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recordings)
    }

    fn save_all(&mut self, recordings: &[Recording]) -> Result<(), StorageError> {
        let connection = self.connection()?;
        let transaction = connection.transaction()?;

        transaction.execute("DELETE FROM recordings", [])?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO recordings (position, id, audio, duration_label, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, recording) in recordings.iter().enumerate() {
                insert.execute(params![
                    position as i64,
                    recording.id.0,
                    recording.audio,
                    recording.duration_label,
                    recording.created_at,
                ])?;
            }
        }
        transaction.commit()?;

        tracing::debug!("Saved {} recordings to database", recordings.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sample_recording;
    use tempfile::TempDir;

    #[test]
    fn test_empty_database_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::new(dir.path());
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_across_connections() {
        let dir = TempDir::new().unwrap();
        let recordings = vec![
            sample_recording(9, "00:09"),
            sample_recording(3, "00:03"),
            sample_recording(7, "10:07"),
        ];

        SqliteStore::new(dir.path()).save_all(&recordings).unwrap();

        let mut reopened = SqliteStore::new(dir.path());
        assert_eq!(reopened.load(), recordings);
    }

    #[test]
    fn test_save_replaces_collection() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::new(dir.path());

        store
            .save_all(&[sample_recording(1, "00:01"), sample_recording(2, "00:02")])
            .unwrap();
        store.save_all(&[sample_recording(2, "00:02")]).unwrap();

        let ids: Vec<i64> = store.load().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_duplicate_ids_roll_back() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::new(dir.path());
        store.save_all(&[sample_recording(1, "00:01")]).unwrap();

        let duplicate = [sample_recording(5, "00:05"), sample_recording(5, "00:05")];
        assert!(matches!(store.save_all(&duplicate), Err(StorageError::Sqlite(_))));

        let ids: Vec<i64> = store.load().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1]);
    }
}
