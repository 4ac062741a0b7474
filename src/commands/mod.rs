//! Command handlers for voxmemo.
//!
//! # Commands
//! - `record`: Interactive recorder with live waveform and recordings list
//! - `list`: Print stored recordings
//! - `play`: Play a stored recording to the end
//! - `delete`: Remove a stored recording
//! - `export`: Write a recording's WAV payload to a file
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod delete;
pub mod export;
pub mod list;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;

pub use config::handle_config;
pub use delete::handle_delete;
pub use export::handle_export;
pub use list::handle_list;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;

use crate::config::VoxmemoConfig;
use crate::storage::{self, Recording, RecordingId, RecordingStore};
use anyhow::anyhow;

/// Opens the store selected in the config file.
fn open_configured_store() -> anyhow::Result<Box<dyn RecordingStore>> {
    let config = VoxmemoConfig::load()?;
    Ok(storage::open_store(
        config.storage.backend,
        &storage::data_dir()?,
    ))
}

/// Picks a recording by recency, 1 being the most recent.
fn by_recency(recordings: &[Recording], index: usize) -> anyhow::Result<&Recording> {
    if recordings.is_empty() {
        return Err(anyhow!("No recordings yet. Run 'voxmemo' to record one."));
    }
    index
        .checked_sub(1)
        .and_then(|offset| recordings.iter().rev().nth(offset))
        .ok_or_else(|| {
            anyhow!(
                "Recording #{index} does not exist. There are {} recordings.",
                recordings.len()
            )
        })
}

fn by_id(recordings: &[Recording], id: RecordingId) -> anyhow::Result<&Recording> {
    recordings
        .iter()
        .find(|recording| recording.id == id)
        .ok_or_else(|| anyhow!("No recording with id {id}. Run 'voxmemo list' to see them."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sample_recording;

    #[test]
    fn test_by_recency_counts_from_newest() {
        let recordings = vec![
            sample_recording(1, "00:01"),
            sample_recording(2, "00:02"),
            sample_recording(3, "00:03"),
        ];
        assert_eq!(by_recency(&recordings, 1).unwrap().id, RecordingId(3));
        assert_eq!(by_recency(&recordings, 3).unwrap().id, RecordingId(1));
        assert!(by_recency(&recordings, 0).is_err());
        assert!(by_recency(&recordings, 4).is_err());
        assert!(by_recency(&[], 1).is_err());
    }

    #[test]
    fn test_by_id() {
        let recordings = vec![sample_recording(10, "00:01"), sample_recording(20, "00:02")];
        assert_eq!(by_id(&recordings, RecordingId(20)).unwrap().duration_label, "00:02");
        assert!(by_id(&recordings, RecordingId(30)).is_err());
    }
}
