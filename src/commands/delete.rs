//! Delete a stored recording.

use crate::storage::{remove_by_id, RecordingId};
use anyhow::anyhow;

/// Removes the recording with `id` and rewrites the store.
///
/// # Errors
/// - If the store cannot be read or written
/// - If no recording has that id
pub fn handle_delete(id: RecordingId) -> anyhow::Result<()> {
    let mut store = super::open_configured_store()?;
    let mut recordings = store.try_load()?;

    if remove_by_id(&mut recordings, id).is_none() {
        return Err(anyhow!("No recording with id {id}. Run 'voxmemo list' to see them."));
    }
    store.save_all(&recordings)?;

    tracing::info!("Deleted recording {} from the command line", id);
    println!("Deleted recording {id}. {} left.", recordings.len());
    Ok(())
}
