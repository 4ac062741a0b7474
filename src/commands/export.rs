//! Export a recording's audio to a file.

use crate::storage::RecordingId;
use anyhow::Context;
use std::path::Path;

/// Writes the WAV payload of recording `id` to `output`.
///
/// # Errors
/// - If the store cannot be read or no recording has that id
/// - If the output file cannot be written
pub fn handle_export(id: RecordingId, output: &Path) -> anyhow::Result<()> {
    let mut store = super::open_configured_store()?;
    let recordings = store.try_load()?;
    let recording = super::by_id(&recordings, id)?;

    std::fs::write(output, &recording.audio)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!("Exported recording {} to {}", id, output.display());
    println!(
        "Wrote {} ({} bytes, {})",
        output.display(),
        recording.audio.len(),
        recording.duration_label
    );
    Ok(())
}
