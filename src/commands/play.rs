//! Play a stored recording from the command line.

use crate::playback::Player;

/// Plays recording `index` (1 = most recent) and returns when it ends.
///
/// # Errors
/// - If the store cannot be read or the index does not exist
/// - If the audio output cannot be opened or the payload cannot be decoded
pub fn handle_play(index: Option<usize>) -> anyhow::Result<()> {
    let index = index.unwrap_or(1);
    let mut store = super::open_configured_store()?;
    let recordings = store.try_load()?;
    let recording = super::by_recency(&recordings, index)?;

    tracing::info!("Playing recording {} ({})", recording.id, recording.duration_label);
    println!(
        "Playing #{index} ({}, recorded {})",
        recording.duration_label, recording.created_at
    );

    Player::new().play_to_end(recording)
}
