//! Presentation surface driven by the session controller.

use super::waveform::WaveformSurface;
use crate::storage::{Recording, RecordingId};

/// Everything the controller shows to the user.
///
/// The surface also hosts the live waveform, hence the supertrait.
pub trait Presenter: WaveformSurface {
    /// Switches the affordances between recording and idle: the toggle label,
    /// and whether the recordings list accepts playback and delete.
    fn set_recording(&mut self, recording: bool);

    /// Shows the elapsed time of the running session.
    fn show_elapsed(&mut self, label: &str);

    /// Pauses every playing recording and rewinds it to the start.
    fn halt_playback(&mut self);

    /// Adds one playable, deletable entry at the end of the list.
    fn render_recording(&mut self, recording: &Recording);

    /// Removes the entry for `id`, if shown.
    fn remove_recording(&mut self, id: RecordingId);

    /// Shows a one-line error notice.
    fn show_error(&mut self, message: &str);
}
