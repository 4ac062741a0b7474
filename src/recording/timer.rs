//! Elapsed-time tracking for a recording session.

/// Counts whole seconds of a running session and formats them as `MM:SS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElapsedTimer {
    seconds: u64,
}

impl ElapsedTimer {
    /// Creates a timer at `00:00`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the timer by one second and returns the new label.
    pub fn tick(&mut self) -> String {
        self.seconds += 1;
        self.label()
    }

    /// Returns the number of whole seconds counted so far.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Returns the current `MM:SS` label.
    pub fn label(&self) -> String {
        format_label(self.seconds)
    }
}

/// Formats a second count as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours, so 100 minutes reads `100:00`.
pub fn format_label(seconds: u64) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{minutes:02}:{secs:02}")
}
