//! Playback of stored recordings through the default output device.
//!
//! The output stream is opened on first use. Each playing recording gets its
//! own sink so several entries can be paused and resumed independently.

use crate::storage::{Recording, RecordingId};
use anyhow::{anyhow, Result};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::collections::HashMap;
use std::io::Cursor;

/// Playback state of one recording after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Plays recordings, one sink per entry.
#[derive(Default)]
pub struct Player {
    output: Option<OutputStream>,
    sinks: HashMap<RecordingId, Sink>,
}

impl Player {
    /// Creates a player without touching the audio device yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn output(&mut self) -> Result<&OutputStream> {
        let output = match self.output.take() {
            Some(output) => output,
            None => {
                let mut output = OutputStreamBuilder::open_default_stream()
                    .map_err(|e| anyhow!("Failed to open audio output: {e}"))?;
                output.log_on_drop(false);
                tracing::debug!("Audio output opened");
                output
            }
        };
        Ok(self.output.insert(output))
    }

    fn start(&mut self, recording: &Recording) -> Result<Sink> {
        let source = Decoder::new(Cursor::new(recording.audio.clone()))
            .map_err(|e| anyhow!("Recording {} cannot be decoded: {e}", recording.id))?;
        let sink = Sink::connect_new(self.output()?.mixer());
        sink.append(source);
        Ok(sink)
    }

    /// Starts, pauses or resumes `recording`.
    ///
    /// A recording that played to the end starts again from the beginning.
    ///
    /// # Errors
    /// - If the output device cannot be opened
    /// - If the payload is not a decodable container
    pub fn toggle(&mut self, recording: &Recording) -> Result<PlaybackState> {
        self.prune_finished();
        if let Some(sink) = self.sinks.get(&recording.id) {
            if !sink.empty() {
                if sink.is_paused() {
                    sink.play();
                    tracing::debug!("Resumed recording {}", recording.id);
                    return Ok(PlaybackState::Playing);
                }
                sink.pause();
                tracing::debug!("Paused recording {}", recording.id);
                return Ok(PlaybackState::Paused);
            }
        }

        let sink = self.start(recording)?;
        self.sinks.insert(recording.id, sink);
        tracing::info!("Playing recording {}", recording.id);
        Ok(PlaybackState::Playing)
    }

    /// Whether `id` is currently audible.
    pub fn is_playing(&self, id: RecordingId) -> bool {
        self.sinks
            .get(&id)
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    /// Drops the sinks of recordings that played to the end.
    fn prune_finished(&mut self) {
        self.sinks.retain(|_, sink| !sink.empty());
    }

    /// Pauses every recording and rewinds it, so the next toggle starts over.
    pub fn halt_all(&mut self) {
        for (id, sink) in self.sinks.drain() {
            sink.pause();
            sink.stop();
            tracing::debug!("Halted playback of recording {}", id);
        }
    }

    /// Stops and forgets the sink of a removed recording.
    pub fn forget(&mut self, id: RecordingId) {
        if let Some(sink) = self.sinks.remove(&id) {
            sink.stop();
        }
    }

    /// Plays `recording` from the start and blocks until it finishes.
    ///
    /// # Errors
    /// - If the output device cannot be opened
    /// - If the payload is not a decodable container
    pub fn play_to_end(&mut self, recording: &Recording) -> Result<()> {
        let sink = self.start(recording)?;
        sink.sleep_until_end();
        Ok(())
    }
}
