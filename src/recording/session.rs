//! Recording session lifecycle.
//!
//! [`SessionController`] owns everything a capture needs while it runs: the
//! microphone stream, the collected audio, the analyser, the elapsed timer and
//! both periodic schedules. A toggle moves it `Idle -> Recording` and back;
//! the way back passes through `Stopping` while the payload is encoded and
//! handed to the store.

use super::analyser::FrequencyAnalyser;
use super::encoder::ChunkEncoder;
use super::microphone::{CaptureStream, DeviceError, Microphone};
use super::presenter::Presenter;
use super::schedule::Repeating;
use super::timer::ElapsedTimer;
use super::waveform::WaveformRenderer;
use crate::storage::{remove_by_id, Recording, RecordingId, RecordingStore};
use chrono::Local;
use std::time::Duration;

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture running
    Idle,
    /// Microphone open, timer and waveform running
    Recording,
    /// Capture released, payload being finalized and stored
    Stopping,
}

/// Periodic event due on the session's schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// One second of recording has elapsed
    Tick,
    /// The waveform is due for a redraw
    Frame,
}

/// Transient state of the capture in progress.
struct RecordingSession<C> {
    stream: C,
    chunks: ChunkEncoder,
    analyser: FrequencyAnalyser,
    elapsed: ElapsedTimer,
}

/// Drives one microphone capture at a time and turns it into a [`Recording`].
pub struct SessionController<M: Microphone, S: RecordingStore, P: Presenter> {
    microphone: M,
    store: S,
    presenter: P,
    state: SessionState,
    session: Option<RecordingSession<M::Stream>>,
    ticker: Repeating,
    renderer: WaveformRenderer,
}

impl<M: Microphone, S: RecordingStore, P: Presenter> SessionController<M, S, P> {
    /// Creates an idle controller whose waveform redraws `fps` times a second.
    pub fn new(microphone: M, store: S, presenter: P, fps: u32) -> Self {
        Self {
            microphone,
            store,
            presenter,
            state: SessionState::Idle,
            session: None,
            ticker: Repeating::new(Duration::from_secs(1)),
            renderer: WaveformRenderer::new(fps),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a capture is running.
    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// The presentation surface.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The presentation surface, mutably.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Renders every persisted recording in stored order. Returns how many.
    pub fn restore(&mut self) -> usize {
        let recordings = self.store.load();
        for recording in &recordings {
            self.presenter.render_recording(recording);
        }
        tracing::info!("Restored {} recordings", recordings.len());
        recordings.len()
    }

    /// Starts a capture when idle, stops it when recording.
    ///
    /// Returns the state after the toggle has been handled.
    pub async fn toggle(&mut self) -> SessionState {
        match self.state {
            SessionState::Idle => match self.start().await {
                Ok(()) => {}
                Err(e) => tracing::debug!("Toggle left the session idle: {}", e.name()),
            },
            SessionState::Recording => {
                self.stop().await;
            }
            SessionState::Stopping => {
                tracing::debug!("Toggle ignored while stopping");
            }
        }
        self.state
    }

    /// Acquires the microphone and starts recording.
    ///
    /// Does nothing unless idle. On failure the controller stays idle and the
    /// error kind is shown to the user.
    ///
    /// # Errors
    /// - If the microphone cannot be acquired
    pub async fn start(&mut self) -> Result<(), DeviceError> {
        if self.state != SessionState::Idle {
            tracing::debug!("Start ignored in state {:?}", self.state);
            return Ok(());
        }

        let stream = match self.microphone.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Microphone acquisition failed: {} ({})", e.name(), e);
                self.presenter.show_error(&format!("{}: {}", e.name(), e));
                return Err(e);
            }
        };

        self.presenter.halt_playback();

        let sample_rate = stream.sample_rate();
        let session = RecordingSession {
            stream,
            chunks: ChunkEncoder::new(sample_rate),
            analyser: FrequencyAnalyser::new(),
            elapsed: ElapsedTimer::new(),
        };
        self.presenter.show_elapsed(&session.elapsed.label());
        self.session = Some(session);

        self.ticker.start();
        self.renderer.start();
        self.presenter.set_recording(true);
        self.state = SessionState::Recording;

        tracing::info!("Recording started at {}Hz", sample_rate);
        Ok(())
    }

    /// Stops the running capture and stores the result.
    ///
    /// Safe to call in any state; only a running capture is acted upon.
    /// Returns the new recording when one was produced.
    pub async fn stop(&mut self) -> Option<Recording> {
        if self.state != SessionState::Recording {
            tracing::debug!("Stop ignored in state {:?}", self.state);
            return None;
        }
        self.state = SessionState::Stopping;

        self.ticker.cancel();
        self.renderer.cancel(&mut self.presenter);

        let Some(mut session) = self.session.take() else {
            self.state = SessionState::Idle;
            return None;
        };

        let tail = session.stream.take_samples();
        session.chunks.push_chunk(tail);
        let RecordingSession {
            stream,
            chunks,
            analyser,
            elapsed,
        } = session;
        drop(stream);
        drop(analyser);

        self.presenter.set_recording(false);

        let duration_label = elapsed.label();
        tracing::info!(
            "Recording stopped after {} ({} fragments, {} samples)",
            duration_label,
            chunks.chunk_count(),
            chunks.sample_count()
        );

        let audio = match chunks.finalize().await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::error!("Failed to finalize recording: {}", e);
                self.presenter
                    .show_error(&format!("Could not encode recording: {e}"));
                self.state = SessionState::Idle;
                return None;
            }
        };

        // An unreadable store is left untouched rather than overwritten.
        let stored = self.store.try_load();
        let now = Local::now();
        let recording = Recording {
            id: RecordingId::next(stored.as_deref().unwrap_or_default(), now.timestamp_millis()),
            audio,
            duration_label,
            created_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        let saved = stored.and_then(|mut recordings| {
            recordings.push(recording.clone());
            self.store.save_all(&recordings)
        });
        match saved {
            Ok(()) => tracing::info!("Recording {} saved", recording.id),
            Err(e) => {
                tracing::warn!("Failed to persist recording {}: {}", recording.id, e);
                self.presenter
                    .show_error(&format!("Recording not saved: {e}"));
            }
        }

        self.presenter.render_recording(&recording);
        self.state = SessionState::Idle;
        Some(recording)
    }

    /// Stops any running capture before the controller goes away.
    pub async fn shutdown(&mut self) {
        if self.is_recording() {
            tracing::info!("Stopping active recording before exit");
            self.stop().await;
        }
    }

    /// Deletes the recording `id` from the store and the presenter.
    ///
    /// Refused while a capture is running, since the list is non-interactive
    /// then. An entry the store never held (its save failed) is only taken
    /// off the presenter. Returns whether the stored collection changed.
    pub fn delete(&mut self, id: RecordingId) -> bool {
        if self.state != SessionState::Idle {
            tracing::debug!("Delete of {} ignored while recording", id);
            return false;
        }

        let mut recordings = match self.store.try_load() {
            Ok(recordings) => recordings,
            Err(e) => {
                tracing::warn!("Cannot delete recording {}: {}", id, e);
                self.presenter
                    .show_error(&format!("Recording not deleted: {e}"));
                return false;
            }
        };
        if remove_by_id(&mut recordings, id).is_none() {
            tracing::warn!("Recording {} is not stored; removing it from the list only", id);
            self.presenter.remove_recording(id);
            return false;
        }

        if let Err(e) = self.store.save_all(&recordings) {
            tracing::warn!("Failed to delete recording {}: {}", id, e);
            self.presenter
                .show_error(&format!("Recording not deleted: {e}"));
            return false;
        }

        self.presenter.remove_recording(id);
        tracing::info!("Recording {} deleted", id);
        true
    }

    /// Waits for the next periodic event. Pending forever while idle.
    pub async fn next_event(&mut self) -> SessionEvent {
        tokio::select! {
            biased;
            _ = self.ticker.next() => SessionEvent::Tick,
            _ = self.renderer.next_frame() => SessionEvent::Frame,
        }
    }

    /// Dispatches a periodic event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Tick => self.on_tick(),
            SessionEvent::Frame => self.on_frame(),
        }
    }

    /// Advances the elapsed timer by one second and shows the new label.
    pub fn on_tick(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let label = session.elapsed.tick();
            self.presenter.show_elapsed(&label);
        }
    }

    /// Collects freshly captured audio and redraws the waveform.
    pub fn on_frame(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let fresh = session.stream.take_samples();
            session.analyser.push_samples(&fresh);
            session.chunks.push_chunk(fresh);
            self.renderer
                .draw_frame(&mut session.analyser, &mut self.presenter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::waveform::WaveformSurface;
    use crate::storage::{sample_recording, StorageError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct FakeStream {
        pending: VecDeque<Vec<i16>>,
    }

    impl CaptureStream for FakeStream {
        fn sample_rate(&self) -> u32 {
            8000
        }

        fn take_samples(&mut self) -> Vec<i16> {
            self.pending.pop_front().unwrap_or_default()
        }
    }

    #[derive(Default)]
    struct FakeMicrophone {
        failure: Option<DeviceError>,
        acquired: usize,
    }

    #[async_trait(?Send)]
    impl Microphone for FakeMicrophone {
        type Stream = FakeStream;

        async fn acquire(&mut self) -> Result<FakeStream, DeviceError> {
            if let Some(e) = self.failure.clone() {
                return Err(e);
            }
            self.acquired += 1;
            Ok(FakeStream {
                pending: VecDeque::from(vec![vec![100; 64], vec![-100; 64], vec![7; 3]]),
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        recordings: Vec<Recording>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl RecordingStore for MemoryStore {
        fn try_load(&mut self) -> Result<Vec<Recording>, StorageError> {
            if self.fail_reads {
                return Err(StorageError::Io(std::io::Error::other("unreadable")));
            }
            Ok(self.recordings.clone())
        }

        fn save_all(&mut self, recordings: &[Recording]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.recordings = recordings.to_vec();
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePresenter {
        recording: bool,
        elapsed: String,
        halts: usize,
        listed: Vec<RecordingId>,
        errors: Vec<String>,
        clears: usize,
        frames: usize,
    }

    impl WaveformSurface for FakePresenter {
        fn size(&self) -> (f32, f32) {
            (300.0, 150.0)
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn fill_ribbon(&mut self, _outline: &[(f32, f32)]) {
            self.frames += 1;
        }
    }

    impl Presenter for FakePresenter {
        fn set_recording(&mut self, recording: bool) {
            self.recording = recording;
        }

        fn show_elapsed(&mut self, label: &str) {
            self.elapsed = label.to_string();
        }

        fn halt_playback(&mut self) {
            self.halts += 1;
        }

        fn render_recording(&mut self, recording: &Recording) {
            self.listed.push(recording.id);
        }

        fn remove_recording(&mut self, id: RecordingId) {
            self.listed.retain(|&listed| listed != id);
        }

        fn show_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    type TestController = SessionController<FakeMicrophone, MemoryStore, FakePresenter>;

    fn controller_with(recordings: Vec<Recording>) -> TestController {
        SessionController::new(
            FakeMicrophone::default(),
            MemoryStore {
                recordings,
                ..MemoryStore::default()
            },
            FakePresenter::default(),
            60,
        )
    }

    fn decode(bytes: &[u8]) -> Vec<i16> {
        hound::WavReader::new(Cursor::new(bytes))
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_toggle_alternates_states() {
        let mut controller = controller_with(Vec::new());

        for _ in 0..3 {
            assert_eq!(controller.toggle().await, SessionState::Recording);
            assert!(controller.presenter().recording);
            assert_eq!(controller.toggle().await, SessionState::Idle);
            assert!(!controller.presenter().recording);
        }
        assert_eq!(controller.store.recordings.len(), 3);
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_a_no_op() {
        let mut controller = controller_with(vec![sample_recording(1, "00:01")]);

        assert!(controller.stop().await.is_none());
        assert!(controller.stop().await.is_none());
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.store.recordings.len(), 1);

        controller.start().await.unwrap();
        assert!(controller.stop().await.is_some());
        assert!(controller.stop().await.is_none());
        assert_eq!(controller.store.recordings.len(), 2);
        assert_eq!(controller.presenter().clears, 1);
    }

    #[tokio::test]
    async fn test_five_ticks_produce_a_five_second_recording() {
        let mut controller = controller_with(vec![
            sample_recording(1, "00:01"),
            sample_recording(2, "00:02"),
        ]);
        controller.restore();

        controller.start().await.unwrap();
        assert_eq!(controller.presenter().elapsed, "00:00");
        for _ in 0..5 {
            controller.on_tick();
        }
        assert_eq!(controller.presenter().elapsed, "00:05");

        let recording = controller.stop().await.unwrap();

        assert_eq!(recording.duration_label, "00:05");
        assert_eq!(controller.store.recordings.len(), 3);
        assert_eq!(controller.store.recordings.last(), Some(&recording));
        assert_eq!(
            controller.presenter().listed,
            vec![RecordingId(1), RecordingId(2), recording.id]
        );
        assert!(recording.id > RecordingId(2));
    }

    #[tokio::test]
    async fn test_payload_holds_every_captured_sample() {
        let mut controller = controller_with(Vec::new());

        controller.start().await.unwrap();
        controller.on_frame();
        controller.on_frame();
        let recording = controller.stop().await.unwrap();

        let samples = decode(&recording.audio);
        let mut expected = vec![100; 64];
        expected.extend(vec![-100; 64]);
        expected.extend(vec![7; 3]);
        assert_eq!(samples, expected);
        assert_eq!(controller.presenter().frames, 2);
    }

    #[tokio::test]
    async fn test_acquisition_failure_stays_idle() {
        let mut controller = controller_with(Vec::new());
        controller.microphone.failure = Some(DeviceError::NotAllowed("denied".into()));

        assert_eq!(controller.toggle().await, SessionState::Idle);
        assert!(!controller.presenter().recording);
        assert_eq!(controller.presenter().halts, 0);
        assert_eq!(controller.presenter().errors.len(), 1);
        assert!(controller.presenter().errors[0].starts_with("NotAllowedError"));

        controller.microphone.failure = None;
        assert_eq!(controller.toggle().await, SessionState::Recording);
        assert_eq!(controller.microphone.acquired, 1);
    }

    #[tokio::test]
    async fn test_start_halts_playback_and_ignores_second_start() {
        let mut controller = controller_with(Vec::new());

        controller.start().await.unwrap();
        controller.start().await.unwrap();

        assert_eq!(controller.presenter().halts, 1);
        assert_eq!(controller.microphone.acquired, 1);
    }

    #[tokio::test]
    async fn test_restore_renders_in_persisted_order() {
        let mut controller = controller_with(vec![
            sample_recording(30, "00:30"),
            sample_recording(10, "00:10"),
            sample_recording(20, "00:20"),
        ]);

        assert_eq!(controller.restore(), 3);
        assert_eq!(
            controller.presenter().listed,
            vec![RecordingId(30), RecordingId(10), RecordingId(20)]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let mut controller = controller_with(vec![
            sample_recording(1, "00:01"),
            sample_recording(2, "00:02"),
            sample_recording(3, "00:03"),
        ]);
        controller.restore();

        assert!(controller.delete(RecordingId(2)));
        assert!(!controller.delete(RecordingId(2)));

        let ids: Vec<i64> = controller.store.recordings.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(controller.presenter().listed, vec![RecordingId(1), RecordingId(3)]);
    }

    #[tokio::test]
    async fn test_delete_refused_while_recording() {
        let mut controller = controller_with(vec![sample_recording(1, "00:01")]);

        controller.start().await.unwrap();
        assert!(!controller.delete(RecordingId(1)));
        controller.stop().await;
        assert!(controller.delete(RecordingId(1)));
    }

    #[tokio::test]
    async fn test_failed_write_is_surfaced() {
        let mut controller = controller_with(Vec::new());
        controller.store.fail_writes = true;

        controller.start().await.unwrap();
        let recording = controller.stop().await.unwrap();

        assert!(controller.store.recordings.is_empty());
        assert_eq!(controller.presenter().listed, vec![recording.id]);
        assert_eq!(controller.presenter().errors.len(), 1);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_unsaved_recording_can_be_deleted_from_the_list() {
        let mut controller = controller_with(vec![sample_recording(1, "00:01")]);
        controller.restore();
        controller.store.fail_writes = true;

        controller.start().await.unwrap();
        let recording = controller.stop().await.unwrap();
        assert_eq!(controller.presenter().listed, vec![RecordingId(1), recording.id]);

        controller.store.fail_writes = false;
        controller.delete(recording.id);

        assert_eq!(controller.presenter().listed, vec![RecordingId(1)]);
        assert_eq!(controller.store.recordings, vec![sample_recording(1, "00:01")]);
    }

    #[tokio::test]
    async fn test_unreadable_store_is_not_overwritten() {
        let mut controller = controller_with(vec![sample_recording(1, "00:01")]);
        controller.store.fail_reads = true;

        controller.start().await.unwrap();
        let recording = controller.stop().await.unwrap();

        assert_eq!(controller.store.recordings, vec![sample_recording(1, "00:01")]);
        assert_eq!(controller.presenter().listed, vec![recording.id]);
        assert_eq!(controller.presenter().errors.len(), 1);

        assert!(!controller.delete(RecordingId(1)));
        assert_eq!(controller.store.recordings.len(), 1);
        assert_eq!(controller.presenter().errors.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedules_drive_ticks_and_frames() {
        let mut controller = controller_with(Vec::new());
        controller.start().await.unwrap();

        let mut ticks = 0;
        let mut frames = 0;
        while ticks < 2 {
            let event = controller.next_event().await;
            match event {
                SessionEvent::Tick => ticks += 1,
                SessionEvent::Frame => frames += 1,
            }
            controller.handle_event(event);
        }

        assert_eq!(controller.presenter().elapsed, "00:02");
        assert!(frames >= 100, "expected about 120 frames, got {frames}");

        controller.stop().await;
        let idle = tokio::time::timeout(Duration::from_secs(3), controller.next_event()).await;
        assert!(idle.is_err());
    }
}
