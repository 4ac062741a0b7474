//! Live waveform rendering.
//!
//! Each frame turns the analyser's mean volume into a smoothed amplitude and
//! paints a filled sine ribbon that travels horizontally as `phase` advances.

use super::analyser::{mean_volume, FrequencyAnalyser};
use super::schedule::Repeating;

/// Exponential smoothing factor applied to the instantaneous volume.
pub const SMOOTHING_FACTOR: f32 = 0.1;
/// Horizontal travel of the wave per frame.
pub const PHASE_STEP: f32 = 2.0;
/// Angular frequency of the wave per horizontal unit.
pub const WAVE_FREQUENCY: f32 = 0.02;

/// Drawing target for the waveform ribbon.
///
/// Coordinates follow canvas conventions: `(0, 0)` is the top-left corner and
/// `y` grows downwards.
pub trait WaveformSurface {
    /// Logical `(width, height)` of the drawing area.
    fn size(&self) -> (f32, f32);

    /// Erases everything drawn so far.
    fn clear(&mut self);

    /// Fills the closed polygon `outline`.
    fn fill_ribbon(&mut self, outline: &[(f32, f32)]);
}

/// Per-frame amplitude tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmplitudeState {
    /// Exponentially smoothed volume, never negative for non-negative input
    pub smoothed_volume: f32,
    /// Horizontal offset of the wave
    pub phase: f32,
}

impl AmplitudeState {
    /// Moves the smoothed volume a fixed fraction towards `instantaneous`.
    pub fn smooth(&mut self, instantaneous: f32) -> f32 {
        self.smoothed_volume += (instantaneous - self.smoothed_volume) * SMOOTHING_FACTOR;
        self.smoothed_volume
    }

    /// Advances the wave by one frame.
    pub fn advance(&mut self) {
        self.phase += PHASE_STEP;
    }
}

/// Visual deflection for a smoothed volume, capped so the wave stays inside
/// a canvas of `height`.
pub fn clamp_amplitude(smoothed_volume: f32, height: f32) -> f32 {
    (smoothed_volume / 2.0).min(height / 2.5)
}

/// Builds the closed ribbon outline for one frame.
///
/// The top edge samples the sine wave at every integer `x` from `0` to
/// `width`; the outline then runs down to the bottom-right corner and back to
/// the bottom-left corner.
pub fn ribbon_outline(width: f32, height: f32, phase: f32, amplitude: f32) -> Vec<(f32, f32)> {
    let mid = height / 2.0;
    let columns = width.max(0.0) as usize;

    let mut outline = Vec::with_capacity(columns + 4);
    outline.push((0.0, mid));
    for x in 0..=columns {
        let x = x as f32;
        let y = mid + ((x + phase) * WAVE_FREQUENCY).sin() * amplitude;
        outline.push((x, y));
    }
    outline.push((width, height));
    outline.push((0.0, height));
    outline
}

/// Owns the frame loop and the amplitude state of the active session.
pub struct WaveformRenderer {
    frames: Repeating,
    state: AmplitudeState,
    bins: Vec<u8>,
}

impl WaveformRenderer {
    /// Creates an idle renderer that will redraw `fps` times a second.
    pub fn new(fps: u32) -> Self {
        Self {
            frames: Repeating::per_second(fps),
            state: AmplitudeState::default(),
            bins: Vec::new(),
        }
    }

    /// Resets the amplitude state and arms the frame loop.
    pub fn start(&mut self) {
        self.state = AmplitudeState::default();
        self.frames.start();
        tracing::debug!(
            "Waveform loop started ({:?} per frame)",
            self.frames.period()
        );
    }

    /// Disarms the frame loop and clears the surface.
    ///
    /// Only the call that actually stops a running loop touches the surface.
    pub fn cancel(&mut self, surface: &mut impl WaveformSurface) -> bool {
        if !self.frames.cancel() {
            return false;
        }
        surface.clear();
        tracing::debug!("Waveform loop cancelled");
        true
    }

    /// Returns whether the frame loop is armed.
    pub fn is_running(&self) -> bool {
        self.frames.is_running()
    }

    /// Waits for the next frame. Pending forever while idle.
    pub async fn next_frame(&mut self) {
        self.frames.next().await;
    }

    /// Current amplitude state.
    pub fn state(&self) -> AmplitudeState {
        self.state
    }

    /// Samples the analyser and paints one frame. Returns the amplitude drawn.
    pub fn draw_frame(
        &mut self,
        analyser: &mut FrequencyAnalyser,
        surface: &mut impl WaveformSurface,
    ) -> f32 {
        analyser.byte_frequency_data(&mut self.bins);
        let volume = self.state.smooth(mean_volume(&self.bins));

        let (width, height) = surface.size();
        let amplitude = clamp_amplitude(volume, height);

        surface.clear();
        surface.fill_ribbon(&ribbon_outline(width, height, self.state.phase, amplitude));

        self.state.advance();
        amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        clears: usize,
        ribbons: Vec<Vec<(f32, f32)>>,
    }

    impl WaveformSurface for RecordingSurface {
        fn size(&self) -> (f32, f32) {
            (300.0, 150.0)
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn fill_ribbon(&mut self, outline: &[(f32, f32)]) {
            self.ribbons.push(outline.to_vec());
        }
    }

    #[test]
    fn test_smoothing_converges_without_overshoot() {
        for target in [0.0_f32, 1.0, 37.5, 128.0, 255.0] {
            let mut state = AmplitudeState {
                smoothed_volume: 0.0,
                phase: 0.0,
            };
            let mut distance = (target - state.smoothed_volume).abs();
            for _ in 0..60 {
                let value = state.smooth(target);
                assert!(value <= target, "overshot {target}: {value}");
                assert!(value >= 0.0);
                let next = (target - value).abs();
                if distance > 0.0 {
                    assert!(next < distance);
                }
                distance = next;
            }
            assert!(distance < 0.01 * target.max(1.0));
        }
    }

    #[test]
    fn test_smoothing_decays_towards_lower_target() {
        let mut state = AmplitudeState {
            smoothed_volume: 100.0,
            phase: 0.0,
        };
        let first = state.smooth(0.0);
        assert!((first - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_amplitude_is_clamped() {
        for height in [0.0_f32, 10.0, 150.0, 1000.0] {
            for volume in [0.0_f32, 1.0, 50.0, 255.0, 10_000.0] {
                let amplitude = clamp_amplitude(volume, height);
                assert!(amplitude >= 0.0);
                assert!(amplitude <= height / 2.5);
            }
        }
        assert_eq!(clamp_amplitude(40.0, 150.0), 20.0);
        assert_eq!(clamp_amplitude(255.0, 150.0), 60.0);
    }

    #[test]
    fn test_ribbon_outline_shape() {
        let outline = ribbon_outline(10.0, 20.0, 0.0, 0.0);
        assert_eq!(outline.len(), 11 + 3);
        assert_eq!(outline[0], (0.0, 10.0));
        assert!(outline[1..12].iter().all(|&(_, y)| y == 10.0));
        assert_eq!(outline[12], (10.0, 20.0));
        assert_eq!(outline[13], (0.0, 20.0));
    }

    #[test]
    fn test_ribbon_follows_phase() {
        let outline = ribbon_outline(300.0, 150.0, 50.0, 30.0);
        let (_, y) = outline[1];
        let expected = 75.0 + (50.0_f32 * WAVE_FREQUENCY).sin() * 30.0;
        assert!((y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_draw_frame_advances_phase() {
        let mut renderer = WaveformRenderer::new(60);
        let mut analyser = FrequencyAnalyser::new();
        let mut surface = RecordingSurface::default();

        let amplitude = renderer.draw_frame(&mut analyser, &mut surface);
        renderer.draw_frame(&mut analyser, &mut surface);

        assert_eq!(amplitude, 0.0);
        assert_eq!(renderer.state().phase, 2.0 * PHASE_STEP);
        assert_eq!(surface.clears, 2);
        assert_eq!(surface.ribbons.len(), 2);
        assert_eq!(surface.ribbons[0].len(), 301 + 3);
    }

    #[tokio::test]
    async fn test_cancel_clears_once() {
        let mut renderer = WaveformRenderer::new(60);
        let mut surface = RecordingSurface::default();

        renderer.start();
        assert!(renderer.is_running());
        assert!(renderer.cancel(&mut surface));
        assert!(!renderer.cancel(&mut surface));
        assert_eq!(surface.clears, 1);
        assert!(!renderer.is_running());
    }
}
