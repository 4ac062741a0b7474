//! Frequency analysis of live microphone input.
//!
//! Produces byte-scaled frequency magnitudes the same way a Web Audio
//! analyser node does: Blackman window, forward FFT, temporal smoothing, then
//! a linear map of the decibel range onto `0..=255`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of time-domain samples per analysis frame.
pub const FFT_SIZE: usize = 256;

const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Rolling-window FFT analyser.
pub struct FrequencyAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    recent: VecDeque<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl FrequencyAnalyser {
    /// Creates an analyser with an empty (silent) input window.
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            fft,
            window: blackman_window(FFT_SIZE),
            recent: VecDeque::from(vec![0.0; FFT_SIZE]),
            smoothed: vec![0.0; FFT_SIZE / 2],
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
        }
    }

    /// Number of frequency bins produced by [`Self::byte_frequency_data`].
    pub fn bin_count(&self) -> usize {
        FFT_SIZE / 2
    }

    /// Feeds freshly captured mono samples into the rolling window.
    pub fn push_samples(&mut self, samples: &[i16]) {
        let skip = samples.len().saturating_sub(FFT_SIZE);
        for &sample in &samples[skip..] {
            self.recent.pop_front();
            self.recent.push_back(sample as f32 / 32768.0);
        }
    }

    /// Writes the current magnitudes, one byte per bin, into `out`.
    ///
    /// `out` is resized to [`Self::bin_count`].
    pub fn byte_frequency_data(&mut self, out: &mut Vec<u8>) {
        for ((slot, &sample), &weight) in self
            .scratch
            .iter_mut()
            .zip(self.recent.iter())
            .zip(self.window.iter())
        {
            *slot = Complex::new(sample * weight, 0.0);
        }

        self.fft.process(&mut self.scratch);

        let scale = 1.0 / FFT_SIZE as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;

        out.clear();
        for (bin, previous) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[bin].norm() * scale;
            *previous =
                SMOOTHING_TIME_CONSTANT * *previous + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;

            let db = if *previous > 0.0 {
                20.0 * previous.log10()
            } else {
                f32::NEG_INFINITY
            };

            let scaled = (255.0 / range * (db - MIN_DECIBELS)).clamp(0.0, 255.0);
            out.push(scaled as u8);
        }
    }
}

impl Default for FrequencyAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic mean of all frequency bins, the instantaneous volume measure.
pub fn mean_volume(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / bins.len() as f32
}

fn blackman_window(size: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42, 0.5, 0.08);
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate;
                ((2.0 * std::f32::consts::PI * freq_hz * t).sin() * amplitude * 32767.0) as i16
            })
            .collect()
    }

    #[test]
    fn test_silence_yields_zero_bins() {
        let mut analyser = FrequencyAnalyser::new();
        analyser.push_samples(&[0; FFT_SIZE]);

        let mut bins = Vec::new();
        analyser.byte_frequency_data(&mut bins);

        assert_eq!(bins.len(), analyser.bin_count());
        assert!(bins.iter().all(|&b| b == 0));
        assert_eq!(mean_volume(&bins), 0.0);
    }

    #[test]
    fn test_tone_raises_mean_volume() {
        let mut analyser = FrequencyAnalyser::new();
        let tone = sine(1000.0, 48000.0, FFT_SIZE * 4, 0.8);

        let mut bins = Vec::new();
        for chunk in tone.chunks(FFT_SIZE) {
            analyser.push_samples(chunk);
            analyser.byte_frequency_data(&mut bins);
        }

        assert!(mean_volume(&bins) > 0.0);
        let peak = bins.iter().copied().max().unwrap_or(0);
        assert!(peak > 100, "expected a strong bin, got {peak}");
    }

    #[test]
    fn test_mean_volume() {
        assert_eq!(mean_volume(&[]), 0.0);
        assert_eq!(mean_volume(&[10, 20, 30]), 20.0);
        assert_eq!(mean_volume(&[255; 128]), 255.0);
    }
}
