//! # Fast Fourier Transform (FFT) Module
//!
//! Magnitude spectrum of an analysis frame, used to sharpen the YIN
//! estimate to sub-bin accuracy.
//!
//! ## Features
//! - Forward FFT using RustFFT, planned per frame length
//! - Hann windowing for reduced spectral leakage
//! - DC offset removal

use rustfft::{FftPlanner, num_complex::Complex};

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window in place.
fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 { return; }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Reusable forward FFT for one frame length.
///
/// The plan is built once and kept, since the transcriber runs the same
/// frame size every tick.
pub struct SpectrumAnalyzer {
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    size: usize,
    scratch: Vec<Complex<f32>>,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer").field("size", &self.size).finish()
    }
}

impl SpectrumAnalyzer {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            fft,
            size,
            scratch: Vec::with_capacity(size),
        }
    }

    /// Magnitude spectrum up to Nyquist (`size / 2` bins).
    ///
    /// Returns `None` when the signal length does not match the planned size.
    pub fn magnitudes(&mut self, signal: &[f32]) -> Option<Vec<f32>> {
        if signal.len() != self.size || self.size == 0 {
            return None;
        }

        let mut processed_signal = signal.to_vec();
        remove_dc_offset(&mut processed_signal);
        apply_hann_window(&mut processed_signal);

        self.scratch.clear();
        self.scratch.extend(
            processed_signal
                .into_iter()
                .map(|sample| Complex { re: sample, im: 0.0 }),
        );
        self.fft.process(&mut self.scratch);

        Some(
            self.scratch
                .iter()
                .take(self.size / 2)
                .map(|c| c.norm())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_bin_of_sine() {
        let size = 1024;
        let sample_rate = 8192.0;
        // 512 Hz lands exactly on bin 64.
        let signal: Vec<f32> = (0..size)
            .map(|i| (2.0 * std::f32::consts::PI * 512.0 * i as f32 / sample_rate).sin())
            .collect();
        let mut analyzer = SpectrumAnalyzer::new(size);
        let mags = analyzer.magnitudes(&signal).unwrap();
        assert_eq!(mags.len(), size / 2);
        let peak = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 64);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let mut analyzer = SpectrumAnalyzer::new(256);
        assert!(analyzer.magnitudes(&[0.0; 100]).is_none());
    }

    #[test]
    fn test_dc_offset_removed() {
        let mut signal = vec![1.0_f32; 16];
        remove_dc_offset(&mut signal);
        assert!(signal.iter().all(|s| s.abs() < 1e-6));
    }
}
