//! # Pitch Detection Module
//!
//! The frequency estimator behind the transcriber. The core only talks to it
//! through [`FrequencyEstimator`]: one frame of samples in, a fundamental
//! frequency or "no pitch" out. Threshold tuning stays inside the estimator.
//!
//! ## Features
//! - YIN pitch detection with an RMS noise gate
//! - Absolute-threshold dip search to avoid octave errors
//! - Parabolic interpolation for sub-sample accuracy
//! - Optional spectrum refinement against the FFT magnitudes

use crate::config::TranscriberConfig;
use crate::fft::SpectrumAnalyzer;

/// Boundary between the transcriber and whatever detects pitch.
pub trait FrequencyEstimator {
    /// Returns the fundamental frequency in Hz, or `None` when the frame holds
    /// silence, noise, or nothing periodic.
    fn estimate(&mut self, samples: &[f32], sample_rate: u32) -> Option<f32>;
}

impl<F> FrequencyEstimator for F
where
    F: FnMut(&[f32], u32) -> Option<f32>,
{
    fn estimate(&mut self, samples: &[f32], sample_rate: u32) -> Option<f32> {
        self(samples, sample_rate)
    }
}

/// Default YIN dip threshold.
pub const YIN_THRESHOLD: f32 = 0.15;
/// Lowest frequency the estimator searches for.
pub const MIN_FREQUENCY: f32 = 60.0;
/// Highest frequency the estimator searches for.
pub const MAX_FREQUENCY: f32 = 2500.0;

/// YIN estimator with reusable buffers.
#[derive(Debug)]
pub struct YinEstimator {
    threshold: f32,
    amplitude_threshold: f32,
    min_frequency: f32,
    max_frequency: f32,
    difference: Vec<f32>,
    spectrum: Option<SpectrumAnalyzer>,
}

impl Default for YinEstimator {
    fn default() -> Self {
        Self::from_config(&TranscriberConfig::default())
    }
}

impl YinEstimator {
    pub fn from_config(config: &TranscriberConfig) -> Self {
        Self {
            threshold: YIN_THRESHOLD,
            amplitude_threshold: config.amplitude_threshold,
            min_frequency: MIN_FREQUENCY,
            max_frequency: MAX_FREQUENCY,
            difference: Vec::with_capacity(config.frame_size / 2),
            spectrum: config
                .refine_with_spectrum
                .then(|| SpectrumAnalyzer::new(config.frame_size)),
        }
    }

    /// Runs YIN on one frame without spectrum refinement.
    fn detect(&mut self, signal: &[f32], sample_rate: u32) -> Option<f32> {
        let half = signal.len() / 2;
        if half < 4 || sample_rate == 0 {
            return None;
        }

        // Noise gate
        let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt();
        if rms < self.amplitude_threshold {
            return None;
        }

        let rate = sample_rate as f32;
        let tau_min = ((rate / self.max_frequency).floor() as usize).max(2);
        let tau_max = ((rate / self.min_frequency).ceil() as usize).min(half - 1);
        if tau_min >= tau_max {
            return None;
        }

        // Difference function
        let d = &mut self.difference;
        d.clear();
        d.resize(half, 0.0);
        for tau in 1..half {
            d[tau] = signal[..half]
                .iter()
                .zip(&signal[tau..tau + half])
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
        }

        // Cumulative mean normalized difference
        d[0] = 1.0;
        let mut running_sum = 0.0;
        for tau in 1..half {
            running_sum += d[tau];
            d[tau] = if running_sum > 0.0 { d[tau] * tau as f32 / running_sum } else { 1.0 };
        }

        // First dip under the threshold, then slide to its local minimum.
        let mut period = None;
        let mut tau = tau_min;
        while tau < tau_max {
            if d[tau] < self.threshold {
                while tau + 1 < tau_max && d[tau + 1] < d[tau] {
                    tau += 1;
                }
                period = Some(tau);
                break;
            }
            tau += 1;
        }
        let period = period?;

        let (y1, y2, y3) = (d[period - 1], d[period], d[period + 1]);
        let curvature = y1 - 2.0 * y2 + y3;
        let period_float = if curvature.abs() > f32::EPSILON {
            period as f32 + (y1 - y3) / (2.0 * curvature)
        } else {
            period as f32
        };

        let frequency = rate / period_float;
        if frequency.is_finite() && frequency >= self.min_frequency && frequency <= self.max_frequency {
            Some(frequency)
        } else {
            None
        }
    }
}

impl FrequencyEstimator for YinEstimator {
    fn estimate(&mut self, samples: &[f32], sample_rate: u32) -> Option<f32> {
        let rough = self.detect(samples, sample_rate)?;
        let refined = self
            .spectrum
            .as_mut()
            .and_then(|spectrum| spectrum.magnitudes(samples))
            .and_then(|mags| refine_from_spectrum(&mags, rough, sample_rate));
        Some(refined.unwrap_or(rough))
    }
}

/// Refines a frequency estimate using a pre-computed magnitude spectrum.
///
/// Looks for the strongest bin within two bins of the rough estimate and
/// interpolates a parabola through the log magnitudes around it.
///
/// # Arguments
/// * `spectrum_magnitudes` - Magnitudes up to Nyquist (FFT size / 2 bins)
/// * `rough_freq` - Time-domain estimate in Hz
/// * `sample_rate` - Sample rate of the analysed frame
///
/// # Returns
/// `None` for unusable input. Otherwise the refined frequency, or
/// `rough_freq` itself when the neighbourhood is unusable or the refinement
/// strays half a bin or more from it.
pub fn refine_from_spectrum(
    spectrum_magnitudes: &[f32],
    rough_freq: f32,
    sample_rate: u32,
) -> Option<f32> {
    if rough_freq <= 0.0 || spectrum_magnitudes.len() < 3 || sample_rate == 0 {
        return None;
    }
    let fft_size = spectrum_magnitudes.len() * 2;
    let bin_hz = sample_rate as f32 / fft_size as f32;
    let target_bin = rough_freq / bin_hz;
    let last_bin = (spectrum_magnitudes.len() - 1) as f32;
    let start_bin = (target_bin - 2.0).max(0.0) as usize;
    let end_bin = (target_bin + 2.0).min(last_bin) as usize;
    if start_bin >= end_bin {
        return Some(rough_freq);
    }

    let peak_bin = spectrum_magnitudes[start_bin..=end_bin]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(offset, _)| start_bin + offset)?;

    if peak_bin == 0 || peak_bin >= spectrum_magnitudes.len() - 1 {
        return Some(rough_freq);
    }

    let y1 = spectrum_magnitudes[peak_bin - 1].ln();
    let y2 = spectrum_magnitudes[peak_bin].ln();
    let y3 = spectrum_magnitudes[peak_bin + 1].ln();
    if !(y1.is_finite() && y2.is_finite() && y3.is_finite()) {
        return Some(rough_freq);
    }

    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-6 {
        return Some(rough_freq);
    }

    let interpolated_bin = peak_bin as f32 + (y3 - y1) / (2.0 * denominator);
    let refined = interpolated_bin * bin_hz;
    // Only accept a refinement that stays near the time-domain estimate.
    if refined.is_finite() && refined > 0.0 && (refined - rough_freq).abs() < bin_hz * 0.5 {
        Some(refined)
    } else {
        Some(rough_freq)
    }
}
