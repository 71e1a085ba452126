//! # Configuration Module
//!
//! Tunable parameters for the transcription pipeline. Every field has a
//! default matching the reference behaviour, so `TranscriberConfig::default()`
//! is what the application runs with unless a config file overrides it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScribeError};

/// Transcription configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Reference tuning for A4 in Hz (default: 440.0)
    pub reference_frequency: f32,

    /// Lowest octave accepted by the classifier (default: 3)
    pub min_octave: i32,

    /// Highest octave accepted by the classifier (default: 6)
    pub max_octave: i32,

    /// Consecutive identical frames required before a note counts as stable (default: 5)
    pub stability_threshold: u32,

    /// Held notes at or below this many seconds are dropped as noise (default: 0.1)
    pub min_note_seconds: f64,

    /// RMS below which a frame is treated as silence (default: 0.01)
    pub amplitude_threshold: f32,

    /// Samples per analysis frame (default: 2048)
    pub frame_size: usize,

    /// Preferred capture sample rate in Hz (default: 44100)
    pub sample_rate: u32,

    /// Refine YIN estimates against the FFT magnitude spectrum (default: true)
    pub refine_with_spectrum: bool,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            reference_frequency: 440.0,
            min_octave: 3,
            max_octave: 6,
            stability_threshold: 5,
            min_note_seconds: 0.1,
            amplitude_threshold: 0.01,
            frame_size: 2048,
            sample_rate: 44100,
            refine_with_spectrum: true,
        }
    }
}

impl TranscriberConfig {
    /// Checks that every value is usable by the pipeline.
    pub fn validate(&self) -> Result<()> {
        if !(self.reference_frequency.is_finite() && self.reference_frequency > 0.0) {
            return Err(ScribeError::InvalidConfig(format!(
                "reference_frequency must be positive, got {}",
                self.reference_frequency
            )));
        }
        if self.min_octave > self.max_octave {
            return Err(ScribeError::InvalidConfig(format!(
                "min_octave {} is above max_octave {}",
                self.min_octave, self.max_octave
            )));
        }
        if !(-1..=9).contains(&self.min_octave) || !(-1..=9).contains(&self.max_octave) {
            return Err(ScribeError::InvalidConfig(
                "octave range must lie within the MIDI range (-1..=9)".to_string(),
            ));
        }
        if !(self.min_note_seconds.is_finite() && self.min_note_seconds >= 0.0) {
            return Err(ScribeError::InvalidConfig(format!(
                "min_note_seconds must be non-negative, got {}",
                self.min_note_seconds
            )));
        }
        if self.frame_size < 64 {
            return Err(ScribeError::InvalidConfig(format!(
                "frame_size must be at least 64 samples, got {}",
                self.frame_size
            )));
        }
        if self.sample_rate == 0 {
            return Err(ScribeError::InvalidConfig("sample_rate must be non-zero".to_string()));
        }
        Ok(())
    }
}
