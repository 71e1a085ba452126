// scribe-core/src/lib.rs

//! The core logic for the melody scribe.
//! This crate turns a live audio stream into a melody of quantized notes:
//! capture, pitch detection, note classification, debouncing, note boundary
//! tracking and duration quantization, plus the staff layout the GUI draws.
//! It is completely headless and contains no GUI code.

pub mod audio;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fft;
pub mod melody;
pub mod pitch;
pub mod rhythm;
pub mod score;
pub mod tracker;
pub mod transcriber;
pub mod tuning;

pub use audio::{AnalysisWindow, AudioFrame, CaptureEvent};
pub use config::TranscriberConfig;
pub use error::ScribeError;
pub use melody::{FinishedNote, Melody, NotationEntry};
pub use pitch::{FrequencyEstimator, YinEstimator};
pub use rhythm::RhythmicSymbol;
pub use tracker::TrackerState;
pub use transcriber::{FrameReport, ScribeSession, Transcriber};
pub use tuning::{NoteIdentity, PitchClass};
