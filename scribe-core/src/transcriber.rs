//! # Transcriber Module
//!
//! Per-frame pipeline: estimate → classify → debounce → track.
//! A [`Transcriber`] holds all cross-frame state for one recording session;
//! building a new one is how a session starts from scratch.

use crate::audio::AudioFrame;
use crate::config::TranscriberConfig;
use crate::debounce::StabilityDebouncer;
use crate::melody::{FinishedNote, Melody};
use crate::pitch::{FrequencyEstimator, YinEstimator};
use crate::tracker::{NoteTracker, TrackerState};
use crate::tuning::{self, NoteIdentity, PitchClassifier};

/// What one frame produced, for the live readout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub frequency: Option<f32>,
    pub raw_note: Option<NoteIdentity>,
    pub stable_note: Option<NoteIdentity>,
    pub finished: Option<FinishedNote>,
}

impl FrameReport {
    /// Deviation of the estimate from the stable note, in cents.
    pub fn cents(&self, reference_frequency: f32) -> Option<f32> {
        let note = self.stable_note?;
        let frequency = self.frequency?;
        Some(tuning::calculate_cents_deviation(
            frequency,
            note.frequency(reference_frequency),
        ))
    }
}

#[derive(Debug)]
pub struct Transcriber<E: FrequencyEstimator> {
    estimator: E,
    classifier: PitchClassifier,
    debouncer: StabilityDebouncer,
    tracker: NoteTracker,
}

impl Transcriber<YinEstimator> {
    /// Transcriber backed by the built-in YIN estimator.
    pub fn with_yin(config: &TranscriberConfig) -> Self {
        Self::new(YinEstimator::from_config(config), config)
    }
}

impl<E: FrequencyEstimator> Transcriber<E> {
    pub fn new(estimator: E, config: &TranscriberConfig) -> Self {
        Self {
            estimator,
            classifier: PitchClassifier::from_config(config),
            debouncer: StabilityDebouncer::new(config.stability_threshold),
            tracker: NoteTracker::new(config.min_note_seconds),
        }
    }

    /// Runs one frame through the pipeline.
    pub fn process_frame(&mut self, frame: &AudioFrame) -> FrameReport {
        let frequency = self.estimator.estimate(&frame.samples, frame.sample_rate);
        self.process_frequency(frequency, frame.timestamp)
    }

    /// Pipeline from an already-estimated frequency onward.
    pub fn process_frequency(&mut self, frequency: Option<f32>, now: f64) -> FrameReport {
        let raw_note = self.classifier.classify(frequency);
        let stable_note = self.debouncer.update(raw_note);
        let finished = self.tracker.update(stable_note, now);
        FrameReport {
            frequency,
            raw_note,
            stable_note,
            finished,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn stable_note(&self) -> Option<NoteIdentity> {
        self.debouncer.stable()
    }

    /// Clears debouncer and tracker; a held note is discarded, not emitted.
    pub fn reset(&mut self) {
        if let Some(held) = self.tracker.reset() {
            log::debug!("Discarding held note {} on reset", held.identity);
        }
        self.debouncer.reset();
    }
}

/// The melody plus the transcriber of the recording in progress, if any.
///
/// The melody outlives recordings: stopping drops the transcriber (and any
/// note still sounding) but keeps every finished note. Only [`reset`]
/// empties the melody.
///
/// [`reset`]: ScribeSession::reset
#[derive(Debug)]
pub struct ScribeSession<E: FrequencyEstimator> {
    transcriber: Option<Transcriber<E>>,
    melody: Melody,
}

impl<E: FrequencyEstimator> Default for ScribeSession<E> {
    fn default() -> Self {
        Self {
            transcriber: None,
            melody: Melody::new(),
        }
    }
}

impl<E: FrequencyEstimator> ScribeSession<E> {
    /// A session that is already recording with `transcriber`.
    pub fn new(transcriber: Transcriber<E>) -> Self {
        let mut session = Self::default();
        session.start(transcriber);
        session
    }

    /// Begins a recording with fresh per-session state.
    pub fn start(&mut self, transcriber: Transcriber<E>) {
        if self.transcriber.replace(transcriber).is_some() {
            log::debug!("Replacing the transcriber of a running recording");
        }
    }

    /// Ends the recording. A note still sounding is dropped, not flushed.
    pub fn stop(&mut self) {
        if let Some(transcriber) = self.transcriber.take() {
            if let TrackerState::Holding(held) = transcriber.state() {
                log::debug!("Recording stopped while holding {}; not emitted", held.identity);
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Processes a frame and appends any finished note to the melody.
    /// Does nothing while stopped.
    pub fn process_frame(&mut self, frame: &AudioFrame) -> FrameReport {
        let report = match self.transcriber.as_mut() {
            Some(transcriber) => transcriber.process_frame(frame),
            None => return FrameReport::default(),
        };
        self.record(report)
    }

    pub fn process_frequency(&mut self, frequency: Option<f32>, now: f64) -> FrameReport {
        let report = match self.transcriber.as_mut() {
            Some(transcriber) => transcriber.process_frequency(frequency, now),
            None => return FrameReport::default(),
        };
        self.record(report)
    }

    fn record(&mut self, report: FrameReport) -> FrameReport {
        if let Some(note) = report.finished {
            self.melody.push(note);
        }
        report
    }

    pub fn melody(&self) -> &Melody {
        &self.melody
    }

    pub fn transcriber(&self) -> Option<&Transcriber<E>> {
        self.transcriber.as_ref()
    }

    /// Tracker state of the running recording; `Idle` while stopped.
    pub fn state(&self) -> TrackerState {
        self.transcriber
            .as_ref()
            .map_or(TrackerState::Idle, Transcriber::state)
    }

    /// Empties the melody and returns the tracker to idle.
    pub fn reset(&mut self) {
        self.melody.clear();
        if let Some(transcriber) = self.transcriber.as_mut() {
            transcriber.reset();
        }
    }
}
