//! # Musical Tuning Module
//!
//! Maps detected frequencies onto discrete note identities using equal
//! temperament around a reference A4, and converts identities to and from the
//! lowercase `"pitchclass/octave"` notation keys used by the score layout.
//!
//! ## Features
//! - Nearest-semitone classification with a playable octave filter
//! - Full MIDI (0-127) note table built once on first use
//! - Notation key parsing (`"c#/4"` → identity)
//! - Cent deviation for the live pitch readout

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::TranscriberConfig;
use crate::error::{Result, ScribeError};

/// MIDI number of the reference note A4.
pub const REFERENCE_MIDI: i32 = 69;

/// The twelve chromatic pitch classes, starting at C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Lowercase notation name ("c", "c#", ...).
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "c",
            PitchClass::CSharp => "c#",
            PitchClass::D => "d",
            PitchClass::DSharp => "d#",
            PitchClass::E => "e",
            PitchClass::F => "f",
            PitchClass::FSharp => "f#",
            PitchClass::G => "g",
            PitchClass::GSharp => "g#",
            PitchClass::A => "a",
            PitchClass::ASharp => "a#",
            PitchClass::B => "b",
        }
    }

    /// Semitones above C.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Position of the natural letter within the octave (C=0 .. B=6).
    /// Sharps share the letter of the natural below them.
    pub fn letter_index(self) -> i32 {
        match self {
            PitchClass::C | PitchClass::CSharp => 0,
            PitchClass::D | PitchClass::DSharp => 1,
            PitchClass::E => 2,
            PitchClass::F | PitchClass::FSharp => 3,
            PitchClass::G | PitchClass::GSharp => 4,
            PitchClass::A | PitchClass::ASharp => 5,
            PitchClass::B => 6,
        }
    }

    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            PitchClass::CSharp
                | PitchClass::DSharp
                | PitchClass::FSharp
                | PitchClass::GSharp
                | PitchClass::ASharp
        )
    }
}

/// A discrete note: pitch class plus octave (scientific pitch notation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteIdentity {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl NoteIdentity {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        Self { pitch_class, octave }
    }

    /// Builds the identity for a MIDI note number.
    ///
    /// Returns `None` above 127.
    pub fn from_midi(midi: u8) -> Option<Self> {
        NOTE_TABLE.get(midi as usize).copied()
    }

    /// MIDI note number; may fall outside 0-127 for hand-built identities.
    pub fn midi(&self) -> i32 {
        (self.octave + 1) * 12 + self.pitch_class.index() as i32
    }

    /// Notation key in lowercase, e.g. "c#/4".
    pub fn notation_key(&self) -> String {
        format!("{}/{}", self.pitch_class.name(), self.octave)
    }

    /// Equal-temperament frequency of this note for the given A4 reference.
    pub fn frequency(&self, reference_frequency: f32) -> f32 {
        reference_frequency * 2.0_f32.powf((self.midi() - REFERENCE_MIDI) as f32 / 12.0)
    }

    /// Diatonic step count from C0; used for vertical staff placement.
    pub fn diatonic_step(&self) -> i32 {
        self.octave * 7 + self.pitch_class.letter_index()
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.pitch_class.name();
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        write!(f, "{}", self.octave)
    }
}

/// Every MIDI note (0-127) as an identity, computed once.
static NOTE_TABLE: Lazy<Vec<NoteIdentity>> = Lazy::new(|| {
    (0..128u8)
        .map(|midi| NoteIdentity {
            pitch_class: PitchClass::ALL[(midi % 12) as usize],
            octave: (midi / 12) as i32 - 1,
        })
        .collect()
});

/// Notation key to MIDI number, for parsing keys handed to the score layout.
static KEY_MAP: Lazy<BTreeMap<String, u8>> = Lazy::new(|| {
    NOTE_TABLE
        .iter()
        .enumerate()
        .map(|(midi, note)| (note.notation_key(), midi as u8))
        .collect()
});

/// Parses a lowercase notation key such as "c#/4" into an identity.
/// Surrounding whitespace and uppercase letters are tolerated.
pub fn parse_notation_key(key: &str) -> Result<NoteIdentity> {
    let normalized = key.trim().to_ascii_lowercase();
    KEY_MAP
        .get(&normalized)
        .and_then(|&midi| NoteIdentity::from_midi(midi))
        .ok_or_else(|| ScribeError::UnknownKey(key.to_string()))
}

/// Maps frequencies to note identities with a playable-range filter.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchClassifier {
    reference_frequency: f32,
    min_octave: i32,
    max_octave: i32,
}

impl Default for PitchClassifier {
    fn default() -> Self {
        Self::from_config(&TranscriberConfig::default())
    }
}

impl PitchClassifier {
    pub fn from_config(config: &TranscriberConfig) -> Self {
        Self {
            reference_frequency: config.reference_frequency,
            min_octave: config.min_octave,
            max_octave: config.max_octave,
        }
    }

    /// Classifies a frequency estimate.
    ///
    /// Returns `None` for "no pitch", non-finite or non-positive input,
    /// MIDI numbers outside 0-127, and octaves outside the playable range.
    pub fn classify(&self, frequency: Option<f32>) -> Option<NoteIdentity> {
        let freq = frequency?;
        if !freq.is_finite() || freq <= 0.0 {
            return None;
        }

        let semitones = 12.0 * (freq as f64 / self.reference_frequency as f64).log2();
        // Ties round upward.
        let midi = (semitones + 0.5).floor() + REFERENCE_MIDI as f64;
        if !(0.0..=127.0).contains(&midi) {
            return None;
        }

        let note = NoteIdentity::from_midi(midi as u8)?;
        if note.octave < self.min_octave || note.octave > self.max_octave {
            return None;
        }
        Some(note)
    }
}

/// Classifies with the default reference (A4 = 440 Hz) and range (octaves 3-6).
pub fn classify(frequency: Option<f32>) -> Option<NoteIdentity> {
    static DEFAULT: Lazy<PitchClassifier> = Lazy::new(PitchClassifier::default);
    DEFAULT.classify(frequency)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat; 100 cents = 1 semitone.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pitch_is_a4() {
        let note = classify(Some(440.0)).unwrap();
        assert_eq!(note, NoteIdentity::new(PitchClass::A, 4));
        assert_eq!(note.notation_key(), "a/4");
        assert_eq!(note.midi(), 69);
    }

    #[test]
    fn test_nearest_semitone() {
        // Middle C is 261.63 Hz; a few cents off still lands on C4.
        assert_eq!(classify(Some(261.63)).unwrap().notation_key(), "c/4");
        assert_eq!(classify(Some(265.0)).unwrap().notation_key(), "c/4");
        // 277.18 Hz is C#4.
        assert_eq!(classify(Some(277.18)).unwrap().notation_key(), "c#/4");
        assert_eq!(classify(Some(1046.5)).unwrap().notation_key(), "c/6");
    }

    #[test]
    fn test_octave_range_filter() {
        // B2 (123.47 Hz) is below the playable range, C3 is the floor.
        assert_eq!(classify(Some(123.47)), None);
        assert_eq!(classify(Some(130.81)).unwrap().notation_key(), "c/3");
        // B6 is the ceiling, C7 (2093 Hz) is rejected.
        assert_eq!(classify(Some(1975.53)).unwrap().notation_key(), "b/6");
        assert_eq!(classify(Some(2093.0)), None);
    }

    #[test]
    fn test_silence_and_garbage_are_none() {
        assert_eq!(classify(None), None);
        assert_eq!(classify(Some(0.0)), None);
        assert_eq!(classify(Some(-440.0)), None);
        assert_eq!(classify(Some(f32::NAN)), None);
        assert_eq!(classify(Some(f32::INFINITY)), None);
        // Far beyond MIDI 127.
        assert_eq!(classify(Some(50_000.0)), None);
    }

    #[test]
    fn test_sweep_is_monotonic_without_octave_skips() {
        let mut last: Option<NoteIdentity> = None;
        let mut freq = 125.0_f32;
        while freq < 2100.0 {
            if let Some(note) = classify(Some(freq)) {
                if let Some(prev) = last {
                    assert!(note.midi() >= prev.midi(), "midi went backwards at {} Hz", freq);
                    assert!(note.midi() - prev.midi() <= 1, "semitone skipped at {} Hz", freq);
                    assert!(note.octave - prev.octave <= 1, "octave skipped at {} Hz", freq);
                }
                last = Some(note);
            }
            freq *= 1.001;
        }
        assert_eq!(last.unwrap().notation_key(), "b/6");
    }

    #[test]
    fn test_custom_reference_and_range() {
        let config = TranscriberConfig {
            reference_frequency: 442.0,
            min_octave: 2,
            max_octave: 4,
            ..TranscriberConfig::default()
        };
        let classifier = PitchClassifier::from_config(&config);
        assert_eq!(classifier.classify(Some(442.0)).unwrap().notation_key(), "a/4");
        assert_eq!(classifier.classify(Some(110.5)).unwrap().notation_key(), "a/2");
        assert_eq!(classifier.classify(Some(884.0)), None);
    }

    #[test]
    fn test_parse_notation_key() {
        assert_eq!(
            parse_notation_key("c#/4").unwrap(),
            NoteIdentity::new(PitchClass::CSharp, 4)
        );
        assert_eq!(parse_notation_key(" A/5 ").unwrap().midi(), 81);
        assert!(matches!(parse_notation_key("h/4"), Err(ScribeError::UnknownKey(_))));
        assert!(parse_notation_key("c4").is_err());
    }

    #[test]
    fn test_from_midi_covers_table_only() {
        assert_eq!(NoteIdentity::from_midi(0).unwrap().notation_key(), "c/-1");
        assert_eq!(NoteIdentity::from_midi(127).unwrap().notation_key(), "g/9");
        assert_eq!(NoteIdentity::from_midi(128), None);
        assert_eq!(NoteIdentity::from_midi(200), None);
        assert_eq!(NoteIdentity::from_midi(u8::MAX), None);
    }

    #[test]
    fn test_display_and_frequency() {
        let note = NoteIdentity::new(PitchClass::FSharp, 5);
        assert_eq!(note.to_string(), "F#5");
        let a3 = NoteIdentity::new(PitchClass::A, 3);
        assert!((a3.frequency(440.0) - 220.0).abs() < 1e-3);
    }

    #[test]
    fn test_cents_deviation() {
        assert!((calculate_cents_deviation(880.0, 440.0) - 1200.0).abs() < 1e-3);
        assert!(calculate_cents_deviation(439.0, 440.0) < 0.0);
    }
}
