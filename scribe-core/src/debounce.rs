//! # Stability Debouncer
//!
//! Low-pass filter over the categorical per-frame note stream. A note only
//! becomes "stable" once the same raw identity has repeated for
//! `threshold` consecutive frames; anything shorter reads as `None`.
//! Missed short notes are preferred over flickering spurious ones.

use crate::tuning::NoteIdentity;

/// Consecutive identical frames required by default.
pub const STABILITY_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct StabilityDebouncer {
    last_raw: Option<NoteIdentity>,
    consecutive_count: u32,
    threshold: u32,
}

impl Default for StabilityDebouncer {
    fn default() -> Self {
        Self::new(STABILITY_THRESHOLD)
    }
}

impl StabilityDebouncer {
    pub fn new(threshold: u32) -> Self {
        Self {
            last_raw: None,
            consecutive_count: 0,
            threshold,
        }
    }

    /// Feeds one raw frame and returns the debounced signal.
    pub fn update(&mut self, raw: Option<NoteIdentity>) -> Option<NoteIdentity> {
        if raw == self.last_raw {
            self.consecutive_count = self.consecutive_count.saturating_add(1);
        } else {
            self.last_raw = raw;
            self.consecutive_count = 0;
        }
        self.stable()
    }

    /// The current debounced signal without feeding a frame.
    pub fn stable(&self) -> Option<NoteIdentity> {
        if self.consecutive_count >= self.threshold {
            self.last_raw
        } else {
            None
        }
    }

    pub fn consecutive_count(&self) -> u32 {
        self.consecutive_count
    }

    pub fn reset(&mut self) {
        self.last_raw = None;
        self.consecutive_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::PitchClass;

    fn note(pc: PitchClass) -> Option<NoteIdentity> {
        Some(NoteIdentity::new(pc, 4))
    }

    #[test]
    fn test_needs_threshold_repeats() {
        let mut debouncer = StabilityDebouncer::default();
        // First sighting resets the counter to 0; four repeats bring it to 4.
        for _ in 0..5 {
            assert_eq!(debouncer.update(note(PitchClass::A)), None);
        }
        // Sixth identical frame: count reaches 5.
        assert_eq!(debouncer.update(note(PitchClass::A)), note(PitchClass::A));
    }

    #[test]
    fn test_single_transition_each_way() {
        let mut debouncer = StabilityDebouncer::default();
        let mut stream = vec![note(PitchClass::C), None];
        stream.extend(std::iter::repeat(note(PitchClass::E)).take(9));
        stream.extend([note(PitchClass::G), None, None]);

        let outputs: Vec<_> = stream.into_iter().map(|raw| debouncer.update(raw)).collect();

        let mut transitions = Vec::new();
        let mut prev = None;
        for out in &outputs {
            if *out != prev {
                transitions.push(*out);
                prev = *out;
            }
        }
        assert_eq!(transitions, vec![note(PitchClass::E), None]);
    }

    #[test]
    fn test_flicker_never_stabilizes() {
        let mut debouncer = StabilityDebouncer::default();
        for i in 0..50 {
            let raw = if i % 3 == 0 { note(PitchClass::D) } else { note(PitchClass::DSharp) };
            assert_eq!(debouncer.update(raw), None);
        }
    }

    #[test]
    fn test_silence_is_counted_like_a_note() {
        let mut debouncer = StabilityDebouncer::default();
        for _ in 0..10 {
            debouncer.update(None);
        }
        assert_eq!(debouncer.consecutive_count(), 10);
        assert_eq!(debouncer.stable(), None);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut debouncer = StabilityDebouncer::new(2);
        for _ in 0..4 {
            debouncer.update(note(PitchClass::B));
        }
        assert_eq!(debouncer.stable(), note(PitchClass::B));
        debouncer.reset();
        assert_eq!(debouncer.stable(), None);
        assert_eq!(debouncer.consecutive_count(), 0);
    }
}
