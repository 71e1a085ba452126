//! # Note Boundary Tracker
//!
//! State machine over the debounced note signal. It remembers the note that is
//! currently sounding and, whenever the stable signal moves away from it,
//! reports the held note with its quantized duration.
//!
//! ```text
//!            stable = X                       stable = Y (Y != X)
//!   Idle ------------------> Holding(X) ------------------------> Holding(Y)
//!    ^                          |            emit X if > floor
//!    |      stable = None       |
//!    +--------------------------+
//!            emit X if > floor
//! ```
//!
//! There is no terminal state. Dropping or resetting the tracker discards a
//! held note without emitting it.

use crate::melody::FinishedNote;
use crate::rhythm;
use crate::tuning::NoteIdentity;

/// Held notes at or below this many seconds are treated as noise.
pub const MIN_NOTE_SECONDS: f64 = 0.1;

/// A note that is currently sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeldNote {
    pub identity: NoteIdentity,
    /// Capture-clock time in seconds at which the note became stable.
    pub start_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TrackerState {
    #[default]
    Idle,
    Holding(HeldNote),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteTracker {
    state: TrackerState,
    min_note_seconds: f64,
}

impl Default for NoteTracker {
    fn default() -> Self {
        Self::new(MIN_NOTE_SECONDS)
    }
}

impl NoteTracker {
    pub fn new(min_note_seconds: f64) -> Self {
        Self {
            state: TrackerState::Idle,
            min_note_seconds,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Identity of the held note, if any.
    pub fn held(&self) -> Option<NoteIdentity> {
        match self.state {
            TrackerState::Idle => None,
            TrackerState::Holding(held) => Some(held.identity),
        }
    }

    /// Evaluates one frame. Returns a finished note when a held note ended
    /// and lasted longer than the noise floor.
    pub fn update(&mut self, stable: Option<NoteIdentity>, now: f64) -> Option<FinishedNote> {
        if stable == self.held() {
            return None;
        }

        let finished = match self.state {
            TrackerState::Holding(held) => {
                let elapsed = now - held.start_time;
                if elapsed > self.min_note_seconds {
                    let duration = rhythm::quantize(elapsed);
                    log::debug!(
                        "Note ended: {} after {:.3}s -> {}",
                        held.identity,
                        elapsed,
                        duration
                    );
                    Some(FinishedNote {
                        key: held.identity,
                        duration,
                    })
                } else {
                    log::debug!(
                        "Dropped {} after {:.3}s (below {:.2}s floor)",
                        held.identity,
                        elapsed,
                        self.min_note_seconds
                    );
                    None
                }
            }
            TrackerState::Idle => None,
        };

        self.state = match stable {
            Some(identity) => TrackerState::Holding(HeldNote {
                identity,
                start_time: now,
            }),
            None => TrackerState::Idle,
        };

        finished
    }

    /// Returns to `Idle`, handing back whatever was held. Nothing is emitted.
    pub fn reset(&mut self) -> Option<HeldNote> {
        match std::mem::take(&mut self.state) {
            TrackerState::Idle => None,
            TrackerState::Holding(held) => Some(held),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::RhythmicSymbol;
    use crate::tuning::PitchClass;

    const FRAME: f64 = 1.0 / 60.0;

    fn a4() -> Option<NoteIdentity> {
        Some(NoteIdentity::new(PitchClass::A, 4))
    }

    /// Feeds `signal` for `seconds` worth of frames starting at `start`,
    /// collecting emissions. Returns the time after the last frame.
    fn feed(
        tracker: &mut NoteTracker,
        signal: Option<NoteIdentity>,
        start: f64,
        seconds: f64,
        out: &mut Vec<FinishedNote>,
    ) -> f64 {
        let frames = (seconds / FRAME).round() as usize;
        let mut now = start;
        for _ in 0..frames {
            out.extend(tracker.update(signal, now));
            now += FRAME;
        }
        now
    }

    #[test]
    fn test_half_second_note_is_quarter() {
        let mut tracker = NoteTracker::default();
        let mut out = Vec::new();
        let t = feed(&mut tracker, a4(), 0.0, 0.5, &mut out);
        assert!(out.is_empty(), "nothing may be emitted while the note sounds");
        feed(&mut tracker, None, t, 0.5, &mut out);
        assert_eq!(
            out,
            vec![FinishedNote {
                key: NoteIdentity::new(PitchClass::A, 4),
                duration: RhythmicSymbol::Quarter,
            }]
        );
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn test_blip_below_floor_is_dropped() {
        let mut tracker = NoteTracker::default();
        assert_eq!(tracker.update(a4(), 1.0), None);
        assert_eq!(tracker.update(None, 1.05), None);
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn test_exactly_at_floor_is_dropped() {
        let mut tracker = NoteTracker::default();
        tracker.update(a4(), 0.0);
        assert_eq!(tracker.update(None, MIN_NOTE_SECONDS), None);
    }

    #[test]
    fn test_note_change_emits_previous_and_holds_next() {
        let mut tracker = NoteTracker::default();
        let c5 = Some(NoteIdentity::new(PitchClass::C, 5));
        tracker.update(a4(), 0.0);
        let finished = tracker.update(c5, 1.0).unwrap();
        assert_eq!(finished.key.notation_key(), "a/4");
        assert_eq!(finished.duration, RhythmicSymbol::Half);
        assert_eq!(
            tracker.state(),
            TrackerState::Holding(HeldNote {
                identity: NoteIdentity::new(PitchClass::C, 5),
                start_time: 1.0,
            })
        );
    }

    #[test]
    fn test_idle_silence_is_no_transition() {
        let mut tracker = NoteTracker::default();
        for i in 0..100 {
            assert_eq!(tracker.update(None, i as f64 * FRAME), None);
        }
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn test_reset_discards_held_note() {
        let mut tracker = NoteTracker::default();
        tracker.update(a4(), 0.0);
        let discarded = tracker.reset().unwrap();
        assert_eq!(discarded.identity.notation_key(), "a/4");
        assert_eq!(tracker.state(), TrackerState::Idle);
        // A later silence frame has nothing to finish.
        assert_eq!(tracker.update(None, 5.0), None);
    }
}
