//! # Score Layout Module
//!
//! Turns the melody's `{key, duration}` entries into staff geometry that a
//! renderer can draw without further music knowledge: staves paginated at a
//! fixed number of notes per line, a treble clef on every line, a 4/4 time
//! signature on the first line only, and per-note positions with ledger
//! lines and stem direction.
//!
//! A line whose entries cannot be parsed is still laid out as an empty stave
//! and carries its error; the other lines are unaffected.

use crate::error::{Result, ScribeError};
use crate::melody::NotationEntry;
use crate::rhythm::RhythmicSymbol;
use crate::tuning::{self, NoteIdentity, PitchClass};

pub const NOTES_PER_LINE: usize = 16;
pub const LINE_HEIGHT: f32 = 120.0;
pub const STAVE_X: f32 = 10.0;
pub const STAVE_WIDTH: f32 = 750.0;
pub const CANVAS_WIDTH: f32 = 800.0;
pub const MIN_CANVAS_HEIGHT: f32 = 200.0;
/// Distance between two staff lines.
pub const LINE_SPACING: f32 = 10.0;
/// Blank space between a stave's y origin and its top line.
pub const STAFF_TOP_OFFSET: f32 = 40.0;
pub const CLEF_WIDTH: f32 = 40.0;
pub const TIME_SIGNATURE_WIDTH: f32 = 30.0;
pub const TIME_SIGNATURE: (u8, u8) = (4, 4);

const FIRST_LINE_Y: f32 = 20.0;
const EMPTY_STAFF_Y: f32 = 40.0;
const NOTE_PADDING: f32 = 15.0;
const RIGHT_MARGIN: f32 = 25.0;

/// E4 sits on the bottom line of a treble staff.
fn bottom_line_step() -> i32 {
    NoteIdentity::new(PitchClass::E, 4).diatonic_step()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNote {
    pub identity: NoteIdentity,
    pub duration: RhythmicSymbol,
    /// Notehead centre.
    pub x: f32,
    pub y: f32,
    /// Diatonic steps above the bottom staff line (negative is below).
    pub staff_step: i32,
    pub sharp: bool,
    pub stem_up: bool,
    /// y coordinates of the ledger lines this note needs.
    pub ledger_lines: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaffLine {
    pub index: usize,
    pub x: f32,
    /// Stave origin; the top line is at `y + STAFF_TOP_OFFSET`.
    pub y: f32,
    pub width: f32,
    pub show_time_signature: bool,
    pub notes: Vec<PlacedNote>,
    pub total_beats: f32,
    /// Set when the line's entries could not be laid out.
    pub error: Option<ScribeError>,
}

impl StaffLine {
    fn empty(index: usize, y: f32) -> Self {
        Self {
            index,
            x: STAVE_X,
            y,
            width: STAVE_WIDTH,
            show_time_signature: index == 0,
            notes: Vec::new(),
            total_beats: 0.0,
            error: None,
        }
    }

    pub fn top_line_y(&self) -> f32 {
        self.y + STAFF_TOP_OFFSET
    }

    pub fn bottom_line_y(&self) -> f32 {
        self.top_line_y() + 4.0 * LINE_SPACING
    }

    /// x where the first note may start, after clef and time signature.
    pub fn content_start_x(&self) -> f32 {
        let header = if self.show_time_signature {
            CLEF_WIDTH + TIME_SIGNATURE_WIDTH
        } else {
            CLEF_WIDTH
        };
        self.x + header + NOTE_PADDING
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreLayout {
    pub width: f32,
    pub height: f32,
    pub lines: Vec<StaffLine>,
}

impl ScoreLayout {
    /// Lines that were skipped, with their errors.
    pub fn skipped(&self) -> impl Iterator<Item = (usize, &ScribeError)> {
        self.lines
            .iter()
            .filter_map(|line| line.error.as_ref().map(|e| (line.index, e)))
    }

    pub fn note_count(&self) -> usize {
        self.lines.iter().map(|line| line.notes.len()).sum()
    }
}

/// Lays out the whole score.
pub fn layout_score(entries: &[NotationEntry]) -> ScoreLayout {
    if entries.is_empty() {
        return ScoreLayout {
            width: CANVAS_WIDTH,
            height: MIN_CANVAS_HEIGHT,
            lines: vec![StaffLine::empty(0, EMPTY_STAFF_Y)],
        };
    }

    let line_count = entries.len().div_ceil(NOTES_PER_LINE);
    let height = (line_count as f32 * LINE_HEIGHT + 50.0).max(MIN_CANVAS_HEIGHT);

    let lines = entries
        .chunks(NOTES_PER_LINE)
        .enumerate()
        .map(|(index, chunk)| {
            let mut line = StaffLine::empty(index, FIRST_LINE_Y + index as f32 * LINE_HEIGHT);
            match place_notes(&line, chunk) {
                Ok((notes, total_beats)) => {
                    line.notes = notes;
                    line.total_beats = total_beats;
                }
                Err(e) => {
                    log::warn!("Skipping notes on score line {}: {}", index + 1, e);
                    line.error = Some(e);
                }
            }
            line
        })
        .collect();

    ScoreLayout {
        width: CANVAS_WIDTH,
        height,
        lines,
    }
}

/// Parses and positions one line's entries. Any bad entry fails the line.
fn place_notes(line: &StaffLine, chunk: &[NotationEntry]) -> Result<(Vec<PlacedNote>, f32)> {
    let parsed = chunk
        .iter()
        .map(|entry| {
            let identity = tuning::parse_notation_key(&entry.key)?;
            let duration = RhythmicSymbol::from_code(&entry.duration)?;
            Ok((identity, duration))
        })
        .collect::<Result<Vec<_>>>()?;

    let total_beats: f32 = parsed.iter().map(|(_, d)| d.beats()).sum();
    if !(total_beats.is_finite() && total_beats > 0.0) {
        return Err(ScribeError::UnknownDuration(format!(
            "line beat total {}",
            total_beats
        )));
    }

    let start_x = line.content_start_x();
    let usable = (line.x + line.width - RIGHT_MARGIN - start_x).max(0.0);
    let mut elapsed_beats = 0.0;

    let notes = parsed
        .into_iter()
        .map(|(identity, duration)| {
            let x = start_x + usable * (elapsed_beats / total_beats);
            elapsed_beats += duration.beats();
            place_note(line, identity, duration, x)
        })
        .collect();

    Ok((notes, total_beats))
}

fn place_note(line: &StaffLine, identity: NoteIdentity, duration: RhythmicSymbol, x: f32) -> PlacedNote {
    let staff_step = identity.diatonic_step() - bottom_line_step();
    let half_space = LINE_SPACING / 2.0;
    let step_y = |step: i32| line.bottom_line_y() - step as f32 * half_space;

    let ledger_lines = if staff_step <= -2 {
        (staff_step..=-2).filter(|s| s % 2 == 0).rev().map(step_y).collect()
    } else if staff_step >= 10 {
        (10..=staff_step).filter(|s| s % 2 == 0).map(step_y).collect()
    } else {
        Vec::new()
    };

    PlacedNote {
        identity,
        duration,
        x,
        y: step_y(staff_step),
        staff_step,
        sharp: identity.pitch_class.is_sharp(),
        // Middle line is step 4.
        stem_up: staff_step < 4,
        ledger_lines,
    }
}
