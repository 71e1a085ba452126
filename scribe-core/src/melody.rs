//! # Melody Module
//!
//! Finished notes and the append-only melody they are collected into. The
//! melody is the externally visible output of a recording: it only grows while
//! recording and is emptied only by an explicit reset.

use serde::{Deserialize, Serialize};

use crate::rhythm::RhythmicSymbol;
use crate::tuning::NoteIdentity;

/// A completed note: what was held and how long, quantized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedNote {
    pub key: NoteIdentity,
    pub duration: RhythmicSymbol,
}

impl FinishedNote {
    pub fn to_notation(&self) -> NotationEntry {
        NotationEntry {
            key: self.key.notation_key(),
            duration: self.duration.code().to_string(),
        }
    }
}

/// Wire format consumed by the score layout: `{ key: "c#/4", duration: "q" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotationEntry {
    pub key: String,
    pub duration: String,
}

impl NotationEntry {
    pub fn new(key: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            duration: duration.into(),
        }
    }
}

/// Ordered, append-only sequence of finished notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Melody {
    notes: Vec<FinishedNote>,
}

impl Melody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: FinishedNote) {
        self.notes.push(note);
    }

    /// Drops every note. The only way the melody ever shrinks.
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn notes(&self) -> &[FinishedNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn to_notation(&self) -> Vec<NotationEntry> {
        self.notes.iter().map(FinishedNote::to_notation).collect()
    }
}
