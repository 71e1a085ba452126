//! # Duration Quantizer
//!
//! Buckets an elapsed wall-clock duration into a rhythmic symbol.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScribeError};

/// Upper bound (exclusive) for an eighth note, in seconds.
pub const EIGHTH_LIMIT: f64 = 0.35;
/// Upper bound (exclusive) for a quarter note, in seconds.
pub const QUARTER_LIMIT: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmicSymbol {
    Eighth,
    Quarter,
    Half,
}

impl RhythmicSymbol {
    /// Notation code: "8", "q" or "h".
    pub fn code(self) -> &'static str {
        match self {
            RhythmicSymbol::Eighth => "8",
            RhythmicSymbol::Quarter => "q",
            RhythmicSymbol::Half => "h",
        }
    }

    /// Length in quarter-note beats.
    pub fn beats(self) -> f32 {
        match self {
            RhythmicSymbol::Eighth => 0.5,
            RhythmicSymbol::Quarter => 1.0,
            RhythmicSymbol::Half => 2.0,
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim() {
            "8" => Ok(RhythmicSymbol::Eighth),
            "q" => Ok(RhythmicSymbol::Quarter),
            "h" => Ok(RhythmicSymbol::Half),
            other => Err(ScribeError::UnknownDuration(other.to_string())),
        }
    }
}

impl fmt::Display for RhythmicSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Maps seconds to a symbol; first match wins.
pub fn quantize(seconds: f64) -> RhythmicSymbol {
    if seconds < EIGHTH_LIMIT {
        RhythmicSymbol::Eighth
    } else if seconds < QUARTER_LIMIT {
        RhythmicSymbol::Quarter
    } else {
        RhythmicSymbol::Half
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(quantize(0.349).code(), "8");
        assert_eq!(quantize(0.35).code(), "q");
        assert_eq!(quantize(0.799).code(), "q");
        assert_eq!(quantize(0.8).code(), "h");
    }

    #[test]
    fn test_long_and_short() {
        assert_eq!(quantize(0.11), RhythmicSymbol::Eighth);
        assert_eq!(quantize(12.0), RhythmicSymbol::Half);
    }

    #[test]
    fn test_codes_parse_back() {
        for symbol in [RhythmicSymbol::Eighth, RhythmicSymbol::Quarter, RhythmicSymbol::Half] {
            assert_eq!(RhythmicSymbol::from_code(symbol.code()).unwrap(), symbol);
        }
        assert!(matches!(
            RhythmicSymbol::from_code("w"),
            Err(ScribeError::UnknownDuration(_))
        ));
    }
}
