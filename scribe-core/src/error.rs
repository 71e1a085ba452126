//! # Error Module
//!
//! Typed errors for the parts of the core that validate input: configuration
//! values and the `{key, duration}` notation strings handed to the score layout.
//! Audio device failures are reported through `anyhow` by the capture module.

use thiserror::Error;

/// Errors raised by the transcription core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScribeError {
    /// A configuration value is out of its usable range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A notation key could not be parsed (expected e.g. "c#/4").
    #[error("unknown notation key '{0}'")]
    UnknownKey(String),

    /// A duration code is not one of "8", "q", "h".
    #[error("unknown duration code '{0}'")]
    UnknownDuration(String),
}

pub type Result<T> = std::result::Result<T, ScribeError>;
