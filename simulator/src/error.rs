//! Configuration error taxonomy
//!
//! Construction and rebuild paths fail fast; tick-time domain violations are
//! handled by clamping and never surface as errors.

use thiserror::Error;

/// Errors raised while building or rebuilding rod calibration state
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("rod step count must be positive")]
    InvalidStepCount,

    #[error("rod worth must be finite and non-zero, got {0}")]
    InvalidWorth(f64),

    #[error("curve parameter index {index} out of range (expected 0 or 1)")]
    InvalidParameter { index: usize },

    #[error("curve parameter {index} must be finite, got {value}")]
    NonFiniteParameter { index: usize, value: f64 },

    #[error("calibration fit produced a non-monotonic or degenerate reactivity table")]
    DegenerateCurve,

    #[error("waveform period must be positive and finite, got {0}")]
    InvalidPeriod(f64),
}
