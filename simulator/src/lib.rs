//! Rod Simulator Core - Rust Engine
//!
//! Control-rod kinematics for a real-time reactor training simulator:
//! position/reactivity calibration curves, periodic waveform drivers, and
//! the per-tick motion controller (commands, operating modes, scram, pulse).
//!
//! # Architecture
//!
//! - **config**: Calibration defaults and serde-friendly construction input
//! - **curve**: Position↔reactivity tables and bidirectional interpolation
//! - **waveform**: Square/sine/sawtooth offset generators for simulation mode
//! - **rod**: The motion controller composing the above, driven by `tick(dt)`
//!
//! # Critical Invariants
//!
//! 1. Positions always live in `[0, rod_steps]`; out-of-range requests clamp,
//!    they never fail a tick
//! 2. Curve tables are rebuilt wholesale; a half-built curve is never
//!    observable
//! 3. The core is single-threaded and step-driven: the host serializes all
//!    commands and `tick(dt)` calls per rod

pub mod config;
pub mod curve;
pub mod error;
pub mod rod;
pub mod waveform;

// Re-exports for convenience
pub use config::{
    RodConfig, SawToothConfig, SineConfig, SineShape, SquareWaveConfig, WaveformSuiteConfig,
    DEFAULT_ROD_SPEED, FIRE_ACCELERATION, SCRAM_DURATION_SECS,
};
pub use curve::{CurveFamily, ReactivityCurve};
pub use error::ConfigError;
pub use rod::{CommandKind, ControlRod, OperatingMode, RodSnapshot};
pub use waveform::{SawTooth, Sine, SquareWave, Waveform, WaveformKind};
