//! Construction and rebuild input for the rod core
//!
//! These records mirror what the settings collaborator persists: per rod a
//! step count, total worth, speed and two curve-shape parameters; per
//! waveform a period, amplitude and named phase-fraction break points.
//! Defaults are the CROCUS-adapted calibration values measured at the
//! facility; partial JSON configs deserialize against them.

use serde::{Deserialize, Serialize};

use crate::curve::CurveFamily;

/// Ballistic acceleration applied while a pulse fire is in progress,
/// in fractions of full travel per second squared.
pub const FIRE_ACCELERATION: f64 = 50.0;

/// Fixed length of the scram timer (seconds).
pub const SCRAM_DURATION_SECS: f64 = 0.5;

/// Rod speed restored when leaving Pulse mode (steps/second).
pub const DEFAULT_ROD_SPEED: f64 = 10.0;

// Calibration defaults (CROCUS adapted)
const SAFETY_ROD_STEPS: usize = 10_000;
const REGULATORY_ROD_STEPS: usize = 10_000;
const SHIM_ROD_STEPS: usize = 10_000;
const SAFETY_ROD_WORTH_PCM: f64 = 165.273;
const REGULATORY_ROD_WORTH_PCM: f64 = 165.273;
const SHIM_ROD_WORTH_PCM: f64 = 8785.47016144056;
// Speeds measured with a stopwatch at the reference reactor
const SAFETY_ROD_SPEED: f64 = 1e3;
const REGULATORY_ROD_SPEED: f64 = 1e3;
const SHIM_ROD_SPEED: f64 = 22.0;

const SIMULATION_PERIOD_DEFAULT: f64 = 5.0;
const SIMULATION_AMPLITUDE_DEFAULT: f64 = 40.0;

fn default_period() -> f64 {
    SIMULATION_PERIOD_DEFAULT
}

fn default_amplitude() -> f64 {
    SIMULATION_AMPLITUDE_DEFAULT
}

fn default_curve_params() -> [f64; 2] {
    [0.0, 1.0]
}

fn default_half() -> f64 {
    0.5
}

fn default_quarter() -> f64 {
    0.25
}

fn default_three_quarters() -> f64 {
    0.75
}

fn default_one() -> f64 {
    1.0
}

/// Square wave duty fractions: up between `start_up` and `end_up`,
/// zero elsewhere in the period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquareWaveConfig {
    #[serde(default = "default_period")]
    pub period: f64,

    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    #[serde(default)]
    pub start_up: f64,

    #[serde(default = "default_half")]
    pub end_up: f64,

    #[serde(default = "default_half")]
    pub start_down: f64,

    #[serde(default = "default_one")]
    pub end_down: f64,
}

impl Default for SquareWaveConfig {
    fn default() -> Self {
        Self {
            period: SIMULATION_PERIOD_DEFAULT,
            amplitude: SIMULATION_AMPLITUDE_DEFAULT,
            start_up: 0.0,
            end_up: 0.5,
            start_down: 0.5,
            end_down: 1.0,
        }
    }
}

/// Amplitude shaping for the sine generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SineShape {
    #[default]
    Normal,
    /// Squares the instantaneous magnitude while preserving sign
    Quadratic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SineConfig {
    #[serde(default = "default_period")]
    pub period: f64,

    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    #[serde(default)]
    pub shape: SineShape,
}

impl Default for SineConfig {
    fn default() -> Self {
        Self {
            period: SIMULATION_PERIOD_DEFAULT,
            amplitude: SIMULATION_AMPLITUDE_DEFAULT,
            shape: SineShape::Normal,
        }
    }
}

/// Sawtooth break fractions: the offset ramps 0→amplitude→0 across the
/// three "up" points, then 0→−amplitude→0 across the three "down" points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SawToothConfig {
    #[serde(default = "default_period")]
    pub period: f64,

    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    #[serde(default)]
    pub up_start: f64,

    #[serde(default = "default_quarter")]
    pub up_peak: f64,

    #[serde(default = "default_half")]
    pub up_end: f64,

    #[serde(default = "default_half")]
    pub down_start: f64,

    #[serde(default = "default_three_quarters")]
    pub down_peak: f64,

    #[serde(default = "default_one")]
    pub down_end: f64,
}

impl Default for SawToothConfig {
    fn default() -> Self {
        Self {
            period: SIMULATION_PERIOD_DEFAULT,
            amplitude: SIMULATION_AMPLITUDE_DEFAULT,
            up_start: 0.0,
            up_peak: 0.25,
            up_end: 0.5,
            down_start: 0.5,
            down_peak: 0.75,
            down_end: 1.0,
        }
    }
}

/// One instance of each waveform variant, owned per rod
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveformSuiteConfig {
    #[serde(default)]
    pub square: SquareWaveConfig,

    #[serde(default)]
    pub sine: SineConfig,

    #[serde(default)]
    pub saw_tooth: SawToothConfig,
}

/// Complete per-rod construction input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RodConfig {
    /// Display name, e.g. "North CR"
    pub name: String,

    /// Calibration family selecting the position→reactivity fit
    pub family: CurveFamily,

    /// Rods with no fast-scram actuator (water-level shims) ignore the
    /// scram timer during `tick`
    #[serde(default)]
    pub scram_exempt: bool,

    /// Number of discretizable travel positions
    pub rod_steps: usize,

    /// Total reactivity span across full travel (pcm)
    pub rod_worth: f64,

    /// Drive speed in steps/second; non-positive means instantaneous
    pub rod_speed: f64,

    /// Affine curve-shape parameters applied to the raw calibration fit
    #[serde(default = "default_curve_params")]
    pub curve_params: [f64; 2],

    #[serde(default)]
    pub waveforms: WaveformSuiteConfig,
}

impl RodConfig {
    /// Safety rod defaults (fast drive, polynomial calibration)
    pub fn safety() -> Self {
        Self {
            name: "North CR".to_string(),
            family: CurveFamily::Safety,
            scram_exempt: false,
            rod_steps: SAFETY_ROD_STEPS,
            rod_worth: SAFETY_ROD_WORTH_PCM,
            rod_speed: SAFETY_ROD_SPEED,
            curve_params: default_curve_params(),
            waveforms: WaveformSuiteConfig::default(),
        }
    }

    /// Regulatory rod defaults (same fit family as the safety rod)
    pub fn regulatory() -> Self {
        Self {
            name: "South CR".to_string(),
            family: CurveFamily::Regulatory,
            scram_exempt: false,
            rod_steps: REGULATORY_ROD_STEPS,
            rod_worth: REGULATORY_ROD_WORTH_PCM,
            rod_speed: REGULATORY_ROD_SPEED,
            curve_params: default_curve_params(),
            waveforms: WaveformSuiteConfig::default(),
        }
    }

    /// Water-level shim defaults: slow drive, piecewise calibration, and
    /// no fast-scram actuator
    pub fn shim() -> Self {
        Self {
            name: "Water".to_string(),
            family: CurveFamily::Shim,
            scram_exempt: true,
            rod_steps: SHIM_ROD_STEPS,
            rod_worth: SHIM_ROD_WORTH_PCM,
            rod_speed: SHIM_ROD_SPEED,
            curve_params: default_curve_params(),
            waveforms: WaveformSuiteConfig::default(),
        }
    }
}
