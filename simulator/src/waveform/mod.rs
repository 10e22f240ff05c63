//! Periodic offset generators for simulation mode
//!
//! Three variants share one contract: a bounded, lazy offset signal over
//! time, pausable and resettable. Each rod owns one instance of every
//! variant and activates one of them; the motion controller adds the
//! offset to the baseline position snapshotted on entering Simulation.

use std::f64::consts::TAU;

use crate::config::{SawToothConfig, SineConfig, SineShape, SquareWaveConfig};
use crate::error::ConfigError;

/// Selects the active waveform variant on a rod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum WaveformKind {
    #[default]
    Square,
    Sine,
    SawTooth,
}

fn validate_period(period: f64) -> Result<(), ConfigError> {
    if !period.is_finite() || period <= 0.0 {
        return Err(ConfigError::InvalidPeriod(period));
    }
    Ok(())
}

/// Square wave: `amplitude` while the phase fraction lies inside the "up"
/// window, `0` elsewhere in the period.
#[derive(Debug, Clone)]
pub struct SquareWave {
    config: SquareWaveConfig,
    elapsed: f64,
    paused: bool,
}

impl SquareWave {
    pub fn new(config: SquareWaveConfig) -> Result<Self, ConfigError> {
        validate_period(config.period)?;
        Ok(Self {
            config,
            elapsed: 0.0,
            paused: false,
        })
    }

    pub fn current_offset(&self) -> f64 {
        let c = &self.config;
        let phase = self.elapsed / c.period;
        if phase >= c.start_up && phase < c.end_up {
            c.amplitude
        } else if phase >= c.start_down && phase < c.end_down {
            0.0
        } else if phase >= c.end_up && phase < c.start_down {
            // The up plateau holds through any gap before the down window
            c.amplitude
        } else {
            0.0
        }
    }
}

/// Smooth periodic offset scaled to `amplitude`; the quadratic shape
/// squares the instantaneous magnitude while preserving sign.
#[derive(Debug, Clone)]
pub struct Sine {
    config: SineConfig,
    elapsed: f64,
    paused: bool,
}

impl Sine {
    pub fn new(config: SineConfig) -> Result<Self, ConfigError> {
        validate_period(config.period)?;
        Ok(Self {
            config,
            elapsed: 0.0,
            paused: false,
        })
    }

    pub fn current_offset(&self) -> f64 {
        let s = (TAU * self.elapsed / self.config.period).sin();
        match self.config.shape {
            SineShape::Normal => self.config.amplitude * s,
            SineShape::Quadratic => self.config.amplitude * s * s.abs(),
        }
    }
}

/// Piecewise-linear ramp: 0→amplitude→0 across the "up" break fractions,
/// then 0→−amplitude→0 across the "down" break fractions.
#[derive(Debug, Clone)]
pub struct SawTooth {
    config: SawToothConfig,
    elapsed: f64,
    paused: bool,
}

impl SawTooth {
    pub fn new(config: SawToothConfig) -> Result<Self, ConfigError> {
        validate_period(config.period)?;
        Ok(Self {
            config,
            elapsed: 0.0,
            paused: false,
        })
    }

    pub fn current_offset(&self) -> f64 {
        let c = &self.config;
        let phase = self.elapsed / c.period;

        let ramp = |from: f64, to: f64, p: f64| {
            if to <= from {
                // Degenerate segment: treat as an instantaneous edge
                return 1.0;
            }
            (p - from) / (to - from)
        };

        if phase >= c.up_start && phase < c.up_peak {
            c.amplitude * ramp(c.up_start, c.up_peak, phase)
        } else if phase >= c.up_peak && phase < c.up_end {
            c.amplitude * (1.0 - ramp(c.up_peak, c.up_end, phase))
        } else if phase >= c.down_start && phase < c.down_peak {
            -c.amplitude * ramp(c.down_start, c.down_peak, phase)
        } else if phase >= c.down_peak && phase < c.down_end {
            -c.amplitude * (1.0 - ramp(c.down_peak, c.down_end, phase))
        } else {
            0.0
        }
    }
}

/// Closed variant set over the shared waveform contract
#[derive(Debug, Clone)]
pub enum Waveform {
    Square(SquareWave),
    Sine(Sine),
    SawTooth(SawTooth),
}

macro_rules! delegate {
    ($self:ident, $w:ident => $body:expr) => {
        match $self {
            Waveform::Square($w) => $body,
            Waveform::Sine($w) => $body,
            Waveform::SawTooth($w) => $body,
        }
    };
}

impl Waveform {
    /// Offset in steps at the current (possibly frozen) elapsed time
    pub fn current_offset(&self) -> f64 {
        delegate!(self, w => w.current_offset())
    }

    /// Advance elapsed time; no-op while paused. Elapsed wraps modulo the
    /// period so long simulations do not accumulate unbounded time.
    pub fn advance(&mut self, dt: f64) {
        delegate!(self, w => {
            if !w.paused {
                w.elapsed = (w.elapsed + dt).rem_euclid(w.config.period);
            }
        })
    }

    pub fn reset(&mut self) {
        delegate!(self, w => w.elapsed = 0.0)
    }

    pub fn paused(&self) -> bool {
        delegate!(self, w => w.paused)
    }

    pub fn set_paused(&mut self, paused: bool) {
        delegate!(self, w => w.paused = paused)
    }

    pub fn elapsed(&self) -> f64 {
        delegate!(self, w => w.elapsed)
    }
}
