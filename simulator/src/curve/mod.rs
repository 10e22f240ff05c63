//! Position↔reactivity calibration curves
//!
//! Each rod owns one discretized, monotonic mapping from normalized
//! insertion to inserted reactivity, tabulated per step together with its
//! discrete derivative. The fits are closed-form calibrations: a shared
//! 6th-degree polynomial for the safety/regulatory rods and a piecewise
//! linear/quadratic fit for the water-level shim (experimental data,
//! 9/5/2025). Tables are rebuilt wholesale on any configuration change.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Calibration family selecting which closed-form fit applies.
///
/// The set is fixed by physics calibration, not extensible at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveFamily {
    /// Absorber rod, polynomial fit
    Safety,
    /// Absorber rod, same polynomial fit as `Safety`
    Regulatory,
    /// Water-level shim, piecewise linear/quadratic fit over level in mm
    Shim,
}

// Shim fit constants; insertion is expressed as water level in mm
// (CR * 1000) and the fit switches branches at 800 mm.
const SHIM_BREAKPOINT: f64 = 0.8;
const SHIM_LINEAR_M: f64 = 9.38232899520517;
const SHIM_LINEAR_Q: f64 = -8785.47016144056;
const SHIM_QUAD_A: f64 = -0.0149964531096730;
const SHIM_QUAD_B: f64 = 33.3916504237934;
const SHIM_QUAD_C: f64 = -18395.1973141205;

/// Raw fit value at normalized insertion `cr`, as a fraction of `worth`
fn family_fit(family: CurveFamily, cr: f64, worth: f64) -> f64 {
    match family {
        CurveFamily::Safety | CurveFamily::Regulatory => {
            (-192.39 * cr.powi(6) + 1690.9 * cr.powi(5) - 3473.6 * cr.powi(4)
                + 2363.3 * cr.powi(3)
                - 260.91 * cr.powi(2)
                + 37.974 * cr
                - 0.001)
                / worth
        }
        CurveFamily::Shim => {
            let level_mm = cr * 1000.0;
            if cr < SHIM_BREAKPOINT {
                (SHIM_LINEAR_M * level_mm + SHIM_LINEAR_Q + worth) / worth
            } else {
                (SHIM_QUAD_A * level_mm * level_mm + SHIM_QUAD_B * level_mm + SHIM_QUAD_C + worth)
                    / worth
            }
        }
    }
}

/// Discretized calibration curve for one rod.
///
/// `reactivity_table[i]` holds the cumulative reactivity fraction at step
/// `i` (so `[0] == 0` and the last sample is normalized toward 1);
/// `slope_table[i]` is the discrete derivative with respect to normalized
/// insertion. Both tables have length `step_count + 1` and only ever change
/// together, through [`ReactivityCurve::build`].
#[derive(Debug, Clone, Serialize)]
pub struct ReactivityCurve {
    family: CurveFamily,
    step_count: usize,
    rod_worth: f64,
    curve_params: [f64; 2],
    reactivity_table: Vec<f64>,
    slope_table: Vec<f64>,
    max_slope_index: usize,
}

impl ReactivityCurve {
    /// Build a curve from calibration input.
    ///
    /// O(step_count); fails fast on degenerate configuration and never
    /// exposes a half-built table.
    pub fn build(
        family: CurveFamily,
        step_count: usize,
        rod_worth: f64,
        curve_params: [f64; 2],
    ) -> Result<Self, ConfigError> {
        if step_count == 0 {
            return Err(ConfigError::InvalidStepCount);
        }
        if !rod_worth.is_finite() || rod_worth == 0.0 {
            return Err(ConfigError::InvalidWorth(rod_worth));
        }
        for (index, &value) in curve_params.iter().enumerate() {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteParameter { index, value });
            }
        }

        let mut reactivity_table = vec![0.0; step_count + 1];
        let mut slope_table = vec![0.0; step_count + 1];
        let mut max_slope_index = 0;

        let [p0, p1] = curve_params;
        for i in 1..=step_count {
            let cr = i as f64 / step_count as f64;
            reactivity_table[i] = p0 + p1 * family_fit(family, cr, rod_worth);
            slope_table[i] =
                (reactivity_table[i] - reactivity_table[i - 1]) * step_count as f64;
            if slope_table[i] > slope_table[max_slope_index] {
                max_slope_index = i;
            }
        }

        // The shape parameters can invert or flatten the fit; such tables
        // have no usable inverse mapping and are a configuration error,
        // not something to discover mid-simulation.
        for i in 1..=step_count {
            if !reactivity_table[i].is_finite() || reactivity_table[i] < reactivity_table[i - 1] {
                return Err(ConfigError::DegenerateCurve);
            }
        }
        if reactivity_table[step_count] <= 0.0 {
            return Err(ConfigError::DegenerateCurve);
        }

        Ok(Self {
            family,
            step_count,
            rod_worth,
            curve_params,
            reactivity_table,
            slope_table,
            max_slope_index,
        })
    }

    pub fn family(&self) -> CurveFamily {
        self.family
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn rod_worth(&self) -> f64 {
        self.rod_worth
    }

    pub fn curve_params(&self) -> [f64; 2] {
        self.curve_params
    }

    /// Cumulative reactivity fractions, one sample per step
    pub fn reactivity_table(&self) -> &[f64] {
        &self.reactivity_table
    }

    /// Discrete derivative of the reactivity table
    pub fn slope_table(&self) -> &[f64] {
        &self.slope_table
    }

    /// Step index of peak reactivity-insertion rate (the most sensitive
    /// operating region)
    pub fn max_slope_index(&self) -> usize {
        self.max_slope_index
    }

    /// Inserted reactivity (pcm) at a continuous rod position.
    ///
    /// Positions outside `[0, step_count]` clamp to the travel limits.
    pub fn reactivity_at(&self, position: f64) -> f64 {
        let position = position.clamp(0.0, self.step_count as f64);
        let floor = position.floor() as usize;
        let ceil = position.ceil() as usize;

        let fraction = if floor == ceil {
            self.reactivity_table[floor]
        } else {
            self.reactivity_table[floor] * (ceil as f64 - position)
                + self.reactivity_table[ceil] * (position - floor as f64)
        };
        fraction * self.rod_worth
    }

    /// Continuous rod position inserting the given reactivity (pcm).
    ///
    /// Values outside `[0, rod_worth]` clamp to the travel limits; interior
    /// values interpolate between the bracketing table samples.
    pub fn position_at_reactivity(&self, pcm: f64) -> f64 {
        let normalized = pcm.clamp(0.0, self.rod_worth) / self.rod_worth;
        if normalized >= 1.0 {
            return self.step_count as f64;
        }
        if normalized <= 0.0 {
            return 0.0;
        }

        // Shape parameters may compress the table below 1: anything at or
        // above the top sample already means full travel.
        if normalized >= self.reactivity_table[self.step_count] {
            return self.step_count as f64;
        }

        // Table is monotonic non-decreasing: find the first sample >= value
        let i = self
            .reactivity_table
            .iter()
            .position(|&sample| sample >= normalized)
            .unwrap_or(self.step_count);
        if self.reactivity_table[i] == normalized || i == 0 {
            return i as f64;
        }

        let below = self.reactivity_table[i - 1];
        let above = self.reactivity_table[i];
        if above == below {
            return i as f64;
        }
        let position = (i - 1) as f64 + (normalized - below) / (above - below);
        position.clamp(0.0, self.step_count as f64)
    }
}
