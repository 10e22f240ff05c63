//! Control-rod motion controller
//!
//! Owns the operating-mode/command state machine, scram sequencing and
//! pulse ballistics for one rod, and composes the calibration curve with
//! the periodic waveform drivers. The host calls [`ControlRod::tick`] once
//! per simulation frame; everything else is command input marshalled onto
//! the simulation thread between ticks.
//!
//! Every mode/command input is accepted and reduced to a well-defined
//! state: there is no illegal-transition error. Position-domain violations
//! clamp (a physical rod cannot leave its travel limits); only
//! construction and curve rebuilds can fail.

mod snapshot;

pub use snapshot::RodSnapshot;

use serde::{Deserialize, Serialize};

use crate::config::{RodConfig, DEFAULT_ROD_SPEED, FIRE_ACCELERATION, SCRAM_DURATION_SECS};
use crate::curve::ReactivityCurve;
use crate::error::ConfigError;
use crate::waveform::{SawTooth, Sine, SquareWave, Waveform, WaveformKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    Manual,
    Simulation,
    Automatic,
    Pulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    None,
    Top,
    Bottom,
    Fixed,
}

/// One control rod: position state, command state machine, scram/pulse
/// sub-states, calibration curve and waveform bank.
#[derive(Debug, Clone)]
pub struct ControlRod {
    name: String,
    curve: ReactivityCurve,
    scram_exempt: bool,

    enabled: bool,
    exact_position: f64,
    actual_position: f64,
    commanded_position: f64,
    command: CommandKind,
    mode: OperatingMode,

    /// Steps/second; non-positive means instantaneous
    speed: f64,

    /// Scram is active while this is non-negative; idle at -1
    scram_elapsed: f64,
    scram_duration: f64,

    firing: bool,
    pulse_elapsed: f64,

    /// Position snapshotted on entering Simulation mode
    simulation_baseline: f64,

    /// Automatic-mode reactivity setpoint, consumed by the host regulator
    hold_pcm: f64,

    waveform_kind: WaveformKind,
    square: Waveform,
    sine: Waveform,
    saw_tooth: Waveform,
}

impl ControlRod {
    /// Build a rod from configuration: curve tables and one instance of
    /// each waveform variant. Fails fast on degenerate calibration input.
    pub fn new(config: &RodConfig) -> Result<Self, ConfigError> {
        let curve = ReactivityCurve::build(
            config.family,
            config.rod_steps,
            config.rod_worth,
            config.curve_params,
        )?;

        Ok(Self {
            name: config.name.clone(),
            curve,
            scram_exempt: config.scram_exempt,
            enabled: true,
            exact_position: 0.0,
            actual_position: 0.0,
            commanded_position: 0.0,
            command: CommandKind::None,
            mode: OperatingMode::Manual,
            speed: config.rod_speed,
            scram_elapsed: -1.0,
            scram_duration: SCRAM_DURATION_SECS,
            firing: false,
            pulse_elapsed: 0.0,
            simulation_baseline: 0.0,
            hold_pcm: 0.0,
            waveform_kind: WaveformKind::default(),
            square: Waveform::Square(SquareWave::new(config.waveforms.square.clone())?),
            sine: Waveform::Sine(Sine::new(config.waveforms.sine.clone())?),
            saw_tooth: Waveform::SawTooth(SawTooth::new(config.waveforms.saw_tooth.clone())?),
        })
    }

    /// Restore the startup state (position 0, enabled, timers cleared)
    /// without touching the calibration curve.
    pub fn reset(&mut self) {
        self.enabled = true;
        self.exact_position = 0.0;
        self.actual_position = 0.0;
        self.commanded_position = 0.0;
        self.command = CommandKind::None;
        self.scram_elapsed = -1.0;
        self.scram_duration = SCRAM_DURATION_SECS;
        self.firing = false;
        self.pulse_elapsed = 0.0;
        self.simulation_baseline = 0.0;
        self.hold_pcm = 0.0;
    }

    // ========================================================================
    // Position writes
    // ========================================================================

    /// The single gating rule: clamp into the travel domain, and propagate
    /// `exact → actual` only while the rod is enabled and not firing.
    fn move_to_step(&mut self, position: f64) {
        self.exact_position = position.clamp(0.0, self.curve.step_count() as f64);
        if self.enabled && !self.firing {
            self.actual_position = self.exact_position;
        }
    }

    /// Forced write: both positions follow regardless of enable/firing.
    pub fn force_position(&mut self, position: f64) {
        self.exact_position = position.clamp(0.0, self.curve.step_count() as f64);
        self.actual_position = self.exact_position;
    }

    // ========================================================================
    // Command surface
    // ========================================================================

    /// Steer toward an explicit target position.
    ///
    /// In Simulation or while scramming the rod does not immediately move:
    /// simulation motion is waveform-driven and scram preempts commands.
    pub fn command_move(&mut self, destination: f64) {
        self.commanded_position = destination;
        self.command = CommandKind::Fixed;
    }

    /// Symbolic target, resolved to `step_count` each tick
    pub fn command_to_top(&mut self) {
        self.command = CommandKind::Top;
    }

    /// Symbolic target, resolved to `0` each tick
    pub fn command_to_bottom(&mut self) {
        self.command = CommandKind::Bottom;
    }

    /// Clear pending commands; the commanded position snaps to the current
    /// exact position (a no-op command).
    pub fn clear_commands(&mut self) {
        self.commanded_position = self.exact_position;
        self.command = CommandKind::None;
    }

    /// Start the emergency shutdown sequence: commands are cleared, the
    /// target is forced to 0 and the scram timer starts. Not cancelable;
    /// it runs until the rod is fully down and disabled. No-op while a
    /// scram is already active.
    pub fn scram(&mut self) {
        if !self.is_scramming() {
            self.clear_commands();
            self.commanded_position = 0.0;
            self.command = CommandKind::Fixed;
            self.scram_elapsed = 0.0;
        }
    }

    /// Begin (`start = true`) or end the pulse ballistic trajectory.
    ///
    /// Starting re-enables the rod when in Pulse mode or when the rod is
    /// already commanded to the bottom, and begins the Firing sub-state
    /// only in Pulse mode. Ending never changes position.
    pub fn fire(&mut self, start: bool) {
        if start {
            if self.mode == OperatingMode::Pulse || self.commanded_position == 0.0 {
                self.set_enabled(true);
            }
            if self.mode == OperatingMode::Pulse {
                self.firing = true;
                self.pulse_elapsed = 0.0;
            }
        } else {
            self.firing = false;
        }
    }

    /// Switch operating mode. Leaving Simulation restores the baseline
    /// position and resets the active waveform; every change clears
    /// commands. Entering Pulse disables the rod; leaving Pulse restores
    /// the default drive speed.
    pub fn set_operating_mode(&mut self, mode: OperatingMode) {
        if self.mode == mode {
            return;
        }
        if self.mode == OperatingMode::Simulation {
            let baseline = self.simulation_baseline;
            self.move_to_step(baseline);
            self.active_waveform_mut().reset();
        }
        self.clear_commands();
        if mode == OperatingMode::Simulation {
            self.simulation_baseline = self.exact_position;
        }
        let previous = self.mode;
        self.mode = mode;
        if mode == OperatingMode::Pulse {
            self.set_enabled(false);
        } else if previous == OperatingMode::Pulse {
            self.speed = DEFAULT_ROD_SPEED;
        }
    }

    /// Switch the active waveform variant; in Simulation the rod returns
    /// to its baseline first, and the newly selected waveform restarts.
    pub fn set_waveform_kind(&mut self, kind: WaveformKind) {
        if self.waveform_kind == kind {
            return;
        }
        if self.mode == OperatingMode::Simulation {
            let baseline = self.simulation_baseline;
            self.move_to_step(baseline);
        }
        self.waveform_kind = kind;
        self.active_waveform_mut().reset();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Replace the rod worth and rebuild the calibration tables.
    pub fn set_worth(&mut self, worth: f64) -> Result<(), ConfigError> {
        self.rebuild_curve(
            self.curve.family(),
            self.curve.step_count(),
            worth,
            self.curve.curve_params(),
        )
    }

    /// Replace the step count and rebuild; positions re-clamp into the new
    /// travel domain.
    pub fn set_step_count(&mut self, step_count: usize) -> Result<(), ConfigError> {
        self.rebuild_curve(
            self.curve.family(),
            step_count,
            self.curve.rod_worth(),
            self.curve.curve_params(),
        )?;
        let top = step_count as f64;
        self.exact_position = self.exact_position.min(top);
        self.actual_position = self.actual_position.min(top);
        self.commanded_position = self.commanded_position.min(top);
        Ok(())
    }

    /// Replace one curve-shape parameter (index 0 or 1) and rebuild.
    pub fn set_curve_parameter(&mut self, index: usize, value: f64) -> Result<(), ConfigError> {
        if index > 1 {
            return Err(ConfigError::InvalidParameter { index });
        }
        let mut params = self.curve.curve_params();
        params[index] = value;
        self.rebuild_curve(
            self.curve.family(),
            self.curve.step_count(),
            self.curve.rod_worth(),
            params,
        )
    }

    fn rebuild_curve(
        &mut self,
        family: crate::curve::CurveFamily,
        step_count: usize,
        worth: f64,
        params: [f64; 2],
    ) -> Result<(), ConfigError> {
        // Build first, swap second: a failed rebuild leaves the old curve
        // fully intact.
        self.curve = ReactivityCurve::build(family, step_count, worth, params)?;
        Ok(())
    }

    pub fn set_hold_pcm(&mut self, pcm: f64) {
        self.hold_pcm = pcm;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // ========================================================================
    // Per-tick resolution
    // ========================================================================

    /// Resolve one simulation step of `dt` seconds into new positions.
    ///
    /// Scram motion preempts everything for non-exempt rods; otherwise
    /// Simulation mode follows the active waveform, command targets are
    /// resolved and approached at the drive speed (or snapped when speed
    /// is non-positive), and an in-flight pulse fire drives
    /// `actual_position` along the ballistic trajectory.
    pub fn tick(&mut self, dt: f64) {
        if self.is_scramming() && !self.scram_exempt {
            self.scram_elapsed = (self.scram_elapsed + dt).min(self.scram_duration);

            let travel = self.speed * dt;
            let descended = (self.exact_position - travel).max(0.0);
            self.move_to_step(descended);

            if self.actual_position == 0.0 && self.enabled {
                self.set_enabled(false);
                self.scram_elapsed = -1.0;
            }
            return;
        }

        if self.mode == OperatingMode::Simulation && !self.active_waveform().paused() {
            let target = self.simulation_baseline + self.active_waveform().current_offset();
            self.move_to_step(target);
            self.active_waveform_mut().advance(dt);
        }

        let target = match self.command {
            CommandKind::Top => self.curve.step_count() as f64,
            CommandKind::Bottom => 0.0,
            CommandKind::Fixed | CommandKind::None => self.commanded_position,
        };

        let command_driven = matches!(
            self.mode,
            OperatingMode::Manual | OperatingMode::Automatic | OperatingMode::Pulse
        );
        if self.exact_position != target && command_driven {
            if self.speed <= 0.0 && self.enabled {
                // Infinite-speed policy: teleport to the target
                self.move_to_step(target);
            } else if !self.firing {
                let travel = self.speed * dt;
                let next = if target > self.exact_position {
                    (self.exact_position + travel).min(target)
                } else {
                    (self.exact_position - travel).max(target)
                };
                self.move_to_step(next);
            }
        }

        if self.firing {
            self.pulse_elapsed += dt;
            let ballistic = 0.5
                * FIRE_ACCELERATION
                * self.pulse_elapsed
                * self.pulse_elapsed
                * self.curve.step_count() as f64;
            if ballistic >= self.exact_position {
                self.actual_position = self.exact_position;
                self.firing = false;
                self.clear_commands();
            } else {
                // Ballistic write bypasses the enable gate
                self.actual_position = ballistic;
            }
        }
    }

    // ========================================================================
    // Reactivity output & telemetry
    // ========================================================================

    /// Reactivity inserted at the current actual position (pcm); feeds the
    /// reactor-wide kinetics model.
    pub fn reactivity(&self) -> f64 {
        self.curve.reactivity_at(self.actual_position)
    }

    /// Read-only telemetry record for the display layer
    pub fn snapshot(&self) -> RodSnapshot {
        RodSnapshot {
            name: self.name.clone(),
            mode: self.mode,
            command: self.command,
            enabled: self.enabled,
            firing: self.firing,
            scramming: self.is_scramming(),
            exact_position: self.exact_position,
            actual_position: self.actual_position,
            commanded_position: self.commanded_position,
            speed: self.speed,
            reactivity_pcm: self.reactivity(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn curve(&self) -> &ReactivityCurve {
        &self.curve
    }

    pub fn step_count(&self) -> usize {
        self.curve.step_count()
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn command(&self) -> CommandKind {
        self.command
    }

    pub fn commanded_position(&self) -> f64 {
        self.commanded_position
    }

    pub fn exact_position(&self) -> f64 {
        self.exact_position
    }

    pub fn actual_position(&self) -> f64 {
        self.actual_position
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn scram_exempt(&self) -> bool {
        self.scram_exempt
    }

    pub fn is_scramming(&self) -> bool {
        self.scram_elapsed >= 0.0
    }

    pub fn scram_elapsed(&self) -> f64 {
        self.scram_elapsed
    }

    pub fn is_firing(&self) -> bool {
        self.firing
    }

    pub fn simulation_baseline(&self) -> f64 {
        self.simulation_baseline
    }

    pub fn hold_pcm(&self) -> f64 {
        self.hold_pcm
    }

    pub fn waveform_kind(&self) -> WaveformKind {
        self.waveform_kind
    }

    pub fn active_waveform(&self) -> &Waveform {
        match self.waveform_kind {
            WaveformKind::Square => &self.square,
            WaveformKind::Sine => &self.sine,
            WaveformKind::SawTooth => &self.saw_tooth,
        }
    }

    pub fn active_waveform_mut(&mut self) -> &mut Waveform {
        match self.waveform_kind {
            WaveformKind::Square => &mut self.square,
            WaveformKind::Sine => &mut self.sine,
            WaveformKind::SawTooth => &mut self.saw_tooth,
        }
    }

    pub fn waveform(&self, kind: WaveformKind) -> &Waveform {
        match kind {
            WaveformKind::Square => &self.square,
            WaveformKind::Sine => &self.sine,
            WaveformKind::SawTooth => &self.saw_tooth,
        }
    }

    pub fn waveform_mut(&mut self, kind: WaveformKind) -> &mut Waveform {
        match kind {
            WaveformKind::Square => &mut self.square,
            WaveformKind::Sine => &mut self.sine,
            WaveformKind::SawTooth => &mut self.saw_tooth,
        }
    }
}
