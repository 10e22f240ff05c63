//! Tests for the rod motion controller
//!
//! Scenario coverage: speed-limited and instantaneous command motion,
//! scram sequencing (and the scram-exempt shim), pulse ballistics,
//! simulation-mode waveform driving, and the enable gating between exact
//! and actual position.

use rod_simulator_core_rs::{
    CommandKind, ControlRod, CurveFamily, OperatingMode, RodConfig, SquareWaveConfig,
    WaveformSuiteConfig, DEFAULT_ROD_SPEED, FIRE_ACCELERATION,
};

fn test_config(steps: usize, speed: f64) -> RodConfig {
    RodConfig {
        name: "Test CR".to_string(),
        family: CurveFamily::Safety,
        scram_exempt: false,
        rod_steps: steps,
        rod_worth: 165.273,
        rod_speed: speed,
        curve_params: [0.0, 1.0],
        waveforms: WaveformSuiteConfig::default(),
    }
}

fn rod(steps: usize, speed: f64) -> ControlRod {
    ControlRod::new(&test_config(steps, speed)).unwrap()
}

#[test]
fn test_new_rod_starts_at_bottom_enabled_manual() {
    let rod = rod(100, 10.0);
    assert_eq!(rod.exact_position(), 0.0);
    assert_eq!(rod.actual_position(), 0.0);
    assert_eq!(rod.mode(), OperatingMode::Manual);
    assert_eq!(rod.command(), CommandKind::None);
    assert!(rod.is_enabled());
    assert!(!rod.is_scramming());
    assert!(!rod.is_firing());
    assert_eq!(rod.reactivity(), 0.0);
}

#[test]
fn test_tick_zero_never_moves_the_rod() {
    let mut rod = rod(100, 10.0);
    rod.command_move(50.0);
    rod.tick(2.5); // partway to the target
    let exact = rod.exact_position();
    let actual = rod.actual_position();

    for _ in 0..5 {
        rod.tick(0.0);
    }
    assert_eq!(rod.exact_position(), exact);
    assert_eq!(rod.actual_position(), actual);
}

#[test]
fn test_speed_limited_motion_never_overshoots() {
    let mut rod = rod(100, 10.0);
    rod.command_move(25.0);

    rod.tick(1.0);
    assert_eq!(rod.exact_position(), 10.0);
    rod.tick(1.0);
    assert_eq!(rod.exact_position(), 20.0);
    rod.tick(1.0); // only 5 steps remain
    assert_eq!(rod.exact_position(), 25.0);
    rod.tick(1.0); // holding at the target
    assert_eq!(rod.exact_position(), 25.0);
    assert_eq!(rod.actual_position(), 25.0);
}

#[test]
fn test_downward_motion_is_speed_limited_too() {
    let mut rod = rod(100, 10.0);
    rod.force_position(80.0);
    rod.command_move(60.0);
    rod.tick(1.0);
    assert_eq!(rod.exact_position(), 70.0);
    rod.tick(5.0);
    assert_eq!(rod.exact_position(), 60.0);
}

#[test]
fn test_non_positive_speed_snaps_to_the_target() {
    let mut rod = rod(100, 0.0);
    rod.command_move(50.0);
    rod.tick(0.001);
    assert_eq!(rod.exact_position(), 50.0);
    assert_eq!(rod.actual_position(), 50.0);

    rod.set_speed(-1.0);
    rod.command_move(10.0);
    rod.tick(0.001);
    assert_eq!(rod.exact_position(), 10.0);
}

#[test]
fn test_commands_clamp_to_travel_limits() {
    let mut rod = rod(100, 0.0);
    rod.command_move(250.0);
    rod.tick(0.1);
    assert_eq!(rod.exact_position(), 100.0);

    rod.command_move(-40.0);
    rod.tick(0.1);
    assert_eq!(rod.exact_position(), 0.0);
}

#[test]
fn test_symbolic_top_and_bottom_commands() {
    let mut rod = rod(100, 0.0);
    rod.command_to_top();
    assert_eq!(rod.command(), CommandKind::Top);
    rod.tick(0.1);
    assert_eq!(rod.exact_position(), 100.0);

    rod.command_to_bottom();
    rod.tick(0.1);
    assert_eq!(rod.exact_position(), 0.0);
}

#[test]
fn test_clear_commands_is_a_no_op_command() {
    let mut rod = rod(100, 10.0);
    rod.command_move(50.0);
    rod.tick(1.0);
    rod.clear_commands();
    assert_eq!(rod.command(), CommandKind::None);
    assert_eq!(rod.commanded_position(), rod.exact_position());

    let held = rod.exact_position();
    rod.tick(5.0);
    assert_eq!(rod.exact_position(), held);
}

#[test]
fn test_disabled_rod_moves_exact_but_not_actual() {
    let mut rod = rod(100, 10.0);
    rod.set_enabled(false);
    rod.command_move(5.0);
    rod.tick(1.0);
    assert_eq!(rod.exact_position(), 5.0);
    assert_eq!(rod.actual_position(), 0.0);

    rod.set_enabled(true);
    rod.tick(0.0);
    // Re-enabling alone does not snap; the next motion write does
    rod.command_move(6.0);
    rod.tick(1.0);
    assert_eq!(rod.actual_position(), 6.0);
}

// ============================================================================
// Scram
// ============================================================================

#[test]
fn test_scram_drives_the_rod_down_and_disables_it() {
    let mut rod = rod(100, 50.0);
    rod.force_position(100.0);
    rod.scram();
    assert!(rod.is_scramming());

    // 100 steps at 50 steps/s: fully down after 2 s of ticking
    for _ in 0..20 {
        rod.tick(0.1);
    }
    assert_eq!(rod.actual_position(), 0.0);
    assert_eq!(rod.exact_position(), 0.0);
    assert!(!rod.is_enabled());
    assert!(!rod.is_scramming());
}

#[test]
fn test_scram_is_not_cancelable_by_commands() {
    let mut rod = rod(100, 10.0);
    rod.force_position(100.0);
    rod.scram();
    rod.command_to_top();

    rod.tick(1.0);
    assert!(rod.exact_position() < 100.0, "scram must preempt commands");
    rod.tick(1.0);
    assert!(rod.exact_position() < 90.0);
    assert!(rod.is_scramming());
}

#[test]
fn test_scram_while_scramming_is_a_no_op() {
    let mut rod = rod(100, 50.0);
    rod.force_position(100.0);
    rod.scram();
    rod.tick(0.1);
    let elapsed = rod.scram_elapsed();
    rod.scram();
    assert_eq!(rod.scram_elapsed(), elapsed);
}

#[test]
fn test_scram_exempt_rod_descends_by_ordinary_motion_only() {
    let mut config = test_config(100, 10.0);
    config.family = CurveFamily::Shim;
    config.rod_worth = 8785.47016144056;
    config.scram_exempt = true;
    let mut rod = ControlRod::new(&config).unwrap();

    rod.force_position(100.0);
    rod.scram();
    rod.tick(1.0);

    // The scram forces a bottom command, but the exempt rod moves at its
    // ordinary drive speed and is never disabled by the sequence.
    assert_eq!(rod.exact_position(), 90.0);
    assert!(rod.is_enabled());
    rod.tick(9.0);
    assert_eq!(rod.exact_position(), 0.0);
    assert!(rod.is_enabled());
}

// ============================================================================
// Pulse / Firing
// ============================================================================

#[test]
fn test_pulse_fire_follows_the_ballistic_trajectory() {
    let mut rod = rod(100, 0.0);
    rod.set_operating_mode(OperatingMode::Pulse);
    assert!(!rod.is_enabled(), "entering Pulse disables the rod");

    rod.command_move(10.0);
    rod.fire(true);
    assert!(rod.is_enabled(), "fire(true) re-enables in Pulse mode");
    assert!(rod.is_firing());

    let dt = 0.01;
    let mut t = 0.0;
    let mut peak_checked = false;
    while rod.is_firing() {
        rod.tick(dt);
        t += dt;
        if rod.is_firing() {
            let expected = 0.5 * FIRE_ACCELERATION * t * t * 100.0;
            assert!((rod.actual_position() - expected).abs() < 1e-9);
            assert_eq!(rod.exact_position(), 10.0, "zero speed snaps exact");
            peak_checked = true;
        }
        assert!(t < 1.0, "fire never completed");
    }
    assert!(peak_checked);
    assert_eq!(rod.actual_position(), 10.0);
    assert_eq!(rod.command(), CommandKind::None, "completion clears commands");
}

#[test]
fn test_fire_false_ends_firing_without_moving() {
    let mut rod = rod(100, 0.0);
    rod.set_operating_mode(OperatingMode::Pulse);
    rod.command_move(50.0);
    rod.fire(true);
    rod.tick(0.01);
    let actual = rod.actual_position();
    assert!(rod.is_firing());

    rod.fire(false);
    assert!(!rod.is_firing());
    assert_eq!(rod.actual_position(), actual);
}

#[test]
fn test_fire_outside_pulse_mode_does_not_start_firing() {
    let mut rod = rod(100, 10.0);
    rod.fire(true);
    assert!(!rod.is_firing());
}

#[test]
fn test_leaving_pulse_restores_the_default_speed() {
    let mut rod = rod(100, 1000.0);
    rod.set_operating_mode(OperatingMode::Pulse);
    assert_eq!(rod.speed(), 1000.0);
    rod.set_operating_mode(OperatingMode::Manual);
    assert_eq!(rod.speed(), DEFAULT_ROD_SPEED);
}

// ============================================================================
// Simulation mode
// ============================================================================

fn simulation_rod() -> ControlRod {
    let mut config = test_config(100, 0.0);
    config.waveforms.square = SquareWaveConfig {
        period: 2.0,
        amplitude: 5.0,
        ..SquareWaveConfig::default()
    };
    ControlRod::new(&config).unwrap()
}

#[test]
fn test_simulation_offsets_from_the_baseline() {
    let mut rod = simulation_rod();
    rod.command_move(20.0);
    rod.tick(0.1);
    assert_eq!(rod.exact_position(), 20.0);

    rod.set_operating_mode(OperatingMode::Simulation);
    assert_eq!(rod.simulation_baseline(), 20.0);

    rod.tick(0.1); // within the square's up phase
    assert_eq!(rod.exact_position(), 25.0);
    assert_eq!(rod.actual_position(), 25.0);

    rod.set_operating_mode(OperatingMode::Manual);
    assert_eq!(rod.exact_position(), 20.0, "leaving Simulation restores the baseline");
}

#[test]
fn test_simulation_square_wave_down_phase() {
    let mut rod = simulation_rod();
    rod.command_move(20.0);
    rod.tick(0.1);
    rod.set_operating_mode(OperatingMode::Simulation);

    // Advance past the up half of the 2 s period
    for _ in 0..11 {
        rod.tick(0.1);
    }
    assert_eq!(rod.exact_position(), 20.0);
}

#[test]
fn test_paused_waveform_freezes_simulation_motion() {
    let mut rod = simulation_rod();
    rod.command_move(20.0);
    rod.tick(0.1);
    rod.set_operating_mode(OperatingMode::Simulation);
    rod.tick(0.1);
    assert_eq!(rod.exact_position(), 25.0);

    rod.active_waveform_mut().set_paused(true);
    for _ in 0..30 {
        rod.tick(0.1);
    }
    assert_eq!(rod.exact_position(), 25.0);
    assert!((rod.active_waveform().elapsed() - 0.1).abs() < 1e-9);
}

#[test]
fn test_commands_do_not_move_the_rod_in_simulation() {
    let mut rod = simulation_rod();
    rod.set_operating_mode(OperatingMode::Simulation);
    rod.command_move(80.0);
    rod.tick(0.1);
    // Waveform-driven: baseline 0 plus the up-phase amplitude
    assert_eq!(rod.exact_position(), 5.0);
}

// ============================================================================
// Mode transitions & reconfiguration
// ============================================================================

#[test]
fn test_mode_changes_clear_commands() {
    let mut rod = rod(100, 10.0);
    rod.command_to_top();
    rod.set_operating_mode(OperatingMode::Automatic);
    assert_eq!(rod.command(), CommandKind::None);
    assert_eq!(rod.commanded_position(), rod.exact_position());
}

#[test]
fn test_setting_the_same_mode_is_a_no_op() {
    let mut rod = rod(100, 10.0);
    rod.command_to_top();
    rod.set_operating_mode(OperatingMode::Manual);
    assert_eq!(rod.command(), CommandKind::Top);
}

#[test]
fn test_automatic_mode_moves_like_manual() {
    let mut rod = rod(100, 10.0);
    rod.set_operating_mode(OperatingMode::Automatic);
    rod.command_move(30.0);
    rod.tick(1.0);
    assert_eq!(rod.exact_position(), 10.0);
}

#[test]
fn test_curve_rebuild_setters_surface_errors() {
    let mut rod = rod(100, 10.0);
    assert!(rod.set_worth(200.0).is_ok());
    assert!(rod.set_worth(f64::NAN).is_err());
    assert!(rod.set_step_count(0).is_err());
    assert!(rod.set_curve_parameter(2, 1.0).is_err());
    assert!(rod.set_curve_parameter(1, 0.5).is_ok());
    // Failed rebuilds leave the previous curve intact
    assert_eq!(rod.step_count(), 100);
    assert_eq!(rod.curve().rod_worth(), 200.0);
}

#[test]
fn test_scaled_curve_parameter_keeps_the_inverse_mapping_bounded() {
    let mut rod = rod(100, 10.0);
    rod.set_curve_parameter(1, 0.5).unwrap();

    let pos = rod.curve().position_at_reactivity(0.9 * 165.273);
    assert!(pos.is_finite());
    assert!((0.0..=100.0).contains(&pos));

    // Flattening the fit has no usable inverse and is rejected outright
    assert!(rod.set_curve_parameter(1, 0.0).is_err());
    assert_eq!(rod.curve().curve_params(), [0.0, 0.5]);
}

#[test]
fn test_shrinking_step_count_reclamps_positions() {
    let mut rod = rod(100, 10.0);
    rod.force_position(90.0);
    rod.set_step_count(50).unwrap();
    assert_eq!(rod.exact_position(), 50.0);
    assert_eq!(rod.actual_position(), 50.0);
}

#[test]
fn test_reset_restores_the_startup_state() {
    let mut rod = rod(100, 50.0);
    rod.force_position(80.0);
    rod.scram();
    rod.tick(0.1);
    rod.reset();

    assert_eq!(rod.exact_position(), 0.0);
    assert_eq!(rod.actual_position(), 0.0);
    assert!(rod.is_enabled());
    assert!(!rod.is_scramming());
    assert_eq!(rod.command(), CommandKind::None);
}

#[test]
fn test_snapshot_reflects_rod_state() {
    let mut rod = rod(100, 10.0);
    rod.command_move(50.0);
    rod.tick(1.0);
    let snap = rod.snapshot();

    assert_eq!(snap.name, "Test CR");
    assert_eq!(snap.mode, OperatingMode::Manual);
    assert_eq!(snap.command, CommandKind::Fixed);
    assert_eq!(snap.exact_position, 10.0);
    assert_eq!(snap.actual_position, 10.0);
    assert!(snap.enabled);
    assert!(!snap.firing);
    assert!(!snap.scramming);
    assert!((snap.reactivity_pcm - rod.reactivity()).abs() < 1e-12);
}
