//! Rod Simulator CLI - scripted host loop
//!
//! Thin host around the rod core: builds a rod bank from a JSON config (or
//! the calibrated defaults), drives the per-tick loop through a withdraw →
//! hold → scram scenario, and prints JSON-lines telemetry to stdout. The
//! reactor-wide kinetics model that would consume the reactivity sum lives
//! elsewhere; this binary just demonstrates the host contract.

use std::fs;
use std::process::ExitCode;

use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;

use rod_simulator_core_rs::{ControlRod, RodConfig};

/// Host-side scenario input; rods fall back to the calibrated three-rod bank
#[derive(Debug, Deserialize)]
struct ScenarioConfig {
    #[serde(default = "default_rod_bank")]
    rods: Vec<RodConfig>,

    /// Simulation frame length (seconds)
    #[serde(default = "default_dt")]
    dt: f64,

    /// Seconds of withdrawal/hold before the scram is triggered
    #[serde(default = "default_scram_after")]
    scram_after: f64,

    /// Telemetry emission interval (seconds)
    #[serde(default = "default_report_every")]
    report_every: f64,
}

fn default_rod_bank() -> Vec<RodConfig> {
    vec![RodConfig::safety(), RodConfig::regulatory(), RodConfig::shim()]
}

fn default_dt() -> f64 {
    0.05
}

fn default_scram_after() -> f64 {
    5.0
}

fn default_report_every() -> f64 {
    0.25
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            rods: default_rod_bank(),
            dt: default_dt(),
            scram_after: default_scram_after(),
            report_every: default_report_every(),
        }
    }
}

fn load_config() -> Result<ScenarioConfig, String> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .map_err(|e| format!("cannot read config {}: {}", path, e))?;
            serde_json::from_str(&raw).map_err(|e| format!("invalid config {}: {}", path, e))
        }
        None => Ok(ScenarioConfig::default()),
    }
}

fn emit_telemetry(time: f64, rods: &[ControlRod]) {
    let snapshots: Vec<_> = rods.iter().map(|rod| rod.snapshot()).collect();
    let total_pcm: f64 = rods.iter().map(|rod| rod.reactivity()).sum();
    let line = json!({
        "time": time,
        "total_reactivity_pcm": total_pcm,
        "rods": snapshots,
    });
    println!("{}", line);
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match load_config() {
        Ok(config) => config,
        Err(msg) => {
            error!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    let mut rods = Vec::with_capacity(config.rods.len());
    for rod_config in &config.rods {
        match ControlRod::new(rod_config) {
            Ok(rod) => rods.push(rod),
            Err(e) => {
                error!("rod '{}' rejected: {}", rod_config.name, e);
                return ExitCode::FAILURE;
            }
        }
    }

    info!("rod bank ready: {} rods, dt = {} s", rods.len(), config.dt);

    // Phase 1: withdraw everything toward the top
    for rod in &mut rods {
        rod.command_to_top();
    }
    info!("phase 1: withdrawing all rods to the top");

    let mut time = 0.0;
    let mut next_report = 0.0;
    let mut scrammed = false;

    loop {
        for rod in &mut rods {
            rod.tick(config.dt);
        }
        time += config.dt;

        if time >= next_report {
            emit_telemetry(time, &rods);
            next_report += config.report_every;
        }

        if !scrammed && time >= config.scram_after {
            warn!("phase 2: scram at t = {:.2} s", time);
            for rod in &mut rods {
                rod.scram();
            }
            scrammed = true;
        }

        let all_down = rods
            .iter()
            .all(|rod| rod.actual_position() == 0.0 && !rod.is_firing());
        if scrammed && all_down {
            emit_telemetry(time, &rods);
            info!("all rods down at t = {:.2} s", time);
            break;
        }

        // Safety stop for configs whose rods cannot reach the bottom
        if time > config.scram_after + 3600.0 {
            warn!("scenario timed out before all rods reached the bottom");
            break;
        }
    }

    ExitCode::SUCCESS
}
