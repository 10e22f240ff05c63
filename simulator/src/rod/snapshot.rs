//! Read-only rod telemetry
//!
//! One record per rod per frame, consumed by the display/plotting layer.
//! No mutation path originates here.

use serde::Serialize;

use super::{CommandKind, OperatingMode};

#[derive(Debug, Clone, Serialize)]
pub struct RodSnapshot {
    pub name: String,
    pub mode: OperatingMode,
    pub command: CommandKind,
    pub enabled: bool,
    pub firing: bool,
    pub scramming: bool,
    pub exact_position: f64,
    pub actual_position: f64,
    pub commanded_position: f64,
    pub speed: f64,
    pub reactivity_pcm: f64,
}
