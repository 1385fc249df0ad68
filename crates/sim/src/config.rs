//! Simulation settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Simulated duration in seconds.
    pub seconds: u64,
    /// Fixed frame length in milliseconds.
    pub frame_ms: u64,
    /// Radius of the target's strafing circle.
    pub orbit_radius: f32,
    pub log_dir: Option<PathBuf>,
}

impl SimConfig {
    /// Environment variables:
    /// - `ARENA_SIM_SECONDS` - Simulated duration (default: 30)
    /// - `ARENA_SIM_FRAME_MS` - Frame length (default: 50)
    /// - `ARENA_SIM_ORBIT` - Strafing radius (default: 420)
    /// - `ARENA_LOG_DIR` - Also write logs to `arena-sim.log` in this directory
    pub fn from_env() -> Self {
        Self {
            seconds: read_env("ARENA_SIM_SECONDS").unwrap_or(30),
            frame_ms: read_env::<u64>("ARENA_SIM_FRAME_MS")
                .unwrap_or(50)
                .max(1),
            orbit_radius: read_env("ARENA_SIM_ORBIT").unwrap_or(420.0),
            log_dir: env::var("ARENA_LOG_DIR").ok().map(PathBuf::from),
        }
    }

    pub fn frames(&self) -> u64 {
        self.seconds * 1_000 / self.frame_ms
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}
