//! Simulation settings, loaded from RON

use rewind_core::TickRate;
use rewind_movement::{KinematicStep, MovementSnapshot};
use rewind_netcode::DriverConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error(transparent)]
    Core(#[from] rewind_core::Error),

    #[error(transparent)]
    Netcode(#[from] rewind_netcode::Error),

    #[error(transparent)]
    Movement(#[from] rewind_movement::Error),

    #[error("Invalid simulation setting: {0}")]
    Invalid(String),
}

/// Everything the demo needs to run
///
/// A `driver` section given in the file replaces the whole driver config,
/// including its divergence policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub ticks: u64,
    pub tick_rate_hz: u32,
    /// One-way latency
    pub latency_ms: u64,
    /// Probability a client command is lost
    pub command_loss: f32,
    /// Probability a server snapshot is lost
    pub snapshot_loss: f32,
    /// Server ticks between snapshots
    pub snapshot_interval: u64,
    /// Ticks between changes of the scripted input
    pub input_hold_ticks: u64,
    pub seed: u64,
    pub driver: DriverConfig,
    pub movement: KinematicStep,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 600,
            tick_rate_hz: 60,
            latency_ms: 80,
            command_loss: 0.05,
            snapshot_loss: 0.02,
            snapshot_interval: 3,
            input_hold_ticks: 20,
            seed: 7,
            driver: DriverConfig::default().with_divergence(MovementSnapshot::default_policy()),
            movement: KinematicStep::default(),
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&source)
    }

    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate()?;
        self.driver.validate_for::<MovementSnapshot>()?;
        self.movement.validate()?;
        for (name, p) in [
            ("command_loss", self.command_loss),
            ("snapshot_loss", self.snapshot_loss),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if self.snapshot_interval == 0 || self.input_hold_ticks == 0 {
            return Err(ConfigError::Invalid(
                "snapshot_interval and input_hold_ticks must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rate(&self) -> Result<TickRate, ConfigError> {
        Ok(TickRate::new(self.tick_rate_hz)?)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}
