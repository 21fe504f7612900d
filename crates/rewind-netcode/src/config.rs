//! Driver configuration
//!
//! Sizes of the per-participant buffers, the policy for ticks without input,
//! and the divergence policy. Loadable from RON.

use crate::{Error, Result};
use rewind_core::{DivergencePolicy, StateSnapshot, TickRate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Extra ticks of history kept beyond one round trip, to absorb jitter
pub const ROUND_TRIP_MARGIN_TICKS: usize = 8;

/// What to feed the step function when no command exists for a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MissingInputPolicy {
    /// Repeat the last applied command's payload
    #[default]
    RepeatLast,
    /// Use the payload's `Default` (no buttons, zero axes)
    Neutral,
}

/// Configuration shared by the client and server drivers
///
/// # Example
///
/// ```
/// use rewind_netcode::{DriverConfig, MissingInputPolicy};
///
/// let config = DriverConfig::from_ron(r#"(
///     history_capacity: 32,
///     missing_input: Neutral,
///     divergence: (fields: Only(["position", "rotation"]), tolerance: 0.001),
/// )"#).unwrap();
///
/// assert_eq!(config.history_capacity, 32);
/// assert_eq!(config.missing_input, MissingInputPolicy::Neutral);
/// assert!(!config.divergence.includes("velocity"));
/// // Unspecified fields keep their defaults
/// assert_eq!(config.command_queue_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Ticks of snapshot history retained per participant
    pub history_capacity: usize,
    /// Pending commands queued ahead of simulation
    pub command_queue_capacity: usize,
    /// Messages buffered in the network-to-tick-loop hand-off
    pub inbox_capacity: usize,
    /// Policy for ticks without a command
    pub missing_input: MissingInputPolicy,
    /// Fields that count toward divergence
    pub divergence: DivergencePolicy,
}

impl DriverConfig {
    /// Parse and validate a configuration from RON
    pub fn from_ron(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Size the history to cover one round trip at the given tick rate
    ///
    /// ```
    /// use rewind_core::TickRate;
    /// use rewind_netcode::DriverConfig;
    /// use std::time::Duration;
    ///
    /// let rate = TickRate::new(60).unwrap();
    /// let config = DriverConfig::for_round_trip(Duration::from_millis(200), rate);
    /// assert_eq!(config.history_capacity, 12 + rewind_netcode::ROUND_TRIP_MARGIN_TICKS);
    /// ```
    pub fn for_round_trip(rtt: Duration, rate: TickRate) -> Self {
        Self {
            history_capacity: rate.ticks_for(rtt) as usize + ROUND_TRIP_MARGIN_TICKS,
            ..Self::default()
        }
    }

    /// Check that every capacity is usable
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(Error::InvalidConfig(
                "history_capacity must be greater than 0".into(),
            ));
        }
        if self.command_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "command_queue_capacity must be greater than 0".into(),
            ));
        }
        if self.inbox_capacity == 0 {
            return Err(Error::InvalidConfig(
                "inbox_capacity must be greater than 0".into(),
            ));
        }
        self.divergence.validate()?;
        Ok(())
    }

    /// Validate, and check the divergence policy only names fields `S` compares
    pub fn validate_for<S: StateSnapshot>(&self) -> Result<()> {
        self.validate()?;
        let known = S::divergence_fields();
        let unknown = self.divergence.unknown_fields(known);
        if !unknown.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "unknown divergence field(s) {unknown:?}, expected any of {known:?}"
            )));
        }
        Ok(())
    }

    /// Set the history capacity
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the command queue capacity
    pub fn with_command_queue_capacity(mut self, capacity: usize) -> Self {
        self.command_queue_capacity = capacity;
        self
    }

    /// Set the missing input policy
    pub fn with_missing_input(mut self, policy: MissingInputPolicy) -> Self {
        self.missing_input = policy;
        self
    }

    /// Set the divergence policy
    pub fn with_divergence(mut self, policy: DivergencePolicy) -> Self {
        self.divergence = policy;
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            history_capacity: 64,
            command_queue_capacity: 64,
            inbox_capacity: 256,
            missing_input: MissingInputPolicy::default(),
            divergence: DivergencePolicy::strict(),
        }
    }
}
