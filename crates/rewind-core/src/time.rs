//! Fixed-rate simulation time
//!
//! Every participant advances its simulation once per fixed tick. The tick
//! number is the only ordering key for commands and snapshots.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A discrete simulation step index
pub type Tick = u64;

/// Fixed simulation rate in ticks per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRate {
    hz: u32,
}

impl TickRate {
    /// Create a tick rate. Zero is rejected.
    pub fn new(hz: u32) -> Result<Self> {
        if hz == 0 {
            return Err(Error::InvalidTickRate(hz));
        }
        Ok(Self { hz })
    }

    /// Ticks per second
    pub fn hz(&self) -> u32 {
        self.hz
    }

    /// Wall-clock duration of one tick
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.hz as f64)
    }

    /// Fixed step in seconds, for step functions that integrate motion
    pub fn delta_seconds(&self) -> f32 {
        1.0 / self.hz as f32
    }

    /// Number of ticks needed to cover `span`, rounded up
    ///
    /// ```
    /// use rewind_core::TickRate;
    /// use std::time::Duration;
    ///
    /// let rate = TickRate::new(60).unwrap();
    /// assert_eq!(rate.ticks_for(Duration::from_millis(100)), 6);
    /// assert_eq!(rate.ticks_for(Duration::from_millis(101)), 7);
    /// ```
    pub fn ticks_for(&self, span: Duration) -> u64 {
        let nanos = span.as_nanos() * self.hz as u128;
        nanos.div_ceil(1_000_000_000) as u64
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self { hz: 60 }
    }
}
