//! Movement state snapshot

use crate::Vec3;
use rewind_core::{DivergencePolicy, StateSnapshot, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field names understood by [`MovementSnapshot::compare`]
pub mod fields {
    pub const LAST_PROCESSED_COMMAND: &str = "last_processed_command";
    pub const POSITION: &str = "position";
    pub const ROTATION: &str = "rotation";
    pub const VELOCITY: &str = "velocity";
    pub const ANGULAR_VELOCITY: &str = "angular_velocity";
    pub const JUMP_TICKS_UNTIL: &str = "jump_ticks_until";
}

/// Kinematic character state at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSnapshot {
    pub tick: Tick,
    pub last_processed_command: Option<Tick>,
    pub position: Vec3,
    /// Yaw in radians, (-PI, PI]
    pub rotation: f32,
    pub velocity: Vec3,
    /// Yaw rate in radians per second
    pub angular_velocity: f32,
    /// Ticks until a jump is allowed again
    pub jump_ticks_until: u32,
}

impl MovementSnapshot {
    /// A character at rest
    pub fn spawn(tick: Tick, position: Vec3) -> Self {
        Self {
            tick,
            last_processed_command: None,
            position,
            rotation: 0.0,
            velocity: Vec3::ZERO,
            angular_velocity: 0.0,
            jump_ticks_until: 0,
        }
    }

    /// Only command id, position and rotation count toward divergence
    ///
    /// Velocities are rederived from input every step, so a mismatch there
    /// corrects itself without a replay.
    pub fn default_policy() -> DivergencePolicy {
        DivergencePolicy::only([
            fields::LAST_PROCESSED_COMMAND,
            fields::POSITION,
            fields::ROTATION,
        ])
    }

    /// Whether the character stands on the ground plane
    pub fn is_grounded(&self) -> bool {
        self.position.y <= 0.0
    }
}

impl StateSnapshot for MovementSnapshot {
    fn tick(&self) -> Tick {
        self.tick
    }

    fn last_processed_command(&self) -> Option<Tick> {
        self.last_processed_command
    }

    fn divergence_fields() -> &'static [&'static str] {
        &[
            fields::LAST_PROCESSED_COMMAND,
            fields::POSITION,
            fields::ROTATION,
            fields::VELOCITY,
            fields::ANGULAR_VELOCITY,
            fields::JUMP_TICKS_UNTIL,
        ]
    }

    fn compare(&self, other: &Self, policy: &DivergencePolicy) -> bool {
        policy.field_eq(
            fields::LAST_PROCESSED_COMMAND,
            &self.last_processed_command,
            &other.last_processed_command,
        ) && policy.floats_eq(
            fields::POSITION,
            &self.position.to_array(),
            &other.position.to_array(),
        ) && policy.float_eq(fields::ROTATION, self.rotation, other.rotation)
            && policy.floats_eq(
                fields::VELOCITY,
                &self.velocity.to_array(),
                &other.velocity.to_array(),
            )
            && policy.float_eq(
                fields::ANGULAR_VELOCITY,
                self.angular_velocity,
                other.angular_velocity,
            )
            && policy.field_eq(
                fields::JUMP_TICKS_UNTIL,
                &self.jump_ticks_until,
                &other.jump_ticks_until,
            )
    }

    fn to_debug_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MovementSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick: {} lastcmd: {:?} pos: {} rot: {:.3} vel: {} angvel: {:.3} jump_in: {}",
            self.tick,
            self.last_processed_command,
            self.position,
            self.rotation,
            self.velocity,
            self.angular_velocity,
            self.jump_ticks_until
        )
    }
}
