//! Movement input payload

use serde::{Deserialize, Serialize};

/// Button bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buttons(pub u8);

impl Buttons {
    pub const NONE: Self = Self(0);
    pub const JUMP: Self = Self(1 << 0);
    pub const SPRINT: Self = Self(1 << 1);

    /// Whether every bit of `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two masks
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Player intent for one tick
///
/// `Default` is the neutral input: no movement, no buttons.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementInput {
    /// Strafe axis, -1 (left) to 1 (right)
    pub move_x: f32,
    /// Forward axis, -1 (back) to 1 (forward)
    pub move_z: f32,
    /// Turn applied this tick, radians
    pub yaw_delta: f32,
    /// Held buttons
    pub buttons: Buttons,
}

impl MovementInput {
    /// Move along the given axes
    pub fn axes(move_x: f32, move_z: f32) -> Self {
        Self {
            move_x,
            move_z,
            ..Self::default()
        }
    }

    /// Add held buttons
    pub fn pressing(mut self, buttons: Buttons) -> Self {
        self.buttons = self.buttons.with(buttons);
        self
    }

    /// Add a turn
    pub fn turning(mut self, yaw_delta: f32) -> Self {
        self.yaw_delta = yaw_delta;
        self
    }
}
