//! Reference movement system for rewind
//!
//! A kinematic character controller expressed as a [`StepFunction`]:
//! walk and sprint on the ground plane, turn by yaw, jump with a cooldown,
//! fall under gravity. It exists to exercise prediction and reconciliation
//! with something closer to a game than a counter.
//!
//! ```
//! use rewind_core::{InputCommand, StepFunction};
//! use rewind_movement::{KinematicStep, MovementInput, MovementSnapshot, Vec3};
//!
//! let step = KinematicStep::default();
//! let start = MovementSnapshot::spawn(0, Vec3::ZERO);
//! let next = step.step(&start, &InputCommand::new(1, MovementInput::axes(0.0, 1.0)));
//! assert!(next.position.z > 0.0);
//! ```
//!
//! [`StepFunction`]: rewind_core::StepFunction

mod error;
mod input;
mod math;
mod snapshot;
mod step;

pub use error::{Error, Result};
pub use input::{Buttons, MovementInput};
pub use math::{wrap_angle, Vec3};
pub use snapshot::{fields, MovementSnapshot};
pub use step::KinematicStep;
