//! Snapshot and step function contracts
//!
//! These two traits are the seam between the reconciliation machinery and a
//! concrete game system. The machinery decides *when* and *with which
//! command* the simulation runs; the game system decides *what* a step does.
//!
//! # Example
//!
//! ```rust
//! use rewind_core::{DivergencePolicy, InputCommand, StateSnapshot, StepFunction, Tick};
//!
//! #[derive(Debug, Clone)]
//! struct Counter {
//!     tick: Tick,
//!     last_cmd: Option<Tick>,
//!     value: i64,
//! }
//!
//! impl StateSnapshot for Counter {
//!     fn tick(&self) -> Tick {
//!         self.tick
//!     }
//!
//!     fn last_processed_command(&self) -> Option<Tick> {
//!         self.last_cmd
//!     }
//!
//!     fn divergence_fields() -> &'static [&'static str] {
//!         &["value"]
//!     }
//!
//!     fn compare(&self, other: &Self, policy: &DivergencePolicy) -> bool {
//!         policy.field_eq("value", &self.value, &other.value)
//!     }
//! }
//!
//! struct AddInput;
//!
//! impl StepFunction for AddInput {
//!     type Snapshot = Counter;
//!     type Payload = i64;
//!
//!     fn step(&self, previous: &Counter, command: &InputCommand<i64>) -> Counter {
//!         Counter {
//!             tick: command.tick(),
//!             last_cmd: Some(command.tick()),
//!             value: previous.value + command.payload(),
//!         }
//!     }
//! }
//!
//! let start = Counter { tick: 0, last_cmd: None, value: 0 };
//! let next = AddInput.step(&start, &InputCommand::new(1, 5));
//! assert_eq!(next.value, 5);
//! ```

use crate::{DivergencePolicy, InputCommand, Tick};
use std::fmt::Debug;

/// Capability contract for simulated state at one tick
///
/// `Clone` must produce an independent deep copy: the history buffer owns
/// its copy outright and nothing may alias it.
pub trait StateSnapshot: Clone + Debug {
    /// The tick this snapshot describes
    fn tick(&self) -> Tick;

    /// Tick of the newest input command folded into this state
    ///
    /// `None` before any command has been applied.
    fn last_processed_command(&self) -> Option<Tick>;

    /// Names of the fields `compare` knows how to check
    ///
    /// A divergence policy naming anything else is rejected when a driver is
    /// built, so a misspelt field cannot silently disable desync detection.
    fn divergence_fields() -> &'static [&'static str];

    /// Value-equality over the fields the policy counts toward divergence
    ///
    /// Derived and cosmetic fields the policy excludes must not affect the
    /// result.
    fn compare(&self, other: &Self, policy: &DivergencePolicy) -> bool;

    /// One-line rendering for diagnostics
    fn to_debug_string(&self) -> String {
        format!("{:?}", self)
    }
}

/// A pure simulation step: `(previous snapshot, command) -> next snapshot`
///
/// The returned snapshot must carry `command.tick()` as its tick. The step
/// must not read anything beyond its two arguments (no wall clock, no global
/// RNG), otherwise replayed ticks silently drift from the originals.
pub trait StepFunction {
    /// State produced by this step
    type Snapshot: StateSnapshot;

    /// Command data consumed by this step
    type Payload;

    /// Compute the snapshot for `command.tick()` from its predecessor
    fn step(
        &self,
        previous: &Self::Snapshot,
        command: &InputCommand<Self::Payload>,
    ) -> Self::Snapshot;
}

impl<F: StepFunction + ?Sized> StepFunction for &F {
    type Snapshot = F::Snapshot;
    type Payload = F::Payload;

    fn step(
        &self,
        previous: &Self::Snapshot,
        command: &InputCommand<Self::Payload>,
    ) -> Self::Snapshot {
        (**self).step(previous, command)
    }
}

impl<F: StepFunction + ?Sized> StepFunction for Box<F> {
    type Snapshot = F::Snapshot;
    type Payload = F::Payload;

    fn step(
        &self,
        previous: &Self::Snapshot,
        command: &InputCommand<Self::Payload>,
    ) -> Self::Snapshot {
        (**self).step(previous, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pos {
        tick: Tick,
        x: i32,
        trail: Vec<i32>,
    }

    impl StateSnapshot for Pos {
        fn tick(&self) -> Tick {
            self.tick
        }

        fn last_processed_command(&self) -> Option<Tick> {
            None
        }

        fn divergence_fields() -> &'static [&'static str] {
            &["x", "trail"]
        }

        fn compare(&self, other: &Self, policy: &DivergencePolicy) -> bool {
            policy.field_eq("x", &self.x, &other.x)
                && policy.field_eq("trail", &self.trail, &other.trail)
        }
    }

    struct Walk;

    impl StepFunction for Walk {
        type Snapshot = Pos;
        type Payload = i32;

        fn step(&self, previous: &Pos, command: &InputCommand<i32>) -> Pos {
            let mut next = previous.clone();
            next.tick = command.tick();
            next.x += command.payload();
            next.trail.push(next.x);
            next
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let a = Pos {
            tick: 0,
            x: 1,
            trail: vec![1],
        };
        let mut b = a.clone();
        b.trail.push(2);
        assert_eq!(a.trail, vec![1]);
    }

    #[test]
    fn test_step_through_references() {
        let start = Pos {
            tick: 0,
            x: 0,
            trail: Vec::new(),
        };
        let boxed: Box<dyn StepFunction<Snapshot = Pos, Payload = i32>> = Box::new(Walk);
        let by_ref = &Walk;
        let a = boxed.step(&start, &InputCommand::new(1, 2));
        let b = by_ref.step(&start, &InputCommand::new(1, 2));
        assert_eq!(a, b);
        assert_eq!(a.tick, 1);
    }

    #[test]
    fn test_compare_respects_policy() {
        let a = Pos {
            tick: 1,
            x: 5,
            trail: vec![1, 5],
        };
        let b = Pos {
            tick: 1,
            x: 5,
            trail: vec![2, 5],
        };
        assert!(!a.compare(&b, &DivergencePolicy::strict()));
        assert!(a.compare(&b, &DivergencePolicy::only(["x"])));
        assert!(a.to_debug_string().contains("trail"));
    }
}
