//! Rewind Core - Contracts for tick-based prediction and reconciliation
//!
//! This crate provides the vocabulary shared by every participant:
//! - Tick-indexed input commands (`InputCommand`)
//! - The snapshot capability contract (`StateSnapshot`)
//! - The pure simulation step contract (`StepFunction`)
//! - Divergence policy: which snapshot fields count as a desync
//! - Fixed tick rate and a deterministic RNG for step functions
//!
//! ## Determinism
//!
//! A `StepFunction` may be invoked several times for the same tick: once
//! during live prediction and again whenever a correction forces a replay.
//! Both invocations must produce identical snapshots, so a step function
//! must only read its two inputs. Randomness goes through a
//! [`DeterministicRng`] whose state travels inside the snapshot.

mod command;
mod divergence;
mod error;
mod identity;
mod rng;
mod snapshot;
pub mod time;

pub use command::InputCommand;
pub use divergence::{DivergenceFields, DivergencePolicy};
pub use error::{Error, Result};
pub use identity::EntityId;
pub use rng::DeterministicRng;
pub use snapshot::{StateSnapshot, StepFunction};
pub use time::{Tick, TickRate};
