//! Rewind Netcode - Client-side prediction with server reconciliation
//!
//! This crate orchestrates *when* and *with which commands* a simulation
//! runs; the simulation itself is a [`StepFunction`](rewind_core::StepFunction)
//! supplied by the game system.
//!
//! - **Prediction**: the client simulates its own entity immediately
//! - **Reconciliation**: authoritative snapshots are compared against the
//!   prediction for the same tick; on divergence the client rewinds to the
//!   authoritative snapshot and replays its retained commands
//! - **Authority**: the server simulates the entity from received commands
//! - **Hand-off**: a bounded SPSC inbox carries messages from the network
//!   thread to the tick loop
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── Client ────────────────────────────┐
//! │  ┌──────────────┐    ┌──────────────────────┐    ┌──────────┐  │
//! │  │ Command      │───▶│ ReconciliationDriver │───▶│  Render  │  │
//! │  │ Queue        │    │  (HistoryBuffer)     │    └──────────┘  │
//! │  └──────────────┘    └──────────────────────┘                  │
//! │                                 ▲ pump()                       │
//! │                          ┌──────┴──────┐                       │
//! │                          │    Inbox    │◀──── network thread   │
//! │                          └─────────────┘                       │
//! └────────────────────────────────────────────────────────────────┘
//! ┌──────────────────────────── Server ────────────────────────────┐
//! │  remote commands ──▶ AuthorityDriver ──▶ outbound() snapshots  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rewind_netcode::{DriverConfig, ReconciliationDriver};
//!
//! let mut driver = ReconciliationDriver::new(entity, step, initial, DriverConfig::default())?;
//! let sender = driver.connect();
//! spawn_network_thread(sender);
//!
//! loop {
//!     // Fold in everything the server sent since last tick
//!     for outcome in driver.pump() {
//!         outcome?;
//!     }
//!
//!     // Predict this tick locally
//!     let input = sample_input();
//!     let predicted = driver.tick(Some(input));
//!     render(predicted);
//! }
//! ```

mod authority;
mod command_queue;
mod config;
mod driver;
mod error;
pub mod inbox;
mod timeline;

pub use authority::AuthorityDriver;
pub use command_queue::CommandQueue;
pub use config::{DriverConfig, MissingInputPolicy, ROUND_TRIP_MARGIN_TICKS};
pub use driver::{DriverPhase, ReconcileOutcome, ReconciliationDriver};
pub use error::{Error, Result};
pub use inbox::{AuthoritativeSnapshot, Inbox, InboxSender, RemoteCommand};
pub use timeline::{DriverStats, SnapshotHistory};

// Re-export core contracts for convenience
pub use rewind_core::{DivergencePolicy, InputCommand, StateSnapshot, StepFunction};
