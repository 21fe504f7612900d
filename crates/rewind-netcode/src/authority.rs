//! Server-side authoritative simulation
//!
//! The server runs the same step function as the client, fed by commands
//! received from the remote player. Its snapshots are the truth the client
//! reconciles against. A command that arrives after its tick was simulated
//! is dropped; the tick already ran on a synthesized command.

use crate::inbox::{self, AuthoritativeSnapshot, Inbox, InboxSender, RemoteCommand};
use crate::timeline::{SnapshotHistory, Timeline};
use crate::{DriverConfig, DriverStats, Error, Result};
use rewind_core::{EntityId, InputCommand, StepFunction, Tick};
use tracing::{debug, warn};

/// Authoritative simulation of one entity
pub struct AuthorityDriver<F: StepFunction> {
    timeline: Timeline<F>,
    inbox: Option<Inbox<RemoteCommand<F::Payload>>>,
    inbox_capacity: usize,
}

impl<F> AuthorityDriver<F>
where
    F: StepFunction,
    F::Payload: Clone + Default,
{
    /// Create an authority starting from `initial`
    pub fn new(
        entity: EntityId,
        step: F,
        initial: F::Snapshot,
        config: DriverConfig,
    ) -> Result<Self> {
        config.validate_for::<F::Snapshot>()?;
        Ok(Self {
            timeline: Timeline::new(entity, step, initial, &config)?,
            inbox: None,
            inbox_capacity: config.inbox_capacity,
        })
    }

    /// Accept a command from the remote player
    ///
    /// Commands for ticks already simulated fail with `CommandOutOfOrder`
    /// and are counted as late.
    pub fn receive(&mut self, command: InputCommand<F::Payload>) -> Result<()> {
        let tick = command.tick();
        let result = self.timeline.submit(command);
        if let Err(Error::CommandOutOfOrder { floor, .. }) = &result {
            debug!(entity = %self.timeline.entity(), tick, floor, "dropping late command");
        }
        result
    }

    /// Simulate the next tick
    pub fn tick(&mut self) -> &F::Snapshot {
        self.timeline.advance(None)
    }

    /// Open the hand-off for remote commands
    pub fn connect(&mut self) -> InboxSender<RemoteCommand<F::Payload>> {
        let (sender, inbox) = inbox::channel(self.inbox_capacity);
        self.inbox = Some(inbox);
        sender
    }

    /// Close the hand-off, discarding anything undelivered
    pub fn disconnect(&mut self) {
        self.inbox = None;
    }

    /// Queue every command handed off since the last call
    ///
    /// Returns the number of commands accepted. Late commands and commands
    /// for another entity are dropped.
    pub fn pump(&mut self) -> usize {
        let messages: Vec<_> = match &self.inbox {
            Some(inbox) => inbox.drain().collect(),
            None => return 0,
        };

        let entity = self.timeline.entity();
        let mut accepted = 0;
        for message in messages {
            if message.entity != entity {
                warn!(%entity, received = %message.entity, "dropping command for another entity");
                continue;
            }
            if self.receive(message.command).is_ok() {
                accepted += 1;
            }
        }
        accepted
    }

    /// The newest authoritative snapshot, wrapped for transmission
    pub fn outbound(&self) -> AuthoritativeSnapshot<F::Snapshot> {
        AuthoritativeSnapshot {
            entity: self.timeline.entity(),
            snapshot: self.timeline.latest().clone(),
        }
    }

    /// The newest authoritative snapshot
    pub fn latest(&self) -> &F::Snapshot {
        self.timeline.latest()
    }

    /// A retained snapshot, e.g. for lag compensation
    pub fn snapshot_at(&self, tick: Tick) -> Option<&F::Snapshot> {
        self.timeline.history().get(tick)
    }

    /// Tick of the newest snapshot
    pub fn current_tick(&self) -> Tick {
        self.timeline.latest_tick()
    }

    /// The entity this authority simulates
    pub fn entity(&self) -> EntityId {
        self.timeline.entity()
    }

    /// Whether an inbox is open
    pub fn is_connected(&self) -> bool {
        self.inbox.is_some()
    }

    /// Number of received commands not yet simulated
    pub fn pending_commands(&self) -> usize {
        self.timeline.queue().len()
    }

    /// Retained snapshots and commands
    pub fn history(&self) -> &SnapshotHistory<F> {
        self.timeline.history()
    }

    /// Counters since creation
    pub fn stats(&self) -> DriverStats {
        self.timeline.stats
    }
}
