//! Shared advance and replay machinery
//!
//! A timeline is one participant's view of one entity: the newest snapshot,
//! the retained history, and the commands waiting to be simulated. Both the
//! predicting client and the authoritative server advance a timeline the
//! same way; only the client ever rewinds one.

use crate::{CommandQueue, DriverConfig, Error, MissingInputPolicy, Result};
use rewind_core::{EntityId, InputCommand, StateSnapshot, StepFunction, Tick};
use rewind_history::HistoryBuffer;
use tracing::{error, trace};

/// History of snapshots paired with the commands that produced them
pub type SnapshotHistory<F> =
    HistoryBuffer<<F as StepFunction>::Snapshot, InputCommand<<F as StepFunction>::Payload>>;

/// Counters describing what a driver has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Ticks simulated forward (not counting replays)
    pub ticks: u64,
    /// Ticks that ran on a synthesized command
    pub synthesized_commands: u64,
    /// History entries evicted because the buffer was full
    pub history_overflows: u64,
    /// Queued commands evicted because the queue was full
    pub command_overflows: u64,
    /// Commands rejected for arriving after their tick
    pub late_commands: u64,
    /// Authoritative snapshots that matched the prediction
    pub agreed: u64,
    /// Authoritative snapshots that forced a resimulation
    pub corrected: u64,
    /// Authoritative snapshots older than the retained window
    pub stale: u64,
    /// Ticks recomputed during resimulation
    pub replayed_ticks: u64,
}

pub(crate) struct Timeline<F: StepFunction> {
    entity: EntityId,
    step: F,
    history: SnapshotHistory<F>,
    latest: F::Snapshot,
    latest_tick: Tick,
    queue: CommandQueue<F::Payload>,
    last_command: Option<InputCommand<F::Payload>>,
    missing_input: MissingInputPolicy,
    pub(crate) stats: DriverStats,
}

impl<F> Timeline<F>
where
    F: StepFunction,
    F::Payload: Clone + Default,
{
    pub(crate) fn new(
        entity: EntityId,
        step: F,
        initial: F::Snapshot,
        config: &DriverConfig,
    ) -> Result<Self> {
        let latest_tick = initial.tick();
        let mut history = HistoryBuffer::new(config.history_capacity);
        history.append(latest_tick, initial.clone(), None)?;

        let mut queue = CommandQueue::new(config.command_queue_capacity);
        queue.discard_through(latest_tick);

        Ok(Self {
            entity,
            step,
            history,
            latest: initial,
            latest_tick,
            queue,
            last_command: None,
            missing_input: config.missing_input,
            stats: DriverStats::default(),
        })
    }

    /// Queue a command for a future tick
    pub(crate) fn submit(&mut self, command: InputCommand<F::Payload>) -> Result<()> {
        match self.queue.push(command) {
            Ok(Some(evicted)) => {
                self.stats.command_overflows += 1;
                trace!(
                    entity = %self.entity,
                    evicted = evicted.tick(),
                    "command queue full, evicted oldest command"
                );
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.stats.late_commands += 1;
                Err(err)
            }
        }
    }

    /// Simulate the next tick
    ///
    /// The command is the explicit payload if given, otherwise the queued
    /// command for the tick, otherwise one synthesized per policy.
    pub(crate) fn advance(&mut self, payload: Option<F::Payload>) -> &F::Snapshot {
        let tick = self.latest_tick + 1;
        let queued = self.queue.pop_for(tick);
        let command = match (payload, queued) {
            (Some(payload), _) => InputCommand::new(tick, payload),
            (None, Some(command)) => command,
            (None, None) => {
                self.stats.synthesized_commands += 1;
                self.synthesize(tick)
            }
        };

        let next = self.step.step(&self.latest, &command);
        self.check_step(&next, tick);

        match self.history.append(tick, next.clone(), Some(command.clone())) {
            Ok(Some(evicted)) => {
                self.stats.history_overflows += 1;
                trace!(
                    entity = %self.entity,
                    evicted = evicted.tick,
                    "history full, evicted oldest tick"
                );
            }
            Ok(None) => {}
            Err(err) => {
                error!(entity = %self.entity, tick, %err, "history rejected predicted tick");
            }
        }

        trace!(entity = %self.entity, tick, "advanced");
        self.last_command = Some(command);
        self.latest = next;
        self.latest_tick = tick;
        self.stats.ticks += 1;
        &self.latest
    }

    fn synthesize(&self, tick: Tick) -> InputCommand<F::Payload> {
        match (self.missing_input, &self.last_command) {
            (MissingInputPolicy::RepeatLast, Some(last)) => last.retagged(tick),
            _ => InputCommand::neutral(tick),
        }
    }

    /// Report step function contract violations
    fn check_step(&self, next: &F::Snapshot, tick: Tick) {
        if next.tick() != tick {
            error!(
                entity = %self.entity,
                expected = tick,
                got = next.tick(),
                "step function produced a snapshot for the wrong tick"
            );
        }
        if next.last_processed_command() < self.latest.last_processed_command() {
            error!(
                entity = %self.entity,
                tick,
                previous = ?self.latest.last_processed_command(),
                got = ?next.last_processed_command(),
                "last processed command moved backwards"
            );
        }
    }

    /// Replace the snapshot at `base_tick` and recompute every later tick
    ///
    /// Returns the number of recomputed ticks.
    pub(crate) fn replay_from(&mut self, base_tick: Tick, base: F::Snapshot) -> Result<usize> {
        self.history.replace(base_tick, base.clone())?;

        let mut current = base;
        let mut replayed = 0;
        for tick in base_tick + 1..=self.latest_tick {
            let next = {
                let command = self
                    .history
                    .command(tick)
                    .ok_or(Error::MissingCommand(tick))?;
                self.step.step(&current, command)
            };
            self.history.replace(tick, next.clone())?;
            current = next;
            replayed += 1;
        }

        self.latest = current;
        self.stats.replayed_ticks += replayed as u64;
        Ok(replayed)
    }

    /// Drop all history and restart from `snapshot`
    pub(crate) fn reset_to(&mut self, snapshot: F::Snapshot) -> Result<()> {
        let tick = snapshot.tick();
        self.history.clear();
        self.history.append(tick, snapshot.clone(), None)?;
        self.queue.discard_through(tick);
        self.last_command = None;
        self.latest = snapshot;
        self.latest_tick = tick;
        Ok(())
    }

    pub(crate) fn entity(&self) -> EntityId {
        self.entity
    }

    pub(crate) fn step_function(&self) -> &F {
        &self.step
    }

    pub(crate) fn latest(&self) -> &F::Snapshot {
        &self.latest
    }

    pub(crate) fn latest_tick(&self) -> Tick {
        self.latest_tick
    }

    pub(crate) fn history(&self) -> &SnapshotHistory<F> {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut SnapshotHistory<F> {
        &mut self.history
    }

    pub(crate) fn queue(&self) -> &CommandQueue<F::Payload> {
        &self.queue
    }

    pub(crate) fn queue_mut(&mut self) -> &mut CommandQueue<F::Payload> {
        &mut self.queue
    }
}
