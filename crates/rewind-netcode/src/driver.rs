//! Client-side prediction and reconciliation
//!
//! The driver advances a locally predicted timeline every tick and folds in
//! authoritative snapshots as they arrive. A snapshot that agrees with the
//! prediction for its tick only trims history; one that disagrees replaces
//! that tick and every later tick is recomputed from the retained commands.

use crate::inbox::{self, AuthoritativeSnapshot, Inbox, InboxSender};
use crate::timeline::{SnapshotHistory, Timeline};
use crate::{DriverConfig, DriverStats, Error, Result};
use rewind_core::{DivergencePolicy, EntityId, InputCommand, StateSnapshot, StepFunction, Tick};
use tracing::{debug, error, warn};

/// Where the driver is in its lifecycle
///
/// Resimulation after a correction runs to completion inside
/// [`ReconciliationDriver::apply_authoritative`] and is reported through
/// [`ReconcileOutcome::Corrected`], so it is never an observable phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    /// Created, no tick predicted yet
    Idle,
    /// Advancing local prediction every tick
    Predicting,
}

/// Result of folding in one authoritative snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Prediction matched; later ticks untouched
    Agreed,
    /// Prediction diverged; `replayed` later ticks were recomputed
    Corrected { replayed: usize },
    /// Older than the retained window; nothing changed
    Stale,
}

/// Client-side prediction driver for one entity
///
/// Single-threaded: only the owning tick loop calls into it. Authoritative
/// snapshots from another thread go through [`connect`](Self::connect) and
/// are applied by [`pump`](Self::pump) at the start of a tick.
///
/// # Example
///
/// ```rust,ignore
/// let mut driver = ReconciliationDriver::new(entity, step, initial, config)?;
/// let sender = driver.connect();
/// hand_to_network_thread(sender);
///
/// loop {
///     for outcome in driver.pump() {
///         outcome?;
///     }
///     let predicted = driver.tick(sample_input());
///     render(predicted);
///     send_to_server(driver.predicted_tick(), last_input);
/// }
/// ```
pub struct ReconciliationDriver<F: StepFunction> {
    timeline: Timeline<F>,
    divergence: DivergencePolicy,
    phase: DriverPhase,
    confirmed_tick: Option<Tick>,
    inbox: Option<Inbox<AuthoritativeSnapshot<F::Snapshot>>>,
    inbox_capacity: usize,
}

impl<F> ReconciliationDriver<F>
where
    F: StepFunction,
    F::Payload: Clone + Default,
{
    /// Create a driver starting from `initial`
    ///
    /// The initial snapshot becomes the first history entry, so an
    /// authoritative snapshot for its tick can still be compared.
    pub fn new(
        entity: EntityId,
        step: F,
        initial: F::Snapshot,
        config: DriverConfig,
    ) -> Result<Self> {
        config.validate_for::<F::Snapshot>()?;
        Ok(Self {
            timeline: Timeline::new(entity, step, initial, &config)?,
            divergence: config.divergence,
            phase: DriverPhase::Idle,
            confirmed_tick: None,
            inbox: None,
            inbox_capacity: config.inbox_capacity,
        })
    }

    /// Queue a command sampled ahead of its tick
    pub fn submit(&mut self, command: InputCommand<F::Payload>) -> Result<()> {
        self.timeline.submit(command)
    }

    /// Predict the next tick
    ///
    /// `Some(payload)` applies that input; `None` uses the queued command for
    /// the tick, or one synthesized per the missing input policy. Never fails.
    pub fn tick(&mut self, payload: Option<F::Payload>) -> &F::Snapshot {
        if self.phase == DriverPhase::Idle {
            debug!(entity = %self.timeline.entity(), "prediction started");
            self.phase = DriverPhase::Predicting;
        }
        self.timeline.advance(payload)
    }

    /// Fold in an authoritative snapshot
    ///
    /// Fails only when the snapshot is newer than anything predicted, which
    /// means the caller's message routing or tick loop is broken.
    pub fn apply_authoritative(&mut self, authoritative: F::Snapshot) -> Result<ReconcileOutcome> {
        let entity = self.timeline.entity();
        let tick = authoritative.tick();
        let newest = self.timeline.latest_tick();
        if tick > newest {
            error!(%entity, tick, newest, "authoritative snapshot is ahead of local prediction");
            return Err(Error::AuthoritativeFromFuture { tick, newest });
        }

        let agrees = match self.timeline.history().get(tick) {
            Some(predicted) => {
                let agrees = predicted.compare(&authoritative, &self.divergence);
                if !agrees {
                    debug!(
                        %entity,
                        tick,
                        predicted = %predicted.to_debug_string(),
                        authoritative = %authoritative.to_debug_string(),
                        "prediction diverged"
                    );
                }
                agrees
            }
            None => {
                self.timeline.stats.stale += 1;
                debug!(
                    %entity,
                    tick,
                    oldest = ?self.timeline.history().oldest_tick(),
                    "discarding stale authoritative snapshot"
                );
                return Ok(ReconcileOutcome::Stale);
            }
        };

        self.confirmed_tick = Some(self.confirmed_tick.map_or(tick, |t| t.max(tick)));
        self.timeline.queue_mut().acknowledge(tick);

        if agrees {
            self.timeline.history_mut().evict_before(tick + 1);
            self.timeline.stats.agreed += 1;
            debug!(%entity, tick, "prediction confirmed");
            return Ok(ReconcileOutcome::Agreed);
        }

        let replayed = self.timeline.replay_from(tick, authoritative)?;

        self.timeline.history_mut().evict_before(tick);
        self.timeline.stats.corrected += 1;
        debug!(%entity, tick, replayed, "prediction corrected");
        Ok(ReconcileOutcome::Corrected { replayed })
    }

    /// Hard reset to an authoritative snapshot
    ///
    /// Used to join in progress, or when the server has moved past the
    /// retained window. All predicted history is discarded.
    pub fn resync(&mut self, snapshot: F::Snapshot) -> Result<()> {
        let tick = snapshot.tick();
        debug!(entity = %self.timeline.entity(), tick, "resynchronizing to authoritative snapshot");
        self.timeline.reset_to(snapshot)?;
        self.timeline.queue_mut().acknowledge(tick);
        self.confirmed_tick = Some(tick);
        Ok(())
    }

    /// Open the hand-off for authoritative snapshots
    ///
    /// Replaces any previous inbox; its sender observes `InboxClosed`.
    pub fn connect(&mut self) -> InboxSender<AuthoritativeSnapshot<F::Snapshot>> {
        let (sender, inbox) = inbox::channel(self.inbox_capacity);
        self.inbox = Some(inbox);
        sender
    }

    /// Close the hand-off, discarding anything undelivered
    pub fn disconnect(&mut self) {
        if let Some(inbox) = self.inbox.take() {
            let dropped = inbox.len();
            if dropped > 0 {
                debug!(
                    entity = %self.timeline.entity(),
                    dropped,
                    "discarding undelivered snapshots"
                );
            }
        }
    }

    /// Apply every authoritative snapshot handed off since the last call
    ///
    /// Call at the start of each tick. Snapshots for another entity are
    /// dropped with a warning. Every queued snapshot is applied and yields
    /// one result, in arrival order; a failure does not stop the rest.
    pub fn pump(&mut self) -> Vec<Result<ReconcileOutcome>> {
        let messages: Vec<_> = match &self.inbox {
            Some(inbox) => inbox.drain().collect(),
            None => return Vec::new(),
        };

        let entity = self.timeline.entity();
        let mut results = Vec::with_capacity(messages.len());
        for message in messages {
            if message.entity != entity {
                warn!(%entity, received = %message.entity, "dropping snapshot for another entity");
                continue;
            }
            results.push(self.apply_authoritative(message.snapshot));
        }
        results
    }

    /// Whether an inbox is open
    pub fn is_connected(&self) -> bool {
        self.inbox.is_some()
    }

    /// The entity this driver predicts
    pub fn entity(&self) -> EntityId {
        self.timeline.entity()
    }

    /// The newest predicted snapshot (what the presentation layer renders)
    pub fn latest(&self) -> &F::Snapshot {
        self.timeline.latest()
    }

    /// Tick of the newest predicted snapshot
    pub fn predicted_tick(&self) -> Tick {
        self.timeline.latest_tick()
    }

    /// Newest tick confirmed by an authoritative snapshot
    pub fn confirmed_tick(&self) -> Option<Tick> {
        self.confirmed_tick
    }

    /// Number of ticks predicted beyond the newest confirmation
    pub fn prediction_frames(&self) -> u64 {
        let confirmed = self.confirmed_tick.unwrap_or(0);
        self.timeline.latest_tick().saturating_sub(confirmed)
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Retained snapshots and commands
    pub fn history(&self) -> &SnapshotHistory<F> {
        self.timeline.history()
    }

    /// Number of commands queued ahead of simulation
    pub fn pending_commands(&self) -> usize {
        self.timeline.queue().len()
    }

    /// Divergence policy in use
    pub fn divergence(&self) -> &DivergencePolicy {
        &self.divergence
    }

    /// The step function driving this entity
    pub fn step_function(&self) -> &F {
        self.timeline.step_function()
    }

    /// Counters since creation
    pub fn stats(&self) -> DriverStats {
        self.timeline.stats
    }
}
