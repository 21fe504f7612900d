//! Pending input commands
//!
//! Holds commands that have been produced (locally sampled ahead of time, or
//! received from a remote player) but not yet simulated. Commands leave the
//! queue in tick order, exactly once.

use crate::{Error, Result};
use rewind_core::{InputCommand, Tick};
use std::collections::VecDeque;

/// Tick-ordered queue of commands waiting to be simulated
#[derive(Debug)]
pub struct CommandQueue<P> {
    /// Pending commands (oldest first, strictly increasing ticks)
    commands: VecDeque<InputCommand<P>>,
    /// Maximum number of commands to queue
    capacity: usize,
    /// Newest tick already handed to the simulation
    consumed: Option<Tick>,
    /// Last tick confirmed by authoritative state
    last_acknowledged_tick: Option<Tick>,
    /// Commands dropped because their tick was skipped
    discarded: u64,
}

impl<P> CommandQueue<P> {
    /// Create a new command queue with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: VecDeque::with_capacity(capacity),
            capacity,
            consumed: None,
            last_acknowledged_tick: None,
            discarded: 0,
        }
    }

    /// Queue a command
    ///
    /// The tick must be newer than anything queued or already simulated.
    /// When the queue is full the oldest pending command is evicted and
    /// returned.
    pub fn push(&mut self, command: InputCommand<P>) -> Result<Option<InputCommand<P>>> {
        if let Some(floor) = self.floor() {
            if command.tick() <= floor {
                return Err(Error::CommandOutOfOrder {
                    tick: command.tick(),
                    floor,
                });
            }
        }

        let evicted = if self.commands.len() >= self.capacity {
            self.commands.pop_front()
        } else {
            None
        };
        self.commands.push_back(command);
        Ok(evicted)
    }

    /// Highest tick a new command must exceed
    fn floor(&self) -> Option<Tick> {
        self.commands
            .back()
            .map(|c| c.tick())
            .or(self.consumed)
    }

    /// Take the command for `tick`
    ///
    /// Commands for earlier ticks are discarded; commands for later ticks stay
    /// queued. The tick counts as consumed even when no command was queued,
    /// so a late arrival for it is rejected by `push`.
    pub fn pop_for(&mut self, tick: Tick) -> Option<InputCommand<P>> {
        while let Some(front) = self.commands.front() {
            if front.tick() < tick {
                self.commands.pop_front();
                self.discarded += 1;
            } else {
                break;
            }
        }

        self.consumed = Some(self.consumed.map_or(tick, |c| c.max(tick)));

        match self.commands.front() {
            Some(front) if front.tick() == tick => self.commands.pop_front(),
            _ => None,
        }
    }

    /// Treat every tick up to and including `tick` as consumed
    ///
    /// Drops queued commands for those ticks. Used when the timeline jumps
    /// forward to a resynchronized snapshot.
    pub fn discard_through(&mut self, tick: Tick) {
        while let Some(front) = self.commands.front() {
            if front.tick() <= tick {
                self.commands.pop_front();
                self.discarded += 1;
            } else {
                break;
            }
        }
        self.consumed = Some(tick);
    }

    /// Acknowledge authoritative state up to and including `tick`
    pub fn acknowledge(&mut self, tick: Tick) {
        self.last_acknowledged_tick =
            Some(self.last_acknowledged_tick.map_or(tick, |t| t.max(tick)));
        while let Some(front) = self.commands.front() {
            if front.tick() <= tick {
                self.commands.pop_front();
            } else {
                break;
            }
        }
    }

    /// Pending commands, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &InputCommand<P>> {
        self.commands.iter()
    }

    /// Get the oldest pending tick
    pub fn oldest_tick(&self) -> Option<Tick> {
        self.commands.front().map(|c| c.tick())
    }

    /// Get the newest pending tick
    pub fn newest_tick(&self) -> Option<Tick> {
        self.commands.back().map(|c| c.tick())
    }

    /// Get the last acknowledged tick
    pub fn last_acknowledged_tick(&self) -> Option<Tick> {
        self.last_acknowledged_tick
    }

    /// Number of commands dropped because their tick was skipped
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Get the number of pending commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Check if the queue is full
    pub fn is_full(&self) -> bool {
        self.commands.len() >= self.capacity
    }

    /// Get the capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all pending commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(tick: Tick) -> InputCommand<u32> {
        InputCommand::new(tick, tick as u32 * 10)
    }

    #[test]
    fn test_push_and_len() {
        let mut queue = CommandQueue::new(10);

        queue.push(cmd(1)).unwrap();
        queue.push(cmd(2)).unwrap();
        queue.push(cmd(3)).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.oldest_tick(), Some(1));
        assert_eq!(queue.newest_tick(), Some(3));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut queue = CommandQueue::new(10);
        queue.push(cmd(5)).unwrap();

        assert!(matches!(
            queue.push(cmd(5)),
            Err(Error::CommandOutOfOrder { tick: 5, floor: 5 })
        ));
        assert!(matches!(
            queue.push(cmd(4)),
            Err(Error::CommandOutOfOrder { tick: 4, floor: 5 })
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut queue = CommandQueue::new(3);

        queue.push(cmd(1)).unwrap();
        queue.push(cmd(2)).unwrap();
        queue.push(cmd(3)).unwrap();
        assert!(queue.is_full());

        let evicted = queue.push(cmd(4)).unwrap();
        assert_eq!(evicted.map(|c| c.tick()), Some(1));
        let ticks: Vec<_> = queue.iter().map(|c| c.tick()).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
    }

    #[test]
    fn test_pop_for() {
        let mut queue = CommandQueue::new(10);
        queue.push(cmd(1)).unwrap();
        queue.push(cmd(2)).unwrap();
        queue.push(cmd(5)).unwrap();

        // Tick 1 skipped: its command is discarded
        let popped = queue.pop_for(2).unwrap();
        assert_eq!(popped.tick(), 2);
        assert_eq!(*popped.payload(), 20);
        assert_eq!(queue.discarded(), 1);

        // Nothing for tick 3 yet, future command stays
        assert!(queue.pop_for(3).is_none());
        assert_eq!(queue.len(), 1);

        // Tick 3 was consumed without a command: late arrival rejected
        assert!(queue.push(cmd(3)).is_err());
        assert!(queue.push(cmd(4)).is_err()); // 5 already queued

        assert_eq!(queue.pop_for(5).map(|c| c.tick()), Some(5));
        assert!(queue.is_empty());
        assert!(queue.push(cmd(5)).is_err());
        assert!(queue.push(cmd(6)).is_ok());
    }

    #[test]
    fn test_discard_through() {
        let mut queue = CommandQueue::new(10);
        queue.push(cmd(1)).unwrap();
        queue.push(cmd(2)).unwrap();
        queue.push(cmd(8)).unwrap();

        queue.discard_through(5);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.oldest_tick(), Some(8));
        assert_eq!(queue.discarded(), 2);
    }

    #[test]
    fn test_acknowledge() {
        let mut queue = CommandQueue::new(10);
        queue.push(cmd(1)).unwrap();
        queue.push(cmd(2)).unwrap();
        queue.push(cmd(3)).unwrap();

        queue.acknowledge(2);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.oldest_tick(), Some(3));
        assert_eq!(queue.last_acknowledged_tick(), Some(2));

        // Acknowledgements never move backwards
        queue.acknowledge(1);
        assert_eq!(queue.last_acknowledged_tick(), Some(2));
    }
}
