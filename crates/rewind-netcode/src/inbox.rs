//! Network-to-tick-loop hand-off
//!
//! The transport's delivery thread and the simulation tick loop meet at one
//! bounded single-producer/single-consumer queue per driver. The delivery
//! side never blocks; the tick loop drains everything queued at the start of
//! each tick. Dropping the receiving driver closes the queue, after which
//! sends fail and anything still queued is discarded.

use crate::{Error, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use rewind_core::{EntityId, InputCommand, StateSnapshot, Tick};
use serde::{Deserialize, Serialize};

/// Authoritative state for one entity, already decoded by the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoritativeSnapshot<S> {
    /// Entity the state belongs to
    pub entity: EntityId,
    /// Server-confirmed snapshot
    pub snapshot: S,
}

impl<S: StateSnapshot> AuthoritativeSnapshot<S> {
    /// Wrap a snapshot for an entity
    pub fn new(entity: EntityId, snapshot: S) -> Self {
        Self { entity, snapshot }
    }

    /// Tick of the carried snapshot
    pub fn tick(&self) -> Tick {
        self.snapshot.tick()
    }
}

/// An input command received from a remote player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCommand<P> {
    /// Entity the command drives
    pub entity: EntityId,
    /// The command
    pub command: InputCommand<P>,
}

impl<P> RemoteCommand<P> {
    /// Wrap a command for an entity
    pub fn new(entity: EntityId, command: InputCommand<P>) -> Self {
        Self { entity, command }
    }
}

/// Create a bounded hand-off with the given capacity
pub fn channel<M>(capacity: usize) -> (InboxSender<M>, Inbox<M>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (InboxSender { tx }, Inbox { rx })
}

/// Producer half, owned by the transport's delivery thread
///
/// Not `Clone`: there is exactly one producer per inbox.
#[derive(Debug)]
pub struct InboxSender<M> {
    tx: Sender<M>,
}

impl<M> InboxSender<M> {
    /// Hand a message to the tick loop without blocking
    pub fn send(&self, message: M) -> Result<()> {
        self.tx.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => Error::InboxFull,
            TrySendError::Disconnected(_) => Error::InboxClosed,
        })
    }

    /// Number of messages waiting to be drained
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consumer half, owned by a driver
#[derive(Debug)]
pub struct Inbox<M> {
    rx: Receiver<M>,
}

impl<M> Inbox<M> {
    /// Take every message queued right now, in arrival order
    pub fn drain(&self) -> impl Iterator<Item = M> + '_ {
        self.rx.try_iter()
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drain_in_order() {
        let (tx, rx) = channel(8);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        tx.send(3).unwrap();
        assert_eq!(tx.len(), 3);

        let drained: Vec<_> = rx.drain().collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_full_does_not_block() {
        let (tx, _rx) = channel(2);
        tx.send('a').unwrap();
        tx.send('b').unwrap();
        assert!(matches!(tx.send('c'), Err(Error::InboxFull)));
    }

    #[test]
    fn test_closed_after_receiver_dropped() {
        let (tx, rx) = channel(2);
        drop(rx);
        assert!(matches!(tx.send(1u8), Err(Error::InboxClosed)));
    }

    #[test]
    fn test_cross_thread_hand_off() {
        let (tx, rx) = channel(64);
        let producer = thread::spawn(move || {
            for i in 0..32u32 {
                tx.send(i).unwrap();
            }
        });
        producer.join().unwrap();

        let drained: Vec<_> = rx.drain().collect();
        assert_eq!(drained, (0..32).collect::<Vec<_>>());
    }
}
