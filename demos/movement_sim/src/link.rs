//! Simulated network link

use rewind_core::{DeterministicRng, Tick};
use rewind_netcode::InboxSender;
use std::collections::VecDeque;
use tracing::warn;

/// One direction of a delayed, lossy connection
///
/// Messages sent at tick `t` are handed to the receiving inbox at
/// `t + latency`, unless the link drops them.
pub struct Link<M> {
    name: &'static str,
    latency: u64,
    loss: f32,
    rng: DeterministicRng,
    in_flight: VecDeque<(Tick, M)>,
    sent: u64,
    lost: u64,
}

impl<M> Link<M> {
    pub fn new(name: &'static str, latency: u64, loss: f32, seed: u64) -> Self {
        Self {
            name,
            latency,
            loss,
            rng: DeterministicRng::new(seed),
            in_flight: VecDeque::new(),
            sent: 0,
            lost: 0,
        }
    }

    pub fn send(&mut self, now: Tick, message: M) {
        self.sent += 1;
        if self.rng.chance(self.loss) {
            self.lost += 1;
            return;
        }
        self.in_flight.push_back((now + self.latency, message));
    }

    /// Hand every message due by `now` to the receiver
    pub fn deliver(&mut self, now: Tick, receiver: &InboxSender<M>) -> usize {
        let mut delivered = 0;
        while self.in_flight.front().is_some_and(|(due, _)| *due <= now) {
            let Some((_, message)) = self.in_flight.pop_front() else {
                break;
            };
            match receiver.send(message) {
                Ok(()) => delivered += 1,
                Err(err) => warn!(link = self.name, %err, "delivery failed"),
            }
        }
        delivered
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn lost(&self) -> u64 {
        self.lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_netcode::inbox;

    #[test]
    fn test_delivers_after_latency() {
        let (sender, inbox) = inbox::channel(8);
        let mut link = Link::new("test", 3, 0.0, 1);
        link.send(1, "a");
        link.send(2, "b");

        assert_eq!(link.deliver(3, &sender), 0);
        assert_eq!(link.deliver(4, &sender), 1);
        assert_eq!(link.deliver(5, &sender), 1);
        assert_eq!(inbox.drain().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_total_loss() {
        let (sender, inbox) = inbox::channel(8);
        let mut link = Link::new("test", 0, 1.0, 1);
        link.send(1, 5u8);
        assert_eq!(link.deliver(10, &sender), 0);
        assert_eq!(link.lost(), 1);
        assert_eq!(link.sent(), 1);
        assert!(inbox.is_empty());
    }
}
