//! Tick-tagged input commands

use crate::Tick;
use serde::{Deserialize, Serialize};

/// An immutable record of player intent for one tick
///
/// The payload is opaque to the reconciliation machinery: axis values,
/// button bitmasks, or whatever the concrete step function consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputCommand<P> {
    tick: Tick,
    payload: P,
}

impl<P> InputCommand<P> {
    /// Create a command for the given tick
    pub fn new(tick: Tick, payload: P) -> Self {
        Self { tick, payload }
    }

    /// The tick this command is applied on
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// The command data
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the command, returning its payload
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: Clone> InputCommand<P> {
    /// A new command carrying the same payload for another tick
    ///
    /// Used when no input arrived in time and the last known input is repeated.
    pub fn retagged(&self, tick: Tick) -> Self {
        Self {
            tick,
            payload: self.payload.clone(),
        }
    }
}

impl<P: Default> InputCommand<P> {
    /// A neutral command (default payload) for the given tick
    pub fn neutral(tick: Tick) -> Self {
        Self {
            tick,
            payload: P::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retagged_keeps_payload() {
        let cmd = InputCommand::new(3, (1.0f32, -1.0f32));
        let next = cmd.retagged(4);
        assert_eq!(next.tick(), 4);
        assert_eq!(next.payload(), cmd.payload());
        assert_eq!(cmd.tick(), 3);
    }

    #[test]
    fn test_neutral() {
        let cmd: InputCommand<u8> = InputCommand::neutral(9);
        assert_eq!(cmd.tick(), 9);
        assert_eq!(*cmd.payload(), 0);
    }
}
