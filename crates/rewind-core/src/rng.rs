//! Deterministic random number generator
//!
//! Uses xorshift64 so the same seed produces the same sequence on every
//! participant. Step functions that need randomness keep the generator state
//! inside their snapshot, which makes a replayed tick draw the same numbers
//! as the original.

use serde::{Deserialize, Serialize};

/// A deterministic random number generator
///
/// Never use thread-local or OS randomness inside a step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift requires a non-zero state
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Get the current state (for carrying in a snapshot)
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a random f32 in range [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Generate a random f32 in range [min, max)
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Generate a random bool with given probability of true
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = DeterministicRng::new(42);
        let mut rng2 = DeterministicRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_copy_resumes_sequence() {
        let mut rng = DeterministicRng::new(7);
        rng.next_u64();
        let mut saved = rng;
        assert_eq!(rng.next_u32(), saved.next_u32());
    }

    #[test]
    fn test_zero_seed() {
        let mut rng = DeterministicRng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_range() {
        let mut rng = DeterministicRng::new(42);

        for _ in 0..1000 {
            let f = rng.next_f32();
            assert!((0.0..1.0).contains(&f));
        }

        for _ in 0..100 {
            let f = rng.range_f32(-2.0, 2.0);
            assert!((-2.0..2.0).contains(&f));
        }
    }
}
