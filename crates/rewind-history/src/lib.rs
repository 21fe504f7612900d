//! Rewind History - Bounded ring buffer of recent snapshots and commands
//!
//! Each participant keeps the last few ticks of its simulation so an
//! authoritative snapshot can be compared against what was predicted for the
//! same tick, and so commands can be replayed after a correction.
//!
//! # Features
//!
//! - **Bounded memory**: fixed-size ring, no unbounded growth
//! - **O(1) append, lookup and eviction**: slots are indexed by `tick % capacity`
//! - **Contiguous ticks**: entries never have gaps and are never reordered
//! - **Oldest-first eviction**: appending to a full buffer drops the oldest entry
//!
//! # Example
//!
//! ```rust
//! use rewind_history::HistoryBuffer;
//!
//! // Snapshots and commands can be any types
//! let mut history: HistoryBuffer<&str, u8> = HistoryBuffer::new(3);
//! history.append(0, "s0", None).unwrap();
//! history.append(1, "s1", Some(1)).unwrap();
//! history.append(2, "s2", Some(2)).unwrap();
//!
//! // Full: the next append evicts tick 0
//! let evicted = history.append(3, "s3", Some(3)).unwrap();
//! assert_eq!(evicted.map(|e| e.tick), Some(0));
//! assert_eq!(history.get(1), Some(&"s1"));
//! assert_eq!(history.oldest_tick(), Some(1));
//! ```

mod error;

pub use error::{Error, Result};

use rewind_core::Tick;

/// One retained tick: the snapshot and the command that produced it
///
/// The base entry of a timeline (initial or resynchronized state) has no
/// command.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<S, C> {
    /// Tick of this entry
    pub tick: Tick,
    /// Snapshot at this tick
    pub snapshot: S,
    /// Command applied to reach this snapshot
    pub command: Option<C>,
}

/// A ring buffer of the most recent ticks
///
/// Entries are contiguous in tick number. Lookups outside the retained
/// window return `None`.
#[derive(Debug)]
pub struct HistoryBuffer<S, C> {
    /// Ring storage, slot = tick % capacity
    slots: Vec<Option<HistoryEntry<S, C>>>,
    /// Tick of the oldest retained entry (meaningless while empty)
    oldest: Tick,
    /// Number of retained entries
    count: usize,
    /// Maximum number of entries
    capacity: usize,
}

impl<S, C> HistoryBuffer<S, C> {
    /// Create a new history buffer with the given capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of ticks to retain (typically one round trip plus margin)
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            oldest: 0,
            count: 0,
            capacity,
        }
    }

    fn index(&self, tick: Tick) -> usize {
        (tick % self.capacity as u64) as usize
    }

    /// Append the entry for the tick after the newest one
    ///
    /// Returns the evicted oldest entry when the buffer was full.
    pub fn append(
        &mut self,
        tick: Tick,
        snapshot: S,
        command: Option<C>,
    ) -> Result<Option<HistoryEntry<S, C>>> {
        if let Some(newest) = self.newest_tick() {
            let expected = newest + 1;
            if tick != expected {
                return Err(Error::NonContiguousTick {
                    expected,
                    got: tick,
                });
            }
        }

        let evicted = if self.count == self.capacity {
            self.pop_oldest()
        } else {
            None
        };

        if self.count == 0 {
            self.oldest = tick;
        }
        let index = self.index(tick);
        self.slots[index] = Some(HistoryEntry {
            tick,
            snapshot,
            command,
        });
        self.count += 1;

        Ok(evicted)
    }

    fn pop_oldest(&mut self) -> Option<HistoryEntry<S, C>> {
        if self.count == 0 {
            return None;
        }
        let index = self.index(self.oldest);
        let entry = self.slots[index].take();
        self.count -= 1;
        if self.count > 0 {
            self.oldest += 1;
        }
        entry
    }

    /// Get the entry at exactly `tick`
    pub fn entry(&self, tick: Tick) -> Option<&HistoryEntry<S, C>> {
        if !self.contains(tick) {
            return None;
        }
        self.slots[self.index(tick)]
            .as_ref()
            .filter(|e| e.tick == tick)
    }

    /// Get the snapshot at exactly `tick`
    pub fn get(&self, tick: Tick) -> Option<&S> {
        self.entry(tick).map(|e| &e.snapshot)
    }

    /// Get the command that produced the snapshot at `tick`
    pub fn command(&self, tick: Tick) -> Option<&C> {
        self.entry(tick).and_then(|e| e.command.as_ref())
    }

    /// Overwrite the snapshot at `tick`, returning the previous one
    pub fn replace(&mut self, tick: Tick, snapshot: S) -> Result<S> {
        let (oldest, newest) = self.tick_range().ok_or(Error::Empty)?;
        if tick < oldest || tick > newest {
            return Err(Error::TickOutOfWindow {
                tick,
                oldest,
                newest,
            });
        }
        let index = self.index(tick);
        match self.slots[index].as_mut() {
            Some(entry) if entry.tick == tick => {
                Ok(std::mem::replace(&mut entry.snapshot, snapshot))
            }
            _ => Err(Error::TickOutOfWindow {
                tick,
                oldest,
                newest,
            }),
        }
    }

    /// Drop every entry older than `tick`, oldest first
    ///
    /// Returns the number of evicted entries.
    pub fn evict_before(&mut self, tick: Tick) -> usize {
        let mut evicted = 0;
        while self.count > 0 && self.oldest < tick {
            self.pop_oldest();
            evicted += 1;
        }
        evicted
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.count = 0;
        self.oldest = 0;
    }

    /// Whether `tick` is inside the retained window
    pub fn contains(&self, tick: Tick) -> bool {
        match self.tick_range() {
            Some((oldest, newest)) => tick >= oldest && tick <= newest,
            None => false,
        }
    }

    /// Tick of the oldest retained entry
    pub fn oldest_tick(&self) -> Option<Tick> {
        (self.count > 0).then_some(self.oldest)
    }

    /// Tick of the newest retained entry
    pub fn newest_tick(&self) -> Option<Tick> {
        (self.count > 0).then(|| self.oldest + self.count as u64 - 1)
    }

    /// `(oldest, newest)` ticks, or `None` when empty
    pub fn tick_range(&self) -> Option<(Tick, Tick)> {
        Some((self.oldest_tick()?, self.newest_tick()?))
    }

    /// Snapshot at the newest tick
    pub fn latest(&self) -> Option<&S> {
        self.newest_tick().and_then(|t| self.get(t))
    }

    /// All entries, oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry<S, C>> {
        self.range_from(self.oldest)
    }

    /// Entries with a tick strictly greater than `tick`, oldest to newest
    pub fn ticks_after(&self, tick: Tick) -> impl Iterator<Item = &HistoryEntry<S, C>> {
        self.range_from(tick.saturating_add(1))
    }

    fn range_from(&self, start: Tick) -> impl Iterator<Item = &HistoryEntry<S, C>> {
        let end = self.oldest + self.count as u64;
        let start = start.max(self.oldest);
        (start..end).filter_map(move |t| self.slots[self.index(t)].as_ref())
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no entries are retained
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the next append will evict
    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get statistics about the buffer
    pub fn stats(&self) -> BufferStats {
        let (oldest, newest) = self.tick_range().unwrap_or((0, 0));
        BufferStats {
            capacity: self.capacity,
            count: self.count,
            oldest_tick: oldest,
            newest_tick: newest,
        }
    }
}

impl<S, C> Default for HistoryBuffer<S, C> {
    fn default() -> Self {
        Self::new(128) // ~2 seconds at 60Hz
    }
}

/// Statistics about the history buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Maximum capacity
    pub capacity: usize,
    /// Current number of stored entries
    pub count: usize,
    /// Oldest tick in the buffer
    pub oldest_tick: Tick,
    /// Newest tick in the buffer
    pub newest_tick: Tick,
}

impl BufferStats {
    /// Get the tick span (newest - oldest)
    pub fn tick_span(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.newest_tick - self.oldest_tick
        }
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}
