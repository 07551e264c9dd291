//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the oldest line in a set, regardless of how recently it
//! was accessed. Each way carries the clock value from the moment its line
//! was installed; accesses do not refresh it. Equivalent to LRU where only
//! allocation counts as an access.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `on_install()`: O(1)
//!   - `pick_victim()`: O(W) where W is the number of ways (associativity)
//! - **Space Complexity:** O(S × W) where S is the number of sets
//! - **Best Case:** Streaming accesses where all lines have equal importance
//! - **Worst Case:** Strong temporal locality (may evict frequently-used lines)

use super::ReplacementPolicy;

/// FIFO Policy state.
pub struct FifoPolicy {
    /// One allocation stamp per way, indexed `set * ways + way`.
    stamps: Vec<u64>,
    /// Number of ways in the cache.
    ways: usize,
    /// Global installation clock.
    clock: u64,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            stamps: vec![0; sets * ways],
            ways,
            clock: 0,
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    /// Accesses do not affect insertion order.
    fn on_access(&mut self, _set: usize, _way: usize) {}

    /// Stamps the way with the current installation clock.
    fn on_install(&mut self, set: usize, way: usize) {
        self.clock += 1;
        self.stamps[set * self.ways + way] = self.clock;
    }

    /// Identifies the victim way to evict.
    ///
    /// Returns the way with the oldest allocation stamp; on ties the lowest
    /// way index wins.
    fn pick_victim(&mut self, set: usize) -> usize {
        let base = set * self.ways;
        let mut min_way = 0;
        let mut min_stamp = self.stamps[base];
        for way in 1..self.ways {
            if self.stamps[base + way] < min_stamp {
                min_stamp = self.stamps[base + way];
                min_way = way;
            }
        }
        min_way
    }

    /// Clears the stamp for an evicted way.
    fn on_invalidate(&mut self, set: usize, way: usize) {
        self.stamps[set * self.ways + way] = 0;
    }
}
