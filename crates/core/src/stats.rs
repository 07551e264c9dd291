//! Per-cache statistics counters and derived metrics.
//!
//! Every cache owns one [`CacheStats`]. Demand accesses are charged with
//! `access`; evictions with `evict`; accesses performed on behalf of a child
//! cache with `child_access`; retired instructions with `reg_inst`. Derived
//! metrics (miss rate, MPKI) guard against division by zero so they can be
//! printed unconditionally.

/// Statistics counters for one cache.
///
/// All counters are monotonically non-decreasing between calls to
/// [`CacheStats::reset`], which is invoked once at the warmup boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Demand accesses that hit.
    pub hits: u64,
    /// Demand accesses that missed.
    pub misses: u64,
    /// Evictions of dirty lines (writebacks to the level above).
    pub writebacks: u64,
    /// Evictions of clean lines.
    pub clean_evictions: u64,
    /// Child demand accesses that hit in the child.
    pub child_hits: u64,
    /// Child demand accesses that missed in the child.
    pub child_misses: u64,
    /// Instructions retired at the cores this cache serves.
    pub instructions: u64,
}

impl CacheStats {
    /// Charges one demand access.
    #[inline]
    pub fn access(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    /// Charges one eviction; a non-clean eviction is a writeback.
    #[inline]
    pub fn evict(&mut self, clean: bool) {
        if clean {
            self.clean_evictions += 1;
        } else {
            self.writebacks += 1;
        }
    }

    /// Charges one access performed by a child cache.
    #[inline]
    pub fn child_access(&mut self, hit: bool) {
        if hit {
            self.child_hits += 1;
        } else {
            self.child_misses += 1;
        }
    }

    /// Registers `count` retired instructions.
    #[inline]
    pub fn reg_inst(&mut self, count: u64) {
        self.instructions += count;
    }

    /// Total demand accesses.
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Miss rate over demand accesses, in percent.
    pub fn miss_rate(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            return 0.0;
        }
        (self.misses as f64 / total as f64) * 100.0
    }

    /// Misses per thousand retired instructions.
    pub fn mpki(&self) -> f64 {
        if self.instructions == 0 {
            return 0.0;
        }
        (self.misses as f64 * 1000.0) / self.instructions as f64
    }

    /// Zeros every counter. Called once at the warmup boundary.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
