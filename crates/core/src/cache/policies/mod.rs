//! Cache Replacement Policies.
//!
//! Implements the algorithms for selecting victim lines in set-associative
//! caches.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used.
//! - `Lfu`: Least Frequently Used.
//! - `Fifo`: First-In, First-Out.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Frequently Used replacement policy.
pub mod lfu;

/// Least Recently Used replacement policy.
pub mod lru;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

use crate::config::ReplacementKind;

/// Trait for cache replacement policies.
///
/// The cache scans each set for an empty way before consulting the policy,
/// so `pick_victim` is only called on sets in which every way holds a valid
/// line and only ever ranks valid lines.
pub trait ReplacementPolicy {
    /// Updates the policy state when a resident line is accessed.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `way` - The way index within the set that was accessed.
    fn on_access(&mut self, set: usize, way: usize);

    /// Updates the policy state when a line is installed into a way.
    ///
    /// Called on every allocation, after the way has been filled.
    fn on_install(&mut self, set: usize, way: usize);

    /// Updates the policy state when a resident line is written.
    ///
    /// Write recency is already covered by [`ReplacementPolicy::on_access`];
    /// none of the provided policies track writes separately.
    fn on_write(&mut self, set: usize, way: usize) {
        let _ = (set, way);
    }

    /// Selects a victim line to evict from a full set.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn pick_victim(&mut self, set: usize) -> usize;

    /// Clears the policy state for a way whose line was evicted.
    ///
    /// Keeps frequency counters from leaking into the next line installed
    /// into the same way.
    fn on_invalidate(&mut self, set: usize, way: usize);
}

/// Builds the replacement policy selected by the configuration.
///
/// # Arguments
///
/// * `kind` - The configured policy kind.
/// * `sets` - The number of sets in the cache.
/// * `ways` - The associativity (number of ways) of the cache.
pub fn build(kind: ReplacementKind, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        ReplacementKind::Lru => Box::new(LruPolicy::new(sets, ways)),
        ReplacementKind::Lfu => Box::new(LfuPolicy::new(sets, ways)),
        ReplacementKind::Fifo => Box::new(FifoPolicy::new(sets, ways)),
    }
}

impl std::fmt::Debug for dyn ReplacementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReplacementPolicy")
    }
}
