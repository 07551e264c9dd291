//! Cache Replacement Policy Tests.
//!
//! Verifies the victim selection logic for LRU, LFU, and FIFO in isolation.
//! Each policy implements `ReplacementPolicy` with `on_access`/`on_install`
//! state updates and `pick_victim(set) -> way` selection over full sets
//! (the cache handles empty ways before the policy is consulted).

use cachesim_core::cache::policies::{FifoPolicy, LfuPolicy, LruPolicy, ReplacementPolicy};

// ══════════════════════════════════════════════════════════
// 1. LRU Policy
// ══════════════════════════════════════════════════════════

/// Untouched ways all carry stamp 0; ties break to the lowest way.
#[test]
fn lru_initial_victim_is_way_zero() {
    let mut policy = LruPolicy::new(1, 4);
    assert_eq!(policy.pick_victim(0), 0);
}

/// Accessing ways in order 0,1,2,3 makes 0 the LRU.
#[test]
fn lru_sequential_access_orders_victims() {
    let mut policy = LruPolicy::new(1, 4);
    for way in 0..4 {
        policy.on_access(0, way);
    }
    assert_eq!(policy.pick_victim(0), 0);
}

/// Classic LRU scenario: access 0,1,2,3 then re-access 0 → LRU becomes 1.
#[test]
fn lru_evicts_true_lru_after_reaccess() {
    let mut policy = LruPolicy::new(1, 4);
    for way in 0..4 {
        policy.on_access(0, way);
    }
    assert_eq!(policy.pick_victim(0), 0);

    // Re-access 0 → 1 is now least recent.
    policy.on_access(0, 0);
    assert_eq!(policy.pick_victim(0), 1);

    policy.on_access(0, 1);
    assert_eq!(policy.pick_victim(0), 2);
}

/// Repeated access to the most recent way does not change the victim.
#[test]
fn lru_repeated_access_same_way() {
    let mut policy = LruPolicy::new(1, 4);
    for way in 0..4 {
        policy.on_access(0, way);
    }
    policy.on_access(0, 3);
    policy.on_access(0, 3);
    assert_eq!(policy.pick_victim(0), 0);
}

/// LRU operates independently across sets.
#[test]
fn lru_independent_sets() {
    let mut policy = LruPolicy::new(2, 4);
    for way in 0..4 {
        policy.on_access(0, way);
    }
    assert_eq!(policy.pick_victim(0), 0);
    assert_eq!(policy.pick_victim(1), 0);

    for way in (0..4).rev() {
        policy.on_access(1, way);
    }
    assert_eq!(policy.pick_victim(1), 3);
    // Set 0 unchanged.
    assert_eq!(policy.pick_victim(0), 0);
}

/// Installation refreshes recency the same way an access does.
#[test]
fn lru_install_counts_as_access() {
    let mut policy = LruPolicy::new(1, 2);
    policy.on_install(0, 0);
    policy.on_install(0, 1);
    policy.on_access(0, 0);
    assert_eq!(policy.pick_victim(0), 1);
}

// ══════════════════════════════════════════════════════════
// 2. LFU Policy
// ══════════════════════════════════════════════════════════

/// The way with the fewest accesses is evicted.
#[test]
fn lfu_evicts_least_frequent() {
    let mut policy = LfuPolicy::new(1, 2);
    policy.on_install(0, 0);
    policy.on_access(0, 0);
    policy.on_access(0, 0);
    policy.on_install(0, 1);
    // Way 0 counter = 3, way 1 counter = 1.
    assert_eq!(policy.pick_victim(0), 1);
}

/// LFU never evicts a way whose counter strictly exceeds another's.
#[test]
fn lfu_prefers_cold_ways() {
    let mut policy = LfuPolicy::new(1, 4);
    for way in 0..4 {
        policy.on_install(0, way);
    }
    // Heat up ways 0, 1, 3.
    for _ in 0..5 {
        policy.on_access(0, 0);
        policy.on_access(0, 1);
        policy.on_access(0, 3);
    }
    assert_eq!(policy.pick_victim(0), 2);
}

/// Selecting a victim zeroes its counter, so the slot starts cold again.
#[test]
fn lfu_victim_counter_resets() {
    let mut policy = LfuPolicy::new(1, 2);
    policy.on_install(0, 0);
    policy.on_install(0, 1);
    policy.on_access(0, 1);
    // Way 0 counter = 1, way 1 counter = 2.
    assert_eq!(policy.pick_victim(0), 0);
    // Way 0 zeroed; still the minimum against way 1's 2.
    assert_eq!(policy.pick_victim(0), 0);
}

/// Ties break to the lowest way index.
#[test]
fn lfu_tie_breaks_low_way() {
    let mut policy = LfuPolicy::new(1, 4);
    for way in 0..4 {
        policy.on_install(0, way);
    }
    assert_eq!(policy.pick_victim(0), 0);
}

/// Invalidation clears the counter so a reused slot does not inherit heat.
#[test]
fn lfu_invalidate_clears_counter() {
    let mut policy = LfuPolicy::new(1, 2);
    policy.on_install(0, 0);
    for _ in 0..10 {
        policy.on_access(0, 0);
    }
    policy.on_install(0, 1);
    policy.on_invalidate(0, 0);
    policy.on_install(0, 0);
    // Way 0 restarts at 1; way 1 holds 1 as well → tie, lowest way.
    assert_eq!(policy.pick_victim(0), 0);
}

// ══════════════════════════════════════════════════════════
// 3. FIFO Policy
// ══════════════════════════════════════════════════════════

/// The oldest installed way is evicted regardless of later accesses.
#[test]
fn fifo_evicts_oldest_install() {
    let mut policy = FifoPolicy::new(1, 3);
    policy.on_install(0, 0);
    policy.on_install(0, 1);
    policy.on_install(0, 2);
    // Touch way 0 heavily; FIFO must ignore it.
    for _ in 0..10 {
        policy.on_access(0, 0);
    }
    assert_eq!(policy.pick_victim(0), 0);
}

/// Reinstalling into the evicted way moves it to the back of the queue.
#[test]
fn fifo_reinstall_rotates_queue() {
    let mut policy = FifoPolicy::new(1, 2);
    policy.on_install(0, 0);
    policy.on_install(0, 1);
    assert_eq!(policy.pick_victim(0), 0);
    policy.on_invalidate(0, 0);
    policy.on_install(0, 0);
    assert_eq!(policy.pick_victim(0), 1);
}
