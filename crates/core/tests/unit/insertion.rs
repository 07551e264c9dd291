//! Insertion Policy Tests.
//!
//! Verifies the allocation decisions of the insertion (inclusion) policies
//! in isolation: the fixed policies, the thresholds, the seeded random gate,
//! and the Bloom dead-block predictor with its training and clean-line
//! variants.

use rstest::rstest;

use cachesim_core::cache::insertion::{
    BloomPredictor, IncludeAll, IncludeInstOnly, IncludeNone, InsertionPolicy, RandomInclude,
    ReadThreshold, WriteThreshold,
};

/// log2 of the test line size (64 B).
const LINE_BITS: u32 = 6;

/// Fixed seed for the probabilistic gates.
const SEED: u64 = 0xDEAD_BEEF;

// ══════════════════════════════════════════════════════════
// 1. Fixed policies
// ══════════════════════════════════════════════════════════

/// `all` installs everything.
#[test]
fn include_all_always_allocates() {
    let mut policy = IncludeAll;
    assert!(policy.should_allocate(0x1000, 0, 0, false));
    assert!(policy.should_allocate(0x2000, 7, 3, true));
}

/// `none` installs nothing.
#[test]
fn include_none_never_allocates() {
    let mut policy = IncludeNone;
    assert!(!policy.should_allocate(0x1000, 100, 0, false));
    assert!(!policy.should_allocate(0x2000, 0, 0, true));
}

/// `inst` follows the instruction flag.
#[test]
fn include_inst_only_follows_flag() {
    let mut policy = IncludeInstOnly;
    assert!(policy.should_allocate(0x1000, 0, 0, true));
    assert!(!policy.should_allocate(0x1000, 0, 0, false));
}

// ══════════════════════════════════════════════════════════
// 2. Thresholds
// ══════════════════════════════════════════════════════════

/// `read_T` installs lines read at least T times.
#[rstest]
#[case(0, true)]
#[case(2, true)]
#[case(3, true)]
#[case(4, false)]
fn read_threshold_is_floor(#[case] threshold: u32, #[case] expected: bool) {
    let mut policy = ReadThreshold::new(threshold);
    assert_eq!(policy.should_allocate(0x1000, 3, 0, false), expected);
}

/// `write_T` installs lines written at most T times.
#[rstest]
#[case(0, false)]
#[case(2, false)]
#[case(3, true)]
#[case(10, true)]
fn write_threshold_is_ceiling(#[case] threshold: u32, #[case] expected: bool) {
    let mut policy = WriteThreshold::new(threshold);
    assert_eq!(policy.should_allocate(0x1000, 0, 3, false), expected);
}

// ══════════════════════════════════════════════════════════
// 3. Random gate
// ══════════════════════════════════════════════════════════

/// Probability 0 never installs; 100 always installs.
#[test]
fn random_degenerate_probabilities() {
    let mut never = RandomInclude::new(0, SEED);
    let mut always = RandomInclude::new(100, SEED);
    for i in 0..100 {
        assert!(!never.should_allocate(i * 64, 1, 0, false));
        assert!(always.should_allocate(i * 64, 1, 0, false));
    }
}

/// Equal seeds produce identical decision streams.
#[test]
fn random_is_deterministic_per_seed() {
    let mut a = RandomInclude::new(50, SEED);
    let mut b = RandomInclude::new(50, SEED);
    let decisions_a: Vec<bool> = (0..64).map(|i| a.should_allocate(i, 0, 0, false)).collect();
    let decisions_b: Vec<bool> = (0..64).map(|i| b.should_allocate(i, 0, 0, false)).collect();
    assert_eq!(decisions_a, decisions_b);
    // A 50% gate over 64 draws accepts some and rejects some.
    assert!(decisions_a.iter().any(|&d| d));
    assert!(decisions_a.iter().any(|&d| !d));
}

// ══════════════════════════════════════════════════════════
// 4. Bloom predictor
// ══════════════════════════════════════════════════════════

/// A plain predictor with the gate open.
fn plain_bloom() -> BloomPredictor {
    BloomPredictor::new(4096, 2, 100, false, false, LINE_BITS, SEED)
}

/// Untrained addresses are allowed through.
#[test]
fn bloom_untrained_allocates() {
    let mut bloom = plain_bloom();
    assert!(bloom.should_allocate(0x4000, 1, 0, false));
}

/// Once an address has been seen dying, it is predicted dead.
#[test]
fn bloom_trained_address_refused() {
    let mut bloom = plain_bloom();
    bloom.on_evict(0x4000, 1, 0);
    assert!(!bloom.should_allocate(0x4000, 1, 0, false));
    // A different line is unaffected (no collision in a 4096-bit array
    // with two adjacent tags).
    assert!(bloom.should_allocate(0x8000, 1, 0, false));
}

/// Training is at line granularity: every offset in the line matches.
#[test]
fn bloom_training_is_line_granular() {
    let mut bloom = plain_bloom();
    bloom.on_evict(0x4000, 1, 0);
    assert!(!bloom.should_allocate(0x4000 + 63, 1, 0, false));
}

/// The clean-only variant refuses lines that were written below.
#[test]
fn bloom_clean_only_refuses_dirty_lines() {
    let mut bloom = BloomPredictor::new(4096, 2, 100, true, false, LINE_BITS, SEED);
    assert!(!bloom.should_allocate(0x4000, 3, 1, false));
    assert!(bloom.should_allocate(0x4000, 3, 0, false));
}

/// The dirty-training variant ignores clean deaths.
#[test]
fn bloom_dirty_training_ignores_clean_evictions() {
    let mut bloom = BloomPredictor::new(4096, 2, 100, false, true, LINE_BITS, SEED);
    bloom.on_evict(0x4000, 5, 0);
    assert!(bloom.should_allocate(0x4000, 1, 0, false));
    bloom.on_evict(0x4000, 0, 2);
    assert!(!bloom.should_allocate(0x4000, 1, 0, false));
}

/// A zero-percent gate refuses everything regardless of training.
#[test]
fn bloom_gate_closed_refuses_everything() {
    let mut bloom = BloomPredictor::new(4096, 2, 0, false, false, LINE_BITS, SEED);
    assert!(!bloom.should_allocate(0x4000, 1, 0, false));
}

/// The filter is never reset: training persists.
#[test]
fn bloom_training_persists() {
    let mut bloom = plain_bloom();
    bloom.on_evict(0x4000, 1, 0);
    for _ in 0..1000 {
        assert!(!bloom.should_allocate(0x4000, 1, 0, false));
    }
}
