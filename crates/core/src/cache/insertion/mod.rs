//! Cache Insertion (Inclusion) Policies.
//!
//! A cache in allocate-on-eviction mode installs lines only when a lower
//! level evicts them. The insertion policy decides, per offered line,
//! whether the installation happens; it is trained with the use counters of
//! every line that dies below.
//!
//! # Policies
//!
//! - `all` / `none`: install everything / nothing.
//! - `inst`: install lines that have carried instruction bytes.
//! - `read_T` / `write_T`: read-count floor / write-count ceiling.
//! - `rand_P`: install with percent probability P.
//! - `bloom_S` / `bloom_clean_S`: Bloom-filter dead-block predictor.

/// Bloom-filter dead-block predictor.
pub mod bloom;

pub use bloom::BloomPredictor;

use crate::config::InsertionKind;

/// Default hash count for the Bloom predictor.
const BLOOM_HASHES: u32 = 2;

/// Default probability gate for the Bloom predictor (percent).
const BLOOM_PCT: u32 = 100;

/// Trait for insertion policies.
///
/// Consulted only by caches in allocate-on-eviction mode; an inclusive cache
/// behaves as `IncludeAll` without going through this interface.
pub trait InsertionPolicy {
    /// Decides whether the line at `addr` is installed.
    ///
    /// # Arguments
    ///
    /// * `addr` - Line-aligned byte address.
    /// * `rdcount` - Reads of the line at the level that evicted it.
    /// * `wrcount` - Writes of the line at the level that evicted it.
    /// * `is_inst` - The line has carried instruction bytes.
    fn should_allocate(&mut self, addr: u64, rdcount: u32, wrcount: u32, is_inst: bool) -> bool;

    /// Observes an eviction of the line at `addr` with its use counters.
    ///
    /// Called both for lines leaving this cache and for lines offered to it
    /// by a lower level's eviction, so a predictor sees every death in its
    /// part of the hierarchy.
    fn on_evict(&mut self, addr: u64, rdcount: u32, wrcount: u32);
}

impl std::fmt::Debug for dyn InsertionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InsertionPolicy")
    }
}

/// A xorshift64 pseudo-random generator.
///
/// Every probabilistic gate in the simulator draws from one of these, seeded
/// from the configuration, so identical seeds and traces give identical
/// statistics.
#[derive(Clone, Debug)]
pub struct Lfsr {
    state: u64,
}

impl Lfsr {
    /// Creates a generator from a seed; a zero seed is remapped (xorshift
    /// has an all-zero fixed point).
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    /// Advances the generator and returns the next value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform draw from `[0, 100)`.
    pub fn percent(&mut self) -> u32 {
        (self.next_u64() % 100) as u32
    }
}

/// Installs every offered line.
#[derive(Debug, Default)]
pub struct IncludeAll;

impl InsertionPolicy for IncludeAll {
    fn should_allocate(&mut self, _addr: u64, _rd: u32, _wr: u32, _inst: bool) -> bool {
        true
    }

    fn on_evict(&mut self, _addr: u64, _rd: u32, _wr: u32) {}
}

/// Installs nothing; the level acts as a statistics-only bypass.
#[derive(Debug, Default)]
pub struct IncludeNone;

impl InsertionPolicy for IncludeNone {
    fn should_allocate(&mut self, _addr: u64, _rd: u32, _wr: u32, _inst: bool) -> bool {
        false
    }

    fn on_evict(&mut self, _addr: u64, _rd: u32, _wr: u32) {}
}

/// Installs lines that have carried instruction bytes.
#[derive(Debug, Default)]
pub struct IncludeInstOnly;

impl InsertionPolicy for IncludeInstOnly {
    fn should_allocate(&mut self, _addr: u64, _rd: u32, _wr: u32, is_inst: bool) -> bool {
        is_inst
    }

    fn on_evict(&mut self, _addr: u64, _rd: u32, _wr: u32) {}
}

/// Installs lines read at least `threshold` times at the level below.
#[derive(Debug)]
pub struct ReadThreshold {
    threshold: u32,
}

impl ReadThreshold {
    /// Creates the policy with the given read-count floor.
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl InsertionPolicy for ReadThreshold {
    fn should_allocate(&mut self, _addr: u64, rdcount: u32, _wr: u32, _inst: bool) -> bool {
        rdcount >= self.threshold
    }

    fn on_evict(&mut self, _addr: u64, _rd: u32, _wr: u32) {}
}

/// Installs lines written at most `threshold` times at the level below.
///
/// The write ceiling keeps write-heavy lines out of a wear-limited level.
#[derive(Debug)]
pub struct WriteThreshold {
    threshold: u32,
}

impl WriteThreshold {
    /// Creates the policy with the given write-count ceiling.
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl InsertionPolicy for WriteThreshold {
    fn should_allocate(&mut self, _addr: u64, _rd: u32, wrcount: u32, _inst: bool) -> bool {
        wrcount <= self.threshold
    }

    fn on_evict(&mut self, _addr: u64, _rd: u32, _wr: u32) {}
}

/// Installs offered lines with a fixed percent probability.
#[derive(Debug)]
pub struct RandomInclude {
    pct: u32,
    rng: Lfsr,
}

impl RandomInclude {
    /// Creates the policy installing with probability `pct` / 100.
    pub fn new(pct: u32, seed: u64) -> Self {
        Self {
            pct,
            rng: Lfsr::new(seed),
        }
    }
}

impl InsertionPolicy for RandomInclude {
    fn should_allocate(&mut self, _addr: u64, _rd: u32, _wr: u32, _inst: bool) -> bool {
        self.rng.percent() < self.pct
    }

    fn on_evict(&mut self, _addr: u64, _rd: u32, _wr: u32) {}
}

/// Builds the insertion policy selected by the configuration.
///
/// `None` means the level is inclusive-by-default and behaves as
/// `IncludeAll`.
///
/// # Arguments
///
/// * `kind` - The configured policy kind, if any.
/// * `line_bits` - log2 of the line size, for Bloom address hashing.
/// * `seed` - Seed for the probabilistic gates.
pub fn build(kind: Option<InsertionKind>, line_bits: u32, seed: u64) -> Box<dyn InsertionPolicy> {
    match kind {
        None | Some(InsertionKind::All) => Box::new(IncludeAll),
        Some(InsertionKind::None) => Box::new(IncludeNone),
        Some(InsertionKind::InstOnly) => Box::new(IncludeInstOnly),
        Some(InsertionKind::ReadThreshold(t)) => Box::new(ReadThreshold::new(t)),
        Some(InsertionKind::WriteThreshold(t)) => Box::new(WriteThreshold::new(t)),
        Some(InsertionKind::Random(p)) => Box::new(RandomInclude::new(p, seed)),
        Some(InsertionKind::Bloom {
            bits,
            clean_only,
            train_dirty_only,
        }) => Box::new(BloomPredictor::new(
            bits,
            BLOOM_HASHES,
            BLOOM_PCT,
            clean_only,
            train_dirty_only,
            line_bits,
            seed,
        )),
    }
}
