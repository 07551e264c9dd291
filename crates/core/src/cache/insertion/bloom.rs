//! Bloom-filter dead-block predictor.
//!
//! A bit array records the lines a level has seen die below it. A line whose
//! bits are all set is predicted dead and refused installation; false
//! positives (hash collisions) only cost a skipped allocation. The filter is
//! never reset during a run.
//!
//! Two variants exist in the field:
//! - the plain predictor trains on every eviction;
//! - the clean-line variant (`bloom_clean_S`) trains on dirty evictions only
//!   and installs clean lines only, steering write-heavy lines away from a
//!   wear-limited level while still caching read-mostly data.

use super::{InsertionPolicy, Lfsr};

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bloom-filter dead-block predictor state.
#[derive(Debug)]
pub struct BloomPredictor {
    /// Bit array, packed into 64-bit words.
    words: Vec<u64>,
    /// Size of the bit array in bits.
    num_bits: usize,
    /// Number of hash functions.
    hashes: u32,
    /// Probability gate: installs are considered with this percent chance.
    pct: u32,
    /// Refuse lines that were written below (clean lines only).
    clean_only: bool,
    /// Train the filter on dirty evictions only.
    train_dirty_only: bool,
    /// log2 of the line size; addresses are hashed at line granularity.
    line_bits: u32,
    /// Generator behind the probability gate.
    rng: Lfsr,
}

impl BloomPredictor {
    /// Creates a predictor.
    ///
    /// # Arguments
    ///
    /// * `num_bits` - Size of the bit array (need not be a power of two).
    /// * `hashes` - Number of hash functions, each with its own seed.
    /// * `pct` - Probability gate in percent; 100 disables the gate.
    /// * `clean_only` - Refuse lines with a non-zero write count.
    /// * `train_dirty_only` - Set bits only for dirty evictions.
    /// * `line_bits` - log2 of the cache line size.
    /// * `seed` - Seed for the probability gate.
    pub fn new(
        num_bits: usize,
        hashes: u32,
        pct: u32,
        clean_only: bool,
        train_dirty_only: bool,
        line_bits: u32,
        seed: u64,
    ) -> Self {
        let num_bits = num_bits.max(1);
        Self {
            words: vec![0; num_bits.div_ceil(64)],
            num_bits,
            hashes,
            pct,
            clean_only,
            train_dirty_only,
            line_bits,
            rng: Lfsr::new(seed),
        }
    }

    /// Hash function `which` over the line tag of `addr`, in `[0, num_bits)`.
    ///
    /// FNV-1a over the tag bytes, with the per-function seed mixed into the
    /// offset basis.
    fn bit_index(&self, which: u32, addr: u64) -> usize {
        let mut hash = FNV_OFFSET ^ u64::from(which);
        let tag = addr >> self.line_bits;
        for byte in tag.to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        (hash % self.num_bits as u64) as usize
    }

    /// Returns whether bit `idx` is set.
    fn get(&self, idx: usize) -> bool {
        self.words[idx / 64] & (1 << (idx % 64)) != 0
    }

    /// Sets bit `idx`.
    fn set(&mut self, idx: usize) {
        self.words[idx / 64] |= 1 << (idx % 64);
    }

    /// Returns whether every hash bit for `addr` is set ("predicted dead").
    fn predicted_dead(&self, addr: u64) -> bool {
        (0..self.hashes).all(|i| self.get(self.bit_index(i, addr)))
    }
}

impl InsertionPolicy for BloomPredictor {
    /// Decides whether the offered line is installed.
    ///
    /// Order matters: the probability gate draws from the generator first
    /// (so the stream is identical across configurations), then the
    /// clean-line restriction applies, then the filter lookup.
    fn should_allocate(&mut self, addr: u64, _rdcount: u32, wrcount: u32, _is_inst: bool) -> bool {
        if self.rng.percent() >= self.pct {
            return false;
        }
        if self.clean_only && wrcount > 0 {
            return false;
        }
        !self.predicted_dead(addr)
    }

    /// Records the death of the line at `addr`.
    fn on_evict(&mut self, addr: u64, _rdcount: u32, wrcount: u32) {
        if self.train_dirty_only && wrcount == 0 {
            return;
        }
        for i in 0..self.hashes {
            let idx = self.bit_index(i, addr);
            self.set(idx);
        }
    }
}
