//! Set-Associative Cache Model.
//!
//! This module implements the storage side of one cache level: per-line
//! metadata blocks, the set/tag geometry derived from the configured line
//! size, and the wear summaries. The request pipeline that moves references
//! between levels lives in [`crate::hierarchy`].

/// Insertion (inclusion) policy implementations.
pub mod insertion;

/// Replacement policy implementations (LRU, LFU, FIFO).
pub mod policies;

use self::insertion::InsertionPolicy;
use self::policies::ReplacementPolicy;
use crate::config::LevelConfig;
use crate::error::ConfigError;
use crate::stats::CacheStats;

/// Sentinel tag marking an empty way.
pub const TAG_INVALID: u64 = u64::MAX;

/// Metadata for one cache line.
///
/// A block's `tag` is the sole identity used for hit detection; `TAG_INVALID`
/// marks the slot as empty. The wear counter models cell endurance and is the
/// only field that survives [`Block::reset`].
#[derive(Clone, Debug)]
pub struct Block {
    /// Line tag (`addr >> log2(line_size)`), or [`TAG_INVALID`].
    pub tag: u64,
    /// The line holds data newer than the level above.
    pub dirty: bool,
    /// Reads of the line during its current residency.
    pub rdcount: u32,
    /// Writes of the line during its current residency.
    pub wrcount: u32,
    /// The line has carried instruction bytes at any point.
    pub ever_inst: bool,
    /// Lifetime write count of this physical slot.
    pub wearout: u64,
}

impl Default for Block {
    fn default() -> Self {
        Self {
            tag: TAG_INVALID,
            dirty: false,
            rdcount: 0,
            wrcount: 0,
            ever_inst: false,
            wearout: 0,
        }
    }
}

impl Block {
    /// Returns whether the slot holds a line.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.tag != TAG_INVALID
    }

    /// Empties the slot. The wear counter is physical and is preserved.
    pub fn reset(&mut self) {
        self.tag = TAG_INVALID;
        self.dirty = false;
        self.rdcount = 0;
        self.wrcount = 0;
        self.ever_inst = false;
    }
}

/// One level of the cache hierarchy.
///
/// A set-associative array of [`Block`]s plus the level's statistics and
/// policies. The parent link is an index into the owning
/// [`crate::hierarchy::Hierarchy`] arena; only the root level has none.
#[derive(Debug)]
pub struct Cache {
    /// Display name, e.g. `L2#0` or `L3`.
    pub name: String,
    /// Statistics sink for this level.
    pub stats: CacheStats,

    pub(crate) assoc: usize,
    pub(crate) blocks_per_set: usize,
    pub(crate) line_bits: u32,
    pub(crate) set_mask: u64,
    pub(crate) blocks: Vec<Block>,

    pub(crate) repl: Box<dyn ReplacementPolicy>,
    pub(crate) insert: Box<dyn InsertionPolicy>,

    /// Allocate only on evictions from below (non-inclusive mode).
    pub(crate) alloc_on_evict: bool,
    /// Force eviction once a residency's write count exceeds this; 0 disables.
    pub(crate) evict_after_n_writes: u32,
    /// This level only ever holds instruction lines.
    pub(crate) is_icache: bool,
    /// Core this level is private to (0 for shared levels).
    pub(crate) core: usize,
    /// Arena index of the next level, if any.
    pub(crate) parent: Option<usize>,

    /// Misses and evictions at this level are written to the derived trace.
    pub(crate) log_misses: bool,
    /// Instructions retired since the last logged miss (logger batching).
    pub(crate) recent_instructions: u64,

    /// Single-entry hit memo `(tag, way)` for the read fast path.
    pub(crate) last_hit: Option<(u64, usize)>,
}

impl Cache {
    /// Creates a cache level from its configuration.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name for reports.
    /// * `level` - Capacity, associativity, and policy configuration.
    /// * `line_size` - Line size in bytes, shared across the hierarchy.
    /// * `core` - Core the level is private to (0 for shared levels).
    /// * `parent` - Arena index of the next level, if any.
    /// * `seed` - Seed for the policy-level random generators.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the geometry is not a power of two or
    /// the capacity holds fewer lines than one set.
    pub fn new(
        name: impl Into<String>,
        level: &LevelConfig,
        line_size: usize,
        core: usize,
        parent: Option<usize>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if line_size < 4 {
            return Err(ConfigError::LineTooSmall(line_size));
        }
        if !line_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "line_size",
                value: line_size as u64,
            });
        }
        if !level.assoc.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "assoc",
                value: level.assoc as u64,
            });
        }
        if !level.size_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "size_bytes",
                value: level.size_bytes as u64,
            });
        }
        let num_blocks = level.size_bytes / line_size;
        if num_blocks < level.assoc {
            return Err(ConfigError::TooFewBlocks {
                field: "size_bytes",
                size: level.size_bytes,
                assoc: level.assoc,
                line: line_size,
            });
        }
        let blocks_per_set = num_blocks / level.assoc;
        let line_bits = line_size.trailing_zeros();

        let repl = policies::build(level.replacement, blocks_per_set, level.assoc);
        let insert = insertion::build(level.insertion, line_bits, seed);

        Ok(Self {
            name,
            stats: CacheStats::default(),
            assoc: level.assoc,
            blocks_per_set,
            line_bits,
            set_mask: blocks_per_set as u64 - 1,
            blocks: vec![Block::default(); num_blocks],
            repl,
            insert,
            alloc_on_evict: level.alloc_on_evict(),
            evict_after_n_writes: level.evict_after_n_writes,
            is_icache: false,
            core,
            parent,
            log_misses: false,
            recent_instructions: 0,
            last_hit: None,
        })
    }

    /// Returns the line tag for a byte address.
    #[inline]
    pub fn tag_of(&self, addr: u64) -> u64 {
        addr >> self.line_bits
    }

    /// Returns the set index for a line tag.
    #[inline]
    pub fn set_of(&self, tag: u64) -> usize {
        (tag & self.set_mask) as usize
    }

    /// Borrows the block at `(set, way)`.
    #[inline]
    pub fn block(&self, set: usize, way: usize) -> &Block {
        &self.blocks[set * self.assoc + way]
    }

    /// Mutably borrows the block at `(set, way)`.
    #[inline]
    pub(crate) fn block_mut(&mut self, set: usize, way: usize) -> &mut Block {
        &mut self.blocks[set * self.assoc + way]
    }

    /// Looks up `tag` in `set`.
    ///
    /// # Returns
    ///
    /// The way holding the tag, or `None` on a miss.
    pub fn lookup(&self, set: usize, tag: u64) -> Option<usize> {
        (0..self.assoc).find(|&way| self.block(set, way).tag == tag)
    }

    /// Checks whether the cache currently holds the line at `addr`.
    pub fn contains(&self, addr: u64) -> bool {
        let tag = self.tag_of(addr);
        self.lookup(self.set_of(tag), tag).is_some()
    }

    /// Associativity of this level.
    pub fn assoc(&self) -> usize {
        self.assoc
    }

    /// Number of sets in this level.
    pub fn num_sets(&self) -> usize {
        self.blocks_per_set
    }

    /// Arena index of the next level, if any.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Largest lifetime write count over all blocks.
    pub fn max_wearout(&self) -> u64 {
        self.blocks.iter().map(|b| b.wearout).max().unwrap_or(0)
    }

    /// Sum of lifetime write counts over all blocks.
    pub fn total_wearout(&self) -> u64 {
        self.blocks.iter().map(|b| b.wearout).sum()
    }

    /// Mean lifetime write count per block.
    pub fn mean_wearout(&self) -> f64 {
        if self.blocks.is_empty() {
            return 0.0;
        }
        self.total_wearout() as f64 / self.blocks.len() as f64
    }

    /// Zeros every block's wear counter. Called at the warmup boundary so
    /// wear summaries cover the measured region.
    pub(crate) fn reset_wearout(&mut self) {
        for b in &mut self.blocks {
            b.wearout = 0;
        }
    }
}
