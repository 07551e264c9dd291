//! Simulator configuration.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the hierarchy. It provides:
//! 1. **Defaults:** Baseline hierarchy constants (level sizes, associativity,
//!    line size, core count).
//! 2. **Structures:** Per-level cache config plus trace paths and run limits.
//! 3. **Enums:** Replacement and insertion policy kinds, including textual
//!    parsing of parameterized policy names (`write_4`, `rand_50`,
//!    `bloom_4096`, `bloom_clean_4096`).
//!
//! Configuration is supplied as JSON (every field has a serde default) or
//! assembled field-by-field by the CLI; use `Config::default()` for the
//! stock four-core L2/L3/L4 hierarchy.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline hierarchy when not explicitly overridden.
mod defaults {
    /// Per-core L2 capacity (256 KiB).
    pub const L2_SIZE: usize = 256 * 1024;

    /// Shared L3 capacity (16 MiB).
    pub const L3_SIZE: usize = 16 * 1024 * 1024;

    /// Shared last-level L4 capacity (1 GiB).
    ///
    /// The L4 models a storage-class-memory side cache, hence the wear
    /// counters tracked per block.
    pub const L4_SIZE: usize = 1024 * 1024 * 1024;

    /// Associativity used at every level (16 ways).
    pub const ASSOC: usize = 16;

    /// Line size in bytes (64 bytes).
    ///
    /// Matches typical processor cache lines; the trace addresses are
    /// interpreted against this granularity.
    pub const LINE_SIZE: usize = 64;

    /// Number of cores (one private leaf cache each).
    pub const CORES: usize = 4;

    /// Seed for every policy-level pseudo-random generator.
    ///
    /// All randomness in the simulator derives from this value, so two runs
    /// with equal seeds and traces produce identical statistics.
    pub const SEED: u64 = 0x1DB7_5395;
}

/// Cache replacement policy algorithms.
///
/// Selects which resident line leaves a full set when a new line is
/// installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementKind {
    /// Least Recently Used: evicts the line accessed longest ago.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Least Frequently Used: evicts the line with the fewest accesses.
    #[serde(alias = "Lfu")]
    Lfu,
    /// First-In, First-Out: evicts the line installed longest ago.
    #[serde(alias = "Fifo")]
    Fifo,
}

impl FromStr for ReplacementKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            // An empty name means "not specified" and defaults to LRU.
            "" | "LRU" => Ok(Self::Lru),
            "LFU" => Ok(Self::Lfu),
            "FIFO" => Ok(Self::Fifo),
            _ => Err(ConfigError::UnknownReplacementPolicy(s.to_string())),
        }
    }
}

/// Insertion (inclusion) policy kinds.
///
/// Consulted only by a cache in allocate-on-eviction mode, to decide whether
/// a line offered by a lower level's eviction is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum InsertionKind {
    /// Install every offered line.
    All,
    /// Install nothing.
    None,
    /// Install lines that have carried instruction bytes.
    InstOnly,
    /// Install lines read at least this many times below.
    ReadThreshold(u32),
    /// Install lines written at most this many times below.
    WriteThreshold(u32),
    /// Install with the given percent probability.
    Random(u32),
    /// Bloom-filter dead-block predictor over this many bits.
    Bloom {
        /// Bit-array size.
        bits: usize,
        /// Install clean lines only (refuse lines written below).
        clean_only: bool,
        /// Train the filter on dirty evictions only.
        train_dirty_only: bool,
    },
}

impl FromStr for InsertionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        /// Parses the numeric suffix of a parameterized policy name.
        fn parse_num<T: FromStr>(suffix: &str, name: &str) -> Result<T, ConfigError> {
            suffix
                .parse()
                .map_err(|_| ConfigError::BadPolicyParameter(name.to_string()))
        }
        match s {
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            "inst" => Ok(Self::InstOnly),
            _ => {
                if let Some(n) = s.strip_prefix("read_") {
                    Ok(Self::ReadThreshold(parse_num(n, s)?))
                } else if let Some(n) = s.strip_prefix("write_") {
                    Ok(Self::WriteThreshold(parse_num(n, s)?))
                } else if let Some(n) = s.strip_prefix("rand_") {
                    Ok(Self::Random(parse_num(n, s)?))
                } else if let Some(n) = s.strip_prefix("bloom_clean_") {
                    Ok(Self::Bloom {
                        bits: parse_num(n, s)?,
                        clean_only: true,
                        train_dirty_only: true,
                    })
                } else if let Some(n) = s.strip_prefix("bloom_") {
                    Ok(Self::Bloom {
                        bits: parse_num(n, s)?,
                        clean_only: false,
                        train_dirty_only: false,
                    })
                } else {
                    Err(ConfigError::UnknownInsertionPolicy(s.to_string()))
                }
            }
        }
    }
}

impl TryFrom<String> for InsertionKind {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Configuration of one cache level.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelConfig {
    /// Total capacity in bytes (power of two).
    pub size_bytes: usize,

    /// Associativity (power of two).
    #[serde(default = "LevelConfig::default_assoc")]
    pub assoc: usize,

    /// Replacement policy.
    #[serde(default)]
    pub replacement: ReplacementKind,

    /// Insertion policy; setting one implies allocate-on-eviction mode.
    #[serde(default)]
    pub insertion: Option<InsertionKind>,

    /// Allocate-on-eviction mode without overriding the insertion policy
    /// (which then defaults to `all`).
    #[serde(default)]
    pub non_inclusive: bool,

    /// Evict a block once its per-residency write count exceeds this value;
    /// 0 disables.
    #[serde(default)]
    pub evict_after_n_writes: u32,
}

impl LevelConfig {
    /// A level of the given capacity with default associativity and policies.
    pub fn with_size(size_bytes: usize) -> Self {
        Self {
            size_bytes,
            assoc: defaults::ASSOC,
            replacement: ReplacementKind::default(),
            insertion: None,
            non_inclusive: false,
            evict_after_n_writes: 0,
        }
    }

    /// Returns the default associativity.
    fn default_assoc() -> usize {
        defaults::ASSOC
    }

    /// Whether this level runs in allocate-on-eviction (non-inclusive) mode.
    pub fn alloc_on_evict(&self) -> bool {
        self.non_inclusive || self.insertion.is_some()
    }
}

/// Trace input/output paths.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceConfig {
    /// L1-miss input trace; drives the full L2/L3/L4 hierarchy.
    #[serde(default)]
    pub l1_trace: Option<PathBuf>,

    /// L2-miss input trace, produced earlier by the miss logger; the leaves
    /// are skipped and records feed the shared L3 directly.
    #[serde(default)]
    pub l2_trace: Option<PathBuf>,

    /// Output path for the derived L2-miss trace. Attaching the logger
    /// severs the leaves' parent link so the emitted stream is exhaustive.
    #[serde(default)]
    pub l2_trace_out: Option<PathBuf>,
}

/// Warmup and simulation limits.
///
/// At the warmup boundary every counter is reset once; at the simulation
/// boundary the run stops cleanly. Both boundaries may be expressed in
/// retired instructions (from `IB` records) or in miss records
/// (`IM` + `DR` + `DW`). Simulation limits count from the warmup boundary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitConfig {
    /// Reset statistics after this many retired instructions.
    #[serde(default)]
    pub warmup_insts: Option<u64>,

    /// Stop after this many retired instructions past warmup.
    #[serde(default)]
    pub sim_insts: Option<u64>,

    /// Reset statistics after this many miss records.
    #[serde(default)]
    pub warmup_misses: Option<u64>,

    /// Stop after this many miss records past warmup.
    #[serde(default)]
    pub sim_misses: Option<u64>,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use cachesim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.cores, 4);
/// assert_eq!(config.l2.size_bytes, 256 * 1024);
/// assert!(config.validate().is_err()); // no input trace yet
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use cachesim_core::config::{Config, InsertionKind, ReplacementKind};
///
/// let json = r#"{
///     "cores": 2,
///     "line_size": 64,
///     "l2": { "size_bytes": 65536, "assoc": 8 },
///     "l3": { "size_bytes": 1048576, "replacement": "LFU" },
///     "l4": { "size_bytes": 16777216, "insertion": "bloom_4096" },
///     "trace": { "l1_trace": "run.trace" }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.cores, 2);
/// assert_eq!(config.l3.replacement, ReplacementKind::Lfu);
/// assert_eq!(
///     config.l4.insertion,
///     Some(InsertionKind::Bloom {
///         bits: 4096,
///         clean_only: false,
///         train_dirty_only: false
///     })
/// );
/// assert!(config.l4.alloc_on_evict());
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Number of cores; one private leaf cache each.
    #[serde(default = "Config::default_cores")]
    pub cores: usize,

    /// Line size in bytes, shared by every level (power of two, ≥ 4).
    #[serde(default = "Config::default_line_size")]
    pub line_size: usize,

    /// Private per-core L2 configuration.
    #[serde(default = "Config::default_l2")]
    pub l2: LevelConfig,

    /// Shared L3 configuration.
    #[serde(default = "Config::default_l3")]
    pub l3: LevelConfig,

    /// Shared last-level L4 configuration.
    #[serde(default = "Config::default_l4")]
    pub l4: LevelConfig,

    /// Trace input/output paths.
    #[serde(default)]
    pub trace: TraceConfig,

    /// Warmup and simulation limits.
    #[serde(default)]
    pub limits: LimitConfig,

    /// Seed for every policy-level pseudo-random generator.
    #[serde(default = "Config::default_seed")]
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cores: defaults::CORES,
            line_size: defaults::LINE_SIZE,
            l2: Self::default_l2(),
            l3: Self::default_l3(),
            l4: Self::default_l4(),
            trace: TraceConfig::default(),
            limits: LimitConfig::default(),
            seed: defaults::SEED,
        }
    }
}

impl Config {
    /// Returns the default core count.
    fn default_cores() -> usize {
        defaults::CORES
    }

    /// Returns the default line size in bytes.
    fn default_line_size() -> usize {
        defaults::LINE_SIZE
    }

    /// Returns the default L2 level configuration.
    fn default_l2() -> LevelConfig {
        LevelConfig::with_size(defaults::L2_SIZE)
    }

    /// Returns the default L3 level configuration.
    fn default_l3() -> LevelConfig {
        LevelConfig::with_size(defaults::L3_SIZE)
    }

    /// Returns the default L4 level configuration.
    fn default_l4() -> LevelConfig {
        LevelConfig::with_size(defaults::L4_SIZE)
    }

    /// Returns the default PRNG seed.
    fn default_seed() -> u64 {
        defaults::SEED
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a geometry parameter is not a power of
    /// two, the line size is below 4 bytes, the core count is zero, or the
    /// trace paths are missing or conflicting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cores == 0 {
            return Err(ConfigError::NoCores);
        }
        if self.line_size < 4 {
            return Err(ConfigError::LineTooSmall(self.line_size));
        }
        if !self.line_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "line_size",
                value: self.line_size as u64,
            });
        }
        for (name, level) in [("L2", &self.l2), ("L3", &self.l3), ("L4", &self.l4)] {
            level_geometry(name, level, self.line_size)?;
        }
        match (&self.trace.l1_trace, &self.trace.l2_trace) {
            (None, None) => Err(ConfigError::MissingTracePath),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingTraceInputs),
            _ => Ok(()),
        }
    }
}

/// Checks one level's geometry against the shared line size.
fn level_geometry(name: &'static str, level: &LevelConfig, line: usize) -> Result<(), ConfigError> {
    if !level.size_bytes.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo {
            field: name,
            value: level.size_bytes as u64,
        });
    }
    if !level.assoc.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo {
            field: name,
            value: level.assoc as u64,
        });
    }
    let num_blocks = level.size_bytes / line;
    if num_blocks < level.assoc {
        return Err(ConfigError::TooFewBlocks {
            field: name,
            size: level.size_bytes,
            assoc: level.assoc,
            line,
        });
    }
    // Power-of-two size / power-of-two line / power-of-two assoc makes the
    // set count a power of two as well, which the index mask relies on.
    Ok(())
}
