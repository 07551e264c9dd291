//! Trace-driven cache hierarchy simulator library.
//!
//! This crate implements a multi-core, multi-level cache hierarchy simulator
//! driven by a stream of L1-miss events. It provides:
//! 1. **Cache model:** Set-associative caches with per-block read/write/wear
//!    counters and a configurable inclusive or allocate-on-eviction discipline.
//! 2. **Policies:** Replacement (LRU, LFU, FIFO) and insertion (all, none,
//!    instruction-only, thresholds, random, Bloom dead-block predictor).
//! 3. **Hierarchy:** Private per-core L2s feeding a shared L3 and a shared L4,
//!    with hit/miss, writeback, and wear statistics at every level.
//! 4. **Trace handling:** Parsing of `IB`/`IM`/`IE`/`DR`/`DW`/`DE` records, an
//!    event driver with warmup and simulation limits, and a miss logger that
//!    emits a derived trace for upper-level-only re-simulation.

/// Cache model: blocks, set-associative geometry, replacement and insertion policies.
pub mod cache;
/// Simulator configuration (defaults, enums, per-level config structures).
pub mod config;
/// Error types for configuration, trace parsing, and simulation.
pub mod error;
/// Cache hierarchy: arena of caches, request pipeline, eviction routine.
pub mod hierarchy;
/// Derived-trace writer for miss/eviction replay.
pub mod logger;
/// Memory reference model fed through the hierarchy.
pub mod memref;
/// Simulation driver: event loop, warmup/simulation limits.
pub mod sim;
/// Per-cache statistics counters and derived metrics.
pub mod stats;
/// Trace record model, parser, and reader.
pub mod trace;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The cache hierarchy; construct with `Hierarchy::new`.
pub use crate::hierarchy::Hierarchy;
/// Extended memory reference; the unit of work for the request pipeline.
pub use crate::memref::ExtMemRef;
/// Top-level event driver; owns the hierarchy and enforces limits.
pub use crate::sim::Driver;
