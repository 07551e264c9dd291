//! Simulation: event driver, warmup and simulation limits.

/// Event loop consuming trace records and driving the hierarchy.
pub mod driver;

pub use driver::{Driver, RunSummary};
