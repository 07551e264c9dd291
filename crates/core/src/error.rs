//! Error types for configuration, trace parsing, and simulation.
//!
//! Nothing in the simulator is retried: a configuration error aborts before
//! any record is processed, and a trace format or I/O error aborts the run
//! with the offending context attached.

use std::io;

use thiserror::Error;

/// Errors raised while validating the simulator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A geometry parameter that must be a power of two is not.
    #[error("{field} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending parameter.
        field: &'static str,
        /// The rejected value.
        value: u64,
    },

    /// The line size is below the 4-byte minimum.
    #[error("line size must be at least 4 bytes, got {0}")]
    LineTooSmall(usize),

    /// A cache level is smaller than a single set.
    #[error("{field}: capacity {size} bytes holds fewer than {assoc} lines of {line} bytes")]
    TooFewBlocks {
        /// Name of the offending level.
        field: &'static str,
        /// Configured capacity in bytes.
        size: usize,
        /// Configured associativity.
        assoc: usize,
        /// Configured line size in bytes.
        line: usize,
    },

    /// The replacement policy name is not one of LRU, LFU, FIFO.
    #[error("unknown replacement policy: {0:?}")]
    UnknownReplacementPolicy(String),

    /// The insertion policy name is not recognized.
    #[error("unknown insertion policy: {0:?}")]
    UnknownInsertionPolicy(String),

    /// A numeric parameter embedded in a policy name did not parse.
    #[error("bad numeric parameter in policy {0:?}")]
    BadPolicyParameter(String),

    /// No input trace was supplied.
    #[error("no input trace: supply an L1 trace or an L2 trace")]
    MissingTracePath,

    /// Both an L1 and an L2 input trace were supplied.
    #[error("conflicting inputs: supply either an L1 trace or an L2 trace, not both")]
    ConflictingTraceInputs,

    /// The core count is zero.
    #[error("core count must be at least 1")]
    NoCores,
}

/// Errors raised while reading or parsing a trace.
#[derive(Error, Debug)]
pub enum TraceError {
    /// The two-character record prefix is not one of IB/IM/IE/DR/DW/DE.
    #[error("line {line_no}: unknown trace record {line:?}")]
    UnknownRecord {
        /// 1-based line number in the trace.
        line_no: u64,
        /// The offending line.
        line: String,
    },

    /// A record is missing fields or a field failed to parse as a number.
    #[error("line {line_no}: malformed trace record {line:?}")]
    MalformedRecord {
        /// 1-based line number in the trace.
        line_no: u64,
        /// The offending line.
        line: String,
    },

    /// A record names a core outside the configured range.
    #[error("line {line_no}: core {core} out of range (configured cores: {cores})")]
    CoreOutOfRange {
        /// 1-based line number in the trace.
        line_no: u64,
        /// The core named by the record.
        core: usize,
        /// The configured core count.
        cores: usize,
    },

    /// Reading the trace failed.
    #[error("trace I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Top-level error type for the simulator.
#[derive(Error, Debug)]
pub enum SimError {
    /// Invalid configuration; reported before any record is processed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fatal trace format or trace I/O error.
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),

    /// Fatal I/O error on the derived-trace output.
    #[error("log output error: {0}")]
    LogIo(#[from] io::Error),
}

/// Type alias for `Result` with [`SimError`].
pub type SimResult<T> = Result<T, SimError>;
