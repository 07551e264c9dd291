//! Configuration Tests.
//!
//! Verifies defaults, policy-name parsing, JSON deserialization with
//! partial input, and validation failures.

use std::path::PathBuf;

use cachesim_core::config::{Config, InsertionKind, ReplacementKind};
use cachesim_core::error::ConfigError;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

/// The stock configuration matches the documented hierarchy.
#[test]
fn default_config_values() {
    let config = Config::default();
    assert_eq!(config.cores, 4);
    assert_eq!(config.line_size, 64);
    assert_eq!(config.l2.size_bytes, 256 * 1024);
    assert_eq!(config.l3.size_bytes, 16 * 1024 * 1024);
    assert_eq!(config.l4.size_bytes, 1024 * 1024 * 1024);
    assert_eq!(config.l2.assoc, 16);
    assert_eq!(config.l2.replacement, ReplacementKind::Lru);
    assert_eq!(config.l2.insertion, None);
    assert!(!config.l2.alloc_on_evict());
    assert_eq!(config.l2.evict_after_n_writes, 0);
}

/// Either a non-inclusive flag or an insertion policy enables
/// allocate-on-eviction mode.
#[test]
fn alloc_on_evict_derivation() {
    let mut config = Config::default();
    assert!(!config.l3.alloc_on_evict());
    config.l3.non_inclusive = true;
    assert!(config.l3.alloc_on_evict());

    let mut config = Config::default();
    config.l3.insertion = Some(InsertionKind::All);
    assert!(config.l3.alloc_on_evict());
}

// ══════════════════════════════════════════════════════════
// 2. Policy-name parsing
// ══════════════════════════════════════════════════════════

/// Replacement names are case-insensitive; empty means LRU.
#[test]
fn replacement_parsing() {
    assert_eq!("LRU".parse::<ReplacementKind>().unwrap(), ReplacementKind::Lru);
    assert_eq!("lfu".parse::<ReplacementKind>().unwrap(), ReplacementKind::Lfu);
    assert_eq!("Fifo".parse::<ReplacementKind>().unwrap(), ReplacementKind::Fifo);
    assert_eq!("".parse::<ReplacementKind>().unwrap(), ReplacementKind::Lru);
    assert!(matches!(
        "MRU".parse::<ReplacementKind>().unwrap_err(),
        ConfigError::UnknownReplacementPolicy(_)
    ));
}

/// Insertion names, including parameterized forms.
#[test]
fn insertion_parsing() {
    assert_eq!("all".parse::<InsertionKind>().unwrap(), InsertionKind::All);
    assert_eq!("none".parse::<InsertionKind>().unwrap(), InsertionKind::None);
    assert_eq!(
        "inst".parse::<InsertionKind>().unwrap(),
        InsertionKind::InstOnly
    );
    assert_eq!(
        "read_3".parse::<InsertionKind>().unwrap(),
        InsertionKind::ReadThreshold(3)
    );
    assert_eq!(
        "write_4".parse::<InsertionKind>().unwrap(),
        InsertionKind::WriteThreshold(4)
    );
    assert_eq!(
        "rand_50".parse::<InsertionKind>().unwrap(),
        InsertionKind::Random(50)
    );
    assert_eq!(
        "bloom_4096".parse::<InsertionKind>().unwrap(),
        InsertionKind::Bloom {
            bits: 4096,
            clean_only: false,
            train_dirty_only: false
        }
    );
    assert_eq!(
        "bloom_clean_4096".parse::<InsertionKind>().unwrap(),
        InsertionKind::Bloom {
            bits: 4096,
            clean_only: true,
            train_dirty_only: true
        }
    );
}

/// Unknown names and bad parameters fail loudly.
#[test]
fn insertion_parsing_errors() {
    assert!(matches!(
        "lifo".parse::<InsertionKind>().unwrap_err(),
        ConfigError::UnknownInsertionPolicy(_)
    ));
    assert!(matches!(
        "write_x".parse::<InsertionKind>().unwrap_err(),
        ConfigError::BadPolicyParameter(_)
    ));
    assert!(matches!(
        "bloom_".parse::<InsertionKind>().unwrap_err(),
        ConfigError::BadPolicyParameter(_)
    ));
}

// ══════════════════════════════════════════════════════════
// 3. JSON deserialization
// ══════════════════════════════════════════════════════════

/// Partial JSON fills unspecified fields from the defaults.
#[test]
fn partial_json_uses_defaults() {
    let json = r#"{
        "cores": 2,
        "l2": { "size_bytes": 65536 },
        "trace": { "l1_trace": "t.trace" }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.cores, 2);
    assert_eq!(config.line_size, 64);
    assert_eq!(config.l2.size_bytes, 65536);
    assert_eq!(config.l2.assoc, 16);
    assert_eq!(config.l3.size_bytes, 16 * 1024 * 1024);
    config.validate().unwrap();
}

/// Policy strings deserialize inside level configs.
#[test]
fn json_policy_strings() {
    let json = r#"{
        "l3": {
            "size_bytes": 1048576,
            "replacement": "FIFO",
            "insertion": "bloom_clean_512"
        },
        "trace": { "l1_trace": "t.trace" }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.l3.replacement, ReplacementKind::Fifo);
    assert!(config.l3.alloc_on_evict());
    assert_eq!(
        config.l3.insertion,
        Some(InsertionKind::Bloom {
            bits: 512,
            clean_only: true,
            train_dirty_only: true
        })
    );
}

// ══════════════════════════════════════════════════════════
// 4. Validation
// ══════════════════════════════════════════════════════════

/// A valid configuration needs an input trace.
#[test]
fn validate_requires_trace() {
    let config = Config::default();
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::MissingTracePath
    ));

    let mut config = Config::default();
    config.trace.l1_trace = Some(PathBuf::from("a"));
    config.trace.l2_trace = Some(PathBuf::from("b"));
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::ConflictingTraceInputs
    ));
}

/// Geometry violations are rejected.
#[test]
fn validate_rejects_bad_geometry() {
    let mut config = Config::default();
    config.trace.l1_trace = Some(PathBuf::from("t"));
    config.line_size = 3;
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::LineTooSmall(3)
    ));

    let mut config = Config::default();
    config.trace.l1_trace = Some(PathBuf::from("t"));
    config.line_size = 48;
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::NotPowerOfTwo { .. }
    ));

    let mut config = Config::default();
    config.trace.l1_trace = Some(PathBuf::from("t"));
    config.l3.size_bytes = 3000;
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::NotPowerOfTwo { field: "L3", .. }
    ));

    let mut config = Config::default();
    config.trace.l1_trace = Some(PathBuf::from("t"));
    config.cores = 0;
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::NoCores
    ));
}
