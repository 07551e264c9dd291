//! Miss Logger Round-Trip Tests.
//!
//! The derived trace emitted by the leaf-attached logger must be a complete
//! stand-in for the leaves: replaying it against the upper levels alone must
//! reproduce their statistics exactly.

use std::fs;
use std::io::Cursor;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use cachesim_core::trace::TraceReader;
use cachesim_core::{Config, Driver};

use crate::common;

/// A mixed workload on one core: bundles, instruction and data misses,
/// write hits (dirty lines), conflict evictions, and L1 eviction records.
/// The stream ends on a compulsory miss so the final instruction bundle is
/// flushed into the log.
fn workload() -> String {
    [
        "IB 0 100",
        "DR 0 0",
        "DR 0 128",
        "DW 0 0",
        "IB 0 50",
        "DR 0 256",
        "DR 0 64",
        "IM 0 640",
        "DW 0 320",
        "DW 0 320",
        "DE 0 0 5 2",
        "DR 0 448",
        "IB 0 25",
        "DR 0 512",
        "DR 0 576",
    ]
    .join("\n")
}

/// Config with a single core and the tiny geometry.
fn base_config() -> Config {
    let mut config = common::tiny_config();
    config.trace.l1_trace = Some("workload.trace".into());
    config
}

/// Runs a config over a trace text and returns the driver.
fn run_text(config: &Config, text: &str) -> Driver {
    let mut driver = Driver::new(config).unwrap();
    driver.run(TraceReader::new(Cursor::new(text.to_string()))).unwrap();
    driver
}

// ══════════════════════════════════════════════════════════
// 1. Round trip
// ══════════════════════════════════════════════════════════

/// Upper-level statistics from an in-line run and from a log-and-replay run
/// are identical.
#[test]
fn replay_reproduces_upper_level_stats() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("l2.trace");

    // Run A: full hierarchy, no logger.
    let inline = run_text(&base_config(), &workload());

    // Run B: leaves log and are severed from the upper levels.
    let mut log_config = base_config();
    log_config.trace.l2_trace_out = Some(log_path.clone());
    let _ = run_text(&log_config, &workload());

    // Run C: replay the log against the upper levels only.
    let mut replay_config = common::tiny_config();
    replay_config.trace.l1_trace = None;
    replay_config.trace.l2_trace = Some(log_path.clone());
    let mut replay = Driver::new(&replay_config).unwrap();
    replay.run(TraceReader::open(&log_path).unwrap()).unwrap();

    let a = inline.hierarchy();
    let c = replay.hierarchy();

    // Mid level: everything except child accounting (the replay has no
    // children feeding it).
    let (am, cm) = (&a.cache(a.mid_index()).stats, &c.cache(c.mid_index()).stats);
    assert_eq!(am.hits, cm.hits);
    assert_eq!(am.misses, cm.misses);
    assert_eq!(am.writebacks, cm.writebacks);
    assert_eq!(am.clean_evictions, cm.clean_evictions);
    assert_eq!(am.instructions, cm.instructions);

    // Root level: bit-identical, child accounting included.
    assert_eq!(
        a.cache(a.root_index()).stats,
        c.cache(c.root_index()).stats
    );
}

// ══════════════════════════════════════════════════════════
// 2. Log shape
// ══════════════════════════════════════════════════════════

/// The log opens with an instruction bundle, contains only known record
/// types, and carries line-aligned eviction addresses.
#[test]
fn log_is_well_formed() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("l2.trace");

    let mut config = base_config();
    config.trace.l2_trace_out = Some(log_path.clone());
    let _ = run_text(&config, &workload());

    let text = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(!lines.is_empty());
    assert!(lines[0].starts_with("IB "), "log must open with a bundle");

    let mut bundled = 0u64;
    for line in &lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields[0] {
            "IB" => bundled += fields[2].parse::<u64>().unwrap(),
            "IM" | "DR" | "DW" => {
                let addr: u64 = fields[2].parse().unwrap();
                assert_eq!(addr % 64, 0, "miss addresses are line-aligned");
            }
            "IE" | "DE" => {
                let addr: u64 = fields[2].parse().unwrap();
                assert_eq!(addr % 64, 0, "eviction addresses are line-aligned");
            }
            other => panic!("unexpected record type {other:?}"),
        }
    }
    // Every retired instruction was flushed (the workload ends on a miss).
    assert_eq!(bundled, 175);
}

/// The logged stream parses cleanly with the trace reader.
#[test]
fn log_parses_with_trace_reader() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("l2.trace");

    let mut config = base_config();
    config.trace.l2_trace_out = Some(log_path.clone());
    let _ = run_text(&config, &workload());

    let records: Result<Vec<_>, _> = TraceReader::open(&log_path).unwrap().collect();
    assert!(!records.unwrap().is_empty());
}
