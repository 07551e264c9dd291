//! Cache hierarchy simulator CLI.
//!
//! This binary wires the option surface to the core library. It performs:
//! 1. **Config assembly:** Either from a JSON config file (`--config`) or
//!    from individual flags; trace paths on the command line always win.
//! 2. **Run:** Streams the input trace through the hierarchy with warmup and
//!    simulation limits applied.
//! 3. **Report:** Prints per-level statistics and run totals.
//!
//! Exit codes: 0 on success, 1 on configuration, trace, or I/O errors.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use cachesim_core::Driver;
use cachesim_core::config::{Config, InsertionKind, ReplacementKind};
use cachesim_core::trace::TraceReader;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Trace-driven multi-level cache hierarchy simulator",
    long_about = "Drive a configurable L2/L3/L4 hierarchy from an L1-miss trace.\n\n\
        The trace is line-oriented text (IB/IM/IE/DR/DW/DE records). Supply either\n\
        --l1-trace (full hierarchy) or --l2-trace (a previously logged L2-miss\n\
        trace; the leaves are skipped and records feed the shared L3 directly).\n\n\
        Examples:\n  \
        cachesim --l1-trace run.trace\n  \
        cachesim --l1-trace run.trace --l3-insert bloom_65536 --l4-evict-write 8\n  \
        cachesim --l1-trace run.trace --l2-trace-out l2.trace\n  \
        cachesim --l2-trace l2.trace --l3-size 33554432"
)]
struct Cli {
    /// JSON config file; flags for trace paths still apply on top.
    #[arg(long)]
    config: Option<PathBuf>,

    /// L1-miss input trace (drives the full hierarchy).
    #[arg(long)]
    l1_trace: Option<PathBuf>,

    /// L2-miss input trace (skips the leaves).
    #[arg(long)]
    l2_trace: Option<PathBuf>,

    /// Output path for the derived L2-miss trace (severs the leaf parents).
    #[arg(long)]
    l2_trace_out: Option<PathBuf>,

    /// Number of cores (one private L2 each).
    #[arg(long)]
    cores: Option<usize>,

    /// Line size in bytes (power of two, >= 4).
    #[arg(long)]
    line_size: Option<usize>,

    /// L2 capacity in bytes (power of two).
    #[arg(long)]
    l2_size: Option<usize>,
    /// L2 associativity (power of two).
    #[arg(long)]
    l2_assoc: Option<usize>,
    /// L2 replacement policy: LRU, LFU, or FIFO.
    #[arg(long)]
    l2_replace: Option<String>,
    /// L2 insertion policy (implies non-inclusive mode): all, none, inst,
    /// read_T, write_T, rand_P, bloom_S, bloom_clean_S.
    #[arg(long)]
    l2_insert: Option<String>,
    /// L2 non-inclusive mode without overriding the insertion policy.
    #[arg(long)]
    l2_noninc: bool,
    /// Evict an L2 block once its residency write count exceeds K (0 = off).
    #[arg(long, value_name = "K")]
    l2_evict_write: Option<u32>,

    /// L3 capacity in bytes (power of two).
    #[arg(long)]
    l3_size: Option<usize>,
    /// L3 associativity (power of two).
    #[arg(long)]
    l3_assoc: Option<usize>,
    /// L3 replacement policy: LRU, LFU, or FIFO.
    #[arg(long)]
    l3_replace: Option<String>,
    /// L3 insertion policy (implies non-inclusive mode).
    #[arg(long)]
    l3_insert: Option<String>,
    /// L3 non-inclusive mode without overriding the insertion policy.
    #[arg(long)]
    l3_noninc: bool,
    /// Evict an L3 block once its residency write count exceeds K (0 = off).
    #[arg(long, value_name = "K")]
    l3_evict_write: Option<u32>,

    /// L4 capacity in bytes (power of two).
    #[arg(long)]
    l4_size: Option<usize>,
    /// L4 associativity (power of two).
    #[arg(long)]
    l4_assoc: Option<usize>,
    /// L4 replacement policy: LRU, LFU, or FIFO.
    #[arg(long)]
    l4_replace: Option<String>,
    /// L4 insertion policy (implies non-inclusive mode).
    #[arg(long)]
    l4_insert: Option<String>,
    /// L4 non-inclusive mode without overriding the insertion policy.
    #[arg(long)]
    l4_noninc: bool,
    /// Evict an L4 block once its residency write count exceeds K (0 = off).
    #[arg(long, value_name = "K")]
    l4_evict_write: Option<u32>,

    /// Reset statistics after this many retired instructions.
    #[arg(long)]
    warmup_insts: Option<u64>,
    /// Stop after this many retired instructions past warmup.
    #[arg(long)]
    sim_insts: Option<u64>,
    /// Reset statistics after this many miss records.
    #[arg(long)]
    warmup_misses: Option<u64>,
    /// Stop after this many miss records past warmup.
    #[arg(long)]
    sim_misses: Option<u64>,

    /// Seed for the policy-level random generators.
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("Error: {msg}");
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: configuration error: {e}");
        process::exit(1);
    }

    print_banner(&config);

    if let Err(e) = run(&config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Assembles the configuration from the config file and/or flags.
fn build_config(cli: &Cli) -> Result<Config, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("reading config {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("parsing config {}: {e}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(cores) = cli.cores {
        config.cores = cores;
    }
    if let Some(line_size) = cli.line_size {
        config.line_size = line_size;
    }

    let levels = [
        (
            &mut config.l2,
            cli.l2_size,
            cli.l2_assoc,
            &cli.l2_replace,
            &cli.l2_insert,
            cli.l2_noninc,
            cli.l2_evict_write,
        ),
        (
            &mut config.l3,
            cli.l3_size,
            cli.l3_assoc,
            &cli.l3_replace,
            &cli.l3_insert,
            cli.l3_noninc,
            cli.l3_evict_write,
        ),
        (
            &mut config.l4,
            cli.l4_size,
            cli.l4_assoc,
            &cli.l4_replace,
            &cli.l4_insert,
            cli.l4_noninc,
            cli.l4_evict_write,
        ),
    ];
    for (level, size, assoc, replace, insert, noninc, evict_write) in levels {
        if let Some(size) = size {
            level.size_bytes = size;
        }
        if let Some(assoc) = assoc {
            level.assoc = assoc;
        }
        if let Some(name) = replace {
            level.replacement = name.parse::<ReplacementKind>().map_err(|e| e.to_string())?;
        }
        if let Some(name) = insert {
            level.insertion = Some(name.parse::<InsertionKind>().map_err(|e| e.to_string())?);
        }
        if noninc {
            level.non_inclusive = true;
        }
        if let Some(k) = evict_write {
            level.evict_after_n_writes = k;
        }
    }

    if cli.l1_trace.is_some() {
        config.trace.l1_trace.clone_from(&cli.l1_trace);
    }
    if cli.l2_trace.is_some() {
        config.trace.l2_trace.clone_from(&cli.l2_trace);
    }
    if cli.l2_trace_out.is_some() {
        config.trace.l2_trace_out.clone_from(&cli.l2_trace_out);
    }

    if let Some(v) = cli.warmup_insts {
        config.limits.warmup_insts = Some(v);
    }
    if let Some(v) = cli.sim_insts {
        config.limits.sim_insts = Some(v);
    }
    if let Some(v) = cli.warmup_misses {
        config.limits.warmup_misses = Some(v);
    }
    if let Some(v) = cli.sim_misses {
        config.limits.sim_misses = Some(v);
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    Ok(config)
}

/// Prints the configuration summary before the run.
fn print_banner(config: &Config) {
    println!(
        "Cores: {}  Line size: {} B  Seed: {:#x}",
        config.cores, config.line_size, config.seed
    );
    for (name, level) in [("L2", &config.l2), ("L3", &config.l3), ("L4", &config.l4)] {
        println!(
            "{name}: {} KiB, {}-way, {:?}{}{}",
            level.size_bytes / 1024,
            level.assoc,
            level.replacement,
            if level.alloc_on_evict() {
                ", non-inclusive"
            } else {
                ""
            },
            if level.evict_after_n_writes > 0 {
                format!(", evict-after-{}-writes", level.evict_after_n_writes)
            } else {
                String::new()
            }
        );
    }
    println!();
}

/// Streams the trace through the hierarchy and prints the report.
fn run(config: &Config) -> Result<(), String> {
    let input = config
        .trace
        .l2_trace
        .as_ref()
        .or(config.trace.l1_trace.as_ref())
        .ok_or("no input trace")?;

    let reader = TraceReader::open(input).map_err(|e| e.to_string())?;
    let mut driver = Driver::new(config).map_err(|e| e.to_string())?;
    let summary = driver.run(reader).map_err(|e| e.to_string())?;

    println!(
        "Done: {} lines, {} instructions, {} i-miss, {} d-miss records.",
        summary.lines, summary.instructions, summary.instr_misses, summary.data_misses
    );
    println!();
    driver.hierarchy().print_report();
    Ok(())
}
