//! Event loop consuming trace records and driving the hierarchy.
//!
//! The driver reads records one at a time and performs exactly one hierarchy
//! operation per record; there is no internal concurrency. It enforces the
//! warmup boundary (one statistics reset when the configured instruction or
//! miss-record count is first exceeded) and the simulation limit (clean stop
//! once the measured region reaches the configured count).

use std::io::BufRead;

use tracing::{debug, info};

use crate::config::{Config, LimitConfig};
use crate::error::SimResult;
use crate::hierarchy::Hierarchy;
use crate::trace::{TraceRecord, TraceReader};

/// Interval between progress events, in trace lines.
const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Totals accumulated over one run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunSummary {
    /// Trace lines consumed.
    pub lines: u64,
    /// Instructions retired (sum of `IB` counts).
    pub instructions: u64,
    /// Instruction-miss records consumed.
    pub instr_misses: u64,
    /// Data-miss records (reads and writes) consumed.
    pub data_misses: u64,
}

impl RunSummary {
    /// Miss records consumed (`IM` + `DR` + `DW`).
    fn miss_records(&self) -> u64 {
        self.instr_misses + self.data_misses
    }
}

/// Top-level event driver; owns the hierarchy and enforces limits.
#[derive(Debug)]
pub struct Driver {
    hierarchy: Hierarchy,
    limits: LimitConfig,
    totals: RunSummary,
    /// Warmup boundary passed (or never configured).
    warmed: bool,
    /// Totals snapshot at the warmup boundary; limits measure from here.
    warmup_mark: RunSummary,
}

impl Driver {
    /// Builds the hierarchy for `config` and prepares a driver around it.
    ///
    /// # Errors
    ///
    /// Propagates configuration and output-trace errors from
    /// [`Hierarchy::new`].
    pub fn new(config: &Config) -> SimResult<Self> {
        let hierarchy = Hierarchy::new(config)?;
        let limits = config.limits.clone();
        let warmed = limits.warmup_insts.is_none() && limits.warmup_misses.is_none();
        Ok(Self {
            hierarchy,
            limits,
            totals: RunSummary::default(),
            warmed,
            warmup_mark: RunSummary::default(),
        })
    }

    /// Consumes the trace to completion (or to the simulation limit).
    ///
    /// # Errors
    ///
    /// Fatal on the first trace format, trace I/O, or log output error.
    pub fn run<R: BufRead>(&mut self, reader: TraceReader<R>) -> SimResult<RunSummary> {
        for record in reader {
            let record = record?;
            if !self.warmed && self.past_warmup() {
                self.warmed = true;
                self.warmup_mark = self.totals;
                self.hierarchy.reset_stats();
            }
            if self.limit_reached() {
                info!(lines = self.totals.lines, "simulation limit reached");
                break;
            }
            self.totals.lines += 1;
            self.consume(&record)?;
            if self.totals.lines % PROGRESS_INTERVAL == 0 {
                debug!(
                    lines = self.totals.lines,
                    instructions = self.totals.instructions,
                    "progress"
                );
            }
        }
        self.hierarchy.finish()?;
        Ok(self.totals)
    }

    /// Updates the totals and hands the record to the hierarchy.
    fn consume(&mut self, record: &TraceRecord) -> SimResult<()> {
        match *record {
            TraceRecord::InstrBundle { count, .. } => self.totals.instructions += count,
            TraceRecord::InstrMiss { .. } => self.totals.instr_misses += 1,
            TraceRecord::DataRead { .. } | TraceRecord::DataWrite { .. } => {
                self.totals.data_misses += 1;
            }
            TraceRecord::InstrEvict { .. } | TraceRecord::DataEvict { .. } => {}
        }
        self.hierarchy.dispatch(record, self.totals.lines)
    }

    /// Whether the configured warmup boundary has been passed.
    fn past_warmup(&self) -> bool {
        let insts = self
            .limits
            .warmup_insts
            .is_some_and(|w| self.totals.instructions > w);
        let misses = self
            .limits
            .warmup_misses
            .is_some_and(|w| self.totals.miss_records() > w);
        insts || misses
    }

    /// Whether the measured region has reached a simulation limit.
    fn limit_reached(&self) -> bool {
        if !self.warmed {
            return false;
        }
        let insts = self.limits.sim_insts.is_some_and(|limit| {
            self.totals.instructions - self.warmup_mark.instructions >= limit
        });
        let misses = self.limits.sim_misses.is_some_and(|limit| {
            self.totals.miss_records() - self.warmup_mark.miss_records() >= limit
        });
        insts || misses
    }

    /// Borrows the hierarchy, e.g. for report printing.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }
}
