//! Trace record model, parser, and reader.
//!
//! The input is a line-oriented text stream of L1-miss events. The first
//! whitespace-separated token of each line is the record type; the remaining
//! tokens are decimal fields:
//!
//! | Prefix | Fields                  | Meaning                               |
//! |--------|-------------------------|---------------------------------------|
//! | `IB`   | core, count             | instructions retired at `core`        |
//! | `IM`   | core, addr              | L1-I miss                             |
//! | `IE`   | core, addr, rd, wr      | L1-I line eviction with use counts    |
//! | `DR`   | core, addr              | L1-D read miss                        |
//! | `DW`   | core, addr              | L1-D write miss                       |
//! | `DE`   | core, addr, rd, wr      | L1-D line eviction with use counts    |
//!
//! Any other prefix, and any record with missing or non-numeric fields, is a
//! fatal format error carrying the offending line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::TraceError;

/// One parsed trace record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceRecord {
    /// `count` instructions retired at `core` since the last event.
    InstrBundle {
        /// Originating core.
        core: usize,
        /// Number of instructions retired.
        count: u64,
    },
    /// L1 instruction miss at `addr`.
    InstrMiss {
        /// Originating core.
        core: usize,
        /// Byte address of the miss.
        addr: u64,
    },
    /// L1 instruction line eviction with per-residency use counts.
    InstrEvict {
        /// Originating core.
        core: usize,
        /// Line-aligned byte address.
        addr: u64,
        /// Reads of the line while resident.
        rdcount: u32,
        /// Writes of the line while resident.
        wrcount: u32,
    },
    /// L1 data read miss at `addr`.
    DataRead {
        /// Originating core.
        core: usize,
        /// Byte address of the miss.
        addr: u64,
    },
    /// L1 data write miss at `addr`.
    DataWrite {
        /// Originating core.
        core: usize,
        /// Byte address of the miss.
        addr: u64,
    },
    /// L1 data line eviction with per-residency use counts.
    DataEvict {
        /// Originating core.
        core: usize,
        /// Line-aligned byte address.
        addr: u64,
        /// Reads of the line while resident.
        rdcount: u32,
        /// Writes of the line while resident.
        wrcount: u32,
    },
}

impl TraceRecord {
    /// Parses one trace line.
    ///
    /// # Arguments
    ///
    /// * `line` - The raw line text.
    /// * `line_no` - 1-based line number, for error context.
    ///
    /// # Errors
    ///
    /// [`TraceError::UnknownRecord`] for an unrecognized prefix;
    /// [`TraceError::MalformedRecord`] for missing or non-numeric fields.
    pub fn parse(line: &str, line_no: u64) -> Result<Self, TraceError> {
        let mut fields = line.split_whitespace();
        let malformed = || TraceError::MalformedRecord {
            line_no,
            line: line.to_string(),
        };
        let prefix = fields.next().ok_or_else(malformed)?;

        fn num<T: FromStr>(
            fields: &mut std::str::SplitWhitespace<'_>,
            err: impl Fn() -> TraceError + Copy,
        ) -> Result<T, TraceError> {
            fields.next().ok_or_else(err)?.parse().map_err(|_| err())
        }

        let record = match prefix {
            "IB" => Self::InstrBundle {
                core: num(&mut fields, malformed)?,
                count: num(&mut fields, malformed)?,
            },
            "IM" => Self::InstrMiss {
                core: num(&mut fields, malformed)?,
                addr: num(&mut fields, malformed)?,
            },
            "IE" => Self::InstrEvict {
                core: num(&mut fields, malformed)?,
                addr: num(&mut fields, malformed)?,
                rdcount: num(&mut fields, malformed)?,
                wrcount: num(&mut fields, malformed)?,
            },
            "DR" => Self::DataRead {
                core: num(&mut fields, malformed)?,
                addr: num(&mut fields, malformed)?,
            },
            "DW" => Self::DataWrite {
                core: num(&mut fields, malformed)?,
                addr: num(&mut fields, malformed)?,
            },
            "DE" => Self::DataEvict {
                core: num(&mut fields, malformed)?,
                addr: num(&mut fields, malformed)?,
                rdcount: num(&mut fields, malformed)?,
                wrcount: num(&mut fields, malformed)?,
            },
            _ => {
                return Err(TraceError::UnknownRecord {
                    line_no,
                    line: line.to_string(),
                });
            }
        };
        Ok(record)
    }

    /// The core the record originates from.
    pub fn core(&self) -> usize {
        match *self {
            Self::InstrBundle { core, .. }
            | Self::InstrMiss { core, .. }
            | Self::InstrEvict { core, .. }
            | Self::DataRead { core, .. }
            | Self::DataWrite { core, .. }
            | Self::DataEvict { core, .. } => core,
        }
    }
}

/// Streaming reader turning a [`BufRead`] into trace records.
///
/// Blank lines are skipped; every other line must parse. Iteration yields
/// `Err` once on the first format or I/O error, which is fatal to the run.
#[derive(Debug)]
pub struct TraceReader<R> {
    input: R,
    line_no: u64,
    buf: String,
}

impl TraceReader<BufReader<File>> {
    /// Opens a trace file for reading.
    ///
    /// # Errors
    ///
    /// Returns a [`TraceError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> TraceReader<R> {
    /// Wraps a buffered reader.
    pub fn new(input: R) -> Self {
        Self {
            input,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.input.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    if self.buf.trim().is_empty() {
                        continue;
                    }
                    return Some(TraceRecord::parse(&self.buf, self.line_no));
                }
                Err(e) => return Some(Err(TraceError::Io(e))),
            }
        }
    }
}
