//! Derived-trace writer for miss/eviction replay.
//!
//! When attached to the leaf caches, the logger records their misses and
//! evictions in the same textual format the trace reader consumes, so the
//! upper levels can be re-simulated later without the leaves. Attachment
//! severs the leaves' parent link; the emitted stream is then the complete
//! record of everything the upper levels would have seen.
//!
//! Instruction counts are batched: before each logged miss, the instructions
//! retired since the previous flush are emitted as one `IB` record.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writer for the derived miss/eviction trace.
#[derive(Debug)]
pub struct MissLogger {
    out: BufWriter<File>,
}

impl MissLogger {
    /// Creates the output file, truncating any existing one.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    /// Emits an `IB core count` instruction bundle.
    pub fn instr_bundle(&mut self, core: usize, count: u64) -> io::Result<()> {
        writeln!(self.out, "IB {core} {count}")
    }

    /// Emits an `IM core addr` instruction miss. `addr` is line-aligned.
    pub fn instr_miss(&mut self, core: usize, addr: u64) -> io::Result<()> {
        writeln!(self.out, "IM {core} {addr}")
    }

    /// Emits an `IE core addr rd wr` instruction-line eviction.
    pub fn instr_evict(&mut self, core: usize, addr: u64, rd: u32, wr: u32) -> io::Result<()> {
        writeln!(self.out, "IE {core} {addr} {rd} {wr}")
    }

    /// Emits a `DR` or `DW` data miss. `addr` is line-aligned.
    pub fn data_miss(&mut self, core: usize, addr: u64, write: bool) -> io::Result<()> {
        if write {
            writeln!(self.out, "DW {core} {addr}")
        } else {
            writeln!(self.out, "DR {core} {addr}")
        }
    }

    /// Emits a `DE core addr rd wr` data-line eviction.
    pub fn data_evict(&mut self, core: usize, addr: u64, rd: u32, wr: u32) -> io::Result<()> {
        writeln!(self.out, "DE {core} {addr} {rd} {wr}")
    }

    /// Flushes buffered records to disk. Called on teardown.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
