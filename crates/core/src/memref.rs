//! Memory reference model fed through the hierarchy.
//!
//! A leaf cache receives demand references promoted from trace records; caches
//! talk to their parents with the same structure, extended with the per-line
//! use counters that travel alongside an evicted line.

/// Whether a reference reads or writes its target line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Data or instruction fetch.
    Read,
    /// Data write (and dirty-eviction propagation).
    Write,
}

impl AccessKind {
    /// Returns `true` for write-typed references.
    #[inline]
    pub fn is_write(self) -> bool {
        self == Self::Write
    }
}

/// An extended memory reference.
///
/// Demand accesses carry `is_evict = false` and a single implied use count
/// (`rdcount = 1` or `wrcount = 1` depending on [`AccessKind`]). Eviction
/// propagations carry `is_evict = true` together with the evicted line's
/// accumulated read/write counts; a dirty eviction (`wrcount > 0`) is a
/// writeback and travels as a write.
#[derive(Clone, Debug)]
pub struct ExtMemRef {
    /// Read or write.
    pub kind: AccessKind,
    /// Byte address of the first byte touched.
    pub addr: u64,
    /// Number of bytes touched; may straddle line boundaries.
    pub size: u64,
    /// Core the reference originated from.
    pub core: usize,
    /// The line has carried instruction bytes.
    pub is_inst: bool,
    /// This reference is an eviction propagated from a lower level.
    pub is_evict: bool,
    /// Reads of the line at the originating level.
    pub rdcount: u32,
    /// Writes of the line at the originating level.
    pub wrcount: u32,
}

impl ExtMemRef {
    /// A demand data read of one byte at `addr` from `core`.
    pub fn data_read(core: usize, addr: u64) -> Self {
        Self {
            kind: AccessKind::Read,
            addr,
            size: 1,
            core,
            is_inst: false,
            is_evict: false,
            rdcount: 1,
            wrcount: 0,
        }
    }

    /// A demand data write of one byte at `addr` from `core`.
    pub fn data_write(core: usize, addr: u64) -> Self {
        Self {
            kind: AccessKind::Write,
            addr,
            size: 1,
            core,
            is_inst: false,
            is_evict: false,
            rdcount: 0,
            wrcount: 1,
        }
    }

    /// A demand instruction fetch of one byte at `addr` from `core`.
    pub fn instr_fetch(core: usize, addr: u64) -> Self {
        Self {
            is_inst: true,
            ..Self::data_read(core, addr)
        }
    }

    /// An eviction propagation for the line at `addr` with its use counters.
    ///
    /// A dirty line (`wrcount > 0`) travels as a write so the level above
    /// absorbs the writeback; a clean line travels as a read. This matches
    /// how replayed `DE` records are fed, keeping logged and in-line streams
    /// indistinguishable.
    pub fn evicted_line(core: usize, addr: u64, rdcount: u32, wrcount: u32, is_inst: bool) -> Self {
        let kind = if wrcount > 0 {
            AccessKind::Write
        } else {
            AccessKind::Read
        };
        Self {
            kind,
            addr,
            size: 1,
            core,
            is_inst,
            is_evict: true,
            rdcount,
            wrcount,
        }
    }
}
