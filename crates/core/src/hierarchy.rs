//! Cache hierarchy: arena of caches, request pipeline, eviction routine.
//!
//! The hierarchy owns every cache level in a flat arena; parent links are
//! arena indices, so recursive parent requests never alias (the tree points
//! strictly toward the root). The standard shape is private per-core leaves
//! (`L2#c`) sharing a mid level (`L3`) which feeds the root (`L4`); the
//! request pipeline itself is depth-agnostic and follows whatever links the
//! builder laid down.
//!
//! The simulator is single-threaded: exactly one request is in flight at a
//! time, so shared mid/root levels need no locking.

use tracing::{debug, info};

use crate::cache::{Cache, TAG_INVALID};
use crate::config::Config;
use crate::error::{SimResult, TraceError};
use crate::logger::MissLogger;
use crate::memref::ExtMemRef;
use crate::trace::TraceRecord;

/// Arena index of the root (last-level) cache.
const ROOT: usize = 0;

/// Arena index of the shared mid-level cache.
const MID: usize = 1;

/// The cache hierarchy.
#[derive(Debug)]
pub struct Hierarchy {
    /// All cache levels; parents at lower indices than children.
    caches: Vec<Cache>,
    /// Dispatch target per core.
    leaves: Vec<usize>,
    /// Derived-trace writer shared by the logging leaves.
    logger: Option<MissLogger>,
}

impl Hierarchy {
    /// Builds the hierarchy described by `config`.
    ///
    /// Root and mid are always built. With an L1 input trace, one leaf is
    /// built per core; with an L2 input trace the leaves are skipped and
    /// every core dispatches straight to the mid level. Configuring an
    /// output trace attaches the miss logger to the leaves and severs their
    /// parent link, so the logged stream is the complete record of what the
    /// upper levels would have seen.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for bad geometry, or an I/O error if
    /// the output trace cannot be created.
    pub fn new(config: &Config) -> SimResult<Self> {
        config.validate()?;

        let mut caches = Vec::with_capacity(config.cores + 2);
        caches.push(Cache::new(
            "L4",
            &config.l4,
            config.line_size,
            0,
            None,
            config.seed,
        )?);
        caches.push(Cache::new(
            "L3",
            &config.l3,
            config.line_size,
            0,
            Some(ROOT),
            config.seed,
        )?);

        let replay = config.trace.l2_trace.is_some();
        let leaves = if replay {
            vec![MID; config.cores]
        } else {
            let mut leaves = Vec::with_capacity(config.cores);
            for core in 0..config.cores {
                let idx = caches.len();
                caches.push(Cache::new(
                    format!("L2#{core}"),
                    &config.l2,
                    config.line_size,
                    core,
                    Some(MID),
                    config.seed,
                )?);
                leaves.push(idx);
            }
            leaves
        };

        let logger = match &config.trace.l2_trace_out {
            Some(path) if !replay => {
                info!(path = %path.display(), "attaching miss logger; severing leaf parents");
                for &leaf in &leaves {
                    caches[leaf].log_misses = true;
                    caches[leaf].parent = None;
                }
                Some(MissLogger::create(path)?)
            }
            _ => None,
        };

        for cache in &caches {
            debug!(
                name = %cache.name,
                sets = cache.num_sets(),
                assoc = cache.assoc(),
                alloc_on_evict = cache.alloc_on_evict,
                "created cache level"
            );
        }

        Ok(Self {
            caches,
            leaves,
            logger,
        })
    }

    /// Drives one request through the cache at `idx`.
    ///
    /// Handles arbitrary `size` by splitting the reference at line
    /// boundaries; every straddled line is processed independently for
    /// statistics. Parent recursion for a missed line completes before the
    /// local allocation for that line.
    ///
    /// # Errors
    ///
    /// Only the derived-trace writer can fail; its I/O errors are fatal.
    pub fn request(&mut self, idx: usize, input: &ExtMemRef) -> SimResult<()> {
        debug_assert!(input.size >= 1, "zero-sized reference");
        {
            let c = &self.caches[idx];
            // A clean eviction carries no writeback; a cache that allocates
            // on its own misses has nothing to do with it.
            if !c.alloc_on_evict && input.is_evict && input.wrcount == 0 {
                return Ok(());
            }
            assert!(
                !(c.is_icache && input.kind.is_write()),
                "{}: write-typed request routed to an instruction cache",
                c.name
            );
        }

        if self.try_fast_hit(idx, input) {
            return Ok(());
        }
        if input.is_evict || input.kind.is_write() {
            self.caches[idx].last_hit = None;
        }

        let line_bits = self.caches[idx].line_bits;
        let final_addr = input.addr + input.size - 1;
        let final_tag = final_addr >> line_bits;
        let first_tag = input.addr >> line_bits;

        let mut m = input.clone();
        for tag in first_tag..=final_tag {
            if tag < final_tag {
                // Trim to the straddled portion of this line.
                m.size = ((tag + 1) << line_bits) - m.addr;
            }
            match self.caches[idx].lookup(self.caches[idx].set_of(tag), tag) {
                Some(way) => self.hit_line(idx, tag, way, &m)?,
                None => self.miss_line(idx, tag, &m)?,
            }
            if tag < final_tag {
                let next_addr = (tag + 1) << line_bits;
                m.addr = next_addr;
                m.size = final_addr - next_addr + 1;
            }
        }
        Ok(())
    }

    /// Single-entry memo check for single-line demand reads.
    ///
    /// Returns `true` when the reference was fully serviced as a hit.
    fn try_fast_hit(&mut self, idx: usize, input: &ExtMemRef) -> bool {
        if input.is_evict || input.kind.is_write() {
            return false;
        }
        let (tag, way, set, parent) = {
            let c = &self.caches[idx];
            let Some((tag, way)) = c.last_hit else {
                return false;
            };
            if input.addr >> c.line_bits != tag
                || (input.addr + input.size - 1) >> c.line_bits != tag
            {
                return false;
            }
            (tag, way, c.set_of(tag), c.parent)
        };
        let c = &mut self.caches[idx];
        assert_eq!(
            c.block(set, way).tag,
            tag,
            "{}: stale hit memo for tag {tag:#x}",
            c.name
        );
        c.repl.on_access(set, way);
        let b = c.block_mut(set, way);
        b.rdcount = b.rdcount.saturating_add(1);
        b.ever_inst |= input.is_inst;
        c.stats.access(true);
        if let Some(p) = parent {
            self.caches[p].stats.child_access(true);
        }
        true
    }

    /// Hit path for one line.
    fn hit_line(&mut self, idx: usize, tag: u64, way: usize, m: &ExtMemRef) -> SimResult<()> {
        let set = self.caches[idx].set_of(tag);
        let force_evict = {
            let c = &mut self.caches[idx];
            c.repl.on_access(set, way);
            let threshold = c.evict_after_n_writes;
            let mut wrote = false;
            let b = c.block_mut(set, way);
            if m.is_evict {
                b.rdcount = b.rdcount.saturating_add(m.rdcount);
                b.wrcount = b.wrcount.saturating_add(m.wrcount);
                b.ever_inst |= m.is_inst;
                if m.wrcount > 0 {
                    // Absorb the writeback: the line's cells are rewritten.
                    b.dirty = true;
                    b.wearout += 1;
                    wrote = true;
                }
            } else if m.kind.is_write() {
                b.dirty = true;
                b.wrcount = b.wrcount.saturating_add(1);
                b.wearout += 1;
                wrote = true;
            } else {
                b.rdcount = b.rdcount.saturating_add(1);
                b.ever_inst |= m.is_inst;
            }
            let exhausted = threshold > 0 && wrote && b.wrcount > threshold;
            if wrote {
                c.repl.on_write(set, way);
            }
            exhausted
        };

        if !m.is_evict {
            self.caches[idx].stats.access(true);
            if let Some(p) = self.caches[idx].parent {
                self.caches[p].stats.child_access(true);
            }
        }

        if force_evict {
            // The residency's write budget is exhausted; the line leaves now.
            self.evict_way(idx, set, way)?;
        } else if !m.is_evict && !m.kind.is_write() {
            self.caches[idx].last_hit = Some((tag, way));
        }
        Ok(())
    }

    /// Miss path for one line.
    fn miss_line(&mut self, idx: usize, tag: u64, m: &ExtMemRef) -> SimResult<()> {
        let parent = self.caches[idx].parent;
        let line_addr = tag << self.caches[idx].line_bits;

        if !m.is_evict {
            self.caches[idx].stats.access(false);
            // Whether or not the line is installed here, the parent services
            // the miss first. Without a parent the data comes from memory.
            if let Some(p) = parent {
                self.caches[p].stats.child_access(false);
                self.request(p, m)?;
            }
            if self.caches[idx].log_misses {
                self.log_miss(idx, line_addr, m)?;
            }
        }

        if self.caches[idx].alloc_on_evict {
            if !m.is_evict {
                // Non-inclusive: local misses (reads and writes) fetch
                // through without installing.
                return Ok(());
            }
            let c = &mut self.caches[idx];
            // Train the predictor on every line that dies below, then ask it.
            c.insert.on_evict(line_addr, m.rdcount, m.wrcount);
            if !c.insert.should_allocate(line_addr, m.rdcount, m.wrcount, m.is_inst) {
                return Ok(());
            }
            if m.wrcount == 0 {
                // A clean eviction never went through the demand path, so
                // the parent has not seen this line yet.
                if let Some(p) = parent {
                    self.request(p, m)?;
                }
            }
        }

        let set = self.caches[idx].set_of(tag);
        let way = self.victim_way(idx, set);
        self.evict_way(idx, set, way)?;

        let c = &mut self.caches[idx];
        let b = c.block_mut(set, way);
        b.tag = tag;
        b.rdcount = m.rdcount;
        b.wrcount = m.wrcount;
        b.ever_inst = m.is_inst;
        b.dirty = false;
        // Installation writes the cells once.
        b.wearout += 1;
        c.repl.on_install(set, way);
        Ok(())
    }

    /// Picks the way a new line will occupy: any empty way first, otherwise
    /// the replacement policy's victim.
    fn victim_way(&mut self, idx: usize, set: usize) -> usize {
        let c = &mut self.caches[idx];
        for way in 0..c.assoc {
            if !c.block(set, way).is_valid() {
                return way;
            }
        }
        c.repl.pick_victim(set)
    }

    /// Evicts the block at `(set, way)`.
    ///
    /// A valid block's eviction is propagated to the parent unconditionally
    /// (so a non-inclusive parent can learn about dead lines and allocate),
    /// trains the local insertion policy, is logged, and is charged to the
    /// statistics as a writeback or a clean eviction. An empty way is simply
    /// reclaimed.
    fn evict_way(&mut self, idx: usize, set: usize, way: usize) -> SimResult<()> {
        self.caches[idx].last_hit = None;

        let (tag, rd, wr, inst, dirty, parent, line_bits, core, log_evicts, icache) = {
            let c = &self.caches[idx];
            let b = c.block(set, way);
            (
                b.tag,
                b.rdcount,
                b.wrcount,
                b.ever_inst,
                b.dirty,
                c.parent,
                c.line_bits,
                c.core,
                c.log_misses,
                c.is_icache,
            )
        };

        if tag != TAG_INVALID {
            let addr = tag << line_bits;
            let msg = ExtMemRef::evicted_line(core, addr, rd, wr, inst);
            if let Some(p) = parent {
                self.request(p, &msg)?;
            }
            self.caches[idx].insert.on_evict(addr, rd, wr);
            if log_evicts {
                if let Some(log) = self.logger.as_mut() {
                    if icache || inst {
                        log.instr_evict(core, addr, rd, wr)?;
                    } else {
                        log.data_evict(core, addr, rd, wr)?;
                    }
                }
            }
            self.caches[idx].stats.evict(!dirty);
        }

        let c = &mut self.caches[idx];
        c.block_mut(set, way).reset();
        c.repl.on_invalidate(set, way);
        Ok(())
    }

    /// Writes the batched `IB` record and the miss record for a logged
    /// demand miss.
    fn log_miss(&mut self, idx: usize, line_addr: u64, m: &ExtMemRef) -> SimResult<()> {
        let c = &mut self.caches[idx];
        let core = c.core;
        let recent = c.recent_instructions;
        c.recent_instructions = 0;
        let icache = c.is_icache;
        if let Some(log) = self.logger.as_mut() {
            log.instr_bundle(core, recent)?;
            if icache || m.is_inst {
                log.instr_miss(core, line_addr)?;
            } else {
                log.data_miss(core, line_addr, m.kind.is_write())?;
            }
        }
        Ok(())
    }

    /// Dispatches one trace record.
    ///
    /// `IB` registers instructions along the core's chain; `IM`/`DR`/`DW`
    /// become demand references to the core's leaf; `DE` with a non-zero
    /// write count becomes an eviction propagation; clean `DE`s and `IE`s
    /// carry nothing the hierarchy reacts to and are dropped.
    ///
    /// # Errors
    ///
    /// A record naming a core outside the configured range is a fatal trace
    /// error; derived-trace I/O errors propagate.
    pub fn dispatch(&mut self, record: &TraceRecord, line_no: u64) -> SimResult<()> {
        let core = record.core();
        if core >= self.leaves.len() {
            return Err(TraceError::CoreOutOfRange {
                line_no,
                core,
                cores: self.leaves.len(),
            }
            .into());
        }
        let leaf = self.leaves[core];
        match *record {
            TraceRecord::InstrBundle { core, count } => {
                self.reg_inst(core, count);
                Ok(())
            }
            TraceRecord::InstrMiss { core, addr } => {
                self.request(leaf, &ExtMemRef::instr_fetch(core, addr))
            }
            TraceRecord::DataRead { core, addr } => {
                self.request(leaf, &ExtMemRef::data_read(core, addr))
            }
            TraceRecord::DataWrite { core, addr } => {
                self.request(leaf, &ExtMemRef::data_write(core, addr))
            }
            TraceRecord::DataEvict {
                core,
                addr,
                rdcount,
                wrcount,
            } if wrcount > 0 => self.request(
                leaf,
                &ExtMemRef::evicted_line(core, addr, rdcount, wrcount, false),
            ),
            // Clean data evictions and instruction evictions carry no
            // writeback and do not drive allocation at the leaf.
            TraceRecord::DataEvict { .. } | TraceRecord::InstrEvict { .. } => Ok(()),
        }
    }

    /// Registers `count` retired instructions at `core`.
    ///
    /// The count lands in the statistics of the core's leaf and every
    /// ancestor, and in the leaf's batching counter for the miss logger.
    pub fn reg_inst(&mut self, core: usize, count: u64) {
        let leaf = self.leaves[core];
        self.caches[leaf].recent_instructions += count;
        let mut idx = Some(leaf);
        while let Some(i) = idx {
            self.caches[i].stats.reg_inst(count);
            idx = self.caches[i].parent;
        }
    }

    /// Zeros every cache's statistics and wear counters.
    ///
    /// Called once at the warmup boundary so that reported numbers cover the
    /// measured region only.
    pub fn reset_stats(&mut self) {
        debug!("warmup boundary: resetting statistics and wear counters");
        for cache in &mut self.caches {
            cache.stats.reset();
            cache.reset_wearout();
        }
    }

    /// Flushes the derived-trace writer. Call once at end of run.
    ///
    /// # Errors
    ///
    /// Propagates the writer's I/O error.
    pub fn finish(&mut self) -> SimResult<()> {
        if let Some(log) = self.logger.as_mut() {
            log.flush()?;
        }
        Ok(())
    }

    /// Number of cache levels in the arena.
    pub fn num_caches(&self) -> usize {
        self.caches.len()
    }

    /// Borrows the cache at an arena index.
    pub fn cache(&self, idx: usize) -> &Cache {
        &self.caches[idx]
    }

    /// Arena index of the dispatch target for `core`.
    pub fn leaf_index(&self, core: usize) -> usize {
        self.leaves[core]
    }

    /// Arena index of the shared mid-level cache.
    pub fn mid_index(&self) -> usize {
        MID
    }

    /// Arena index of the root (last-level) cache.
    pub fn root_index(&self) -> usize {
        ROOT
    }

    /// Prints the per-level statistics report to stdout.
    pub fn print_report(&self) {
        println!("==========================================================");
        println!("CACHE HIERARCHY SIMULATION STATISTICS");
        println!("==========================================================");
        for cache in &self.caches {
            let s = &cache.stats;
            println!("{}", cache.name);
            println!("  accesses          {:>16}", s.accesses());
            println!("  hits              {:>16}", s.hits);
            println!("  misses            {:>16}", s.misses);
            println!("  miss_rate         {:>15.2}%", s.miss_rate());
            println!("  writebacks        {:>16}", s.writebacks);
            println!("  clean_evictions   {:>16}", s.clean_evictions);
            println!("  child_hits        {:>16}", s.child_hits);
            println!("  child_misses      {:>16}", s.child_misses);
            println!("  instructions      {:>16}", s.instructions);
            println!("  mpki              {:>16.4}", s.mpki());
            println!("  wear.max          {:>16}", cache.max_wearout());
            println!("  wear.mean         {:>16.4}", cache.mean_wearout());
            println!("  wear.total        {:>16}", cache.total_wearout());
            println!("----------------------------------------------------------");
        }
    }
}
