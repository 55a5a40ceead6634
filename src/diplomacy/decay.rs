//! Decay engine - ages out fully decayed opinion modifiers
//!
//! Runs once per simulated month in three phases:
//!
//! 1. **Mark (parallel, read-only):** every arena slot independently
//!    computes whether it should go: it is orphaned, or its modifier's
//!    contribution at `tick` is exactly zero. No slot reads another slot's
//!    result, so any partitioning gives the same flags.
//! 2. **Compact (sequential):** one walk in arena order copies the kept
//!    slots into a fresh arena, preserving relative order.
//! 3. **Rebuild:** one pass over the compacted arena recomputes every
//!    relationship's range.
//!
//! Because phase 1 is pure and phases 2-3 are sequential, the result is
//! bit-identical for any worker count.

use rayon::prelude::*;
use serde::Serialize;

use crate::core::types::Tick;
use crate::diplomacy::modifier::ModifierEntry;
use crate::diplomacy::modifier_store::ModifierStore;

/// What a sweep did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecayReport {
    pub tick: Tick,
    /// Arena slots before the sweep, orphans included
    pub slots_before: usize,
    /// Live modifiers removed because they fully decayed
    pub decayed: usize,
    /// Orphaned slots reclaimed
    pub orphans_reclaimed: usize,
    /// Live modifiers after the sweep
    pub remaining: usize,
    /// Relationships that still own modifiers
    pub ranges: usize,
}

impl DecayReport {
    fn empty(tick: Tick) -> Self {
        Self {
            tick,
            slots_before: 0,
            decayed: 0,
            orphans_reclaimed: 0,
            remaining: 0,
            ranges: 0,
        }
    }
}

/// What phase 1 should drop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Drop orphans and fully decayed modifiers
    Decay,
    /// Drop orphans only
    ReclaimOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct DecayEngine {
    workers: usize,
}

impl Default for DecayEngine {
    fn default() -> Self {
        Self::new(rayon::current_num_threads())
    }
}

impl DecayEngine {
    /// `workers` is the number of partitions phase 1 splits the arena into
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Full monthly sweep
    pub fn run(&self, store: &mut ModifierStore, tick: Tick) -> DecayReport {
        self.sweep(store, tick, SweepMode::Decay)
    }

    pub fn sweep(&self, store: &mut ModifierStore, tick: Tick, mode: SweepMode) -> DecayReport {
        if store.is_empty() {
            return DecayReport::empty(tick);
        }

        let slots_before = store.arena_len();
        let orphans = store.orphaned();

        let flags = self.mark(store, tick, mode);
        let compacted = compact(store.entries(), &flags);
        let removed = slots_before - compacted.len();
        store.install_compacted(compacted);

        let report = DecayReport {
            tick,
            slots_before,
            decayed: removed - orphans,
            orphans_reclaimed: orphans,
            remaining: store.live_count(),
            ranges: store.ranges().len(),
        };
        tracing::debug!(
            "Decay sweep at tick {}: {} slots -> {} live ({} decayed, {} orphans reclaimed)",
            tick,
            report.slots_before,
            report.remaining,
            report.decayed,
            report.orphans_reclaimed
        );
        report
    }

    /// Phase 1: one removal flag per arena slot
    pub fn mark(&self, store: &ModifierStore, tick: Tick, mode: SweepMode) -> Vec<bool> {
        let entries = store.entries();
        let mut flags = vec![false; entries.len()];
        if entries.is_empty() {
            return flags;
        }
        let chunk_len = entries.len().div_ceil(self.workers).max(1);

        // PARALLEL: each slot's flag depends only on that slot
        flags
            .par_chunks_mut(chunk_len)
            .zip(entries.par_chunks(chunk_len))
            .enumerate()
            .for_each(|(chunk, (out, slots))| {
                let base = chunk * chunk_len;
                for (offset, (flag, entry)) in out.iter_mut().zip(slots).enumerate() {
                    *flag = should_remove(store, base + offset, entry, tick, mode);
                }
            });

        flags
    }
}

#[inline]
fn should_remove(store: &ModifierStore, index: usize, entry: &ModifierEntry, tick: Tick, mode: SweepMode) -> bool {
    if !store.is_live(index) {
        return true;
    }
    mode == SweepMode::Decay && entry.modifier.is_fully_decayed(tick)
}

/// Phase 2: keep unflagged slots in their original order
pub fn compact(entries: &[ModifierEntry], flags: &[bool]) -> Vec<ModifierEntry> {
    debug_assert_eq!(entries.len(), flags.len());
    let kept = flags.iter().filter(|&&f| !f).count();
    let mut compacted = Vec::with_capacity(kept);
    for (entry, &remove) in entries.iter().zip(flags) {
        if !remove {
            compacted.push(*entry);
        }
    }
    compacted
}
