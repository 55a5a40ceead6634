//! Cold storage: one flat, append-only arena of every opinion modifier
//!
//! Each relationship owns a contiguous [`ModifierRange`] of the arena.
//! Appending to a relationship whose block is not at the tail relocates the
//! block to the tail; the slots left behind are orphaned and stay in the
//! arena until the decay engine compacts it. A slot is live only while its
//! owner's range covers it, so ranges never overlap and never point past
//! the end of the arena.

use ahash::AHashMap;

use crate::core::types::{ModifierTypeId, Tick};
use crate::diplomacy::key::RelationshipKey;
use crate::diplomacy::modifier::{ModifierEntry, ModifierRange, OpinionModifier};
use crate::math::Fixed64;

#[derive(Debug, Clone, Default)]
pub struct ModifierStore {
    entries: Vec<ModifierEntry>,
    ranges: AHashMap<RelationshipKey, ModifierRange>,
    last_interaction: AHashMap<RelationshipKey, Tick>,
    orphaned: usize,
}

impl ModifierStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a modifier to a relationship, relocating its block if needed
    pub fn push(&mut self, key: RelationshipKey, modifier: OpinionModifier) {
        let tail = self.entries.len();
        match self.ranges.get_mut(&key) {
            Some(range) if range.end() == tail => {
                range.count += 1;
            }
            Some(range) => {
                self.entries.extend_from_within(range.start..range.end());
                self.orphaned += range.count;
                *range = ModifierRange::new(tail, range.count + 1);
            }
            None => {
                self.ranges.insert(key, ModifierRange::new(tail, 1));
            }
        }
        self.entries.push(ModifierEntry { key, modifier });
    }

    /// Remove every modifier of `modifier_type` from a relationship.
    ///
    /// Survivors keep their relative order. Returns how many were removed.
    pub fn remove_type(&mut self, key: RelationshipKey, modifier_type: ModifierTypeId) -> usize {
        let Some(range) = self.ranges.get(&key).copied() else {
            return 0;
        };

        let mut write = range.start;
        for read in range.start..range.end() {
            if self.entries[read].modifier.modifier_type != modifier_type {
                self.entries[write] = self.entries[read];
                write += 1;
            }
        }

        let kept = write - range.start;
        let removed = range.count - kept;
        self.orphaned += removed;
        if kept == 0 {
            self.ranges.remove(&key);
        } else if let Some(r) = self.ranges.get_mut(&key) {
            r.count = kept;
        }
        removed
    }

    pub fn modifiers(&self, key: RelationshipKey) -> impl Iterator<Item = &OpinionModifier> + '_ {
        self.slice(key).iter().map(|e| &e.modifier)
    }

    fn slice(&self, key: RelationshipKey) -> &[ModifierEntry] {
        match self.ranges.get(&key) {
            Some(range) => &self.entries[range.start..range.end()],
            None => &[],
        }
    }

    /// Sum of live contributions for one relationship at `tick`
    pub fn sum_contributions(&self, key: RelationshipKey, tick: Tick) -> Fixed64 {
        self.modifiers(key).map(|m| m.contribution(tick)).sum()
    }

    pub fn modifier_count_for(&self, key: RelationshipKey) -> usize {
        self.ranges.get(&key).map_or(0, |r| r.count)
    }

    pub fn touch(&mut self, key: RelationshipKey, tick: Tick) {
        self.last_interaction.insert(key, tick);
    }

    pub fn last_interaction(&self, key: RelationshipKey) -> Option<Tick> {
        self.last_interaction.get(&key).copied()
    }

    pub fn has_cold_data(&self, key: RelationshipKey) -> bool {
        self.ranges.contains_key(&key) || self.last_interaction.contains_key(&key)
    }

    /// Drop all cold data for a relationship; its slots become orphans
    pub fn forget(&mut self, key: RelationshipKey) {
        if let Some(range) = self.ranges.remove(&key) {
            self.orphaned += range.count;
        }
        self.last_interaction.remove(&key);
    }

    /// Append a whole relationship block read from a save
    pub fn insert_loaded(
        &mut self,
        key: RelationshipKey,
        last_interaction: Tick,
        modifiers: impl IntoIterator<Item = OpinionModifier>,
    ) {
        let start = self.entries.len();
        self.entries
            .extend(modifiers.into_iter().map(|modifier| ModifierEntry { key, modifier }));
        let count = self.entries.len() - start;
        if count > 0 {
            self.ranges.insert(key, ModifierRange::new(start, count));
        }
        self.last_interaction.insert(key, last_interaction);
    }

    /// Whether the slot at `index` is still owned by its relationship
    #[inline]
    pub fn is_live(&self, index: usize) -> bool {
        self.entries
            .get(index)
            .and_then(|entry| self.ranges.get(&entry.key))
            .is_some_and(|range| range.contains(index))
    }

    pub fn entries(&self) -> &[ModifierEntry] {
        &self.entries
    }

    pub fn ranges(&self) -> &AHashMap<RelationshipKey, ModifierRange> {
        &self.ranges
    }

    pub fn range(&self, key: RelationshipKey) -> Option<ModifierRange> {
        self.ranges.get(&key).copied()
    }

    /// Arena length including orphaned slots
    pub fn arena_len(&self) -> usize {
        self.entries.len()
    }

    /// Live modifiers across all relationships
    pub fn live_count(&self) -> usize {
        self.entries.len() - self.orphaned
    }

    pub fn orphaned(&self) -> usize {
        self.orphaned
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Install a compacted arena and rebuild every range in one pass.
    ///
    /// `compacted` must hold only live slots, each relationship's slots
    /// contiguous and in their original relative order.
    pub fn install_compacted(&mut self, compacted: Vec<ModifierEntry>) {
        self.ranges = rebuild_ranges(&compacted);
        self.entries = compacted;
        self.orphaned = 0;
    }

    /// Verify range bookkeeping; used by tests and debug assertions
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut sorted: Vec<(RelationshipKey, ModifierRange)> =
            self.ranges.iter().map(|(k, r)| (*k, *r)).collect();
        sorted.sort_by_key(|(_, r)| r.start);

        let mut live = 0;
        for window in sorted.windows(2) {
            if window[0].1.overlaps(&window[1].1) {
                return Err(format!("ranges of {} and {} overlap", window[0].0, window[1].0));
            }
        }
        for (key, range) in &sorted {
            if range.count == 0 {
                return Err(format!("empty range kept for {}", key));
            }
            if range.end() > self.entries.len() {
                return Err(format!("range of {} ends past the arena", key));
            }
            if self.entries[range.start..range.end()].iter().any(|e| e.key != *key) {
                return Err(format!("range of {} covers a foreign slot", key));
            }
            live += range.count;
        }
        if live + self.orphaned != self.entries.len() {
            return Err(format!(
                "{} live + {} orphaned != {} slots",
                live,
                self.orphaned,
                self.entries.len()
            ));
        }
        Ok(())
    }
}

/// Phase C: one pass over a compacted arena, one range per run of keys
pub fn rebuild_ranges(entries: &[ModifierEntry]) -> AHashMap<RelationshipKey, ModifierRange> {
    let mut ranges: AHashMap<RelationshipKey, ModifierRange> = AHashMap::new();
    let mut current: Option<(RelationshipKey, ModifierRange)> = None;

    for (index, entry) in entries.iter().enumerate() {
        match current.as_mut() {
            Some((key, range)) if *key == entry.key => range.count += 1,
            _ => {
                if let Some((key, range)) = current.take() {
                    ranges.insert(key, range);
                }
                current = Some((entry.key, ModifierRange::new(index, 1)));
            }
        }
    }
    if let Some((key, range)) = current {
        ranges.insert(key, range);
    }
    ranges
}
