//! RelationshipStore - the single writer of diplomatic state
//!
//! Owns the hot records, the cold modifier arena and the derived indices:
//! the active-war set, the per-country enemy lists and the per-country
//! partner lists. Derived indices are never persisted; they are rebuilt
//! from hot data whenever the store is loaded.

use ahash::{AHashMap, AHashSet};
use serde::Serialize;

use crate::core::config::DiplomacyConfig;
use crate::core::error::Result;
use crate::core::types::{opinion_max, opinion_min, CountryId, ModifierTypeId, Tick};
use crate::diplomacy::decay::{DecayEngine, DecayReport, SweepMode};
use crate::diplomacy::events::{DiplomacyEvent, EventSink};
use crate::diplomacy::key::RelationshipKey;
use crate::diplomacy::modifier::OpinionModifier;
use crate::diplomacy::modifier_store::ModifierStore;
use crate::diplomacy::relation::RelationData;
use crate::math::Fixed64;

/// Counts for logging and the CLI summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiplomacyStats {
    pub relationships: usize,
    pub active_wars: usize,
    pub alliances: usize,
    pub modifiers: usize,
    pub orphaned_slots: usize,
}

#[derive(Debug, Clone)]
pub struct RelationshipStore {
    pub(crate) relations: AHashMap<RelationshipKey, RelationData>,
    pub(crate) modifiers: ModifierStore,
    active_wars: AHashSet<RelationshipKey>,
    /// country -> countries at war with it, sorted ascending
    war_index: AHashMap<CountryId, Vec<CountryId>>,
    /// country -> countries it has a relationship record with, sorted
    partners: AHashMap<CountryId, Vec<CountryId>>,
    decay: DecayEngine,
    compaction_garbage_threshold: usize,
}

impl Default for RelationshipStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipStore {
    pub fn new() -> Self {
        Self::with_config(&DiplomacyConfig::default())
    }

    pub fn with_config(config: &DiplomacyConfig) -> Self {
        Self {
            relations: AHashMap::new(),
            modifiers: ModifierStore::new(),
            active_wars: AHashSet::new(),
            war_index: AHashMap::new(),
            partners: AHashMap::new(),
            decay: DecayEngine::new(config.effective_decay_workers()),
            compaction_garbage_threshold: config.compaction_garbage_threshold,
        }
    }

    /// Assemble a store from loaded hot and cold data, deriving every index
    pub(crate) fn from_parts(
        relations: AHashMap<RelationshipKey, RelationData>,
        modifiers: ModifierStore,
        config: &DiplomacyConfig,
    ) -> Self {
        let mut store = Self::with_config(config);
        store.relations = relations;
        store.modifiers = modifiers;
        store.rebuild_derived_indices();
        store
    }

    // ===== Opinion =====

    /// `clamp(base + live modifiers at tick, -200, 200)`; zero when the pair
    /// has no relationship. Never mutates.
    pub fn get_opinion(&self, a: CountryId, b: CountryId, tick: Tick) -> Fixed64 {
        let Ok(key) = RelationshipKey::pack(a, b) else {
            return Fixed64::ZERO;
        };
        self.opinion_for_key(key, tick)
    }

    fn opinion_for_key(&self, key: RelationshipKey, tick: Tick) -> Fixed64 {
        let base = self
            .relations
            .get(&key)
            .map_or(Fixed64::ZERO, |r| r.base_opinion);
        base.saturating_add(self.modifiers.sum_contributions(key, tick))
            .clamp(opinion_min(), opinion_max())
    }

    pub fn get_base_opinion(&self, a: CountryId, b: CountryId) -> Fixed64 {
        self.get_relation(a, b)
            .map_or(Fixed64::ZERO, |r| r.base_opinion)
    }

    /// Overwrite base opinion, creating the relationship if needed.
    /// Clamping happens at read time only.
    pub fn set_base_opinion(&mut self, a: CountryId, b: CountryId, value: Fixed64) -> Result<()> {
        let key = mutation_key(a, b)?;
        self.relation_entry(key).base_opinion = value;
        Ok(())
    }

    /// Append a modifier and report the opinion change
    pub fn add_opinion_modifier(
        &mut self,
        a: CountryId,
        b: CountryId,
        modifier: OpinionModifier,
        tick: Tick,
        events: &mut dyn EventSink,
    ) -> Result<()> {
        let key = mutation_key(a, b)?;
        let old_opinion = self.opinion_for_key(key, tick);

        self.relation_entry(key);
        self.modifiers.push(key, modifier);
        self.modifiers.touch(key, tick);

        if self.modifiers.orphaned() > self.compaction_garbage_threshold {
            self.decay.sweep(&mut self.modifiers, tick, SweepMode::ReclaimOnly);
        }

        let new_opinion = self.opinion_for_key(key, tick);
        events.emit(DiplomacyEvent::OpinionChanged {
            a,
            b,
            old_opinion,
            new_opinion,
            modifier_type: modifier.modifier_type,
            tick,
        });
        Ok(())
    }

    /// Remove every modifier of a type from one relationship.
    /// Returns how many were removed.
    pub fn remove_opinion_modifier(
        &mut self,
        a: CountryId,
        b: CountryId,
        modifier_type: ModifierTypeId,
    ) -> Result<usize> {
        let key = mutation_key(a, b)?;
        Ok(self.modifiers.remove_type(key, modifier_type))
    }

    /// Live modifiers for a pair, in application order
    pub fn get_modifiers(&self, a: CountryId, b: CountryId) -> Vec<OpinionModifier> {
        match RelationshipKey::pack(a, b) {
            Ok(key) => self.modifiers.modifiers(key).copied().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn get_last_interaction(&self, a: CountryId, b: CountryId) -> Option<Tick> {
        RelationshipKey::pack(a, b)
            .ok()
            .and_then(|key| self.modifiers.last_interaction(key))
    }

    /// Monthly sweep: drop fully decayed modifiers and compact the arena
    pub fn decay_opinion_modifiers(&mut self, tick: Tick) -> DecayReport {
        self.decay.run(&mut self.modifiers, tick)
    }

    pub fn set_decay_workers(&mut self, workers: usize) {
        self.decay = DecayEngine::new(workers);
    }

    // ===== War =====

    pub fn is_at_war(&self, a: CountryId, b: CountryId) -> bool {
        RelationshipKey::pack(a, b).is_ok_and(|key| self.active_wars.contains(&key))
    }

    pub fn get_enemies(&self, country: CountryId) -> &[CountryId] {
        self.war_index.get(&country).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every active war as canonical pairs, ascending
    pub fn get_all_wars(&self) -> Vec<(CountryId, CountryId)> {
        let mut keys: Vec<_> = self.active_wars.iter().copied().collect();
        keys.sort_unstable();
        keys.into_iter().map(RelationshipKey::unpack).collect()
    }

    pub fn get_war_count(&self) -> usize {
        self.active_wars.len()
    }

    /// Put a pair at war. Returns false if they already were; no event
    /// is emitted and no index entry is duplicated in that case.
    pub fn declare_war(
        &mut self,
        attacker: CountryId,
        defender: CountryId,
        tick: Tick,
        events: &mut dyn EventSink,
    ) -> Result<bool> {
        let key = mutation_key(attacker, defender)?;
        let relation = self.relation_entry(key);
        if relation.at_war {
            return Ok(false);
        }
        relation.at_war = true;
        self.index_war(key);

        tracing::debug!("{} declared war on {} at tick {}", attacker, defender, tick);
        events.emit(DiplomacyEvent::WarDeclared {
            attacker,
            defender,
            tick,
        });
        Ok(true)
    }

    /// End a war. A missing relationship is logged and ignored; a pair
    /// that is not at war is a silent no-op. Returns whether peace was made.
    pub fn make_peace(
        &mut self,
        a: CountryId,
        b: CountryId,
        tick: Tick,
        events: &mut dyn EventSink,
    ) -> Result<bool> {
        let key = mutation_key(a, b)?;
        let Some(relation) = self.relations.get_mut(&key) else {
            tracing::warn!("make_peace({}, {}): no relationship exists", a, b);
            return Ok(false);
        };
        if !relation.at_war {
            return Ok(false);
        }
        relation.at_war = false;
        self.unindex_war(key);

        tracing::debug!("{} and {} made peace at tick {}", a, b, tick);
        events.emit(DiplomacyEvent::PeaceMade { a, b, tick });
        Ok(true)
    }

    fn index_war(&mut self, key: RelationshipKey) {
        if !self.active_wars.insert(key) {
            return;
        }
        let (a, b) = key.unpack();
        insert_sorted(self.war_index.entry(a).or_default(), b);
        insert_sorted(self.war_index.entry(b).or_default(), a);
    }

    fn unindex_war(&mut self, key: RelationshipKey) {
        if !self.active_wars.remove(&key) {
            return;
        }
        let (a, b) = key.unpack();
        remove_sorted(&mut self.war_index, a, b);
        remove_sorted(&mut self.war_index, b, a);
    }

    // ===== Relationships =====

    pub fn get_relation(&self, a: CountryId, b: CountryId) -> Option<&RelationData> {
        RelationshipKey::pack(a, b)
            .ok()
            .and_then(|key| self.relations.get(&key))
    }

    /// Hot record for a key, created on first interaction
    pub(crate) fn relation_entry(&mut self, key: RelationshipKey) -> &mut RelationData {
        if !self.relations.contains_key(&key) {
            let (a, b) = key.unpack();
            insert_sorted(self.partners.entry(a).or_default(), b);
            insert_sorted(self.partners.entry(b).or_default(), a);
        }
        self.relations.entry(key).or_default()
    }

    /// Countries `country` has a relationship record with, ascending
    pub fn relationships_of(&self, country: CountryId) -> &[CountryId] {
        self.partners.get(&country).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn relationship_count(&self) -> usize {
        self.relations.len()
    }

    /// Live modifiers across every relationship
    pub fn modifier_count(&self) -> usize {
        self.modifiers.live_count()
    }

    pub fn modifier_store(&self) -> &ModifierStore {
        &self.modifiers
    }

    /// Keys in canonical ascending order, for deterministic iteration
    pub fn sorted_keys(&self) -> Vec<RelationshipKey> {
        let mut keys: Vec<_> = self.relations.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Drop relationships that answer every query like absent ones.
    /// Returns how many were removed.
    pub fn prune_neutral_relationships(&mut self) -> usize {
        let doomed: Vec<RelationshipKey> = self
            .sorted_keys()
            .into_iter()
            .filter(|key| {
                self.relations[key].is_neutral() && !self.modifiers.has_cold_data(*key)
            })
            .collect();

        for key in &doomed {
            self.relations.remove(key);
            let (a, b) = key.unpack();
            remove_sorted(&mut self.partners, a, b);
            remove_sorted(&mut self.partners, b, a);
        }
        if !doomed.is_empty() {
            tracing::debug!("Pruned {} neutral relationships", doomed.len());
        }
        doomed.len()
    }

    /// Recompute active wars, enemy lists and partner lists from hot data
    pub fn rebuild_derived_indices(&mut self) {
        self.active_wars.clear();
        self.war_index.clear();
        self.partners.clear();

        for key in self.sorted_keys() {
            let (a, b) = key.unpack();
            self.partners.entry(a).or_default().push(b);
            self.partners.entry(b).or_default().push(a);
            if self.relations[&key].at_war {
                self.index_war(key);
            }
        }
        for list in self.partners.values_mut() {
            list.sort_unstable();
        }
    }

    pub fn stats(&self) -> DiplomacyStats {
        DiplomacyStats {
            relationships: self.relations.len(),
            active_wars: self.active_wars.len(),
            alliances: self
                .relations
                .values()
                .filter(|r| r.treaty_flags.alliance())
                .count(),
            modifiers: self.modifiers.live_count(),
            orphaned_slots: self.modifiers.orphaned(),
        }
    }

    /// Check every cross-structure invariant; used by tests
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (key, relation) in &self.relations {
            if relation.at_war != self.active_wars.contains(key) {
                return Err(format!("war flag and war set disagree for {}", key));
            }
        }
        for key in &self.active_wars {
            let (a, b) = key.unpack();
            if !self.get_enemies(a).contains(&b) || !self.get_enemies(b).contains(&a) {
                return Err(format!("war index missing {}", key));
            }
        }
        let indexed: usize = self.war_index.values().map(Vec::len).sum();
        if indexed != self.active_wars.len() * 2 {
            return Err(format!(
                "war index holds {} entries for {} wars",
                indexed,
                self.active_wars.len()
            ));
        }
        for key in self.modifiers.ranges().keys() {
            if !self.relations.contains_key(key) {
                return Err(format!("modifiers without a relationship for {}", key));
            }
        }
        self.modifiers.check_invariants()
    }
}

/// Key for a mutation; a reserved or self pair is logged and rejected
pub(crate) fn mutation_key(a: CountryId, b: CountryId) -> Result<RelationshipKey> {
    RelationshipKey::pack(a, b).map_err(|e| {
        tracing::warn!("Rejected diplomacy mutation on {} and {}: {}", a, b, e);
        e
    })
}

fn insert_sorted(list: &mut Vec<CountryId>, id: CountryId) {
    if let Err(pos) = list.binary_search(&id) {
        list.insert(pos, id);
    }
}

fn remove_sorted(index: &mut AHashMap<CountryId, Vec<CountryId>>, owner: CountryId, id: CountryId) {
    if let Some(list) = index.get_mut(&owner) {
        if let Ok(pos) = list.binary_search(&id) {
            list.remove(pos);
        }
        if list.is_empty() {
            index.remove(&owner);
        }
    }
}
