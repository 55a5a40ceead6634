//! Treaty queries and mutators on the relationship store
//!
//! Queries are pure bit tests. Directional treaties are read relative to
//! the canonical key order: `is_guaranteeing(g, t)` tests the "g→t" bit of
//! the `(g, t)` record, whichever member sorts first.

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::core::error::Result;
use crate::core::types::CountryId;
use crate::diplomacy::key::RelationshipKey;
use crate::diplomacy::store::{mutation_key, RelationshipStore};
use crate::diplomacy::treaty::{Direction, TreatyFlags, TreatyKind};

/// Direction of the grant `from → to` within their canonical key
fn direction(key: RelationshipKey, from: CountryId) -> Direction {
    if key.is_forward(from) {
        Direction::Forward
    } else {
        Direction::Reverse
    }
}

impl RelationshipStore {
    pub fn get_treaty_flags(&self, a: CountryId, b: CountryId) -> TreatyFlags {
        self.get_relation(a, b)
            .map_or(TreatyFlags::empty(), |r| r.treaty_flags)
    }

    /// Test a treaty held by `from` toward `to`
    pub fn has_treaty(&self, kind: TreatyKind, from: CountryId, to: CountryId) -> bool {
        let Ok(key) = RelationshipKey::pack(from, to) else {
            return false;
        };
        self.relations
            .get(&key)
            .is_some_and(|r| r.treaty_flags.has(kind, direction(key, from)))
    }

    /// Set or clear a treaty held by `from` toward `to`.
    ///
    /// Setting creates the relationship on demand. Clearing a missing
    /// relationship is logged and ignored. Returns whether anything changed.
    pub fn set_treaty(&mut self, kind: TreatyKind, from: CountryId, to: CountryId, active: bool) -> Result<bool> {
        let key = mutation_key(from, to)?;
        let dir = direction(key, from);

        if !active && !self.relations.contains_key(&key) {
            tracing::warn!("Cannot end {} between {} and {}: no relationship exists", kind.name(), from, to);
            return Ok(false);
        }

        let flags = &mut self.relation_entry(key).treaty_flags;
        if flags.has(kind, dir) == active {
            return Ok(false);
        }
        flags.set(kind, dir, active);
        Ok(true)
    }

    // ===== Alliance =====

    pub fn are_allied(&self, a: CountryId, b: CountryId) -> bool {
        self.has_treaty(TreatyKind::Alliance, a, b)
    }

    pub fn form_alliance(&mut self, a: CountryId, b: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::Alliance, a, b, true)
    }

    pub fn break_alliance(&mut self, a: CountryId, b: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::Alliance, a, b, false)
    }

    /// Direct allies, ascending
    pub fn get_allies(&self, country: CountryId) -> Vec<CountryId> {
        self.relationships_of(country)
            .iter()
            .copied()
            .filter(|&other| self.are_allied(country, other))
            .collect()
    }

    /// Every country reachable through alliances, excluding `country`,
    /// in breadth-first order. Cycles are fine; each node is visited once.
    pub fn get_allies_recursive(&self, country: CountryId) -> Vec<CountryId> {
        let mut visited: AHashSet<CountryId> = AHashSet::new();
        let mut queue = VecDeque::new();
        let mut bloc = Vec::new();

        visited.insert(country);
        queue.push_back(country);

        while let Some(current) = queue.pop_front() {
            for ally in self.get_allies(current) {
                if visited.insert(ally) {
                    bloc.push(ally);
                    queue.push_back(ally);
                }
            }
        }
        bloc
    }

    // ===== Non-aggression pact =====

    pub fn has_non_aggression_pact(&self, a: CountryId, b: CountryId) -> bool {
        self.has_treaty(TreatyKind::NonAggressionPact, a, b)
    }

    pub fn form_non_aggression_pact(&mut self, a: CountryId, b: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::NonAggressionPact, a, b, true)
    }

    pub fn break_non_aggression_pact(&mut self, a: CountryId, b: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::NonAggressionPact, a, b, false)
    }

    // ===== Guarantee =====

    pub fn is_guaranteeing(&self, guarantor: CountryId, guaranteed: CountryId) -> bool {
        self.has_treaty(TreatyKind::Guarantee, guarantor, guaranteed)
    }

    pub fn guarantee_independence(&mut self, guarantor: CountryId, guaranteed: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::Guarantee, guarantor, guaranteed, true)
    }

    pub fn revoke_guarantee(&mut self, guarantor: CountryId, guaranteed: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::Guarantee, guarantor, guaranteed, false)
    }

    /// Countries `guarantor` guarantees
    pub fn get_guaranteeing(&self, guarantor: CountryId) -> Vec<CountryId> {
        self.relationships_of(guarantor)
            .iter()
            .copied()
            .filter(|&other| self.is_guaranteeing(guarantor, other))
            .collect()
    }

    /// Countries guaranteeing `guaranteed`
    pub fn get_guaranteed_by(&self, guaranteed: CountryId) -> Vec<CountryId> {
        self.relationships_of(guaranteed)
            .iter()
            .copied()
            .filter(|&other| self.is_guaranteeing(other, guaranteed))
            .collect()
    }

    // ===== Military access =====

    /// Whether `granter` lets `recipient` move troops through its territory
    pub fn has_military_access(&self, granter: CountryId, recipient: CountryId) -> bool {
        self.has_treaty(TreatyKind::MilitaryAccess, granter, recipient)
    }

    pub fn grant_military_access(&mut self, granter: CountryId, recipient: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::MilitaryAccess, granter, recipient, true)
    }

    pub fn revoke_military_access(&mut self, granter: CountryId, recipient: CountryId) -> Result<bool> {
        self.set_treaty(TreatyKind::MilitaryAccess, granter, recipient, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: u16) -> CountryId {
        CountryId(id)
    }

    #[test]
    fn test_alliance_is_symmetric() {
        let mut store = RelationshipStore::new();
        assert!(store.form_alliance(c(9), c(5)).unwrap());
        assert!(store.are_allied(c(5), c(9)));
        assert!(store.are_allied(c(9), c(5)));
        assert!(!store.form_alliance(c(5), c(9)).unwrap());
        assert!(store.break_alliance(c(5), c(9)).unwrap());
        assert!(!store.are_allied(c(9), c(5)));
    }

    #[test]
    fn test_break_without_relationship_is_noop() {
        let mut store = RelationshipStore::new();
        assert!(!store.break_alliance(c(1), c(2)).unwrap());
        assert_eq!(store.relationship_count(), 0);
    }

    #[test]
    fn test_self_treaty_fails() {
        let mut store = RelationshipStore::new();
        assert!(store.form_alliance(c(1), c(1)).is_err());
        assert!(!store.are_allied(c(1), c(1)));
    }

    #[test]
    fn test_reserved_id_treaty_fails() {
        let mut store = RelationshipStore::new();
        assert!(store.grant_military_access(CountryId::NONE, c(3)).is_err());
        assert!(store.break_alliance(c(3), CountryId::NONE).is_err());
        assert_eq!(store.relationship_count(), 0);
        assert!(!store.has_military_access(CountryId::NONE, c(3)));
    }

    #[test]
    fn test_military_access_is_directional() {
        let mut store = RelationshipStore::new();
        store.grant_military_access(c(5), c(9)).unwrap();
        assert!(store.has_military_access(c(5), c(9)));
        assert!(!store.has_military_access(c(9), c(5)));

        store.grant_military_access(c(9), c(5)).unwrap();
        store.revoke_military_access(c(5), c(9)).unwrap();
        assert!(!store.has_military_access(c(5), c(9)));
        assert!(store.has_military_access(c(9), c(5)));
    }

    #[test]
    fn test_guarantee_lists() {
        let mut store = RelationshipStore::new();
        store.guarantee_independence(c(10), c(3)).unwrap();
        store.guarantee_independence(c(10), c(20)).unwrap();
        store.guarantee_independence(c(4), c(3)).unwrap();

        assert_eq!(store.get_guaranteeing(c(10)), vec![c(3), c(20)]);
        assert_eq!(store.get_guaranteed_by(c(3)), vec![c(4), c(10)]);
        assert!(!store.is_guaranteeing(c(3), c(10)));
        assert!(store.get_guaranteeing(c(3)).is_empty());
    }

    #[test]
    fn test_non_aggression_pact() {
        let mut store = RelationshipStore::new();
        store.form_non_aggression_pact(c(1), c(2)).unwrap();
        assert!(store.has_non_aggression_pact(c(2), c(1)));
        store.break_non_aggression_pact(c(2), c(1)).unwrap();
        assert!(!store.has_non_aggression_pact(c(1), c(2)));
    }

    #[test]
    fn test_allies_recursive_chain() {
        let mut store = RelationshipStore::new();
        store.form_alliance(c(5), c(9)).unwrap();
        store.form_alliance(c(9), c(14)).unwrap();

        let mut bloc = store.get_allies_recursive(c(5));
        bloc.sort();
        assert_eq!(bloc, vec![c(9), c(14)]);
        assert_eq!(store.get_allies(c(5)), vec![c(9)]);
    }

    #[test]
    fn test_allies_recursive_handles_cycles() {
        let mut store = RelationshipStore::new();
        store.form_alliance(c(1), c(2)).unwrap();
        store.form_alliance(c(2), c(3)).unwrap();
        store.form_alliance(c(3), c(1)).unwrap();
        store.grant_military_access(c(3), c(4)).unwrap(); // not an alliance

        assert_eq!(store.get_allies_recursive(c(1)), vec![c(2), c(3)]);
    }

    #[test]
    fn test_treaties_do_not_touch_war_state() {
        let mut store = RelationshipStore::new();
        store.form_alliance(c(1), c(2)).unwrap();
        assert!(!store.is_at_war(c(1), c(2)));
        assert_eq!(store.get_treaty_flags(c(2), c(1)).bits(), TreatyFlags::ALLIANCE);
        assert!(store.check_invariants().is_ok());
    }
}
