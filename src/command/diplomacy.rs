//! Diplomatic commands - validate, execute, undo
//!
//! `validate` is pure and checks everything; `execute` trusts that it was
//! called and only mutates. Nothing here can be undone: `undo` reports
//! `DiplomacyError::NotUndoable` for every command.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::error::{DiplomacyError, Result};
use crate::core::types::{CountryId, Tick};
use crate::diplomacy::events::{DiplomacyEvent, EventSink};
use crate::diplomacy::registry::EntityRegistry;
use crate::diplomacy::store::RelationshipStore;
use crate::diplomacy::treaty::TreatyKind;

/// Why a command failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct Rejection(pub String);

impl Rejection {
    pub fn reason(&self) -> &str {
        &self.0
    }
}

fn reject<T>(reason: impl Into<String>) -> std::result::Result<T, Rejection> {
    Err(Rejection(reason.into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiplomacyCommand {
    DeclareWar { attacker: CountryId, defender: CountryId },
    MakePeace { a: CountryId, b: CountryId },
    FormAlliance { a: CountryId, b: CountryId },
    BreakAlliance { a: CountryId, b: CountryId },
    FormNonAggressionPact { a: CountryId, b: CountryId },
    BreakNonAggressionPact { a: CountryId, b: CountryId },
    GuaranteeIndependence { guarantor: CountryId, guaranteed: CountryId },
    RevokeGuarantee { guarantor: CountryId, guaranteed: CountryId },
    GrantMilitaryAccess { granter: CountryId, recipient: CountryId },
    RevokeMilitaryAccess { granter: CountryId, recipient: CountryId },
}

impl DiplomacyCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DiplomacyCommand::DeclareWar { .. } => "declare war",
            DiplomacyCommand::MakePeace { .. } => "make peace",
            DiplomacyCommand::FormAlliance { .. } => "form alliance",
            DiplomacyCommand::BreakAlliance { .. } => "break alliance",
            DiplomacyCommand::FormNonAggressionPact { .. } => "form non-aggression pact",
            DiplomacyCommand::BreakNonAggressionPact { .. } => "break non-aggression pact",
            DiplomacyCommand::GuaranteeIndependence { .. } => "guarantee independence",
            DiplomacyCommand::RevokeGuarantee { .. } => "revoke guarantee",
            DiplomacyCommand::GrantMilitaryAccess { .. } => "grant military access",
            DiplomacyCommand::RevokeMilitaryAccess { .. } => "revoke military access",
        }
    }

    /// Acting country first
    pub fn participants(&self) -> (CountryId, CountryId) {
        match *self {
            DiplomacyCommand::DeclareWar { attacker, defender } => (attacker, defender),
            DiplomacyCommand::MakePeace { a, b }
            | DiplomacyCommand::FormAlliance { a, b }
            | DiplomacyCommand::BreakAlliance { a, b }
            | DiplomacyCommand::FormNonAggressionPact { a, b }
            | DiplomacyCommand::BreakNonAggressionPact { a, b } => (a, b),
            DiplomacyCommand::GuaranteeIndependence { guarantor, guaranteed }
            | DiplomacyCommand::RevokeGuarantee { guarantor, guaranteed } => (guarantor, guaranteed),
            DiplomacyCommand::GrantMilitaryAccess { granter, recipient }
            | DiplomacyCommand::RevokeMilitaryAccess { granter, recipient } => (granter, recipient),
        }
    }

    /// Treaty this command sets (`true`) or clears (`false`)
    fn treaty_change(&self) -> Option<(TreatyKind, bool)> {
        match self {
            DiplomacyCommand::DeclareWar { .. } | DiplomacyCommand::MakePeace { .. } => None,
            DiplomacyCommand::FormAlliance { .. } => Some((TreatyKind::Alliance, true)),
            DiplomacyCommand::BreakAlliance { .. } => Some((TreatyKind::Alliance, false)),
            DiplomacyCommand::FormNonAggressionPact { .. } => Some((TreatyKind::NonAggressionPact, true)),
            DiplomacyCommand::BreakNonAggressionPact { .. } => Some((TreatyKind::NonAggressionPact, false)),
            DiplomacyCommand::GuaranteeIndependence { .. } => Some((TreatyKind::Guarantee, true)),
            DiplomacyCommand::RevokeGuarantee { .. } => Some((TreatyKind::Guarantee, false)),
            DiplomacyCommand::GrantMilitaryAccess { .. } => Some((TreatyKind::MilitaryAccess, true)),
            DiplomacyCommand::RevokeMilitaryAccess { .. } => Some((TreatyKind::MilitaryAccess, false)),
        }
    }

    /// Check entity existence, self-reference and current state. Pure.
    pub fn validate(&self, store: &RelationshipStore, registry: &dyn EntityRegistry) -> std::result::Result<(), Rejection> {
        let (from, to) = self.participants();
        for id in [from, to] {
            if id.is_none() {
                return reject("Country id 0 is reserved");
            }
            if !registry.is_valid_entity(id) {
                return reject(format!("Unknown country {}", id));
            }
        }
        if from == to {
            return reject(format!("{} cannot target itself", from));
        }

        match self {
            DiplomacyCommand::DeclareWar { attacker, defender } => {
                validate_war(store, *attacker, *defender)
            }
            DiplomacyCommand::MakePeace { a, b } => {
                if !store.is_at_war(*a, *b) {
                    return reject(format!("{} and {} are not at war", a, b));
                }
                Ok(())
            }
            _ => {
                let Some((kind, active)) = self.treaty_change() else {
                    return Ok(());
                };
                let exists = store.has_treaty(kind, from, to);
                if active {
                    if exists {
                        return reject(format!("{} already has {} with {}", from, kind.name(), to));
                    }
                    if store.is_at_war(from, to) {
                        return reject(format!("Cannot form {} during war between {} and {}", kind.name(), from, to));
                    }
                } else if !exists {
                    return reject(format!("{} has no {} with {}", from, kind.name(), to));
                }
                Ok(())
            }
        }
    }

    pub fn is_valid(&self, store: &RelationshipStore, registry: &dyn EntityRegistry) -> bool {
        self.validate(store, registry).is_ok()
    }

    /// Apply the command. Assumes `validate` passed.
    pub fn execute(&self, store: &mut RelationshipStore, tick: Tick, events: &mut dyn EventSink) -> Result<()> {
        match *self {
            DiplomacyCommand::DeclareWar { attacker, defender } => {
                store.declare_war(attacker, defender, tick, events)?;
            }
            DiplomacyCommand::MakePeace { a, b } => {
                store.make_peace(a, b, tick, events)?;
            }
            _ => {
                let Some((treaty, active)) = self.treaty_change() else {
                    return Ok(());
                };
                let (a, b) = self.participants();
                if store.set_treaty(treaty, a, b, active)? {
                    events.emit(DiplomacyEvent::TreatyChanged { a, b, treaty, active, tick });
                }
            }
        }
        Ok(())
    }

    pub fn undo(&self) -> Result<()> {
        Err(DiplomacyError::NotUndoable(self.name()))
    }
}

fn validate_war(store: &RelationshipStore, attacker: CountryId, defender: CountryId) -> std::result::Result<(), Rejection> {
    if store.is_at_war(attacker, defender) {
        return reject(format!("{} is already at war with {}", attacker, defender));
    }
    if store.are_allied(attacker, defender) {
        return reject(format!("{} cannot declare war on its ally {}", attacker, defender));
    }
    if store.has_non_aggression_pact(attacker, defender) {
        return reject(format!("{} has a non-aggression pact with {}", attacker, defender));
    }
    if store.get_allies_recursive(attacker).contains(&defender) {
        return reject(format!("{} is in the alliance bloc of {}", defender, attacker));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diplomacy::persistence::to_bytes;
    use crate::diplomacy::registry::CountryRegistry;

    fn c(id: u16) -> CountryId {
        CountryId(id)
    }

    fn setup() -> (RelationshipStore, CountryRegistry) {
        (RelationshipStore::new(), CountryRegistry::with_count(20))
    }

    #[test]
    fn test_declare_war_validates_ids() {
        let (store, registry) = setup();
        let zero = DiplomacyCommand::DeclareWar { attacker: CountryId::NONE, defender: c(2) };
        assert!(!zero.is_valid(&store, &registry));

        let unknown = DiplomacyCommand::DeclareWar { attacker: c(1), defender: c(99) };
        assert_eq!(unknown.validate(&store, &registry).unwrap_err().reason(), "Unknown country #99");

        let selfish = DiplomacyCommand::DeclareWar { attacker: c(3), defender: c(3) };
        assert!(!selfish.is_valid(&store, &registry));
    }

    #[test]
    fn test_declare_war_then_execute() {
        let (mut store, registry) = setup();
        let mut events = Vec::new();
        let cmd = DiplomacyCommand::DeclareWar { attacker: c(5), defender: c(9) };

        assert!(cmd.is_valid(&store, &registry));
        cmd.execute(&mut store, 10, &mut events).unwrap();

        assert!(store.is_at_war(c(5), c(9)));
        assert_eq!(events.len(), 1);
        assert!(!cmd.is_valid(&store, &registry));
    }

    #[test]
    fn test_cannot_attack_alliance_bloc() {
        let (mut store, registry) = setup();
        store.form_alliance(c(1), c(2)).unwrap();
        store.form_alliance(c(2), c(3)).unwrap();

        let direct = DiplomacyCommand::DeclareWar { attacker: c(1), defender: c(2) };
        let indirect = DiplomacyCommand::DeclareWar { attacker: c(1), defender: c(3) };
        assert!(!direct.is_valid(&store, &registry));
        assert!(indirect.validate(&store, &registry).unwrap_err().reason().contains("alliance bloc"));
    }

    #[test]
    fn test_pact_blocks_war() {
        let (mut store, registry) = setup();
        store.form_non_aggression_pact(c(1), c(2)).unwrap();
        let cmd = DiplomacyCommand::DeclareWar { attacker: c(2), defender: c(1) };
        assert!(!cmd.is_valid(&store, &registry));
    }

    #[test]
    fn test_make_peace_requires_war() {
        let (mut store, registry) = setup();
        let cmd = DiplomacyCommand::MakePeace { a: c(1), b: c(2) };
        assert!(!cmd.is_valid(&store, &registry));

        store.declare_war(c(1), c(2), 0, &mut Vec::new()).unwrap();
        assert!(cmd.is_valid(&store, &registry));
    }

    #[test]
    fn test_cannot_ally_during_war() {
        let (mut store, registry) = setup();
        store.declare_war(c(1), c(2), 0, &mut Vec::new()).unwrap();
        let cmd = DiplomacyCommand::FormAlliance { a: c(1), b: c(2) };
        assert!(cmd.validate(&store, &registry).unwrap_err().reason().contains("during war"));
    }

    #[test]
    fn test_treaty_commands_emit_events() {
        let (mut store, registry) = setup();
        let mut events = Vec::new();
        let grant = DiplomacyCommand::GrantMilitaryAccess { granter: c(5), recipient: c(9) };

        assert!(grant.is_valid(&store, &registry));
        grant.execute(&mut store, 4, &mut events).unwrap();
        assert!(store.has_military_access(c(5), c(9)));
        assert!(!store.has_military_access(c(9), c(5)));
        assert_eq!(
            events,
            vec![DiplomacyEvent::TreatyChanged {
                a: c(5),
                b: c(9),
                treaty: TreatyKind::MilitaryAccess,
                active: true,
                tick: 4,
            }]
        );

        assert!(!grant.is_valid(&store, &registry));
        let reverse_revoke = DiplomacyCommand::RevokeMilitaryAccess { granter: c(9), recipient: c(5) };
        assert!(!reverse_revoke.is_valid(&store, &registry));
    }

    #[test]
    fn test_break_requires_existing_treaty() {
        let (mut store, registry) = setup();
        let brk = DiplomacyCommand::BreakAlliance { a: c(1), b: c(2) };
        assert!(!brk.is_valid(&store, &registry));
        store.form_alliance(c(2), c(1)).unwrap();
        assert!(brk.is_valid(&store, &registry));
    }

    #[test]
    fn test_rejected_commands_leave_store_unchanged() {
        let (mut store, registry) = setup();
        store.form_alliance(c(1), c(2)).unwrap();
        store.declare_war(c(3), c(4), 0, &mut Vec::new()).unwrap();
        let before = to_bytes(&store);

        let commands = [
            DiplomacyCommand::DeclareWar { attacker: c(1), defender: c(2) },
            DiplomacyCommand::MakePeace { a: c(1), b: c(2) },
            DiplomacyCommand::FormAlliance { a: c(3), b: c(4) },
            DiplomacyCommand::RevokeGuarantee { guarantor: c(1), guaranteed: c(2) },
        ];
        for cmd in commands {
            assert!(!cmd.is_valid(&store, &registry));
        }
        assert_eq!(to_bytes(&store), before);
    }

    #[test]
    fn test_undo_is_reported() {
        let cmd = DiplomacyCommand::MakePeace { a: c(1), b: c(2) };
        assert!(matches!(cmd.undo(), Err(DiplomacyError::NotUndoable("make peace"))));
    }
}
