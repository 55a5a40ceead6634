//! Integration tests for the diplomacy subsystem

use statecraft::command::{CommandExecutor, DiplomacyCommand};
use statecraft::core::types::CountryId;
use statecraft::core::DiplomacyConfig;
use statecraft::diplomacy::persistence;
use statecraft::diplomacy::{
    CountryRegistry, DiplomacyEvent, DiplomacySystem, EventBus, EventLog, NullSink, OpinionModifier,
    RelationshipStore,
};
use statecraft::math::Fixed64;
use std::sync::{Arc, Mutex};

fn c(id: u16) -> CountryId {
    CountryId(id)
}

fn fx(v: i32) -> Fixed64 {
    Fixed64::from_int(v)
}

#[test]
fn test_fresh_pair_is_neutral() {
    let store = RelationshipStore::new();
    assert_eq!(store.get_opinion(c(5), c(9), 0), Fixed64::ZERO);
    assert!(!store.is_at_war(c(5), c(9)));
}

#[test]
fn test_modifier_decays_to_zero_and_compacts() {
    let mut store = RelationshipStore::new();
    store
        .add_opinion_modifier(c(5), c(9), OpinionModifier::new(1, fx(50), 0, 100), 0, &mut NullSink)
        .unwrap();

    assert_eq!(store.get_opinion(c(5), c(9), 0), fx(50));
    assert_eq!(store.get_opinion(c(5), c(9), 50), fx(25));
    assert_eq!(store.get_opinion(c(5), c(9), 100), Fixed64::ZERO);

    let report = store.decay_opinion_modifiers(100);
    assert_eq!(report.decayed, 1);
    assert_eq!(store.modifier_count(), 0);
    assert!(store.check_invariants().is_ok());
}

#[test]
fn test_war_and_peace_update_enemy_lists() {
    let mut store = RelationshipStore::new();
    let mut log = EventLog::new();

    store.declare_war(c(5), c(9), 10, &mut log).unwrap();
    assert!(store.is_at_war(c(5), c(9)));
    assert_eq!(store.get_enemies(c(5)), &[c(9)]);
    assert_eq!(store.get_enemies(c(9)), &[c(5)]);

    store.make_peace(c(5), c(9), 20, &mut log).unwrap();
    assert!(!store.is_at_war(c(5), c(9)));
    assert!(store.get_enemies(c(5)).is_empty());
    assert!(store.get_enemies(c(9)).is_empty());

    assert_eq!(
        log.events,
        vec![
            DiplomacyEvent::WarDeclared { attacker: c(5), defender: c(9), tick: 10 },
            DiplomacyEvent::PeaceMade { a: c(5), b: c(9), tick: 20 },
        ]
    );
}

#[test]
fn test_recursive_allies() {
    let mut store = RelationshipStore::new();
    store.form_alliance(c(5), c(9)).unwrap();
    store.form_alliance(c(9), c(14)).unwrap();

    let mut bloc = store.get_allies_recursive(c(5));
    bloc.sort();
    assert_eq!(bloc, vec![c(9), c(14)]);
}

#[test]
fn test_military_access_is_one_way() {
    let mut store = RelationshipStore::new();
    store.grant_military_access(c(5), c(9)).unwrap();
    assert!(store.has_military_access(c(5), c(9)));
    assert!(!store.has_military_access(c(9), c(5)));
}

#[test]
fn test_save_load_three_relationships() {
    let mut store = RelationshipStore::new();
    store
        .add_opinion_modifier(c(1), c(2), OpinionModifier::new(1, fx(30), 0, 90), 0, &mut NullSink)
        .unwrap();
    store
        .add_opinion_modifier(c(1), c(2), OpinionModifier::permanent(2, fx(-10), 5), 5, &mut NullSink)
        .unwrap();
    store.declare_war(c(3), c(4), 7, &mut NullSink).unwrap();
    store.form_alliance(c(5), c(6)).unwrap();

    let loaded = persistence::load(&persistence::to_bytes(&store), &DiplomacyConfig::default()).unwrap();
    assert_eq!(loaded.relationship_count(), 3);

    let ids: Vec<CountryId> = (1..=7).map(c).collect();
    for tick in [0, 5, 45, 90, 200] {
        for &a in &ids {
            for &b in &ids {
                assert_eq!(loaded.get_opinion(a, b, tick), store.get_opinion(a, b, tick));
                assert_eq!(loaded.is_at_war(a, b), store.is_at_war(a, b));
                assert_eq!(loaded.are_allied(a, b), store.are_allied(a, b));
                assert_eq!(loaded.has_military_access(a, b), store.has_military_access(a, b));
            }
            assert_eq!(loaded.get_enemies(a), store.get_enemies(a));
            assert_eq!(loaded.get_allies_recursive(a), store.get_allies_recursive(a));
        }
    }
}

#[test]
fn test_system_month_loop_with_commands() {
    let config = DiplomacyConfig {
        ticks_per_month: 30,
        decay_workers: 3,
        ..DiplomacyConfig::default()
    };
    let registry = CountryRegistry::with_count(6);
    let mut system = DiplomacySystem::new(config);
    let mut log = EventLog::new();
    system.initialize(&registry, &mut log);

    let commands = [
        DiplomacyCommand::FormAlliance { a: c(1), b: c(2) },
        DiplomacyCommand::FormAlliance { a: c(2), b: c(3) },
        DiplomacyCommand::DeclareWar { attacker: c(1), defender: c(3) },
        DiplomacyCommand::DeclareWar { attacker: c(1), defender: c(4) },
        DiplomacyCommand::GuaranteeIndependence { guarantor: c(5), guaranteed: c(4) },
    ];
    let results = CommandExecutor::execute_all(&mut system.store, &registry, &commands, 1, &mut log);
    let executed: Vec<bool> = results.iter().map(|r| r.executed).collect();
    assert_eq!(executed, vec![true, true, false, true, true]);

    system
        .store
        .add_opinion_modifier(c(1), c(4), OpinionModifier::new(7, fx(-40), 1, 20), 1, &mut log)
        .unwrap();

    let reports: Vec<_> = (1..=60).filter_map(|tick| system.on_tick(tick)).collect();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].decayed, 1);
    assert_eq!(system.store.get_guaranteed_by(c(4)), vec![c(5)]);
    assert!(system.store.check_invariants().is_ok());

    // init + 2 treaties + war + guarantee + opinion change
    assert_eq!(log.len(), 6);
}

#[test]
fn test_event_bus_subscribers_see_every_change() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut bus = EventBus::new();
    let sink = Arc::clone(&seen);
    bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    let mut store = RelationshipStore::new();
    store.declare_war(c(1), c(2), 3, &mut bus).unwrap();
    store.declare_war(c(1), c(2), 4, &mut bus).unwrap();
    store.make_peace(c(2), c(1), 5, &mut bus).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].tick(), Some(5));
}

#[test]
fn test_config_from_toml_drives_system() {
    let config = DiplomacyConfig::from_toml_str("ticks_per_month = 5\nprune_empty_relationships = true\n").unwrap();
    let mut system = DiplomacySystem::new(config);
    system.store.set_base_opinion(c(1), c(2), Fixed64::ZERO).unwrap();
    assert!(system.on_tick(4).is_none());
    assert!(system.on_tick(5).is_some());
    assert_eq!(system.store.relationship_count(), 0);
}
