//! Diplomatic events and their delivery
//!
//! Events are plain values describing one state transition. They are
//! delivered synchronously through an [`EventSink`] by the mutation that
//! caused them; consumers (AI, UI) must not rely on ordering across event
//! kinds within a tick.

use serde::{Deserialize, Serialize};

use crate::core::types::{CountryId, ModifierTypeId, Tick};
use crate::diplomacy::treaty::TreatyKind;
use crate::math::Fixed64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiplomacyEvent {
    WarDeclared {
        attacker: CountryId,
        defender: CountryId,
        tick: Tick,
    },
    PeaceMade {
        a: CountryId,
        b: CountryId,
        tick: Tick,
    },
    OpinionChanged {
        a: CountryId,
        b: CountryId,
        old_opinion: Fixed64,
        new_opinion: Fixed64,
        modifier_type: ModifierTypeId,
        tick: Tick,
    },
    TreatyChanged {
        a: CountryId,
        b: CountryId,
        treaty: TreatyKind,
        active: bool,
        tick: Tick,
    },
    SystemInitialized {
        country_count: usize,
        relationship_count: usize,
    },
}

impl DiplomacyEvent {
    /// Countries named by the event
    pub fn participants(&self) -> Vec<CountryId> {
        match self {
            DiplomacyEvent::WarDeclared { attacker, defender, .. } => vec![*attacker, *defender],
            DiplomacyEvent::PeaceMade { a, b, .. }
            | DiplomacyEvent::OpinionChanged { a, b, .. }
            | DiplomacyEvent::TreatyChanged { a, b, .. } => vec![*a, *b],
            DiplomacyEvent::SystemInitialized { .. } => Vec::new(),
        }
    }

    pub fn tick(&self) -> Option<Tick> {
        match self {
            DiplomacyEvent::WarDeclared { tick, .. }
            | DiplomacyEvent::PeaceMade { tick, .. }
            | DiplomacyEvent::OpinionChanged { tick, .. }
            | DiplomacyEvent::TreatyChanged { tick, .. } => Some(*tick),
            DiplomacyEvent::SystemInitialized { .. } => None,
        }
    }
}

/// Receives events as they happen; no acknowledgement
pub trait EventSink {
    fn emit(&mut self, event: DiplomacyEvent);
}

impl EventSink for Vec<DiplomacyEvent> {
    fn emit(&mut self, event: DiplomacyEvent) {
        self.push(event);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: DiplomacyEvent) {}
}

/// Recorded event stream
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<DiplomacyEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_for_country(&self, country: CountryId) -> impl Iterator<Item = &DiplomacyEvent> {
        self.events
            .iter()
            .filter(move |e| e.participants().contains(&country))
    }

    pub fn events_for_tick(&self, tick: Tick) -> impl Iterator<Item = &DiplomacyEvent> {
        self.events.iter().filter(move |e| e.tick() == Some(tick))
    }

    pub fn drain(&mut self) -> Vec<DiplomacyEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: DiplomacyEvent) {
        self.events.push(event);
    }
}

type Subscriber = Box<dyn FnMut(&DiplomacyEvent) + Send>;

/// Synchronous fan-out to registered subscribers
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&DiplomacyEvent) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl EventSink for EventBus {
    fn emit(&mut self, event: DiplomacyEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
