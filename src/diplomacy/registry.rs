//! Collaborator interfaces: the entity registry and the simulation clock
//!
//! The relationship store never decides which country ids exist or what
//! time it is. Commands consult these traits; the concrete types here back
//! the CLI and the tests.

use ahash::AHashSet;

use crate::core::types::{CountryId, Tick};

pub trait EntityRegistry {
    fn is_valid_entity(&self, id: CountryId) -> bool;
    fn entity_count(&self) -> usize;
}

pub trait TickSource {
    fn current_tick(&self) -> Tick;
}

/// Set-backed registry of live countries
#[derive(Debug, Clone, Default)]
pub struct CountryRegistry {
    countries: AHashSet<CountryId>,
}

impl CountryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Countries `1..=count`
    pub fn with_count(count: u16) -> Self {
        let mut registry = Self::new();
        for id in 1..=count {
            registry.register(CountryId(id));
        }
        registry
    }

    /// Returns false for the reserved id or an id already present
    pub fn register(&mut self, id: CountryId) -> bool {
        if id.is_none() {
            return false;
        }
        self.countries.insert(id)
    }

    pub fn remove(&mut self, id: CountryId) -> bool {
        self.countries.remove(&id)
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<CountryId> {
        let mut ids: Vec<_> = self.countries.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl EntityRegistry for CountryRegistry {
    fn is_valid_entity(&self, id: CountryId) -> bool {
        !id.is_none() && self.countries.contains(&id)
    }

    fn entity_count(&self) -> usize {
        self.countries.len()
    }
}

/// Monotonic tick counter
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationClock {
    tick: Tick,
}

impl SimulationClock {
    pub fn new(start: Tick) -> Self {
        Self { tick: start }
    }

    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }
}

impl TickSource for SimulationClock {
    fn current_tick(&self) -> Tick {
        self.tick
    }
}
