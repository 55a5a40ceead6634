//! Diplomacy system - wires the store to the simulation loop
//!
//! Owns the relationship store and its configuration, announces itself on
//! startup and runs monthly maintenance from the tick loop.

use std::path::Path;

use crate::core::config::DiplomacyConfig;
use crate::core::error::Result;
use crate::core::types::Tick;
use crate::diplomacy::decay::DecayReport;
use crate::diplomacy::events::{DiplomacyEvent, EventSink};
use crate::diplomacy::persistence;
use crate::diplomacy::registry::EntityRegistry;
use crate::diplomacy::store::RelationshipStore;

#[derive(Debug, Clone)]
pub struct DiplomacySystem {
    pub store: RelationshipStore,
    config: DiplomacyConfig,
}

impl Default for DiplomacySystem {
    fn default() -> Self {
        Self::new(DiplomacyConfig::default())
    }
}

impl DiplomacySystem {
    pub fn new(config: DiplomacyConfig) -> Self {
        Self {
            store: RelationshipStore::with_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &DiplomacyConfig {
        &self.config
    }

    /// Announce the system once the entity registry is populated
    pub fn initialize(&mut self, registry: &dyn EntityRegistry, events: &mut dyn EventSink) {
        let country_count = registry.entity_count();
        let relationship_count = self.store.relationship_count();
        tracing::info!(
            "Diplomacy initialized: {} countries, {} relationships",
            country_count,
            relationship_count
        );
        events.emit(DiplomacyEvent::SystemInitialized {
            country_count,
            relationship_count,
        });
    }

    pub fn is_month_boundary(&self, tick: Tick) -> bool {
        tick > 0 && tick % self.config.ticks_per_month == 0
    }

    /// Run monthly maintenance when `tick` closes a month.
    /// Returns the decay report on those ticks only.
    pub fn on_tick(&mut self, tick: Tick) -> Option<DecayReport> {
        if !self.is_month_boundary(tick) {
            return None;
        }

        let report = self.store.decay_opinion_modifiers(tick);
        if self.config.prune_empty_relationships {
            self.store.prune_neutral_relationships();
        }
        Some(report)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        persistence::save_to_file(&self.store, path)
    }

    /// Replace the store with one loaded from disk.
    /// On failure the current store is left untouched.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        self.store = persistence::load_from_file(path, &self.config)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        persistence::to_bytes(&self.store)
    }

    pub fn load_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.store = persistence::load(data, &self.config)?;
        Ok(())
    }
}
