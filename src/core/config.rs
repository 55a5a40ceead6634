//! Diplomacy configuration with documented constants
//!
//! All tuning knobs for the relationship store live here. Values are loaded
//! from TOML at startup; nothing in here affects determinism except
//! `ticks_per_month`, which decides when decay sweeps run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{DiplomacyError, Result};
use crate::core::types::Tick;

/// Configuration for the diplomacy systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomacyConfig {
    /// Ticks between decay sweeps
    ///
    /// `DiplomacySystem::on_tick` runs the decay engine whenever the
    /// current tick is a multiple of this value.
    pub ticks_per_month: Tick,

    /// Number of partitions for the parallel decay pass
    ///
    /// 0 uses the size of rayon's global thread pool. The compacted result
    /// is identical for every value; this only changes how work is split.
    pub decay_workers: usize,

    /// Orphaned arena slots tolerated before an early compaction
    ///
    /// Relocating a relationship's modifiers to the arena tail leaves its
    /// old slots behind. Once this many accumulate, the next
    /// `add_opinion_modifier` compacts the arena immediately instead of
    /// waiting for the monthly sweep.
    pub compaction_garbage_threshold: usize,

    /// Drop neutral relationships during monthly maintenance
    ///
    /// A relationship with zero base opinion, no war, no treaties and no
    /// modifiers answers every query exactly like an absent one.
    pub prune_empty_relationships: bool,
}

impl Default for DiplomacyConfig {
    fn default() -> Self {
        Self {
            ticks_per_month: 30,
            decay_workers: 0,
            compaction_garbage_threshold: 65_536,
            prune_empty_relationships: false,
        }
    }
}

impl DiplomacyConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DiplomacyConfig =
            toml::from_str(content).map_err(|e| DiplomacyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_month <= 0 {
            return Err(DiplomacyError::Config(format!(
                "ticks_per_month must be positive, got {}",
                self.ticks_per_month
            )));
        }
        Ok(())
    }

    /// Partition count for phase A, resolving 0 to the rayon pool size
    pub fn effective_decay_workers(&self) -> usize {
        if self.decay_workers == 0 {
            rayon::current_num_threads().max(1)
        } else {
            self.decay_workers
        }
    }
}
