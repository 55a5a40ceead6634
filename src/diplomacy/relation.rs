//! Hot per-pair relationship record

use serde::{Deserialize, Serialize};

use crate::diplomacy::treaty::TreatyFlags;
use crate::math::Fixed64;

/// Fixed-size state for one country pair.
///
/// Modifiers live in the cold store; this record only holds what queries
/// touch every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationData {
    /// Durable opinion set deliberately, independent of modifiers
    pub base_opinion: Fixed64,
    pub at_war: bool,
    pub treaty_flags: TreatyFlags,
}

impl RelationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indistinguishable from a relationship that never existed
    pub fn is_neutral(&self) -> bool {
        self.base_opinion.is_zero() && !self.at_war && self.treaty_flags.is_empty()
    }
}
