//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

use crate::math::Fixed64;

/// Identifier for a country, handed out by the external entity registry.
///
/// `0` is reserved and never names a real country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CountryId(pub u16);

impl CountryId {
    /// The reserved "no country" id
    pub const NONE: CountryId = CountryId(0);

    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for CountryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u16> for CountryId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Simulation tick counter (persisted as int32)
pub type Tick = i32;

/// Small integer tag naming the cause of an opinion modifier
pub type ModifierTypeId = u16;

/// Lowest opinion `get_opinion` can report
pub const OPINION_MIN: i32 = -200;
/// Highest opinion `get_opinion` can report
pub const OPINION_MAX: i32 = 200;

pub fn opinion_min() -> Fixed64 {
    Fixed64::from_int(OPINION_MIN)
}

pub fn opinion_max() -> Fixed64 {
    Fixed64::from_int(OPINION_MAX)
}
