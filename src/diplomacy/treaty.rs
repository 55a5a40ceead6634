//! Treaty flags - six independent boolean states packed into one byte
//!
//! Directional treaties (guarantee, military access) use two bits each: one
//! for the canonical first member granting to the second ("1→2") and one for
//! the reverse. Callers never touch raw bits; they go through [`TreatyKind`]
//! and the direction helpers.

use serde::{Deserialize, Serialize};

/// A treaty a pair of countries can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreatyKind {
    Alliance,
    NonAggressionPact,
    Guarantee,
    MilitaryAccess,
}

impl TreatyKind {
    pub fn is_directional(self) -> bool {
        matches!(self, TreatyKind::Guarantee | TreatyKind::MilitaryAccess)
    }

    pub fn name(self) -> &'static str {
        match self {
            TreatyKind::Alliance => "alliance",
            TreatyKind::NonAggressionPact => "non-aggression pact",
            TreatyKind::Guarantee => "guarantee",
            TreatyKind::MilitaryAccess => "military access",
        }
    }
}

/// Which way a directional treaty points, relative to canonical key order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Canonical first member grants to the second
    Forward,
    /// Canonical second member grants to the first
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreatyFlags(u8);

impl TreatyFlags {
    pub const ALLIANCE: u8 = 1 << 0;
    pub const NON_AGGRESSION_PACT: u8 = 1 << 1;
    pub const GUARANTEE_1_TO_2: u8 = 1 << 2;
    pub const GUARANTEE_2_TO_1: u8 = 1 << 3;
    pub const MILITARY_ACCESS_1_TO_2: u8 = 1 << 4;
    pub const MILITARY_ACCESS_2_TO_1: u8 = 1 << 5;
    const ALL: u8 = 0b0011_1111;

    pub fn empty() -> Self {
        Self(0)
    }

    /// Rebuild from a persisted byte; unknown bits are dropped
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bit for a treaty; `direction` is ignored for symmetric treaties
    pub fn bit_for(kind: TreatyKind, direction: Direction) -> u8 {
        match (kind, direction) {
            (TreatyKind::Alliance, _) => Self::ALLIANCE,
            (TreatyKind::NonAggressionPact, _) => Self::NON_AGGRESSION_PACT,
            (TreatyKind::Guarantee, Direction::Forward) => Self::GUARANTEE_1_TO_2,
            (TreatyKind::Guarantee, Direction::Reverse) => Self::GUARANTEE_2_TO_1,
            (TreatyKind::MilitaryAccess, Direction::Forward) => Self::MILITARY_ACCESS_1_TO_2,
            (TreatyKind::MilitaryAccess, Direction::Reverse) => Self::MILITARY_ACCESS_2_TO_1,
        }
    }

    pub fn has(self, kind: TreatyKind, direction: Direction) -> bool {
        self.0 & Self::bit_for(kind, direction) != 0
    }

    pub fn set(&mut self, kind: TreatyKind, direction: Direction, active: bool) {
        let bit = Self::bit_for(kind, direction);
        if active {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn alliance(self) -> bool {
        self.has(TreatyKind::Alliance, Direction::Forward)
    }

    pub fn non_aggression_pact(self) -> bool {
        self.has(TreatyKind::NonAggressionPact, Direction::Forward)
    }

    pub fn guarantee(self, direction: Direction) -> bool {
        self.has(TreatyKind::Guarantee, direction)
    }

    pub fn military_access(self, direction: Direction) -> bool {
        self.has(TreatyKind::MilitaryAccess, direction)
    }
}
