//! Opinion modifiers - time-stamped, linearly decaying opinion contributions
//!
//! A modifier is never mutated after it is created. Its contribution at any
//! tick is a pure function of `(value, applied_tick, decay_rate, tick)`,
//! which is what lets the decay engine evaluate modifiers in parallel.

use serde::{Deserialize, Serialize};

use crate::core::types::{ModifierTypeId, Tick};
use crate::diplomacy::key::RelationshipKey;
use crate::math::Fixed64;

/// `decay_rate` value for modifiers that never decay
pub const PERMANENT: Tick = 0;

/// One discrete cause of opinion change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionModifier {
    pub modifier_type: ModifierTypeId,
    /// Magnitude at the moment of application
    pub value: Fixed64,
    pub applied_tick: Tick,
    /// Lifetime in ticks: the contribution falls linearly from `value` at
    /// `applied_tick` to zero at `applied_tick + decay_rate`. Zero or
    /// negative means the modifier never decays.
    pub decay_rate: Tick,
}

impl OpinionModifier {
    pub fn new(modifier_type: ModifierTypeId, value: Fixed64, applied_tick: Tick, decay_rate: Tick) -> Self {
        Self {
            modifier_type,
            value,
            applied_tick,
            decay_rate,
        }
    }

    pub fn permanent(modifier_type: ModifierTypeId, value: Fixed64, applied_tick: Tick) -> Self {
        Self::new(modifier_type, value, applied_tick, PERMANENT)
    }

    pub fn is_permanent(&self) -> bool {
        self.decay_rate <= PERMANENT
    }

    /// `value * max(0, 1 - elapsed / lifetime)`, truncated toward zero.
    ///
    /// Truncation toward zero keeps the magnitude non-increasing in `tick`.
    /// Ticks before `applied_tick` see the full value.
    pub fn contribution(&self, tick: Tick) -> Fixed64 {
        if self.is_permanent() {
            return self.value;
        }
        let elapsed = tick as i64 - self.applied_tick as i64;
        if elapsed <= 0 {
            return self.value;
        }
        let lifetime = self.decay_rate as i64;
        if elapsed >= lifetime {
            return Fixed64::ZERO;
        }
        let remaining = lifetime - elapsed;
        // |value * remaining / lifetime| <= |value|, always fits
        Fixed64::from_raw((self.value.raw() as i128 * remaining as i128 / lifetime as i128) as i64)
    }

    pub fn is_fully_decayed(&self, tick: Tick) -> bool {
        self.contribution(tick).is_zero()
    }

    /// Tick at which the contribution reaches zero, if it ever does
    pub fn expires_at(&self) -> Option<Tick> {
        if self.is_permanent() {
            None
        } else {
            Some(self.applied_tick.saturating_add(self.decay_rate))
        }
    }
}

/// Slice of the flat modifier arena owned by one relationship
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierRange {
    pub start: usize,
    pub count: usize,
}

impl ModifierRange {
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }

    pub fn overlaps(&self, other: &ModifierRange) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Arena slot: a modifier tagged with the relationship that owns it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub key: RelationshipKey,
    pub modifier: OpinionModifier,
}
