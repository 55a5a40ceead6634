//! Canonical symmetric key for an unordered country pair

use serde::{Deserialize, Serialize};

use crate::core::error::DiplomacyError;
use crate::core::types::CountryId;

/// `(smaller << 16) | larger` in the low 32 bits; upper 32 bits are zero.
///
/// `pack(a, b) == pack(b, a)` for every valid pair, and the value for a pair
/// never changes, so it addresses both hot and cold storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipKey(u64);

impl RelationshipKey {
    /// Fails for the reserved id and for a country paired with itself
    pub fn pack(a: CountryId, b: CountryId) -> Result<Self, DiplomacyError> {
        if let Some(reserved) = [a, b].into_iter().find(CountryId::is_none) {
            return Err(DiplomacyError::InvalidCountry(reserved));
        }
        if a == b {
            return Err(DiplomacyError::SelfRelationship(a));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self(((low.0 as u64) << 16) | high.0 as u64))
    }

    /// Canonical members, smaller id first
    pub fn unpack(self) -> (CountryId, CountryId) {
        (CountryId((self.0 >> 16) as u16), CountryId(self.0 as u16))
    }

    pub fn first(self) -> CountryId {
        self.unpack().0
    }

    pub fn second(self) -> CountryId {
        self.unpack().1
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn involves(self, country: CountryId) -> bool {
        let (a, b) = self.unpack();
        a == country || b == country
    }

    /// The member that is not `country`, if `country` is a member
    pub fn other(self, country: CountryId) -> Option<CountryId> {
        let (a, b) = self.unpack();
        if a == country {
            Some(b)
        } else if b == country {
            Some(a)
        } else {
            None
        }
    }

    /// True when `from` is the canonical first member (the "1" of 1→2)
    pub fn is_forward(self, from: CountryId) -> bool {
        self.first() == from
    }
}

impl std::fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (a, b) = self.unpack();
        write!(f, "({}, {})", a, b)
    }
}
