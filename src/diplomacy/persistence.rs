//! Binary save/load for the relationship store
//!
//! Little-endian, fixed width, relationships in ascending key order:
//!
//! ```text
//! count:i32
//! per relationship:
//!   a:u16 b:u16 base_opinion:i64 at_war:u8 treaty_flags:u8 has_cold:u8
//!   if has_cold:
//!     last_interaction:i32 modifier_count:i32
//!     per modifier: type:u16 value:i64 applied_tick:i32 decay_rate:i32
//! ```
//!
//! Derived indices (active wars, enemy lists, partner lists) are never
//! written; `load` rebuilds them from the hot records. Orphaned arena slots
//! are not written either, so a loaded store starts fully compacted.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ahash::AHashMap;

use crate::core::config::DiplomacyConfig;
use crate::core::error::{PersistenceError, Result};
use crate::core::types::CountryId;
use crate::diplomacy::key::RelationshipKey;
use crate::diplomacy::modifier::OpinionModifier;
use crate::diplomacy::modifier_store::ModifierStore;
use crate::diplomacy::relation::RelationData;
use crate::diplomacy::store::RelationshipStore;
use crate::diplomacy::treaty::TreatyFlags;
use crate::math::Fixed64;

/// Write the store to any byte sink
pub fn save<W: Write>(store: &RelationshipStore, out: &mut W) -> std::result::Result<(), PersistenceError> {
    let keys = store.sorted_keys();
    write_count(out, keys.len())?;

    let cold = store.modifier_store();
    for key in &keys {
        let (a, b) = key.unpack();
        let relation = store.relations[key];

        out.write_all(&a.0.to_le_bytes())?;
        out.write_all(&b.0.to_le_bytes())?;
        out.write_all(&relation.base_opinion.to_le_bytes())?;
        out.write_all(&[relation.at_war as u8, relation.treaty_flags.bits()])?;

        let has_cold = cold.has_cold_data(*key);
        out.write_all(&[has_cold as u8])?;
        if !has_cold {
            continue;
        }

        out.write_all(&cold.last_interaction(*key).unwrap_or(0).to_le_bytes())?;
        write_count(out, cold.modifier_count_for(*key))?;
        for modifier in cold.modifiers(*key) {
            out.write_all(&modifier.modifier_type.to_le_bytes())?;
            out.write_all(&modifier.value.to_le_bytes())?;
            out.write_all(&modifier.applied_tick.to_le_bytes())?;
            out.write_all(&modifier.decay_rate.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Serialize to an in-memory buffer
pub fn to_bytes(store: &RelationshipStore) -> Vec<u8> {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail; counts are bounded by the u16 id space
    if let Err(e) = save(store, &mut buffer) {
        tracing::warn!("In-memory save failed: {}", e);
    }
    buffer
}

fn write_count<W: Write>(out: &mut W, count: usize) -> std::result::Result<(), PersistenceError> {
    let count = i32::try_from(count).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("count {} exceeds i32", count))
    })?;
    out.write_all(&count.to_le_bytes())?;
    Ok(())
}

/// Rebuild a store from saved bytes.
///
/// Nothing is constructed until the whole input has parsed; any malformed
/// field aborts the load with the field name and record index.
pub fn load(data: &[u8], config: &DiplomacyConfig) -> std::result::Result<RelationshipStore, PersistenceError> {
    let mut reader = Reader::new(data);
    let count = reader.count("relationship_count", 0)?;

    let mut relations = AHashMap::with_capacity(count.min(reader.remaining() / RECORD_MIN_BYTES));
    let mut modifiers = ModifierStore::new();
    let mut total_modifiers = 0usize;

    for index in 0..count {
        let a = reader.u16("entity_a", index)?;
        let b = reader.u16("entity_b", index)?;
        let key = RelationshipKey::pack(CountryId(a), CountryId(b))
            .map_err(|_| PersistenceError::InvalidKey { a, b })?;

        let relation = RelationData {
            base_opinion: Fixed64::from_raw(reader.i64("base_opinion", index)?),
            at_war: reader.bool("at_war", index)?,
            treaty_flags: TreatyFlags::from_bits_truncate(reader.u8("treaty_flags", index)?),
        };
        if relations.insert(key, relation).is_some() {
            return Err(PersistenceError::DuplicateRelationship { a, b });
        }

        if !reader.bool("has_cold_data", index)? {
            continue;
        }
        let last_interaction = reader.i32("last_interaction_tick", index)?;
        let modifier_count = reader.count("modifier_count", index)?;
        let mut block = Vec::with_capacity(modifier_count.min(reader.remaining() / MODIFIER_BYTES));
        for _ in 0..modifier_count {
            block.push(OpinionModifier {
                modifier_type: reader.u16("modifier_type", index)?,
                value: Fixed64::from_raw(reader.i64("modifier_value", index)?),
                applied_tick: reader.i32("applied_tick", index)?,
                decay_rate: reader.i32("decay_rate", index)?,
            });
        }
        total_modifiers += block.len();
        modifiers.insert_loaded(key, last_interaction, block);
    }

    if reader.remaining() > 0 {
        return Err(PersistenceError::TrailingBytes(reader.remaining()));
    }

    tracing::debug!("Loaded {} relationships with {} modifiers", relations.len(), total_modifiers);
    Ok(RelationshipStore::from_parts(relations, modifiers, config))
}

/// Smallest encoded relationship: pair, base opinion and three flag bytes
const RECORD_MIN_BYTES: usize = 2 + 2 + 8 + 1 + 1 + 1;
const MODIFIER_BYTES: usize = 2 + 8 + 4 + 4;

pub fn save_to_file(store: &RelationshipStore, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    save(store, &mut writer)?;
    writer.flush()?;
    tracing::info!(
        "Saved {} relationships ({} modifiers) to {}",
        store.relationship_count(),
        store.modifier_count(),
        path.display()
    );
    Ok(())
}

pub fn load_from_file(path: &Path, config: &DiplomacyConfig) -> Result<RelationshipStore> {
    let mut data = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut data)?;
    let store = load(&data, config)?;
    tracing::info!(
        "Loaded {} relationships ({} active wars) from {}",
        store.relationship_count(),
        store.get_war_count(),
        path.display()
    );
    Ok(store)
}

/// Bounds-checked little-endian cursor
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take<const N: usize>(&mut self, field: &'static str, index: usize) -> std::result::Result<[u8; N], PersistenceError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
            .ok_or(PersistenceError::UnexpectedEof { field, index })?;
        self.pos += N;
        Ok(bytes)
    }

    fn u8(&mut self, field: &'static str, index: usize) -> std::result::Result<u8, PersistenceError> {
        Ok(self.take::<1>(field, index)?[0])
    }

    fn u16(&mut self, field: &'static str, index: usize) -> std::result::Result<u16, PersistenceError> {
        Ok(u16::from_le_bytes(self.take(field, index)?))
    }

    fn i32(&mut self, field: &'static str, index: usize) -> std::result::Result<i32, PersistenceError> {
        Ok(i32::from_le_bytes(self.take(field, index)?))
    }

    fn i64(&mut self, field: &'static str, index: usize) -> std::result::Result<i64, PersistenceError> {
        Ok(i64::from_le_bytes(self.take(field, index)?))
    }

    fn bool(&mut self, field: &'static str, index: usize) -> std::result::Result<bool, PersistenceError> {
        match self.u8(field, index)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(PersistenceError::InvalidBool { field, value }),
        }
    }

    fn count(&mut self, field: &'static str, index: usize) -> std::result::Result<usize, PersistenceError> {
        let value = self.i32(field, index)?;
        usize::try_from(value).map_err(|_| PersistenceError::InvalidCount { field, value })
    }
}
