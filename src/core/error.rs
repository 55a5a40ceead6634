use thiserror::Error;

use crate::core::types::CountryId;

#[derive(Error, Debug)]
pub enum DiplomacyError {
    #[error("A country cannot have a relationship with itself: {0}")]
    SelfRelationship(CountryId),

    #[error("Invalid country: {0}")]
    InvalidCountry(CountryId),

    #[error("Command cannot be undone: {0}")]
    NotUndoable(&'static str),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Reloaded store disagrees with the original: {0}")]
    RoundTripMismatch(String),
}

/// Failure while decoding a saved relationship store.
///
/// Every variant names the field that failed so a corrupt save can be
/// traced back to the offending record.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Unexpected end of data reading {field} (record {index})")]
    UnexpectedEof { field: &'static str, index: usize },

    #[error("Invalid count for {field}: {value}")]
    InvalidCount { field: &'static str, value: i32 },

    #[error("Invalid bool for {field}: {value}")]
    InvalidBool { field: &'static str, value: u8 },

    #[error("Invalid relationship pair ({a}, {b})")]
    InvalidKey { a: u16, b: u16 },

    #[error("Duplicate relationship ({a}, {b})")]
    DuplicateRelationship { a: u16, b: u16 },

    #[error("{0} trailing bytes after relationship data")]
    TrailingBytes(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedPointError {
    #[error("Fixed-point division by zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, DiplomacyError>;
