pub mod config;
pub mod error;
pub mod types;

pub use config::DiplomacyConfig;
pub use error::{DiplomacyError, PersistenceError, Result};
pub use types::{CountryId, ModifierTypeId, Tick};
