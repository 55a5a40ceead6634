//! Command execution pipeline
//!
//! DiplomacyCommand -> validate -> execute -> events

pub mod diplomacy;
pub mod executor;

pub use diplomacy::{DiplomacyCommand, Rejection};
pub use executor::{CommandExecutor, ExecutionResult};
