//! Statecraft - deterministic diplomatic relationships between countries

pub mod command;
pub mod core;
pub mod diplomacy;
pub mod math;
