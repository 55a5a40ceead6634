//! Deterministic fixed-point arithmetic
//!
//! No floating point is allowed in a simulation-affecting path. `Fixed32`
//! (16.16) covers compact fields, `Fixed64` (32.32) carries all opinion math.

pub mod fixed;
pub mod fixed64;

pub use fixed::Fixed32;
pub use fixed64::Fixed64;
