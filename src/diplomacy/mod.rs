//! Diplomatic relationships between countries
//!
//! Opinion, war, treaties and decaying opinion modifiers for every pair of
//! countries, stored sparsely under a symmetric pair key.

pub mod decay;
pub mod events;
pub mod key;
pub mod modifier;
pub mod modifier_store;
pub mod persistence;
pub mod registry;
pub mod relation;
pub mod store;
pub mod system;
pub mod treaties;
pub mod treaty;

pub use decay::{DecayEngine, DecayReport, SweepMode};
pub use events::{DiplomacyEvent, EventBus, EventLog, EventSink, NullSink};
pub use key::RelationshipKey;
pub use modifier::{ModifierRange, OpinionModifier, PERMANENT};
pub use modifier_store::ModifierStore;
pub use registry::{CountryRegistry, EntityRegistry, SimulationClock, TickSource};
pub use relation::RelationData;
pub use store::{DiplomacyStats, RelationshipStore};
pub use system::DiplomacySystem;
pub use treaty::{Direction, TreatyFlags, TreatyKind};
