//! Dimensions: their data model, the lifecycle manager and upkeep.

pub mod descriptor;
pub mod freeze;
pub mod index;
pub mod information;
pub mod ledger;
pub mod manager;
pub mod persist;
pub mod sustain;
pub mod ticker;

pub use descriptor::DimensionDescriptor;
pub use freeze::{
    EntityId, EntitySnapshot, FreezableWorld, FreezeOutcome, PlayerSnapshot, TilePos, freeze,
    unfreeze,
};
pub use index::DescriptorIndex;
pub use information::{ConstructionError, DimensionInformation};
pub use ledger::PowerLedger;
pub use manager::DimensionManager;
pub use persist::{DimensionTable, PersistError};
pub use sustain::{PhasedFieldPolicy, SustainPolicy};
pub use ticker::DimensionTicker;
