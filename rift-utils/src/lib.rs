//! Shared primitives for the Rift workspace: identifiers, positions,
//! binary serialization helpers and logger setup.

pub mod codec;
pub mod logger;
pub mod math;
pub mod serial;
pub mod types;

pub use codec::VarInt;
pub use math::Vector3;
pub use types::{ChunkPos, DimensionId, Identifier, SECTION_SIZE};
