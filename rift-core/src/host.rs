//! The seams between the dimension core and the host server.
//!
//! Everything the core needs from the engine goes through these traits: the
//! dimension registry, the loaded worlds, the save store and the network. The
//! core never assumes a host call succeeds.

use rift_utils::{DimensionId, Identifier};
use thiserror::Error;

use crate::dimension::FreezableWorld;
use crate::network::PacketSender;
use crate::storage::SaveStore;

/// A failure reported by the host engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The id is already taken in the host registry.
    #[error("dimension {0} is already registered")]
    AlreadyRegistered(DimensionId),
    /// The id is not known to the host registry.
    #[error("dimension {0} is not registered")]
    NotRegistered(DimensionId),
    /// No world instance exists for the id.
    #[error("no world is loaded for dimension {0}")]
    WorldUnavailable(DimensionId),
    /// The host refused for another reason.
    #[error("host rejected the request: {0}")]
    Rejected(String),
}

/// World provider types a dimension can be registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// The provider generating worlds from a dimension's descriptor.
    Generic,
}

/// The host engine's dimension registry.
pub trait DimensionRegistry {
    /// Whether `id` is currently registered.
    fn is_registered(&self, id: DimensionId) -> bool;
    /// Registers the provider type used by `id`.
    fn register_provider_type(&mut self, id: DimensionId, kind: ProviderKind)
    -> Result<(), HostError>;
    /// Registers `id` with the provider registered under `provider`.
    fn register_dimension(&mut self, id: DimensionId, provider: DimensionId)
    -> Result<(), HostError>;
    /// Unregisters `id`.
    fn unregister_dimension(&mut self, id: DimensionId) -> Result<(), HostError>;
    /// Unregisters the provider type of `id`.
    fn unregister_provider_type(&mut self, id: DimensionId) -> Result<(), HostError>;
    /// The next id the host considers free.
    fn next_free_id(&mut self) -> Result<DimensionId, HostError>;
}

/// A world instance the host currently has loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedWorld {
    /// The world's dimension id.
    pub id: DimensionId,
    /// The host's name for its dimension type.
    pub name: String,
}

/// Access to the host's loaded world instances.
pub trait WorldLoader {
    /// Every world instance the host has loaded, managed by us or not.
    fn loaded_worlds(&self) -> Vec<LoadedWorld>;
    /// The world for `id`, if it is loaded.
    fn world_mut(&mut self, id: DimensionId) -> Option<&mut dyn FreezableWorld>;
    /// Loads and populates the origin chunk of `id` once so generation side effects run.
    fn touch_origin_chunk(&mut self, id: DimensionId) -> Result<(), HostError>;
}

/// Context a new dimension's information is derived from.
pub trait WorldContext {
    /// The seed of the save.
    fn seed(&self) -> i64;
    /// Biomes a recipe without explicit biomes may pick from.
    fn biome_pool(&self) -> &[Identifier];
}

/// The host collaborators a lifecycle operation may touch.
pub struct HostServices<'a> {
    /// The dimension registry.
    pub registry: &'a mut dyn DimensionRegistry,
    /// The network transport.
    pub network: &'a dyn PacketSender,
    /// The persistent store of the open save.
    pub store: &'a mut dyn SaveStore,
    /// The loaded worlds.
    pub worlds: &'a mut dyn WorldLoader,
}
