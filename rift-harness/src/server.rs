//! A whole in-memory host.
use anyhow::Context;
use rift_core::dimension::{DimensionManager, PowerLedger};
use rift_core::host::HostServices;
use rift_core::storage::RamOnlyStore;

use crate::network::RecordingNetwork;
use crate::registry::TestRegistry;
use crate::world::TestWorlds;

/// Every host collaborator, owned in one place.
#[derive(Debug, Default)]
pub struct TestServer {
    /// The dimension registry.
    pub registry: TestRegistry,
    /// The packet recorder.
    pub network: RecordingNetwork,
    /// The save.
    pub store: RamOnlyStore,
    /// The loaded worlds.
    pub worlds: TestWorlds,
}

impl TestServer {
    /// Creates a host with an empty save.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the collaborators for one lifecycle call.
    pub fn host(&mut self) -> HostServices<'_> {
        HostServices {
            registry: &mut self.registry,
            network: &self.network,
            store: &mut self.store,
            worlds: &mut self.worlds,
        }
    }

    /// Opens the dimension table of the save.
    pub fn open_manager(&self) -> anyhow::Result<DimensionManager> {
        DimensionManager::open(&self.store).context("opening the dimension table")
    }

    /// Opens the energy ledger of the save.
    pub fn open_ledger(&self) -> anyhow::Result<PowerLedger> {
        PowerLedger::open(&self.store).context("opening the energy ledger")
    }

    /// Drops everything but the save, as a restart does.
    pub fn restart(&mut self) {
        let store = std::mem::take(&mut self.store);
        *self = Self {
            store,
            ..Self::default()
        };
    }
}
