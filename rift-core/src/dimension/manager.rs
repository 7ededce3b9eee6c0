//! The authoritative table of dynamic dimensions of one save.
use std::collections::BTreeSet;

use rift_utils::DimensionId;
use uuid::Uuid;

use crate::config::DimletRules;
use crate::dimension::descriptor::DimensionDescriptor;
use crate::dimension::information::DimensionInformation;
use crate::dimension::persist::{DIMENSIONS_RECORD, DimensionTable, PersistError};
use crate::host::{DimensionRegistry, HostError, HostServices, ProviderKind, WorldContext};
use crate::network::{
    CRegisterDimension, CSyncDimensionInfo, CSyncRules, ClientboundPacket,
};
use crate::storage::SaveStore;

/// Owns the id to descriptor/information mapping and keeps the host registry,
/// the save and the clients in line with it.
///
/// One instance exists per open save: [`DimensionManager::open`] loads it and
/// [`DimensionManager::close`] tears it down. Clients use [`DimensionManager::new`]
/// and feed it the server's packets.
#[derive(Debug, Default)]
pub struct DimensionManager {
    table: DimensionTable,
    synced_rules: Option<DimletRules>,
}

impl DimensionManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the table of a save, empty if none was stored yet.
    pub fn open(store: &dyn SaveStore) -> Result<Self, PersistError> {
        let table = match store.load(DIMENSIONS_RECORD) {
            Some(nbt) => DimensionTable::from_nbt(&nbt)?,
            None => DimensionTable::default(),
        };
        log::info!(
            "Loaded {} dimensions, {} reclaimed ids",
            table.descriptors.len(),
            table.reclaimed_ids.len()
        );
        Ok(Self {
            table,
            synced_rules: None,
        })
    }

    /// Unregisters every dimension from the host and drops the table.
    pub fn close(self, host: &mut HostServices<'_>) {
        log::info!("Cleaning up dimensions");
        self.unregister_dimensions(host);
    }

    /// Creates a dimension and returns its id.
    ///
    /// Returns `None` if the descriptor is already live, if no free id is
    /// left, or if the dimension could not be built. A failed build leaves
    /// nothing registered with the host and returns the id to the pool.
    pub fn create(
        &mut self,
        host: &mut HostServices<'_>,
        world: &dyn WorldContext,
        descriptor: DimensionDescriptor,
        name: &str,
        owner_name: &str,
        owner: Option<Uuid>,
    ) -> Option<DimensionId> {
        if let Some(id) = self.table.descriptors.id_of(&descriptor) {
            log::warn!("Dimension {id} already uses this descriptor, not creating {name}");
            return None;
        }

        let Some(id) = self.allocate_id(host.registry) else {
            log::error!("No free dimension id left for {name}");
            return None;
        };

        register_with_host(host, id);
        log::info!(
            "id = {id} for {name}, descriptor = {}",
            descriptor.recipe()
        );
        self.insert(host, world, id, descriptor, name, owner_name, owner)
            .then_some(id)
    }

    /// Makes a dimension known from saved state live again under `id`.
    ///
    /// Refused for the reserved id, for an id that is already live and for a
    /// descriptor that is live under another id. Returns `false` if nothing
    /// was inserted.
    #[allow(clippy::too_many_arguments)]
    pub fn recover(
        &mut self,
        host: &mut HostServices<'_>,
        world: &dyn WorldContext,
        id: DimensionId,
        descriptor: DimensionDescriptor,
        name: &str,
        owner_name: &str,
        owner: Option<Uuid>,
    ) -> bool {
        if !id.is_assignable() || self.table.descriptors.contains(id) {
            log::error!("Cannot recover dimension {name} under id {id}");
            return false;
        }
        if let Some(other) = self.table.descriptors.id_of(&descriptor) {
            log::error!(
                "Cannot recover dimension {name} under id {id}, dimension {other} uses its descriptor"
            );
            return false;
        }

        self.table.reclaimed_ids.remove(&id);
        if !host.registry.is_registered(id) {
            register_with_host(host, id);
        }
        self.insert(host, world, id, descriptor, name, owner_name, owner)
    }

    /// Builds the record of `id` and stores it. Both callers make sure neither
    /// the id nor the descriptor is live.
    ///
    /// On failure the host registration is undone and the id reclaimed.
    #[allow(clippy::too_many_arguments)]
    fn insert(
        &mut self,
        host: &mut HostServices<'_>,
        world: &dyn WorldContext,
        id: DimensionId,
        descriptor: DimensionDescriptor,
        name: &str,
        owner_name: &str,
        owner: Option<Uuid>,
    ) -> bool {
        match DimensionInformation::new(name, &descriptor, world, owner_name, owner) {
            Ok(information) => {
                if let Some(displaced) = self.table.descriptors.insert(id, descriptor) {
                    log::error!("Dimension {id} took over the descriptor of dimension {displaced}");
                    self.table.information.remove(&displaced);
                    unregister_from_host(host.registry, displaced);
                }
                self.table.information.insert(id, information);
                self.save(host);

                if let Err(err) = host.worlds.touch_origin_chunk(id) {
                    log::error!("Could not generate the origin chunk of dimension {id}: {err}");
                }
                true
            }
            Err(err) => {
                log::error!("Something went wrong during creation of dimension {id}: {err}");
                unregister_from_host(host.registry, id);
                self.table.reclaimed_ids.insert(id);
                self.save(host);
                false
            }
        }
    }

    /// Picks a reclaimed id the host does not know, else asks the host.
    fn allocate_id(&mut self, registry: &mut dyn DimensionRegistry) -> Option<DimensionId> {
        let reclaimed = self
            .table
            .reclaimed_ids
            .iter()
            .copied()
            .find(|id| !registry.is_registered(*id));
        if let Some(id) = reclaimed {
            self.table.reclaimed_ids.remove(&id);
            return Some(id);
        }

        match registry.next_free_id() {
            Ok(id) if self.is_free(registry, id) => {
                self.table.reclaimed_ids.remove(&id);
                Some(id)
            }
            Ok(id) => {
                log::warn!("Host offered dimension id {id} which is not free, scanning");
                self.scan_free_id(registry)
            }
            Err(err) => {
                log::warn!("Host could not allocate a dimension id: {err}, scanning");
                self.scan_free_id(registry)
            }
        }
    }

    fn is_free(&self, registry: &dyn DimensionRegistry, id: DimensionId) -> bool {
        id.is_assignable()
            && !self.table.descriptors.contains(id)
            && !self.table.information.contains_key(&id)
            && !registry.is_registered(id)
    }

    fn scan_free_id(&mut self, registry: &dyn DimensionRegistry) -> Option<DimensionId> {
        let highest = self
            .table
            .descriptors
            .ids()
            .into_iter()
            .chain(self.table.information.keys().copied())
            .chain(self.table.reclaimed_ids.iter().copied())
            .map(|id| id.0)
            .max()
            .unwrap_or(0)
            .max(0);

        let id = (highest.checked_add(1)?..=i32::MAX)
            .map(DimensionId)
            .find(|id| self.is_free(registry, *id))?;
        self.table.reclaimed_ids.remove(&id);
        Some(id)
    }

    /// Drops a dimension and unregisters it from the host.
    ///
    /// The id is not reclaimed. Returns `false` if the id was unknown.
    pub fn remove(&mut self, host: &mut HostServices<'_>, id: DimensionId) -> bool {
        let descriptor = self.table.descriptors.remove(id);
        let information = self.table.information.remove(&id);

        unregister_from_host(host.registry, id);

        descriptor.is_some() || information.is_some()
    }

    /// Returns `id` to the pool of reusable ids.
    ///
    /// Refused for the reserved id and for live dimensions.
    pub fn reclaim_id(&mut self, id: DimensionId) -> bool {
        if !id.is_assignable() || self.table.descriptors.contains(id) {
            log::warn!("Refusing to reclaim dimension id {id}");
            return false;
        }
        self.table.reclaimed_ids.insert(id)
    }

    /// Number of dimensions owned by `owner`.
    #[must_use]
    pub fn count_owned_dimensions(&self, owner: Uuid) -> usize {
        self.table
            .information
            .values()
            .filter(|information| information.owner() == Some(owner))
            .count()
    }

    /// Merges a snapshot from the server. Entries it does not mention are kept.
    ///
    /// The server is authoritative: an incoming descriptor that is live locally
    /// under another id moves to the incoming id, and the local id loses its
    /// descriptor and information. Information arriving without a descriptor
    /// is stored as sent.
    pub fn sync_from_server(
        &mut self,
        descriptors: impl IntoIterator<Item = (DimensionId, DimensionDescriptor)>,
        information: impl IntoIterator<Item = (DimensionId, DimensionInformation)>,
    ) {
        let descriptors: Vec<_> = descriptors.into_iter().collect();
        let information: Vec<_> = information.into_iter().collect();
        log::debug!("Sync from server");
        if descriptors.is_empty() || information.is_empty() {
            log::info!("Dimension information from server is empty");
        }

        for (id, descriptor) in descriptors {
            if let Some(displaced) = self.table.descriptors.insert(id, descriptor) {
                log::warn!("Server moved a descriptor from dimension {displaced} to {id}");
                self.table.information.remove(&displaced);
            }
            self.table.reclaimed_ids.remove(&id);
        }
        for (id, record) in information {
            self.table.information.insert(id, record);
        }
    }

    /// Registers every known dimension with the host.
    pub fn register_dimensions(&self, host: &mut HostServices<'_>) {
        log::info!("Registering dimensions");
        for id in self.table.descriptors.ids() {
            log::debug!("    Dimension: {id}");
            register_with_host(host, id);
        }
    }

    /// Unregisters every known dimension from the host.
    ///
    /// A failing id is logged and skipped. Returns the number of failed calls.
    pub fn unregister_dimensions(&self, host: &mut HostServices<'_>) -> usize {
        let mut failures = 0;
        for id in self.table.descriptors.ids() {
            if !host.registry.is_registered(id) {
                log::debug!("    Already unregistered! Dimension: {id}");
                continue;
            }
            log::debug!("    Unregister dimension: {id}");
            if let Err(err) = host.registry.unregister_dimension(id) {
                log::warn!("        Could not unregister dimension {id}: {err}");
                failures += 1;
            }
            if let Err(err) = host.registry.unregister_provider_type(id) {
                log::warn!("        Could not unregister provider {id}: {err}");
                failures += 1;
            }
        }
        failures
    }

    /// Writes the table to the save and pushes it to every client.
    pub fn save(&self, host: &mut HostServices<'_>) {
        host.store.store(DIMENSIONS_RECORD, self.table.to_nbt());
        host.store.mark_dirty(DIMENSIONS_RECORD);

        log::debug!("Sync dimension info to clients");
        host.network.broadcast(self.sync_packet().into());
    }

    /// The full snapshot sent to clients.
    #[must_use]
    pub fn sync_packet(&self) -> CSyncDimensionInfo {
        let descriptors = self
            .table
            .descriptors
            .iter_sorted()
            .map(|(id, descriptor)| (id, descriptor.clone()))
            .collect();
        let mut information: Vec<_> = self
            .table
            .information
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect();
        information.sort_unstable_by_key(|(id, _)| *id);

        CSyncDimensionInfo {
            descriptors,
            information,
        }
    }

    /// Sends the dimlet rules to one session.
    pub fn sync_rules(&self, host: &HostServices<'_>, session: Uuid, rules: &DimletRules) {
        match CSyncRules::new(rules) {
            Ok(packet) => {
                log::debug!("Send dimlet rules to {session}");
                host.network.send_to(session, packet.into());
            }
            Err(err) => log::error!("Could not encode dimlet rules: {err}"),
        }
    }

    /// Applies a packet received from the server.
    pub fn handle_packet(&mut self, packet: ClientboundPacket, registry: &mut dyn DimensionRegistry) {
        match packet {
            ClientboundPacket::RegisterDimension(CRegisterDimension { id }) => {
                if registry.is_registered(id) {
                    return;
                }
                if let Err(err) = register(registry, id) {
                    log::error!("Could not register dimension {id} on the client: {err}");
                }
            }
            ClientboundPacket::SyncDimensionInfo(snapshot) => {
                self.sync_from_server(snapshot.descriptors, snapshot.information);
            }
            ClientboundPacket::SyncRules(packet) => match packet.rules() {
                Ok(rules) => self.synced_rules = Some(rules),
                Err(err) => log::error!("Server sent unreadable dimlet rules: {err}"),
            },
        }
    }

    /// Rules last received from the server.
    #[must_use]
    pub fn synced_rules(&self) -> Option<&DimletRules> {
        self.synced_rules.as_ref()
    }

    /// Energy drained per tick: the cost override if set, else the descriptor's cost.
    #[must_use]
    pub fn maintenance_cost(&self, id: DimensionId) -> i32 {
        match self.table.information.get(&id) {
            Some(information) => information.effective_cost(),
            None => self
                .table
                .descriptors
                .get(id)
                .map_or(0, DimensionDescriptor::maintain_cost),
        }
    }

    /// The descriptor of `id`.
    #[must_use]
    pub fn descriptor(&self, id: DimensionId) -> Option<&DimensionDescriptor> {
        self.table.descriptors.get(id)
    }

    /// The id using `descriptor`.
    #[must_use]
    pub fn dimension_id(&self, descriptor: &DimensionDescriptor) -> Option<DimensionId> {
        self.table.descriptors.id_of(descriptor)
    }

    /// The runtime record of `id`.
    #[must_use]
    pub fn information(&self, id: DimensionId) -> Option<&DimensionInformation> {
        self.table.information.get(&id)
    }

    /// Overrides the upkeep of `id`; `0` restores the descriptor's cost. Saves on change.
    ///
    /// Returns `false` if the dimension is unknown.
    pub fn set_actual_cost(
        &mut self,
        host: &mut HostServices<'_>,
        id: DimensionId,
        cost: i32,
    ) -> bool {
        let Some(information) = self.table.information.get_mut(&id) else {
            return false;
        };
        information.set_actual_cost(cost);
        self.save(host);
        true
    }

    /// Renames `id`. Saves on change.
    pub fn rename(&mut self, host: &mut HostServices<'_>, id: DimensionId, name: &str) -> bool {
        let Some(information) = self.table.information.get_mut(&id) else {
            return false;
        };
        information.set_name(name);
        self.save(host);
        true
    }

    /// Hands `id` to another owner. Saves on change.
    pub fn set_owner(
        &mut self,
        host: &mut HostServices<'_>,
        id: DimensionId,
        owner: Option<Uuid>,
        owner_name: &str,
    ) -> bool {
        let Some(information) = self.table.information.get_mut(&id) else {
            return false;
        };
        information.set_owner(owner, owner_name);
        self.save(host);
        true
    }

    /// Live dimensions ordered by id.
    pub fn dimensions(&self) -> impl Iterator<Item = (DimensionId, &DimensionDescriptor)> {
        self.table.descriptors.iter_sorted()
    }

    /// Ids waiting to be reused.
    #[must_use]
    pub fn reclaimed_ids(&self) -> &BTreeSet<DimensionId> {
        &self.table.reclaimed_ids
    }

    /// Whether descriptor-by-id and id-by-descriptor agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.table.descriptors.is_consistent()
    }
}

fn register(registry: &mut dyn DimensionRegistry, id: DimensionId) -> Result<(), HostError> {
    match registry.register_provider_type(id, ProviderKind::Generic) {
        Ok(()) | Err(HostError::AlreadyRegistered(_)) => {}
        Err(err) => return Err(err),
    }
    registry.register_dimension(id, id)
}

/// Unregisters `id` and its provider type, logging what the host refuses.
fn unregister_from_host(registry: &mut dyn DimensionRegistry, id: DimensionId) {
    if registry.is_registered(id)
        && let Err(err) = registry.unregister_dimension(id)
    {
        log::warn!("Could not unregister dimension {id}: {err}");
    }
    if let Err(err) = registry.unregister_provider_type(id) {
        log::warn!("Could not unregister provider {id}: {err}");
    }
}

/// Registers `id` unless the host already knows it, then tells every client.
fn register_with_host(host: &mut HostServices<'_>, id: DimensionId) {
    if !host.registry.is_registered(id)
        && let Err(err) = register(host.registry, id)
    {
        log::error!("Could not register dimension {id}: {err}");
    }
    host.network.broadcast(CRegisterDimension { id }.into());
}
