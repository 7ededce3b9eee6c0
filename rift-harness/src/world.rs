//! Loaded worlds kept in memory.
//!
//! A [`TestWorld`] holds chunk columns with per-section entity lists and tile
//! lists, plus the active sets the core snapshots and replaces.

use std::collections::BTreeMap;

use rift_core::dimension::{EntityId, EntitySnapshot, FreezableWorld, PlayerSnapshot, TilePos};
use rift_core::host::{HostError, LoadedWorld, WorldLoader};
use rift_utils::types::block_to_section;
use rift_utils::{ChunkPos, DimensionId, Vector3};
use rustc_hash::{FxHashMap, FxHashSet};
use uuid::Uuid;

/// Section index of the lowest section.
const MIN_SECTION: i32 = -4;
/// Sections per column.
const SECTION_COUNT: i32 = 24;

#[derive(Debug, Default)]
struct TestChunk {
    sections: FxHashMap<i32, Vec<EntitySnapshot>>,
    tiles: Vec<TilePos>,
    loaded: bool,
}

/// A loaded world with chunk columns built on demand.
#[derive(Debug)]
pub struct TestWorld {
    id: DimensionId,
    players: Vec<PlayerSnapshot>,
    chunks: FxHashMap<ChunkPos, TestChunk>,
    active_entities: FxHashSet<EntityId>,
    active_tiles: FxHashSet<TilePos>,
    next_entity: EntityId,
}

impl TestWorld {
    /// Creates an empty world for `id`.
    #[must_use]
    pub fn new(id: DimensionId) -> Self {
        Self {
            id,
            players: Vec::new(),
            chunks: FxHashMap::default(),
            active_entities: FxHashSet::default(),
            active_tiles: FxHashSet::default(),
            next_entity: 1,
        }
    }

    fn chunk_at(&mut self, position: Vector3<f64>) -> &mut TestChunk {
        let chunk = self.chunks.entry(ChunkPos::containing(position)).or_default();
        chunk.loaded = true;
        chunk
    }

    fn insert_entity(&mut self, position: Vector3<f64>, is_player: bool) -> EntityId {
        let id = self.next_entity;
        self.next_entity += 1;
        let section = block_to_section(position.y).clamp(MIN_SECTION, MIN_SECTION + SECTION_COUNT - 1);
        self.chunk_at(position)
            .sections
            .entry(section)
            .or_default()
            .push(EntitySnapshot {
                id,
                position,
                is_player,
            });
        self.active_entities.insert(id);
        id
    }

    /// Spawns a non-player entity and returns its id.
    pub fn spawn_entity(&mut self, position: Vector3<f64>) -> EntityId {
        self.insert_entity(position, false)
    }

    /// Adds a player, optionally holding a sustaining item with `sustain_charge`.
    pub fn add_player(
        &mut self,
        uuid: Uuid,
        position: Vector3<f64>,
        sustain_charge: Option<i64>,
    ) -> EntityId {
        let id = self.insert_entity(position, true);
        self.players.push(PlayerSnapshot {
            id,
            uuid,
            position,
            sustain_charge,
        });
        id
    }

    /// Places a ticking tile entity.
    pub fn place_tile(&mut self, pos: TilePos) {
        let position = Vector3::new(f64::from(pos.x), f64::from(pos.y), f64::from(pos.z));
        self.chunk_at(position).tiles.push(pos);
        self.active_tiles.insert(pos);
    }

    /// Flags every column as unloaded.
    pub fn mark_chunks_unloaded(&mut self) {
        for chunk in self.chunks.values_mut() {
            chunk.loaded = false;
        }
    }

    /// Whether the column at `pos` is flagged loaded.
    #[must_use]
    pub fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.get(&pos).is_some_and(|chunk| chunk.loaded)
    }

    /// Remaining charge of the sustaining item of `player`.
    #[must_use]
    pub fn sustain_charge(&self, player: Uuid) -> Option<i64> {
        self.players
            .iter()
            .find(|snapshot| snapshot.uuid == player)
            .and_then(|snapshot| snapshot.sustain_charge)
    }
}

impl FreezableWorld for TestWorld {
    fn dimension_id(&self) -> DimensionId {
        self.id
    }

    fn players(&self) -> Vec<PlayerSnapshot> {
        self.players.clone()
    }

    fn loaded_chunks(&self) -> Vec<ChunkPos> {
        let mut chunks: Vec<ChunkPos> = self.chunks.keys().copied().collect();
        chunks.sort_unstable();
        chunks
    }

    fn chunk_exists(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    fn min_section(&self) -> i32 {
        MIN_SECTION
    }

    fn section_count(&self) -> i32 {
        SECTION_COUNT
    }

    fn section_entities(&self, pos: ChunkPos, section: i32) -> Vec<EntitySnapshot> {
        self.chunks
            .get(&pos)
            .and_then(|chunk| chunk.sections.get(&section))
            .cloned()
            .unwrap_or_default()
    }

    fn chunk_tiles(&self, pos: ChunkPos) -> Vec<TilePos> {
        self.chunks
            .get(&pos)
            .map(|chunk| chunk.tiles.clone())
            .unwrap_or_default()
    }

    fn set_chunk_loaded(&mut self, pos: ChunkPos) {
        if let Some(chunk) = self.chunks.get_mut(&pos) {
            chunk.loaded = true;
        }
    }

    fn active_entities(&self) -> FxHashSet<EntityId> {
        self.active_entities.clone()
    }

    fn active_tiles(&self) -> FxHashSet<TilePos> {
        self.active_tiles.clone()
    }

    fn set_active_entities(&mut self, entities: FxHashSet<EntityId>) {
        self.active_entities = entities;
    }

    fn set_active_tiles(&mut self, tiles: FxHashSet<TilePos>) {
        self.active_tiles = tiles;
    }

    fn drain_sustain_charge(&mut self, player: Uuid, amount: i64) -> bool {
        let Some(charge) = self
            .players
            .iter_mut()
            .find(|snapshot| snapshot.uuid == player)
            .and_then(|snapshot| snapshot.sustain_charge.as_mut())
        else {
            return false;
        };
        if *charge < amount {
            return false;
        }
        *charge -= amount;
        true
    }
}

/// The host's set of loaded worlds. The overworld is always listed.
#[derive(Debug, Default)]
pub struct TestWorlds {
    worlds: BTreeMap<DimensionId, TestWorld>,
    touched: Vec<DimensionId>,
    failing_touch: FxHashSet<DimensionId>,
}

impl TestWorlds {
    /// Creates a host with only the overworld loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `world`, replacing any world with the same id.
    pub fn load(&mut self, world: TestWorld) {
        self.worlds.insert(world.id, world);
    }

    /// Unloads the world of `id`.
    pub fn unload(&mut self, id: DimensionId) -> Option<TestWorld> {
        self.worlds.remove(&id)
    }

    /// The world of `id`.
    #[must_use]
    pub fn get(&self, id: DimensionId) -> Option<&TestWorld> {
        self.worlds.get(&id)
    }

    /// Mutable access to the world of `id`.
    pub fn get_mut(&mut self, id: DimensionId) -> Option<&mut TestWorld> {
        self.worlds.get_mut(&id)
    }

    /// Makes generating the origin chunk of `id` fail.
    pub fn fail_touch(&mut self, id: DimensionId) {
        self.failing_touch.insert(id);
    }

    /// Dimensions whose origin chunk was generated, in order.
    #[must_use]
    pub fn touched(&self) -> &[DimensionId] {
        &self.touched
    }
}

impl WorldLoader for TestWorlds {
    fn loaded_worlds(&self) -> Vec<LoadedWorld> {
        let mut loaded = vec![LoadedWorld {
            id: DimensionId::OVERWORLD,
            name: "overworld".to_string(),
        }];
        loaded.extend(self.worlds.keys().map(|id| LoadedWorld {
            id: *id,
            name: "rift_generic".to_string(),
        }));
        loaded
    }

    fn world_mut(&mut self, id: DimensionId) -> Option<&mut dyn FreezableWorld> {
        self.worlds
            .get_mut(&id)
            .map(|world| world as &mut dyn FreezableWorld)
    }

    fn touch_origin_chunk(&mut self, id: DimensionId) -> Result<(), HostError> {
        if self.failing_touch.contains(&id) {
            return Err(HostError::WorldUnavailable(id));
        }
        self.touched.push(id);
        Ok(())
    }
}
