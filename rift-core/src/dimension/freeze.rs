//! Freezing and unfreezing the simulation of a loaded dimension.
//!
//! A frozen dimension stays loaded. Its entities and tiles are only dropped
//! from the world's active sets and come back from the chunks' own lists on
//! unfreeze, so nothing is rebuilt from saved data.

use rift_utils::types::block_to_section;
use rift_utils::{ChunkPos, DimensionId, Vector3};
use rustc_hash::FxHashSet;
use uuid::Uuid;

use crate::config::PowerConfig;
use crate::dimension::manager::DimensionManager;
use crate::dimension::sustain::SustainPolicy;

/// Network id of an entity inside its world.
pub type EntityId = i32;

/// Block position of a tile entity.
pub type TilePos = Vector3<i32>;

/// An entity as stored in a chunk section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    /// The entity's id.
    pub id: EntityId,
    /// Exact position.
    pub position: Vector3<f64>,
    /// Players are always kept active.
    pub is_player: bool,
}

/// A player present in a dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    /// The player's entity id.
    pub id: EntityId,
    /// The player's profile id.
    pub uuid: Uuid,
    /// Exact position.
    pub position: Vector3<f64>,
    /// Charge of the sustaining item the player holds, `None` without one.
    pub sustain_charge: Option<i64>,
}

/// Snapshot-and-replace access to a loaded world's simulation state.
pub trait FreezableWorld {
    /// The dimension this world belongs to.
    fn dimension_id(&self) -> DimensionId;
    /// Players currently in the world.
    fn players(&self) -> Vec<PlayerSnapshot>;
    /// Chunk columns held in memory.
    fn loaded_chunks(&self) -> Vec<ChunkPos>;
    /// Whether the column at `pos` exists, without loading it.
    fn chunk_exists(&self, pos: ChunkPos) -> bool;
    /// Section index of the lowest section.
    fn min_section(&self) -> i32;
    /// Number of sections in a column.
    fn section_count(&self) -> i32;
    /// Entities listed in one section of a column.
    fn section_entities(&self, pos: ChunkPos, section: i32) -> Vec<EntitySnapshot>;
    /// Tile entities stored in a column.
    fn chunk_tiles(&self, pos: ChunkPos) -> Vec<TilePos>;
    /// Flags the column as loaded.
    fn set_chunk_loaded(&mut self, pos: ChunkPos);
    /// Entities currently simulated.
    fn active_entities(&self) -> FxHashSet<EntityId>;
    /// Tiles currently ticked.
    fn active_tiles(&self) -> FxHashSet<TilePos>;
    /// Replaces the simulated entity set.
    fn set_active_entities(&mut self, entities: FxHashSet<EntityId>);
    /// Replaces the ticked tile set.
    fn set_active_tiles(&mut self, tiles: FxHashSet<TilePos>);
    /// Extracts `amount` from the sustaining item of `player`.
    ///
    /// Returns `false` if the player is gone or the item lacks the charge.
    fn drain_sustain_charge(&mut self, player: Uuid, amount: i64) -> bool;
}

/// What a freeze pass kept running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreezeOutcome {
    /// Block positions of players sustaining the dimension.
    pub anchors: Vec<Vector3<i32>>,
    /// Entities left active.
    pub kept: FxHashSet<EntityId>,
}

/// Per-tick cost the sustaining items are checked against.
///
/// A difficulty of `-1` makes sustaining free.
#[must_use]
pub fn sustain_tick_cost(manager: &DimensionManager, id: DimensionId, power: &PowerConfig) -> i64 {
    if power.dimension_difficulty == -1 {
        0
    } else {
        i64::from(manager.maintenance_cost(id))
    }
}

/// Suspends entity and tile processing of `world`.
///
/// Players stay active, and so does every entity within the phased field
/// range of a player whose sustaining item covers the upkeep. Charge is only
/// checked here, never consumed. No tile keeps ticking.
pub fn freeze(
    world: &mut dyn FreezableWorld,
    manager: &DimensionManager,
    power: &PowerConfig,
    policy: Option<&dyn SustainPolicy>,
) -> FreezeOutcome {
    let radius = power.phased_field_range;
    let players = world.players();

    let mut anchors = Vec::new();
    if radius > 0 {
        let tick_cost = sustain_tick_cost(manager, world.dimension_id(), power);
        if let Some(policy) = policy {
            anchors.extend(
                players
                    .iter()
                    .filter(|player| policy.can_sustain(player, tick_cost))
                    .map(|player| player.position.floor()),
            );
        }
    }

    let mut kept: FxHashSet<EntityId> = players.iter().map(|player| player.id).collect();
    for anchor in &anchors {
        collect_entities_in_sphere(&*world, *anchor, radius, &mut kept);
    }

    log::debug!(
        "Freezing dimension {}: {} anchors, {} entities kept",
        world.dimension_id(),
        anchors.len(),
        kept.len()
    );
    world.set_active_entities(kept.clone());
    world.set_active_tiles(FxHashSet::default());

    FreezeOutcome { anchors, kept }
}

/// Columns whose blocks may lie within `radius` of `center` on one axis.
fn column_range(center: i32, radius: i32) -> std::ops::RangeInclusive<i32> {
    let low = block_to_section(f64::from(center - radius));
    let high = block_to_section(f64::from(center + 1 + radius));
    low..=high
}

fn collect_entities_in_sphere(
    world: &dyn FreezableWorld,
    center: Vector3<i32>,
    radius: i32,
    kept: &mut FxHashSet<EntityId>,
) {
    let range_squared = i64::from(radius) * i64::from(radius);

    let min_section = world.min_section();
    let max_section = min_section + world.section_count() - 1;
    if max_section < min_section {
        return;
    }
    let sections = column_range(center.y, radius);
    let low = (*sections.start()).clamp(min_section, max_section);
    let high = (*sections.end()).clamp(min_section, max_section);

    for x in column_range(center.x, radius) {
        for z in column_range(center.z, radius) {
            let pos = ChunkPos::new(x, z);
            if !world.chunk_exists(pos) {
                continue;
            }
            for section in low..=high {
                kept.extend(
                    world
                        .section_entities(pos, section)
                        .into_iter()
                        .filter(|entity| !entity.is_player)
                        .filter(|entity| {
                            entity.position.floor().distance_squared(center) < range_squared
                        })
                        .map(|entity| entity.id),
                );
            }
        }
    }
}

/// Restores full simulation of `world`.
///
/// Every loaded column is flagged loaded again and its tiles and section
/// entities are re-admitted into the active sets.
pub fn unfreeze(world: &mut dyn FreezableWorld) {
    let mut entities = world.active_entities();
    let mut tiles = world.active_tiles();
    let min_section = world.min_section();
    let section_count = world.section_count();

    for pos in world.loaded_chunks() {
        world.set_chunk_loaded(pos);
        tiles.extend(world.chunk_tiles(pos));
        for section in min_section..min_section + section_count {
            entities.extend(
                world
                    .section_entities(pos, section)
                    .into_iter()
                    .map(|entity| entity.id),
            );
        }
    }

    log::debug!(
        "Unfreezing dimension {}: {} entities, {} tiles",
        world.dimension_id(),
        entities.len(),
        tiles.len()
    );
    world.set_active_entities(entities);
    world.set_active_tiles(tiles);
}
