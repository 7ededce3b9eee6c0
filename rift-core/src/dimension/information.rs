//! Runtime records of live dimensions.
use std::hash::{Hash, Hasher};
use std::io::{Read, Result, Write};

use rift_utils::serial::{PrefixedRead, PrefixedWrite, ReadFrom, WriteTo};
use rift_utils::{Identifier, VarInt};
use rustc_hash::FxHasher;
use simdnbt::owned::{NbtCompound, NbtList, NbtTag};
use thiserror::Error;
use uuid::Uuid;

use crate::dimension::descriptor::DimensionDescriptor;
use crate::dimension::persist::{PersistError, read_int, read_string, read_string_list, read_uuid, uuid_to_nbt};
use crate::host::WorldContext;

/// Recipe entry kind naming a biome.
pub const BIOME_KIND: &str = "biome";

/// Number of biomes picked when a recipe names none.
const PICKED_BIOMES: usize = 2;

/// Why a [`DimensionInformation`] could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A recipe entry has no `kind=value` shape.
    #[error("malformed recipe entry `{0}`")]
    MalformedEntry(String),
    /// A biome entry is not a valid identifier.
    #[error("invalid biome `{biome}`: {reason}")]
    InvalidBiome {
        /// The raw biome text.
        biome: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The recipe names no biome and the world offers none to pick from.
    #[error("no biome available for the dimension")]
    NoBiomes,
}

/// Mutable runtime record of a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInformation {
    name: String,
    descriptor: DimensionDescriptor,
    owner: Option<Uuid>,
    owner_name: String,
    actual_cost: i32,
    biomes: Vec<Identifier>,
}

impl DimensionInformation {
    /// Builds the record of a new dimension from its descriptor and the world it lives in.
    pub fn new(
        name: impl Into<String>,
        descriptor: &DimensionDescriptor,
        world: &dyn WorldContext,
        owner_name: impl Into<String>,
        owner: Option<Uuid>,
    ) -> std::result::Result<Self, ConstructionError> {
        let mut biomes = Vec::new();
        for entry in descriptor.entries() {
            let (kind, value) =
                entry.map_err(|raw| ConstructionError::MalformedEntry(raw.to_string()))?;
            if kind == BIOME_KIND {
                let biome = value
                    .parse::<Identifier>()
                    .map_err(|reason| ConstructionError::InvalidBiome {
                        biome: value.to_string(),
                        reason,
                    })?;
                biomes.push(biome);
            }
        }

        if biomes.is_empty() {
            biomes = pick_biomes(descriptor, world)?;
        }

        Ok(Self {
            name: name.into(),
            descriptor: descriptor.clone(),
            owner,
            owner_name: owner_name.into(),
            actual_cost: 0,
            biomes,
        })
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the dimension.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The descriptor this dimension was built from.
    #[must_use]
    pub fn descriptor(&self) -> &DimensionDescriptor {
        &self.descriptor
    }

    /// The owning player, if any.
    #[must_use]
    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    /// The owner's name as last seen. May be stale.
    #[must_use]
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Changes the owner and its cached name.
    pub fn set_owner(&mut self, owner: Option<Uuid>, owner_name: impl Into<String>) {
        self.owner = owner;
        self.owner_name = owner_name.into();
    }

    /// Cost override; `0` means the descriptor's cost applies.
    #[must_use]
    pub const fn actual_cost(&self) -> i32 {
        self.actual_cost
    }

    /// Sets the cost override.
    pub fn set_actual_cost(&mut self, cost: i32) {
        self.actual_cost = cost;
    }

    /// The upkeep per tick: the override if set, else the descriptor's cost.
    #[must_use]
    pub const fn effective_cost(&self) -> i32 {
        if self.actual_cost != 0 {
            self.actual_cost
        } else {
            self.descriptor.maintain_cost()
        }
    }

    /// Biomes used by the dimension's generator, in recipe order.
    #[must_use]
    pub fn biomes(&self) -> &[Identifier] {
        &self.biomes
    }

    /// Writes the record's own fields; the descriptor is stored next to it by the caller.
    pub(crate) fn write_nbt(&self, nbt: &mut NbtCompound) {
        nbt.insert("name", NbtTag::String(self.name.clone().into()));
        nbt.insert("ownerName", NbtTag::String(self.owner_name.clone().into()));
        if let Some(owner) = self.owner {
            nbt.insert("owner", uuid_to_nbt(owner));
        }
        nbt.insert("actualCost", self.actual_cost);
        let biomes = self
            .biomes
            .iter()
            .map(|biome| biome.to_string().into())
            .collect();
        nbt.insert("biomes", NbtList::String(biomes));
    }

    pub(crate) fn read_nbt(
        descriptor: DimensionDescriptor,
        nbt: &NbtCompound,
    ) -> std::result::Result<Self, PersistError> {
        let biomes = read_string_list(nbt, "biomes")?
            .into_iter()
            .map(|raw| {
                raw.parse::<Identifier>()
                    .map_err(|reason| PersistError::Biome(raw.clone(), reason))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            name: read_string(nbt, "name")?,
            descriptor,
            owner: read_uuid(nbt, "owner")?,
            owner_name: read_string(nbt, "ownerName").unwrap_or_default(),
            actual_cost: read_int(nbt, "actualCost").unwrap_or(0),
            biomes,
        })
    }
}

/// Picks biomes from the world's pool, seeded by the save seed and the recipe.
fn pick_biomes(
    descriptor: &DimensionDescriptor,
    world: &dyn WorldContext,
) -> std::result::Result<Vec<Identifier>, ConstructionError> {
    let pool = world.biome_pool();
    if pool.is_empty() {
        return Err(ConstructionError::NoBiomes);
    }

    let mut hasher = FxHasher::default();
    descriptor.recipe().hash(&mut hasher);
    let mut state = hasher.finish() ^ world.seed() as u64;

    let mut biomes = Vec::with_capacity(PICKED_BIOMES);
    for _ in 0..PICKED_BIOMES {
        // xorshift64*
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        let index = (state.wrapping_mul(0x2545_F491_4F6C_DD1D) % pool.len() as u64) as usize;
        biomes.push(pool[index].clone());
    }
    Ok(biomes)
}

impl WriteTo for DimensionInformation {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        self.name.write_prefixed::<VarInt>(writer)?;
        self.descriptor.write(writer)?;
        self.owner.write(writer)?;
        self.owner_name.write_prefixed::<VarInt>(writer)?;
        self.actual_cost.write(writer)?;
        let biomes: Vec<String> = self.biomes.iter().map(ToString::to_string).collect();
        VarInt::from(biomes.len()).write(writer)?;
        for biome in &biomes {
            biome.write_prefixed::<VarInt>(writer)?;
        }
        Ok(())
    }
}

impl ReadFrom for DimensionInformation {
    fn read(data: &mut impl Read) -> Result<Self> {
        let name = String::read_prefixed::<VarInt>(data)?;
        let descriptor = DimensionDescriptor::read(data)?;
        let owner = Option::<Uuid>::read(data)?;
        let owner_name = String::read_prefixed::<VarInt>(data)?;
        let actual_cost = i32::read(data)?;
        let count: usize = VarInt::read(data)?.into();
        if count > rift_utils::serial::DEFAULT_BOUND {
            return Err(std::io::Error::other(format!("Too many biomes: {count}")));
        }
        let mut biomes = Vec::with_capacity(count);
        for _ in 0..count {
            let raw = String::read_prefixed::<VarInt>(data)?;
            biomes.push(raw.parse().map_err(std::io::Error::other)?);
        }
        Ok(Self {
            name,
            descriptor,
            owner,
            owner_name,
            actual_cost,
            biomes,
        })
    }
}
