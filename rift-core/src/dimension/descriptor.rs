//! Immutable dimension recipes.
use std::io::{Read, Result, Write};

use rift_utils::VarInt;
use rift_utils::serial::{PrefixedRead, PrefixedWrite, ReadFrom, WriteTo};
use simdnbt::owned::{NbtCompound, NbtTag};

use crate::config::DimletRules;
use crate::dimension::persist::{PersistError, read_int, read_string};

/// Separates the entries of a recipe.
pub const ENTRY_SEPARATOR: char = ',';
/// Separates the kind of an entry from its value.
pub const KIND_SEPARATOR: char = '=';

/// Describes how a dimension is generated and what it costs to keep running.
///
/// Two descriptors with the same recipe and cost are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DimensionDescriptor {
    recipe: String,
    maintain_cost: i32,
}

impl DimensionDescriptor {
    /// Creates a descriptor with an explicit maintenance cost.
    #[must_use]
    pub fn new(recipe: impl Into<String>, maintain_cost: i32) -> Self {
        Self {
            recipe: recipe.into(),
            maintain_cost,
        }
    }

    /// Creates a descriptor, pricing every entry of the recipe with `rules`.
    #[must_use]
    pub fn from_recipe(recipe: impl Into<String>, rules: &DimletRules) -> Self {
        let recipe = recipe.into();
        let maintain_cost = recipe
            .split(ENTRY_SEPARATOR)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let kind = entry.split_once(KIND_SEPARATOR).map_or(entry, |(kind, _)| kind);
                rules.cost_of(kind.trim())
            })
            .fold(rules.base_cost, i32::saturating_add);

        Self {
            recipe,
            maintain_cost,
        }
    }

    /// The recipe string.
    #[must_use]
    pub fn recipe(&self) -> &str {
        &self.recipe
    }

    /// Energy drained per tick while the dimension runs.
    #[must_use]
    pub const fn maintain_cost(&self) -> i32 {
        self.maintain_cost
    }

    /// Iterates the `(kind, value)` entries of the recipe.
    ///
    /// Entries without a kind separator are returned as `Err` with the raw entry.
    pub fn entries(&self) -> impl Iterator<Item = std::result::Result<(&str, &str), &str>> {
        self.recipe
            .split(ENTRY_SEPARATOR)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry
                    .split_once(KIND_SEPARATOR)
                    .map(|(kind, value)| (kind.trim(), value.trim()))
                    .ok_or(entry)
            })
    }

    pub(crate) fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("recipe", NbtTag::String(self.recipe.clone().into()));
        nbt.insert("maintainCost", self.maintain_cost);
        nbt
    }

    pub(crate) fn from_nbt(nbt: &NbtCompound) -> std::result::Result<Self, PersistError> {
        Ok(Self {
            recipe: read_string(nbt, "recipe")?,
            maintain_cost: read_int(nbt, "maintainCost")?,
        })
    }
}

impl WriteTo for DimensionDescriptor {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        self.recipe.write_prefixed::<VarInt>(writer)?;
        self.maintain_cost.write(writer)
    }
}

impl ReadFrom for DimensionDescriptor {
    fn read(data: &mut impl Read) -> Result<Self> {
        Ok(Self {
            recipe: String::read_prefixed::<VarInt>(data)?,
            maintain_cost: i32::read(data)?,
        })
    }
}
