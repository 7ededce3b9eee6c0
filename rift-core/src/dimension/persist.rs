//! NBT layout of the dimension table.
//!
//! ```text
//! rift_dimensions
//! ├─ dimensions: [ { id, descriptor: { recipe, maintainCost }, name, ownerName,
//! │                  owner?: int[4], actualCost, biomes: [string] } ]
//! └─ reclaimedIds: int[]
//! ```
use std::collections::BTreeSet;

use rift_utils::DimensionId;
use rustc_hash::FxHashMap;
use simdnbt::owned::{NbtCompound, NbtList, NbtTag};
use thiserror::Error;
use uuid::Uuid;

use crate::dimension::descriptor::DimensionDescriptor;
use crate::dimension::index::DescriptorIndex;
use crate::dimension::information::DimensionInformation;

/// Name of the dimension table record in the save store.
pub const DIMENSIONS_RECORD: &str = "rift_dimensions";

/// A persisted record that cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    /// A required field is missing or has the wrong tag type.
    #[error("missing or mistyped field `{0}`")]
    Field(&'static str),
    /// A stored biome is not a valid identifier.
    #[error("invalid biome `{0}`: {1}")]
    Biome(String, String),
    /// Two records share an id.
    #[error("dimension {0} is stored twice")]
    DuplicateId(DimensionId),
    /// Two records share a descriptor.
    #[error("dimensions {0} and {1} share a descriptor")]
    DuplicateDescriptor(DimensionId, DimensionId),
}

pub(crate) fn read_int(nbt: &NbtCompound, key: &'static str) -> Result<i32, PersistError> {
    match nbt.get(key) {
        Some(NbtTag::Int(value)) => Ok(*value),
        _ => Err(PersistError::Field(key)),
    }
}

pub(crate) fn read_long(nbt: &NbtCompound, key: &'static str) -> Result<i64, PersistError> {
    match nbt.get(key) {
        Some(NbtTag::Long(value)) => Ok(*value),
        Some(NbtTag::Int(value)) => Ok(i64::from(*value)),
        _ => Err(PersistError::Field(key)),
    }
}

pub(crate) fn read_string(nbt: &NbtCompound, key: &'static str) -> Result<String, PersistError> {
    match nbt.get(key) {
        Some(NbtTag::String(value)) => Ok(value.to_string()),
        _ => Err(PersistError::Field(key)),
    }
}

pub(crate) fn read_compound<'a>(
    nbt: &'a NbtCompound,
    key: &'static str,
) -> Result<&'a NbtCompound, PersistError> {
    match nbt.get(key) {
        Some(NbtTag::Compound(value)) => Ok(value),
        _ => Err(PersistError::Field(key)),
    }
}

pub(crate) fn read_compound_list<'a>(
    nbt: &'a NbtCompound,
    key: &'static str,
) -> Result<&'a [NbtCompound], PersistError> {
    match nbt.get(key) {
        Some(NbtTag::List(NbtList::Compound(values))) => Ok(values),
        Some(NbtTag::List(NbtList::Empty)) | None => Ok(&[]),
        _ => Err(PersistError::Field(key)),
    }
}

pub(crate) fn read_string_list(
    nbt: &NbtCompound,
    key: &'static str,
) -> Result<Vec<String>, PersistError> {
    match nbt.get(key) {
        Some(NbtTag::List(NbtList::String(values))) => {
            Ok(values.iter().map(|value| value.to_string()).collect())
        }
        Some(NbtTag::List(NbtList::Empty)) | None => Ok(Vec::new()),
        _ => Err(PersistError::Field(key)),
    }
}

/// UUIDs are stored as four big-endian ints, most significant first.
pub(crate) fn uuid_to_nbt(uuid: Uuid) -> NbtTag {
    let bits = uuid.as_u128();
    NbtTag::IntArray(
        (0..4)
            .rev()
            .map(|i| (bits >> (i * 32)) as u32 as i32)
            .collect(),
    )
}

pub(crate) fn read_uuid(nbt: &NbtCompound, key: &'static str) -> Result<Option<Uuid>, PersistError> {
    match nbt.get(key) {
        None => Ok(None),
        Some(NbtTag::IntArray(parts)) if parts.len() == 4 => {
            let bits = parts
                .iter()
                .fold(0u128, |acc, part| (acc << 32) | u128::from(*part as u32));
            Ok(Some(Uuid::from_u128(bits)))
        }
        _ => Err(PersistError::Field(key)),
    }
}

/// The decoded contents of a dimension table record.
#[derive(Debug, Default)]
pub struct DimensionTable {
    /// Descriptors by id and back.
    pub descriptors: DescriptorIndex,
    /// Runtime records by id.
    pub information: FxHashMap<DimensionId, DimensionInformation>,
    /// Ids waiting to be reused.
    pub reclaimed_ids: BTreeSet<DimensionId>,
}

impl DimensionTable {
    /// Encodes the table. Ids without information are skipped with an error log.
    #[must_use]
    pub fn to_nbt(&self) -> NbtCompound {
        let mut dimensions = Vec::with_capacity(self.descriptors.len());
        for (id, descriptor) in self.descriptors.iter_sorted() {
            let Some(information) = self.information.get(&id) else {
                log::error!("Dimension {id} has a descriptor but no information, not saving it");
                continue;
            };
            let mut record = NbtCompound::new();
            record.insert("id", id.0);
            record.insert("descriptor", NbtTag::Compound(descriptor.to_nbt()));
            information.write_nbt(&mut record);
            dimensions.push(record);
        }

        let mut nbt = NbtCompound::new();
        nbt.insert("dimensions", NbtList::Compound(dimensions));
        nbt.insert(
            "reclaimedIds",
            NbtTag::IntArray(self.reclaimed_ids.iter().map(|id| id.0).collect()),
        );
        nbt
    }

    /// Decodes a table record.
    pub fn from_nbt(nbt: &NbtCompound) -> Result<Self, PersistError> {
        let mut table = Self::default();

        for record in read_compound_list(nbt, "dimensions")? {
            let id = DimensionId(read_int(record, "id")?);
            let descriptor = DimensionDescriptor::from_nbt(read_compound(record, "descriptor")?)?;
            if table.descriptors.contains(id) {
                return Err(PersistError::DuplicateId(id));
            }
            if let Some(other) = table.descriptors.id_of(&descriptor) {
                return Err(PersistError::DuplicateDescriptor(other, id));
            }
            let information = DimensionInformation::read_nbt(descriptor.clone(), record)?;
            table.descriptors.insert(id, descriptor);
            table.information.insert(id, information);
        }

        match nbt.get("reclaimedIds") {
            Some(NbtTag::IntArray(ids)) => {
                table.reclaimed_ids = ids
                    .iter()
                    .map(|id| DimensionId(*id))
                    .filter(|id| !table.descriptors.contains(*id))
                    .collect();
            }
            None => {}
            Some(_) => return Err(PersistError::Field("reclaimedIds")),
        }

        Ok(table)
    }
}
