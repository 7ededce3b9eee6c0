//! Energy balance of every dimension.
use rift_utils::DimensionId;
use rustc_hash::FxHashMap;
use simdnbt::owned::{NbtCompound, NbtList};

use crate::dimension::persist::{PersistError, read_compound_list, read_int, read_long};
use crate::storage::SaveStore;

/// Name of the energy record in the save store.
pub const ENERGY_RECORD: &str = "rift_energy";

/// Per-dimension energy. Unknown dimensions hold nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerLedger {
    energy: FxHashMap<DimensionId, i64>,
}

impl PowerLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ledger of a save, empty if none was stored yet.
    pub fn open(store: &dyn SaveStore) -> Result<Self, PersistError> {
        match store.load(ENERGY_RECORD) {
            Some(nbt) => Self::from_nbt(&nbt),
            None => Ok(Self::default()),
        }
    }

    /// Writes the ledger to the store.
    pub fn save(&self, store: &mut dyn SaveStore) {
        store.store(ENERGY_RECORD, self.to_nbt());
        store.mark_dirty(ENERGY_RECORD);
    }

    /// Energy stored for `id`.
    #[must_use]
    pub fn energy_level(&self, id: DimensionId) -> i64 {
        self.energy.get(&id).copied().unwrap_or(0)
    }

    /// Sets the energy stored for `id`.
    pub fn set_energy_level(&mut self, id: DimensionId, energy: i64) {
        self.energy.insert(id, energy);
    }

    /// Subtracts `amount` and returns the new balance. The balance may go negative.
    pub fn drain(&mut self, id: DimensionId, amount: i64) -> i64 {
        let balance = self.energy.entry(id).or_insert(0);
        *balance = balance.saturating_sub(amount);
        *balance
    }

    /// Whether a balance is kept for `id`.
    #[must_use]
    pub fn contains(&self, id: DimensionId) -> bool {
        self.energy.contains_key(&id)
    }

    /// Drops every balance whose id fails `keep`. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(DimensionId) -> bool) -> usize {
        let before = self.energy.len();
        self.energy.retain(|id, _| keep(*id));
        before - self.energy.len()
    }

    /// Forgets the balance of `id`.
    pub fn remove(&mut self, id: DimensionId) -> Option<i64> {
        self.energy.remove(&id)
    }

    fn to_nbt(&self) -> NbtCompound {
        let mut ids: Vec<_> = self.energy.keys().copied().collect();
        ids.sort_unstable();
        let entries = ids
            .into_iter()
            .map(|id| {
                let mut entry = NbtCompound::new();
                entry.insert("id", id.0);
                entry.insert("energy", self.energy_level(id));
                entry
            })
            .collect();

        let mut nbt = NbtCompound::new();
        nbt.insert("energy", NbtList::Compound(entries));
        nbt
    }

    fn from_nbt(nbt: &NbtCompound) -> Result<Self, PersistError> {
        let mut energy = FxHashMap::default();
        for entry in read_compound_list(nbt, "energy")? {
            energy.insert(
                DimensionId(read_int(entry, "id")?),
                read_long(entry, "energy")?,
            );
        }
        Ok(Self { energy })
    }
}
