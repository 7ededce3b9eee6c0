//! RAM-only save storage.
//!
//! Nothing is written to disk. Useful for:
//! - The test harness
//! - Minigame servers whose dimensions should not outlive the process

use rustc_hash::{FxHashMap, FxHashSet};
use simdnbt::owned::NbtCompound;

use super::SaveStore;

/// In-memory save storage.
#[derive(Debug, Default)]
pub struct RamOnlyStore {
    records: FxHashMap<String, NbtCompound>,
    /// Records changed since the last flush.
    dirty: FxHashSet<String>,
}

impl RamOnlyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` was marked dirty and not flushed yet.
    #[must_use]
    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    /// Clears the dirty flags, returning the names that were dirty.
    pub fn flush(&mut self) -> Vec<String> {
        let mut flushed: Vec<String> = self.dirty.drain().collect();
        flushed.sort();
        flushed
    }
}

impl SaveStore for RamOnlyStore {
    fn load(&self, name: &str) -> Option<NbtCompound> {
        self.records.get(name).cloned()
    }

    fn store(&mut self, name: &str, data: NbtCompound) {
        self.records.insert(name.to_string(), data);
    }

    fn mark_dirty(&mut self, name: &str) {
        self.dirty.insert(name.to_string());
    }
}
