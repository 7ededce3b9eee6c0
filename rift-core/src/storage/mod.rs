//! Save data storage abstraction.
//!
//! A save store holds named NBT records for one save. The host provides the
//! real implementation; [`RamOnlyStore`] keeps everything in memory for tests
//! and throwaway servers.

mod ram_only;

pub use ram_only::RamOnlyStore;

use simdnbt::owned::NbtCompound;

/// Named record storage of one save.
pub trait SaveStore {
    /// Returns a copy of the record stored under `name`.
    fn load(&self, name: &str) -> Option<NbtCompound>;
    /// Replaces the record stored under `name`.
    fn store(&mut self, name: &str, data: NbtCompound);
    /// Flags `name` as needing to be written on the next flush.
    fn mark_dirty(&mut self, name: &str);
}
