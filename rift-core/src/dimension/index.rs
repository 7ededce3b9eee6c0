//! Bidirectional id <-> descriptor index.

use rift_utils::DimensionId;
use rustc_hash::FxHashMap;

use crate::dimension::descriptor::DimensionDescriptor;

/// Keeps the descriptor-by-id and id-by-descriptor maps inverse of each other.
///
/// Both maps are only touched together, so a pair is either present in both
/// directions or in neither.
#[derive(Debug, Clone, Default)]
pub struct DescriptorIndex {
    by_id: FxHashMap<DimensionId, DimensionDescriptor>,
    by_descriptor: FxHashMap<DimensionDescriptor, DimensionId>,
}

impl DescriptorIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `id` with `descriptor`.
    ///
    /// A previous descriptor of `id` is dropped. If `descriptor` was paired with
    /// another id, that pair is dropped too and the other id is returned.
    pub fn insert(&mut self, id: DimensionId, descriptor: DimensionDescriptor) -> Option<DimensionId> {
        if let Some(previous) = self.by_id.remove(&id) {
            self.by_descriptor.remove(&previous);
        }

        let displaced = self
            .by_descriptor
            .remove(&descriptor)
            .filter(|other| *other != id);
        if let Some(other) = displaced {
            self.by_id.remove(&other);
        }

        self.by_descriptor.insert(descriptor.clone(), id);
        self.by_id.insert(id, descriptor);
        displaced
    }

    /// Removes the pair of `id`.
    pub fn remove(&mut self, id: DimensionId) -> Option<DimensionDescriptor> {
        let descriptor = self.by_id.remove(&id)?;
        self.by_descriptor.remove(&descriptor);
        Some(descriptor)
    }

    /// The descriptor paired with `id`.
    #[must_use]
    pub fn get(&self, id: DimensionId) -> Option<&DimensionDescriptor> {
        self.by_id.get(&id)
    }

    /// The id paired with `descriptor`.
    #[must_use]
    pub fn id_of(&self, descriptor: &DimensionDescriptor) -> Option<DimensionId> {
        self.by_descriptor.get(descriptor).copied()
    }

    /// Whether `id` has a descriptor.
    #[must_use]
    pub fn contains(&self, id: DimensionId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All ids, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<DimensionId> {
        let mut ids: Vec<DimensionId> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All pairs ordered by id.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (DimensionId, &DimensionDescriptor)> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.by_id.get(&id).map(|descriptor| (id, descriptor)))
    }

    /// Drops every pair.
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_descriptor.clear();
    }

    /// Checks that both directions hold the same pairs.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.by_id.len() == self.by_descriptor.len()
            && self
                .by_id
                .iter()
                .all(|(id, descriptor)| self.by_descriptor.get(descriptor) == Some(id))
    }
}
