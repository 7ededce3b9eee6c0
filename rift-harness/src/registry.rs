//! Host dimension registry kept in memory.
use std::collections::VecDeque;

use rift_core::host::{DimensionRegistry, HostError, ProviderKind};
use rift_utils::DimensionId;
use rustc_hash::{FxHashMap, FxHashSet};

/// A dimension registry that can be told to fail.
///
/// Fresh ids are handed out like the host does it: the lowest unregistered id
/// starting at `first_free`.
#[derive(Debug)]
pub struct TestRegistry {
    dimensions: FxHashSet<DimensionId>,
    providers: FxHashMap<DimensionId, ProviderKind>,
    first_free: i32,
    offers: VecDeque<Result<DimensionId, HostError>>,
    failing_register: FxHashSet<DimensionId>,
    failing_unregister: FxHashSet<DimensionId>,
    next_free_calls: usize,
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self {
            dimensions: FxHashSet::default(),
            providers: FxHashMap::default(),
            first_free: 2,
            offers: VecDeque::new(),
            failing_register: FxHashSet::default(),
            failing_unregister: FxHashSet::default(),
            next_free_calls: 0,
        }
    }
}

impl TestRegistry {
    /// Creates a registry whose first free id is `2`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` as if some other system claimed it.
    pub fn claim(&mut self, id: DimensionId) {
        self.dimensions.insert(id);
    }

    /// Makes the next `next_free_id` call answer `offer` instead.
    pub fn push_offer(&mut self, offer: Result<DimensionId, HostError>) {
        self.offers.push_back(offer);
    }

    /// Makes registering `id` fail.
    pub fn fail_register(&mut self, id: DimensionId) {
        self.failing_register.insert(id);
    }

    /// Makes unregistering `id` fail.
    pub fn fail_unregister(&mut self, id: DimensionId) {
        self.failing_unregister.insert(id);
    }

    /// The provider type registered for `id`.
    #[must_use]
    pub fn provider(&self, id: DimensionId) -> Option<ProviderKind> {
        self.providers.get(&id).copied()
    }

    /// How often a fresh id was requested.
    #[must_use]
    pub const fn next_free_calls(&self) -> usize {
        self.next_free_calls
    }
}

impl DimensionRegistry for TestRegistry {
    fn is_registered(&self, id: DimensionId) -> bool {
        self.dimensions.contains(&id)
    }

    fn register_provider_type(
        &mut self,
        id: DimensionId,
        kind: ProviderKind,
    ) -> Result<(), HostError> {
        if self.failing_register.contains(&id) {
            return Err(HostError::Rejected(format!("provider {id} refused")));
        }
        if self.providers.insert(id, kind).is_some() {
            return Err(HostError::AlreadyRegistered(id));
        }
        Ok(())
    }

    fn register_dimension(
        &mut self,
        id: DimensionId,
        _provider: DimensionId,
    ) -> Result<(), HostError> {
        if self.failing_register.contains(&id) {
            return Err(HostError::Rejected(format!("dimension {id} refused")));
        }
        if !self.dimensions.insert(id) {
            return Err(HostError::AlreadyRegistered(id));
        }
        Ok(())
    }

    fn unregister_dimension(&mut self, id: DimensionId) -> Result<(), HostError> {
        if self.failing_unregister.contains(&id) {
            return Err(HostError::Rejected(format!("dimension {id} is busy")));
        }
        if !self.dimensions.remove(&id) {
            return Err(HostError::NotRegistered(id));
        }
        Ok(())
    }

    fn unregister_provider_type(&mut self, id: DimensionId) -> Result<(), HostError> {
        if self.failing_unregister.contains(&id) {
            return Err(HostError::Rejected(format!("provider {id} is busy")));
        }
        self.providers
            .remove(&id)
            .map(|_| ())
            .ok_or(HostError::NotRegistered(id))
    }

    fn next_free_id(&mut self) -> Result<DimensionId, HostError> {
        self.next_free_calls += 1;
        if let Some(offer) = self.offers.pop_front() {
            return offer;
        }
        let mut id = self.first_free;
        while self.dimensions.contains(&DimensionId(id)) {
            id += 1;
        }
        Ok(DimensionId(id))
    }
}
