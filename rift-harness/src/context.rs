//! World context new dimensions are built from.
use rift_core::host::WorldContext;
use rift_utils::Identifier;

/// A fixed seed and biome pool.
#[derive(Debug, Clone)]
pub struct TestWorldContext {
    seed: i64,
    biomes: Vec<Identifier>,
}

impl TestWorldContext {
    /// A context with the given seed and pool.
    #[must_use]
    pub fn new(seed: i64, biomes: Vec<Identifier>) -> Self {
        Self { seed, biomes }
    }

    /// A context with no biomes, so recipes without a biome cannot be built.
    #[must_use]
    pub fn without_biomes() -> Self {
        Self::new(0, Vec::new())
    }
}

impl Default for TestWorldContext {
    fn default() -> Self {
        Self::new(
            1234,
            ["plains", "desert", "forest", "taiga"]
                .into_iter()
                .map(Identifier::vanilla_static)
                .collect(),
        )
    }
}

impl WorldContext for TestWorldContext {
    fn seed(&self) -> i64 {
        self.seed
    }

    fn biome_pool(&self) -> &[Identifier] {
        &self.biomes
    }
}
