//! Periodic upkeep: drains energy and freezes dimensions that ran dry.
use rift_utils::DimensionId;
use rustc_hash::FxHashSet;

use crate::config::PowerConfig;
use crate::dimension::freeze::{freeze, sustain_tick_cost, unfreeze};
use crate::dimension::ledger::PowerLedger;
use crate::dimension::manager::DimensionManager;
use crate::dimension::sustain::SustainPolicy;
use crate::host::WorldLoader;

/// Runs an upkeep pass every `max_ticks` host ticks.
#[derive(Debug, Default)]
pub struct DimensionTicker {
    counter: i64,
    frozen: FxHashSet<DimensionId>,
}

impl DimensionTicker {
    /// Creates a ticker with nothing frozen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the ticker froze `id` and has not unfrozen it yet.
    #[must_use]
    pub fn is_frozen(&self, id: DimensionId) -> bool {
        self.frozen.contains(&id)
    }

    /// Advances one host tick. Returns `true` if an upkeep pass ran.
    pub fn tick(
        &mut self,
        manager: &DimensionManager,
        ledger: &mut PowerLedger,
        worlds: &mut dyn WorldLoader,
        power: &PowerConfig,
        policy: Option<&dyn SustainPolicy>,
    ) -> bool {
        self.counter += 1;
        if self.counter < power.max_ticks {
            return false;
        }
        self.counter = 0;

        self.frozen.retain(|id| manager.descriptor(*id).is_some());
        let dropped = ledger.retain(|id| manager.descriptor(id).is_some());
        if dropped > 0 {
            log::debug!("Dropped the energy of {dropped} removed dimensions");
        }

        let ids: Vec<DimensionId> = manager.dimensions().map(|(id, _)| id).collect();
        for id in ids {
            let Some(world) = worlds.world_mut(id) else {
                continue;
            };

            let cost = i64::from(manager.maintenance_cost(id)).saturating_mul(power.max_ticks);
            let balance = ledger.drain(id, cost);

            if balance <= 0 && power.freeze_unpowered {
                if self.frozen.insert(id) {
                    log::info!("Dimension {id} ran out of power, freezing");
                }
                let outcome = freeze(world, manager, power, policy);

                if let Some(policy) = policy
                    && !outcome.anchors.is_empty()
                {
                    let tick_cost = sustain_tick_cost(manager, id, power);
                    for player in world.players() {
                        if policy.consume(world, &player, tick_cost) {
                            log::debug!("Player {} sustains dimension {id}", player.uuid);
                        }
                    }
                }
            } else if balance > 0 && self.frozen.remove(&id) {
                log::info!("Dimension {id} is powered again, unfreezing");
                unfreeze(world);
            }
        }
        true
    }
}
