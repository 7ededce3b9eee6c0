//! Who may keep entities of an unpowered dimension running.
use crate::config::PowerConfig;
use crate::dimension::freeze::{FreezableWorld, PlayerSnapshot};

/// Decides whether a player's sustaining item covers a dimension's upkeep.
///
/// Players without a sustaining item never qualify.
pub trait SustainPolicy {
    /// Charge needed to cover one upkeep pass of a dimension costing `tick_cost` per tick.
    fn required_charge(&self, tick_cost: i64) -> i64;

    /// Checks the player's charge without consuming it.
    fn can_sustain(&self, player: &PlayerSnapshot, tick_cost: i64) -> bool {
        player
            .sustain_charge
            .is_some_and(|charge| charge >= self.required_charge(tick_cost))
    }

    /// Checks and, if sufficient, extracts the charge from the player's item.
    fn consume(
        &self,
        world: &mut dyn FreezableWorld,
        player: &PlayerSnapshot,
        tick_cost: i64,
    ) -> bool {
        if !self.can_sustain(player, tick_cost) {
            return false;
        }
        world.drain_sustain_charge(player.uuid, self.required_charge(tick_cost))
    }
}

/// Sustaining by phased field generators.
///
/// An item has to hold the charge of a full upkeep pass (`max_ticks` ticks).
/// With dynamic cost the charge scales with the dimension's upkeep, otherwise
/// a flat per-tick amount applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasedFieldPolicy {
    max_ticks: i64,
    dynamic_amount: Option<f64>,
    consume_per_tick: i64,
}

impl PhasedFieldPolicy {
    /// Builds the policy from the power settings.
    #[must_use]
    pub fn new(config: &PowerConfig) -> Self {
        Self {
            max_ticks: config.max_ticks,
            dynamic_amount: config
                .enable_dynamic_phase_cost
                .then_some(config.dynamic_phase_cost_amount),
            consume_per_tick: config.phased_field_consume_per_tick,
        }
    }
}

impl SustainPolicy for PhasedFieldPolicy {
    fn required_charge(&self, tick_cost: i64) -> i64 {
        match self.dynamic_amount {
            Some(amount) => (self.max_ticks as f64 * tick_cost as f64 * amount) as i64,
            None => self.max_ticks.saturating_mul(self.consume_per_tick),
        }
    }
}
