//! Dimension configuration: upkeep/power settings and the dimlet cost rules.
use std::{collections::BTreeMap, fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/rift_config.json5");

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid json5 for this schema.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Top level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionConfig {
    /// Upkeep and freezing settings.
    pub power: PowerConfig,
    /// Cost table used to price descriptors, synced to clients.
    pub rules: DimletRules,
}

/// Upkeep and freezing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Keep-alive radius around sustaining players. Non-positive disables it.
    pub phased_field_range: i32,
    /// `-1` disables upkeep charges against sustaining items.
    pub dimension_difficulty: i32,
    /// Scale the sustaining cost with the dimension's own upkeep.
    pub enable_dynamic_phase_cost: bool,
    /// Multiplier used when `enable_dynamic_phase_cost` is set.
    pub dynamic_phase_cost_amount: f64,
    /// Flat per-tick charge used otherwise.
    pub phased_field_consume_per_tick: i64,
    /// Host ticks between two upkeep passes.
    pub max_ticks: i64,
    /// Freeze dimensions whose energy ran out.
    pub freeze_unpowered: bool,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            phased_field_range: 5,
            dimension_difficulty: 0,
            enable_dynamic_phase_cost: false,
            dynamic_phase_cost_amount: 0.05,
            phased_field_consume_per_tick: 100,
            max_ticks: 10,
            freeze_unpowered: true,
        }
    }
}

/// Per-kind costs of recipe entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimletRules {
    /// Cost every dimension pays regardless of its recipe.
    pub base_cost: i32,
    /// Cost of entries whose kind has no explicit cost.
    pub default_entry_cost: i32,
    /// Cost per entry kind.
    pub costs: BTreeMap<String, i32>,
}

impl DimletRules {
    /// Cost of a single recipe entry of the given kind.
    #[must_use]
    pub fn cost_of(&self, kind: &str) -> i32 {
        self.costs
            .get(kind)
            .copied()
            .unwrap_or(self.default_entry_cost)
    }

    /// Serializes the rules for `CSyncRules`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses rules received from the server.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for DimletRules {
    fn default() -> Self {
        let costs = [
            ("biome", 10),
            ("terrain", 50),
            ("feature", 25),
            ("structure", 100),
            ("sky", 5),
            ("time", 5),
            ("weather", 5),
            ("effect", 40),
        ]
        .into_iter()
        .map(|(kind, cost)| (kind.to_string(), cost))
        .collect();

        Self {
            base_cost: 0,
            default_entry_cost: 10,
            costs,
        }
    }
}

impl DimensionConfig {
    /// Parses and validates a json5 document.
    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        let config: DimensionConfig = serde_json5::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config at `path`, writing the packaged default there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let text = fs::read_to_string(path)?;
            return Self::from_json5(&text);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        log::info!("Wrote default dimension config to {}", path.display());
        Ok(Self::default())
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.power.max_ticks <= 0 {
            return Err(ConfigError::Invalid("max_ticks must be positive"));
        }
        if self.power.dynamic_phase_cost_amount < 0.0 {
            return Err(ConfigError::Invalid(
                "dynamic_phase_cost_amount must not be negative",
            ));
        }
        if self.power.phased_field_consume_per_tick < 0 {
            return Err(ConfigError::Invalid(
                "phased_field_consume_per_tick must not be negative",
            ));
        }
        if self.rules.base_cost < 0
            || self.rules.default_entry_cost < 0
            || self.rules.costs.values().any(|cost| *cost < 0)
        {
            return Err(ConfigError::Invalid("dimlet costs must not be negative"));
        }
        Ok(())
    }
}
