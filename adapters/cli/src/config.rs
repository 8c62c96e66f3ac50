use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use barnstack_core::{CreatureConfig, CreatureTable, PowerUpCatalog, PowerUpConfig, PowerUpKind};
use barnstack_system_pressure_governor::PressureTuning;
use barnstack_system_spawn_director::SpawnTuning;
use serde::{Deserialize, Serialize};

/// Everything the simulation needs besides the command-line knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SimulationConfig {
    /// Viewport width in world units.
    pub(crate) viewport_width: f32,
    /// Viewport height in world units.
    pub(crate) viewport_height: f32,
    /// Horizontal inset of the spawn rail from each viewport edge.
    pub(crate) rail_margin: f32,
    /// Lives at the start of a run.
    pub(crate) starting_lives: u32,
    /// Spawn director tuning.
    pub(crate) spawn: SpawnTuning,
    /// Pressure governor tuning.
    pub(crate) pressure: PressureTuning,
    /// Creature types available to the director.
    pub(crate) creatures: CreatureTable,
    /// Power-up catalogue.
    pub(crate) power_ups: PowerUpCatalog,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            rail_margin: 50.0,
            starting_lives: 3,
            spawn: SpawnTuning::default(),
            pressure: PressureTuning::default(),
            creatures: farm_creatures(),
            power_ups: farm_power_ups(),
        }
    }
}

impl SimulationConfig {
    /// Loads a configuration file, falling back to defaults for omitted keys.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read simulation config at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid simulation config at {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse simulation config toml contents")
    }
}

fn farm_creatures() -> CreatureTable {
    CreatureTable::new()
        .with("chicken", CreatureConfig::weighted(3.0))
        .with("duck", CreatureConfig::weighted(2.0))
        .with("sheep", CreatureConfig::weighted(2.0))
        .with("pig", CreatureConfig::weighted(1.5))
        .with(
            "goat",
            CreatureConfig {
                ability: Some("headbutt".to_owned()),
                ability_cooldown_ms: Some(4_000.0),
                ..CreatureConfig::weighted(1.0)
            },
        )
        .with("cow", CreatureConfig::weighted(0.8))
}

fn farm_power_ups() -> PowerUpCatalog {
    let weights = [
        ("hay_bale", 3.0),
        ("potion", 2.0),
        ("lasso", 1.0),
        ("glue", 0.5),
        ("golden_egg", 0.3),
        ("horseshoe", 0.3),
    ];
    let entries: BTreeMap<PowerUpKind, PowerUpConfig> = weights
        .into_iter()
        .map(|(tag, spawn_weight)| (PowerUpKind::new(tag), PowerUpConfig { spawn_weight }))
        .collect();

    PowerUpCatalog {
        entries,
        heal: Some(PowerUpKind::new("potion")),
        full_restore: Some(PowerUpKind::new("golden_egg")),
        stabilizer: Some(PowerUpKind::new("glue")),
        crowd_control: Some(PowerUpKind::new("lasso")),
        skill_reward: Some(PowerUpKind::new("horseshoe")),
        max_life: Some(PowerUpKind::new("heart")),
    }
}

#[cfg(test)]
mod tests {
    use super::SimulationConfig;
    use barnstack_core::CreatureKind;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SimulationConfig::from_toml(
            r#"
            starting_lives = 5

            [spawn]
            base_spawn_interval_ms = 3000.0
            "#,
        )
        .expect("valid config");

        assert_eq!(config.starting_lives, 5);
        assert_eq!(config.spawn.base_spawn_interval_ms, 3_000.0);
        assert_eq!(config.spawn.min_spawn_interval_ms, 600.0);
        assert_eq!(config.pressure.wobble_scale, 0.03);
        assert!(config.creatures.get(&CreatureKind::new("cow")).is_some());
    }

    #[test]
    fn creature_table_can_be_replaced() {
        let config = SimulationConfig::from_toml(
            r#"
            [creatures.llama]
            has_visual_model = true
            spawn_weight = 1.0
            "#,
        )
        .expect("valid config");

        assert_eq!(config.creatures.spawnable_count(), 1);
        assert!(config.creatures.get(&CreatureKind::new("cow")).is_none());
    }

    #[test]
    fn malformed_file_is_rejected() {
        let error = SimulationConfig::from_toml("starting_lives = \"three\"")
            .expect_err("type mismatch");
        assert!(error.to_string().contains("toml"));
    }
}
