//! Injected creature and power-up configuration tables.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RandomSource;

/// Tag identifying a creature type in the configuration table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureKind(String);

impl CreatureKind {
    /// Creates a creature tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag identifying a power-up type in the catalogue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerUpKind(String);

impl PowerUpKind {
    /// Creates a power-up tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised when the injected configuration cannot satisfy a request.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The creature type is absent from the table.
    #[error("creature type `{kind}` is not configured")]
    UnknownCreature {
        /// Requested creature type.
        kind: CreatureKind,
    },
    /// The creature type has no visual model and cannot be spawned.
    #[error("creature type `{kind}` has no visual model")]
    MissingVisualModel {
        /// Requested creature type.
        kind: CreatureKind,
    },
    /// The creature type is disabled through a non-positive spawn weight.
    #[error("creature type `{kind}` has a non-positive spawn weight")]
    ZeroSpawnWeight {
        /// Requested creature type.
        kind: CreatureKind,
    },
    /// The table contains no spawnable creature at all.
    #[error("creature table contains no spawnable creature types")]
    NoSpawnableCreatures,
    /// Spawn interval bounds are inverted or non-positive.
    #[error("invalid spawn interval bounds: base {base_ms} ms, minimum {min_ms} ms")]
    InvalidSpawnInterval {
        /// Configured base (slowest) interval.
        base_ms: f32,
        /// Configured minimum (fastest) interval.
        min_ms: f32,
    },
}

/// Configuration of a single creature type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatureConfig {
    /// Whether the renderer has a model for this type.
    pub has_visual_model: bool,
    /// Relative spawn weight; non-positive disables the type.
    pub spawn_weight: f32,
    /// Optional ability tag carried by the creature.
    #[serde(default)]
    pub ability: Option<String>,
    /// Cooldown of the ability, if any.
    #[serde(default)]
    pub ability_cooldown_ms: Option<f32>,
}

impl CreatureConfig {
    /// Creates a model-bearing creature entry without an ability.
    #[must_use]
    pub fn weighted(spawn_weight: f32) -> Self {
        Self {
            has_visual_model: true,
            spawn_weight,
            ability: None,
            ability_cooldown_ms: None,
        }
    }

    /// Reports whether the director may spawn this type.
    #[must_use]
    pub fn is_spawnable(&self) -> bool {
        self.has_visual_model && self.spawn_weight.is_finite() && self.spawn_weight > 0.0
    }
}

/// Mapping from creature type to its configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureTable {
    entries: BTreeMap<CreatureKind, CreatureConfig>,
}

impl CreatureTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry, returning the previous configuration.
    pub fn insert(&mut self, kind: CreatureKind, config: CreatureConfig) -> Option<CreatureConfig> {
        self.entries.insert(kind, config)
    }

    /// Builder-style variant of [`CreatureTable::insert`].
    #[must_use]
    pub fn with(mut self, kind: impl Into<String>, config: CreatureConfig) -> Self {
        let _ = self.insert(CreatureKind::new(kind), config);
        self
    }

    /// Looks up a creature type.
    #[must_use]
    pub fn get(&self, kind: &CreatureKind) -> Option<&CreatureConfig> {
        self.entries.get(kind)
    }

    /// Returns the configuration of a spawnable type or the reason it cannot spawn.
    pub fn require_spawnable(&self, kind: &CreatureKind) -> Result<&CreatureConfig, ConfigError> {
        let config = self
            .entries
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownCreature { kind: kind.clone() })?;
        if !config.has_visual_model {
            return Err(ConfigError::MissingVisualModel { kind: kind.clone() });
        }
        if !config.is_spawnable() {
            return Err(ConfigError::ZeroSpawnWeight { kind: kind.clone() });
        }
        Ok(config)
    }

    /// Iterates spawnable types in tag order.
    pub fn spawnable(&self) -> impl Iterator<Item = (&CreatureKind, &CreatureConfig)> {
        self.entries.iter().filter(|(_, config)| config.is_spawnable())
    }

    /// Number of spawnable types.
    #[must_use]
    pub fn spawnable_count(&self) -> usize {
        self.spawnable().count()
    }

    /// Picks among all spawnable types proportionally to their spawn weight.
    pub fn pick_weighted<R>(&self, rng: &mut R) -> Option<CreatureKind>
    where
        R: RandomSource + ?Sized,
    {
        self.pick_weighted_from(self.spawnable().map(|(kind, _)| kind), rng)
    }

    /// Picks among `candidates` proportionally to their spawn weight.
    ///
    /// Candidates that are not spawnable are ignored. Exactly one random draw is
    /// consumed whenever at least one candidate survives the filter.
    pub fn pick_weighted_from<'a, I, R>(&self, candidates: I, rng: &mut R) -> Option<CreatureKind>
    where
        I: IntoIterator<Item = &'a CreatureKind>,
        R: RandomSource + ?Sized,
    {
        let weighted: Vec<(&CreatureKind, f32)> = candidates
            .into_iter()
            .filter_map(|kind| {
                self.entries
                    .get(kind)
                    .filter(|config| config.is_spawnable())
                    .map(|config| (kind, config.spawn_weight))
            })
            .collect();

        let total: f32 = weighted.iter().map(|(_, weight)| weight).sum();
        let (last, _) = weighted.last()?;

        let mut roll = rng.next() * total;
        for (kind, weight) in &weighted {
            if roll < *weight {
                return Some((*kind).clone());
            }
            roll -= weight;
        }
        Some((*last).clone())
    }
}

/// Configuration of a single power-up type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpConfig {
    /// Relative weight used by the fallback pick.
    pub spawn_weight: f32,
}

/// Power-up catalogue with the roles consulted by the priority cascade.
///
/// Each role is optional; a missing role skips its step in the cascade.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpCatalog {
    /// Every power-up type eligible for the weighted fallback.
    pub entries: BTreeMap<PowerUpKind, PowerUpConfig>,
    /// Restores a single life.
    pub heal: Option<PowerUpKind>,
    /// Restores every life.
    pub full_restore: Option<PowerUpKind>,
    /// Rare item offered when the stack grows tall.
    pub stabilizer: Option<PowerUpKind>,
    /// Item offered when many creatures are falling at once.
    pub crowd_control: Option<PowerUpKind>,
    /// Item offered to skilled players on a long combo.
    pub skill_reward: Option<PowerUpKind>,
    /// Rare item raising the life cap.
    pub max_life: Option<PowerUpKind>,
}

impl PowerUpCatalog {
    /// Picks among all entries proportionally to their spawn weight.
    pub fn pick_weighted<R>(&self, rng: &mut R) -> Option<PowerUpKind>
    where
        R: RandomSource + ?Sized,
    {
        let total: f32 = self
            .entries
            .values()
            .map(|config| config.spawn_weight.max(0.0))
            .sum();
        if total <= 0.0 {
            return None;
        }

        let mut roll = rng.next() * total;
        let mut fallback = None;
        for (kind, config) in &self.entries {
            let weight = config.spawn_weight.max(0.0);
            if weight <= 0.0 {
                continue;
            }
            if roll < weight {
                return Some(kind.clone());
            }
            roll -= weight;
            fallback = Some(kind);
        }
        fallback.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CreatureConfig, CreatureKind, CreatureTable};
    use crate::testing::ScriptedRandom;

    fn farm() -> CreatureTable {
        CreatureTable::new()
            .with("chicken", CreatureConfig::weighted(1.0))
            .with("cow", CreatureConfig::weighted(3.0))
            .with(
                "ghost",
                CreatureConfig {
                    has_visual_model: false,
                    spawn_weight: 5.0,
                    ability: None,
                    ability_cooldown_ms: None,
                },
            )
            .with("pig", CreatureConfig::weighted(0.0))
    }

    #[test]
    fn require_spawnable_reports_each_failure() {
        let table = farm();
        assert!(table.require_spawnable(&CreatureKind::new("cow")).is_ok());
        assert_eq!(
            table.require_spawnable(&CreatureKind::new("goat")),
            Err(ConfigError::UnknownCreature {
                kind: CreatureKind::new("goat")
            })
        );
        assert_eq!(
            table.require_spawnable(&CreatureKind::new("ghost")),
            Err(ConfigError::MissingVisualModel {
                kind: CreatureKind::new("ghost")
            })
        );
        assert_eq!(
            table.require_spawnable(&CreatureKind::new("pig")),
            Err(ConfigError::ZeroSpawnWeight {
                kind: CreatureKind::new("pig")
            })
        );
    }

    #[test]
    fn weighted_pick_walks_cumulative_weights() {
        let table = farm();
        // chicken occupies [0, 1), cow occupies [1, 4) of a total weight of 4.
        let mut rng = ScriptedRandom::new(vec![0.1, 0.3, 0.99]);
        assert_eq!(table.pick_weighted(&mut rng), Some(CreatureKind::new("chicken")));
        assert_eq!(table.pick_weighted(&mut rng), Some(CreatureKind::new("cow")));
        assert_eq!(table.pick_weighted(&mut rng), Some(CreatureKind::new("cow")));
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn weighted_pick_ignores_disabled_candidates() {
        let table = farm();
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let candidates = [CreatureKind::new("pig"), CreatureKind::new("ghost")];
        assert_eq!(table.pick_weighted_from(candidates.iter(), &mut rng), None);
        assert_eq!(rng.draws(), 0);
    }
}
