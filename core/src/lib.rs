#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Barnstack pacing engine.
//!
//! This crate defines the value surface that connects the host game loop with
//! the pure pacing controllers. The host samples its entity storage into a
//! [`PlayerStateSnapshot`] every frame, hands it to the controllers together
//! with an explicit [`RandomSource`] handle, and receives plain decision values
//! ([`SpawnDecision`], [`PowerUpDecision`]) in return. Controllers never touch
//! entities, rendering, or persistence.

mod catalog;
pub mod evaluator;
mod rail;
mod random;
pub mod testing;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use catalog::{
    ConfigError, CreatureConfig, CreatureKind, CreatureTable, PowerUpCatalog, PowerUpConfig,
    PowerUpKind,
};
pub use rail::{LinearRail, RailGeometry};
pub use random::{RandomSource, SeededRandom};

/// Per-tick view of the player and stack, produced by the host game loop.
///
/// Durations are expressed in milliseconds. The value is immutable for the
/// duration of a tick and owned by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStateSnapshot {
    /// Horizontal world position of the player.
    pub player_x: f32,
    /// Vertical world position of the player.
    pub player_y: f32,
    /// Number of creatures currently stacked on the player.
    pub stack_height: u32,
    /// Remaining lives.
    pub lives: u32,
    /// Maximum number of lives the player can hold.
    pub max_lives: u32,
    /// Current score.
    pub score: u64,
    /// Current combo counter.
    pub combo: u32,
    /// Elapsed game time.
    pub game_time_ms: f32,
    /// Time since the host last spawned a creature.
    pub time_since_last_spawn_ms: f32,
    /// Time since the host last spawned a power-up.
    pub time_since_last_power_up_ms: f32,
    /// Time since the player last missed a creature.
    pub time_since_last_miss_ms: f32,
    /// Time since the player last landed a perfect catch.
    pub time_since_last_perfect_ms: f32,
    /// Catches over the trailing window.
    pub recent_catches: u32,
    /// Misses over the trailing window.
    pub recent_misses: u32,
    /// Perfect catches over the trailing window.
    pub recent_perfects: u32,
    /// Catch rate over the trailing window, in `[0, 1]`.
    pub catch_rate: f32,
    /// Falling creatures currently alive.
    pub active_creatures: u32,
    /// Power-ups currently alive.
    pub active_power_ups: u32,
    /// Viewport width in world units.
    pub viewport_width: f32,
    /// Viewport height in world units.
    pub viewport_height: f32,
    /// Current level, starting at 1.
    pub level: u32,
    /// Creatures banked so far.
    pub banked_creatures: u32,
    /// Count of each creature type currently in the stack. Empty when unknown.
    pub stack_composition: BTreeMap<CreatureKind, u32>,
}

impl Default for PlayerStateSnapshot {
    fn default() -> Self {
        Self {
            player_x: 400.0,
            player_y: 560.0,
            stack_height: 0,
            lives: 3,
            max_lives: 3,
            score: 0,
            combo: 0,
            game_time_ms: 0.0,
            time_since_last_spawn_ms: 0.0,
            time_since_last_power_up_ms: 0.0,
            time_since_last_miss_ms: 0.0,
            time_since_last_perfect_ms: 0.0,
            recent_catches: 0,
            recent_misses: 0,
            recent_perfects: 0,
            catch_rate: 0.5,
            active_creatures: 0,
            active_power_ups: 0,
            viewport_width: 800.0,
            viewport_height: 600.0,
            level: 1,
            banked_creatures: 0,
            stack_composition: BTreeMap::new(),
        }
    }
}

/// Quality grade reported by the host when a creature lands on the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchQuality {
    /// Centred landing.
    Perfect,
    /// Slightly off-centre landing.
    Good,
    /// Any other successful catch.
    Normal,
}

/// Movement pattern attached to a spawned creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    /// Straight fall.
    Normal,
    /// Homes in on the player.
    Seeker,
    /// Accelerates sharply once aligned with the player.
    Dive,
    /// Oscillates horizontally.
    Zigzag,
    /// Drifts away from the player.
    Evader,
    /// Falls slowly.
    Floater,
}

impl BehaviorKind {
    /// Stable tag consumed by the movement collaborator.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Seeker => "seeker",
            Self::Dive => "dive",
            Self::Zigzag => "zigzag",
            Self::Evader => "evader",
            Self::Floater => "floater",
        }
    }
}

/// Whether a creature advances the combos currently in progress on the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnClass {
    /// Advances at least one likely combo.
    Helpful,
    /// Advances only unlikely combos.
    Neutral,
    /// Advances no combo at all.
    Disruptive,
}

/// Pacing strategy selected by the spawn director.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnStrategy {
    /// Keep the stack growing and the player busy.
    BuildPressure,
    /// Ease off after a spike of intensity or frustration.
    ReleaseTension,
    /// Push a skilled, engaged player.
    Challenge,
    /// Help a struggling player.
    Mercy,
    /// Pay out accumulated power-up debt.
    Reward,
}

impl SpawnStrategy {
    /// Stable name used by debug surfaces and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BuildPressure => "build_pressure",
            Self::ReleaseTension => "release_tension",
            Self::Challenge => "challenge",
            Self::Mercy => "mercy",
            Self::Reward => "reward",
        }
    }
}

/// Operating mode selected by the pressure governor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureMode {
    /// Constant force proportional to stack height.
    Steady,
    /// Periodic tension spikes.
    Pulse,
    /// Reduced force while the player is in distress.
    Mercy,
    /// Sinusoidal force with random spikes.
    Chaos,
}

impl PressureMode {
    /// Stable name used by debug surfaces and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::Pulse => "pulse",
            Self::Mercy => "mercy",
            Self::Chaos => "chaos",
        }
    }
}

/// Instruction for the spawning collaborator to create a falling creature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnDecision {
    /// World-space horizontal spawn position; equal to the indicator position.
    pub position_x: f32,
    /// Rail parameter of the spawn point in `[0, 1]`.
    pub rail_t: f32,
    /// Creature type to instantiate.
    pub creature: CreatureKind,
    /// Movement pattern to attach.
    pub behavior: BehaviorKind,
    /// Initial horizontal velocity.
    pub velocity_x: f32,
    /// Initial vertical velocity.
    pub velocity_y: f32,
    /// How strongly downstream physics should steer toward the player, in `[0, 1]`.
    pub target_bias: f32,
    /// Combo classification of the creature against the current stack.
    pub classification: SpawnClass,
    /// Strategy active when the decision was made.
    pub strategy: SpawnStrategy,
}

/// Instruction for the spawning collaborator to create a power-up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpDecision {
    /// Power-up type to instantiate.
    pub kind: PowerUpKind,
    /// World-space horizontal position.
    pub position_x: f32,
    /// World-space vertical position.
    pub position_y: f32,
}

/// Clamps a value into `[0, 1]`, mapping NaN to zero.
#[must_use]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Linear interpolation between `from` and `to`.
#[must_use]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Logarithmic growth curve normalised so that `value == cap` maps to 1.
///
/// Values are clamped into `[0, cap]` first, which keeps the curve monotone and
/// bounded in `[0, 1]`.
#[must_use]
pub fn log_curve(value: f32, cap: f32) -> f32 {
    if cap <= 0.0 {
        return 0.0;
    }
    let bounded = value.clamp(0.0, cap);
    clamp_unit((1.0 + bounded).log10() / (1.0 + cap).log10())
}
