#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive spawn director deciding what falls, where, and how fast.
//!
//! The director is a single-threaded, tick-driven state machine. The host calls
//! [`SpawnDirector::update`] once per frame with a [`PlayerStateSnapshot`] and an
//! explicit random source, and forwards gameplay events through the `on_*`
//! notifications as they happen. Given the same call sequence and the same
//! random samples the director reproduces identical decisions.

mod combo;
mod difficulty;
mod launch;
mod player_model;
mod power_up;
mod rail;
mod strategy;

use std::collections::BTreeMap;

use barnstack_core::{
    clamp_unit, evaluator::StrategySelector, CatchQuality, ConfigError, CreatureKind,
    CreatureTable, LinearRail, PlayerStateSnapshot, PowerUpCatalog, PowerUpDecision, PowerUpKind,
    RailGeometry, RandomSource, SpawnClass, SpawnDecision, SpawnStrategy,
};
use serde::{Deserialize, Serialize};

pub use combo::{
    ComboAnalysis, ComboProgress, ComboShape, FairnessSplit, GamePhase, RemediationTracker,
    HELPFUL_THRESHOLD,
};
pub use difficulty::target_difficulty;
pub use player_model::PlayerModel;

use combo::pick_creature;
use difficulty::DifficultyCurve;
use launch::{pick_behavior, target_bias, Launch};
use player_model::PlayerTracker;
use power_up::{PowerUpContext, PowerUpPlanner};
use rail::{is_imminent, TornadoRail};
use strategy::{StrategyContext, SPAWN_STRATEGIES};

const MERCY_LIVES: u32 = 1;
const MERCY_FRUSTRATION: f32 = 0.6;
const BANK_DEBT_PER_CREATURE: f32 = 0.05;

/// Tuning knobs of the spawn director.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Spawn interval at zero difficulty; the slowest cadence.
    pub base_spawn_interval_ms: f32,
    /// Spawn interval at full difficulty; the fastest cadence.
    pub min_spawn_interval_ms: f32,
    /// Minimum time between power-ups unless remediation owes one.
    pub power_up_cooldown_ms: f32,
    /// Multiplier applied to the spawn gate while mercy mode is active.
    pub mercy_gate_multiplier: f32,
    /// Angular speed of the idle patrol sweep in radians per second.
    pub patrol_speed: f32,
    /// Trailing window over which perfect catches are counted.
    pub perfect_window_ms: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            base_spawn_interval_ms: 2_200.0,
            min_spawn_interval_ms: 600.0,
            power_up_cooldown_ms: 8_000.0,
            mercy_gate_multiplier: 1.5,
            patrol_speed: 0.8,
            perfect_window_ms: 10_000.0,
        }
    }
}

/// Decisions produced by a single tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TickDecisions {
    /// Creature to spawn, if the spawn gate opened this tick.
    pub spawn: Option<SpawnDecision>,
    /// Power-up to spawn, if one was granted this tick.
    pub power_up: Option<PowerUpDecision>,
}

/// Most likely next drop and how it relates to the combos on the stack.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DropPreview {
    /// Creature type expected next.
    pub creature: CreatureKind,
    /// Its classification against the current stack.
    pub classification: SpawnClass,
}

/// Adaptive pacing controller for creature and power-up spawns.
#[derive(Debug)]
pub struct SpawnDirector<G = LinearRail> {
    tuning: SpawnTuning,
    creatures: CreatureTable,
    power_ups: PowerUpCatalog,
    geometry: G,
    player: PlayerTracker,
    difficulty: DifficultyCurve,
    selector: StrategySelector<SpawnStrategy>,
    rail: TornadoRail,
    remediation: RemediationTracker,
    planner: PowerUpPlanner,
    compensation_owed: bool,
    spawn_timer_ms: f32,
    mercy_mode: bool,
    intensity: f32,
    level: u32,
    composition: BTreeMap<CreatureKind, u32>,
}

impl<G> SpawnDirector<G>
where
    G: RailGeometry,
{
    /// Creates a director, validating the configuration up front.
    pub fn new(
        tuning: SpawnTuning,
        creatures: CreatureTable,
        power_ups: PowerUpCatalog,
        geometry: G,
    ) -> Result<Self, ConfigError> {
        let base = tuning.base_spawn_interval_ms;
        let min = tuning.min_spawn_interval_ms;
        if !(min > 0.0 && min <= base) {
            return Err(ConfigError::InvalidSpawnInterval {
                base_ms: base,
                min_ms: min,
            });
        }
        if creatures.spawnable_count() == 0 {
            return Err(ConfigError::NoSpawnableCreatures);
        }

        Ok(Self {
            player: PlayerTracker::new(tuning.perfect_window_ms),
            difficulty: DifficultyCurve::new(base, min),
            tuning,
            creatures,
            power_ups,
            geometry,
            selector: StrategySelector::new(SpawnStrategy::BuildPressure),
            rail: TornadoRail::default(),
            remediation: RemediationTracker::default(),
            planner: PowerUpPlanner::default(),
            compensation_owed: false,
            spawn_timer_ms: 0.0,
            mercy_mode: false,
            intensity: 0.0,
            level: 1,
            composition: BTreeMap::new(),
        })
    }

    /// Advances the director by `dt_ms` and returns this tick's decisions.
    pub fn update<R>(
        &mut self,
        dt_ms: f32,
        snapshot: &PlayerStateSnapshot,
        rng: &mut R,
    ) -> TickDecisions
    where
        R: RandomSource + ?Sized,
    {
        let dt_ms = dt_ms.max(0.0);

        self.player.observe(snapshot);
        let model = *self.player.model();
        self.difficulty.update(snapshot, model.skill());
        self.mercy_mode = snapshot.lives <= MERCY_LIVES || model.frustration() > MERCY_FRUSTRATION;
        self.intensity = clamp_unit(
            0.5 * self.difficulty.difficulty()
                + 0.3 * (snapshot.stack_height as f32 / 12.0).min(1.0)
                + 0.2 * (snapshot.active_creatures as f32 / 5.0).min(1.0),
        );
        self.level = snapshot.level;
        self.composition.clone_from(&snapshot.stack_composition);

        let context = StrategyContext {
            skill: model.skill(),
            frustration: model.frustration(),
            engagement: model.engagement(),
            difficulty: self.difficulty.difficulty(),
            intensity: self.intensity,
            stack_height: snapshot.stack_height,
            banked_creatures: snapshot.banked_creatures,
            lives: snapshot.lives,
            combo: snapshot.combo,
            recent_misses: snapshot.recent_misses,
            recent_perfects: snapshot.recent_perfects.max(self.player.recent_perfects()),
            power_up_debt: self.planner.debt(),
        };
        if let Some(transition) = self.selector.evaluate(&SPAWN_STRATEGIES, &context, dt_ms) {
            tracing::debug!(
                from = transition.from.as_str(),
                to = transition.to.as_str(),
                "spawn strategy changed"
            );
            if transition.to == SpawnStrategy::BuildPressure {
                self.rail.reset_pressure_direction();
            }
        }

        self.rail.drift_pressure(rng);
        self.spawn_timer_ms += dt_ms;

        let spawn = if self.spawn_timer_ms >= self.effective_spawn_gate_ms() {
            self.emit_spawn(dt_ms, snapshot, rng)
        } else {
            let progress = self.spawn_progress();
            self.rail.smooth(dt_ms, progress, self.tuning.patrol_speed);
            None
        };

        self.planner.advance(dt_ms);
        let power_up = self.planner.decide(
            &PowerUpContext {
                snapshot,
                strategy: self.selector.active(),
                skill: model.skill(),
                frustration: model.frustration(),
                compensation: self.compensation_owed,
            },
            &self.power_ups,
            self.tuning.power_up_cooldown_ms,
            rng,
        );
        if let Some(decision) = &power_up {
            self.compensation_owed = false;
            tracing::trace!(kind = %decision.kind, x = decision.position_x, "power-up granted");
        }

        self.player.advance(dt_ms);
        TickDecisions { spawn, power_up }
    }

    fn emit_spawn<R>(
        &mut self,
        dt_ms: f32,
        snapshot: &PlayerStateSnapshot,
        rng: &mut R,
    ) -> Option<SpawnDecision>
    where
        R: RandomSource + ?Sized,
    {
        let strategy = self.selector.active();
        let difficulty = self.difficulty.difficulty();
        let player_t = self.geometry.world_x_to_rail_t(snapshot.player_x);

        self.rail.retarget(strategy, player_t, difficulty, rng);
        self.rail.smooth(dt_ms, 1.0, self.tuning.patrol_speed);
        self.spawn_timer_ms = 0.0;

        let pick = pick_creature(
            &self.creatures,
            &snapshot.stack_composition,
            snapshot.level,
            &mut self.remediation,
            rng,
        )?;
        if pick.class != SpawnClass::Disruptive {
            self.compensation_owed = false;
        } else if pick.starved {
            tracing::debug!("remediation found no helpful creature; owing a power-up");
            self.compensation_owed = true;
        }

        let decision = self.launch(pick.kind, pick.class, snapshot, rng);
        tracing::trace!(
            creature = %decision.creature,
            behavior = decision.behavior.tag(),
            rail_t = decision.rail_t,
            class = ?decision.classification,
            "spawn emitted"
        );
        Some(decision)
    }

    fn launch<R>(
        &self,
        creature: CreatureKind,
        classification: SpawnClass,
        snapshot: &PlayerStateSnapshot,
        rng: &mut R,
    ) -> SpawnDecision
    where
        R: RandomSource + ?Sized,
    {
        let strategy = self.selector.active();
        let difficulty = self.difficulty.difficulty();
        let rail_t = self.rail.rail_t();
        let position_x = self.geometry.rail_t_to_world_x(rail_t);

        let bias = target_bias(difficulty, strategy, self.mercy_mode);
        let behavior = pick_behavior(difficulty, strategy, self.mercy_mode, rng);
        let (velocity_x, velocity_y) = Launch {
            difficulty,
            strategy,
            mercy_mode: self.mercy_mode,
            target_bias: bias,
            spawn_x: position_x,
            player_x: snapshot.player_x,
            viewport_width: snapshot.viewport_width,
        }
        .velocity(rng);

        SpawnDecision {
            position_x,
            rail_t,
            creature,
            behavior,
            velocity_x,
            velocity_y,
            target_bias: bias,
            classification,
            strategy,
        }
    }

    /// Spawns a specific creature type at the indicator's current position.
    ///
    /// Intended for scripted drops. The spawn timer and the remediation tracker
    /// are left untouched.
    pub fn spawn_creature<R>(
        &self,
        creature: &CreatureKind,
        snapshot: &PlayerStateSnapshot,
        rng: &mut R,
    ) -> Result<SpawnDecision, ConfigError>
    where
        R: RandomSource + ?Sized,
    {
        let _ = self.creatures.require_spawnable(creature)?;
        let classification = ComboAnalysis::analyze(&snapshot.stack_composition, &self.creatures)
            .classify(creature);
        Ok(self.launch(creature.clone(), classification, snapshot, rng))
    }

    /// Records a successful catch.
    pub fn on_animal_caught(&mut self, quality: CatchQuality) {
        self.player.caught(quality);
    }

    /// Records a creature that hit the ground.
    pub fn on_animal_missed(&mut self) {
        self.player.missed();
    }

    /// Records a stack collapse.
    pub fn on_stack_topple(&mut self) {
        self.player.toppled();
    }

    /// Records a successful banking of `count` creatures.
    pub fn on_bank_success(&mut self, count: u32) {
        self.player.banked();
        self.planner.add_debt(count as f32 * BANK_DEBT_PER_CREATURE);
    }

    /// Records a level-up.
    pub fn on_level_up(&mut self, level: u32) {
        tracing::debug!(level, "level up");
        self.player.levelled_up();
    }

    /// Smoothed difficulty in `[0, 1]`.
    #[must_use]
    pub fn difficulty(&self) -> f32 {
        self.difficulty.difficulty()
    }

    /// Instantaneous difficulty target in `[0, 1]`.
    #[must_use]
    pub fn target_difficulty(&self) -> f32 {
        self.difficulty.target()
    }

    /// Spawn interval derived from difficulty, within the configured bounds.
    #[must_use]
    pub fn spawn_interval_ms(&self) -> f32 {
        self.difficulty.spawn_interval_ms()
    }

    /// Time the spawn timer must reach before the next drop, including mercy slack.
    #[must_use]
    pub fn effective_spawn_gate_ms(&self) -> f32 {
        let interval = self.spawn_interval_ms();
        if self.mercy_mode {
            interval * self.tuning.mercy_gate_multiplier
        } else {
            interval
        }
    }

    fn spawn_progress(&self) -> f32 {
        let gate = self.effective_spawn_gate_ms();
        if gate <= 0.0 {
            return 1.0;
        }
        clamp_unit(self.spawn_timer_ms / gate)
    }

    /// Active strategy.
    #[must_use]
    pub fn strategy(&self) -> SpawnStrategy {
        self.selector.active()
    }

    /// Name of the active strategy.
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.selector.active().as_str()
    }

    /// Current player model.
    #[must_use]
    pub fn player_model(&self) -> &PlayerModel {
        self.player.model()
    }

    /// Whether low lives or high frustration put the director in mercy mode.
    #[must_use]
    pub fn is_mercy_mode(&self) -> bool {
        self.mercy_mode
    }

    /// Combined pacing intensity in `[0, 1]`.
    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Rail parameter of the threat indicator.
    #[must_use]
    pub fn rail_t(&self) -> f32 {
        self.rail.rail_t()
    }

    /// Strategic rail target chosen at the most recent drop.
    #[must_use]
    pub fn target_rail_t(&self) -> f32 {
        self.rail.target_t()
    }

    /// World position of the threat indicator.
    #[must_use]
    pub fn rail_world_x(&self) -> f32 {
        self.geometry.rail_t_to_world_x(self.rail.rail_t())
    }

    /// Whether the next drop is imminent.
    #[must_use]
    pub fn is_drop_imminent(&self) -> bool {
        is_imminent(self.spawn_progress())
    }

    /// Power-up debt accumulated from banking.
    #[must_use]
    pub fn power_up_debt(&self) -> f32 {
        self.planner.debt()
    }

    /// Type of the most recent power-up decision.
    #[must_use]
    pub fn last_power_up(&self) -> Option<&PowerUpKind> {
        self.planner.last_kind()
    }

    /// Whether a compensating power-up is owed and may bypass the cooldown.
    #[must_use]
    pub fn is_compensation_owed(&self) -> bool {
        self.compensation_owed
    }

    /// Remediation state and classification history.
    #[must_use]
    pub fn remediation(&self) -> &RemediationTracker {
        &self.remediation
    }

    /// Most likely next creature type, computed from cached state without randomness.
    #[must_use]
    pub fn drop_preview(&self) -> Option<DropPreview> {
        let analysis = ComboAnalysis::analyze(&self.composition, &self.creatures);
        if analysis.is_stack_empty() {
            let creature = heaviest(&self.creatures, self.creatures.spawnable().map(|(k, _)| k))?;
            return Some(DropPreview {
                creature,
                classification: SpawnClass::Neutral,
            });
        }

        let helpful = analysis.kinds_in(SpawnClass::Helpful, &self.creatures);
        let disruptive = analysis.kinds_in(SpawnClass::Disruptive, &self.creatures);
        let split = GamePhase::from_level(self.level).fairness();

        let bucket = if self.remediation.is_active() {
            &helpful
        } else {
            let helpful_mass = if helpful.is_empty() { 0.0 } else { split.helpful };
            let disruptive_mass = if disruptive.is_empty() {
                0.0
            } else {
                split.disruptive
            };
            if helpful_mass >= split.neutral && helpful_mass >= disruptive_mass {
                &helpful
            } else if disruptive_mass > split.neutral {
                &disruptive
            } else {
                let creature =
                    heaviest(&self.creatures, self.creatures.spawnable().map(|(k, _)| k))?;
                let classification = analysis.classify(&creature);
                return Some(DropPreview {
                    creature,
                    classification,
                });
            }
        };

        let creature = heaviest(&self.creatures, bucket.iter())
            .or_else(|| heaviest(&self.creatures, self.creatures.spawnable().map(|(k, _)| k)))?;
        let classification = analysis.classify(&creature);
        Some(DropPreview {
            creature,
            classification,
        })
    }
}

/// Highest-weight spawnable candidate; ties resolve to tag order.
fn heaviest<'a>(
    table: &CreatureTable,
    candidates: impl Iterator<Item = &'a CreatureKind>,
) -> Option<CreatureKind> {
    let mut best: Option<(&CreatureKind, f32)> = None;
    for kind in candidates {
        let Some(config) = table.get(kind).filter(|config| config.is_spawnable()) else {
            continue;
        };
        let replace = match best {
            None => true,
            Some((_, weight)) => config.spawn_weight > weight,
        };
        if replace {
            best = Some((kind, config.spawn_weight));
        }
    }
    best.map(|(kind, _)| kind.clone())
}
