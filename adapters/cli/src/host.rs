//! Headless stand-in for the game loop.
//!
//! The host keeps just enough world state to produce believable snapshots:
//! falling objects, a stack, lives and rolling catch statistics. Catch outcomes
//! are rolled from a per-profile model of the player.

use std::collections::{BTreeMap, VecDeque};

use barnstack_core::{
    BehaviorKind, CatchQuality, CreatureKind, PlayerStateSnapshot, PowerUpCatalog,
    PowerUpDecision, PowerUpKind, RandomSource, SpawnDecision,
};
use barnstack_system_pressure_governor::{FallingThreat, PressureGovernor, PressureSnapshot};
use barnstack_system_spawn_director::SpawnDirector;
use clap::ValueEnum;
use serde::Serialize;

use crate::config::SimulationConfig;

const ROLLING_WINDOW_MS: f32 = 10_000.0;
const FRAME_MS: f32 = 1_000.0 / 60.0;
const CREATURE_HEIGHT: f32 = 24.0;
const POWER_UP_FALL_SPEED: f32 = 2.0;
const PLAYER_SPEED: f32 = 0.5;
const TOPPLE_HEIGHT: u32 = 8;
// Advisory at this height: the governor only yields to danger here once stress
// passes about 0.55, otherwise steady outweighs mercy.
const DANGER_HEIGHT: u32 = 10;
const CREATURES_PER_LEVEL: u32 = 12;

/// Skill level of the simulated player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Profile {
    /// Competent player who banks regularly.
    Steady,
    /// Player who misses often and rarely banks.
    Struggling,
    /// Player who almost never misses and builds tall stacks.
    Expert,
}

impl Profile {
    fn catch_probability(self) -> f32 {
        match self {
            Self::Steady => 0.8,
            Self::Struggling => 0.45,
            Self::Expert => 0.95,
        }
    }

    fn perfect_share(self) -> f32 {
        match self {
            Self::Steady => 0.2,
            Self::Struggling => 0.05,
            Self::Expert => 0.5,
        }
    }

    fn bank_height(self) -> u32 {
        match self {
            Self::Steady => 6,
            Self::Struggling => 4,
            Self::Expert => 10,
        }
    }
}

/// Something the host reports to the log.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub(crate) enum Record {
    /// The director spawned a creature.
    Spawn {
        /// Simulation time.
        t_ms: f32,
        /// Decision as produced by the director.
        #[serde(flatten)]
        decision: SpawnDecision,
    },
    /// The director granted a power-up.
    PowerUp {
        /// Simulation time.
        t_ms: f32,
        /// Decision as produced by the director.
        #[serde(flatten)]
        decision: PowerUpDecision,
    },
    /// The stack collapsed.
    Topple {
        /// Simulation time.
        t_ms: f32,
        /// Height of the stack that fell.
        height: u32,
        /// Lives left after the collapse.
        lives: u32,
    },
}

/// End-of-run statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) elapsed_ms: f32,
    pub(crate) spawns: u32,
    pub(crate) power_ups: u32,
    pub(crate) catches: u32,
    pub(crate) misses: u32,
    pub(crate) topples: u32,
    pub(crate) banked: u32,
    pub(crate) level: u32,
    pub(crate) score: u64,
    pub(crate) game_over: bool,
    pub(crate) final_difficulty: f32,
    pub(crate) final_strategy: &'static str,
    pub(crate) final_pressure_mode: &'static str,
    pub(crate) final_pressure_mode_ms: f32,
    pub(crate) strategy_ticks: BTreeMap<&'static str, u32>,
    pub(crate) pressure_mode_ticks: BTreeMap<&'static str, u32>,
}

#[derive(Clone, Debug)]
enum Payload {
    Creature(CreatureKind),
    PowerUp(PowerUpKind),
}

#[derive(Clone, Debug)]
struct Falling {
    payload: Payload,
    behavior: BehaviorKind,
    x: f32,
    y: f32,
    velocity_x: f32,
    velocity_y: f32,
}

/// Synthetic game loop feeding both pacing controllers.
#[derive(Debug)]
pub(crate) struct SyntheticHost {
    profile: Profile,
    config: SimulationConfig,
    snapshot: PlayerStateSnapshot,
    falling: Vec<Falling>,
    catch_stamps: VecDeque<f32>,
    miss_stamps: VecDeque<f32>,
    perfect_stamps: VecDeque<f32>,
    summary: Summary,
}

impl SyntheticHost {
    pub(crate) fn new(profile: Profile, config: SimulationConfig) -> Self {
        let snapshot = PlayerStateSnapshot {
            player_x: config.viewport_width * 0.5,
            player_y: config.viewport_height - CREATURE_HEIGHT,
            lives: config.starting_lives,
            max_lives: config.starting_lives,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            ..PlayerStateSnapshot::default()
        };
        Self {
            profile,
            config,
            snapshot,
            falling: Vec::new(),
            catch_stamps: VecDeque::new(),
            miss_stamps: VecDeque::new(),
            perfect_stamps: VecDeque::new(),
            summary: Summary {
                level: 1,
                ..Summary::default()
            },
        }
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.snapshot.lives == 0
    }

    /// Runs one frame and returns the records it produced.
    pub(crate) fn tick<R, P, H>(
        &mut self,
        dt_ms: f32,
        director: &mut SpawnDirector,
        governor: &mut PressureGovernor,
        pacing_rng: &mut R,
        pressure_rng: &mut P,
        host_rng: &mut H,
    ) -> Vec<Record>
    where
        R: RandomSource + ?Sized,
        P: RandomSource + ?Sized,
        H: RandomSource + ?Sized,
    {
        let mut records = Vec::new();
        self.advance_clock(dt_ms);

        let decisions = director.update(dt_ms, &self.snapshot, pacing_rng);
        let now = self.snapshot.game_time_ms;
        if let Some(spawn) = decisions.spawn {
            self.summary.spawns += 1;
            self.snapshot.time_since_last_spawn_ms = 0.0;
            self.falling.push(Falling {
                payload: Payload::Creature(spawn.creature.clone()),
                behavior: spawn.behavior,
                x: spawn.position_x,
                y: 0.0,
                velocity_x: spawn.velocity_x,
                velocity_y: spawn.velocity_y,
            });
            records.push(Record::Spawn {
                t_ms: now,
                decision: spawn,
            });
        }
        if let Some(power_up) = decisions.power_up {
            self.summary.power_ups += 1;
            self.snapshot.time_since_last_power_up_ms = 0.0;
            self.falling.push(Falling {
                payload: Payload::PowerUp(power_up.kind.clone()),
                behavior: BehaviorKind::Floater,
                x: power_up.position_x,
                y: power_up.position_y,
                velocity_x: 0.0,
                velocity_y: POWER_UP_FALL_SPEED,
            });
            records.push(Record::PowerUp {
                t_ms: now,
                decision: power_up,
            });
        }

        let threats = self.threats();
        let stack_top = self.stack_top();
        governor.update(
            dt_ms,
            &PressureSnapshot {
                stack_height: self.snapshot.stack_height,
                game_level: self.snapshot.level,
                danger: self.snapshot.stack_height >= DANGER_HEIGHT,
                falling: &threats,
            },
            pressure_rng,
        );

        self.move_objects(dt_ms);
        self.steer_player(dt_ms);
        for object in self.take_landed(stack_top) {
            self.resolve_landing(object, director, governor, host_rng);
        }
        let wobble_force = governor.wobble_force();
        if let Some(topple) = self.maybe_topple(wobble_force, director, governor, host_rng) {
            records.push(topple);
        }
        self.maybe_bank(director);

        *self
            .summary
            .strategy_ticks
            .entry(director.strategy_name())
            .or_insert(0) += 1;
        *self
            .summary
            .pressure_mode_ticks
            .entry(governor.mode_name())
            .or_insert(0) += 1;
        records
    }

    pub(crate) fn finish(
        mut self,
        director: &SpawnDirector,
        governor: &PressureGovernor,
    ) -> Summary {
        self.summary.elapsed_ms = self.snapshot.game_time_ms;
        self.summary.level = self.snapshot.level;
        self.summary.score = self.snapshot.score;
        self.summary.game_over = self.is_game_over();
        self.summary.final_difficulty = director.difficulty();
        self.summary.final_strategy = director.strategy_name();
        self.summary.final_pressure_mode = governor.mode_name();
        self.summary.final_pressure_mode_ms = governor.mode_occupancy_ms();
        self.summary
    }

    fn advance_clock(&mut self, dt_ms: f32) {
        let snapshot = &mut self.snapshot;
        snapshot.game_time_ms += dt_ms;
        snapshot.time_since_last_spawn_ms += dt_ms;
        snapshot.time_since_last_power_up_ms += dt_ms;
        snapshot.time_since_last_miss_ms += dt_ms;
        snapshot.time_since_last_perfect_ms += dt_ms;

        let now = snapshot.game_time_ms;
        for stamps in [
            &mut self.catch_stamps,
            &mut self.miss_stamps,
            &mut self.perfect_stamps,
        ] {
            while stamps.front().is_some_and(|stamp| now - stamp > ROLLING_WINDOW_MS) {
                let _ = stamps.pop_front();
            }
        }
        self.refresh_counters();
    }

    fn refresh_counters(&mut self) {
        let catches = u32::try_from(self.catch_stamps.len()).unwrap_or(u32::MAX);
        let misses = u32::try_from(self.miss_stamps.len()).unwrap_or(u32::MAX);
        let active_creatures = self.count(|payload| matches!(payload, Payload::Creature(_)));
        let active_power_ups = self.count(|payload| matches!(payload, Payload::PowerUp(_)));
        let snapshot = &mut self.snapshot;
        snapshot.recent_catches = catches;
        snapshot.recent_misses = misses;
        snapshot.recent_perfects = u32::try_from(self.perfect_stamps.len()).unwrap_or(u32::MAX);
        snapshot.catch_rate = if catches + misses == 0 {
            0.5
        } else {
            catches as f32 / (catches + misses) as f32
        };
        snapshot.active_creatures = active_creatures;
        snapshot.active_power_ups = active_power_ups;
    }

    fn count(&self, predicate: impl Fn(&Payload) -> bool) -> u32 {
        let count = self
            .falling
            .iter()
            .filter(|object| predicate(&object.payload))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn stack_top(&self) -> f32 {
        self.snapshot.player_y - self.snapshot.stack_height as f32 * CREATURE_HEIGHT
    }

    fn threats(&self) -> Vec<FallingThreat> {
        let target_y = self.stack_top();
        self.falling
            .iter()
            .filter(|object| matches!(object.payload, Payload::Creature(_)))
            .map(|object| FallingThreat {
                behavior: object.behavior,
                y: object.y,
                target_y,
            })
            .collect()
    }

    fn move_objects(&mut self, dt_ms: f32) {
        let frames = dt_ms / FRAME_MS;
        let width = self.snapshot.viewport_width;
        for object in &mut self.falling {
            object.x = (object.x + object.velocity_x * frames).clamp(0.0, width);
            object.y += object.velocity_y * frames;
        }
    }

    fn steer_player(&mut self, dt_ms: f32) {
        let Some(target) = self
            .falling
            .iter()
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .map(|object| object.x)
        else {
            return;
        };
        let step = PLAYER_SPEED * dt_ms;
        let delta = (target - self.snapshot.player_x).clamp(-step, step);
        self.snapshot.player_x =
            (self.snapshot.player_x + delta).clamp(0.0, self.snapshot.viewport_width);
    }

    fn take_landed(&mut self, stack_top: f32) -> Vec<Falling> {
        let (landed, airborne): (Vec<Falling>, Vec<Falling>) = self
            .falling
            .drain(..)
            .partition(|object| object.y >= stack_top);
        self.falling = airborne;
        landed
    }

    fn resolve_landing<H>(
        &mut self,
        object: Falling,
        director: &mut SpawnDirector,
        governor: &mut PressureGovernor,
        host_rng: &mut H,
    ) where
        H: RandomSource + ?Sized,
    {
        let now = self.snapshot.game_time_ms;
        let caught = host_rng.chance(self.profile.catch_probability());
        match object.payload {
            Payload::PowerUp(kind) => {
                if caught {
                    self.apply_power_up(&kind);
                }
            }
            Payload::Creature(kind) if caught => {
                let quality = if host_rng.chance(self.profile.perfect_share()) {
                    self.perfect_stamps.push_back(now);
                    self.snapshot.time_since_last_perfect_ms = 0.0;
                    CatchQuality::Perfect
                } else if host_rng.chance(0.5) {
                    CatchQuality::Good
                } else {
                    CatchQuality::Normal
                };
                self.catch_stamps.push_back(now);
                self.summary.catches += 1;
                self.snapshot.stack_height += 1;
                self.snapshot.combo += 1;
                self.snapshot.score += 10 * u64::from(self.snapshot.combo);
                *self.snapshot.stack_composition.entry(kind).or_insert(0) += 1;
                director.on_animal_caught(quality);
                governor.on_animal_caught(quality);
            }
            Payload::Creature(_) => {
                self.miss_stamps.push_back(now);
                self.summary.misses += 1;
                self.snapshot.combo = 0;
                self.snapshot.time_since_last_miss_ms = 0.0;
                director.on_animal_missed();
                governor.on_animal_missed();
            }
        }
        self.refresh_counters();
    }

    fn apply_power_up(&mut self, kind: &PowerUpKind) {
        let catalog: &PowerUpCatalog = &self.config.power_ups;
        let snapshot = &mut self.snapshot;
        if catalog.heal.as_ref() == Some(kind) {
            snapshot.lives = (snapshot.lives + 1).min(snapshot.max_lives);
        } else if catalog.full_restore.as_ref() == Some(kind) {
            snapshot.lives = snapshot.max_lives;
        } else if catalog.max_life.as_ref() == Some(kind) {
            snapshot.max_lives += 1;
            snapshot.lives += 1;
        }
        tracing::debug!(%kind, lives = snapshot.lives, "power-up collected");
    }

    fn maybe_topple<H>(
        &mut self,
        wobble_force: f32,
        director: &mut SpawnDirector,
        governor: &mut PressureGovernor,
        host_rng: &mut H,
    ) -> Option<Record>
    where
        H: RandomSource + ?Sized,
    {
        let height = self.snapshot.stack_height;
        if height < TOPPLE_HEIGHT {
            return None;
        }
        let chance = (height - TOPPLE_HEIGHT) as f32 * 0.0005 + wobble_force * 0.05;
        if !host_rng.chance(chance) {
            return None;
        }

        self.summary.topples += 1;
        self.snapshot.stack_height = 0;
        self.snapshot.stack_composition.clear();
        self.snapshot.combo = 0;
        self.snapshot.lives = self.snapshot.lives.saturating_sub(1);
        director.on_stack_topple();
        governor.on_stack_topple();
        tracing::info!(height, lives = self.snapshot.lives, "stack toppled");
        Some(Record::Topple {
            t_ms: self.snapshot.game_time_ms,
            height,
            lives: self.snapshot.lives,
        })
    }

    fn maybe_bank(&mut self, director: &mut SpawnDirector) {
        let height = self.snapshot.stack_height;
        if height < self.profile.bank_height() {
            return;
        }
        self.snapshot.banked_creatures += height;
        self.snapshot.score += 50 * u64::from(height);
        self.snapshot.stack_height = 0;
        self.snapshot.stack_composition.clear();
        self.summary.banked += height;
        director.on_bank_success(height);

        let level = 1 + self.snapshot.banked_creatures / CREATURES_PER_LEVEL;
        if level > self.snapshot.level {
            self.snapshot.level = level;
            director.on_level_up(level);
        }
    }
}
