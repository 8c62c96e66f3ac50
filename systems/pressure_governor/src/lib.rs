#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pressure governor shaping the physical force applied to the stack.
//!
//! The governor tracks stack threat and player stress, picks one of four
//! pressure modes every tick, and maintains a decaying tension scalar. Its
//! output is a wobble force and a pulse intensity consumed by stack physics.
//! It shares no state with the spawn director.

mod modes;
mod threat;

use barnstack_core::{
    clamp_unit, evaluator::StrategySelector, CatchQuality, PressureMode, RandomSource,
};
use serde::{Deserialize, Serialize};

pub use threat::{accumulate_threat, FallingThreat};

use modes::{ModeContext, PRESSURE_MODES};

const STACK_THREAT_HEIGHT: f32 = 15.0;
const MISS_STRESS: f32 = 0.1;
const PERFECT_RELIEF: f32 = 0.05;
const CATCH_RELIEF: f32 = 0.02;

const CHAOS_ENTRY_TENSION: f32 = 0.3;
const PULSE_TENSION: f32 = 0.2;
const PULSE_PEAK: f32 = 0.8;
const PULSE_FADE: f32 = 0.95;
const STEADY_FORCE_PER_CREATURE: f32 = 0.02;
const MERCY_FORCE_SCALE: f32 = 0.5;
const MERCY_PULSE_SCALE: f32 = 0.3;
const MERCY_TENSION_SCALE: f32 = 0.9;
const CHAOS_AMPLITUDE: f32 = 0.3;
const CHAOS_LEVEL_SCALE: f32 = 0.05;
const CHAOS_EVENT_TENSION: f32 = 0.15;
const CHAOS_EVENT_PULSE: f32 = 0.6;

/// Tuning knobs of the pressure governor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureTuning {
    /// Tension retained per frame-equivalent.
    pub tension_decay: f32,
    /// Duration of one frame-equivalent used by the geometric decays.
    pub decay_frame_ms: f32,
    /// Player stress retained per frame-equivalent.
    pub stress_decay: f32,
    /// Recent misses reset after this long without a miss.
    pub miss_window_ms: f32,
    /// Shortest randomised pulse interval.
    pub pulse_interval_min_ms: f32,
    /// Longest randomised pulse interval.
    pub pulse_interval_max_ms: f32,
    /// Scale from the unit output force to physics units.
    pub wobble_scale: f32,
    /// Per-tick probability of a chaos burst.
    pub chaos_event_chance: f32,
    /// Stress added by a stack collapse.
    pub topple_stress: f32,
}

impl Default for PressureTuning {
    fn default() -> Self {
        Self {
            tension_decay: 0.995,
            decay_frame_ms: 16.67,
            stress_decay: 0.999,
            miss_window_ms: 10_000.0,
            pulse_interval_min_ms: 1_500.0,
            pulse_interval_max_ms: 3_500.0,
            wobble_scale: 0.03,
            chaos_event_chance: 0.02,
            topple_stress: 0.35,
        }
    }
}

/// Per-tick input of the governor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PressureSnapshot<'a> {
    /// Creatures currently stacked.
    pub stack_height: u32,
    /// Current level, starting at 1.
    pub game_level: u32,
    /// Whether the host considers the stack about to collapse.
    pub danger: bool,
    /// Creatures currently falling.
    pub falling: &'a [FallingThreat],
}

/// Stack pressure controller.
#[derive(Clone, Debug)]
pub struct PressureGovernor {
    tuning: PressureTuning,
    selector: StrategySelector<PressureMode>,
    stack_height: u32,
    game_level: u32,
    danger: bool,
    threat_level: f32,
    stress: f32,
    recent_misses: u32,
    since_miss_ms: f32,
    tension: f32,
    output_force: f32,
    pulse_intensity: f32,
    pulse_timer_ms: f32,
    pulse_interval_ms: f32,
    chaos_phase_ms: f32,
}

impl PressureGovernor {
    /// Creates a governor in steady mode with no tension.
    #[must_use]
    pub fn new(tuning: PressureTuning) -> Self {
        let pulse_interval_ms = (tuning.pulse_interval_min_ms + tuning.pulse_interval_max_ms) * 0.5;
        Self {
            tuning,
            selector: StrategySelector::new(PressureMode::Steady),
            stack_height: 0,
            game_level: 1,
            danger: false,
            threat_level: 0.0,
            stress: 0.0,
            recent_misses: 0,
            since_miss_ms: 0.0,
            tension: 0.0,
            output_force: 0.0,
            pulse_intensity: 0.0,
            pulse_timer_ms: 0.0,
            pulse_interval_ms,
            chaos_phase_ms: 0.0,
        }
    }

    /// Advances the governor by `dt_ms`.
    pub fn update<R>(&mut self, dt_ms: f32, snapshot: &PressureSnapshot<'_>, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        let dt_ms = dt_ms.max(0.0);
        self.stack_height = snapshot.stack_height;
        self.game_level = snapshot.game_level;
        self.danger = snapshot.danger;
        self.threat_level = clamp_unit(
            snapshot.stack_height as f32 / STACK_THREAT_HEIGHT + accumulate_threat(snapshot.falling),
        );

        let frames = if self.tuning.decay_frame_ms > 0.0 {
            dt_ms / self.tuning.decay_frame_ms
        } else {
            0.0
        };
        self.tension *= self.tuning.tension_decay.powf(frames);
        self.stress *= self.tuning.stress_decay.powf(frames);

        self.since_miss_ms += dt_ms;
        if self.since_miss_ms > self.tuning.miss_window_ms {
            self.recent_misses = 0;
        }

        let context = ModeContext {
            stack_height: self.stack_height,
            threat_level: self.threat_level,
            stress: self.stress,
            game_level: self.game_level,
            danger: self.danger,
        };
        if let Some(transition) = self.selector.evaluate(&PRESSURE_MODES, &context, dt_ms) {
            tracing::debug!(
                from = transition.from.as_str(),
                to = transition.to.as_str(),
                tension = self.tension,
                "pressure mode changed"
            );
            self.enter(transition.to, rng);
        }

        let stack_factor = (self.stack_height as f32 / STACK_THREAT_HEIGHT).min(1.0);
        let pressure = clamp_unit(
            (stack_factor * 0.4 + self.threat_level * 0.4) * (1.0 - self.stress * 0.4),
        );
        self.output_force = clamp_unit(pressure * 0.5 + self.tension * 0.5);

        match self.selector.active() {
            PressureMode::Steady => {
                self.output_force = self
                    .output_force
                    .max(self.stack_height as f32 * STEADY_FORCE_PER_CREATURE);
                self.pulse_intensity *= PULSE_FADE;
            }
            PressureMode::Pulse => self.run_pulse(dt_ms, rng),
            PressureMode::Mercy => {
                self.output_force *= MERCY_FORCE_SCALE;
                self.pulse_intensity *= MERCY_PULSE_SCALE;
                self.tension *= MERCY_TENSION_SCALE;
            }
            PressureMode::Chaos => self.run_chaos(dt_ms, rng),
        }

        self.output_force = clamp_unit(self.output_force);
        self.pulse_intensity = clamp_unit(self.pulse_intensity);
        self.tension = clamp_unit(self.tension);
    }

    fn enter<R>(&mut self, mode: PressureMode, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        match mode {
            PressureMode::Pulse => {
                self.pulse_timer_ms = 0.0;
                self.pulse_interval_ms = self.draw_pulse_interval(rng);
            }
            PressureMode::Chaos => {
                self.chaos_phase_ms = 0.0;
                self.tension = clamp_unit(self.tension + CHAOS_ENTRY_TENSION);
            }
            PressureMode::Steady | PressureMode::Mercy => {}
        }
    }

    fn draw_pulse_interval<R>(&self, rng: &mut R) -> f32
    where
        R: RandomSource + ?Sized,
    {
        rng.range(
            self.tuning.pulse_interval_min_ms,
            self.tuning.pulse_interval_max_ms,
        )
    }

    fn run_pulse<R>(&mut self, dt_ms: f32, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        self.pulse_timer_ms += dt_ms;
        if self.pulse_timer_ms >= self.pulse_interval_ms {
            self.tension += PULSE_TENSION * self.threat_level;
            self.pulse_intensity = PULSE_PEAK;
            self.pulse_timer_ms = 0.0;
            self.pulse_interval_ms = self.draw_pulse_interval(rng);
            tracing::trace!(tension = self.tension, "pressure pulse");
        } else {
            self.pulse_intensity *= PULSE_FADE;
        }
    }

    fn run_chaos<R>(&mut self, dt_ms: f32, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        self.chaos_phase_ms += dt_ms;
        self.output_force += (self.chaos_phase_ms * 0.001).sin()
            * CHAOS_AMPLITUDE
            * self.game_level as f32
            * CHAOS_LEVEL_SCALE;
        if rng.chance(self.tuning.chaos_event_chance) {
            self.tension += CHAOS_EVENT_TENSION;
            self.pulse_intensity = CHAOS_EVENT_PULSE;
            tracing::trace!(tension = self.tension, "chaos burst");
        } else {
            self.pulse_intensity *= PULSE_FADE;
        }
    }

    /// Records a successful catch, relieving some stress.
    pub fn on_animal_caught(&mut self, quality: CatchQuality) {
        let relief = match quality {
            CatchQuality::Perfect => PERFECT_RELIEF,
            CatchQuality::Good | CatchQuality::Normal => CATCH_RELIEF,
        };
        self.stress = clamp_unit(self.stress - relief);
    }

    /// Records a creature that hit the ground.
    pub fn on_animal_missed(&mut self) {
        self.stress = clamp_unit(self.stress + MISS_STRESS);
        self.recent_misses += 1;
        self.since_miss_ms = 0.0;
    }

    /// Records a stack collapse: tension is released and stress spikes.
    pub fn on_stack_topple(&mut self) {
        self.tension = 0.0;
        self.stress = clamp_unit(self.stress + self.tuning.topple_stress);
        self.recent_misses += 1;
        self.since_miss_ms = 0.0;
    }

    /// Active pressure mode.
    #[must_use]
    pub fn mode(&self) -> PressureMode {
        self.selector.active()
    }

    /// Name of the active pressure mode.
    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        self.selector.active().as_str()
    }

    /// Time spent in the active mode.
    #[must_use]
    pub fn mode_occupancy_ms(&self) -> f32 {
        self.selector.occupancy_ms()
    }

    /// Accumulated tension in `[0, 1]`.
    #[must_use]
    pub fn tension(&self) -> f32 {
        self.tension
    }

    /// Threat level in `[0, 1]`.
    #[must_use]
    pub fn threat_level(&self) -> f32 {
        self.threat_level
    }

    /// Player stress in `[0, 1]`.
    #[must_use]
    pub fn player_stress(&self) -> f32 {
        self.stress
    }

    /// Misses and topples since the miss window last elapsed.
    #[must_use]
    pub fn recent_misses(&self) -> u32 {
        self.recent_misses
    }

    /// Whether the latest snapshot reported danger.
    #[must_use]
    pub fn is_danger(&self) -> bool {
        self.danger
    }

    /// Unscaled output force in `[0, 1]`.
    #[must_use]
    pub fn output_force(&self) -> f32 {
        self.output_force
    }

    /// Output force in physics units, within `[0, wobble_scale]`.
    #[must_use]
    pub fn wobble_force(&self) -> f32 {
        self.output_force * self.tuning.wobble_scale
    }

    /// Visual pulse intensity in `[0, 1]`.
    #[must_use]
    pub fn pulse_intensity(&self) -> f32 {
        self.pulse_intensity
    }
}

impl Default for PressureGovernor {
    fn default() -> Self {
        Self::new(PressureTuning::default())
    }
}
