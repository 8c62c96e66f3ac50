use std::collections::VecDeque;

use barnstack_core::{clamp_unit, CatchQuality, PlayerStateSnapshot};
use serde::Serialize;

const SKILL_SMOOTHING: f32 = 0.1;
const FATIGUE_SCALE: f32 = 0.3;
const FRUSTRATION_RECOVERY_MS: f32 = 10_000.0;
const FRUSTRATION_DECAY: f32 = 0.002;
const PERFECT_ENGAGEMENT_WINDOW_MS: f32 = 5_000.0;

/// Smoothed estimates of the player's skill and emotional state.
///
/// Every field stays within `[0, 1]` after each mutation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayerModel {
    skill: f32,
    fatigue: f32,
    frustration: f32,
    engagement: f32,
}

impl Default for PlayerModel {
    fn default() -> Self {
        Self {
            skill: 0.5,
            fatigue: 0.0,
            frustration: 0.0,
            engagement: 0.5,
        }
    }
}

impl PlayerModel {
    /// Estimated skill, driven by catch rate and catch quality.
    #[must_use]
    pub fn skill(&self) -> f32 {
        self.skill
    }

    /// Fatigue, growing logarithmically with session length.
    #[must_use]
    pub fn fatigue(&self) -> f32 {
        self.fatigue
    }

    /// Frustration, raised by misses and topples and recovered over time.
    #[must_use]
    pub fn frustration(&self) -> f32 {
        self.frustration
    }

    /// Engagement, derived from combo, stack height and recent perfect catches.
    #[must_use]
    pub fn engagement(&self) -> f32 {
        self.engagement
    }

    fn clamp(&mut self) {
        self.skill = clamp_unit(self.skill);
        self.fatigue = clamp_unit(self.fatigue);
        self.frustration = clamp_unit(self.frustration);
        self.engagement = clamp_unit(self.engagement);
    }
}

/// Player model plus the timers and rolling counters that feed it.
#[derive(Clone, Debug)]
pub(crate) struct PlayerTracker {
    model: PlayerModel,
    clock_ms: f32,
    since_miss_ms: f32,
    since_perfect_ms: f32,
    perfect_window_ms: f32,
    perfect_stamps: VecDeque<f32>,
}

impl PlayerTracker {
    pub(crate) fn new(perfect_window_ms: f32) -> Self {
        Self {
            model: PlayerModel::default(),
            clock_ms: 0.0,
            since_miss_ms: f32::INFINITY,
            since_perfect_ms: f32::INFINITY,
            perfect_window_ms,
            perfect_stamps: VecDeque::new(),
        }
    }

    pub(crate) fn model(&self) -> &PlayerModel {
        &self.model
    }

    /// Applies the per-tick update from the snapshot. Timers are read, not advanced.
    pub(crate) fn observe(&mut self, snapshot: &PlayerStateSnapshot) {
        let model = &mut self.model;
        model.skill = model.skill * (1.0 - SKILL_SMOOTHING) + snapshot.catch_rate * SKILL_SMOOTHING;
        model.fatigue = (1.0 + snapshot.game_time_ms.max(0.0) / 60_000.0).log10() * FATIGUE_SCALE;

        let recovery = (self.since_miss_ms / FRUSTRATION_RECOVERY_MS).min(1.0);
        model.frustration = (model.frustration - recovery * FRUSTRATION_DECAY).max(0.0);

        let mut engagement = 0.0;
        if snapshot.combo > 3 {
            engagement += 0.3;
        }
        if (3..=12).contains(&snapshot.stack_height) {
            engagement += 0.3;
        }
        if self.since_perfect_ms < PERFECT_ENGAGEMENT_WINDOW_MS {
            engagement += 0.2;
        }
        engagement += 0.2 * (1.0 - model.frustration);
        model.engagement = engagement;

        model.clamp();
    }

    /// Advances every timer and expires perfect catches outside the rolling window.
    pub(crate) fn advance(&mut self, dt_ms: f32) {
        self.clock_ms += dt_ms;
        self.since_miss_ms += dt_ms;
        self.since_perfect_ms += dt_ms;
        while let Some(&stamp) = self.perfect_stamps.front() {
            if self.clock_ms - stamp <= self.perfect_window_ms {
                break;
            }
            let _ = self.perfect_stamps.pop_front();
        }
    }

    pub(crate) fn recent_perfects(&self) -> u32 {
        u32::try_from(self.perfect_stamps.len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn caught(&mut self, quality: CatchQuality) {
        self.model.skill += match quality {
            CatchQuality::Perfect => 0.04,
            CatchQuality::Good => 0.02,
            CatchQuality::Normal => 0.01,
        };
        self.model.frustration -= 0.05;
        if quality == CatchQuality::Perfect {
            self.since_perfect_ms = 0.0;
            self.perfect_stamps.push_back(self.clock_ms);
        }
        self.model.clamp();
    }

    pub(crate) fn missed(&mut self) {
        self.model.skill -= 0.03;
        self.model.frustration += 0.15;
        self.since_miss_ms = 0.0;
        self.model.clamp();
    }

    pub(crate) fn toppled(&mut self) {
        self.model.frustration += 0.25;
        self.model.fatigue += 0.1;
        self.model.clamp();
    }

    pub(crate) fn banked(&mut self) {
        self.model.engagement += 0.1;
        self.model.frustration -= 0.1;
        self.model.clamp();
    }

    pub(crate) fn levelled_up(&mut self) {
        self.model.engagement += 0.05;
        self.model.clamp();
    }
}
