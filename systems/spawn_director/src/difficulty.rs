use barnstack_core::{clamp_unit, log_curve, PlayerStateSnapshot};

const LEVEL_CAP: f32 = 25.0;
const TIME_CAP_MINUTES: f32 = 5.0;
const SCORE_CAP_THOUSANDS: f32 = 100.0;

const LEVEL_WEIGHT: f32 = 0.4;
const TIME_WEIGHT: f32 = 0.3;
const SCORE_WEIGHT: f32 = 0.2;
const SKILL_WEIGHT: f32 = 0.1;

const SMOOTHING: f32 = 0.05;

/// Instantaneous difficulty target in `[0, 1]`.
///
/// Combines three independent logarithmic sub-curves (levels gained since level
/// 1, elapsed minutes, score in thousands) with the player's skill. Each input
/// is monotone on its own, so raising any one of them never lowers the target.
#[must_use]
pub fn target_difficulty(level: u32, game_time_ms: f32, score: u64, skill: f32) -> f32 {
    let levels_gained = level.saturating_sub(1) as f32;
    let minutes = game_time_ms.max(0.0) / 60_000.0;
    let thousands = score as f32 / 1_000.0;

    let target = LEVEL_WEIGHT * log_curve(levels_gained, LEVEL_CAP)
        + TIME_WEIGHT * log_curve(minutes, TIME_CAP_MINUTES)
        + SCORE_WEIGHT * log_curve(thousands, SCORE_CAP_THOUSANDS)
        + SKILL_WEIGHT * clamp_unit(skill);
    target.min(1.0)
}

/// Slowly smoothed difficulty and the spawn interval derived from it.
#[derive(Clone, Debug)]
pub(crate) struct DifficultyCurve {
    difficulty: f32,
    target: f32,
    base_interval_ms: f32,
    min_interval_ms: f32,
}

impl DifficultyCurve {
    pub(crate) fn new(base_interval_ms: f32, min_interval_ms: f32) -> Self {
        Self {
            difficulty: 0.0,
            target: 0.0,
            base_interval_ms,
            min_interval_ms,
        }
    }

    pub(crate) fn update(&mut self, snapshot: &PlayerStateSnapshot, skill: f32) {
        self.target = target_difficulty(
            snapshot.level,
            snapshot.game_time_ms,
            snapshot.score,
            skill,
        );
        self.difficulty =
            clamp_unit(self.difficulty * (1.0 - SMOOTHING) + self.target * SMOOTHING);
    }

    pub(crate) fn difficulty(&self) -> f32 {
        self.difficulty
    }

    pub(crate) fn target(&self) -> f32 {
        self.target
    }

    pub(crate) fn spawn_interval_ms(&self) -> f32 {
        let span = self.base_interval_ms - self.min_interval_ms;
        (self.base_interval_ms - self.difficulty * span)
            .clamp(self.min_interval_ms, self.base_interval_ms)
    }
}
