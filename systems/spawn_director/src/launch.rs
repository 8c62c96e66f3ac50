use barnstack_core::{clamp_unit, BehaviorKind, RandomSource, SpawnStrategy};

const CHALLENGE_AGGRESSION: f32 = 1.6;
const MERCY_AGGRESSION: f32 = 0.25;
const MERCY_FLOATER_SHARE: f32 = 0.35;

/// How strongly downstream physics should steer a creature toward the player.
pub(crate) fn target_bias(difficulty: f32, strategy: SpawnStrategy, mercy_mode: bool) -> f32 {
    let challenge = if strategy == SpawnStrategy::Challenge {
        0.2
    } else {
        0.0
    };
    let mercy = if strategy == SpawnStrategy::Mercy {
        0.3
    } else {
        0.0
    };
    let mercy_scale = if mercy_mode { 0.5 } else { 1.0 };
    clamp_unit(0.2 + 0.4 * difficulty + challenge - mercy * mercy_scale)
}

/// Rolls a behaviour through a cascade of difficulty-scaled buckets.
pub(crate) fn pick_behavior<R>(
    difficulty: f32,
    strategy: SpawnStrategy,
    mercy_mode: bool,
    rng: &mut R,
) -> BehaviorKind
where
    R: RandomSource + ?Sized,
{
    let mut seeker = 0.05 + 0.15 * difficulty;
    let mut dive = 0.05 + 0.12 * difficulty;
    let mut zigzag = 0.08 + 0.12 * difficulty;
    let mut evader = 0.04 + 0.10 * difficulty;
    let mut floater = 0.10 - 0.05 * difficulty;

    if strategy == SpawnStrategy::Challenge {
        seeker *= CHALLENGE_AGGRESSION;
        dive *= CHALLENGE_AGGRESSION;
    }
    if mercy_mode {
        seeker *= MERCY_AGGRESSION;
        dive *= MERCY_AGGRESSION;
        zigzag *= MERCY_AGGRESSION;
        evader *= MERCY_AGGRESSION;
        floater = MERCY_FLOATER_SHARE;
    }

    let buckets = [
        (BehaviorKind::Seeker, seeker),
        (BehaviorKind::Dive, dive),
        (BehaviorKind::Zigzag, zigzag),
        (BehaviorKind::Evader, evader),
        (BehaviorKind::Floater, floater),
    ];

    let roll = rng.next();
    let mut threshold = 0.0;
    for (behavior, share) in buckets {
        threshold += share;
        if roll < threshold {
            return behavior;
        }
    }
    BehaviorKind::Normal
}

/// Inputs shaping the initial velocity of a creature.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) difficulty: f32,
    pub(crate) strategy: SpawnStrategy,
    pub(crate) mercy_mode: bool,
    pub(crate) target_bias: f32,
    pub(crate) spawn_x: f32,
    pub(crate) player_x: f32,
    pub(crate) viewport_width: f32,
}

impl Launch {
    /// Initial `(horizontal, vertical)` velocity.
    pub(crate) fn velocity<R>(&self, rng: &mut R) -> (f32, f32)
    where
        R: RandomSource + ?Sized,
    {
        let half_width = (self.viewport_width * 0.5).max(1.0);
        let toward_player = ((self.player_x - self.spawn_x) / half_width).clamp(-1.0, 1.0);

        let mut horizontal = rng.jitter(0.5 + 1.5 * self.difficulty)
            + toward_player * self.target_bias * 0.5;
        let mut vertical = 2.0 + 2.0 * self.difficulty;

        if self.strategy == SpawnStrategy::Challenge {
            horizontal *= 1.3;
            vertical *= 1.2;
        } else if self.strategy == SpawnStrategy::Mercy || self.mercy_mode {
            horizontal *= 0.6;
            vertical *= 0.7;
        }
        (horizontal, vertical)
    }
}
