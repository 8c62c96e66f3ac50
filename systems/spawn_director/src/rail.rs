use barnstack_core::{clamp_unit, lerp, RandomSource, SpawnStrategy};

const PATROL_CENTER: f32 = 0.5;
const PATROL_AMPLITUDE: f32 = 0.4;
const TARGETING_START: f32 = 0.3;
const IMMINENT_PROGRESS: f32 = 0.7;
const IMMINENT_RATE: f32 = 0.15;
const IDLE_RATE: f32 = 0.05;

const PRESSURE_NUDGE_CHANCE: f32 = 0.1;
const PRESSURE_NUDGE: f32 = 0.2;
const PRESSURE_REACH: f32 = 0.3;

const CHALLENGE_JITTER: f32 = 0.08;
const NEAR_JITTER: f32 = 0.05;
const STREAK_LIMIT: u32 = 3;

/// Reports whether spawn-timer progress has entered the imminent band.
pub(crate) fn is_imminent(progress: f32) -> bool {
    progress > IMMINENT_PROGRESS
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RailThird {
    Left,
    Center,
    Right,
}

impl RailThird {
    fn of(t: f32) -> Self {
        if t < 0.33 {
            Self::Left
        } else if t > 0.66 {
            Self::Right
        } else {
            Self::Center
        }
    }
}

/// Rail-bound threat indicator that doubles as the spawn point.
///
/// Between drops it sweeps sinusoidally across the rail; as the next drop
/// becomes imminent control blends toward the strategic target chosen at the
/// previous drop.
#[derive(Clone, Debug)]
pub(crate) struct TornadoRail {
    rail_t: f32,
    target_t: f32,
    patrol_phase: f32,
    pressure_direction: f32,
    last_third: Option<RailThird>,
    third_streak: u32,
}

impl Default for TornadoRail {
    fn default() -> Self {
        Self {
            rail_t: PATROL_CENTER,
            target_t: PATROL_CENTER,
            patrol_phase: 0.0,
            pressure_direction: 0.0,
            last_third: None,
            third_streak: 0,
        }
    }
}

impl TornadoRail {
    pub(crate) fn rail_t(&self) -> f32 {
        self.rail_t
    }

    pub(crate) fn target_t(&self) -> f32 {
        self.target_t
    }

    pub(crate) fn reset_pressure_direction(&mut self) {
        self.pressure_direction = 0.0;
    }

    /// Occasionally nudges the build-pressure drift direction.
    pub(crate) fn drift_pressure<R>(&mut self, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        if rng.chance(PRESSURE_NUDGE_CHANCE) {
            self.pressure_direction =
                (self.pressure_direction + rng.jitter(PRESSURE_NUDGE)).clamp(-1.0, 1.0);
        }
    }

    /// Chooses the strategic target for a drop and applies anti-repetition.
    pub(crate) fn retarget<R>(
        &mut self,
        strategy: SpawnStrategy,
        player_t: f32,
        difficulty: f32,
        rng: &mut R,
    ) where
        R: RandomSource + ?Sized,
    {
        let raw = match strategy {
            SpawnStrategy::Challenge => {
                let opposite = match RailThird::of(player_t) {
                    RailThird::Left => 0.83,
                    RailThird::Right => 0.17,
                    RailThird::Center => {
                        if rng.chance(0.5) {
                            0.1
                        } else {
                            0.9
                        }
                    }
                };
                opposite + rng.jitter(CHALLENGE_JITTER)
            }
            SpawnStrategy::Mercy => player_t + rng.jitter(NEAR_JITTER),
            SpawnStrategy::BuildPressure => {
                player_t + self.pressure_direction * PRESSURE_REACH + rng.jitter(NEAR_JITTER)
            }
            SpawnStrategy::ReleaseTension => rng.next(),
            SpawnStrategy::Reward => {
                let weight = 0.3 + difficulty * 0.3;
                lerp(rng.next(), player_t, weight)
            }
        };

        self.target_t = self.break_streak(clamp_unit(raw), player_t);
    }

    fn break_streak(&mut self, target: f32, player_t: f32) -> f32 {
        let third = RailThird::of(target);
        if self.last_third == Some(third) {
            self.third_streak += 1;
        } else {
            self.last_third = Some(third);
            self.third_streak = 1;
        }

        if self.third_streak < STREAK_LIMIT {
            return target;
        }

        let forced = match third {
            RailThird::Left => 0.9,
            RailThird::Right => 0.1,
            RailThird::Center => {
                if player_t < 0.5 {
                    0.9
                } else {
                    0.1
                }
            }
        };
        self.last_third = Some(RailThird::of(forced));
        self.third_streak = 1;
        forced
    }

    /// Moves the indicator toward the blend of patrol and strategic target.
    pub(crate) fn smooth(&mut self, dt_ms: f32, progress: f32, patrol_speed: f32) {
        self.patrol_phase += patrol_speed * dt_ms / 1_000.0;
        let patrol = PATROL_CENTER + self.patrol_phase.sin() * PATROL_AMPLITUDE;
        let blend = clamp_unit((progress - TARGETING_START) / (1.0 - TARGETING_START));
        let goal = lerp(patrol, self.target_t, blend);
        let rate = if is_imminent(progress) {
            IMMINENT_RATE
        } else {
            IDLE_RATE
        };
        self.rail_t = clamp_unit(self.rail_t + (goal - self.rail_t) * rate);
    }
}

#[cfg(test)]
mod tests {
    use super::TornadoRail;
    use barnstack_core::{testing::ScriptedRandom, SpawnStrategy};

    #[test]
    fn challenge_targets_opposite_third() {
        let mut rail = TornadoRail::default();
        let mut rng = ScriptedRandom::constant(0.5);
        rail.retarget(SpawnStrategy::Challenge, 0.1, 0.5, &mut rng);
        assert!((rail.target_t() - 0.83).abs() < 1e-6);

        rail.retarget(SpawnStrategy::Challenge, 0.9, 0.5, &mut rng);
        assert!((rail.target_t() - 0.17).abs() < 1e-6);
    }

    #[test]
    fn third_repeated_three_times_is_forced_to_opposite_extreme() {
        let mut rail = TornadoRail::default();
        let mut rng = ScriptedRandom::constant(0.5);
        let mut next_target = |rail: &mut TornadoRail| {
            rail.retarget(SpawnStrategy::Mercy, 0.1, 0.0, &mut rng);
            rail.target_t()
        };
        assert!((next_target(&mut rail) - 0.1).abs() < 1e-6);
        assert!((next_target(&mut rail) - 0.1).abs() < 1e-6);
        assert_eq!(next_target(&mut rail), 0.9);
        assert!((next_target(&mut rail) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn pressure_direction_stays_bounded() {
        let mut rail = TornadoRail::default();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99]);
        for _ in 0..100 {
            rail.drift_pressure(&mut rng);
        }
        assert!(rail.pressure_direction <= 1.0);
        assert!(rail.pressure_direction >= -1.0);
        assert!(rail.pressure_direction > 0.9);
    }

    #[test]
    fn imminent_drop_converges_on_target() {
        let mut rail = TornadoRail::default();
        let mut rng = ScriptedRandom::constant(0.5);
        rail.retarget(SpawnStrategy::Challenge, 0.9, 0.5, &mut rng);

        for _ in 0..200 {
            rail.smooth(16.0, 1.0, 0.8);
        }
        assert!((rail.rail_t() - rail.target_t()).abs() < 1e-3);
    }

    #[test]
    fn idle_patrol_stays_on_rail() {
        let mut rail = TornadoRail::default();
        for _ in 0..1_000 {
            rail.smooth(16.0, 0.0, 3.0);
            assert!((0.1..=0.9).contains(&rail.rail_t()));
        }
    }
}
