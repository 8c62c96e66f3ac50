use barnstack_core::{evaluator::Evaluator, SpawnStrategy};

/// Immutable view of director state scored by the strategy table.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StrategyContext {
    pub(crate) skill: f32,
    pub(crate) frustration: f32,
    pub(crate) engagement: f32,
    pub(crate) difficulty: f32,
    pub(crate) intensity: f32,
    pub(crate) stack_height: u32,
    pub(crate) banked_creatures: u32,
    pub(crate) lives: u32,
    pub(crate) combo: u32,
    pub(crate) recent_misses: u32,
    pub(crate) recent_perfects: u32,
    pub(crate) power_up_debt: f32,
}

/// Spawn strategies in tie-break order.
pub(crate) const SPAWN_STRATEGIES: [Evaluator<SpawnStrategy, StrategyContext>; 5] = [
    Evaluator {
        kind: SpawnStrategy::BuildPressure,
        bias: 0.5,
        score: build_pressure,
    },
    Evaluator {
        kind: SpawnStrategy::ReleaseTension,
        bias: 0.4,
        score: release_tension,
    },
    Evaluator {
        kind: SpawnStrategy::Challenge,
        bias: 0.45,
        score: challenge,
    },
    Evaluator {
        kind: SpawnStrategy::Mercy,
        bias: 0.35,
        score: mercy,
    },
    Evaluator {
        kind: SpawnStrategy::Reward,
        bias: 0.3,
        score: reward,
    },
];

fn build_pressure(context: &StrategyContext) -> f32 {
    0.4 + context.skill * 0.3
        + (context.stack_height as f32 / 10.0).min(1.0) * 0.2
        + context.engagement * 0.3
}

fn release_tension(context: &StrategyContext) -> f32 {
    let mut score = context.frustration * 0.4;
    if context.intensity > 0.7 {
        score += 0.3;
    }
    if context.stack_height == 0 && context.banked_creatures > 0 {
        score += 0.3;
    }
    score
}

fn challenge(context: &StrategyContext) -> f32 {
    if context.frustration > 0.4 {
        return 0.1;
    }
    let mut score = if context.skill > 0.7 {
        0.4
    } else {
        context.skill * 0.3
    };
    if context.engagement > 0.6 {
        score += 0.3;
    }
    score += context.difficulty * 0.2;
    if context.combo > 5 {
        score += 0.2;
    }
    score
}

fn mercy(context: &StrategyContext) -> f32 {
    let mut score = context.frustration * 0.5;
    if context.lives <= 1 {
        score += 0.5;
    }
    if context.stack_height > 12 {
        score += 0.2;
    }
    if context.recent_misses > 2 {
        score += 0.3;
    }
    score
}

fn reward(context: &StrategyContext) -> f32 {
    let mut score = (context.power_up_debt * 0.1).min(0.4);
    score += if context.combo > 8 {
        0.3
    } else if context.combo > 4 {
        0.15
    } else {
        0.0
    };
    if context.recent_perfects > 3 {
        score += 0.2;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::{StrategyContext, SPAWN_STRATEGIES};
    use barnstack_core::{evaluator::select, SpawnStrategy};

    fn winner(context: &StrategyContext) -> SpawnStrategy {
        select(&SPAWN_STRATEGIES, context)
            .expect("non-empty table")
            .kind
    }

    #[test]
    fn fresh_player_builds_pressure() {
        let context = StrategyContext {
            skill: 0.5,
            engagement: 0.5,
            lives: 3,
            ..StrategyContext::default()
        };
        assert_eq!(winner(&context), SpawnStrategy::BuildPressure);
    }

    #[test]
    fn distressed_player_receives_mercy() {
        let context = StrategyContext {
            skill: 0.2,
            frustration: 1.0,
            lives: 1,
            ..StrategyContext::default()
        };
        assert_eq!(winner(&context), SpawnStrategy::Mercy);
    }

    #[test]
    fn frustration_vetoes_challenge() {
        let context = StrategyContext {
            skill: 1.0,
            engagement: 1.0,
            difficulty: 1.0,
            combo: 10,
            frustration: 0.5,
            lives: 3,
            ..StrategyContext::default()
        };
        assert!((super::challenge(&context) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn expert_on_a_streak_is_challenged() {
        let context = StrategyContext {
            skill: 0.9,
            engagement: 0.7,
            difficulty: 1.0,
            combo: 6,
            lives: 3,
            ..StrategyContext::default()
        };
        assert!((super::challenge(&context) - 1.1).abs() < 1e-6);
        assert!(super::challenge(&context) * 0.45 > super::build_pressure(&context) * 0.5);
        assert_eq!(winner(&context), SpawnStrategy::Challenge);
    }

    #[test]
    fn debt_and_perfects_drive_reward() {
        let context = StrategyContext {
            power_up_debt: 10.0,
            combo: 9,
            recent_perfects: 4,
            ..StrategyContext::default()
        };
        assert!((super::reward(&context) - 0.9).abs() < 1e-6);
    }
}
