use barnstack_core::{
    PlayerStateSnapshot, PowerUpCatalog, PowerUpDecision, PowerUpKind, RandomSource,
    SpawnStrategy,
};

const BASE_CHANCE: f32 = 0.01;
const DEBT_CHANCE: f32 = 0.02;
const LOW_LIFE_CHANCE: f32 = 0.03;
const FRUSTRATION_CHANCE: f32 = 0.02;
const REMEDIATION_CHANCE: f32 = 0.15;
const CROWDED_SUPPRESSION: f32 = 0.3;

const PLACEMENT_JITTER: f32 = 100.0;
const PLACEMENT_MARGIN: f32 = 40.0;

/// Player-facing inputs to the power-up decision.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PowerUpContext<'a> {
    pub(crate) snapshot: &'a PlayerStateSnapshot,
    pub(crate) strategy: SpawnStrategy,
    pub(crate) skill: f32,
    pub(crate) frustration: f32,
    /// A compensating power-up is owed because remediation found no helpful type.
    pub(crate) compensation: bool,
}

/// Cooldown, debt and history of power-up decisions.
#[derive(Clone, Debug, Default)]
pub(crate) struct PowerUpPlanner {
    since_last_ms: f32,
    debt: f32,
    last_kind: Option<PowerUpKind>,
}

impl PowerUpPlanner {
    pub(crate) fn debt(&self) -> f32 {
        self.debt
    }

    pub(crate) fn last_kind(&self) -> Option<&PowerUpKind> {
        self.last_kind.as_ref()
    }

    pub(crate) fn add_debt(&mut self, amount: f32) {
        self.debt = (self.debt + amount).max(0.0);
    }

    pub(crate) fn advance(&mut self, dt_ms: f32) {
        self.since_last_ms += dt_ms;
    }

    /// Probability of emitting a power-up this tick, once the gate is open.
    pub(crate) fn chance(&self, context: &PowerUpContext<'_>) -> f32 {
        let snapshot = context.snapshot;
        let mut chance = BASE_CHANCE + self.debt * DEBT_CHANCE;
        if snapshot.lives <= 1 {
            chance += LOW_LIFE_CHANCE;
        }
        if context.frustration > 0.5 {
            chance += FRUSTRATION_CHANCE;
        }
        if context.strategy == SpawnStrategy::Reward {
            chance *= 2.0;
        }
        if context.compensation {
            chance += REMEDIATION_CHANCE;
        }
        if snapshot.active_power_ups > 1 {
            chance *= CROWDED_SUPPRESSION;
        }
        chance
    }

    pub(crate) fn decide<R>(
        &mut self,
        context: &PowerUpContext<'_>,
        catalog: &PowerUpCatalog,
        cooldown_ms: f32,
        rng: &mut R,
    ) -> Option<PowerUpDecision>
    where
        R: RandomSource + ?Sized,
    {
        if self.since_last_ms < cooldown_ms && !context.compensation {
            return None;
        }
        if !rng.chance(self.chance(context)) {
            return None;
        }

        let kind = choose_kind(context, catalog, rng)?;
        let snapshot = context.snapshot;
        let max_x = (snapshot.viewport_width - PLACEMENT_MARGIN).max(PLACEMENT_MARGIN);
        let position_x =
            (snapshot.player_x + rng.jitter(PLACEMENT_JITTER)).clamp(PLACEMENT_MARGIN, max_x);

        self.since_last_ms = 0.0;
        self.debt = (self.debt - 1.0).max(0.0);
        self.last_kind = Some(kind.clone());

        Some(PowerUpDecision {
            kind,
            position_x,
            position_y: 0.0,
        })
    }
}

/// Priority cascade over the catalogue roles, ending in a weighted pick.
fn choose_kind<R>(
    context: &PowerUpContext<'_>,
    catalog: &PowerUpCatalog,
    rng: &mut R,
) -> Option<PowerUpKind>
where
    R: RandomSource + ?Sized,
{
    let snapshot = context.snapshot;

    if snapshot.lives <= 1 {
        if let Some(full) = &catalog.full_restore {
            if rng.chance(0.3) {
                return Some(full.clone());
            }
        }
        if let Some(heal) = &catalog.heal {
            return Some(heal.clone());
        }
    }

    let offers = [
        (snapshot.stack_height >= 10, &catalog.stabilizer, 0.4),
        (snapshot.active_creatures >= 4, &catalog.crowd_control, 0.4),
        (
            context.skill > 0.7 && snapshot.combo > 5,
            &catalog.skill_reward,
            0.4,
        ),
        (
            snapshot.lives >= snapshot.max_lives,
            &catalog.max_life,
            0.05,
        ),
    ];
    for (eligible, role, probability) in offers {
        let Some(kind) = role else {
            continue;
        };
        if eligible && rng.chance(probability) {
            return Some(kind.clone());
        }
    }

    catalog.pick_weighted(rng).or_else(|| catalog.heal.clone())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{PowerUpContext, PowerUpPlanner};
    use barnstack_core::{
        testing::ScriptedRandom, PlayerStateSnapshot, PowerUpCatalog, PowerUpConfig,
        PowerUpKind, SpawnStrategy,
    };

    fn catalog() -> PowerUpCatalog {
        let mut entries = BTreeMap::new();
        let _ = entries.insert(PowerUpKind::new("hay_bale"), PowerUpConfig { spawn_weight: 1.0 });
        PowerUpCatalog {
            entries,
            heal: Some(PowerUpKind::new("potion")),
            full_restore: Some(PowerUpKind::new("golden_egg")),
            stabilizer: Some(PowerUpKind::new("glue")),
            crowd_control: None,
            skill_reward: None,
            max_life: None,
        }
    }

    fn context(snapshot: &PlayerStateSnapshot, compensation: bool) -> PowerUpContext<'_> {
        PowerUpContext {
            snapshot,
            strategy: SpawnStrategy::BuildPressure,
            skill: 0.5,
            frustration: 0.0,
            compensation,
        }
    }

    #[test]
    fn chance_combines_every_modifier() {
        let mut planner = PowerUpPlanner::default();
        planner.add_debt(2.0);
        let snapshot = PlayerStateSnapshot {
            lives: 1,
            ..PlayerStateSnapshot::default()
        };
        let mut ctx = context(&snapshot, false);
        ctx.frustration = 0.6;
        ctx.strategy = SpawnStrategy::Reward;
        assert!((planner.chance(&ctx) - 0.2).abs() < 1e-6);

        ctx.compensation = true;
        assert!((planner.chance(&ctx) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn cooldown_blocks_unless_compensation_is_owed() {
        let mut planner = PowerUpPlanner::default();
        let snapshot = PlayerStateSnapshot::default();
        let mut rng = ScriptedRandom::constant(0.0);
        assert!(planner
            .decide(&context(&snapshot, false), &catalog(), 8_000.0, &mut rng)
            .is_none());
        assert_eq!(rng.draws(), 0);

        let decision = planner
            .decide(&context(&snapshot, true), &catalog(), 8_000.0, &mut rng)
            .expect("compensation bypasses cooldown");
        assert_eq!(planner.last_kind(), Some(&decision.kind));
    }

    #[test]
    fn low_lives_prefer_restoration() {
        let mut planner = PowerUpPlanner::default();
        planner.add_debt(1.5);
        planner.advance(10_000.0);
        let snapshot = PlayerStateSnapshot {
            lives: 1,
            player_x: 5.0,
            ..PlayerStateSnapshot::default()
        };
        let mut rng = ScriptedRandom::new(vec![0.0, 0.9, 0.5]);
        let decision = planner
            .decide(&context(&snapshot, false), &catalog(), 8_000.0, &mut rng)
            .expect("power-up");
        assert_eq!(decision.kind, PowerUpKind::new("potion"));
        assert_eq!(decision.position_x, 40.0);
        assert!((planner.debt() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tall_stack_offers_stabilizer() {
        let mut planner = PowerUpPlanner::default();
        planner.advance(10_000.0);
        let snapshot = PlayerStateSnapshot {
            stack_height: 12,
            ..PlayerStateSnapshot::default()
        };
        let mut rng = ScriptedRandom::constant(0.0);
        let decision = planner
            .decide(&context(&snapshot, false), &catalog(), 8_000.0, &mut rng)
            .expect("power-up");
        assert_eq!(decision.kind, PowerUpKind::new("glue"));
    }
}
