use std::collections::BTreeMap;

use barnstack_core::{
    testing::ScriptedRandom, CatchQuality, ConfigError, CreatureConfig, CreatureKind,
    CreatureTable, LinearRail, PlayerStateSnapshot, PowerUpCatalog, PowerUpConfig, PowerUpKind,
    RandomSource, SeededRandom, SpawnClass, SpawnDecision, SpawnStrategy,
};
use barnstack_system_spawn_director::{SpawnDirector, SpawnTuning};

const DT_MS: f32 = 100.0;

fn farm() -> CreatureTable {
    CreatureTable::new()
        .with("chicken", CreatureConfig::weighted(1.0))
        .with("cow", CreatureConfig::weighted(3.0))
}

fn catalog() -> PowerUpCatalog {
    let mut entries = BTreeMap::new();
    let _ = entries.insert(PowerUpKind::new("hay_bale"), PowerUpConfig { spawn_weight: 1.0 });
    PowerUpCatalog {
        entries,
        heal: Some(PowerUpKind::new("potion")),
        ..PowerUpCatalog::default()
    }
}

fn director_with(creatures: CreatureTable) -> SpawnDirector {
    SpawnDirector::new(
        SpawnTuning::default(),
        creatures,
        catalog(),
        LinearRail::across_viewport(800.0, 50.0),
    )
    .expect("valid configuration")
}

#[test]
fn steady_novice_sees_base_cadence() {
    let mut director = director_with(farm());
    let mut rng = ScriptedRandom::constant(0.5);
    let mut snapshot = PlayerStateSnapshot::default();
    let mut spawn_times = Vec::new();

    for tick in 1..=50 {
        let now = tick as f32 * DT_MS;
        snapshot.game_time_ms = now;
        let decisions = director.update(DT_MS, &snapshot, &mut rng);
        if decisions.spawn.is_some() {
            spawn_times.push(now);
        }
    }

    assert!(director.difficulty() < 0.1, "difficulty {}", director.difficulty());
    let first = *spawn_times.first().expect("at least one spawn");
    assert!((2_000.0..=2_200.0).contains(&first), "first spawn at {first}");
    assert!(
        spawn_times.iter().filter(|time| **time < 4_000.0).count() == 1,
        "spawns {spawn_times:?}"
    );
}

#[test]
fn repeated_misses_on_last_life_trigger_mercy() {
    let mut director = director_with(farm());
    let mut rng = ScriptedRandom::constant(0.5);
    for _ in 0..10 {
        director.on_animal_missed();
    }
    let snapshot = PlayerStateSnapshot {
        lives: 1,
        recent_misses: 10,
        ..PlayerStateSnapshot::default()
    };

    let _ = director.update(DT_MS, &snapshot, &mut rng);

    assert_eq!(director.player_model().frustration(), 1.0);
    assert_eq!(director.strategy(), SpawnStrategy::Mercy);
    assert_eq!(director.strategy_name(), "mercy");
    assert!(director.is_mercy_mode());
    assert!(director.effective_spawn_gate_ms() > SpawnTuning::default().min_spawn_interval_ms);
    assert!(director.effective_spawn_gate_ms() > director.spawn_interval_ms());
}

/// The spawn director enters mercy mode at one remaining life while the pressure
/// governor's mercy override needs high stress or danger. The thresholds differ
/// on purpose and must not be unified.
#[test]
fn mercy_threshold_is_lives_based() {
    let mut director = director_with(farm());
    let mut rng = ScriptedRandom::constant(0.5);
    let snapshot = PlayerStateSnapshot {
        lives: 1,
        ..PlayerStateSnapshot::default()
    };
    let _ = director.update(DT_MS, &snapshot, &mut rng);
    assert!(director.is_mercy_mode());
    assert_eq!(director.player_model().frustration(), 0.0);
}

#[test]
fn weighted_picks_match_configured_frequencies() {
    let mut director = director_with(farm());
    let mut rng = SeededRandom::from_seed(0x5eed);
    let snapshot = PlayerStateSnapshot::default();
    let mut cows = 0_u32;
    let mut total = 0_u32;

    while total < 2_000 {
        let decisions = director.update(2_500.0, &snapshot, &mut rng);
        if let Some(spawn) = decisions.spawn {
            total += 1;
            if spawn.creature == CreatureKind::new("cow") {
                cows += 1;
            }
            assert_eq!(spawn.classification, SpawnClass::Neutral);
        }
    }

    let share = cows as f32 / total as f32;
    assert!((share - 0.75).abs() < 0.05, "cow share {share}");
}

#[test]
fn remediation_prevents_three_disruptive_spawns_in_a_row() {
    let creatures = CreatureTable::new()
        .with("cow", CreatureConfig::weighted(1.0))
        .with("pig", CreatureConfig::weighted(1.0))
        .with("sheep", CreatureConfig::weighted(1.0));
    let mut director = director_with(creatures);
    let mut rng = SeededRandom::from_seed(20);
    let mut composition = BTreeMap::new();
    let _ = composition.insert(CreatureKind::new("cow"), 2);
    let snapshot = PlayerStateSnapshot {
        level: 20,
        stack_height: 2,
        stack_composition: composition,
        ..PlayerStateSnapshot::default()
    };

    let mut streak = 0;
    let mut spawns = 0;
    while spawns < 300 {
        let decisions = director.update(2_500.0, &snapshot, &mut rng);
        let Some(spawn) = decisions.spawn else {
            continue;
        };
        spawns += 1;
        if spawn.classification == SpawnClass::Disruptive {
            streak += 1;
        } else {
            streak = 0;
        }
        assert!(streak < 3, "three disruptive spawns in a row");
        assert!(director.remediation().history().count() <= 10);
    }
}

#[test]
fn neutral_spawn_settles_owed_compensation() {
    let creatures = CreatureTable::new()
        .with("cow", CreatureConfig::weighted(1.0))
        .with("pig", CreatureConfig::weighted(1.0))
        .with("sheep", CreatureConfig::weighted(1.0));
    let mut director = SpawnDirector::new(
        SpawnTuning::default(),
        creatures,
        PowerUpCatalog::default(),
        LinearRail::across_viewport(800.0, 50.0),
    )
    .expect("valid configuration");
    let mut rng = SeededRandom::from_seed(31);
    // Four cows only build toward a flush, which never counts as helpful.
    let mut composition = BTreeMap::new();
    let _ = composition.insert(CreatureKind::new("cow"), 4);
    let snapshot = PlayerStateSnapshot {
        level: 20,
        lives: 3,
        max_lives: 3,
        stack_height: 4,
        stack_composition: composition,
        ..PlayerStateSnapshot::default()
    };

    let mut starved_neutral = 0;
    let mut spawns = 0;
    while spawns < 300 {
        let remediating = director.remediation().is_active();
        let decisions = director.update(2_500.0, &snapshot, &mut rng);
        let Some(spawn) = decisions.spawn else {
            continue;
        };
        spawns += 1;
        match spawn.classification {
            SpawnClass::Disruptive if remediating => assert!(director.is_compensation_owed()),
            SpawnClass::Disruptive => {}
            _ => {
                assert!(!director.is_compensation_owed());
                if remediating {
                    starved_neutral += 1;
                }
            }
        }
    }
    assert!(starved_neutral > 0);
}

#[test]
fn owed_compensation_bypasses_power_up_cooldown() {
    let cooldown_ms = 60_000.0;
    let creatures = CreatureTable::new()
        .with("pig", CreatureConfig::weighted(1.0))
        .with("sheep", CreatureConfig::weighted(1.0));
    let mut director = SpawnDirector::new(
        SpawnTuning {
            power_up_cooldown_ms: cooldown_ms,
            ..SpawnTuning::default()
        },
        creatures,
        catalog(),
        LinearRail::across_viewport(800.0, 50.0),
    )
    .expect("valid configuration");
    let mut rng = SeededRandom::from_seed(8);
    // Nothing configured matches the stack, so every spawn is disruptive.
    let mut composition = BTreeMap::new();
    let _ = composition.insert(CreatureKind::new("cow"), 4);
    let mut snapshot = PlayerStateSnapshot {
        level: 20,
        lives: 3,
        max_lives: 3,
        stack_height: 4,
        stack_composition: composition,
        ..PlayerStateSnapshot::default()
    };

    let mut owed_seen = false;
    let mut granted_at = None;
    let mut elapsed = 0.0;
    while elapsed < cooldown_ms && granted_at.is_none() {
        elapsed += DT_MS;
        snapshot.game_time_ms = elapsed;
        let decisions = director.update(DT_MS, &snapshot, &mut rng);
        owed_seen |= director.is_compensation_owed();
        if decisions.power_up.is_some() {
            granted_at = Some(elapsed);
            assert!(!director.is_compensation_owed());
        }
    }

    assert!(owed_seen);
    let granted_at = granted_at.expect("compensating power-up before the cooldown");
    assert!(granted_at < cooldown_ms, "granted at {granted_at}");
    assert_eq!(director.last_power_up(), Some(&PowerUpKind::new("hay_bale")));
}

#[test]
fn target_difficulty_never_drops_as_progress_grows() {
    fn target_after_tick(snapshot: &PlayerStateSnapshot) -> f32 {
        let mut director = director_with(farm());
        let mut rng = ScriptedRandom::constant(0.5);
        let _ = director.update(DT_MS, snapshot, &mut rng);
        director.target_difficulty()
    }
    let base = PlayerStateSnapshot {
        lives: 3,
        max_lives: 3,
        catch_rate: 0.5,
        ..PlayerStateSnapshot::default()
    };

    let by_level: Vec<f32> = [1, 2, 5, 10, 25, 40]
        .into_iter()
        .map(|level| target_after_tick(&PlayerStateSnapshot { level, ..base.clone() }))
        .collect();
    let by_time: Vec<f32> = [0.0, 30_000.0, 60_000.0, 300_000.0, 900_000.0]
        .into_iter()
        .map(|game_time_ms| {
            target_after_tick(&PlayerStateSnapshot {
                game_time_ms,
                ..base.clone()
            })
        })
        .collect();
    let by_score: Vec<f32> = [0, 500, 5_000, 100_000, 1_000_000]
        .into_iter()
        .map(|score| target_after_tick(&PlayerStateSnapshot { score, ..base.clone() }))
        .collect();

    for series in [&by_level, &by_time, &by_score] {
        assert!(
            series.windows(2).all(|pair| pair[1] >= pair[0]),
            "not monotone: {series:?}"
        );
        assert!(series.iter().all(|target| (0.0..=1.0).contains(target)));
        assert!(series[series.len() - 1] > series[0]);
    }
}

#[test]
fn drop_preview_is_idempotent() {
    let mut director = director_with(farm());
    let mut rng = ScriptedRandom::constant(0.3);
    let mut composition = BTreeMap::new();
    let _ = composition.insert(CreatureKind::new("chicken"), 1);
    let snapshot = PlayerStateSnapshot {
        stack_height: 1,
        stack_composition: composition,
        ..PlayerStateSnapshot::default()
    };
    let _ = director.update(DT_MS, &snapshot, &mut rng);

    let first = director.drop_preview().expect("preview");
    let second = director.drop_preview().expect("preview");
    assert_eq!(first, second);
    assert_eq!(first.creature, CreatureKind::new("cow"));
    assert_eq!(first.classification, SpawnClass::Helpful);
}

#[test]
fn empty_stack_preview_is_heaviest_type() {
    let director = director_with(farm());
    let preview = director.drop_preview().expect("preview");
    assert_eq!(preview.creature, CreatureKind::new("cow"));
    assert_eq!(preview.classification, SpawnClass::Neutral);
}

#[test]
fn forced_spawn_reports_configuration_errors() {
    let creatures = farm().with(
        "ghost",
        CreatureConfig {
            has_visual_model: false,
            spawn_weight: 1.0,
            ability: None,
            ability_cooldown_ms: None,
        },
    );
    let director = director_with(creatures);
    let snapshot = PlayerStateSnapshot::default();
    let mut rng = ScriptedRandom::constant(0.5);

    assert_eq!(
        director
            .spawn_creature(&CreatureKind::new("ghost"), &snapshot, &mut rng)
            .map(|_| ()),
        Err(ConfigError::MissingVisualModel {
            kind: CreatureKind::new("ghost")
        })
    );

    let spawn = director
        .spawn_creature(&CreatureKind::new("cow"), &snapshot, &mut rng)
        .expect("configured type");
    assert_eq!(spawn.creature, CreatureKind::new("cow"));
    assert!((spawn.rail_t - director.rail_t()).abs() < 1e-6);
}

#[test]
fn long_random_runs_respect_bounds() {
    for seed in 0..8_u64 {
        let mut director = director_with(farm());
        let mut rng = SeededRandom::from_seed(seed);
        let mut host = SeededRandom::from_seed(seed ^ 0xfeed);
        let mut snapshot = PlayerStateSnapshot::default();
        let mut since_spawn = f32::INFINITY;
        let mut last_third_run: Vec<u8> = Vec::new();

        for tick in 0..3_000 {
            snapshot.game_time_ms = tick as f32 * DT_MS;
            snapshot.player_x = 50.0 + host_next(&mut host) * 700.0;
            snapshot.catch_rate = host_next(&mut host);
            snapshot.combo = (host_next(&mut host) * 12.0) as u32;
            snapshot.lives = 1 + (host_next(&mut host) * 3.0) as u32;
            snapshot.level = 1 + tick / 150;
            snapshot.stack_height = (host_next(&mut host) * 15.0) as u32;
            match (host_next(&mut host) * 10.0) as u32 {
                0 => director.on_animal_missed(),
                1 => director.on_animal_caught(CatchQuality::Perfect),
                2 => director.on_stack_topple(),
                3 => director.on_bank_success(3),
                _ => {}
            }

            since_spawn += DT_MS;
            let decisions = director.update(DT_MS, &snapshot, &mut rng);
            assert_bounds(&director);

            if let Some(spawn) = decisions.spawn {
                assert_spawn(&spawn);
                assert!(
                    since_spawn >= SpawnTuning::default().min_spawn_interval_ms * 0.9,
                    "spawns {since_spawn} ms apart"
                );
                since_spawn = 0.0;

                last_third_run.push(third(director.target_rail_t()));
                let run = &last_third_run[last_third_run.len().saturating_sub(3)..];
                assert!(
                    run.len() < 3 || run.iter().any(|t| *t != run[0]),
                    "three strategic targets in the same third"
                );
            }
        }
    }
}

fn host_next(host: &mut SeededRandom) -> f32 {
    host.next()
}

fn third(t: f32) -> u8 {
    if t < 0.33 {
        0
    } else if t > 0.66 {
        2
    } else {
        1
    }
}

fn assert_bounds(director: &SpawnDirector) {
    let unit = 0.0..=1.0;
    let model = director.player_model();
    for value in [
        model.skill(),
        model.fatigue(),
        model.frustration(),
        model.engagement(),
        director.difficulty(),
        director.target_difficulty(),
        director.intensity(),
        director.rail_t(),
    ] {
        assert!(unit.contains(&value), "value {value} left the unit interval");
    }
    let tuning = SpawnTuning::default();
    let interval = director.spawn_interval_ms();
    assert!(interval >= tuning.min_spawn_interval_ms);
    assert!(interval <= tuning.base_spawn_interval_ms);
}

fn assert_spawn(spawn: &SpawnDecision) {
    assert!((0.0..=1.0).contains(&spawn.rail_t));
    assert!((0.0..=1.0).contains(&spawn.target_bias));
    assert!((50.0..=750.0).contains(&spawn.position_x));
    assert!(spawn.velocity_y > 0.0);
}
