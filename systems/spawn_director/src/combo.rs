//! Combo-fairness analysis of the stack and the remediation tracker.
//!
//! The stack is treated as a multiset of creature types. Each in-progress
//! scoring shape lists the spawnable types that would advance it together with
//! a heuristic completion probability; the next spawn is then classified as
//! helpful, neutral or disruptive against that list.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use barnstack_core::{CreatureKind, CreatureTable, RandomSource, SpawnClass};
use serde::Serialize;

/// Completion probability a shape needs before advancing it counts as helpful.
pub const HELPFUL_THRESHOLD: f32 = 0.35;

const HISTORY_LEN: usize = 10;
const REMEDIATION_STREAK: u32 = 2;

/// Yahtzee-style scoring shapes definable over the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboShape {
    /// Two of one type.
    Pair,
    /// Two distinct pairs.
    TwoPair,
    /// Three of one type.
    ThreeOfKind,
    /// Four of one type.
    FourOfKind,
    /// Three of one type plus two of another.
    FullHouse,
    /// One of every spawnable type.
    Straight,
    /// Five or more of one type.
    Flush,
}

/// A shape in progress and the types that would advance it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComboProgress {
    /// Scoring shape.
    pub shape: ComboShape,
    /// Spawnable types that advance the shape.
    pub advancing: BTreeSet<CreatureKind>,
    /// Heuristic probability that the shape completes.
    pub completion: f32,
}

/// Combo opportunities derived from the current stack composition.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComboAnalysis {
    progress: Vec<ComboProgress>,
    stack_empty: bool,
}

impl ComboAnalysis {
    /// Analyses `composition` against the spawnable types in `table`.
    #[must_use]
    pub fn analyze(composition: &BTreeMap<CreatureKind, u32>, table: &CreatureTable) -> Self {
        let stacked: Vec<(&CreatureKind, u32)> = composition
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(kind, count)| (kind, *count))
            .collect();
        if stacked.is_empty() {
            return Self {
                progress: Vec::new(),
                stack_empty: true,
            };
        }

        let spawnable: BTreeSet<&CreatureKind> = table.spawnable().map(|(kind, _)| kind).collect();
        let with_count = |predicate: &dyn Fn(u32) -> bool| -> BTreeSet<CreatureKind> {
            stacked
                .iter()
                .filter(|(kind, count)| predicate(*count) && spawnable.contains(kind))
                .map(|(kind, _)| (*kind).clone())
                .collect()
        };

        let pairs = stacked.iter().filter(|(_, count)| *count >= 2).count();
        let has_triple = stacked.iter().any(|(_, count)| *count >= 3);

        let mut progress = Vec::new();
        let mut push = |shape, advancing: BTreeSet<CreatureKind>, completion: f32| {
            if !advancing.is_empty() {
                progress.push(ComboProgress {
                    shape,
                    advancing,
                    completion,
                });
            }
        };

        push(ComboShape::Pair, with_count(&|count: u32| count == 1), 0.6);
        if pairs == 1 {
            push(ComboShape::TwoPair, with_count(&|count: u32| count == 1), 0.5);
        }
        push(ComboShape::ThreeOfKind, with_count(&|count: u32| count == 2), 0.5);
        push(ComboShape::FourOfKind, with_count(&|count: u32| count == 3), 0.4);

        if has_triple {
            let pairs_outside = with_count(&|count: u32| count == 2);
            let completion = if pairs_outside.is_empty() { 0.3 } else { 0.45 };
            let advancing = with_count(&|count: u32| count == 1 || count == 2);
            push(ComboShape::FullHouse, advancing, completion);
        } else if pairs >= 2 {
            push(ComboShape::FullHouse, with_count(&|count: u32| count == 2), 0.45);
        }

        let flush_max = stacked.iter().map(|(_, count)| *count).max().unwrap_or(0);
        if flush_max >= 4 {
            let completion = (0.3 + 0.05 * (flush_max - 4) as f32).min(0.5);
            push(ComboShape::Flush, with_count(&|count: u32| count >= 4), completion);
        }

        let present = stacked
            .iter()
            .filter(|(kind, _)| spawnable.contains(kind))
            .count();
        let total = spawnable.len();
        if total >= 2 && present * 2 >= total && present < total {
            let missing: BTreeSet<CreatureKind> = spawnable
                .iter()
                .filter(|kind| !composition.get(**kind).is_some_and(|count| *count > 0))
                .map(|kind| (*kind).clone())
                .collect();
            push(ComboShape::Straight, missing, present as f32 / total as f32);
        }

        Self {
            progress,
            stack_empty: false,
        }
    }

    /// Shapes currently in progress.
    #[must_use]
    pub fn progress(&self) -> &[ComboProgress] {
        &self.progress
    }

    /// Reports whether the analysed stack was empty.
    #[must_use]
    pub fn is_stack_empty(&self) -> bool {
        self.stack_empty
    }

    /// Classifies a candidate type against the shapes in progress.
    ///
    /// Every type is neutral on an empty stack.
    #[must_use]
    pub fn classify(&self, kind: &CreatureKind) -> SpawnClass {
        if self.stack_empty {
            return SpawnClass::Neutral;
        }
        let best = self
            .progress
            .iter()
            .filter(|progress| progress.advancing.contains(kind))
            .map(|progress| progress.completion)
            .fold(None, |best: Option<f32>, value| {
                Some(best.map_or(value, |current| current.max(value)))
            });
        match best {
            None => SpawnClass::Disruptive,
            Some(completion) if completion >= HELPFUL_THRESHOLD => SpawnClass::Helpful,
            Some(_) => SpawnClass::Neutral,
        }
    }

    /// Spawnable types of `table` that fall into `class`, in tag order.
    #[must_use]
    pub fn kinds_in(&self, class: SpawnClass, table: &CreatureTable) -> Vec<CreatureKind> {
        table
            .spawnable()
            .map(|(kind, _)| kind)
            .filter(|kind| self.classify(kind) == class)
            .cloned()
            .collect()
    }
}

/// Game phase derived from the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Levels 1 through 5.
    Early,
    /// Levels 6 through 15.
    Mid,
    /// Level 16 onward.
    Late,
}

impl GamePhase {
    /// Classifies a level.
    #[must_use]
    pub fn from_level(level: u32) -> Self {
        match level {
            0..=5 => Self::Early,
            6..=15 => Self::Mid,
            _ => Self::Late,
        }
    }

    /// Target share of helpful, neutral and disruptive spawns in this phase.
    #[must_use]
    pub fn fairness(self) -> FairnessSplit {
        match self {
            Self::Early => FairnessSplit::new(0.70, 0.20, 0.10),
            Self::Mid => FairnessSplit::new(0.50, 0.30, 0.20),
            Self::Late => FairnessSplit::new(0.35, 0.30, 0.35),
        }
    }
}

/// Probability split between spawn classifications.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FairnessSplit {
    /// Share of helpful spawns.
    pub helpful: f32,
    /// Share of neutral (weighted-random) spawns.
    pub neutral: f32,
    /// Share of disruptive spawns.
    pub disruptive: f32,
}

impl FairnessSplit {
    const fn new(helpful: f32, neutral: f32, disruptive: f32) -> Self {
        Self {
            helpful,
            neutral,
            disruptive,
        }
    }

    fn bucket(self, roll: f32) -> SpawnClass {
        if roll < self.helpful {
            SpawnClass::Helpful
        } else if roll < self.helpful + self.neutral {
            SpawnClass::Neutral
        } else {
            SpawnClass::Disruptive
        }
    }
}

/// Tracks consecutive disruptive spawns and forces a correction after a streak.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RemediationTracker {
    consecutive_disruptive: u32,
    history: VecDeque<SpawnClass>,
}

impl RemediationTracker {
    /// Records the classification of an emitted spawn.
    pub fn record(&mut self, class: SpawnClass) {
        if class == SpawnClass::Disruptive {
            self.consecutive_disruptive += 1;
        } else {
            self.consecutive_disruptive = 0;
        }
        if self.history.len() == HISTORY_LEN {
            let _ = self.history.pop_front();
        }
        self.history.push_back(class);
    }

    /// Disruptive spawns emitted in a row.
    #[must_use]
    pub fn consecutive_disruptive(&self) -> u32 {
        self.consecutive_disruptive
    }

    /// Whether the next pick must be corrected.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.consecutive_disruptive >= REMEDIATION_STREAK
    }

    /// Most recent classifications, oldest first.
    pub fn history(&self) -> impl Iterator<Item = SpawnClass> + '_ {
        self.history.iter().copied()
    }
}

/// Creature chosen by the fairness pipeline.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CreaturePick {
    pub(crate) kind: CreatureKind,
    pub(crate) class: SpawnClass,
    /// Remediation was required but no helpful type existed.
    pub(crate) starved: bool,
}

/// Picks the next creature type and records its classification.
pub(crate) fn pick_creature<R>(
    table: &CreatureTable,
    composition: &BTreeMap<CreatureKind, u32>,
    level: u32,
    tracker: &mut RemediationTracker,
    rng: &mut R,
) -> Option<CreaturePick>
where
    R: RandomSource + ?Sized,
{
    let analysis = ComboAnalysis::analyze(composition, table);
    if analysis.is_stack_empty() {
        let kind = table.pick_weighted(rng)?;
        tracker.record(SpawnClass::Neutral);
        return Some(CreaturePick {
            kind,
            class: SpawnClass::Neutral,
            starved: false,
        });
    }

    let helpful = analysis.kinds_in(SpawnClass::Helpful, table);
    let mut starved = false;
    let kind = if tracker.is_active() {
        if helpful.is_empty() {
            starved = true;
            table.pick_weighted(rng)?
        } else {
            table.pick_weighted_from(&helpful, rng)?
        }
    } else {
        let bucket = match GamePhase::from_level(level).fairness().bucket(rng.next()) {
            SpawnClass::Helpful => helpful,
            SpawnClass::Disruptive => analysis.kinds_in(SpawnClass::Disruptive, table),
            SpawnClass::Neutral => Vec::new(),
        };
        if bucket.is_empty() {
            table.pick_weighted(rng)?
        } else {
            table.pick_weighted_from(&bucket, rng)?
        }
    };

    let class = analysis.classify(&kind);
    tracker.record(class);
    Some(CreaturePick {
        kind,
        class,
        starved,
    })
}
