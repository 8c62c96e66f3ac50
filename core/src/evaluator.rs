//! Ordered evaluator tables used to pick a pacing strategy every tick.
//!
//! A table is a fixed slice of `(kind, bias, score)` entries. Each tick every
//! entry is scored against an immutable context, the raw score is multiplied by
//! the entry's bias, and the entry with the largest product wins. Ties resolve
//! to the entry listed first. Both pacing controllers instantiate this engine
//! with their own tables and must not diverge from that rule.

/// One scored entry of an evaluator table.
pub struct Evaluator<K, S: ?Sized> {
    /// Strategy selected when this entry wins.
    pub kind: K,
    /// Fixed multiplier applied to the raw score.
    pub bias: f32,
    /// Raw desirability, roughly in `[0, 1]`.
    pub score: fn(&S) -> f32,
}

/// Winning entry of a table evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection<K> {
    /// Selected strategy.
    pub kind: K,
    /// Score multiplied by the winner's bias.
    pub weighted: f32,
}

/// Change of the active strategy reported by [`StrategySelector::evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<K> {
    /// Strategy active before the tick.
    pub from: K,
    /// Strategy active after the tick.
    pub to: K,
}

/// Scores every entry and returns the one with the largest weighted score.
///
/// Returns `None` only for an empty table.
pub fn select<K, S>(table: &[Evaluator<K, S>], context: &S) -> Option<Selection<K>>
where
    K: Copy,
    S: ?Sized,
{
    let mut best: Option<Selection<K>> = None;
    for evaluator in table {
        let weighted = (evaluator.score)(context) * evaluator.bias;
        let replace = match best {
            None => true,
            Some(current) => weighted > current.weighted,
        };
        if replace {
            best = Some(Selection {
                kind: evaluator.kind,
                weighted,
            });
        }
    }
    best
}

/// Holds the active strategy and how long it has been occupied.
#[derive(Clone, Debug)]
pub struct StrategySelector<K> {
    active: K,
    occupancy_ms: f32,
}

impl<K> StrategySelector<K>
where
    K: Copy + PartialEq,
{
    /// Creates a selector starting in `initial`.
    #[must_use]
    pub fn new(initial: K) -> Self {
        Self {
            active: initial,
            occupancy_ms: 0.0,
        }
    }

    /// Currently active strategy.
    #[must_use]
    pub fn active(&self) -> K {
        self.active
    }

    /// Time spent in the active strategy since it was entered.
    #[must_use]
    pub fn occupancy_ms(&self) -> f32 {
        self.occupancy_ms
    }

    /// Re-evaluates the table and reports a transition when the winner changed.
    ///
    /// The occupancy timer restarts at zero on every transition and otherwise
    /// accumulates `dt_ms`.
    pub fn evaluate<S>(
        &mut self,
        table: &[Evaluator<K, S>],
        context: &S,
        dt_ms: f32,
    ) -> Option<Transition<K>>
    where
        S: ?Sized,
    {
        let Some(selection) = select(table, context) else {
            self.occupancy_ms += dt_ms;
            return None;
        };

        if selection.kind == self.active {
            self.occupancy_ms += dt_ms;
            return None;
        }

        let from = self.active;
        self.active = selection.kind;
        self.occupancy_ms = 0.0;
        Some(Transition {
            from,
            to: selection.kind,
        })
    }
}
