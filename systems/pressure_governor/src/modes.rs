use barnstack_core::{evaluator::Evaluator, PressureMode};

const MERCY_STRESS: f32 = 0.7;

/// Governor state scored by the mode table.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ModeContext {
    pub(crate) stack_height: u32,
    pub(crate) threat_level: f32,
    pub(crate) stress: f32,
    pub(crate) game_level: u32,
    pub(crate) danger: bool,
}

/// Pressure modes in tie-break order.
pub(crate) const PRESSURE_MODES: [Evaluator<PressureMode, ModeContext>; 4] = [
    Evaluator {
        kind: PressureMode::Steady,
        bias: 0.5,
        score: steady,
    },
    Evaluator {
        kind: PressureMode::Pulse,
        bias: 0.4,
        score: pulse,
    },
    Evaluator {
        kind: PressureMode::Mercy,
        bias: 0.3,
        score: mercy,
    },
    Evaluator {
        kind: PressureMode::Chaos,
        bias: 0.35,
        score: chaos,
    },
];

fn steady(context: &ModeContext) -> f32 {
    0.5 + (context.stack_height as f32 / 20.0) * 0.3 - context.stress * 0.2
}

fn pulse(context: &ModeContext) -> f32 {
    context.threat_level * 0.5 + (1.0 - context.stress) * 0.3
}

// Independent of the spawn director's lives/frustration mercy trigger.
fn mercy(context: &ModeContext) -> f32 {
    if context.stress > MERCY_STRESS || context.danger {
        return 0.9;
    }
    context.stress * 0.5
}

fn chaos(context: &ModeContext) -> f32 {
    (context.game_level as f32 / 25.0) * 0.4
        + (1.0 - context.stress) * 0.3
        + (context.stack_height as f32 / 10.0).min(1.0) * 0.2
}
