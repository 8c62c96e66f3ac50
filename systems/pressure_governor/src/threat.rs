use barnstack_core::{clamp_unit, BehaviorKind};
use serde::{Deserialize, Serialize};

const PROXIMITY_RANGE: f32 = 600.0;

/// Falling creature as seen by the governor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FallingThreat {
    /// Movement behaviour of the creature.
    pub behavior: BehaviorKind,
    /// Current vertical position.
    pub y: f32,
    /// Vertical position of the stack top it is heading for.
    pub target_y: f32,
}

fn weight(behavior: BehaviorKind) -> f32 {
    match behavior {
        BehaviorKind::Seeker | BehaviorKind::Dive => 0.15,
        BehaviorKind::Zigzag => 0.10,
        BehaviorKind::Normal | BehaviorKind::Evader | BehaviorKind::Floater => 0.05,
    }
}

/// Threat contributed by falling creatures, in `[0, 1]`.
///
/// Each creature adds its behaviour weight scaled by how close it is to its
/// target; creatures further than 600 units away contribute nothing.
#[must_use]
pub fn accumulate_threat(falling: &[FallingThreat]) -> f32 {
    let total: f32 = falling
        .iter()
        .map(|threat| {
            let proximity = (1.0 - (threat.y - threat.target_y).abs() / PROXIMITY_RANGE).max(0.0);
            weight(threat.behavior) * proximity
        })
        .sum();
    clamp_unit(total)
}
