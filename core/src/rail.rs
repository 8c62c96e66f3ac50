//! Geometry of the rail carrying the spawn indicator.

use serde::{Deserialize, Serialize};

/// Maps between world-space horizontal positions and the normalised rail parameter.
pub trait RailGeometry {
    /// Converts a world position into a rail parameter in `[0, 1]`.
    fn world_x_to_rail_t(&self, x: f32) -> f32;

    /// Converts a rail parameter into a world position.
    fn rail_t_to_world_x(&self, t: f32) -> f32;
}

/// Straight horizontal rail spanning `[left, right]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRail {
    left: f32,
    right: f32,
}

impl LinearRail {
    /// Creates a rail between two world positions.
    #[must_use]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Creates a rail spanning a viewport with the given margin on both sides.
    #[must_use]
    pub fn across_viewport(width: f32, margin: f32) -> Self {
        Self::new(margin, (width - margin).max(margin))
    }
}

impl RailGeometry for LinearRail {
    fn world_x_to_rail_t(&self, x: f32) -> f32 {
        let span = self.right - self.left;
        if span.abs() <= f32::EPSILON {
            return 0.5;
        }
        crate::clamp_unit((x - self.left) / span)
    }

    fn rail_t_to_world_x(&self, t: f32) -> f32 {
        crate::lerp(self.left, self.right, crate::clamp_unit(t))
    }
}
