//! Test doubles for hosts and controller tests.

use crate::RandomSource;

/// Random source that replays a fixed list of samples in a loop.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    samples: Vec<f32>,
    cursor: usize,
    draws: usize,
}

impl ScriptedRandom {
    /// Creates a source cycling through `samples`; an empty list always yields 0.
    #[must_use]
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            cursor: 0,
            draws: 0,
        }
    }

    /// Creates a source that always yields `value`.
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples drawn so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next(&mut self) -> f32 {
        self.draws += 1;
        if self.samples.is_empty() {
            return 0.0;
        }
        let value = self.samples[self.cursor % self.samples.len()];
        self.cursor = (self.cursor + 1) % self.samples.len();
        value
    }
}
