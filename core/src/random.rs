//! Explicit, seedable randomness threaded through every controller call.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform random primitive consumed by the pacing controllers.
///
/// Every higher-level draw is built from [`RandomSource::next`], so replaying the
/// same sequence of samples reproduces the same decisions bit for bit.
pub trait RandomSource {
    /// Returns the next sample in `[0, 1)`.
    fn next(&mut self) -> f32;

    /// Returns a sample in `[min, max)`.
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next()
    }

    /// Returns a sample in `[-amplitude, amplitude)`.
    fn jitter(&mut self, amplitude: f32) -> f32 {
        (self.next() - 0.5) * 2.0 * amplitude
    }

    /// Returns `true` with the given probability.
    fn chance(&mut self, probability: f32) -> bool {
        self.next() < probability
    }
}

impl<R> RandomSource for &mut R
where
    R: RandomSource + ?Sized,
{
    fn next(&mut self) -> f32 {
        (**self).next()
    }
}

/// Deterministic random source backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a source from a 64-bit seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}
