//! Core randomness trait for TrustNet devices.

use crate::error::EnvError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};

/// The central interface for randomness.
///
/// This trait abstracts the entropy source so that the forwarding engine
/// can run with OS entropy or with a seeded generator.
///
/// # Implementations
///
/// - **Ad-hoc**: `OsRandom` - wraps an entropy-seeded `StdRng`
/// - **Simulation**: `SimRandom` - wraps `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// Implementors only supply the underlying generator. All draws are
/// provided methods, so two sources built from the same generator state
/// make identical decisions.
pub trait RandomSource {
    /// Returns the underlying generator.
    fn entropy(&mut self) -> &mut dyn RngCore;

    /// Returns the source's seed (for logging/debugging).
    ///
    /// Unseeded sources return 0.
    fn seed(&self) -> u64;

    /// Draws a uniform value in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        self.entropy().gen::<f64>()
    }

    /// Draws a uniform index in `0..len`.
    fn index(&mut self, len: usize) -> Result<usize, EnvError> {
        if len == 0 {
            return Err(EnvError::EmptyChoice);
        }
        Ok(self.entropy().gen_range(0..len))
    }

    /// Draws an index with probability proportional to `weights[i]`.
    ///
    /// # Errors
    /// `EnvError::InvalidWeights` when the weights are empty, negative,
    /// non-finite or all zero.
    fn weighted_index(&mut self, weights: &[f64]) -> Result<usize, EnvError> {
        let dist = WeightedIndex::new(weights).map_err(EnvError::weights)?;
        Ok(dist.sample(self.entropy()))
    }
}
