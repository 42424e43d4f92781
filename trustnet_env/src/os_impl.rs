//! Ad-hoc implementation of RandomSource using OS entropy.

use crate::RandomSource;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Random source seeded from the operating system.
///
/// This is the "real" implementation used outside of simulation runs,
/// e.g. when a device is exercised interactively. Draws are not
/// reproducible.
pub struct OsRandom {
    rng: StdRng,
}

impl OsRandom {
    /// Creates a new OsRandom.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for OsRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for OsRandom {
    fn entropy(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn seed(&self) -> u64 {
        // Not seeded
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_random_seed() {
        let rng = OsRandom::new();
        assert_eq!(rng.seed(), 0);
    }

    #[test]
    fn test_os_random_draws() {
        let mut rng = OsRandom::new();
        let u = rng.unit();
        assert!((0.0..1.0).contains(&u));
        assert!(rng.index(5).unwrap() < 5);
    }
}
