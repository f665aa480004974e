//! Seedable randomness for emitters.
//!
//! Emitters never reach for a thread-local RNG. Each one owns a [`Flavor`]
//! derived from the world seed and a per-emitter salt, so two runs with the
//! same configuration roll the same dice.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A small deterministic RNG with the handful of draws emitters need.
#[derive(Debug, Clone)]
pub struct Flavor {
    rng: SmallRng,
}

impl Flavor {
    /// Create a flavor from a raw seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Create a flavor from the world seed mixed with a salt string.
    ///
    /// Different salts give independent streams from the same world seed.
    pub fn salted(seed: u64, salt: &str) -> Self {
        // FNV-1a over the salt, folded into the seed.
        let mixed = salt.bytes().fold(seed ^ 0xcbf2_9ce4_8422_2325, |acc, byte| {
            (acc ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        });
        Self::seeded(mixed)
    }

    /// `true` with probability `numerator / denominator`.
    ///
    /// A zero denominator never fires.
    pub fn chance(&mut self, numerator: u32, denominator: u32) -> bool {
        if denominator == 0 {
            return false;
        }
        self.rng.random_ratio(numerator.min(denominator), denominator)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform draw in `[-width, width]`. Zero or invalid widths yield `0.0`.
    pub fn jitter(&mut self, width: f64) -> f64 {
        if !width.is_finite() || width <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(-width..=width)
    }

    /// A uniformly chosen element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..items.len());
        items.get(idx)
    }
}
