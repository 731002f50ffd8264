//! Seeded randomness shared by the engine and the model plugins.
//!
//! Every simulation owns exactly one `SimRng`. All draws go through it in a
//! fixed order, so a scene replayed with the same seed yields the same run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    inner: StdRng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng {
            seed,
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[min, max]`, both ends included. Callers must
    /// pass `min <= max`; an inverted range yields `min`.
    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        if min > max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Uniform float in `[min, max)`; returns `min` for an empty range.
    pub fn random_f64(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..max)
    }

    /// Bernoulli trial. Probabilities outside `[0, 1]` are clamped.
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability.is_nan() {
            return false;
        }
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Sample from `Normal(mean, sigma)`. A non-positive sigma returns the mean.
    pub fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        match Normal::new(mean, sigma) {
            Ok(dist) if sigma > 0.0 => dist.sample(&mut self.inner),
            _ => mean,
        }
    }
}

/// Stable per-pair hash in `[0, 1)`, used where a decision must not change
/// between rounds (e.g. the grey zone of a quasi unit disk graph).
pub fn pair_unit_hash(seed: u64, a: u64, b: u64) -> f64 {
    let mut z = seed ^ a.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ b.rotate_left(32);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}
