#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Seeded source of randomness for observing variables.
///
/// The same seed always yields the same sequence. Independent sub-streams for parallel
/// batches are derived with [`RandomSource::spawn_child`], which is itself deterministic.
#[derive(Clone, Debug)]
pub struct RandomSource {
    rng: ChaCha8Rng,
}

impl RandomSource {
    /// Creates a source from a seed.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::RandomSource;
    ///
    /// let mut a = RandomSource::seeded(42);
    /// let mut b = RandomSource::seeded(42);
    /// assert_eq!(a.next_f64(), b.next_f64());
    /// ```
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform draw from `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform index from `0..bound`. `bound` must be positive.
    pub fn next_index(&mut self, bound: usize) -> usize {
        self.rng.random_range(0..bound)
    }

    /// `true` with probability `p`.
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Standard normal deviate (Box-Muller transform).
    pub fn next_gaussian(&mut self) -> f64 {
        // 1 - u lies in (0, 1], so the logarithm stays finite
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Rounds `x` down and adds one with probability equal to its fractional part.
    ///
    /// Integral inputs are returned unchanged; 0.3 becomes 1 with probability 0.3. Negative
    /// and NaN inputs yield 0.
    pub fn round_stochastic(&mut self, x: f64) -> u64 {
        if x.is_nan() || x <= 0.0 {
            return 0;
        }
        let floor = x.floor();
        let fraction = x - floor;
        let base = floor as u64;
        if fraction > 0.0 && self.next_bool(fraction) {
            base + 1
        } else {
            base
        }
    }

    /// Gamma deviate with the given shape and scale.
    ///
    /// Marsaglia and Tsang for `shape >= 1`, boosted through `shape + 1` below that.
    pub fn gamma(&mut self, shape: f64, scale: f64) -> f64 {
        if shape < 1.0 {
            let boosted = self.gamma(shape + 1.0, scale);
            let u = 1.0 - self.next_f64();
            return boosted * u.powf(1.0 / shape);
        }

        let d = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * d).sqrt();
        loop {
            let normal_sample = self.next_gaussian();
            let v = (1.0 + c * normal_sample).powi(3);
            if v <= 0.0 {
                continue;
            }
            let u = 1.0 - self.next_f64();
            if u < 1.0 - 0.0331 * normal_sample.powi(4)
                || u.ln() < 0.5 * normal_sample.powi(2) + d * (1.0 - v + v.ln())
            {
                return d * v * scale;
            }
        }
    }

    /// Beta deviate as the ratio of two gamma deviates.
    pub fn beta(&mut self, alpha: f64, beta: f64) -> f64 {
        let x = self.gamma(alpha, 1.0);
        let y = self.gamma(beta, 1.0);
        x / (x + y)
    }

    /// Number of successes in `trials` Bernoulli(`p`) trials, counted one by one.
    pub fn binomial(&mut self, trials: u64, p: f64) -> u64 {
        let mut successes = 0;
        for _ in 0..trials {
            if self.next_bool(p) {
                successes += 1;
            }
        }
        successes
    }

    /// Derives an independent sub-stream. Advances this source by one draw.
    #[must_use]
    pub fn spawn_child(&mut self) -> RandomSource {
        RandomSource::seeded(self.rng.next_u64())
    }
}
