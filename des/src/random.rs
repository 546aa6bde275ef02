//! Random delays for paced simulations
//!
//! Models consume randomness through [`UniformSource`], the single capability
//! of producing a uniform float in `[0, 1)`. Seeded `StdRng` is the normal
//! implementation; [`FixedUniform`] pins the draw to a constant so tests can
//! produce exact, repeatable intervals (`FixedUniform(0.0)` gives zero delay).
//!
//! # Determinism
//!
//! Give every run its own source, seeded from a base seed plus the run index:
//!
//! ```rust
//! use des::random::RandomIntervalSource;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let base_seed = 42;
//! let point = 3;
//! let mut a = RandomIntervalSource::new(StdRng::seed_from_u64(base_seed + point));
//! let mut b = RandomIntervalSource::new(StdRng::seed_from_u64(base_seed + point));
//! assert_eq!(a.next(2.0), b.next(2.0));
//! ```

use rand::Rng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Something that can produce a uniform draw in `[0, 1)`
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl UniformSource for StdRng {
    fn next_uniform(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// A source that always returns the same value
///
/// Values outside `[0, 1)` are clamped into range when drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedUniform(pub f64);

impl UniformSource for FixedUniform {
    fn next_uniform(&mut self) -> f64 {
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Exponentially distributed intervals by inverse-transform sampling
#[derive(Debug, Clone)]
pub struct RandomIntervalSource<U> {
    uniform: U,
}

impl<U: UniformSource> RandomIntervalSource<U> {
    pub fn new(uniform: U) -> Self {
        RandomIntervalSource { uniform }
    }

    /// Draw the next interval for events occurring at `rate` per time unit
    ///
    /// Returns `-ln(1 - U) / rate`; the mean of the draws is `1 / rate`.
    pub fn next(&mut self, rate: f64) -> f64 {
        let u = self.uniform.next_uniform();
        -(1.0 - u).ln() / rate
    }
}

/// Convert a span of model time into wall-clock time
///
/// `unit` is the wall-clock length of one model time unit. Negative or NaN
/// spans collapse to zero and spans too long to represent saturate.
pub fn scaled(unit: Duration, units: f64) -> Duration {
    let secs = unit.as_secs_f64() * units;
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
