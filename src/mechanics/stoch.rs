/// Stochastic mechanics: RNG helpers, normal draws and dropout masks.
/// Note: uses `bevy_prng::WyRand` with `RefCell<>` so callers
/// can keep closures `Fn` while mutating RNG state.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};
use std::cell::RefCell;

use crate::autodiff::Real;

/// Seeded WyRand, wrapped for shared mutation.
#[inline]
pub fn seeded(seed: u64) -> RefCell<WyRand> {
    RefCell::new(WyRand::from_seed(seed.to_le_bytes()))
}

/// Uniform [0, 1) with 53 bits of precision.
#[inline]
pub fn uniform01(rng: &RefCell<WyRand>) -> f64 {
    let mut r = rng.borrow_mut();
    ((r.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Gaussian(0,1) via Box–Muller using WyRand.
#[inline]
pub fn gaussian01(rng: &RefCell<WyRand>) -> f64 {
    // 1 - u keeps the log argument in (0, 1].
    let u1 = 1.0 - uniform01(rng);
    let u2 = uniform01(rng);
    let r = (-2.0 * u1.ln()).sqrt();
    let t = 2.0 * std::f64::consts::PI * u2;
    r * t.cos()
}

/// Gaussian(mu, sigma).
#[inline]
pub fn normal(rng: &RefCell<WyRand>, mu: f64, sigma: f64) -> f64 {
    mu + sigma * gaussian01(rng)
}

/// Bernoulli(p) with WyRand.
#[inline]
pub fn bernoulli(rng: &RefCell<WyRand>, p: f64) -> bool {
    uniform01(rng) < p.clamp(0.0, 1.0)
}

/// Inverted dropout: zero each element with probability `p`, scale the
/// survivors by `1 / (1 - p)`. `p == 0` is the identity.
#[derive(Debug)]
pub struct Dropout {
    p: f64,
    rng: RefCell<WyRand>,
}

impl Dropout {
    pub fn new(p: f64, seed: u64) -> Self {
        Self {
            p: p.clamp(0.0, 1.0),
            rng: seeded(seed),
        }
    }

    /// Never drops anything.
    pub fn off() -> Self {
        Self::new(0.0, 0)
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn apply<T: Real>(&self, xs: Vec<T>) -> Vec<T> {
        if self.p <= 0.0 {
            return xs;
        }
        if self.p >= 1.0 {
            return xs.into_iter().map(|x| x * 0.0).collect();
        }
        let scale = 1.0 / (1.0 - self.p);
        xs.into_iter()
            .map(|x| {
                if bernoulli(&self.rng, self.p) {
                    x * 0.0
                } else {
                    x * scale
                }
            })
            .collect()
    }
}

/// Apply an optional dropout.
#[inline]
pub fn maybe_drop<T: Real>(dropout: Option<&Dropout>, xs: Vec<T>) -> Vec<T> {
    match dropout {
        Some(d) => d.apply(xs),
        None => xs,
    }
}
