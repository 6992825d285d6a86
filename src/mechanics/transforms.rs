/// Curve transforms used to reshape scalar curves (generic over `Real`,
/// so offsets and steepness can be trained).
use crate::autodiff::Real;

/// ln(1 + e^{kx}).
#[inline]
pub fn softplus<T: Real>(x: T, k: T) -> T {
    ((k * x).exp() + 1.0).ln()
}

/// 1 + e^{-(x - offset)}.
#[inline]
pub fn exponential<T: Real>(x: T, offset: T) -> T {
    (-(x - offset)).exp() + 1.0
}

/// Logistic centred on `offset`, range (0, 1).
#[inline]
pub fn sigmoid<T: Real>(x: T, offset: T) -> T {
    exponential(x, offset).recip()
}

/// Logistic rescaled to (-1, 1).
#[inline]
pub fn sigmoid_biunit<T: Real>(x: T, offset: T) -> T {
    exponential(x, offset).recip() * 2.0 - 1.0
}

/// 1 / (1 + e^{-k x³}), range (0, 1); flat around the origin.
#[inline]
pub fn cubic_sigmoid<T: Real>(x: T, k: T) -> T {
    ((-(x.powi(3) * k)).exp() + 1.0).recip()
}

/// Cubic sigmoid rescaled to (-1, 1).
#[inline]
pub fn cubic_sigmoid_biunit<T: Real>(x: T, k: T) -> T {
    cubic_sigmoid(x, k) * 2.0 - 1.0
}

/// 1 - 2 / (1 + e^{k (x - offset)²}); 0 at `offset`, rising to 1.
#[inline]
pub fn hump<T: Real>(x: T, offset: T, k: T) -> T {
    -(((x - offset).square() * k).exp() + 1.0).recip() * 2.0 + 1.0
}

/// x · e^{-k (x - offset)²}.
#[inline]
pub fn hump_pair<T: Real>(x: T, offset: T, k: T) -> T {
    x * (-(k * (x - offset).square())).exp()
}

/// Lower stationary point of [`hump_pair`]:
/// (offset·k - sqrt(k (offset² k + 2))) / 2k.
#[inline]
pub fn hump_pair_root<T: Real>(offset: T, k: T) -> T {
    (offset * k - (k * (offset.square() * k + 2.0)).sqrt()) / (k * 2.0)
}

/// |hump_pair| at its lower stationary point.
#[inline]
pub fn hump_pair_max_abs<T: Real>(offset: T, k: T) -> T {
    hump_pair(hump_pair_root(offset, k), offset, k).abs()
}

/// [`hump_pair`] scaled by [`hump_pair_max_abs`].
#[inline]
pub fn hump_pair_biunit<T: Real>(x: T, offset: T, k: T) -> T {
    hump_pair(x, offset, k) / hump_pair_max_abs(offset, k)
}

/// Sigmoid squashing followed by a normalised hump pair.
#[inline]
pub fn sigmoid_hump_pair<T: Real>(x: T, offset1: T, offset2: T, k: T) -> T {
    hump_pair_biunit(sigmoid_biunit(x, offset1), offset2, k)
}
