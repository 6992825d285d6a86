//! Series mechanics: padding, rolling windows, differences, random walks.
//!
//! Everything is generic over [`Real`], so the same helper serves plain
//! evaluation and taped losses. Padding values are constants (no gradient).

use bevy_prng::WyRand;
use std::cell::RefCell;

use crate::autodiff::{Real, sum};
use crate::mechanics::stoch;
use crate::{FitError, FitResult};

/// Prepend `n` copies of `fill`.
pub fn pad_left<T: Real>(xs: &[T], n: usize, fill: T) -> Vec<T> {
    let mut out = Vec::with_capacity(xs.len() + n);
    out.extend(std::iter::repeat_n(fill, n));
    out.extend_from_slice(xs);
    out
}

/// Append `n` copies of `fill`.
pub fn pad_right<T: Real>(xs: &[T], n: usize, fill: T) -> Vec<T> {
    let mut out = Vec::with_capacity(xs.len() + n);
    out.extend_from_slice(xs);
    out.extend(std::iter::repeat_n(fill, n));
    out
}

#[inline]
fn check_window(len: usize, n: usize) -> FitResult<()> {
    if n == 0 || n > len {
        return Err(FitError::Window { window: n, len });
    }
    Ok(())
}

/// One window of length `n` ending at every position, left-padded with zeros.
/// Window `i` covers `xs[i+1-n ..= i]`.
pub fn rolling_windows<T: Real>(xs: &[T], n: usize) -> FitResult<Vec<Vec<T>>> {
    check_window(xs.len(), n)?;
    let padded = pad_left(xs, n - 1, xs[0].lift(0.0));
    Ok(padded.windows(n).map(<[T]>::to_vec).collect())
}

/// Trailing mean at every position. Padding counts as neither sum nor
/// sample, so a constant series is its own rolling mean.
pub fn rolling_mean<T: Real>(xs: &[T], n: usize) -> FitResult<Vec<T>> {
    check_window(xs.len(), n)?;
    Ok((0..xs.len())
        .map(|i| {
            let lo = (i + 1).saturating_sub(n);
            let w = &xs[lo..=i];
            // w is never empty: lo <= i.
            w[1..].iter().fold(w[0], |acc, &x| acc + x) / w.len() as f64
        })
        .collect())
}

/// Trailing mean of every zero-padded window: the padding counts as
/// samples, so each window sum is divided by `n`.
pub fn padded_rolling_mean<T: Real>(xs: &[T], n: usize) -> FitResult<Vec<T>> {
    rolling_windows(xs, n)?
        .iter()
        .map(|w| sum(w).map(|s| s / n as f64).ok_or(FitError::Window { window: n, len: xs.len() }))
        .collect()
}

/// Shift right by `k`, filling with zeros, keeping the length.
pub fn lag<T: Real>(xs: &[T], k: usize) -> Vec<T> {
    match xs.first() {
        None => Vec::new(),
        Some(x0) => {
            let mut out = pad_left(xs, k, x0.lift(0.0));
            out.truncate(xs.len());
            out
        }
    }
}

/// First differences with a leading zero: `[0, x1-x0, x2-x1, ...]`.
pub fn deltas<T: Real>(xs: &[T]) -> FitResult<Vec<T>> {
    let x0 = xs.first().ok_or(FitError::SeriesTooShort { len: 0, need: 1 })?;
    let mut out = Vec::with_capacity(xs.len());
    out.push(x0.lift(0.0));
    out.extend(xs.windows(2).map(|w| w[1] - w[0]));
    Ok(out)
}

/// Sample covariance (N-1 normalisation).
pub fn covariance<T: Real>(xs: &[T], ys: &[T]) -> FitResult<T> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return Err(FitError::SeriesTooShort { len: n, need: 2 });
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = sum(xs).ok_or(FitError::SeriesTooShort { len: 0, need: 2 })? / n as f64;
    let my = sum(ys).ok_or(FitError::SeriesTooShort { len: 0, need: 2 })? / n as f64;
    let prods: Vec<T> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (x - mx) * (y - my))
        .collect();
    let s = sum(&prods).ok_or(FitError::SeriesTooShort { len: 0, need: 2 })?;
    Ok(s / (n - 1) as f64)
}

/// Sample variance (N-1 normalisation).
pub fn variance<T: Real>(xs: &[T]) -> FitResult<T> {
    covariance(xs, xs)
}

/// Cumulative sum of `len` Gaussian(mu, std) steps.
pub fn gaussian_walk(len: usize, mu: f64, std: f64, rng: &RefCell<WyRand>) -> Vec<f64> {
    let mut acc = 0.0;
    (0..len)
        .map(|_| {
            acc += stoch::normal(rng, mu, std);
            acc
        })
        .collect()
}
