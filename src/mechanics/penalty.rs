//! Smoothness / constraint penalties over a fixed-length series.
//!
//! Each penalty maps a series to one scalar, is differentiable when the
//! series lives on a tape, and can be summed into a composite loss. Window
//! lengths come in as a set `ns`; per-window terms are averaged over every
//! window of every length.

use crate::autodiff::{Real, mean, sum};
use crate::mechanics::series;
use crate::mechanics::stoch::{Dropout, maybe_drop};
use crate::{FitError, FitResult};

#[inline]
fn require_windows(ns: &[usize]) -> FitResult<()> {
    if ns.is_empty() {
        return Err(FitError::NoWindows);
    }
    Ok(())
}

#[inline]
fn mean_of<T: Real>(xs: &[T]) -> FitResult<T> {
    mean(xs).ok_or(FitError::SeriesTooShort { len: 0, need: 1 })
}

/// Mean squared deviation of the series from its own rolling mean, for
/// each window length in `ns`. Zero for a constant series.
pub fn rolling_mean<T: Real>(ts: &[T], ns: &[usize], dropout: Option<&Dropout>) -> FitResult<T> {
    require_windows(ns)?;
    let mut devs = Vec::with_capacity(ns.len() * ts.len());
    for &n in ns {
        let m = series::rolling_mean(ts, n)?;
        devs.extend(m.iter().zip(ts).map(|(&m, &x)| m - x));
    }
    let sq: Vec<T> = maybe_drop(dropout, devs)
        .into_iter()
        .map(Real::square)
        .collect();
    mean_of(&sq)
}

/// Path length vs net movement: per window of first differences,
/// `Σ|δ| - |Σδ|`. Zero for monotone series, grows with wiggle.
pub fn rolling_coastline<T: Real>(
    ts: &[T],
    ns: &[usize],
    dropout: Option<&Dropout>,
) -> FitResult<T> {
    require_windows(ns)?;
    let d = series::deltas(ts)?;
    let mut terms = Vec::with_capacity(ns.len() * d.len());
    for &n in ns {
        for w in series::rolling_windows(&d, n)? {
            let abs: Vec<T> = w.iter().map(|&x| x.abs()).collect();
            // windows are non-empty (n >= 1)
            let coast = sum(&abs).ok_or(FitError::Window { window: n, len: d.len() })?;
            let net = sum(&w).ok_or(FitError::Window { window: n, len: d.len() })?;
            terms.push(coast - net.abs());
        }
    }
    mean_of(&maybe_drop(dropout, terms))
}

/// Mean squared discrete second difference (curvature).
pub fn second_derivative<T: Real>(ts: &[T], dropout: Option<&Dropout>) -> FitResult<T> {
    let dd = series::deltas(&series::deltas(ts)?)?;
    let sq: Vec<T> = maybe_drop(dropout, dd)
        .into_iter()
        .map(Real::square)
        .collect();
    mean_of(&sq)
}

/// For each window length, the lag-1 regression slope of the differences
/// on their own zero-padded rolling mean, `cov(δ, m) / var(δ)`; returns the
/// summed change in its magnitude between adjacent window lengths, in the
/// order given. A single window length has no adjacent pair and gives 0.
pub fn rolling_mean_corr<T: Real>(ts: &[T], ns: &[usize]) -> FitResult<T> {
    require_windows(ns)?;
    let d = series::deltas(ts)?;
    if ns.len() == 1 {
        return Ok(d[0].lift(0.0));
    }
    let var = series::variance(&d)?;
    if !(var.value().is_finite() && var.value() != 0.0) {
        return Err(FitError::NonFinite {
            what: "delta variance ratio",
            value: var.value(),
        });
    }

    let corr = ns
        .iter()
        .map(|&n| {
            let m = series::lag(&series::padded_rolling_mean(&d, n)?, 1);
            Ok((series::covariance(&d, &m)? / var).abs())
        })
        .collect::<FitResult<Vec<T>>>()?;

    let steps: Vec<T> = corr.windows(2).map(|w| w[1] - w[0]).collect();
    // ns.len() >= 2, so there is at least one step
    sum(&steps).ok_or(FitError::NoWindows)
}
