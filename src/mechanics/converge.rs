/// Convergence mechanics: relative stability of the trailing loss window.
use crate::{Convergence, ParamSet};

/// `(max - min) / |mean|` of a window. `None` when the window is empty,
/// the mean is zero, or the ratio is not finite.
#[inline]
pub fn relative_range(window: &[f64]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let (lo, hi) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    let mu = (window.iter().sum::<f64>() / window.len() as f64).abs();
    if mu == 0.0 {
        return None;
    }
    let ratio = (hi - lo) / mu;
    ratio.is_finite().then_some(ratio)
}

/// Stop once the last `window` losses vary by less than `threshold`
/// relative to their mean magnitude. Adapts to the scale of the loss.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelativeRange {
    pub window: usize,
    pub threshold: f64,
}

impl RelativeRange {
    pub fn new(window: usize, threshold: f64) -> Self {
        Self { window, threshold }
    }

    /// The decision itself, without the parameter set.
    pub fn check(&self, history: &[f64]) -> bool {
        if self.window == 0 || history.len() < self.window {
            return false;
        }
        let tail = &history[history.len() - self.window..];
        // Zero trailing mean: undefined ratio, treated as not converged.
        relative_range(tail).is_some_and(|r| r < self.threshold)
    }
}

impl Default for RelativeRange {
    fn default() -> Self {
        Self::new(100, 1e-3)
    }
}

impl Convergence for RelativeRange {
    fn converged(&self, history: &[f64], _params: &ParamSet) -> bool {
        self.check(history)
    }
}
