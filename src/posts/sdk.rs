// src/posts/sdk.rs

//! # Posts SDK
//!
//! A **post** is a write-up that runs one or more systems and turns their
//! outcomes into [`Figure`]s. Posts own no math: they pick configs, call
//! systems, and arrange chart rows.
//!
//! ## Steps to add a new post
//! 1. Create `src/posts/<name>.rs`, gated on the feature of the system(s) it
//!    uses.
//! 2. Define a `Config` with a `Default` (sample counts, seeds, fit budget).
//! 3. Write a `run` function that fits, samples, and returns a report struct
//!    holding the outcomes plus the figure.
//!
//! Use [`run_trials`] when a post repeats the same experiment with
//! different seeds, and [`loss_series`] for the standard loss curve.

use crate::charts::{Kind, Series};
use crate::{FitResult, Outcome};

/// Run `trial(i)` for `i` in `0..n`, stopping at the first error.
pub fn run_trials<T, F>(n: usize, mut trial: F) -> FitResult<Vec<T>>
where
    F: FnMut(usize) -> FitResult<T>,
{
    let mut outs = Vec::with_capacity(n);
    for i in 0..n {
        outs.push(trial(i)?);
    }
    Ok(outs)
}

/// Loss per iteration as a line.
pub fn loss_series(outcome: &Outcome) -> Series {
    Series::indexed(Kind::Line, "loss", outcome.history.clone())
}

/// A plain vector against its index as a line.
pub fn path_series(label: &str, ys: &[f64]) -> Series {
    Series::indexed(Kind::Line, label, ys.to_vec())
}
