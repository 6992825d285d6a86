//! Constrained random walks: start from a sampled path and bend it under a
//! weighted sum of smoothness penalties, while an anchor term keeps it
//! close to where it started.

use crate::autodiff::{Real, mean};
use crate::mechanics::penalty;
use crate::mechanics::stoch::Dropout;
use crate::systems::sdk::{FitConfig, fit};
use crate::{FitError, FitResult, Never, Outcome, ParamSet};

/// Name of the fitted path in the returned [`ParamSet`].
pub const PATH: &str = "path";

/// One weighted penalty in a [`WalkLoss`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Term {
    RollingMean { ns: Vec<usize>, weight: f64 },
    Coastline { ns: Vec<usize>, weight: f64 },
    SecondDerivative { weight: f64 },
    MeanCorr { ns: Vec<usize>, weight: f64 },
}

impl Term {
    pub fn weight(&self) -> f64 {
        match self {
            Term::RollingMean { weight, .. }
            | Term::Coastline { weight, .. }
            | Term::SecondDerivative { weight }
            | Term::MeanCorr { weight, .. } => *weight,
        }
    }

    /// Unweighted penalty value.
    pub fn eval<T: Real>(&self, path: &[T], dropout: Option<&Dropout>) -> FitResult<T> {
        match self {
            Term::RollingMean { ns, .. } => penalty::rolling_mean(path, ns, dropout),
            Term::Coastline { ns, .. } => penalty::rolling_coastline(path, ns, dropout),
            Term::SecondDerivative { .. } => penalty::second_derivative(path, dropout),
            Term::MeanCorr { ns, .. } => penalty::rolling_mean_corr(path, ns),
        }
    }
}

/// `anchor · mean((path - original)²) + Σ weight · term(path)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalkLoss {
    pub anchor: f64,
    pub terms: Vec<Term>,
    /// Dropout probability for the terms that support it.
    pub dropout: f64,
    pub seed: u64,
}

impl Default for WalkLoss {
    fn default() -> Self {
        Self {
            anchor: 1.0,
            terms: vec![Term::SecondDerivative { weight: 1.0 }],
            dropout: 0.0,
            seed: 0,
        }
    }
}

impl WalkLoss {
    pub fn with_term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn eval<T: Real>(
        &self,
        original: &[f64],
        path: &[T],
        dropout: Option<&Dropout>,
    ) -> FitResult<T> {
        if original.len() != path.len() {
            return Err(FitError::LengthMismatch {
                expected: original.len(),
                found: path.len(),
            });
        }
        let sq: Vec<T> = path
            .iter()
            .zip(original)
            .map(|(&x, &o)| (x - o).square())
            .collect();
        let mut total =
            mean(&sq).ok_or(FitError::SeriesTooShort { len: 0, need: 1 })? * self.anchor;
        for term in &self.terms {
            total = total + term.eval(path, dropout)? * term.weight();
        }
        Ok(total)
    }
}

/// Fit `original` under `loss` for the whole budget (no early stop).
pub fn fit_walk(original: &[f64], loss: &WalkLoss, cfg: &FitConfig) -> FitResult<Outcome> {
    let dropout = (loss.dropout > 0.0).then(|| Dropout::new(loss.dropout, loss.seed));
    let params = ParamSet::new().vector(PATH, original.to_vec())?;
    fit(
        params,
        |_tape, p| loss.eval(original, &p[0], dropout.as_ref()),
        cfg,
        &Never,
    )
}
