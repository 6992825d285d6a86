// src/systems/sdk.rs

//! # Systems SDK
//!
//! Config-driven harness for building **systems**: self-contained models
//! (inventory under holding costs, constrained random walks, ...) whose
//! parameters are fitted by the core loop ([`crate::fit_with`]).
//!
//! ## What this SDK gives you
//! - [`FitConfig`]: budget, SGD step size/momentum and per-epoch decay in one
//!   `Copy` value with documented defaults (1 × 100 iterations, lr 0.1,
//!   no momentum, gamma 0.9). No hidden global optimizer factories.
//! - [`fit`]: builds the optimizer and scheduler from the config and runs
//!   the loop.
//! - [`fit_observed`]: same, with observers (e.g. [`Trajectory`]).
//!
//! ## Your responsibilities (per system)
//! 1) **state**: a fixed-shape record of what one simulation step produces
//!    (generic over [`Real`](crate::autodiff::Real) so it can be evaluated
//!    with or without a tape).
//! 2) **step**: a pure function `(θ, randomness) -> state`.
//! 3) **loss**: a closure `|tape, p| -> FitResult<Var>` that extracts the
//!    scalar to minimise from a fresh state (e.g. negative profit).
//! 4) **convergence**: pick a predicate; [`RelativeRange`] is the usual one.
//!
//! ## Determinism
//! - Inject seeds explicitly (`mechanics::stoch::seeded`). Two fits with the
//!   same seeds and config produce identical histories.
//!
//! ## Testing a system
//! - Integration tests at `tests/<system>.rs` that pin a deterministic
//!   scenario with a known optimum and assert where the fit lands.

use crate::autodiff::{Tape, Var};
use crate::mechanics::{ExponentialLr, RelativeRange, Sgd};
use crate::{Budget, Convergence, FitResult, Observer, Outcome, ParamSet, fit_with};

/// Everything the loop needs besides the loss and the predicate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitConfig {
    pub epochs: usize,
    pub iters_per_epoch: usize,
    pub lr: f64,
    pub momentum: f64,
    /// Multiplicative step-size decay per epoch boundary.
    pub gamma: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            iters_per_epoch: 100,
            lr: 0.1,
            momentum: 0.0,
            gamma: 0.9,
        }
    }
}

impl FitConfig {
    pub fn with_budget(mut self, epochs: usize, iters_per_epoch: usize) -> Self {
        self.epochs = epochs;
        self.iters_per_epoch = iters_per_epoch;
        self
    }

    pub fn with_lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn budget(&self) -> Budget {
        Budget {
            epochs: self.epochs,
            iters_per_epoch: self.iters_per_epoch,
        }
    }

    pub fn optimizer(&self) -> FitResult<Sgd> {
        let sgd = Sgd::new(self.lr).with_momentum(self.momentum);
        sgd.validate()?;
        Ok(sgd)
    }

    pub fn scheduler(&self) -> FitResult<ExponentialLr> {
        let sched = ExponentialLr::new(self.gamma);
        sched.validate()?;
        Ok(sched)
    }

    /// Validate every field at once.
    pub fn validate(&self) -> FitResult<()> {
        self.budget().validate()?;
        self.optimizer()?;
        self.scheduler()?;
        Ok(())
    }
}

/// Fit `params` with SGD and exponential decay as configured.
pub fn fit<L, C>(params: ParamSet, loss: L, cfg: &FitConfig, convergence: &C) -> FitResult<Outcome>
where
    L: for<'t> FnMut(&'t Tape, &[Vec<Var<'t>>]) -> FitResult<Var<'t>>,
    C: Convergence + ?Sized,
{
    fit_observed(params, loss, cfg, convergence, &mut [])
}

/// [`fit`] with observers notified after every update.
pub fn fit_observed<L, C>(
    params: ParamSet,
    loss: L,
    cfg: &FitConfig,
    convergence: &C,
    observers: &mut [&mut dyn Observer],
) -> FitResult<Outcome>
where
    L: for<'t> FnMut(&'t Tape, &[Vec<Var<'t>>]) -> FitResult<Var<'t>>,
    C: Convergence + ?Sized,
{
    let mut optimizer = cfg.optimizer()?;
    let mut scheduler = cfg.scheduler()?;
    fit_with(
        params,
        loss,
        cfg.budget(),
        &mut optimizer,
        &mut scheduler,
        convergence,
        observers,
    )
}

/// The relative-range predicate with its defaults (window 100, 1e-3).
pub fn default_convergence() -> RelativeRange {
    RelativeRange::default()
}

/// Records one parameter's values after every update.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    name: String,
    points: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    /// First component per iteration (the scalar case).
    pub fn scalars(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter_map(|p| p.first().copied())
            .collect()
    }
}

impl Observer for Trajectory {
    fn on_iteration(&mut self, _iteration: usize, _loss: f64, params: &ParamSet) {
        if let Ok(v) = params.get(&self.name) {
            self.points.push(v.to_vec());
        }
    }
}
