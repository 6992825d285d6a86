/*!
`fitloop` — a minimal gradient-descent fitting harness.

What it does
- Fits named parameters θ against a caller-supplied differentiable loss.
- Each iteration records the loss on a fresh [`autodiff::Tape`], sweeps it
  backwards, and lets an [`Optimizer`] step every parameter:
  `θ_{t+1} = step(θ_t, ∇loss(θ_t))`.
- Decays the step size once per epoch through a [`Scheduler`].
- Stops when a [`Convergence`] predicate holds or the budget runs out, and
  says which one happened ([`StopReason`]).

How to use (call surface only)
- Build a [`ParamSet`] as θ₀.
- Write the loss as a closure over the tape and the bound parameters:
  `|tape, p| -> FitResult<Var>`, where `p[i]` holds the variables of the
  i-th parameter in insertion order.
- Call [`systems::sdk::fit`] with a [`systems::sdk::FitConfig`], or
  [`fit_with`] to bring your own optimizer, scheduler and observers.

Around the core
- [`mechanics`]: small pure pieces (SGD, LR decay, relative-range
  convergence, RNG, series helpers, penalties, curve transforms).
- [`systems`]: self-contained models wired into the loop (inventory under
  holding costs, penalty-constrained random walks).
- [`posts`]: orchestrations that run systems and assemble [`charts`] data.
*/

use log::{debug, info, trace, warn};

use crate::autodiff::{Tape, Var};

pub mod autodiff;
pub mod charts;
mod error;
pub mod mechanics;
pub mod posts;
pub mod systems;

pub use error::{FitError, FitResult};

/// One named trainable value (scalars are length-1).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub name: String,
    pub values: Vec<f64>,
}

/// Ordered set of named parameters. Insertion order is binding order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamSet {
    params: Vec<Param>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scalar parameter.
    pub fn scalar(self, name: impl Into<String>, value: f64) -> FitResult<Self> {
        self.vector(name, vec![value])
    }

    /// Add a vector parameter.
    pub fn vector(mut self, name: impl Into<String>, values: Vec<f64>) -> FitResult<Self> {
        let name = name.into();
        if self.params.iter().any(|p| p.name == name) {
            return Err(FitError::DuplicateParam(name));
        }
        self.params.push(Param { name, values });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Param> {
        self.params.iter_mut()
    }

    pub fn get(&self, name: &str) -> FitResult<&[f64]> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.values.as_slice())
            .ok_or_else(|| FitError::UnknownParam(name.to_string()))
    }

    /// First value of a parameter (the scalar case).
    pub fn value(&self, name: &str) -> FitResult<f64> {
        self.get(name)?
            .first()
            .copied()
            .ok_or_else(|| FitError::UnknownParam(name.to_string()))
    }

    /// Record every value on `tape`, one `Vec` per parameter.
    pub fn bind<'t>(&self, tape: &'t Tape) -> Vec<Vec<Var<'t>>> {
        self.params.iter().map(|p| tape.vars(&p.values)).collect()
    }

    /// Check that `grads` has this set's layout.
    pub fn check_layout(&self, grads: &[Vec<f64>]) -> FitResult<()> {
        if grads.len() != self.params.len() {
            return Err(FitError::ParamCount {
                expected: self.params.len(),
                found: grads.len(),
            });
        }
        for (p, g) in self.params.iter().zip(grads) {
            if p.values.len() != g.len() {
                return Err(FitError::GradientShape {
                    name: p.name.clone(),
                    expected: p.values.len(),
                    found: g.len(),
                });
            }
        }
        Ok(())
    }
}

/// Update rule applied once per iteration.
pub trait Optimizer {
    /// Move `params` against `grads` (same layout as `params`).
    fn step(&mut self, params: &mut ParamSet, grads: &[Vec<f64>]) -> FitResult<()>;
    fn lr(&self) -> f64;
    fn set_lr(&mut self, lr: f64);
}

/// Step-size schedule, stepped once per completed epoch.
pub trait Scheduler {
    fn step(&mut self, optimizer: &mut dyn Optimizer);
}

/// Early-stopping predicate over the loss history so far.
pub trait Convergence {
    fn converged(&self, history: &[f64], params: &ParamSet) -> bool;
}

impl<F> Convergence for F
where
    F: Fn(&[f64], &ParamSet) -> bool,
{
    fn converged(&self, history: &[f64], params: &ParamSet) -> bool {
        self(history, params)
    }
}

/// Run the whole budget.
#[derive(Clone, Copy, Debug, Default)]
pub struct Never;

impl Convergence for Never {
    fn converged(&self, _history: &[f64], _params: &ParamSet) -> bool {
        false
    }
}

/// Sees every iteration after the update (progress, trajectories, samples).
pub trait Observer {
    fn on_iteration(&mut self, _iteration: usize, _loss: f64, _params: &ParamSet) {}
}

/// Iteration budget: `epochs × iters_per_epoch`, decay between epochs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Budget {
    pub epochs: usize,
    pub iters_per_epoch: usize,
}

impl Budget {
    pub fn total(&self) -> usize {
        self.epochs * self.iters_per_epoch
    }

    pub fn validate(&self) -> FitResult<()> {
        if self.epochs == 0 {
            return Err(FitError::InvalidConfig {
                field: "epochs",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if self.iters_per_epoch == 0 {
            return Err(FitError::InvalidConfig {
                field: "iters_per_epoch",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Why a fit returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// The predicate held after this (0-based) iteration.
    Converged { iteration: usize },
    BudgetExhausted,
}

/// Result of a fit.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    /// One loss per iteration, evaluated before that iteration's update.
    pub history: Vec<f64>,
    /// Parameters after the last update.
    pub params: ParamSet,
    pub stop: StopReason,
    /// Step size in effect when the fit returned.
    pub lr: f64,
}

impl Outcome {
    pub fn iters(&self) -> usize {
        self.history.len()
    }

    pub fn converged(&self) -> bool {
        matches!(self.stop, StopReason::Converged { .. })
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.history.last().copied()
    }
}

/// Gradient descent: θ_{t+1} = optimizer.step(θ_t, ∇loss(θ_t)).
///
/// Per iteration `i`: fresh tape → loss → record → backward → step; then a
/// scheduler step when `i > 0 && i % iters_per_epoch == 0`; then observers;
/// then the convergence check. Errors from the loss abort the fit.
pub fn fit_with<L, C>(
    mut params: ParamSet,
    mut loss: L,
    budget: Budget,
    optimizer: &mut dyn Optimizer,
    scheduler: &mut dyn Scheduler,
    convergence: &C,
    observers: &mut [&mut dyn Observer],
) -> FitResult<Outcome>
where
    L: for<'t> FnMut(&'t Tape, &[Vec<Var<'t>>]) -> FitResult<Var<'t>>,
    C: Convergence + ?Sized,
{
    budget.validate()?;
    let total = budget.total();
    let mut history = Vec::with_capacity(total);
    let mut stop = StopReason::BudgetExhausted;

    for i in 0..total {
        let tape = Tape::new();
        let bound = params.bind(&tape);
        let l = loss(&tape, &bound)?;
        let value = l.value();
        history.push(value);

        let adj = l.backward();
        let grads: Vec<Vec<f64>> = bound.iter().map(|vs| adj.wrt_all(vs)).collect();
        optimizer.step(&mut params, &grads)?;
        trace!("iter={i} loss={value:.6e} lr={:.4e}", optimizer.lr());

        if i > 0 && i % budget.iters_per_epoch == 0 {
            scheduler.step(optimizer);
            debug!("epoch boundary at iter={i}: lr -> {:.4e}", optimizer.lr());
        }

        for o in observers.iter_mut() {
            o.on_iteration(i, value, &params);
        }

        if convergence.converged(&history, &params) {
            stop = StopReason::Converged { iteration: i };
            break;
        }
    }

    let last = history.last().copied().unwrap_or(f64::NAN);
    if !last.is_finite() {
        warn!("fit ended with non-finite loss {last} after {} iters", history.len());
    }
    info!(
        "fit stopped: {:?} after {}/{} iters, loss={last:.6e}",
        stop,
        history.len(),
        total
    );

    Ok(Outcome {
        history,
        params,
        stop,
        lr: optimizer.lr(),
    })
}
