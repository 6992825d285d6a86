/// Update and schedule mechanics: SGD step, exponential LR decay.
use crate::{FitError, FitResult, Optimizer, ParamSet, Scheduler};

/// Stochastic gradient descent, optional heavy-ball momentum.
///
/// Without momentum: `θ ← θ − lr · g`.
/// With momentum:    `v ← μ · v + g; θ ← θ − lr · v`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sgd {
    pub lr: f64,
    pub momentum: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    velocity: Vec<Vec<f64>>,
}

impl Sgd {
    pub fn new(lr: f64) -> Self {
        Self {
            lr,
            momentum: 0.0,
            velocity: Vec::new(),
        }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn validate(&self) -> FitResult<()> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(FitError::InvalidConfig {
                field: "lr",
                value: self.lr,
                reason: "must be positive and finite",
            });
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(FitError::InvalidConfig {
                field: "momentum",
                value: self.momentum,
                reason: "must lie in [0, 1)",
            });
        }
        Ok(())
    }
}

impl Default for Sgd {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut ParamSet, grads: &[Vec<f64>]) -> FitResult<()> {
        params.check_layout(grads)?;

        if self.momentum == 0.0 {
            for (p, g) in params.iter_mut().zip(grads) {
                for (x, dx) in p.values.iter_mut().zip(g) {
                    *x -= self.lr * dx;
                }
            }
            return Ok(());
        }

        if self.velocity.len() != grads.len() {
            self.velocity = grads.iter().map(|g| vec![0.0; g.len()]).collect();
        }
        for ((p, g), v) in params.iter_mut().zip(grads).zip(self.velocity.iter_mut()) {
            for ((x, dx), vx) in p.values.iter_mut().zip(g).zip(v.iter_mut()) {
                *vx = self.momentum * *vx + dx;
                *x -= self.lr * *vx;
            }
        }
        Ok(())
    }

    fn lr(&self) -> f64 {
        self.lr
    }

    fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }
}

/// Multiply the step size by `gamma` each time it is stepped.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExponentialLr {
    pub gamma: f64,
}

impl ExponentialLr {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    /// Step size after `k` decays.
    #[inline]
    pub fn after(&self, lr0: f64, k: u32) -> f64 {
        lr0 * self.gamma.powi(k as i32)
    }

    pub fn validate(&self) -> FitResult<()> {
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(FitError::InvalidConfig {
                field: "gamma",
                value: self.gamma,
                reason: "must be positive and finite",
            });
        }
        Ok(())
    }
}

impl Default for ExponentialLr {
    fn default() -> Self {
        Self::new(0.9)
    }
}

impl Scheduler for ExponentialLr {
    fn step(&mut self, optimizer: &mut dyn Optimizer) {
        let lr = optimizer.lr() * self.gamma;
        optimizer.set_lr(lr);
    }
}

/// Keep the step size fixed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantLr;

impl Scheduler for ConstantLr {
    fn step(&mut self, _optimizer: &mut dyn Optimizer) {}
}
