//! Inventory level under holding costs.
//!
//! Hold `inventory` units, draw a demand, sell what you can. Every unit
//! held costs `holding(q)`; every unit sold earns `profit(s)`. The fit finds
//! the inventory that maximises expected profit by minimising `-profit`.

use bevy_prng::WyRand;
use log::debug;
use std::cell::RefCell;

use crate::autodiff::Real;
use crate::mechanics::{RelativeRange, stoch};
use crate::systems::sdk::{FitConfig, fit_observed};
use crate::{FitResult, Observer, Outcome, ParamSet};

/// Name of the fitted parameter in the returned [`ParamSet`].
pub const INVENTORY: &str = "inventory_optimal";

/// A scalar cost/revenue curve.
pub trait Curve {
    fn at<T: Real>(&self, q: T) -> T;
}

/// `v · q` (constant marginal holding cost or profit).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Linear {
    pub rate: f64,
}

impl Linear {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl Curve for Linear {
    #[inline]
    fn at<T: Real>(&self, q: T) -> T {
        q * self.rate
    }
}

/// Source of demand draws.
pub trait Demand {
    fn sample(&mut self) -> f64;
}

impl<F: FnMut() -> f64> Demand for F {
    fn sample(&mut self) -> f64 {
        self()
    }
}

/// Always the same demand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedDemand(pub f64);

impl Demand for FixedDemand {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Gaussian(mu, sigma) demand from a seeded WyRand.
#[derive(Debug)]
pub struct GaussianDemand {
    pub mu: f64,
    pub sigma: f64,
    rng: RefCell<WyRand>,
}

impl GaussianDemand {
    pub fn new(mu: f64, sigma: f64, seed: u64) -> Self {
        Self {
            mu,
            sigma,
            rng: stoch::seeded(seed),
        }
    }
}

impl Demand for GaussianDemand {
    fn sample(&mut self) -> f64 {
        stoch::normal(&self.rng, self.mu, self.sigma)
    }
}

/// What one simulated period produces.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step<T> {
    pub inventory: T,
    pub holding_cost: T,
    pub demand: T,
    pub shortfall: T,
    pub sales: T,
    pub profit: T,
}

impl<T: Real> Step<T> {
    /// Plain values, detached from any tape.
    pub fn values(&self) -> Step<f64> {
        Step {
            inventory: self.inventory.value(),
            holding_cost: self.holding_cost.value(),
            demand: self.demand.value(),
            shortfall: self.shortfall.value(),
            sales: self.sales.value(),
            profit: self.profit.value(),
        }
    }
}

/// Which quantity of a [`Step`] to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quantity {
    Inventory,
    HoldingCost,
    Demand,
    Shortfall,
    Sales,
    Profit,
}

impl Quantity {
    pub fn label(self) -> &'static str {
        match self {
            Quantity::Inventory => "inventory",
            Quantity::HoldingCost => "holding_cost",
            Quantity::Demand => "demand",
            Quantity::Shortfall => "shortfall",
            Quantity::Sales => "sales",
            Quantity::Profit => "profit",
        }
    }
}

impl<T: Copy> Step<T> {
    pub fn get(&self, q: Quantity) -> T {
        match q {
            Quantity::Inventory => self.inventory,
            Quantity::HoldingCost => self.holding_cost,
            Quantity::Demand => self.demand,
            Quantity::Shortfall => self.shortfall,
            Quantity::Sales => self.sales,
            Quantity::Profit => self.profit,
        }
    }
}

/// One period: demand is clamped at 0 and carries no gradient; shortfall
/// and sales are differentiable in `inventory` away from the kink.
pub fn step_model<T, H, P, D>(holding: &H, profit: &P, demand: &mut D, inventory: T) -> Step<T>
where
    T: Real,
    H: Curve,
    P: Curve,
    D: Demand + ?Sized,
{
    let holding_cost = holding.at(inventory);
    let demand = inventory.lift(demand.sample().max(0.0));
    let shortfall = (demand - inventory).relu();
    let sales = demand - shortfall;
    let profit = profit.at(sales) - holding_cost;
    Step {
        inventory,
        holding_cost,
        demand,
        shortfall,
        sales,
        profit,
    }
}

/// Config for [`fit_optimal_inventory`]: 10 epochs × 100 iterations from
/// an initial inventory of 1, stopping on [`RelativeRange::default`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryFit {
    pub initial: f64,
    pub fit: FitConfig,
    pub convergence: RelativeRange,
}

impl Default for InventoryFit {
    fn default() -> Self {
        Self {
            initial: 1.0,
            fit: FitConfig::default().with_budget(10, 100),
            convergence: RelativeRange::default(),
        }
    }
}

/// Fit the profit-maximising inventory; one fresh demand draw per iteration.
pub fn fit_optimal_inventory<H, P, D>(
    holding: &H,
    profit: &P,
    demand: &mut D,
    cfg: &InventoryFit,
) -> FitResult<Outcome>
where
    H: Curve,
    P: Curve,
    D: Demand + ?Sized,
{
    fit_optimal_inventory_observed(holding, profit, demand, cfg, &mut [])
}

/// [`fit_optimal_inventory`] with observers (e.g. an inventory trajectory).
pub fn fit_optimal_inventory_observed<H, P, D>(
    holding: &H,
    profit: &P,
    demand: &mut D,
    cfg: &InventoryFit,
    observers: &mut [&mut dyn Observer],
) -> FitResult<Outcome>
where
    H: Curve,
    P: Curve,
    D: Demand + ?Sized,
{
    let params = ParamSet::new().scalar(INVENTORY, cfg.initial)?;
    let out = fit_observed(
        params,
        |_tape, p| {
            let state = step_model(holding, profit, demand, p[0][0]);
            Ok(-state.profit)
        },
        &cfg.fit,
        &cfg.convergence,
        observers,
    )?;
    debug!(
        "optimal inventory {:.4} after {} iters ({:?})",
        out.params.value(INVENTORY)?,
        out.iters(),
        out.stop
    );
    Ok(out)
}

/// `n` simulated periods at a fixed inventory, for display.
pub fn sample_steps<H, P, D>(
    holding: &H,
    profit: &P,
    demand: &mut D,
    inventory: f64,
    n: usize,
) -> Vec<Step<f64>>
where
    H: Curve,
    P: Curve,
    D: Demand + ?Sized,
{
    (0..n)
        .map(|_| step_model(holding, profit, demand, inventory))
        .collect()
}

/// Mean profit over `n` simulated periods.
pub fn expected_profit<H, P, D>(
    holding: &H,
    profit: &P,
    demand: &mut D,
    inventory: f64,
    n: usize,
) -> Option<f64>
where
    H: Curve,
    P: Curve,
    D: Demand + ?Sized,
{
    if n == 0 {
        return None;
    }
    let total: f64 = sample_steps(holding, profit, demand, inventory, n)
        .iter()
        .map(|s| s.profit)
        .sum();
    Some(total / n as f64)
}
