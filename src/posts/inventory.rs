// src/posts/inventory.rs
#![cfg(feature = "post-inventory")]

//! Inventory post.
//!
//! Fits the profit-maximising inventory under Gaussian demand, then samples
//! periods at the optimum and lays out:
//! - the loss curve and the inventory trajectory,
//! - one scatter row per quantity (demand, shortfall, sales, profit) with
//!   reference lines at 0 and, where it bounds the quantity, at the optimum.

use log::info;

use crate::charts::{Figure, Series};
use crate::posts::sdk::{loss_series, path_series};
use crate::systems::inventory::{
    GaussianDemand, INVENTORY, InventoryFit, Linear, Quantity, Step, fit_optimal_inventory_observed,
    sample_steps,
};
use crate::systems::sdk::Trajectory;
use crate::{FitResult, Observer, Outcome};

/// Scatter rows drawn below the loss curve, with whether each gets a
/// reference line at the fitted inventory.
pub const SCATTER_ROWS: [(Quantity, bool); 4] = [
    (Quantity::Demand, true),
    (Quantity::Shortfall, false),
    (Quantity::Sales, true),
    (Quantity::Profit, false),
];

const MARKER_SIZE: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryPostConfig {
    /// Holding cost per unit held.
    pub holding_rate: f64,
    /// Profit per unit sold.
    pub profit_rate: f64,
    pub demand_mu: f64,
    pub demand_sigma: f64,
    /// Seed for the demand draws during the fit.
    pub seed: u64,
    /// Periods sampled at the optimum (drawn from `seed + 1`).
    pub samples: usize,
    pub fit: InventoryFit,
}

impl Default for InventoryPostConfig {
    fn default() -> Self {
        Self {
            holding_rate: 0.1,
            profit_rate: 1.0,
            demand_mu: 5.0,
            demand_sigma: 1.0,
            seed: 0,
            samples: 1000,
            fit: InventoryFit::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InventoryReport {
    pub outcome: Outcome,
    pub inventory: f64,
    /// Inventory after every update.
    pub trajectory: Vec<f64>,
    pub samples: Vec<Step<f64>>,
    pub figure: Figure,
}

/// Fit, sample and chart with every sample shown.
pub fn run(cfg: &InventoryPostConfig) -> FitResult<InventoryReport> {
    run_filtered(cfg, |_| true)
}

/// Like [`run`], but only samples passing `keep` reach the scatter rows.
/// `report.samples` still holds every sample.
pub fn run_filtered<F>(cfg: &InventoryPostConfig, keep: F) -> FitResult<InventoryReport>
where
    F: Fn(&Step<f64>) -> bool,
{
    let holding = Linear::new(cfg.holding_rate);
    let profit = Linear::new(cfg.profit_rate);

    let mut demand = GaussianDemand::new(cfg.demand_mu, cfg.demand_sigma, cfg.seed);
    let mut trajectory = Trajectory::new(INVENTORY);
    let mut observers: [&mut dyn Observer; 1] = [&mut trajectory];
    let outcome =
        fit_optimal_inventory_observed(&holding, &profit, &mut demand, &cfg.fit, &mut observers)?;
    let inventory = outcome.params.value(INVENTORY)?;
    info!("inventory post: optimum {inventory:.4} ({:?})", outcome.stop);

    let mut demand = GaussianDemand::new(cfg.demand_mu, cfg.demand_sigma, cfg.seed.wrapping_add(1));
    let samples = sample_steps(&holding, &profit, &mut demand, inventory, cfg.samples);

    let trajectory = trajectory.scalars();
    let shown: Vec<&Step<f64>> = samples.iter().filter(|s| keep(s)).collect();

    let mut rows = vec![
        loss_series(&outcome),
        path_series(INVENTORY, &trajectory).with_hlines([inventory]),
    ];
    rows.extend(
        SCATTER_ROWS
            .iter()
            .map(|&(q, at_inventory)| quantity_scatter(&shown, q, at_inventory.then_some(inventory))),
    );

    Ok(InventoryReport {
        outcome,
        inventory,
        trajectory,
        samples,
        figure: Figure::Rows(rows),
    })
}

/// One quantity against the sample index, with a line at 0 (and at
/// `inventory` when given).
pub fn quantity_scatter(samples: &[&Step<f64>], q: Quantity, inventory: Option<f64>) -> Series {
    let xs = (0..samples.len()).map(|i| i as f64).collect();
    let ys = samples.iter().map(|s| s.get(q)).collect();
    Series::scatter(q.label(), xs, ys)
        .with_hlines(std::iter::once(0.0).chain(inventory))
        .with_marker_size(MARKER_SIZE)
}
