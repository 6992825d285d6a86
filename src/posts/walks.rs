// src/posts/walks.rs
#![cfg(feature = "post-walks")]

//! Constrained walks post: sample `n` Gaussian random walks, bend each one
//! under a [`WalkLoss`], and lay every walk out as a grid row of
//! `[loss, sampled path, fitted path]`.

use log::info;

use crate::charts::{Figure, Series};
use crate::mechanics::series::gaussian_walk;
use crate::mechanics::stoch;
use crate::posts::sdk::{loss_series, path_series, run_trials};
use crate::systems::constrained_walk::{PATH, WalkLoss, fit_walk};
use crate::systems::sdk::FitConfig;
use crate::{FitResult, Outcome};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalksPostConfig {
    /// Number of walks.
    pub n: usize,
    pub len: usize,
    /// Mean and std of each walk increment.
    pub mu: f64,
    pub std: f64,
    /// Walk `i` is sampled from `seed + i`.
    pub seed: u64,
    pub loss: WalkLoss,
    pub fit: FitConfig,
}

impl Default for WalksPostConfig {
    fn default() -> Self {
        Self {
            n: 3,
            len: 200,
            mu: 0.0,
            std: 1.0,
            seed: 0,
            loss: WalkLoss::default(),
            fit: FitConfig::default().with_budget(5, 500),
        }
    }
}

/// One walk before and after the fit.
#[derive(Clone, Debug)]
pub struct Walk {
    pub original: Vec<f64>,
    pub fitted: Vec<f64>,
    pub outcome: Outcome,
}

#[derive(Clone, Debug)]
pub struct WalksReport {
    pub walks: Vec<Walk>,
    pub figure: Figure,
}

pub fn plot_constrained_walks(cfg: &WalksPostConfig) -> FitResult<WalksReport> {
    let walks = run_trials(cfg.n, |i| {
        let rng = stoch::seeded(cfg.seed.wrapping_add(i as u64));
        let original = gaussian_walk(cfg.len, cfg.mu, cfg.std, &rng);
        let outcome = fit_walk(&original, &cfg.loss, &cfg.fit)?;
        let fitted = outcome.params.get(PATH)?.to_vec();
        info!(
            "walk {i}: loss {:.4e} -> {:.4e}",
            outcome.history.first().copied().unwrap_or(f64::NAN),
            outcome.final_loss().unwrap_or(f64::NAN)
        );
        Ok(Walk {
            original,
            fitted,
            outcome,
        })
    })?;

    let rows: Vec<Vec<Series>> = walks
        .iter()
        .map(|w| {
            vec![
                loss_series(&w.outcome),
                path_series("path", &w.original),
                path_series("res", &w.fitted),
            ]
        })
        .collect();

    Ok(WalksReport {
        walks,
        figure: Figure::Grid(rows),
    })
}
