// tests/core.rs
use approx::assert_relative_eq;
use fitloop::autodiff::{Tape, Var};
use fitloop::mechanics::{ConstantLr, ExponentialLr, RelativeRange, Sgd};
use fitloop::systems::sdk::{FitConfig, Trajectory, fit, fit_observed};
use fitloop::{
    Budget, FitError, FitResult, Never, Observer, Optimizer, ParamSet, StopReason, fit_with,
};

fn quadratic<'t>(p: &[Vec<Var<'t>>]) -> FitResult<Var<'t>> {
    let d = p[0][0] - 3.0;
    Ok(d * d)
}

/* ──────────────────────────────────────────────────────────────────────────
1) Budget and stopping
────────────────────────────────────────────────────────────────────────── */

#[test]
fn history_fills_the_budget_without_early_stop() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let cfg = FitConfig::default().with_budget(3, 7);
    let out = fit(params, |_t, p| quadratic(p), &cfg, &Never).unwrap();

    assert_eq!(out.iters(), 21);
    assert_eq!(out.stop, StopReason::BudgetExhausted);
    assert!(!out.converged());
}

#[test]
fn early_stop_reports_iteration_and_predicate_holds_on_history() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let cfg = FitConfig::default().with_budget(2, 50);
    let stop_at_five = |h: &[f64], _p: &ParamSet| h.len() == 5;
    let out = fit(params, |_t, p| quadratic(p), &cfg, &stop_at_five).unwrap();

    assert_eq!(out.iters(), 5);
    assert_eq!(out.stop, StopReason::Converged { iteration: 4 });
    assert!(stop_at_five(&out.history, &out.params));
}

#[test]
fn zero_budget_is_rejected() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let err = fit(params, |_t, p| quadratic(p), &FitConfig::default().with_budget(0, 10), &Never)
        .unwrap_err();
    assert!(matches!(err, FitError::InvalidConfig { field: "epochs", .. }));

    let b = Budget {
        epochs: 1,
        iters_per_epoch: 0,
    };
    assert!(matches!(
        b.validate(),
        Err(FitError::InvalidConfig {
            field: "iters_per_epoch",
            ..
        })
    ));
}

#[test]
fn loss_error_aborts_the_fit() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let mut calls = 0;
    let res = fit(
        params,
        |_t, p| {
            calls += 1;
            if calls == 4 {
                return Err(FitError::NonFinite {
                    what: "loss",
                    value: f64::NAN,
                });
            }
            quadratic(p)
        },
        &FitConfig::default(),
        &Never,
    );
    assert!(matches!(res, Err(FitError::NonFinite { what: "loss", .. })));
    assert_eq!(calls, 4);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Convex quadratic converges monotonically to its minimum
────────────────────────────────────────────────────────────────────────── */

#[test]
fn quadratic_converges_monotonically_to_three() {
    let params = ParamSet::new().scalar("x", -2.0).unwrap();
    let out = fit(params, |_t, p| quadratic(p), &FitConfig::default(), &Never).unwrap();

    for w in out.history.windows(2) {
        assert!(w[1] <= w[0], "loss increased: {} -> {}", w[0], w[1]);
    }
    assert_relative_eq!(out.params.value("x").unwrap(), 3.0, epsilon = 1e-6);
}

#[test]
fn momentum_reaches_the_same_minimum() {
    let params = ParamSet::new().scalar("x", 10.0).unwrap();
    let cfg = FitConfig::default().with_budget(1, 300).with_momentum(0.5);
    let out = fit(params, |_t, p| quadratic(p), &cfg, &Never).unwrap();
    assert_relative_eq!(out.params.value("x").unwrap(), 3.0, epsilon = 1e-6);
}

#[test]
fn vector_parameters_fit_componentwise() {
    let target = [1.0, -2.0, 0.5];
    let params = ParamSet::new().vector("v", vec![0.0; 3]).unwrap();
    let cfg = FitConfig::default().with_budget(1, 200);
    let out = fit(
        params,
        |_t, p| {
            let mut total = (p[0][0] - target[0]) * (p[0][0] - target[0]);
            for (x, t) in p[0].iter().zip(target).skip(1) {
                total = total + (*x - t) * (*x - t);
            }
            Ok(total)
        },
        &cfg,
        &Never,
    )
    .unwrap();
    for (x, t) in out.params.get("v").unwrap().iter().zip(target) {
        assert_relative_eq!(*x, t, epsilon = 1e-6);
    }
}

/* ──────────────────────────────────────────────────────────────────────────
3) Step-size decay: lr · γ^k after k epoch boundaries
────────────────────────────────────────────────────────────────────────── */

#[test]
fn decay_happens_between_epochs() {
    // loss = 2x has gradient 2 everywhere, so x moves by 2·lr per iteration.
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let cfg = FitConfig::default().with_budget(3, 10);
    let out = fit(params, |_t, p| Ok(p[0][0] * 2.0), &cfg, &Never).unwrap();

    assert_relative_eq!(out.lr, 0.1 * 0.9 * 0.9, epsilon = 1e-12);
    assert_relative_eq!(out.lr, ExponentialLr::new(0.9).after(0.1, 2), epsilon = 1e-12);

    // iterations 0..=10 at 0.1, 11..=20 at 0.09, 21..=29 at 0.081
    let moved = 2.0 * (11.0 * 0.1 + 10.0 * 0.09 + 9.0 * 0.081);
    assert_relative_eq!(out.params.value("x").unwrap(), -moved, epsilon = 1e-9);
}

#[test]
fn constant_schedule_keeps_the_step_size() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let mut sgd = Sgd::new(0.05);
    let mut sched = ConstantLr;
    let budget = Budget {
        epochs: 4,
        iters_per_epoch: 5,
    };
    let out = fit_with(
        params,
        |_t, p| Ok(p[0][0] * 1.0),
        budget,
        &mut sgd,
        &mut sched,
        &Never,
        &mut [],
    )
    .unwrap();
    assert_relative_eq!(out.lr, 0.05);
    assert_relative_eq!(out.params.value("x").unwrap(), -0.05 * 20.0, epsilon = 1e-12);
}

/* ──────────────────────────────────────────────────────────────────────────
4) Parameter set and optimizer layout
────────────────────────────────────────────────────────────────────────── */

#[test]
fn param_set_rejects_duplicates_and_unknown_names() {
    let err = ParamSet::new()
        .scalar("a", 1.0)
        .unwrap()
        .scalar("a", 2.0)
        .unwrap_err();
    assert_eq!(err, FitError::DuplicateParam("a".into()));

    let set = ParamSet::new().scalar("a", 1.0).unwrap();
    assert_eq!(set.get("b").unwrap_err(), FitError::UnknownParam("b".into()));
}

#[test]
fn sgd_checks_gradient_layout() {
    let mut set = ParamSet::new()
        .scalar("a", 1.0)
        .unwrap()
        .vector("b", vec![0.0, 0.0])
        .unwrap();
    let mut sgd = Sgd::default();

    assert_eq!(
        sgd.step(&mut set, &[vec![1.0]]),
        Err(FitError::ParamCount {
            expected: 2,
            found: 1
        })
    );
    assert!(matches!(
        sgd.step(&mut set, &[vec![1.0], vec![1.0]]),
        Err(FitError::GradientShape { expected: 2, found: 1, .. })
    ));

    sgd.step(&mut set, &[vec![1.0], vec![-1.0, 2.0]]).unwrap();
    assert_relative_eq!(set.value("a").unwrap(), 0.9);
    assert_eq!(set.get("b").unwrap(), &[0.1, -0.2]);
}

#[test]
fn config_validation_catches_bad_rates() {
    assert!(FitConfig::default().validate().is_ok());
    assert!(matches!(
        FitConfig::default().with_lr(-1.0).validate(),
        Err(FitError::InvalidConfig { field: "lr", .. })
    ));
    assert!(matches!(
        FitConfig::default().with_momentum(1.0).validate(),
        Err(FitError::InvalidConfig { field: "momentum", .. })
    ));
    assert!(matches!(
        FitConfig::default().with_gamma(0.0).validate(),
        Err(FitError::InvalidConfig { field: "gamma", .. })
    ));
}

/* ──────────────────────────────────────────────────────────────────────────
5) Relative-range convergence
────────────────────────────────────────────────────────────────────────── */

#[test]
fn relative_range_needs_a_full_window() {
    let c = RelativeRange::new(4, 1e-3);
    assert!(!c.check(&[2.0, 2.0, 2.0]));
    assert!(c.check(&[9.0, 2.0, 2.0, 2.0, 2.0]));
}

#[test]
fn relative_range_zero_mean_is_not_converged() {
    let c = RelativeRange::new(3, 1e-3);
    assert!(!c.check(&[0.0, 0.0, 0.0]));
    assert!(!c.check(&[-1.0, 0.0, 1.0]));
}

#[test]
fn relative_range_scales_with_the_loss() {
    let c = RelativeRange::new(2, 1e-3);
    assert!(c.check(&[1000.0, 1000.5]));
    assert!(!c.check(&[1.0, 1.5]));
    assert!(!c.check(&[f64::NAN, 1.0]));
}

#[test]
fn relative_range_stops_a_fit_on_a_plateau() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let cfg = FitConfig::default().with_budget(10, 100);
    // (x-3)² + 1 flattens at 1, so the trailing window stabilises.
    let out = fit(
        params,
        |_t, p| quadratic(p).map(|l| l + 1.0),
        &cfg,
        &RelativeRange::new(20, 1e-6),
    )
    .unwrap();
    assert!(out.converged());
    assert!(out.iters() < 1000);
    assert!(RelativeRange::new(20, 1e-6).check(&out.history));
}

/* ──────────────────────────────────────────────────────────────────────────
6) Observers
────────────────────────────────────────────────────────────────────────── */

#[derive(Default)]
struct Counter {
    seen: Vec<usize>,
}

impl Observer for Counter {
    fn on_iteration(&mut self, iteration: usize, _loss: f64, _params: &ParamSet) {
        self.seen.push(iteration);
    }
}

#[test]
fn observers_see_every_iteration_after_the_update() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let cfg = FitConfig::default().with_budget(1, 4);
    let mut counter = Counter::default();
    let mut traj = Trajectory::new("x");
    let out = fit_observed(
        params,
        |_t, p| quadratic(p),
        &cfg,
        &Never,
        &mut [&mut counter, &mut traj],
    )
    .unwrap();

    assert_eq!(counter.seen, vec![0, 1, 2, 3]);
    let xs = traj.scalars();
    assert_eq!(xs.len(), 4);
    assert_relative_eq!(xs[0], 0.6, epsilon = 1e-12);
    assert_eq!(xs[3], out.params.value("x").unwrap());
}

#[test]
fn tape_is_fresh_every_iteration() {
    let params = ParamSet::new().scalar("x", 0.0).unwrap();
    let mut sizes = Vec::new();
    fit(
        params,
        |tape: &Tape, p| {
            sizes.push(tape.len());
            quadratic(p)
        },
        &FitConfig::default().with_budget(1, 3),
        &Never,
    )
    .unwrap();
    assert_eq!(sizes, vec![1, 1, 1]);
}
