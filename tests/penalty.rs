// tests/penalty.rs
use approx::assert_relative_eq;
use fitloop::FitError;
use fitloop::autodiff::Tape;
use fitloop::mechanics::penalty::{
    rolling_coastline, rolling_mean, rolling_mean_corr, second_derivative,
};
use fitloop::mechanics::series::{self, gaussian_walk};
use fitloop::mechanics::{Dropout, seeded};

/* ──────────────────────────────────────────────────────────────────────────
1) Series helpers
────────────────────────────────────────────────────────────────────────── */

#[test]
fn padding_and_windows() {
    assert_eq!(series::pad_left(&[1.0, 2.0], 2, 0.0), vec![0.0, 0.0, 1.0, 2.0]);
    assert_eq!(series::pad_right(&[1.0, 2.0], 1, 9.0), vec![1.0, 2.0, 9.0]);

    let w = series::rolling_windows(&[1.0, 2.0, 3.0], 2).unwrap();
    assert_eq!(w, vec![vec![0.0, 1.0], vec![1.0, 2.0], vec![2.0, 3.0]]);
}

#[test]
fn rolling_mean_counts_only_real_samples() {
    let m = series::rolling_mean(&[2.0, 4.0, 6.0, 8.0], 2).unwrap();
    assert_eq!(m, vec![2.0, 3.0, 5.0, 7.0]);
}

#[test]
fn padded_rolling_mean_counts_the_padding() {
    let m = series::padded_rolling_mean(&[2.0, 4.0, 6.0, 8.0], 2).unwrap();
    assert_eq!(m, vec![1.0, 3.0, 5.0, 7.0]);
    assert_eq!(
        series::padded_rolling_mean(&[1.0], 2),
        Err(FitError::Window { window: 2, len: 1 })
    );
}

#[test]
fn window_must_fit_the_series() {
    assert_eq!(
        series::rolling_mean(&[1.0, 2.0], 3),
        Err(FitError::Window { window: 3, len: 2 })
    );
    assert_eq!(
        series::rolling_windows(&[1.0, 2.0], 0),
        Err(FitError::Window { window: 0, len: 2 })
    );
    assert!(matches!(
        series::rolling_windows::<f64>(&[], 1),
        Err(FitError::Window { window: 1, len: 0 })
    ));
}

#[test]
fn deltas_lag_and_moments() {
    assert_eq!(series::deltas(&[1.0, 4.0, 2.0]).unwrap(), vec![0.0, 3.0, -2.0]);
    assert!(series::deltas::<f64>(&[]).is_err());
    assert_eq!(series::lag(&[1.0, 2.0, 3.0], 1), vec![0.0, 1.0, 2.0]);

    let xs = [1.0, 2.0, 3.0, 4.0];
    assert_relative_eq!(series::variance(&xs).unwrap(), 5.0 / 3.0, epsilon = 1e-12);
    let ys = [2.0, 4.0, 6.0, 8.0];
    assert_relative_eq!(series::covariance(&xs, &ys).unwrap(), 10.0 / 3.0, epsilon = 1e-12);
    assert!(matches!(
        series::variance(&[1.0]),
        Err(FitError::SeriesTooShort { len: 1, need: 2 })
    ));
}

#[test]
fn gaussian_walk_is_seeded() {
    let a = gaussian_walk(50, 0.0, 1.0, &seeded(3));
    let b = gaussian_walk(50, 0.0, 1.0, &seeded(3));
    let c = gaussian_walk(50, 0.0, 1.0, &seeded(4));
    assert_eq!(a.len(), 50);
    assert_eq!(a, b);
    assert_ne!(a, c);
    // zero spread: the walk is the running sum of mu
    let line = gaussian_walk(4, 0.5, 0.0, &seeded(0));
    assert_eq!(line, vec![0.5, 1.0, 1.5, 2.0]);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Penalties
────────────────────────────────────────────────────────────────────────── */

#[test]
fn rolling_mean_penalty_is_zero_on_a_constant_series() {
    let ts = vec![3.0; 12];
    assert_eq!(rolling_mean(&ts, &[1, 2, 3, 5], None).unwrap(), 0.0);
}

#[test]
fn rolling_mean_penalty_grows_with_noise() {
    let calm = [0.0, 0.1, 0.0, 0.1, 0.0, 0.1];
    let wild = [0.0, 2.0, 0.0, 2.0, 0.0, 2.0];
    let a = rolling_mean(&calm, &[2, 3], None).unwrap();
    let b = rolling_mean(&wild, &[2, 3], None).unwrap();
    assert!(b > a && a > 0.0);
}

#[test]
fn penalties_reject_bad_window_sets() {
    let ts = [1.0, 2.0, 3.0];
    assert_eq!(rolling_mean(&ts, &[], None), Err(FitError::NoWindows));
    assert_eq!(rolling_coastline(&ts, &[], None), Err(FitError::NoWindows));
    assert_eq!(
        rolling_mean(&ts, &[2, 4], None),
        Err(FitError::Window { window: 4, len: 3 })
    );
    assert_eq!(rolling_mean_corr(&ts, &[]), Err(FitError::NoWindows));
}

#[test]
fn coastline_is_zero_for_monotone_series() {
    let up = [0.0, 1.0, 1.5, 4.0, 4.25, 9.0];
    assert_eq!(rolling_coastline(&up, &[2, 3], None).unwrap(), 0.0);
    let zigzag = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
    assert!(rolling_coastline(&zigzag, &[2, 3], None).unwrap() > 0.0);
}

#[test]
fn second_derivative_measures_curvature() {
    assert_eq!(second_derivative(&[2.0; 5], None).unwrap(), 0.0);
    // leading zeros make the first step of a line count once: [0, 1, 0, 0]
    assert_relative_eq!(second_derivative(&[0.0, 1.0, 2.0, 3.0], None).unwrap(), 0.25);
    assert!(second_derivative::<f64>(&[], None).is_err());
}

#[test]
fn mean_corr_needs_varying_deltas() {
    assert!(matches!(
        rolling_mean_corr(&[1.0; 6], &[2, 3]),
        Err(FitError::NonFinite { .. })
    ));
    let walk = gaussian_walk(40, 0.0, 1.0, &seeded(11));
    let v = rolling_mean_corr(&walk, &[2, 5, 10]).unwrap();
    assert!(v.is_finite());
}

#[test]
fn mean_corr_matches_a_hand_computed_value() {
    // δ = [0, 1, 2, -1, 3], var(δ) = 5/2.
    // Lagged padded means: n=1 [0, 0, 1, 2, -1], n=2 [0, 0, 1/2, 3/2, 1/2],
    // n=3 [0, 0, 1/3, 1, 2/3]; |c| = 1/2, 3/20, 1/30.
    let ts = [0.0, 1.0, 3.0, 2.0, 5.0];
    let v = rolling_mean_corr(&ts, &[1, 2, 3]).unwrap();
    assert_relative_eq!(v, 1.0 / 30.0 - 0.5, epsilon = 1e-12);
    let v = rolling_mean_corr(&ts, &[2, 3]).unwrap();
    assert_relative_eq!(v, 1.0 / 30.0 - 0.15, epsilon = 1e-12);
}

#[test]
fn mean_corr_with_one_window_is_zero() {
    let walk = gaussian_walk(20, 0.0, 1.0, &seeded(8));
    assert_eq!(rolling_mean_corr(&walk, &[3]).unwrap(), 0.0);
    // no adjacent pair, so no variance is needed either
    assert_eq!(rolling_mean_corr(&[1.0; 4], &[2]).unwrap(), 0.0);

    let tape = Tape::new();
    let xs = tape.vars(&walk);
    let p = rolling_mean_corr(&xs, &[3]).unwrap();
    assert!(p.backward().wrt_all(&xs).iter().all(|&g| g == 0.0));
}

/// Central differences of `f` at every index of `xs`.
fn numeric_grad(f: impl Fn(&[f64]) -> f64, xs: &[f64]) -> Vec<f64> {
    let h = 1e-6;
    (0..xs.len())
        .map(|i| {
            let mut hi = xs.to_vec();
            hi[i] += h;
            let mut lo = xs.to_vec();
            lo[i] -= h;
            (f(&hi) - f(&lo)) / (2.0 * h)
        })
        .collect()
}

fn assert_grads_close(taped: &[f64], numeric: &[f64]) {
    assert_eq!(taped.len(), numeric.len());
    for (i, (t, n)) in taped.iter().zip(numeric).enumerate() {
        assert!((t - n).abs() < 1e-5, "index {i}: taped {t} vs numeric {n}");
    }
}

#[test]
fn second_derivative_gradient_matches_finite_differences() {
    let walk = gaussian_walk(20, 0.0, 1.0, &seeded(5));
    let tape = Tape::new();
    let xs = tape.vars(&walk);
    let p = second_derivative(&xs, None).unwrap();
    assert_relative_eq!(p.value(), second_derivative(&walk, None).unwrap(), epsilon = 1e-12);

    let fd = numeric_grad(|ts| second_derivative(ts, None).unwrap(), &walk);
    assert_grads_close(&p.backward().wrt_all(&xs), &fd);
}

#[test]
fn rolling_mean_gradient_matches_finite_differences() {
    let walk = gaussian_walk(20, 0.0, 1.0, &seeded(6));
    let ns = [2, 5];
    let tape = Tape::new();
    let xs = tape.vars(&walk);
    let p = rolling_mean(&xs, &ns, None).unwrap();
    assert_relative_eq!(p.value(), rolling_mean(&walk, &ns, None).unwrap(), epsilon = 1e-12);

    let fd = numeric_grad(|ts| rolling_mean(ts, &ns, None).unwrap(), &walk);
    assert_grads_close(&p.backward().wrt_all(&xs), &fd);
}

#[test]
fn coastline_gradient_matches_finite_differences() {
    let walk = gaussian_walk(20, 0.0, 1.0, &seeded(7));
    let ns = [2, 5];
    let tape = Tape::new();
    let xs = tape.vars(&walk);
    let p = rolling_coastline(&xs, &ns, None).unwrap();
    assert_relative_eq!(
        p.value(),
        rolling_coastline(&walk, &ns, None).unwrap(),
        epsilon = 1e-12
    );

    let fd = numeric_grad(|ts| rolling_coastline(ts, &ns, None).unwrap(), &walk);
    assert_grads_close(&p.backward().wrt_all(&xs), &fd);
}

#[test]
fn mean_corr_gradient_matches_finite_differences() {
    let walk = gaussian_walk(20, 0.0, 1.0, &seeded(9));
    let ns = [2, 5, 10];
    let tape = Tape::new();
    let xs = tape.vars(&walk);
    let p = rolling_mean_corr(&xs, &ns).unwrap();
    assert_relative_eq!(p.value(), rolling_mean_corr(&walk, &ns).unwrap(), epsilon = 1e-12);

    let fd = numeric_grad(|ts| rolling_mean_corr(ts, &ns).unwrap(), &walk);
    assert_grads_close(&p.backward().wrt_all(&xs), &fd);
}

#[test]
fn dropout_zeroes_or_rescales() {
    let xs = vec![1.0; 1000];
    assert_eq!(Dropout::off().apply(xs.clone()), xs);
    assert_eq!(Dropout::new(1.0, 0).apply(xs.clone()), vec![0.0; 1000]);

    let out = Dropout::new(0.5, 9).apply(xs.clone());
    assert!(out.iter().all(|&x| x == 0.0 || x == 2.0));
    let kept = out.iter().filter(|&&x| x > 0.0).count();
    assert!((350..650).contains(&kept), "kept {kept}");

    let again = Dropout::new(0.5, 9).apply(xs);
    assert_eq!(out, again);
}

#[test]
fn dropout_reaches_the_penalty() {
    let walk = gaussian_walk(30, 0.0, 1.0, &seeded(2));
    let full = rolling_mean(&walk, &[3], None).unwrap();
    let dropped = rolling_mean(&walk, &[3], Some(&Dropout::new(0.5, 1))).unwrap();
    assert_ne!(full, dropped);
}
