// demos/constrained_walks.rs
// Run with:
//   RUST_LOG=info cargo run --example constrained_walks

use fitloop::FitError;
use fitloop::charts::auto_correlation;
use fitloop::posts::walks::{WalksPostConfig, plot_constrained_walks};
use fitloop::systems::constrained_walk::{Term, WalkLoss};

fn main() -> Result<(), FitError> {
    env_logger::init();

    let cfg = WalksPostConfig {
        n: 3,
        len: 200,
        loss: WalkLoss::default()
            .with_term(Term::Coastline {
                ns: vec![5, 20],
                weight: 0.5,
            })
            .with_term(Term::RollingMean {
                ns: vec![10, 50],
                weight: 0.5,
            }),
        ..WalksPostConfig::default()
    };

    let report = plot_constrained_walks(&cfg)?;

    println!("== Constrained walks ==");
    for (i, w) in report.walks.iter().enumerate() {
        let first = w.outcome.history.first().copied().unwrap_or(f64::NAN);
        let last = w.outcome.final_loss().unwrap_or(f64::NAN);
        let ac = auto_correlation(&w.fitted, 4);
        println!(
            "walk {i}: loss {first:.4} -> {last:.4}, lag-1..3 autocorrelation {:?}",
            ac.ys
        );
    }
    println!(
        "figure: {} rows x {} cols",
        report.figure.nrows(),
        report.figure.ncols()
    );
    Ok(())
}
