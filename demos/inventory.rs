// demos/inventory.rs
// Run with:
//   RUST_LOG=info cargo run --example inventory
// Add `--features serde` to also print the figure as JSON.

use fitloop::FitError;
use fitloop::posts::inventory::{InventoryPostConfig, run};

fn main() -> Result<(), FitError> {
    env_logger::init();

    // Holding is cheap relative to the margin: stock above mean demand.
    let cfg = InventoryPostConfig {
        holding_rate: 0.1,
        profit_rate: 1.0,
        demand_mu: 5.0,
        demand_sigma: 1.0,
        samples: 500,
        ..InventoryPostConfig::default()
    };

    let report = run(&cfg)?;

    println!("== Inventory ==");
    println!("optimal inventory -> {:.4}", report.inventory);
    println!("stop              -> {:?}", report.outcome.stop);
    println!("iterations        -> {}", report.outcome.iters());
    println!("final loss        -> {:?}", report.outcome.final_loss());

    let n = report.samples.len().max(1) as f64;
    let mean_profit = report.samples.iter().map(|s| s.profit).sum::<f64>() / n;
    let stockouts = report.samples.iter().filter(|s| s.shortfall > 0.0).count();
    println!("mean profit       -> {mean_profit:.4}");
    println!("stockout periods  -> {stockouts}/{}", report.samples.len());

    for s in report.figure.series() {
        println!("  row `{}`: {} points, hlines {:?}", s.label, s.ys.len(), s.hlines);
    }

    #[cfg(feature = "serde")]
    {
        match report.figure.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("figure export failed: {e}"),
        }
    }

    Ok(())
}
