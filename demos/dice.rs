//! Walk through the core API with two dice: exact moments, dependence
//! through shared roots, and consistent sampling.
//!
//! Run with: `cargo run --example dice`

use tyche::{FixedMeans, RvGraph};

fn main() -> Result<(), tyche::RvError> {
    let graph = RvGraph::new();
    let first = graph.uniform(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
    let second = graph.uniform(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;

    let total = &first + &second;
    println!("E[first + second]   = {}", total.mean());
    println!("Var[first + second] = {}", total.variance());

    // The square of one die shares its root with the die itself, so its
    // moments differ from squaring the mean.
    let squared = first.pow(2)?;
    println!("E[first]²  = {}", first.mean() * first.mean());
    println!("E[first²]  = {}", squared.mean());
    println!("Cov(first, first²) = {}", first.covariance(&squared)?);

    // Conditioning: pin the first die and ask for the total's mean.
    let mut fixed = FixedMeans::new();
    fixed.pin(&first, 6.0);
    println!("E[total | first = 6] = {}", total.mean_given(&fixed));

    // Draws stay consistent across the whole dependency subgraph.
    for _ in 0..3 {
        total.resample();
        println!(
            "draw: first={} second={} total={} first²={}",
            first.sample(),
            second.sample(),
            total.sample(),
            squared.sample(),
        );
    }

    // Monte-Carlo estimates converge to the exact values.
    println!("sample mean of total ≈ {}", total.sample_mean(10_000));

    Ok(())
}
