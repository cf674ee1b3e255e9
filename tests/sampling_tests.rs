//! Stochastic behavior: convergence of Monte-Carlo estimates to the exact
//! moments, and consistency of draws across a dependency subgraph.
//!
//! All tests run on seeded generators so failures reproduce.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tyche::RvGraph;

fn assert_close(actual: f64, expected: f64, tol: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{} mismatch: expected {:.15}, got {:.15}, diff={:.3e}",
        label,
        expected,
        actual,
        (actual - expected).abs()
    );
}

#[test]
fn fair_sign_running_average_converges() {
    let graph = RvGraph::new();
    let x = graph.root(&[-1.0, 1.0], |_| 0.5).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    // Standard error after 10k draws is 0.01; 0.05 is five sigmas.
    assert_close(x.sample_mean_with_rng(10_000, &mut rng), 0.0, 0.05, "±1 mean");
    assert_close(
        x.sample_variance_with_rng(10_000, &mut rng),
        1.0,
        0.05,
        "±1 variance",
    );
}

#[test]
fn bernoulli_sample_frequency_converges() {
    let graph = RvGraph::new();
    let x = graph.bernoulli(0.6).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    assert_close(
        x.sample_mean_with_rng(10_000, &mut rng),
        0.6,
        0.05,
        "bernoulli mean",
    );
}

#[test]
fn independent_sum_converges_to_exact_mean() {
    let graph = RvGraph::new();
    let die = graph.uniform(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let other = graph.uniform(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let total = &die + &other;
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    assert_close(
        total.sample_mean_with_rng(10_000, &mut rng),
        total.mean(),
        0.2,
        "two dice mean",
    );
}

#[test]
fn dependent_square_never_disagrees_with_its_root() {
    // For a ±1 root, X·X must sample to exactly 1 every time: both factors
    // are the same node, so they must read the same draw.
    let graph = RvGraph::new();
    let x = graph.root(&[-1.0, 1.0], |_| 0.5).unwrap();
    let square = &x * &x;
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    for _ in 0..500 {
        square.resample_with_rng(&mut rng);
        assert_eq!(square.sample_with_rng(&mut rng), 1.0);
    }
}

#[test]
fn transform_samples_apply_the_function() {
    let graph = RvGraph::new();
    let x = graph.uniform(&[1.0, 2.0, 3.0]).unwrap();
    let cubed_plus_one = x.map(|v| v * v * v + 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    for _ in 0..200 {
        cubed_plus_one.resample_with_rng(&mut rng);
        let base = x.sample_with_rng(&mut rng);
        assert_eq!(
            cubed_plus_one.sample_with_rng(&mut rng),
            base * base * base + 1.0
        );
    }
}

#[test]
fn power_samples_match_repeated_product_samples() {
    let graph = RvGraph::new();
    let x = graph.uniform(&[2.0, 3.0]).unwrap();
    let power = x.pow(4).unwrap();
    let repeated = &(&(&x * &x) * &x) * &x;
    let mut rng = ChaCha8Rng::seed_from_u64(6);

    for _ in 0..200 {
        x.resample_with_rng(&mut rng);
        assert_eq!(
            power.sample_with_rng(&mut rng),
            repeated.sample_with_rng(&mut rng)
        );
    }
}

#[test]
fn monte_carlo_tracks_transform_mean() {
    let graph = RvGraph::new();
    let x = graph.bernoulli(0.6).unwrap();
    let scaled = x.map(|v| v * 50.0);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    assert_close(
        scaled.sample_mean_with_rng(10_000, &mut rng),
        scaled.mean(),
        1.5,
        "transform Monte-Carlo mean",
    );
}

#[test]
fn resample_reaches_every_descendant_of_shared_roots() {
    let graph = RvGraph::new();
    let x = graph.uniform(&[0.0, 1.0, 2.0, 3.0]).unwrap();
    let double = &x * 2.0;
    let square = x.pow(2).unwrap();
    let combined = &double + &square;
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    for _ in 0..100 {
        // Resampling any one of them refreshes the whole family.
        combined.resample_with_rng(&mut rng);
        let base = x.sample_with_rng(&mut rng);
        assert_eq!(double.sample_with_rng(&mut rng), 2.0 * base);
        assert_eq!(square.sample_with_rng(&mut rng), base * base);
        assert_eq!(
            combined.sample_with_rng(&mut rng),
            2.0 * base + base * base
        );
    }
}
