//! Analytical tests for exact moments of roots and linear derivations.
//!
//! Every expectation here has a closed form, so the engine's answers are
//! checked against pen-and-paper values rather than estimates.

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
fn fair_sign_root_moments() {
    // P(-1) = P(1) = 1/2: mean 0, variance 1.
    let graph = RvGraph::new();
    let x = graph.root(&[-1.0, 1.0], |_| 0.5).unwrap();

    assert_close(x.mean(), 0.0, 1e-12, "sign mean");
    assert_close(x.variance(), 1.0, 1e-12, "sign variance");
}

#[test]
fn weighted_root_moments() {
    // P(0) = 0.2, P(2) = 0.3, P(5) = 0.5:
    //   E[X]  = 0.6 + 2.5 = 3.1
    //   E[X²] = 1.2 + 12.5 = 13.7
    let graph = RvGraph::new();
    let x = graph
        .root(&[0.0, 2.0, 5.0], |v| match v as i64 {
            0 => 0.2,
            2 => 0.3,
            _ => 0.5,
        })
        .unwrap();

    assert_close(x.mean(), 3.1, 1e-12, "weighted mean");
    assert_close(x.variance(), 13.7 - 3.1 * 3.1, 1e-12, "weighted variance");
}

#[test]
fn independent_roots_have_zero_covariance() {
    let graph = RvGraph::new();
    let x = graph.root(&[-1.0, 1.0], |_| 0.5).unwrap();
    let y = graph.root(&[-1.0, 1.0], |_| 0.5).unwrap();

    assert_close(x.covariance(&y).unwrap(), 0.0, 1e-12, "independent cov");
}

#[test]
fn constant_shift_moves_mean_only() {
    let graph = RvGraph::new();
    let x = graph.binomial(100, 0.6).unwrap();
    let shifted = &x + 100.0;

    assert_close(shifted.mean(), 160.0, 1e-9, "shifted mean");
    assert_close(shifted.variance(), 24.0, 1e-9, "shifted variance");
}

#[test]
fn constant_scale_squares_into_variance() {
    let graph = RvGraph::new();
    let x = graph.binomial(100, 0.6).unwrap();
    let scaled = &x * 100.0;

    assert_close(scaled.mean(), 6000.0, 1e-7, "scaled mean");
    assert_close(scaled.variance(), 240_000.0, 1e-5, "scaled variance");
}

#[test]
fn sum_of_binomials_matches_merged_binomial() {
    // X ~ B(2, 0.3) and Y ~ B(3, 0.3) independent: X+Y ~ B(5, 0.3).
    let graph = RvGraph::new();
    let x = graph.binomial(2, 0.3).unwrap();
    let y = graph.binomial(3, 0.3).unwrap();
    let sum = &x + &y;
    let merged = graph.binomial(5, 0.3).unwrap();

    assert_close(sum.mean(), merged.mean(), 1e-9, "binomial sum mean");
    assert_close(
        sum.variance(),
        merged.variance(),
        1e-9,
        "binomial sum variance",
    );
}

#[test]
fn negation_and_subtraction() {
    let graph = RvGraph::new();
    let x = graph.uniform(&[1.0, 2.0, 3.0]).unwrap();
    let y = graph.uniform(&[10.0, 20.0]).unwrap();

    let negated = -&x;
    assert_close(negated.mean(), -2.0, 1e-12, "negated mean");
    assert_close(negated.variance(), x.variance(), 1e-12, "negated variance");

    let difference = &y - &x;
    assert_close(difference.mean(), 13.0, 1e-12, "difference mean");
    // Independent operands: Var(Y - X) = Var(Y) + Var(X).
    assert_close(
        difference.variance(),
        y.variance() + x.variance(),
        1e-12,
        "difference variance",
    );

    let flipped = 5.0 - &x;
    assert_close(flipped.mean(), 3.0, 1e-12, "constant-minus mean");
    assert_close(flipped.variance(), x.variance(), 1e-12, "constant-minus variance");
}

#[test]
fn dependent_sum_includes_covariance_term() {
    // Z = X + X has variance 4·Var(X), not 2·Var(X).
    let graph = RvGraph::new();
    let x = graph.bernoulli(0.3).unwrap();
    let doubled = &x + &x;

    assert_close(doubled.mean(), 0.6, 1e-12, "dependent sum mean");
    assert_close(
        doubled.variance(),
        4.0 * x.variance(),
        1e-12,
        "dependent sum variance",
    );
}

#[test]
fn covariance_with_derived_variable() {
    // Cov(X, X + Y) = Var(X) for independent X, Y.
    let graph = RvGraph::new();
    let x = graph.uniform(&[0.0, 1.0, 2.0]).unwrap();
    let y = graph.uniform(&[0.0, 4.0]).unwrap();
    let sum = &x + &y;

    assert_close(
        x.covariance(&sum).unwrap(),
        x.variance(),
        1e-12,
        "cov with sum",
    );
    assert_close(
        sum.covariance(&x).unwrap(),
        x.variance(),
        1e-12,
        "cov symmetric orientation",
    );
}

#[test]
fn moments_are_stable_across_queries() {
    let graph = RvGraph::new();
    let x = graph.binomial(10, 0.25).unwrap();
    let z = &(&x * 3.0) + 1.0;

    let first_mean = z.mean();
    let first_variance = z.variance();
    for _ in 0..5 {
        assert_eq!(z.mean(), first_mean);
        assert_eq!(z.variance(), first_variance);
    }
}

#[test]
fn moments_are_invariant_across_draws() {
    let graph = RvGraph::new();
    let x = graph.uniform(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    let mean_before = x.mean();
    let variance_before = x.variance();

    for _ in 0..20 {
        x.resample();
    }
    assert_eq!(x.mean(), mean_before);
    assert_eq!(x.variance(), variance_before);
}
