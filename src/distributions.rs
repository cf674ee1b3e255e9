//! Leaf distribution constructors.
//!
//! Each constructor only supplies a finite support and a mass function; the
//! node it builds is an ordinary root and participates in the graph with no
//! extra machinery. Any future named distribution slots in the same way.

use crate::engine::errors::RvError;
use crate::engine::graph::{RandVar, RvGraph};
use crate::special::ln_binomial;

impl RvGraph {
    /// A Bernoulli variable: 1 with probability `success_rate`, else 0.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidDistribution`] if `success_rate` is outside [0, 1].
    pub fn bernoulli(&self, success_rate: f64) -> Result<RandVar, RvError> {
        if !(0.0..=1.0).contains(&success_rate) {
            return Err(RvError::InvalidDistribution(format!(
                "success rate {success_rate} is outside [0, 1]"
            )));
        }
        self.root(&[0.0, 1.0], |x| {
            if x == 0.0 {
                1.0 - success_rate
            } else {
                success_rate
            }
        })
    }

    /// A Binomial variable: the number of successes among `trials`
    /// independent attempts, each succeeding with `success_rate`.
    ///
    /// The mass function is evaluated in log space
    /// (`exp(ln C(n,k) + k·ln p + (n−k)·ln q)`), so large trial counts do
    /// not overflow intermediate factorials.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidDistribution`] if `trials` is zero or
    /// `success_rate` is outside [0, 1].
    pub fn binomial(&self, trials: u32, success_rate: f64) -> Result<RandVar, RvError> {
        if trials == 0 {
            return Err(RvError::InvalidDistribution(
                "binomial requires at least one trial".into(),
            ));
        }
        if !(0.0..=1.0).contains(&success_rate) {
            return Err(RvError::InvalidDistribution(format!(
                "success rate {success_rate} is outside [0, 1]"
            )));
        }

        let support: Vec<f64> = (0..=trials).map(f64::from).collect();
        let p = success_rate;
        self.root(&support, move |x| {
            let successes = x as u32;
            // Degenerate rates would hit ln(0) below.
            if p == 0.0 {
                return if successes == 0 { 1.0 } else { 0.0 };
            }
            if p == 1.0 {
                return if successes == trials { 1.0 } else { 0.0 };
            }
            let log_mass = ln_binomial(trials, successes)
                + f64::from(successes) * p.ln()
                + f64::from(trials - successes) * (1.0 - p).ln();
            log_mass.exp()
        })
    }

    /// A uniform variable: every support value equally likely.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidDistribution`] if the support is empty, duplicated,
    /// or non-finite.
    pub fn uniform(&self, support: &[f64]) -> Result<RandVar, RvError> {
        let mass = 1.0 / support.len() as f64;
        self.root(support, |_| mass)
    }
}
