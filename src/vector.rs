//! Random vectors: ordered collections of variables from one graph.
//!
//! A vector adds no algorithm of its own — every operation fans out to the
//! per-element [`RandVar`] contract, and the covariance queries assemble
//! their results into matrices. Mutual dependence between coordinates comes
//! entirely from the graph underneath: [`RvGraph::joint`] routes every
//! coordinate through one shared synthetic root, after which the ordinary
//! product/covariance machinery applies unmodified.

use rand::Rng;

use crate::engine::errors::RvError;
use crate::engine::graph::{RandVar, RvGraph};
use crate::engine::moments::FixedMeans;

/// An ordered, fixed-length collection of random variables.
#[derive(Debug, Clone)]
pub struct RandVec {
    elements: Vec<RandVar>,
}

impl RandVec {
    /// Wraps existing variables, dependent or independent.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidOperand`] if `elements` is empty or the variables
    /// come from different graphs.
    pub fn new(elements: Vec<RandVar>) -> Result<Self, RvError> {
        let Some(first) = elements.first() else {
            return Err(RvError::InvalidOperand(
                "a random vector needs at least one element".into(),
            ));
        };
        if elements.iter().any(|element| !first.same_graph(element)) {
            return Err(RvError::InvalidOperand(
                "all vector elements must come from the same graph".into(),
            ));
        }
        Ok(Self { elements })
    }

    /// Number of coordinates.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false: construction rejects empty vectors.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The underlying variables, in order.
    pub fn elements(&self) -> &[RandVar] {
        &self.elements
    }

    /// The coordinate at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&RandVar> {
        self.elements.get(index)
    }

    /// The most recent draw of every coordinate, in order.
    pub fn sample(&self) -> Vec<f64> {
        self.sample_with_rng(&mut rand::rng())
    }

    /// Deterministic variant of [`sample`](Self::sample).
    pub fn sample_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.elements
            .iter()
            .map(|element| element.sample_with_rng(rng))
            .collect()
    }

    /// Resamples every coordinate. Coordinates sharing ancestors stay
    /// mutually consistent because each element's own resample already
    /// propagates through the shared subgraph.
    pub fn resample(&self) {
        self.resample_with_rng(&mut rand::rng())
    }

    /// Deterministic variant of [`resample`](Self::resample).
    pub fn resample_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) {
        for element in &self.elements {
            element.resample_with_rng(rng);
        }
    }

    /// Elementwise theoretical means.
    pub fn mean(&self) -> Vec<f64> {
        self.elements.iter().map(RandVar::mean).collect()
    }

    /// Elementwise means conditioned on a partial root assignment.
    pub fn mean_given(&self, fixed: &FixedMeans) -> Vec<f64> {
        self.elements
            .iter()
            .map(|element| element.mean_given(fixed))
            .collect()
    }

    /// The covariance matrix of the vector against itself.
    pub fn variance(&self) -> Vec<Vec<f64>> {
        match self.cross_covariance(self) {
            Ok(matrix) => matrix,
            Err(_) => unreachable!("a vector shares its own graph"),
        }
    }

    /// The m×n matrix whose (i, j) entry is the covariance between this
    /// vector's i-th and the other vector's j-th coordinate.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidOperand`] if the vectors come from different
    /// graphs.
    pub fn cross_covariance(&self, other: &RandVec) -> Result<Vec<Vec<f64>>, RvError> {
        let mut matrix = Vec::with_capacity(self.len());
        for row in &self.elements {
            let mut entries = Vec::with_capacity(other.len());
            for column in &other.elements {
                entries.push(row.covariance(column)?);
            }
            matrix.push(entries);
        }
        Ok(matrix)
    }

    /// Elementwise Monte-Carlo mean estimates from `trials` cycles.
    pub fn sample_mean(&self, trials: usize) -> Vec<f64> {
        self.sample_mean_with_rng(trials, &mut rand::rng())
    }

    /// Deterministic variant of [`sample_mean`](Self::sample_mean).
    pub fn sample_mean_with_rng<R: Rng + ?Sized>(&self, trials: usize, rng: &mut R) -> Vec<f64> {
        self.elements
            .iter()
            .map(|element| element.sample_mean_with_rng(trials, rng))
            .collect()
    }

    /// Elementwise Monte-Carlo variance estimates from `trials` cycles.
    pub fn sample_variance(&self, trials: usize) -> Vec<f64> {
        self.sample_variance_with_rng(trials, &mut rand::rng())
    }

    /// Deterministic variant of [`sample_variance`](Self::sample_variance).
    pub fn sample_variance_with_rng<R: Rng + ?Sized>(
        &self,
        trials: usize,
        rng: &mut R,
    ) -> Vec<f64> {
        self.elements
            .iter()
            .map(|element| element.sample_variance_with_rng(trials, rng))
            .collect()
    }
}

impl RvGraph {
    /// Builds mutually dependent coordinates from a joint distribution.
    ///
    /// One synthetic root ranges over the support indices `{0..len-1}` with
    /// mass `mass_function(support[i])`; each coordinate is a unary
    /// transform of that root mapping the index to the coordinate's value.
    /// All coordinates are therefore dependent through the single shared
    /// root.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidOperand`] if the support tuples do not share one
    /// length; [`RvError::InvalidDistribution`] for an empty support,
    /// non-finite tuple values, or a mass function that does not sum to 1
    /// over the support.
    pub fn joint(
        &self,
        support: &[Vec<f64>],
        mass_function: impl Fn(&[f64]) -> f64,
    ) -> Result<RandVec, RvError> {
        let Some(first) = support.first() else {
            return Err(RvError::InvalidDistribution(
                "joint support must not be empty".into(),
            ));
        };
        let width = first.len();
        if width == 0 {
            return Err(RvError::InvalidDistribution(
                "joint support tuples must not be empty".into(),
            ));
        }
        if support.iter().any(|tuple| tuple.len() != width) {
            return Err(RvError::InvalidOperand(
                "joint support tuples must share one length".into(),
            ));
        }
        for tuple in support {
            for &value in tuple {
                if !value.is_finite() {
                    return Err(RvError::InvalidDistribution(format!(
                        "joint support value {value} is not finite"
                    )));
                }
            }
        }

        let probs: Vec<f64> = support.iter().map(|tuple| mass_function(tuple)).collect();
        let indices: Vec<f64> = (0..support.len()).map(|i| i as f64).collect();
        let root = self.root(&indices, |index| probs[index as usize])?;

        let mut elements = Vec::with_capacity(width);
        for coordinate in 0..width {
            let column: Vec<f64> = support.iter().map(|tuple| tuple[coordinate]).collect();
            elements.push(root.map(move |index| column[index as usize]));
        }
        RandVec::new(elements)
    }
}
