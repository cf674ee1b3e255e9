//! Exact moment computation: means, variances, covariances.
//!
//! Moments recurse from a node toward its ancestors. Dependence between two
//! operands — shared ancestor roots — inverts that control flow: the shared
//! roots' joint support is enumerated, every combination is pinned through a
//! [`FixedMeans`] assignment, and the branch expectations are recombined by
//! the law of total expectation. Conditioned on its shared generating roots,
//! a dependent pair is independent again, which is what makes the
//! factorization in each branch exact.
//!
//! The same pinning mechanism handles integer powers and arbitrary unary
//! transforms: fixing every root ancestor of an operand makes the operand
//! degenerate, so a nonlinear function commutes with the conditional
//! expectation.

use rustc_hash::FxHashMap;

use crate::engine::errors::RvError;
use crate::engine::graph::{GraphInner, NodeId, NodeKind, RandVar, TransformFn};

/// A partial assignment pinning root variables to fixed values.
///
/// Used internally to condition dependent expectations; exposed so callers
/// can query conditional means directly. An assignment is read-only during a
/// query: recursion extends copies, never the caller's map.
///
/// Pins are interpreted against the graph of the variable being queried;
/// pinning a variable from an unrelated graph has no effect there.
#[derive(Debug, Clone, Default)]
pub struct FixedMeans {
    pins: FxHashMap<NodeId, f64>,
}

impl FixedMeans {
    /// An empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins `rv` to `value`, replacing any previous pin for it.
    pub fn pin(&mut self, rv: &RandVar, value: f64) -> &mut Self {
        self.pins.insert(rv.id(), value);
        self
    }

    /// Whether no variable is pinned.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Number of pinned variables.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub(crate) fn value_of(&self, id: NodeId) -> Option<f64> {
        self.pins.get(&id).copied()
    }

    pub(crate) fn pin_id(&mut self, id: NodeId, value: f64) {
        self.pins.insert(id, value);
    }
}

/// Intersection of two sorted id slices.
fn intersect_sorted(a: &[NodeId], b: &[NodeId]) -> Vec<NodeId> {
    let mut shared = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

impl GraphInner {
    /// Expectation of `id` under a partial root assignment.
    ///
    /// A pinned node short-circuits to its pinned value. The unconditional
    /// mean (empty assignment) is computed once and cached; conditional
    /// results are never cached because they depend on the caller's
    /// assignment.
    pub(crate) fn mean(&mut self, id: NodeId, fixed: &FixedMeans) -> f64 {
        if let Some(pinned) = fixed.value_of(id) {
            return pinned;
        }
        let unconditional = fixed.is_empty();
        if unconditional {
            if let Some(mean) = self.node(id).mean {
                return mean;
            }
        }

        let kind = self.node(id).kind.clone();
        let mean = match kind {
            NodeKind::Root { support, probs } => {
                support.iter().zip(&probs).map(|(x, p)| x * p).sum()
            }
            NodeKind::ConstSum { operand, shift } => self.mean(operand, fixed) + shift,
            NodeKind::Sum { lhs, rhs } => self.mean(lhs, fixed) + self.mean(rhs, fixed),
            NodeKind::ConstProduct { operand, factor } => factor * self.mean(operand, fixed),
            NodeKind::Product { lhs, rhs } => self.product_mean(lhs, rhs, fixed),
            NodeKind::Power { base, exponent } => self.power_mean(base, exponent, fixed),
            NodeKind::Transform { operand, func } => self.transform_mean(operand, &*func, fixed),
        };

        if unconditional {
            self.node_mut(id).mean = Some(mean);
        }
        mean
    }

    /// `E[X·Y]` under a partial root assignment.
    ///
    /// Operands with no shared ancestor roots are independent and factorize.
    /// Otherwise every combination of the shared roots' supports is pinned
    /// and the branch means are recombined, weighted by the joint probability
    /// of the combination.
    fn product_mean(&mut self, lhs: NodeId, rhs: NodeId, fixed: &FixedMeans) -> f64 {
        let lhs_roots = self.roots_of(lhs);
        let rhs_roots = self.roots_of(rhs);
        let shared = intersect_sorted(&lhs_roots, &rhs_roots);
        if shared.is_empty() {
            return self.mean(lhs, fixed) * self.mean(rhs, fixed);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            lhs = lhs.0,
            rhs = rhs.0,
            shared = shared.len(),
            "enumerating shared roots for dependent product"
        );

        let mut total = 0.0;
        for (assignment, weight) in self.root_assignments(&shared, fixed) {
            total += weight * self.mean(lhs, &assignment) * self.mean(rhs, &assignment);
        }
        total
    }

    /// `E[Xⁿ]` under a partial root assignment.
    ///
    /// A pinned base degenerates to `pinⁿ`. A root base is summed directly
    /// over its support (transformation theorem). Any other base is resolved
    /// by enumerating its root ancestors, which makes the base degenerate in
    /// every branch.
    fn power_mean(&mut self, base: NodeId, exponent: u32, fixed: &FixedMeans) -> f64 {
        if let Some(pinned) = fixed.value_of(base) {
            return pinned.powi(exponent as i32);
        }
        if let NodeKind::Root { support, probs } = &self.node(base).kind {
            return support
                .iter()
                .zip(probs)
                .map(|(x, p)| p * x.powi(exponent as i32))
                .sum();
        }

        let roots = self.roots_of(base);
        let mut total = 0.0;
        for (assignment, weight) in self.root_assignments(&roots, fixed) {
            let conditional = self.mean(base, &assignment);
            total += weight * conditional.powi(exponent as i32);
        }
        total
    }

    /// `E[g(X)]` by enumeration over X's root ancestors.
    fn transform_mean(&mut self, operand: NodeId, func: &TransformFn, fixed: &FixedMeans) -> f64 {
        let roots = self.roots_of(operand);
        let mut total = 0.0;
        for (assignment, weight) in self.root_assignments(&roots, fixed) {
            let conditional = self.mean(operand, &assignment);
            total += weight * func(conditional);
        }
        total
    }

    /// All weighted assignments of the given roots, respecting existing pins:
    /// a pinned root contributes a singleton column of weight 1, every other
    /// root its full support with probabilities.
    ///
    /// Each assignment extends a copy of `fixed`; the input is never mutated.
    /// Combinations are produced in deterministic support order.
    fn root_assignments(&self, roots: &[NodeId], fixed: &FixedMeans) -> Vec<(FixedMeans, f64)> {
        debug_assert!(!roots.is_empty());
        let mut columns: Vec<Vec<(f64, f64)>> = Vec::with_capacity(roots.len());
        for &root in roots {
            if let Some(pinned) = fixed.value_of(root) {
                columns.push(vec![(pinned, 1.0)]);
                continue;
            }
            match &self.node(root).kind {
                NodeKind::Root { support, probs } => columns.push(
                    support
                        .iter()
                        .copied()
                        .zip(probs.iter().copied())
                        .collect(),
                ),
                other => unreachable!("shared ancestor {root:?} is not a root node: {other:?}"),
            }
        }

        let combinations: usize = columns.iter().map(Vec::len).product();
        let mut assignments = Vec::with_capacity(combinations);
        let mut odometer = vec![0usize; columns.len()];
        loop {
            let mut assignment = fixed.clone();
            let mut weight = 1.0;
            for (position, column) in columns.iter().enumerate() {
                let (value, prob) = column[odometer[position]];
                assignment.pin_id(roots[position], value);
                weight *= prob;
            }
            assignments.push((assignment, weight));

            // Advance the odometer; done once the most significant digit wraps.
            let mut position = columns.len();
            loop {
                if position == 0 {
                    return assignments;
                }
                position -= 1;
                odometer[position] += 1;
                if odometer[position] < columns[position].len() {
                    break;
                }
                odometer[position] = 0;
            }
        }
    }

    /// Variance of `id`, cached after first computation.
    pub(crate) fn variance(&mut self, id: NodeId) -> f64 {
        if let Some(variance) = self.node(id).variance {
            return variance;
        }

        let kind = self.node(id).kind.clone();
        let variance = match kind {
            NodeKind::Root { support, probs } => {
                let mean = self.mean(id, &FixedMeans::default());
                let second: f64 = support.iter().zip(&probs).map(|(x, p)| x * x * p).sum();
                second - mean * mean
            }
            NodeKind::ConstSum { operand, .. } => self.variance(operand),
            NodeKind::Sum { lhs, rhs } => {
                self.variance(lhs) + self.variance(rhs) + 2.0 * self.covariance_of(lhs, rhs)
            }
            NodeKind::ConstProduct { operand, factor } => factor * factor * self.variance(operand),
            NodeKind::Product { .. } | NodeKind::Power { .. } | NodeKind::Transform { .. } => {
                // E[X²] − E[X]² through an internal power node; the power
                // rule composes with the fixed-means substitution for any
                // nesting of dependent operands underneath.
                let squared = self.add_power(id, 2);
                let second = self.mean(squared, &FixedMeans::default());
                let mean = self.mean(id, &FixedMeans::default());
                second - mean * mean
            }
        };

        self.node_mut(id).variance = Some(variance);
        variance
    }

    /// `Cov(X, Y) = E[XY] − E[X]E[Y]`, cached under the ordered id pair.
    pub(crate) fn covariance_of(&mut self, a: NodeId, b: NodeId) -> f64 {
        if a == b {
            return self.variance(a);
        }
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&covariance) = self.covariances.get(&key) {
            return covariance;
        }

        let product = self.add_product(a, b);
        let product_mean = self.mean(product, &FixedMeans::default());
        let covariance = product_mean
            - self.mean(a, &FixedMeans::default()) * self.mean(b, &FixedMeans::default());
        self.covariances.insert(key, covariance);
        covariance
    }
}

impl RandVar {
    /// The theoretical expectation `E[X]`, computed once and cached.
    pub fn mean(&self) -> f64 {
        self.graph.borrow_mut().mean(self.id, &FixedMeans::default())
    }

    /// The expectation conditioned on a partial root assignment.
    ///
    /// A variable present in the assignment short-circuits to its pinned
    /// value. Results under a non-empty assignment are not cached, so the
    /// unconditional [`mean`](Self::mean) is never polluted by conditioning.
    pub fn mean_given(&self, fixed: &FixedMeans) -> f64 {
        self.graph.borrow_mut().mean(self.id, fixed)
    }

    /// The theoretical variance `E[X²] − E[X]²`, computed once and cached.
    pub fn variance(&self) -> f64 {
        self.graph.borrow_mut().variance(self.id)
    }

    /// The covariance with another variable of the same graph.
    ///
    /// Symmetric and cached: querying `x.covariance(&y)` stores the value
    /// under the ordered pair, so the `y.covariance(&x)` orientation hits
    /// the same entry.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidOperand`] if `other` belongs to a different graph.
    pub fn covariance(&self, other: &RandVar) -> Result<f64, RvError> {
        if !self.same_graph(other) {
            return Err(RvError::InvalidOperand(
                "covariance requires variables from the same graph".into(),
            ));
        }
        Ok(self.graph.borrow_mut().covariance_of(self.id, other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::RvGraph;

    const TOL: f64 = 1e-12;

    #[test]
    fn intersect_sorted_basics() {
        let a = [NodeId(0), NodeId(2), NodeId(5)];
        let b = [NodeId(1), NodeId(2), NodeId(5), NodeId(9)];
        assert_eq!(intersect_sorted(&a, &b), vec![NodeId(2), NodeId(5)]);
        assert!(intersect_sorted(&a, &[]).is_empty());
    }

    #[test]
    fn pinned_node_short_circuits() {
        let graph = RvGraph::new();
        let x = graph.root(&[0.0, 1.0], |_| 0.5).unwrap();
        let y = &x * 3.0;

        let mut fixed = FixedMeans::new();
        fixed.pin(&y, 42.0);
        assert!((y.mean_given(&fixed) - 42.0).abs() < TOL);
        // The unconditional mean is untouched by the pinned query.
        assert!((y.mean() - 1.5).abs() < TOL);
    }

    #[test]
    fn conditioning_propagates_to_descendants() {
        let graph = RvGraph::new();
        let x = graph.root(&[0.0, 1.0], |_| 0.5).unwrap();
        let y = &(&x * 2.0) + 1.0;

        let mut fixed = FixedMeans::new();
        fixed.pin(&x, 1.0);
        assert!((y.mean_given(&fixed) - 3.0).abs() < TOL);
    }

    #[test]
    fn independent_product_factorizes() {
        let graph = RvGraph::new();
        let x = graph.root(&[1.0, 3.0], |_| 0.5).unwrap();
        let y = graph.root(&[2.0, 4.0], |_| 0.5).unwrap();
        let z = &x * &y;
        assert!((z.mean() - x.mean() * y.mean()).abs() < TOL);
    }

    #[test]
    fn dependent_product_uses_total_expectation() {
        let graph = RvGraph::new();
        let x = graph.root(&[0.0, 1.0], |_| 0.5).unwrap();
        // E[X·X] = E[X²] = 0.5 for a fair coin, not E[X]² = 0.25.
        let z = &x * &x;
        assert!((z.mean() - 0.5).abs() < TOL);
    }

    #[test]
    fn covariance_cache_is_symmetric() {
        let graph = RvGraph::new();
        let x = graph.root(&[0.0, 1.0], |_| 0.5).unwrap();
        let y = &x + 1.0;

        let forward = x.covariance(&y).unwrap();
        let nodes_after_forward = graph.node_count();
        let backward = y.covariance(&x).unwrap();

        assert!((forward - backward).abs() < TOL);
        // The reversed orientation must hit the cache, not build a new
        // product node.
        assert_eq!(graph.node_count(), nodes_after_forward);
    }
}
