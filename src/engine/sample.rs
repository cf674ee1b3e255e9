//! Sampling: topological resampling and Monte-Carlo estimation.
//!
//! A draw is only meaningful relative to the draws of its ancestors, so
//! regenerating one variable regenerates its whole connected dependency
//! subgraph: every root ancestor draws independently from its mass function,
//! then the new values propagate through derived nodes in topological order.
//! Ordering is mandatory — a derived node's sample rule reads its parents'
//! current draws, so a node may only be visited after all of its parents in
//! the traversal.

use std::collections::VecDeque;

use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::engine::graph::{GraphInner, NodeId, NodeKind, RandVar};

/// Trial count the original estimator interface used by default; callers of
/// [`RandVar::sample_mean`] pick their own, this is merely the conventional
/// choice.
pub const DEFAULT_TRIALS: usize = 10_000;

impl GraphInner {
    /// The node's current draw. Panics if none exists, which inside this
    /// module means a topological-order violation.
    fn current_sample(&self, id: NodeId) -> f64 {
        self.node(id)
            .sample
            .unwrap_or_else(|| unreachable!("node {id:?} visited before its parents were drawn"))
    }

    /// One fresh value for `id` from its own new-sample rule. Derived kinds
    /// read their parents' already-updated draws.
    fn draw<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> f64 {
        let kind = self.node(id).kind.clone();
        match kind {
            NodeKind::Root { support, probs } => {
                // Inverse-CDF walk; the last element absorbs floating slack.
                let u: f64 = rng.random_range(0.0..1.0);
                let mut cumulative = 0.0;
                for (x, p) in support.iter().zip(&probs) {
                    cumulative += p;
                    if u < cumulative {
                        return *x;
                    }
                }
                *support.last().expect("validated support is non-empty")
            }
            NodeKind::ConstSum { operand, shift } => self.current_sample(operand) + shift,
            NodeKind::Sum { lhs, rhs } => self.current_sample(lhs) + self.current_sample(rhs),
            NodeKind::ConstProduct { operand, factor } => factor * self.current_sample(operand),
            NodeKind::Product { lhs, rhs } => self.current_sample(lhs) * self.current_sample(rhs),
            NodeKind::Power { base, exponent } => self.current_sample(base).powi(exponent as i32),
            NodeKind::Transform { operand, func } => (*func)(self.current_sample(operand)),
        }
    }

    /// Draws a first value for `id` if it has never been drawn, recursing
    /// through ancestors only. Used for parents that sit outside a resample
    /// subgraph: they need a draw to be read from, but their own descendants
    /// must not be re-entered.
    fn ensure_drawn<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) {
        if self.node(id).sample.is_some() {
            return;
        }
        let parents = self.node(id).parents.clone();
        for parent in parents {
            self.ensure_drawn(parent, rng);
        }
        let value = self.draw(id, rng);
        self.node_mut(id).sample = Some(value);
    }

    /// Regenerates draws for the connected dependency subgraph of `id`:
    ///
    /// 1. take the cached root ancestors of `id`;
    /// 2. induce the subgraph of those roots and all their transitive
    ///    descendants (child edges);
    /// 3. visit it topologically (Kahn's algorithm over in-subgraph parent
    ///    counts), drawing each node from its own rule.
    ///
    /// A parent outside the induced subgraph keeps its current draw; if it
    /// has never been drawn at all it gets a first draw via
    /// [`ensure_drawn`](Self::ensure_drawn), mirroring the laziness of
    /// [`sample`](Self::sample).
    pub(crate) fn resample<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) {
        let seeds = self.roots_of(id);

        let mut members: Vec<NodeId> = Vec::new();
        let mut in_subgraph: FxHashSet<NodeId> = seeds.iter().copied().collect();
        let mut queue: VecDeque<NodeId> = seeds.iter().copied().collect();
        while let Some(node) = queue.pop_front() {
            members.push(node);
            let children = self.node(node).children.clone();
            for child in children {
                if in_subgraph.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            node = id.0,
            roots = seeds.len(),
            subgraph = members.len(),
            "topological resample"
        );

        // Parents outside the subgraph must carry a draw before propagation.
        for index in 0..members.len() {
            let parents = self.node(members[index]).parents.clone();
            for parent in parents {
                if !in_subgraph.contains(&parent) {
                    self.ensure_drawn(parent, rng);
                }
            }
        }

        // In-subgraph parent counts, with multiplicity: a node used as both
        // operands of one derivation is decremented once per operand edge.
        let mut indegree: FxHashMap<NodeId, usize> = FxHashMap::default();
        for &member in &members {
            let count = self
                .node(member)
                .parents
                .iter()
                .filter(|parent| in_subgraph.contains(parent))
                .count();
            indegree.insert(member, count);
        }

        let mut ready: VecDeque<NodeId> = members
            .iter()
            .copied()
            .filter(|member| indegree[member] == 0)
            .collect();
        let mut visited = 0usize;
        while let Some(node) = ready.pop_front() {
            let value = self.draw(node, rng);
            self.node_mut(node).sample = Some(value);
            visited += 1;
            let children = self.node(node).children.clone();
            for child in children {
                if let Some(remaining) = indegree.get_mut(&child) {
                    *remaining -= 1;
                    if *remaining == 0 {
                        ready.push_back(child);
                    }
                }
            }
        }
        assert_eq!(visited, members.len(), "dependency subgraph is not acyclic");
    }

    /// Most recent draw for `id`, generating the first one on demand.
    pub(crate) fn sample<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> f64 {
        if self.node(id).sample.is_none() {
            self.resample(id, rng);
        }
        self.current_sample(id)
    }
}

impl RandVar {
    /// The most recent draw for this variable, resampling its dependency
    /// subgraph first if it has never been drawn.
    pub fn sample(&self) -> f64 {
        self.sample_with_rng(&mut rand::rng())
    }

    /// Deterministic variant of [`sample`](Self::sample) for callers that
    /// bring their own RNG.
    pub fn sample_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.graph.borrow_mut().sample(self.id, rng)
    }

    /// Regenerates a fresh draw for this variable's connected dependency
    /// subgraph. Other variables sharing ancestors with this one are
    /// resampled too, keeping every draw in the subgraph mutually
    /// consistent.
    pub fn resample(&self) {
        self.resample_with_rng(&mut rand::rng())
    }

    /// Deterministic variant of [`resample`](Self::resample).
    pub fn resample_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) {
        self.graph.borrow_mut().resample(self.id, rng)
    }

    /// Point estimate of the mean from `trials` resample/sample cycles.
    ///
    /// Converges to [`mean`](Self::mean) by the law of large numbers; a
    /// high-variance variable converges more slowly.
    ///
    /// # Panics
    /// Panics if `trials` is zero.
    pub fn sample_mean(&self, trials: usize) -> f64 {
        self.sample_mean_with_rng(trials, &mut rand::rng())
    }

    /// Deterministic variant of [`sample_mean`](Self::sample_mean).
    pub fn sample_mean_with_rng<R: Rng + ?Sized>(&self, trials: usize, rng: &mut R) -> f64 {
        assert!(trials > 0, "sample_mean requires at least one trial");
        let mut inner = self.graph.borrow_mut();
        let mut sum = 0.0;
        for _ in 0..trials {
            inner.resample(self.id, rng);
            sum += inner.current_sample(self.id);
        }
        sum / trials as f64
    }

    /// Point estimate of the variance from `trials` resample/sample cycles.
    ///
    /// # Panics
    /// Panics if `trials` is zero.
    pub fn sample_variance(&self, trials: usize) -> f64 {
        self.sample_variance_with_rng(trials, &mut rand::rng())
    }

    /// Deterministic variant of [`sample_variance`](Self::sample_variance).
    pub fn sample_variance_with_rng<R: Rng + ?Sized>(&self, trials: usize, rng: &mut R) -> f64 {
        assert!(trials > 0, "sample_variance requires at least one trial");
        let mut inner = self.graph.borrow_mut();
        let mut sum = 0.0;
        let mut sum_of_squares = 0.0;
        for _ in 0..trials {
            inner.resample(self.id, rng);
            let value = inner.current_sample(self.id);
            sum += value;
            sum_of_squares += value * value;
        }
        let mean = sum / trials as f64;
        sum_of_squares / trials as f64 - mean * mean
    }
}
