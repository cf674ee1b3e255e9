//! # Random-Variable Dependency Graph
//!
//! This module implements the core graph data structure: an arena of nodes
//! addressed by [`NodeId`], plus the cheap [`RandVar`] handles user code
//! holds.
//!
//! ## Key Components
//!
//! - **NodeKind**: a closed tagged variant over "kind of derivation" — an
//!   explicit root distribution, or one of the algebraic derivations
//!   (constant shift, sum, constant scale, product, integer power, unary
//!   transform).
//!
//! - **GraphInner**: the arena. Nodes own edges in the parent direction only;
//!   the child direction is a non-owning observation list of ids used solely
//!   to drive resampling propagation.
//!
//! - **RvGraph** / **RandVar**: the public surface. A graph hands out handles;
//!   handles are cloneable and denote the same variable exactly when they
//!   share a graph and an id.
//!
//! ## Design
//!
//! Distributions are immutable after construction: only a node's current
//! sample and its memoized moments ever change. The graph is acyclic by
//! construction because operators only build new nodes on top of existing
//! ones.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::engine::errors::RvError;

/// Tolerance for the total probability mass of a root distribution.
///
/// Mass functions are user-supplied closures evaluated in floating point, so
/// the sum over the support is checked against 1 within this slack.
pub(crate) const MASS_TOLERANCE: f64 = 1e-6;

/// A unique identifier for a node in a random-variable graph.
///
/// `NodeId` implements `Ord`/`PartialOrd` for stable, deterministic
/// iteration. Uses `u32` internally for efficient storage and indexing.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A unary transform applied to an operand's sample or conditional mean.
pub(crate) type TransformFn = dyn Fn(f64) -> f64;

/// How a node's distribution is derived.
///
/// Roots carry an explicit finite support with probabilities precomputed at
/// construction; every other kind references its operand node(s) and derives
/// its sample and moment rules from them.
#[derive(Clone)]
pub(crate) enum NodeKind {
    Root {
        support: Vec<f64>,
        probs: Vec<f64>,
    },
    ConstSum {
        operand: NodeId,
        shift: f64,
    },
    Sum {
        lhs: NodeId,
        rhs: NodeId,
    },
    ConstProduct {
        operand: NodeId,
        factor: f64,
    },
    Product {
        lhs: NodeId,
        rhs: NodeId,
    },
    Power {
        base: NodeId,
        exponent: u32,
    },
    Transform {
        operand: NodeId,
        func: Rc<TransformFn>,
    },
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root { support, .. } => f
                .debug_struct("Root")
                .field("support_len", &support.len())
                .finish(),
            Self::ConstSum { operand, shift } => f
                .debug_struct("ConstSum")
                .field("operand", operand)
                .field("shift", shift)
                .finish(),
            Self::Sum { lhs, rhs } => f
                .debug_struct("Sum")
                .field("lhs", lhs)
                .field("rhs", rhs)
                .finish(),
            Self::ConstProduct { operand, factor } => f
                .debug_struct("ConstProduct")
                .field("operand", operand)
                .field("factor", factor)
                .finish(),
            Self::Product { lhs, rhs } => f
                .debug_struct("Product")
                .field("lhs", lhs)
                .field("rhs", rhs)
                .finish(),
            Self::Power { base, exponent } => f
                .debug_struct("Power")
                .field("base", base)
                .field("exponent", exponent)
                .finish(),
            Self::Transform { operand, .. } => f
                .debug_struct("Transform")
                .field("operand", operand)
                .finish(),
        }
    }
}

/// One node of the graph: its derivation plus per-node memoized state.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    /// Operand nodes this node was derived from; empty iff this is a root.
    pub(crate) parents: SmallVec<[NodeId; 2]>,
    /// Derived nodes built from this node. Non-owning back-references, used
    /// only to drive resampling propagation.
    pub(crate) children: Vec<NodeId>,
    /// Most recent draw, if any.
    pub(crate) sample: Option<f64>,
    /// Memoized unconditional expectation.
    pub(crate) mean: Option<f64>,
    /// Memoized variance.
    pub(crate) variance: Option<f64>,
    /// Memoized transitive root ancestors, sorted. Immutable once computed
    /// because graph structure never changes after construction.
    pub(crate) roots: Option<Box<[NodeId]>>,
}

impl Node {
    fn new(kind: NodeKind, parents: SmallVec<[NodeId; 2]>) -> Self {
        Self {
            kind,
            parents,
            children: Vec::new(),
            sample: None,
            mean: None,
            variance: None,
            roots: None,
        }
    }
}

/// The arena behind an [`RvGraph`].
///
/// Covariances are cached here rather than per node: the key is the
/// canonically ordered id pair, which makes the symmetric lookup a single
/// probe regardless of argument order.
#[derive(Debug, Default)]
pub(crate) struct GraphInner {
    pub(crate) nodes: Vec<Node>,
    pub(crate) covariances: FxHashMap<(NodeId, NodeId), f64>,
}

impl GraphInner {
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Appends a node and registers it as a child of each operand.
    fn push_node(&mut self, kind: NodeKind, parents: SmallVec<[NodeId; 2]>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for &parent in &parents {
            assert!(
                parent.index() < self.nodes.len(),
                "operand {parent:?} is not a node of this graph"
            );
            self.nodes[parent.index()].children.push(id);
        }
        self.nodes.push(Node::new(kind, parents));
        id
    }

    pub(crate) fn add_root(&mut self, support: Vec<f64>, probs: Vec<f64>) -> NodeId {
        debug_assert_eq!(support.len(), probs.len());
        self.push_node(NodeKind::Root { support, probs }, SmallVec::new())
    }

    pub(crate) fn add_const_sum(&mut self, operand: NodeId, shift: f64) -> NodeId {
        self.push_node(NodeKind::ConstSum { operand, shift }, smallvec![operand])
    }

    pub(crate) fn add_sum(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push_node(NodeKind::Sum { lhs, rhs }, smallvec![lhs, rhs])
    }

    pub(crate) fn add_const_product(&mut self, operand: NodeId, factor: f64) -> NodeId {
        self.push_node(NodeKind::ConstProduct { operand, factor }, smallvec![operand])
    }

    pub(crate) fn add_product(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push_node(NodeKind::Product { lhs, rhs }, smallvec![lhs, rhs])
    }

    pub(crate) fn add_power(&mut self, base: NodeId, exponent: u32) -> NodeId {
        debug_assert!(exponent >= 1, "power nodes require exponent >= 1");
        self.push_node(NodeKind::Power { base, exponent }, smallvec![base])
    }

    pub(crate) fn add_transform(&mut self, operand: NodeId, func: Rc<TransformFn>) -> NodeId {
        self.push_node(NodeKind::Transform { operand, func }, smallvec![operand])
    }

    /// Transitive root ancestors of `id`, computed once and cached.
    ///
    /// The returned set is sorted so that Cartesian enumeration over shared
    /// roots visits assignments in a deterministic order.
    pub(crate) fn roots_of(&mut self, id: NodeId) -> Box<[NodeId]> {
        if let Some(roots) = &self.node(id).roots {
            return roots.clone();
        }
        let parents = self.node(id).parents.clone();
        let roots: Box<[NodeId]> = if parents.is_empty() {
            Box::new([id])
        } else {
            let mut acc: Vec<NodeId> = Vec::new();
            for parent in parents {
                acc.extend_from_slice(&self.roots_of(parent));
            }
            acc.sort_unstable();
            acc.dedup();
            acc.into_boxed_slice()
        };
        self.node_mut(id).roots = Some(roots.clone());
        roots
    }
}

/// An arena of random-variable nodes.
///
/// The graph owns every node. [`RandVar`] handles address nodes by id, so
/// dropping a handle never invalidates anything: a variable stays valid and
/// query-able as long as any handle into its graph remains.
///
/// Cloning an `RvGraph` clones the handle, not the arena; both clones refer
/// to the same nodes.
#[derive(Clone, Debug, Default)]
pub struct RvGraph {
    inner: Rc<RefCell<GraphInner>>,
}

impl RvGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently in the arena, including nodes built
    /// internally for variance and covariance queries.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// Creates an independent root variable from an explicit finite support
    /// and mass function.
    ///
    /// The mass function is evaluated exactly once per support value; the
    /// resulting probabilities are cached for the node's lifetime, so an
    /// expensive mass function costs `support.len()` evaluations total.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidDistribution`] if the support is empty or contains
    /// non-finite or duplicated values, if any probability falls outside
    /// [0, 1], or if the total mass differs from 1 by more than the floating
    /// tolerance. [`RvError::Numerical`] if the mass function returns a
    /// non-finite value.
    pub fn root(
        &self,
        support: &[f64],
        mass_function: impl Fn(f64) -> f64,
    ) -> Result<RandVar, RvError> {
        if support.is_empty() {
            return Err(RvError::InvalidDistribution(
                "support must not be empty".into(),
            ));
        }
        for &x in support {
            if !x.is_finite() {
                return Err(RvError::InvalidDistribution(format!(
                    "support value {x} is not finite"
                )));
            }
        }
        let mut sorted = support.to_vec();
        sorted.sort_by(f64::total_cmp);
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(RvError::InvalidDistribution(
                "support values must be distinct".into(),
            ));
        }

        let mut probs = Vec::with_capacity(support.len());
        let mut total = 0.0;
        for &x in support {
            let p = mass_function(x);
            if !p.is_finite() {
                return Err(RvError::Numerical(format!(
                    "mass function returned {p} at {x}"
                )));
            }
            if !(0.0..=1.0).contains(&p) {
                return Err(RvError::InvalidDistribution(format!(
                    "probability {p} at {x} is outside [0, 1]"
                )));
            }
            total += p;
            probs.push(p);
        }
        if (total - 1.0).abs() > MASS_TOLERANCE {
            return Err(RvError::InvalidDistribution(format!(
                "mass sums to {total}, expected 1"
            )));
        }

        let id = self.inner.borrow_mut().add_root(support.to_vec(), probs);
        Ok(self.handle(id))
    }

    pub(crate) fn handle(&self, id: NodeId) -> RandVar {
        RandVar {
            graph: Rc::clone(&self.inner),
            id,
        }
    }
}

/// A handle to one random variable in an [`RvGraph`].
///
/// Handles are cheap to clone. Two handles compare equal exactly when they
/// denote the same node of the same graph.
#[derive(Clone)]
pub struct RandVar {
    pub(crate) graph: Rc<RefCell<GraphInner>>,
    pub(crate) id: NodeId,
}

impl fmt::Debug for RandVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandVar").field("id", &self.id).finish()
    }
}

impl PartialEq for RandVar {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph) && self.id == other.id
    }
}

impl Eq for RandVar {}

impl RandVar {
    /// The id of this variable's node within its graph.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether `other` belongs to the same graph as `self`.
    pub(crate) fn same_graph(&self, other: &RandVar) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    /// The root ancestors of this variable, found by following parents
    /// transitively. A root is its own single root ancestor.
    pub fn roots(&self) -> Vec<RandVar> {
        let ids = self.graph.borrow_mut().roots_of(self.id);
        ids.iter()
            .map(|&id| RandVar {
                graph: Rc::clone(&self.graph),
                id,
            })
            .collect()
    }
}
