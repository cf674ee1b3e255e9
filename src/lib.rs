//! # tyche — discrete random variables as dependency graphs
//!
//! `tyche` models discrete random variables as nodes of a directed acyclic
//! dependency graph. Independent "root" variables carry an explicit finite
//! support and mass function; algebraic operators (`+`, `-`, `*`, integer
//! powers, arbitrary unary transforms) derive new variables from existing
//! ones. Every variable answers two kinds of question:
//!
//! - **Exact moments** — `mean()`, `variance()`, `covariance()` are computed
//!   from the graph structure, not estimated. Dependence between two
//!   variables (shared ancestor roots) is resolved exactly by the law of
//!   total expectation over the shared roots' joint support.
//! - **Consistent samples** — `sample()`/`resample()` regenerate draws for a
//!   whole connected dependency subgraph in topological order, so every
//!   derived draw agrees with its ancestors' current draws.
//!
//! ## Architecture
//!
//! - **engine**: arena graph, operator algebra, moment computation, sampling
//! - **distributions**: Bernoulli / Binomial / Uniform leaf constructors
//! - **vector**: random vectors (joint construction, covariance matrices)
//!
//! ## Usage
//!
//! ```rust
//! use tyche::RvGraph;
//!
//! let graph = RvGraph::new();
//! let die = graph.uniform(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//! let other = graph.uniform(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//!
//! let total = &die + &other;
//! assert!((total.mean() - 7.0).abs() < 1e-9);
//!
//! // E[die²] ≠ E[die]²: the square shares its root with itself.
//! let squared = die.pow(2)?;
//! assert!((squared.mean() - 91.0 / 6.0).abs() < 1e-9);
//! # Ok::<(), tyche::RvError>(())
//! ```

#![forbid(unsafe_code)]

pub mod engine;
pub mod vector;

mod distributions;
mod special;

// Re-export commonly used types
pub use engine::errors::RvError;
pub use engine::graph::{NodeId, RandVar, RvGraph};
pub use engine::moments::FixedMeans;
pub use engine::sample::DEFAULT_TRIALS;
pub use vector::RandVec;
