//! Error types for graph construction and queries.

use thiserror::Error;

/// Errors that can occur while building or querying a random-variable graph.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// All fallible public APIs return `Result<T, RvError>`. Violated internal
/// invariants (a derived node referencing a missing operand, a child visited
/// before its parents during resampling) are programmer errors and assert
/// instead of returning an error.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RvError {
    /// A root's support and mass function do not form a probability
    /// distribution (empty or duplicated support, probability outside
    /// [0, 1], total mass not 1).
    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    /// An operation received an operand it cannot combine with, such as a
    /// random variable from a different graph or a non-finite constant.
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    /// Integer exponentiation with an exponent below 1.
    #[error("invalid exponent: {0}")]
    InvalidExponent(String),

    /// A computation produced a non-finite value where a finite number is
    /// required (e.g. a mass function returning NaN).
    #[error("numerical error: {0}")]
    Numerical(String),
}
