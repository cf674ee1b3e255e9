//! The random-variable graph engine.
//!
//! This module provides:
//! - **errors**: Error types for construction and query failures
//! - **graph**: Arena storage, node kinds, and variable handles
//! - **ops**: The operator algebra that builds derived nodes
//! - **moments**: Exact mean/variance/covariance with fixed-means conditioning
//! - **sample**: Topological resampling and Monte-Carlo estimation

pub mod errors;
pub mod graph;
pub mod moments;
pub mod ops;
pub mod sample;
