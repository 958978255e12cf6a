//! Core trait definitions for pipeline stages.
//!
//! The single-input stages (returns, momentum, signals, volatility) implement
//! [`Transform`], which gives the pipeline a uniform way to describe and run
//! them. The strategy stage reads three tables and is called directly.

use crate::{AssetTable, Result};

/// A whole-table transformation from one [`AssetTable`] to another of the
/// same shape.
pub trait Transform: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this stage.
    fn name(&self) -> &str;

    /// Human-readable description of what this stage computes.
    fn description(&self) -> &str;

    /// Number of leading rows that stay null on a fully populated input.
    fn warmup(&self) -> usize;

    /// Apply the transformation.
    ///
    /// Implementations validate their own preconditions only; upstream
    /// guarantees are not re-checked.
    fn apply(&self, input: &AssetTable) -> Result<AssetTable>;
}
