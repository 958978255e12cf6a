//! Directional trading signals from momentum.

use crate::{AssetTable, Result, traits::Transform};
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Position taken when momentum is exactly zero.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroMomentum {
    /// Treat zero momentum as an up-trend (+1)
    #[default]
    Long,
    /// Treat zero momentum as a down-trend (-1)
    Short,
    /// Stay out of the market (0)
    Flat,
}

impl ZeroMomentum {
    /// Signal value assigned to a zero momentum reading.
    pub const fn value(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
            Self::Flat => 0.0,
        }
    }
}

/// Sign of momentum as a position direction.
///
/// - `+1.0` when momentum is positive
/// - `-1.0` when momentum is negative
/// - the [`ZeroMomentum`] value when momentum is exactly zero
/// - null when momentum is null
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumSignal {
    zero: ZeroMomentum,
}

impl MomentumSignal {
    /// Create a signal stage with the given zero-momentum policy.
    pub const fn new(zero: ZeroMomentum) -> Self {
        Self { zero }
    }

    /// The zero-momentum policy in use.
    pub const fn zero_policy(&self) -> ZeroMomentum {
        self.zero
    }
}

impl Transform for MomentumSignal {
    fn name(&self) -> &str {
        "momentum_signal"
    }

    fn description(&self) -> &str {
        "Long when trailing momentum is positive, short when negative"
    }

    fn warmup(&self) -> usize {
        0
    }

    fn apply(&self, momentum: &AssetTable) -> Result<AssetTable> {
        let tie = self.zero.value();

        let signals = momentum.map_assets(|asset| {
            when(col(asset).gt(lit(0.0)))
                .then(lit(1.0))
                .when(col(asset).lt(lit(0.0)))
                .then(lit(-1.0))
                .when(col(asset).eq(lit(0.0)))
                .then(lit(tie))
                .otherwise(lit(NULL))
        })?;

        tracing::debug!(zero = %self.zero, rows = signals.height(), "generated signals");
        Ok(signals)
    }
}

/// Map momentum to directional signals.
pub fn generate_signals(momentum: &AssetTable, zero: ZeroMomentum) -> Result<AssetTable> {
    MomentumSignal::new(zero).apply(momentum)
}
