//! Performance statistics of a daily return series.

use crate::{Result, TsmomError, volatility::TRADING_DAYS_PER_YEAR};
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How the annualized return is derived from daily returns.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annualization {
    /// Geometric: `(∏(1 + r))^(252 / n) - 1`
    #[default]
    Compounded,
    /// Arithmetic: `mean(r) × 252`
    Arithmetic,
}

/// Configuration for performance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Trading days per year for annualization (default: 252)
    pub trading_days_per_year: usize,
    /// Annualized return convention (default: compounded)
    pub annualization: Annualization,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            annualization: Annualization::default(),
        }
    }
}

/// Summary statistics of a strategy return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Annualized return
    pub annualized_return: f64,
    /// Annualized volatility (sample standard deviation × √252)
    pub annualized_volatility: f64,
    /// Annualized return divided by annualized volatility; NaN when the
    /// volatility is zero or undefined
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline of cumulative value, as a non-positive fraction
    pub max_drawdown: f64,
    /// Compounded return over the whole series
    pub total_return: f64,
    /// Number of observations used
    pub observations: usize,
}

const RETURN: &str = "return";

/// Compute performance statistics of a daily return series.
///
/// Null and non-finite observations are dropped before computing statistics; the
/// remaining series must not be empty.
///
/// - Annualized volatility: `std(r) × sqrt(252)` (sample standard deviation)
/// - Sharpe ratio: annualized return / annualized volatility
/// - Compounded annualized return: `-1` once wealth reaches zero, NaN when it
///   goes negative (a daily loss beyond 100% of a leveraged position), in
///   which case the Sharpe ratio is NaN as well
/// - Max drawdown: `min_t(W_t / peak_t - 1)` with `W_t = ∏(1 + r)` and the
///   running peak starting from the initial wealth of 1
pub fn calculate_performance(
    returns: &Series,
    config: &PerformanceConfig,
) -> Result<PerformanceSummary> {
    if config.trading_days_per_year == 0 {
        return Err(TsmomError::invalid_parameter(
            "trading_days_per_year",
            config.trading_days_per_year,
            "must be positive",
        ));
    }

    let series = returns
        .cast(&DataType::Float64)?
        .with_name(RETURN.into());
    let frame = DataFrame::new(vec![series.into()])?
        .lazy()
        .filter(col(RETURN).is_not_null().and(col(RETURN).is_finite()))
        .collect()?;

    let observations = frame.height();
    if observations == 0 {
        return Err(TsmomError::InvalidInput(
            "return series has no defined observations".to_string(),
        ));
    }

    let growth = col(RETURN) + lit(1.0);
    let wealth = growth.clone().cum_prod(false);
    let running_peak = wealth.clone().cum_max(false);
    let peak = when(running_peak.clone().lt(lit(1.0)))
        .then(lit(1.0))
        .otherwise(running_peak);

    let stats = frame
        .lazy()
        .select([
            growth.product().alias("growth"),
            col(RETURN).mean().alias("mean"),
            col(RETURN).std(1).alias("std"),
            ((wealth / peak) - lit(1.0)).min().alias("max_drawdown"),
        ])
        .collect()?;

    let scalar = |name: &str| -> Result<Option<f64>> {
        Ok(stats.column(name)?.f64()?.get(0))
    };

    let periods = config.trading_days_per_year as f64;
    let growth = scalar("growth")?.unwrap_or(f64::NAN);
    let mean = scalar("mean")?.unwrap_or(f64::NAN);
    // A single observation has no sample standard deviation.
    let std = scalar("std")?.unwrap_or(f64::NAN);
    let max_drawdown = scalar("max_drawdown")?.unwrap_or(f64::NAN);

    let annualized_return = match config.annualization {
        Annualization::Compounded if growth < 0.0 => {
            tracing::warn!(growth, "cumulative wealth went negative; no compounded return");
            f64::NAN
        }
        Annualization::Compounded => growth.powf(periods / observations as f64) - 1.0,
        Annualization::Arithmetic => mean * periods,
    };
    let annualized_volatility = std * periods.sqrt();
    let sharpe_ratio = if annualized_volatility == 0.0 || annualized_volatility.is_nan() {
        f64::NAN
    } else {
        annualized_return / annualized_volatility
    };

    let summary = PerformanceSummary {
        annualized_return,
        annualized_volatility,
        sharpe_ratio,
        max_drawdown,
        total_return: growth - 1.0,
        observations,
    };

    tracing::debug!(?summary, "computed performance");
    Ok(summary)
}
