//! Volatility-scaled strategy returns.

use crate::{AssetTable, Result, TsmomError, table::DATE_COLUMN};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the equal-weighted portfolio column.
pub const PORTFOLIO_COLUMN: &str = "TSMOM";

const SIGNAL_SUFFIX: &str = "__signal";
const VOLATILITY_SUFFIX: &str = "__volatility";

/// Configuration for position sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Target annualized volatility per asset position (default: 0.10)
    pub target_vol: f64,
    /// Lower bound applied to realized volatility before scaling (default: 0.0001)
    pub vol_floor: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            target_vol: 0.10,
            vol_floor: 0.0001,
        }
    }
}

impl StrategyConfig {
    fn validate(&self) -> Result<()> {
        if !(self.target_vol.is_finite() && self.target_vol > 0.0) {
            return Err(TsmomError::invalid_parameter(
                "target_vol",
                self.target_vol,
                "must be a positive annualized volatility",
            ));
        }
        if !(self.vol_floor.is_finite() && self.vol_floor > 0.0) {
            return Err(TsmomError::invalid_parameter(
                "vol_floor",
                self.vol_floor,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Realized strategy returns per asset plus the equal-weighted portfolio.
#[derive(Debug, Clone)]
pub struct StrategyReturns {
    table: AssetTable,
}

impl StrategyReturns {
    /// Table with one column per asset followed by [`PORTFOLIO_COLUMN`].
    pub const fn table(&self) -> &AssetTable {
        &self.table
    }

    /// The equal-weighted portfolio return series.
    pub fn portfolio(&self) -> Result<Series> {
        self.table.series(PORTFOLIO_COLUMN)
    }

    /// Strategy return series of a single asset.
    pub fn asset(&self, asset: &str) -> Result<Series> {
        if asset == PORTFOLIO_COLUMN {
            return Err(TsmomError::MissingColumn(asset.to_string()));
        }
        self.table.series(asset)
    }

    /// Asset names, excluding the portfolio column.
    pub fn assets(&self) -> Vec<&str> {
        self.table
            .assets()
            .iter()
            .map(String::as_str)
            .filter(|name| *name != PORTFOLIO_COLUMN)
            .collect()
    }
}

/// Compute volatility-scaled time-series momentum returns.
///
/// For asset `i` on day `t`:
///
/// `s_{i,t} = signal_{i,t-1} × (target_vol / max(σ_{i,t-1}, vol_floor)) × r_{i,t}`
///
/// Signal and volatility are both taken from the previous close so the
/// position held on day `t` only uses information available before `t`.
/// A null in any input at the required offset yields a null return.
///
/// The portfolio column is the mean over the assets whose return is defined
/// on that day and is null only when none is.
pub fn calculate_strategy_returns(
    signals: &AssetTable,
    returns: &AssetTable,
    volatility: &AssetTable,
    config: &StrategyConfig,
) -> Result<StrategyReturns> {
    config.validate()?;
    returns.ensure_aligned(signals, "signals")?;
    returns.ensure_aligned(volatility, "volatility")?;

    if returns.assets().iter().any(|a| a == PORTFOLIO_COLUMN) {
        return Err(TsmomError::InvalidInput(format!(
            "asset name '{PORTFOLIO_COLUMN}' is reserved for the portfolio column"
        )));
    }

    let assets = returns.assets();

    let mut inputs = returns.frame().clone();
    let mut extra: Vec<Column> = Vec::with_capacity(assets.len() * 2);
    for asset in assets {
        extra.push(
            signals
                .frame()
                .column(asset)?
                .clone()
                .with_name(format!("{asset}{SIGNAL_SUFFIX}").into()),
        );
        extra.push(
            volatility
                .frame()
                .column(asset)?
                .clone()
                .with_name(format!("{asset}{VOLATILITY_SUFFIX}").into()),
        );
    }
    inputs.hstack_mut(&extra)?;

    let target_vol = config.target_vol;
    let vol_floor = config.vol_floor;

    let asset_exprs: Vec<Expr> = assets
        .iter()
        .map(|asset| {
            let prev_signal = col(format!("{asset}{SIGNAL_SUFFIX}").as_str()).shift(lit(1));
            let prev_vol = col(format!("{asset}{VOLATILITY_SUFFIX}").as_str()).shift(lit(1));
            // A null volatility makes the comparison null and falls through to
            // `otherwise`, so undefined inputs stay undefined.
            let floored_vol = when(prev_vol.clone().lt(lit(vol_floor)))
                .then(lit(vol_floor))
                .otherwise(prev_vol);

            (prev_signal * (lit(target_vol) / floored_vol) * col(asset.as_str()))
                .alias(asset.as_str())
        })
        .collect();

    let mut selection = Vec::with_capacity(assets.len() + 2);
    selection.push(col(DATE_COLUMN));
    selection.extend(asset_exprs);

    let per_asset = inputs.lazy().select(selection);
    let frame = per_asset
        .with_column(equal_weight(assets).alias(PORTFOLIO_COLUMN))
        .collect()?;

    let table = AssetTable::new(frame)?;

    tracing::debug!(
        target_vol,
        defined = ?table.defined_counts(),
        "computed strategy returns"
    );

    Ok(StrategyReturns { table })
}

/// Mean across the defined asset columns, null when none is defined.
fn equal_weight(assets: &[String]) -> Expr {
    let sum = assets
        .iter()
        .map(|a| col(a.as_str()).fill_null(lit(0.0)))
        .reduce(|acc, e| acc + e)
        .unwrap_or_else(|| lit(0.0));
    let count = assets
        .iter()
        .map(|a| col(a.as_str()).is_not_null().cast(DataType::Float64))
        .reduce(|acc, e| acc + e)
        .unwrap_or_else(|| lit(0.0));

    when(count.clone().gt(lit(0.0)))
        .then(sum / count)
        .otherwise(lit(NULL))
        .cast(DataType::Float64)
}
