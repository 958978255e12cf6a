//! Simple daily returns from prices.

use crate::{AssetTable, Result, TsmomError, traits::Transform};
use polars::prelude::*;

/// Daily simple returns: `r_t = P_t / P_{t-1} - 1`.
///
/// The first row is null because there is no prior price. A null price
/// (asset not yet listed) makes the returns on both sides of it null.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyReturns;

impl Transform for DailyReturns {
    fn name(&self) -> &str {
        "daily_returns"
    }

    fn description(&self) -> &str {
        "Simple close-to-close return of each asset"
    }

    fn warmup(&self) -> usize {
        1
    }

    fn apply(&self, prices: &AssetTable) -> Result<AssetTable> {
        if prices.height() < 2 {
            return Err(TsmomError::InvalidInput(format!(
                "need at least 2 price rows to compute returns, got {}",
                prices.height()
            )));
        }
        validate_prices(prices)?;

        let returns = prices.map_assets(|asset| {
            (col(asset) / col(asset).shift(lit(1))) - lit(1.0)
        })?;

        tracing::debug!(
            rows = returns.height(),
            assets = returns.assets().len(),
            "computed daily returns"
        );
        Ok(returns)
    }
}

/// Compute daily simple returns for every asset of a price table.
pub fn calculate_returns(prices: &AssetTable) -> Result<AssetTable> {
    DailyReturns.apply(prices)
}

fn validate_prices(prices: &AssetTable) -> Result<()> {
    for asset in prices.assets() {
        let series = prices.series(asset)?;
        let bad = series
            .f64()?
            .into_iter()
            .flatten()
            .find(|p| !p.is_finite() || *p <= 0.0);

        if let Some(price) = bad {
            return Err(TsmomError::InvalidInput(format!(
                "asset '{asset}' has non-positive or non-finite price {price}"
            )));
        }
    }
    Ok(())
}
