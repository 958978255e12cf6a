//! Rolling annualized volatility of daily returns.
//!
//! The window is an annualization convention, not a tunable of the strategy:
//! it stays at 252 observations whatever momentum lookback is used.

use crate::{AssetTable, Result, TsmomError, traits::Transform};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Configuration for the volatility estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Number of return observations in the rolling window (default: 252)
    pub window: usize,
    /// Trading days per year for annualization (default: 252)
    pub trading_days_per_year: usize,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window: TRADING_DAYS_PER_YEAR,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

/// Annualized rolling standard deviation of returns.
///
/// Formula: `σ_t = std(r_{t-w+1}, ..., r_t) × sqrt(252)`
///
/// Uses the sample standard deviation and requires a full window of defined
/// returns; earlier rows are null.
#[derive(Debug, Clone, Default)]
pub struct RollingVolatility {
    config: VolatilityConfig,
}

impl RollingVolatility {
    /// Create a volatility stage with the given configuration.
    pub const fn new(config: VolatilityConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub const fn config(&self) -> &VolatilityConfig {
        &self.config
    }
}

impl Transform for RollingVolatility {
    fn name(&self) -> &str {
        "rolling_volatility"
    }

    fn description(&self) -> &str {
        "Annualized standard deviation of daily returns over a fixed window"
    }

    fn warmup(&self) -> usize {
        self.config.window.saturating_sub(1)
    }

    fn apply(&self, returns: &AssetTable) -> Result<AssetTable> {
        let VolatilityConfig {
            window,
            trading_days_per_year,
        } = self.config;

        if window < 2 {
            return Err(TsmomError::invalid_parameter(
                "volatility_window",
                window,
                "a sample standard deviation needs at least 2 observations",
            ));
        }
        if trading_days_per_year == 0 {
            return Err(TsmomError::invalid_parameter(
                "trading_days_per_year",
                trading_days_per_year,
                "must be positive",
            ));
        }

        let annualization_factor = (trading_days_per_year as f64).sqrt();
        let options = RollingOptionsFixedWindow {
            window_size: window,
            min_periods: window,
            ..Default::default()
        };

        let volatility = returns.map_assets(|asset| {
            col(asset).rolling_std(options.clone()) * lit(annualization_factor)
        })?;

        if returns.height() < window {
            tracing::warn!(
                window,
                rows = returns.height(),
                "not enough rows for a single volatility estimate"
            );
        }
        tracing::debug!(window, rows = volatility.height(), "computed rolling volatility");
        Ok(volatility)
    }
}

/// Compute annualized rolling volatility of a return table.
pub fn calculate_volatility(returns: &AssetTable, config: &VolatilityConfig) -> Result<AssetTable> {
    RollingVolatility::new(*config).apply(returns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n as u64)
            .map(|i| {
                NaiveDate::from_ymd_opt(2020, 1, 1)
                    .unwrap()
                    .checked_add_days(chrono::Days::new(i))
                    .unwrap()
            })
            .collect()
    }

    fn sample_std(values: &[f64]) -> f64 {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    }

    #[test]
    fn test_volatility_window_boundary() {
        let n = 300;
        let returns: Vec<f64> = (0..n).map(|i| 0.01 * (i as f64 * 1.3).sin()).collect();
        let table = AssetTable::from_columns(
            &dates(n),
            vec![("SP500", returns.iter().copied().map(Some).collect())],
        )
        .unwrap();

        let vol = calculate_volatility(&table, &VolatilityConfig::default())
            .unwrap()
            .values("SP500")
            .unwrap();

        assert_eq!(vol.len(), n);
        assert!(vol[..251].iter().all(Option::is_none));
        assert!(vol[251..].iter().all(|v| v.is_some_and(|v| v >= 0.0)));

        let expected = sample_std(&returns[..252]) * 252f64.sqrt();
        assert_relative_eq!(vol[251].unwrap(), expected, epsilon = 1e-10);
        let expected_last = sample_std(&returns[n - 252..]) * 252f64.sqrt();
        assert_relative_eq!(vol[n - 1].unwrap(), expected_last, epsilon = 1e-10);
    }

    #[test]
    fn test_volatility_needs_full_window_of_defined_returns() {
        let n = 260;
        let mut returns: Vec<Option<f64>> = (0..n).map(|i| Some(0.001 * i as f64)).collect();
        returns[0] = None;
        let table = AssetTable::from_columns(&dates(n), vec![("A", returns)]).unwrap();

        let vol = calculate_volatility(&table, &VolatilityConfig::default())
            .unwrap()
            .values("A")
            .unwrap();

        assert!(vol[251].is_none());
        assert!(vol[252].is_some());
    }

    #[test]
    fn test_volatility_ignores_lookback_choice() {
        let config = VolatilityConfig::default();
        assert_eq!(config.window, 252);
        assert_eq!(RollingVolatility::new(config).warmup(), 251);
    }

    #[test]
    fn test_constant_returns_have_zero_volatility() {
        let n = 260;
        let table = AssetTable::from_columns(&dates(n), vec![("A", vec![Some(0.0); n])]).unwrap();

        let vol = calculate_volatility(&table, &VolatilityConfig::default())
            .unwrap()
            .values("A")
            .unwrap();

        assert!(vol[251..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_custom_window() {
        let n = 10;
        let returns: Vec<f64> = vec![0.01, -0.02, 0.03, 0.0, 0.01, -0.01, 0.02, 0.0, -0.03, 0.01];
        let table = AssetTable::from_columns(
            &dates(n),
            vec![("A", returns.iter().copied().map(Some).collect())],
        )
        .unwrap();
        let config = VolatilityConfig {
            window: 3,
            trading_days_per_year: 252,
        };

        let vol = calculate_volatility(&table, &config).unwrap().values("A").unwrap();

        assert!(vol[1].is_none());
        assert_relative_eq!(
            vol[2].unwrap(),
            sample_std(&returns[..3]) * 252f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rejects_degenerate_window() {
        let table = AssetTable::from_columns(&dates(3), vec![("A", vec![Some(0.1); 3])]).unwrap();
        let config = VolatilityConfig {
            window: 1,
            trading_days_per_year: 252,
        };
        assert!(matches!(
            calculate_volatility(&table, &config),
            Err(TsmomError::InvalidParameter { .. })
        ));
    }
}
