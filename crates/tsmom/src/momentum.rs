//! Trailing cumulative-return momentum.

use crate::{AssetTable, Result, TsmomError, traits::Transform};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the momentum stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Number of trading days to look back (default: 252)
    pub lookback: usize,
    /// Number of most recent days excluded from the window (default: 0)
    pub skip_days: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback: 252,
            skip_days: 0,
        }
    }
}

impl MomentumConfig {
    /// Momentum over `lookback` days ending today.
    pub const fn with_lookback(lookback: usize) -> Self {
        Self {
            lookback,
            skip_days: 0,
        }
    }
}

/// Time-series momentum: compounded return over the trailing window.
///
/// `m_t = P_{t-skip} / P_{t-skip-k} - 1`
///
/// With `skip_days = 0` this is the return from `t-k` to `t`; with
/// `skip_days = 1` the window ends on the previous close, which excludes the
/// current day's return from the signal. Rows without enough history are null.
#[derive(Debug, Clone, Default)]
pub struct Momentum {
    config: MomentumConfig,
}

impl Momentum {
    /// Create a momentum stage with the given configuration.
    pub const fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub const fn config(&self) -> &MomentumConfig {
        &self.config
    }

    /// Check the window against the data and return the `(skip, span)` shifts.
    fn shifts(&self, rows: usize) -> Result<(i64, i64)> {
        let MomentumConfig {
            lookback,
            skip_days,
        } = self.config;

        if lookback < 1 {
            return Err(TsmomError::invalid_parameter(
                "lookback",
                lookback,
                "must be at least 1 trading day",
            ));
        }

        let span = lookback.checked_add(skip_days).ok_or_else(|| {
            TsmomError::invalid_parameter(
                "lookback",
                lookback,
                format!("lookback plus {skip_days} skipped days overflows"),
            )
        })?;
        if span >= rows {
            return Err(TsmomError::invalid_parameter(
                "lookback",
                lookback,
                format!(
                    "lookback plus {skip_days} skipped days must be below the {rows} available rows"
                ),
            ));
        }

        let to_shift = |n: usize| {
            i64::try_from(n).map_err(|_| {
                TsmomError::invalid_parameter("lookback", lookback, "window does not fit in i64")
            })
        };
        Ok((to_shift(skip_days)?, to_shift(span)?))
    }
}

impl Transform for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn description(&self) -> &str {
        "Compounded return over the trailing lookback window"
    }

    fn warmup(&self) -> usize {
        self.config.lookback.saturating_add(self.config.skip_days)
    }

    fn apply(&self, prices: &AssetTable) -> Result<AssetTable> {
        let (skip, span) = self.shifts(prices.height())?;

        let momentum = prices.map_assets(|asset| {
            let end = if skip == 0 {
                col(asset)
            } else {
                col(asset).shift(lit(skip))
            };
            (end / col(asset).shift(lit(span))) - lit(1.0)
        })?;

        tracing::debug!(
            lookback = self.config.lookback,
            skip_days = self.config.skip_days,
            rows = momentum.height(),
            "computed momentum"
        );
        Ok(momentum)
    }
}

/// Compute trailing momentum from a price table.
pub fn calculate_momentum(prices: &AssetTable, config: &MomentumConfig) -> Result<AssetTable> {
    Momentum::new(*config).apply(prices)
}

/// Convert an externally supplied day count into a lookback.
///
/// Zero and negative values are rejected; the upper bound depends on the data
/// and is checked when the stage runs.
pub fn lookback_from_days(days: i64) -> Result<usize> {
    if days < 1 {
        return Err(TsmomError::invalid_parameter(
            "lookback",
            days,
            "must be a positive number of trading days",
        ));
    }
    usize::try_from(days)
        .map_err(|_| TsmomError::invalid_parameter("lookback", days, "does not fit in usize"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn price_table(prices: &[f64]) -> AssetTable {
        let dates: Vec<NaiveDate> = (0..prices.len() as u64)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .checked_add_days(chrono::Days::new(i))
                    .unwrap()
            })
            .collect();
        AssetTable::from_columns(
            &dates,
            vec![("SP500", prices.iter().copied().map(Some).collect())],
        )
        .unwrap()
    }

    #[test]
    fn test_momentum_scenario() {
        let prices = price_table(&[100.0, 101.0, 99.0, 105.0, 103.0]);
        let momentum = calculate_momentum(&prices, &MomentumConfig::with_lookback(2)).unwrap();
        let values = momentum.values("SP500").unwrap();

        assert_eq!(&values[..2], &[None, None]);
        assert_relative_eq!(values[2].unwrap(), -0.01, epsilon = 1e-12);
        assert_relative_eq!(values[3].unwrap(), 105.0 / 101.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(values[4].unwrap(), 103.0 / 99.0 - 1.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(21)]
    #[case(63)]
    fn test_momentum_defined_from_lookback(#[case] k: usize) {
        let prices: Vec<f64> = (0..80)
            .map(|i| 100.0 * (1.0 + 0.1 * (i as f64 * 0.7).sin()))
            .collect();
        let table = price_table(&prices);

        let values = calculate_momentum(&table, &MomentumConfig::with_lookback(k))
            .unwrap()
            .values("SP500")
            .unwrap();

        for (t, value) in values.iter().enumerate() {
            if t < k {
                assert!(value.is_none(), "row {t} should be null for k={k}");
            } else {
                assert_relative_eq!(
                    value.unwrap(),
                    prices[t] / prices[t - k] - 1.0,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_momentum_skip_days() {
        let prices = price_table(&[100.0, 101.0, 99.0, 105.0, 103.0]);
        let config = MomentumConfig {
            lookback: 2,
            skip_days: 1,
        };

        let values = calculate_momentum(&prices, &config)
            .unwrap()
            .values("SP500")
            .unwrap();

        assert_eq!(&values[..3], &[None, None, None]);
        assert_relative_eq!(values[3].unwrap(), 99.0 / 100.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(values[4].unwrap(), 105.0 / 101.0 - 1.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(6)]
    fn test_momentum_rejects_out_of_range_lookback(#[case] k: usize) {
        let prices = price_table(&[100.0, 101.0, 99.0, 105.0, 103.0]);
        let result = calculate_momentum(&prices, &MomentumConfig::with_lookback(k));
        assert!(matches!(result, Err(TsmomError::InvalidParameter { .. })));
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(-252)]
    fn test_lookback_from_days_rejects_non_positive(#[case] days: i64) {
        assert!(matches!(
            lookback_from_days(days),
            Err(TsmomError::InvalidParameter { name: "lookback", .. })
        ));
    }

    #[test]
    fn test_lookback_from_days_accepts_positive() {
        assert_eq!(lookback_from_days(63).unwrap(), 63);
    }

    #[test]
    fn test_overflowing_window_is_rejected() {
        let config: MomentumConfig =
            serde_json::from_str(r#"{ "lookback": 18446744073709551615, "skip_days": 1 }"#)
                .unwrap();
        let prices = price_table(&[100.0, 101.0, 99.0, 105.0, 103.0]);

        assert!(matches!(
            calculate_momentum(&prices, &config),
            Err(TsmomError::InvalidParameter { name: "lookback", .. })
        ));
        assert_eq!(Momentum::new(config).warmup(), usize::MAX);
    }

    #[test]
    fn test_momentum_metadata() {
        let stage = Momentum::new(MomentumConfig {
            lookback: 126,
            skip_days: 21,
        });
        assert_eq!(stage.name(), "momentum");
        assert_eq!(stage.warmup(), 147);
        assert_eq!(Momentum::default().config().lookback, 252);
    }
}
