//! End-to-end time-series momentum pipeline.
//!
//! Prices flow forward through five stages:
//!
//! 1. [`DailyReturns`]: prices → simple returns
//! 2. [`Momentum`]: prices → trailing cumulative return
//! 3. [`MomentumSignal`]: momentum → +1 / −1
//! 4. [`RollingVolatility`] and [`calculate_strategy_returns`]: lagged,
//!    volatility-scaled strategy returns and the equal-weighted portfolio
//! 5. [`calculate_performance`]: portfolio statistics
//!
//! Only the momentum stage sees the lookback; the volatility window is fixed.

use crate::{
    AssetTable, Result,
    momentum::{Momentum, MomentumConfig},
    performance::{PerformanceConfig, PerformanceSummary, calculate_performance},
    returns::DailyReturns,
    signals::{MomentumSignal, ZeroMomentum},
    strategy::{StrategyConfig, StrategyReturns, calculate_strategy_returns},
    traits::Transform,
    volatility::{RollingVolatility, VolatilityConfig},
};
use serde::{Deserialize, Serialize};

/// Portfolio series shorter than this trigger a warning.
const SHORT_SERIES_WARNING: usize = 21;

/// Configuration of every pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Momentum lookback and skip
    pub momentum: MomentumConfig,
    /// Signal assigned to exactly zero momentum
    pub zero_momentum: ZeroMomentum,
    /// Rolling volatility window and annualization
    pub volatility: VolatilityConfig,
    /// Target volatility and floor
    pub strategy: StrategyConfig,
    /// Performance statistics conventions
    pub performance: PerformanceConfig,
}

impl PipelineConfig {
    /// Default configuration with the given momentum lookback.
    pub fn with_lookback(lookback: usize) -> Self {
        Self {
            momentum: MomentumConfig {
                lookback,
                ..MomentumConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Every table produced by a pipeline run plus the portfolio summary.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Daily simple returns
    pub returns: AssetTable,
    /// Trailing momentum
    pub momentum: AssetTable,
    /// Directional signals
    pub signals: AssetTable,
    /// Annualized rolling volatility
    pub volatility: AssetTable,
    /// Strategy returns per asset and for the portfolio
    pub strategy: StrategyReturns,
    /// Statistics of the portfolio (`TSMOM`) series
    pub performance: PerformanceSummary,
}

impl PipelineOutput {
    /// Performance statistics of each asset's own strategy returns.
    ///
    /// Assets whose strategy series never becomes defined are skipped.
    pub fn asset_performance(
        &self,
        config: &PerformanceConfig,
    ) -> Result<Vec<(String, PerformanceSummary)>> {
        let mut summaries = Vec::new();
        for asset in self.strategy.assets() {
            let series = self.strategy.asset(asset)?;
            if series.len() == series.null_count() {
                tracing::warn!(asset, "no defined strategy returns");
                continue;
            }
            summaries.push((asset.to_string(), calculate_performance(&series, config)?));
        }
        Ok(summaries)
    }
}

/// The momentum pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on a price table.
    pub fn run(&self, prices: &AssetTable) -> Result<PipelineOutput> {
        let span = tracing::info_span!(
            "pipeline",
            lookback = self.config.momentum.lookback,
            rows = prices.height(),
            assets = prices.assets().len()
        );
        let _guard = span.enter();

        let returns = DailyReturns.apply(prices)?;
        let momentum = Momentum::new(self.config.momentum).apply(prices)?;
        let signals = MomentumSignal::new(self.config.zero_momentum).apply(&momentum)?;
        let volatility = RollingVolatility::new(self.config.volatility).apply(&returns)?;
        let strategy =
            calculate_strategy_returns(&signals, &returns, &volatility, &self.config.strategy)?;

        let portfolio = strategy.portfolio()?;
        let defined = portfolio.len() - portfolio.null_count();
        if defined < SHORT_SERIES_WARNING {
            tracing::warn!(defined, "portfolio return series is very short");
        }
        let performance = calculate_performance(&portfolio, &self.config.performance)?;

        tracing::info!(
            annualized_return = performance.annualized_return,
            annualized_volatility = performance.annualized_volatility,
            sharpe_ratio = performance.sharpe_ratio,
            max_drawdown = performance.max_drawdown,
            "pipeline finished"
        );

        Ok(PipelineOutput {
            returns,
            momentum,
            signals,
            volatility,
            strategy,
            performance,
        })
    }

    /// Names and descriptions of the single-table stages, in run order.
    pub fn stages(&self) -> Vec<(String, String, usize)> {
        let momentum = Momentum::new(self.config.momentum);
        let signal = MomentumSignal::new(self.config.zero_momentum);
        let volatility = RollingVolatility::new(self.config.volatility);
        let stages: [&dyn Transform; 4] = [&DailyReturns, &momentum, &signal, &volatility];
        stages
            .iter()
            .map(|s| (s.name().to_string(), s.description().to_string(), s.warmup()))
            .collect()
    }
}

/// Run the pipeline with the default configuration and the given lookback.
pub fn run_pipeline(prices: &AssetTable, lookback: usize) -> Result<PipelineOutput> {
    Pipeline::new(PipelineConfig::with_lookback(lookback)).run(prices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.momentum.lookback, 252);
        assert_eq!(config.momentum.skip_days, 0);
        assert_eq!(config.volatility.window, 252);
        assert_eq!(config.strategy.target_vol, 0.10);
        assert_eq!(config.zero_momentum, ZeroMomentum::Long);
    }

    #[test]
    fn test_config_json_round_trip_with_partial_input() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "momentum": { "lookback": 63, "skip_days": 1 } }"#).unwrap();

        assert_eq!(config.momentum.lookback, 63);
        assert_eq!(config.momentum.skip_days, 1);
        assert_eq!(config.strategy, StrategyConfig::default());
    }

    #[test]
    fn test_stage_listing() {
        let pipeline = Pipeline::new(PipelineConfig::with_lookback(21));
        let names: Vec<String> = pipeline.stages().into_iter().map(|(name, _, _)| name).collect();

        assert_eq!(
            names,
            vec!["daily_returns", "momentum", "momentum_signal", "rolling_volatility"]
        );
        assert_eq!(pipeline.stages()[1].2, 21);
    }
}
