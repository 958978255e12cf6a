#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tsmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod momentum;
pub mod performance;
pub mod pipeline;
pub mod returns;
pub mod signals;
pub mod strategy;
pub mod table;
pub mod traits;
pub mod volatility;

// Re-export core types
pub use error::{Result, TsmomError};
pub use momentum::{Momentum, MomentumConfig, calculate_momentum, lookback_from_days};
pub use performance::{Annualization, PerformanceConfig, PerformanceSummary, calculate_performance};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, run_pipeline};
pub use returns::{DailyReturns, calculate_returns};
pub use signals::{MomentumSignal, ZeroMomentum, generate_signals};
pub use strategy::{PORTFOLIO_COLUMN, StrategyConfig, StrategyReturns, calculate_strategy_returns};
pub use table::{AssetTable, DATE_COLUMN};
pub use traits::Transform;
pub use volatility::{
    RollingVolatility, TRADING_DAYS_PER_YEAR, VolatilityConfig, calculate_volatility,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
