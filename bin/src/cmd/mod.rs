//! Command implementations.

pub(crate) mod run;
pub(crate) mod sweep;

use crate::{PipelineArgs, data};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tsmom::{AssetTable, PerformanceSummary, PipelineConfig};

/// Read a JSON pipeline configuration, or the defaults when no path is given.
///
/// Missing fields fall back to their defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;

    tracing::debug!(path = %path.display(), ?config, "loaded configuration");
    Ok(config)
}

/// Load prices and restrict them to the requested date range.
pub(crate) fn load_prices(args: &PipelineArgs) -> Result<AssetTable> {
    let prices = data::read_prices(&args.data, &args.date_column)?;

    let start = args.start.as_deref().map(data::parse_date).transpose()?;
    let end = args.end.as_deref().map(data::parse_date).transpose()?;
    if start.is_none() && end.is_none() {
        return Ok(prices);
    }

    let filtered = prices.filter_dates(start, end)?;
    tracing::info!(
        ?start,
        ?end,
        rows = filtered.height(),
        "filtered price history"
    );
    Ok(filtered)
}

/// Render the four headline statistics, one per line.
pub(crate) fn format_metrics(summary: &PerformanceSummary) -> String {
    format!(
        "  Annualized Return:     {:>10.4}\n  \
         Annualized Volatility: {:>10.4}\n  \
         Sharpe Ratio:          {:>10.4}\n  \
         Max Drawdown:          {:>10.4}",
        summary.annualized_return,
        summary.annualized_volatility,
        summary.sharpe_ratio,
        summary.max_drawdown,
    )
}
