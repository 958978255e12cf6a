//! Lookback sweep command.

use super::load_prices;
use crate::{OutputFormat, PipelineArgs};
use anyhow::Result;
use serde::Serialize;
use tsmom::{AssetTable, PerformanceSummary, Pipeline, PipelineConfig, lookback_from_days};

#[derive(Debug, Serialize)]
struct SweepRow {
    lookback: i64,
    #[serde(flatten)]
    performance: Option<PerformanceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the pipeline for every lookback on the same prices.
///
/// A lookback that cannot run (too long for the history, non-positive) is
/// reported in its row; the remaining lookbacks still run.
pub(crate) fn sweep(args: &PipelineArgs, lookbacks: &[i64], format: OutputFormat) -> Result<()> {
    let config = args.config()?;
    let prices = load_prices(args)?;

    let rows: Vec<SweepRow> = lookbacks
        .iter()
        .map(|&days| sweep_one(&prices, config, days))
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Lookback sweep over {} rows", prices.height());
            println!("{}", "=".repeat(60));
            println!(
                "{:>8} {:>10} {:>10} {:>10} {:>10}",
                "Lookback", "Return", "Vol", "Sharpe", "MaxDD"
            );
            for row in &rows {
                match (&row.performance, &row.error) {
                    (Some(p), _) => println!(
                        "{:>8} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                        row.lookback,
                        p.annualized_return,
                        p.annualized_volatility,
                        p.sharpe_ratio,
                        p.max_drawdown
                    ),
                    (None, Some(error)) => println!("{:>8} {}", row.lookback, error),
                    (None, None) => {}
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }

    Ok(())
}

fn sweep_one(prices: &AssetTable, mut config: PipelineConfig, days: i64) -> SweepRow {
    let result = lookback_from_days(days).and_then(|lookback| {
        config.momentum.lookback = lookback;
        Pipeline::new(config).run(prices)
    });

    match result {
        Ok(output) => SweepRow {
            lookback: days,
            performance: Some(output.performance),
            error: None,
        },
        Err(e) => {
            tracing::warn!(lookback = days, error = %e, "lookback skipped");
            SweepRow {
                lookback: days,
                performance: None,
                error: Some(e.to_string()),
            }
        }
    }
}
