//! Single-lookback run command.

use super::{format_metrics, load_prices};
use crate::{OutputFormat, PipelineArgs, data};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tsmom::{
    AssetTable, PerformanceSummary, Pipeline, PipelineConfig, PipelineOutput, lookback_from_days,
};

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    data: &'a Path,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    rows: usize,
    assets: &'a [String],
    config: &'a PipelineConfig,
    portfolio: &'a PerformanceSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    per_asset: Vec<AssetReport<'a>>,
}

#[derive(Debug, Serialize)]
struct AssetReport<'a> {
    asset: &'a str,
    #[serde(flatten)]
    performance: &'a PerformanceSummary,
}

/// Run the pipeline once and report portfolio performance.
pub(crate) fn run(
    args: &PipelineArgs,
    lookback_days: Option<i64>,
    format: OutputFormat,
    per_asset: bool,
    strategy_csv: Option<&Path>,
) -> Result<()> {
    let mut config = args.config()?;
    if let Some(days) = lookback_days {
        config.momentum.lookback = lookback_from_days(days)?;
    }

    let prices = load_prices(args)?;
    let output = Pipeline::new(config).run(&prices)?;

    let assets = if per_asset {
        output.asset_performance(&config.performance)?
    } else {
        Vec::new()
    };

    if let Some(path) = strategy_csv {
        data::write_strategy_csv(path, &output.strategy)?;
    }

    match format {
        OutputFormat::Text => print_text(args, &config, &prices, &output, &assets)?,
        OutputFormat::Json => {
            let (first_date, last_date) = date_range(&prices)?;
            let report = RunReport {
                data: &args.data,
                first_date,
                last_date,
                rows: prices.height(),
                assets: prices.assets(),
                config: &config,
                portfolio: &output.performance,
                per_asset: assets
                    .iter()
                    .map(|(asset, performance)| AssetReport { asset, performance })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// First and last date of the price history.
fn date_range(prices: &AssetTable) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let dates = prices.dates()?;
    Ok((dates.first().copied(), dates.last().copied()))
}

fn print_text(
    args: &PipelineArgs,
    config: &PipelineConfig,
    prices: &AssetTable,
    output: &PipelineOutput,
    assets: &[(String, PerformanceSummary)],
) -> Result<()> {
    println!(
        "Running Time Series Momentum Strategy (lookback={} days)",
        config.momentum.lookback
    );
    println!("{}", "=".repeat(60));

    match date_range(prices)? {
        (Some(first), Some(last)) => println!(
            "Data:         {} ({} rows, {} to {})",
            args.data.display(),
            prices.height(),
            first,
            last
        ),
        _ => println!("Data:         {}", args.data.display()),
    }
    println!("Assets:       {}", prices.assets().join(", "));
    println!("Target vol:   {:.2}", config.strategy.target_vol);
    println!("Observations: {}", output.performance.observations);

    println!("\nPerformance Metrics (TSMOM Portfolio):");
    println!("{}", format_metrics(&output.performance));
    println!(
        "  Total Return:          {:>10.4}",
        output.performance.total_return
    );

    if !assets.is_empty() {
        println!("\nPer-Asset Strategy Performance:");
        println!(
            "  {:<10} {:>10} {:>10} {:>10} {:>10}",
            "Asset", "Return", "Vol", "Sharpe", "MaxDD"
        );
        for (asset, summary) in assets {
            println!(
                "  {:<10} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                asset,
                summary.annualized_return,
                summary.annualized_volatility,
                summary.sharpe_ratio,
                summary.max_drawdown
            );
        }
    }

    Ok(())
}
