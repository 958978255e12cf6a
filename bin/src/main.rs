//! CLI for the time-series momentum pipeline.
//!
//! Loads a daily price CSV, runs the volatility-scaled momentum strategy and
//! reports performance of the equal-weighted portfolio.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{path::PathBuf, process};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tsmom::{PipelineConfig, ZeroMomentum};

#[derive(Parser)]
#[command(name = "tsmom")]
#[command(about = "Volatility-scaled time-series momentum backtests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the strategy for one lookback
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Momentum lookback in trading days
        #[arg(short, long, allow_negative_numbers = true)]
        lookback_days: Option<i64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also report each asset's own strategy performance
        #[arg(long)]
        per_asset: bool,

        /// Write per-asset and portfolio strategy returns to this CSV file
        #[arg(long)]
        strategy_csv: Option<PathBuf>,
    },

    /// Compare portfolio performance across lookbacks
    Sweep {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Lookbacks in trading days
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "21,63,126,252",
            allow_negative_numbers = true
        )]
        lookbacks: Vec<i64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the default pipeline configuration as JSON
    Config,
}

/// Options shared by every command that runs the pipeline.
#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// Price CSV with a date column and one column per asset
    #[arg(short, long, default_value = "data/price_data.csv")]
    data: PathBuf,

    /// Name of the date column in the CSV
    #[arg(long, default_value = data::DEFAULT_DATE_COLUMN)]
    date_column: String,

    /// JSON pipeline configuration; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target annualized volatility per asset
    #[arg(long)]
    target_vol: Option<f64>,

    /// Days between the momentum window end and the current day
    #[arg(long)]
    skip_days: Option<usize>,

    /// Signal for exactly zero momentum
    #[arg(long, value_enum)]
    zero_momentum: Option<ZeroPolicy>,

    /// First price date to use (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last price date to use (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,
}

impl PipelineArgs {
    /// Load the configuration file, if any, and apply flag overrides.
    fn config(&self) -> Result<PipelineConfig> {
        let mut config = cmd::load_config(self.config.as_deref())?;
        if let Some(target_vol) = self.target_vol {
            config.strategy.target_vol = target_vol;
        }
        if let Some(skip_days) = self.skip_days {
            config.momentum.skip_days = skip_days;
        }
        if let Some(policy) = self.zero_momentum {
            config.zero_momentum = policy.into();
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ZeroPolicy {
    Long,
    Short,
    Flat,
}

impl From<ZeroPolicy> for ZeroMomentum {
    fn from(policy: ZeroPolicy) -> Self {
        match policy {
            ZeroPolicy::Long => Self::Long,
            ZeroPolicy::Short => Self::Short,
            ZeroPolicy::Flat => Self::Flat,
        }
    }
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tsmom=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            lookback_days,
            format,
            per_asset,
            strategy_csv,
        } => {
            cmd::run::run(
                &pipeline,
                lookback_days,
                format,
                per_asset,
                strategy_csv.as_deref(),
            )?;
        }
        Commands::Sweep {
            pipeline,
            lookbacks,
            format,
        } => {
            cmd::sweep::sweep(&pipeline, &lookbacks, format)?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&PipelineConfig::default())?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["tsmom", "run"]).unwrap();
        let Commands::Run {
            pipeline,
            lookback_days,
            format,
            per_asset,
            strategy_csv,
        } = cli.command
        else {
            panic!("expected run command");
        };

        assert_eq!(pipeline.data, PathBuf::from("data/price_data.csv"));
        assert_eq!(pipeline.date_column, "Date");
        assert_eq!(lookback_days, None);
        assert_eq!(format, OutputFormat::Text);
        assert!(!per_asset);
        assert!(strategy_csv.is_none());
    }

    #[test]
    fn test_negative_lookback_parses() {
        let cli = Cli::try_parse_from(["tsmom", "run", "--lookback-days", "-5"]).unwrap();
        let Commands::Run { lookback_days, .. } = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(lookback_days, Some(-5));
    }

    #[test]
    fn test_sweep_lookbacks() {
        let cli = Cli::try_parse_from(["tsmom", "sweep", "--lookbacks", "10,20"]).unwrap();
        let Commands::Sweep { lookbacks, .. } = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(lookbacks, vec![10, 20]);

        let cli = Cli::try_parse_from(["tsmom", "sweep"]).unwrap();
        let Commands::Sweep { lookbacks, .. } = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(lookbacks, vec![21, 63, 126, 252]);
    }

    #[test]
    fn test_flag_overrides() {
        let cli = Cli::try_parse_from([
            "tsmom",
            "run",
            "--target-vol",
            "0.2",
            "--skip-days",
            "1",
            "--zero-momentum",
            "flat",
        ])
        .unwrap();
        let Commands::Run { pipeline, .. } = cli.command else {
            panic!("expected run command");
        };

        let config = pipeline.config().unwrap();
        assert_eq!(config.strategy.target_vol, 0.2);
        assert_eq!(config.momentum.skip_days, 1);
        assert_eq!(config.zero_momentum, ZeroMomentum::Flat);
        assert_eq!(config.volatility.window, 252);
    }
}
