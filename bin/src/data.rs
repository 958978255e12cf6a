//! Price loading and CSV export for the CLI.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use polars::prelude::*;
use std::{fs::File, io::Cursor, path::Path};
use tsmom::{AssetTable, DATE_COLUMN, StrategyReturns};

/// Date column name used by the course price files.
pub(crate) const DEFAULT_DATE_COLUMN: &str = "Date";

fn read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_try_parse_dates(true))
}

/// Load a daily price CSV: one date column plus one column per asset.
pub(crate) fn read_prices(path: &Path, date_column: &str) -> Result<AssetTable> {
    let frame = read_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read price data from {}", path.display()))?;

    to_table(frame, date_column)
}

/// Parse price CSV text already held in memory.
pub(crate) fn parse_prices(csv: &str, date_column: &str) -> Result<AssetTable> {
    let frame = read_options()
        .into_reader_with_file_handle(Cursor::new(csv.as_bytes()))
        .finish()
        .context("failed to parse price data")?;

    to_table(frame, date_column)
}

fn to_table(mut frame: DataFrame, date_column: &str) -> Result<AssetTable> {
    let has_column = |name: &str| frame.get_column_names().iter().any(|c| c.as_str() == name);
    let (named, indexed) = (has_column(date_column), has_column(DATE_COLUMN));

    if named && date_column != DATE_COLUMN {
        frame.rename(date_column, DATE_COLUMN.into())?;
    } else if !named && !indexed {
        bail!("price data has no '{date_column}' column");
    }

    let table = AssetTable::new(frame)?;
    tracing::info!(
        rows = table.height(),
        assets = ?table.assets(),
        "loaded prices"
    );
    Ok(table)
}

/// Write per-asset and portfolio strategy returns as CSV.
pub(crate) fn write_strategy_csv(path: &Path, strategy: &StrategyReturns) -> Result<()> {
    let mut frame = strategy.table().frame().clone();
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = frame.height(), "wrote strategy returns");
    Ok(())
}

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{date_str}', expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const PRICES: &str = "\
Date,SP500,NASDAQ,DJIA
2020-01-02,3257.85,9092.19,28868.80
2020-01-03,3234.85,9020.77,28634.88
2020-01-06,3246.28,9071.47,28703.38
2020-01-07,3237.18,9068.58,28583.68
";

    #[test]
    fn test_parse_prices() {
        let table = parse_prices(PRICES, DEFAULT_DATE_COLUMN).unwrap();

        assert_eq!(table.height(), 4);
        assert_eq!(table.assets(), ["SP500", "NASDAQ", "DJIA"]);
        assert_eq!(
            table.dates().unwrap()[0],
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
        );
        assert_eq!(table.get("DJIA", 3).unwrap(), Some(28583.68));
    }

    #[test]
    fn test_parse_prices_with_missing_cells() {
        let csv = "Date,A,B\n2020-01-02,10.0,\n2020-01-03,10.5,20.0\n";
        let table = parse_prices(csv, DEFAULT_DATE_COLUMN).unwrap();

        assert_eq!(table.values("B").unwrap(), vec![None, Some(20.0)]);
    }

    #[test]
    fn test_parse_prices_lowercase_date_column() {
        let csv = "date,A\n2020-01-02,10.0\n2020-01-03,10.5\n";
        let table = parse_prices(csv, DEFAULT_DATE_COLUMN).unwrap();

        assert_eq!(table.assets(), ["A"]);
    }

    #[test]
    fn test_parse_prices_missing_date_column() {
        let csv = "Day,A\n2020-01-02,10.0\n";
        assert!(parse_prices(csv, DEFAULT_DATE_COLUMN).is_err());
    }

    #[test]
    fn test_parse_prices_unsorted_dates() {
        let csv = "Date,A\n2020-01-03,10.0\n2020-01-02,10.5\n";
        assert!(parse_prices(csv, DEFAULT_DATE_COLUMN).is_err());
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("15/01/2024").is_err());
    }
}
