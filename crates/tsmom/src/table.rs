//! Date-indexed asset tables.
//!
//! Every stage of the pipeline consumes and produces an [`AssetTable`]: a
//! polars [`DataFrame`] with one `date` column and one `Float64` column per
//! asset. Cells that are not available (an asset before its listing, the
//! first return, rows inside a lookback window) are polars nulls.

use crate::{Result, TsmomError};
use chrono::NaiveDate;
use polars::prelude::*;

/// Name of the date index column.
pub const DATE_COLUMN: &str = "date";

/// An ordered-by-date table with one column per asset.
///
/// Invariants enforced on construction:
/// - a `date` column of polars `Date` type with no nulls
/// - dates strictly increasing (sorted, no duplicates)
/// - at least one asset column, every asset column `Float64`
#[derive(Debug, Clone)]
pub struct AssetTable {
    frame: DataFrame,
    assets: Vec<String>,
}

impl AssetTable {
    /// Validate a DataFrame and wrap it as an asset table.
    ///
    /// A string `date` column is parsed into `Date`; numeric asset columns are
    /// cast to `Float64`. Columns that cannot be cast are rejected.
    pub fn new(frame: DataFrame) -> Result<Self> {
        let date = frame
            .column(DATE_COLUMN)
            .map_err(|_| TsmomError::MissingColumn(DATE_COLUMN.to_string()))?
            .as_materialized_series()
            .clone();

        let date = if date.dtype() == &DataType::Date {
            date
        } else {
            date.strict_cast(&DataType::Date).map_err(|e| {
                TsmomError::InvalidInput(format!("date column is not a valid date: {e}"))
            })?
        };
        validate_dates(&date)?;

        let assets: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != DATE_COLUMN)
            .map(|name| name.to_string())
            .collect();

        if assets.is_empty() {
            return Err(TsmomError::InvalidInput(
                "table has no asset columns".to_string(),
            ));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(assets.len() + 1);
        columns.push(date.into());
        for asset in &assets {
            let values = frame
                .column(asset)?
                .as_materialized_series()
                .strict_cast(&DataType::Float64)
                .map_err(|e| {
                    TsmomError::InvalidInput(format!("asset column '{asset}' is not numeric: {e}"))
                })?;
            columns.push(values.into());
        }

        Ok(Self {
            frame: DataFrame::new(columns)?,
            assets,
        })
    }

    /// Build a table from dates and named value columns.
    pub fn from_columns(
        dates: &[NaiveDate],
        columns: Vec<(&str, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let mut frame_columns: Vec<Column> = Vec::with_capacity(columns.len() + 1);
        frame_columns.push(Series::new(DATE_COLUMN.into(), dates).into());

        for (name, values) in columns {
            if values.len() != dates.len() {
                return Err(TsmomError::InvalidInput(format!(
                    "column '{name}' has {} values for {} dates",
                    values.len(),
                    dates.len()
                )));
            }
            frame_columns.push(Series::new(name.into(), values).into());
        }

        Self::new(DataFrame::new(frame_columns)?)
    }

    /// Underlying DataFrame (`date` first, then assets in order).
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume the table and return the DataFrame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Asset column names in table order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of rows (trading dates).
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// The date index.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let dates = self
            .frame
            .column(DATE_COLUMN)?
            .as_materialized_series()
            .date()?
            .as_date_iter()
            .flatten()
            .collect();
        Ok(dates)
    }

    /// One asset column as a series.
    pub fn series(&self, asset: &str) -> Result<Series> {
        if !self.assets.iter().any(|a| a == asset) {
            return Err(TsmomError::MissingColumn(asset.to_string()));
        }
        Ok(self.frame.column(asset)?.as_materialized_series().clone())
    }

    /// One asset column as optional values.
    pub fn values(&self, asset: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.series(asset)?.f64()?.into_iter().collect())
    }

    /// A single cell; `None` when the cell is null.
    pub fn get(&self, asset: &str, row: usize) -> Result<Option<f64>> {
        if row >= self.height() {
            return Err(TsmomError::InvalidInput(format!(
                "row {row} out of bounds for table with {} rows",
                self.height()
            )));
        }
        Ok(self.series(asset)?.f64()?.get(row))
    }

    /// Keep the rows whose date lies within `[start, end]`.
    pub fn filter_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        let mut predicate = lit(true);
        if let Some(start) = start {
            predicate = predicate.and(col(DATE_COLUMN).gt_eq(lit(start)));
        }
        if let Some(end) = end {
            predicate = predicate.and(col(DATE_COLUMN).lt_eq(lit(end)));
        }

        let frame = self.frame.clone().lazy().filter(predicate).collect()?;
        Self::new(frame)
    }

    /// Apply one expression per asset and keep the date index.
    ///
    /// `expr` receives the asset name and returns the expression producing the
    /// new values of that column; the result is aliased back to the asset name.
    pub fn map_assets<F>(&self, expr: F) -> Result<Self>
    where
        F: Fn(&str) -> Expr,
    {
        let mut exprs = Vec::with_capacity(self.assets.len() + 1);
        exprs.push(col(DATE_COLUMN));
        exprs.extend(
            self.assets
                .iter()
                .map(|asset| expr(asset).cast(DataType::Float64).alias(asset.as_str())),
        );

        let frame = self.frame.clone().lazy().select(exprs).collect()?;

        Ok(Self {
            frame,
            assets: self.assets.clone(),
        })
    }

    /// Fail unless `other` has the same dates and assets as `self`.
    pub fn ensure_aligned(&self, other: &Self, what: &str) -> Result<()> {
        if self.assets != other.assets {
            return Err(TsmomError::InvalidInput(format!(
                "{what}: asset columns differ ({:?} vs {:?})",
                self.assets, other.assets
            )));
        }

        let ours = self.frame.column(DATE_COLUMN)?.as_materialized_series();
        let theirs = other.frame.column(DATE_COLUMN)?.as_materialized_series();
        if !ours.equals(theirs) {
            return Err(TsmomError::InvalidInput(format!(
                "{what}: date index differs"
            )));
        }

        Ok(())
    }

    /// Count defined (non-null) cells per asset.
    pub fn defined_counts(&self) -> Vec<(String, usize)> {
        self.assets
            .iter()
            .filter_map(|asset| {
                self.frame
                    .column(asset)
                    .ok()
                    .map(|c| (asset.clone(), c.len() - c.null_count()))
            })
            .collect()
    }
}

fn validate_dates(date: &Series) -> Result<()> {
    if date.null_count() > 0 {
        return Err(TsmomError::InvalidInput(
            "date column contains missing values".to_string(),
        ));
    }

    let dates: Vec<NaiveDate> = date.date()?.as_date_iter().flatten().collect();
    if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(TsmomError::InvalidInput(format!(
            "dates must be strictly increasing, found {} followed by {}",
            pair[0], pair[1]
        )));
    }

    Ok(())
}
