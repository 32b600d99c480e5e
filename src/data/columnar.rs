use itertools::Itertools;
use ordered_float::OrderedFloat;
use polars::prelude::*;

use crate::error::{ReportError, Result};

/// A report table: ordered, uniquely named, equal-length columns.
///
/// Backed by a Polars `DataFrame`, which already enforces both invariants on
/// construction. Every operation here returns a new `Table`; nothing mutates
/// in place, so a loaded report can be shared between pipeline runs freely.
#[derive(Clone, Debug)]
pub struct Table {
    df: DataFrame,
}

impl Table {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Build a table from named columns. Fails on duplicate names or
    /// unequal lengths.
    pub fn from_series(columns: Vec<Series>) -> Result<Self> {
        Ok(Self::new(DataFrame::new(columns)?))
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df.get_column_names().into_iter().map(str::to_string).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().contains(&name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.df.column(name).map(|s| s.dtype().is_numeric()).unwrap_or(false)
    }

    /// Extract a numeric column as `f64`, keeping missing cells (and NaN) as
    /// `None`. Returns `None` when the column is absent or not numeric.
    pub fn column_f64(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let series = self.df.column(name).ok()?;
        if !series.dtype().is_numeric() {
            return None;
        }
        let series = series.cast(&DataType::Float64).ok()?;
        let values = series.f64().ok()?;
        Some(values.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
    }

    /// Extract any column as display text, missing cells as `None`.
    pub fn column_text(&self, name: &str) -> Option<Vec<Option<String>>> {
        let series = self.df.column(name).ok()?;
        let series = series.cast(&DataType::Utf8).ok()?;
        let values = series.utf8().ok()?;
        Some(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Whether `name` exists and has at least one missing cell.
    pub fn has_missing(&self, name: &str) -> bool {
        self.df.column(name).map(|s| s.null_count() > 0).unwrap_or(false)
    }

    /// Distinct non-missing values of a column, in first-seen order.
    pub fn unique_values(&self, name: &str) -> Vec<String> {
        self.column_text(name).unwrap_or_default().into_iter().flatten().unique().collect()
    }

    /// `(min, max)` over the non-missing values of a numeric column.
    pub fn numeric_bounds(&self, name: &str) -> Option<(f64, f64)> {
        let values: Vec<OrderedFloat<f64>> =
            self.column_f64(name)?.into_iter().flatten().map(OrderedFloat).collect();
        let min = values.iter().min()?;
        let max = values.iter().max()?;
        Some((min.into_inner(), max.into_inner()))
    }

    /// First `n` rows, for previews.
    pub fn head(&self, n: usize) -> Table {
        Self::new(self.df.head(Some(n)))
    }

    /// Same columns, zero rows.
    pub fn empty_like(&self) -> Table {
        Self::new(self.df.slice(0, 0))
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.len() {
            return Err(ReportError::InvalidCriteria(format!(
                "row mask has {} entries for {} rows",
                mask.len(),
                self.len()
            )));
        }
        let mask = BooleanChunked::from_slice("mask", mask);
        Ok(Self::new(self.df.filter(&mask)?))
    }

    /// Keep only `columns`, in the given order. Every name must exist.
    pub fn select(&self, columns: &[String]) -> Result<Table> {
        let unknown: Vec<String> =
            columns.iter().filter(|c| !self.has_column(c)).cloned().collect();
        if !unknown.is_empty() {
            return Err(ReportError::UnknownColumn { columns: unknown });
        }
        Ok(Self::new(self.df.select(columns)?))
    }

    /// Row-major display text, missing cells rendered as empty strings.
    pub fn rows_text(&self) -> Vec<Vec<String>> {
        let columns: Vec<Vec<Option<String>>> = self
            .column_names()
            .iter()
            .map(|c| self.column_text(c).unwrap_or_default())
            .collect();
        (0..self.len())
            .map(|row| {
                columns
                    .iter()
                    .map(|col| col.get(row).cloned().flatten().unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        let names = self.column_names();
        names == other.column_names()
            && self.len() == other.len()
            && names.iter().all(|c| {
                self.is_numeric(c) == other.is_numeric(c)
                    && self.column_text(c) == other.column_text(c)
            })
    }
}
