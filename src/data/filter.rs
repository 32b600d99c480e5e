use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::columnar::Table;
use crate::error::{ReportError, Result};

/// Inclusive `[min, max]` bound on one numeric column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeConstraint {
    column: String,
    min: f64,
    max: f64,
}

impl RangeConstraint {
    pub fn new(column: impl Into<String>, min: f64, max: f64) -> Result<Self> {
        let column = column.into();
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ReportError::InvalidCriteria(format!(
                "range for '{column}' must satisfy min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self { column, min, max })
    }

    /// Parse `column:min:max`. The column name may itself contain colons.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid =
            || ReportError::InvalidCriteria(format!("expected column:min:max, got '{spec}'"));
        let mut parts = spec.rsplitn(3, ':');
        let max = parts.next().and_then(|v| v.trim().parse::<f64>().ok()).ok_or_else(invalid)?;
        let min = parts.next().and_then(|v| v.trim().parse::<f64>().ok()).ok_or_else(invalid)?;
        let column = parts.next().filter(|c| !c.is_empty()).ok_or_else(invalid)?;
        Self::new(column, min, max)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct RowSelection {
    key_column: String,
    allowed_values: BTreeSet<String>,
    /// Whether rows with a missing key cell pass.
    #[serde(default)]
    keep_missing: bool,
}

/// One filtering request: projection, row selection and range constraints.
///
/// Built with the `with_*` methods, then consumed by [`apply`]. Nothing
/// mutates it afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    selected_columns: Vec<String>,
    rows: Option<RowSelection>,
    ranges: Vec<RangeConstraint>,
}

impl FilterCriteria {
    /// Project onto `selected_columns` (duplicates collapse to the first
    /// occurrence).
    pub fn new<I, S>(selected_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        for c in selected_columns.into_iter().map(Into::into) {
            if !columns.contains(&c) {
                columns.push(c);
            }
        }
        Self { selected_columns: columns, rows: None, ranges: Vec::new() }
    }

    /// Criteria that keep every column and, when `key_column` exists, every
    /// one of its values, including rows whose key is missing.
    pub fn select_all(table: &Table, key_column: &str) -> Self {
        Self::new(table.column_names()).with_all_rows(table, key_column)
    }

    /// Row selection that admits every row of `table`: all distinct key
    /// values, plus missing keys when the column has any.
    pub fn with_all_rows(self, table: &Table, key_column: &str) -> Self {
        let keep_missing = table.has_missing(key_column);
        self.with_rows(key_column, table.unique_values(key_column))
            .with_missing_keys(keep_missing)
    }

    pub fn with_rows<I, S>(mut self, key_column: impl Into<String>, allowed_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows = Some(RowSelection {
            key_column: key_column.into(),
            allowed_values: allowed_values.into_iter().map(Into::into).collect(),
            keep_missing: false,
        });
        self
    }

    /// Let rows with a missing key pass the row selection. No effect without
    /// a prior [`with_rows`](Self::with_rows).
    pub fn with_missing_keys(mut self, keep: bool) -> Self {
        if let Some(rows) = self.rows.as_mut() {
            rows.keep_missing = keep;
        }
        self
    }

    pub fn with_range(mut self, range: RangeConstraint) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected_columns
    }

    pub fn key_column(&self) -> Option<&str> {
        self.rows.as_ref().map(|r| r.key_column.as_str())
    }

    pub fn allowed_values(&self) -> Option<&BTreeSet<String>> {
        self.rows.as_ref().map(|r| &r.allowed_values)
    }

    pub fn keeps_missing_keys(&self) -> bool {
        self.rows.as_ref().map_or(false, |r| r.keep_missing)
    }

    pub fn ranges(&self) -> &[RangeConstraint] {
        &self.ranges
    }
}

/// Apply `criteria` to `table`: row selection, then projection, then range
/// filtering. Later steps see only what earlier steps kept.
///
/// Requesting a column the table lacks fails the whole call with
/// `UnknownColumn`; a stale key column or range column is skipped instead.
pub fn apply(table: &Table, criteria: &FilterCriteria) -> Result<Table> {
    let selected = select_rows(table, criteria)?;
    let projected = project(&selected, criteria.selected_columns())?;
    let ranged = apply_ranges(&projected, criteria.ranges())?;
    tracing::debug!(
        input_rows = table.len(),
        selected_rows = selected.len(),
        output_rows = ranged.len(),
        columns = ranged.width(),
        "applied filter"
    );
    Ok(ranged)
}

/// Step 1 on its own.
pub fn select_rows(table: &Table, criteria: &FilterCriteria) -> Result<Table> {
    let Some(rows) = criteria.rows.as_ref() else {
        return Ok(table.clone());
    };
    let Some(keys) = table.column_text(&rows.key_column) else {
        tracing::warn!(
            column = %rows.key_column,
            "row filter column not in table, keeping all rows"
        );
        return Ok(table.clone());
    };
    let mask: Vec<bool> = keys
        .iter()
        .map(|k| match k {
            Some(k) => rows.allowed_values.contains(k),
            None => rows.keep_missing,
        })
        .collect();
    table.filter_rows(&mask)
}

/// Step 2 on its own.
pub fn project(table: &Table, columns: &[String]) -> Result<Table> {
    table.select(columns)
}

/// Step 3 on its own. Every applicable constraint must hold; a missing cell
/// never falls inside a range.
pub fn apply_ranges(table: &Table, ranges: &[RangeConstraint]) -> Result<Table> {
    let mut mask = vec![true; table.len()];
    for range in ranges {
        let Some(values) = table.column_f64(range.column()) else {
            tracing::warn!(
                column = %range.column(),
                "range on absent or non-numeric column ignored"
            );
            continue;
        };
        for (keep, value) in mask.iter_mut().zip(values) {
            *keep &= value.map_or(false, |v| range.contains(v));
        }
    }
    if mask.iter().all(|&k| k) {
        return Ok(table.clone());
    }
    table.filter_rows(&mask)
}
