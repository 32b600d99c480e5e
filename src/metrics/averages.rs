use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::data::columnar::Table;
use crate::error::{ReportError, Result};

/// Mean, min and max of one metric over its non-missing values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricSummary {
    pub column: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl MetricSummary {
    /// `None` when there is nothing to average.
    pub fn from_values(column: &str, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().copied().map(OrderedFloat).min()?.into_inner();
        let max = values.iter().copied().map(OrderedFloat).max()?.into_inner();
        Some(Self { column: column.to_string(), mean, min, max, count: values.len() })
    }
}

/// Per-run averages plus the run with the lowest mean.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateResult {
    /// In the order the metrics were requested.
    pub summaries: Vec<MetricSummary>,
    pub best: String,
    pub best_mean: f64,
    pub justification: String,
    /// Requested metrics the table does not have.
    pub missing: Vec<String>,
    /// Metrics present but without a single usable number.
    pub insufficient: Vec<String>,
}

impl AggregateResult {
    pub fn mean(&self, column: &str) -> Option<f64> {
        self.summaries.iter().find(|s| s.column == column).map(|s| s.mean)
    }

    pub fn means(&self) -> Vec<(&str, f64)> {
        self.summaries.iter().map(|s| (s.column.as_str(), s.mean)).collect()
    }

    /// Rank already-computed summaries. Ties go to the earliest summary.
    fn rank(
        summaries: Vec<MetricSummary>,
        missing: Vec<String>,
        insufficient: Vec<String>,
    ) -> Result<Self> {
        let mut winner: Option<&MetricSummary> = None;
        for summary in &summaries {
            if winner.map_or(true, |w| summary.mean < w.mean) {
                winner = Some(summary);
            }
        }
        let Some(winner) = winner else {
            return Err(ReportError::InsufficientData { columns: insufficient });
        };
        let best = winner.column.clone();
        let best_mean = winner.mean;
        let justification = format!(
            "{best} is the best because it has the lowest average response time of {best_mean:.2}."
        );
        Ok(Self { summaries, best, best_mean, justification, missing, insufficient })
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.summaries {
            writeln!(f, "{} Average Response Time: {:.2}", s.column, s.mean)?;
        }
        write!(
            f,
            "{} has the best (lowest) response times overall. {}",
            self.best, self.justification
        )
    }
}

/// Average each requested metric column over the table's rows.
///
/// Absent columns are listed in `missing`; only when every requested column
/// is absent does the call fail with `MissingColumn`. Columns without a
/// usable value go to `insufficient`, and if no column is left to rank the
/// call fails with `InsufficientData`.
pub fn averages<S: AsRef<str>>(table: &Table, metric_columns: &[S]) -> Result<AggregateResult> {
    if metric_columns.is_empty() {
        return Err(ReportError::InvalidCriteria("no metric columns requested".into()));
    }
    let requested: Vec<&str> = metric_columns.iter().map(|c| c.as_ref()).collect();
    let (present, missing): (Vec<&str>, Vec<&str>) =
        requested.into_iter().partition(|c| table.has_column(c));
    if present.is_empty() {
        return Err(ReportError::missing(missing));
    }
    if !missing.is_empty() {
        tracing::warn!(?missing, "metric columns not in table, averaging the rest");
    }

    let mut summaries = Vec::with_capacity(present.len());
    let mut insufficient = Vec::new();
    for column in present {
        match MetricSummary::from_values(column, &present_values(table, column)) {
            Some(summary) => summaries.push(summary),
            None => insufficient.push(column.to_string()),
        }
    }
    let missing = missing.into_iter().map(str::to_string).collect();
    AggregateResult::rank(summaries, missing, insufficient)
}

/// Average one metric column across several whole reports, one per run.
///
/// Each report's label stands in for the metric name, so the best/tie rules
/// are the same as [`averages`]. Reports lacking the column are listed in
/// `missing` by label.
pub fn compare_reports<L: AsRef<str>>(
    reports: &[(L, &Table)],
    column: &str,
) -> Result<AggregateResult> {
    if reports.is_empty() {
        return Err(ReportError::InvalidCriteria("no reports to compare".into()));
    }
    let mut summaries = Vec::new();
    let mut missing = Vec::new();
    let mut insufficient = Vec::new();
    for (label, table) in reports {
        let label = label.as_ref();
        if !table.has_column(column) {
            missing.push(label.to_string());
            continue;
        }
        match MetricSummary::from_values(label, &present_values(table, column)) {
            Some(summary) => summaries.push(summary),
            None => insufficient.push(label.to_string()),
        }
    }
    if missing.len() == reports.len() {
        return Err(ReportError::missing([column]));
    }
    AggregateResult::rank(summaries, missing, insufficient)
}

/// Non-missing numeric cells of `column`; empty when absent or textual.
fn present_values(table: &Table, column: &str) -> Vec<f64> {
    table.column_f64(column).unwrap_or_default().into_iter().flatten().collect()
}
