use crate::data::columnar::Table;
use crate::error::{ReportError, Result};

/// Rows where at least one metric strictly exceeds the row's threshold.
///
/// A missing threshold or metric cell cannot breach, but the row can still
/// qualify through another metric. An empty table means nothing breached.
pub fn anomalies<S: AsRef<str>>(
    table: &Table,
    threshold_column: &str,
    metric_columns: &[S],
) -> Result<Table> {
    let mut absent = Vec::new();
    if !table.has_column(threshold_column) {
        absent.push(threshold_column.to_string());
    }
    let requested: Vec<&str> = metric_columns.iter().map(|c| c.as_ref()).collect();
    let present: Vec<&str> = requested.iter().copied().filter(|c| table.has_column(c)).collect();
    if present.is_empty() {
        absent.extend(requested.iter().map(|c| c.to_string()));
    }
    if !absent.is_empty() {
        return Err(ReportError::MissingColumn { columns: absent });
    }

    let Some(thresholds) = table.column_f64(threshold_column) else {
        tracing::warn!(
            column = threshold_column,
            "threshold column is not numeric, nothing can breach it"
        );
        return Ok(table.empty_like());
    };
    let mut breached = vec![false; table.len()];
    for column in present {
        let Some(values) = table.column_f64(column) else {
            tracing::warn!(column, "metric column is not numeric, skipped");
            continue;
        };
        for ((flag, value), limit) in breached.iter_mut().zip(values).zip(&thresholds) {
            if let (Some(v), Some(t)) = (value, limit) {
                *flag |= v > *t;
            }
        }
    }
    tracing::debug!(breaches = breached.iter().filter(|&&b| b).count(), "checked thresholds");
    table.filter_rows(&breached)
}
