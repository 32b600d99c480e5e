use serde::{Deserialize, Serialize};

use crate::data::columnar::Table;
use crate::error::{ReportError, Result};

/// One `(key, metric, value)` observation in long form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TidyRow {
    pub key: String,
    pub metric: String,
    /// `None` for a missing or non-numeric cell.
    pub value: Option<f64>,
}

/// Melt `metric_columns` against `key_column`.
///
/// Output is row-major: every metric of the first row, then the second, and
/// so on, with metrics in the requested order. Rows without a key are
/// skipped; metric columns the table lacks are skipped unless all of them
/// are missing.
pub fn tidy<S: AsRef<str>>(
    table: &Table,
    key_column: &str,
    metric_columns: &[S],
) -> Result<Vec<TidyRow>> {
    let requested: Vec<&str> = metric_columns.iter().map(|c| c.as_ref()).collect();
    let present: Vec<&str> = requested.iter().copied().filter(|c| table.has_column(c)).collect();

    let mut absent = Vec::new();
    if !table.has_column(key_column) {
        absent.push(key_column.to_string());
    }
    if present.is_empty() {
        absent.extend(requested.iter().map(|c| c.to_string()));
    }
    if !absent.is_empty() {
        return Err(ReportError::MissingColumn { columns: absent });
    }

    let keys = table.column_text(key_column).unwrap_or_default();
    let columns: Vec<(&str, Vec<Option<f64>>)> = present
        .iter()
        .map(|&c| (c, table.column_f64(c).unwrap_or_else(|| vec![None; table.len()])))
        .collect();

    let mut rows = Vec::with_capacity(table.len() * columns.len());
    for (i, key) in keys.into_iter().enumerate() {
        let Some(key) = key else { continue };
        for (metric, values) in &columns {
            rows.push(TidyRow { key: key.clone(), metric: metric.to_string(), value: values[i] });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn report() -> Table {
        Table::from_series(vec![
            Series::new("TransactionName", &[Some("Login"), None, Some("Logout")]),
            Series::new("Run1", &[Some(1.0), Some(2.0), None]),
            Series::new("Run2", &[4.0, 5.0, 6.0]),
        ])
        .unwrap()
    }

    #[test]
    fn row_major_then_metric_order() {
        let rows = tidy(&report(), "TransactionName", &["Run2", "Run1"]).unwrap();
        let flat: Vec<(&str, &str, Option<f64>)> =
            rows.iter().map(|r| (r.key.as_str(), r.metric.as_str(), r.value)).collect();
        assert_eq!(
            flat,
            vec![
                ("Login", "Run2", Some(4.0)),
                ("Login", "Run1", Some(1.0)),
                ("Logout", "Run2", Some(6.0)),
                ("Logout", "Run1", None),
            ]
        );
    }

    #[test]
    fn cardinality_is_rows_times_metrics() {
        let table = report().filter_rows(&[true, false, true]).unwrap();
        let rows = tidy(&table, "TransactionName", &["Run1", "Run2"]).unwrap();
        assert_eq!(rows.len(), table.len() * 2);
    }

    #[test]
    fn missing_key_or_all_metrics_are_errors() {
        assert!(matches!(
            tidy(&report(), "Transaction", &["Run1"]),
            Err(ReportError::MissingColumn { columns }) if columns == vec!["Transaction"]
        ));
        assert!(matches!(
            tidy(&report(), "TransactionName", &["Run8", "Run9"]),
            Err(ReportError::MissingColumn { columns }) if columns == vec!["Run8", "Run9"]
        ));
    }

    #[test]
    fn empty_table_gives_no_rows() {
        let rows = tidy(&report().empty_like(), "TransactionName", &["Run1"]).unwrap();
        assert!(rows.is_empty());
    }
}
