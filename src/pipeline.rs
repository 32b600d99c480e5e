use crate::config::ReportSchema;
use crate::data::columnar::Table;
use crate::data::filter::{self, FilterCriteria};
use crate::error::Result;
use crate::metrics::anomalies::anomalies;
use crate::metrics::averages::{averages, AggregateResult};
use crate::plot::tidy::{tidy, TidyRow};

/// Everything one filter change produces.
///
/// Only filtering can fail the whole run. The derived views each keep their
/// own outcome so a caller can show the rest when, say, the SLA column is
/// missing.
#[derive(Debug)]
pub struct ReportAnalysis {
    pub filtered: Table,
    pub metric_columns: Vec<String>,
    pub averages: Result<AggregateResult>,
    pub tidy: Result<Vec<TidyRow>>,
    pub breaches: Result<Table>,
}

/// Filter `table`, then derive averages, tidy rows and SLA breaches from the
/// filtered rows, with columns named by `schema`.
pub fn analyze(
    table: &Table,
    schema: &ReportSchema,
    criteria: &FilterCriteria,
) -> Result<ReportAnalysis> {
    let filtered = filter::apply(table, criteria)?;
    let metric_columns = schema.metric_columns(&filtered);
    let resolve = || schema.resolve_metrics(&filtered);

    let averages = resolve().and_then(|m| averages(&filtered, &m));
    let tidy = resolve().and_then(|m| tidy(&filtered, &schema.key_column, &m));
    let breaches = resolve().and_then(|m| breach_view(&filtered, schema, &m));

    tracing::info!(
        rows = filtered.len(),
        metrics = metric_columns.len(),
        averages_ok = averages.is_ok(),
        breaches = breaches.as_ref().map(Table::len).unwrap_or(0),
        "analyzed report"
    );
    Ok(ReportAnalysis { filtered, metric_columns, averages, tidy, breaches })
}

/// Breaching rows narrowed to key, threshold and metric columns, for display.
/// The key column is dropped from the view when the table lacks it.
pub fn breach_view(
    table: &Table,
    schema: &ReportSchema,
    metric_columns: &[String],
) -> Result<Table> {
    let rows = anomalies(table, &schema.threshold_column, metric_columns)?;
    let mut columns = Vec::with_capacity(metric_columns.len() + 2);
    if rows.has_column(&schema.key_column) {
        columns.push(schema.key_column.clone());
    }
    columns.push(schema.threshold_column.clone());
    columns.extend(metric_columns.iter().filter(|c| rows.has_column(c)).cloned());
    rows.select(&columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load, ReportFormat};
    use crate::error::ReportError;

    const REPORT: &str = "TransactionName,SLA,Elapsed,Run1-90Percent,Run2-90Percent\n\
                          Login,5,10,6,4\n\
                          Search,3,11,2,2.5\n\
                          Logout,5,12,4,7\n";

    fn table() -> Table {
        load(REPORT.as_bytes(), ReportFormat::DelimitedText).unwrap()
    }

    #[test]
    fn full_run_over_every_row() {
        let table = table();
        let schema = ReportSchema::default();
        let criteria = FilterCriteria::select_all(&table, &schema.key_column);
        let analysis = analyze(&table, &schema, &criteria).unwrap();

        assert_eq!(analysis.filtered, table);
        assert_eq!(analysis.metric_columns, vec!["Run1-90Percent", "Run2-90Percent"]);
        let avg = analysis.averages.unwrap();
        assert_eq!(avg.best, "Run1-90Percent");
        assert_eq!(analysis.tidy.unwrap().len(), 6);

        let breaches = analysis.breaches.unwrap();
        assert_eq!(
            breaches.column_names(),
            vec!["TransactionName", "SLA", "Run1-90Percent", "Run2-90Percent"]
        );
        assert_eq!(breaches.unique_values("TransactionName"), vec!["Login", "Logout"]);
    }

    #[test]
    fn projecting_away_sla_only_fails_breaches() {
        let table = table();
        let schema = ReportSchema::default();
        let criteria = FilterCriteria::new(["TransactionName", "Run1-90Percent"]);
        let analysis = analyze(&table, &schema, &criteria).unwrap();
        assert!(analysis.averages.is_ok());
        assert!(analysis.tidy.is_ok());
        assert!(matches!(
            analysis.breaches,
            Err(ReportError::MissingColumn { columns }) if columns == vec!["SLA"]
        ));
    }

    #[test]
    fn no_metric_columns_left_is_reported_per_view() {
        let table = table();
        let criteria = FilterCriteria::new(["TransactionName", "SLA"]);
        let analysis = analyze(&table, &ReportSchema::default(), &criteria).unwrap();
        assert!(analysis.metric_columns.is_empty());
        assert!(matches!(analysis.averages, Err(ReportError::MissingColumn { .. })));
        assert!(matches!(analysis.tidy, Err(ReportError::MissingColumn { .. })));
    }

    #[test]
    fn unknown_projection_fails_the_run() {
        let criteria = FilterCriteria::new(["Nope"]);
        assert!(analyze(&table(), &ReportSchema::default(), &criteria).is_err());
    }
}
