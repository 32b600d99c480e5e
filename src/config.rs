//! Report layout: which column is the key, which holds the SLA, and how run
//! metric columns are recognized.
//!
//! A schema is plain JSON, every field optional:
//!
//! ```json
//! { "key_column": "TransactionName", "threshold_column": "SLA", "metric_pattern": "Run" }
//! ```
//!
//! Setting `metric_columns` pins the metrics explicitly instead of discovering
//! them by `metric_pattern`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::columnar::Table;
use crate::error::{ReportError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Categorical row identifier, e.g. a transaction name.
    Key,
    /// One measured run.
    Metric,
    /// Per-row upper bound a metric must not exceed.
    Threshold,
}

/// A column an operation relies on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self { name: name.into(), kind }
    }

    /// Fail with `MissingColumn` naming every spec the table lacks.
    pub fn require_all(specs: &[ColumnSpec], table: &Table) -> Result<()> {
        let missing: Vec<&str> =
            specs.iter().filter(|s| !table.has_column(&s.name)).map(|s| s.name.as_str()).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReportError::missing(missing))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSchema {
    pub key_column: String,
    pub threshold_column: String,
    /// Substring shared by every run metric column name.
    pub metric_pattern: String,
    pub metric_columns: Option<Vec<String>>,
}

impl Default for ReportSchema {
    fn default() -> Self {
        Self {
            key_column: "TransactionName".into(),
            threshold_column: "SLA".into(),
            metric_pattern: "Run".into(),
            metric_columns: None,
        }
    }
}

impl ReportSchema {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Metric columns for `table`: the pinned list as given, or every column
    /// containing `metric_pattern` (key and threshold excluded) in table
    /// order.
    pub fn metric_columns(&self, table: &Table) -> Vec<String> {
        if let Some(pinned) = &self.metric_columns {
            return pinned.clone();
        }
        table
            .column_names()
            .into_iter()
            .filter(|c| c != &self.key_column && c != &self.threshold_column)
            .filter(|c| c.contains(&self.metric_pattern))
            .collect()
    }

    /// Like [`metric_columns`](Self::metric_columns) but an empty discovery is
    /// a `MissingColumn` error.
    pub fn resolve_metrics(&self, table: &Table) -> Result<Vec<String>> {
        let metrics = self.metric_columns(table);
        if metrics.is_empty() {
            let pattern = format!("<columns containing '{}'>", self.metric_pattern);
            return Err(ReportError::missing([pattern]));
        }
        Ok(metrics)
    }

    pub fn column_specs(&self, table: &Table) -> Vec<ColumnSpec> {
        let mut specs = vec![
            ColumnSpec::new(&self.key_column, ColumnKind::Key),
            ColumnSpec::new(&self.threshold_column, ColumnKind::Threshold),
        ];
        specs.extend(
            self.metric_columns(table)
                .into_iter()
                .map(|m| ColumnSpec::new(m, ColumnKind::Metric)),
        );
        specs
    }

    /// Check the key column and metric columns are present. The threshold
    /// column is optional at this stage; only breach detection needs it.
    pub fn validate(&self, table: &Table) -> Result<()> {
        self.resolve_metrics(table)?;
        let required: Vec<ColumnSpec> = self
            .column_specs(table)
            .into_iter()
            .filter(|s| s.kind != ColumnKind::Threshold)
            .collect();
        ColumnSpec::require_all(&required, table)
    }
}
