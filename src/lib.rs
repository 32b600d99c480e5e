pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;

pub mod data {
    pub mod cache;
    pub mod columnar;
    pub mod filter;
    pub mod loader;
}

pub mod metrics {
    pub mod anomalies;
    pub mod averages;
}

pub mod plot {
    pub mod charts;
    pub mod text;
    pub mod tidy;
}

pub use config::{ColumnKind, ColumnSpec, ReportSchema};
pub use data::cache::ReportCache;
pub use data::columnar::Table;
pub use data::filter::{FilterCriteria, RangeConstraint};
pub use data::loader::{load, load_named, ReportFormat};
pub use error::{ReportError, Result};
pub use metrics::anomalies::anomalies;
pub use metrics::averages::{averages, compare_reports, AggregateResult, MetricSummary};
pub use pipeline::{analyze, ReportAnalysis};
pub use plot::tidy::{tidy, TidyRow};

/// Apply filter criteria to a table. See [`data::filter::apply`].
pub fn filter(table: &Table, criteria: &FilterCriteria) -> Result<Table> {
    data::filter::apply(table, criteria)
}
