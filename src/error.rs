use polars::prelude::PolarsError;

/// Every failure the report engine can hand back to its caller.
///
/// None of these are fatal to the process: a presentation layer is expected
/// to show the message and let the user pick another file or selection.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unsupported report format: {0}")]
    UnsupportedFormat(String),

    #[error("could not parse report: {0}")]
    Parse(String),

    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumn { columns: Vec<String> },

    #[error("no usable numeric values in: {}", .columns.join(", "))]
    InsufficientData { columns: Vec<String> },

    #[error("unknown columns requested: {}", .columns.join(", "))]
    UnknownColumn { columns: Vec<String> },

    #[error("invalid filter criteria: {0}")]
    InvalidCriteria(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn missing<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ReportError::MissingColumn { columns: columns.into_iter().map(Into::into).collect() }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
