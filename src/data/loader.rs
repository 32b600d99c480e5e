use std::io::Cursor;
use std::path::Path;

use calamine::{DataType as Cell, Reader, Xlsx};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::columnar::Table;
use crate::error::{ReportError, Result};

/// How the bytes of an uploaded report are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    DelimitedText,
    Spreadsheet,
}

impl ReportFormat {
    /// Infer the format from a filename's extension (case-insensitive).
    pub fn from_filename(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(ReportFormat::DelimitedText),
            "xlsx" | "xlsm" => Ok(ReportFormat::Spreadsheet),
            _ => Err(ReportError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Parse a report into a `Table`. Column names come verbatim from the
/// header row; cell types are whatever the parser infers.
pub fn load(bytes: &[u8], format: ReportFormat) -> Result<Table> {
    let table = match format {
        ReportFormat::DelimitedText => load_delimited(bytes)?,
        ReportFormat::Spreadsheet => load_spreadsheet(bytes)?,
    };
    tracing::debug!(?format, rows = table.len(), columns = table.width(), "loaded report");
    Ok(table)
}

/// Load using the filename hint to pick the format.
pub fn load_named(bytes: &[u8], filename: &str) -> Result<Table> {
    load(bytes, ReportFormat::from_filename(filename)?)
}

fn load_delimited(bytes: &[u8]) -> Result<Table> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ReportError::Parse("report is empty".into()));
    }
    let df = CsvReader::new(Cursor::new(bytes.to_vec()))
        .has_header(true)
        .finish()
        .map_err(|e| ReportError::Parse(e.to_string()))?;
    Ok(Table::new(df))
}

fn load_spreadsheet(bytes: &[u8]) -> Result<Table> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes.to_vec())).map_err(|e| ReportError::Parse(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::Parse("workbook has no sheets".into()))?
        .map_err(|e| ReportError::Parse(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| ReportError::Parse("sheet is empty".into()))?;
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| if cell.is_empty() { format!("Unnamed: {i}") } else { cell.to_string() })
        .collect();

    let body: Vec<&[Cell]> = rows.collect();
    let columns = names
        .iter()
        .enumerate()
        .map(|(i, name)| sheet_column(name, body.iter().map(|row| row.get(i))))
        .collect();

    Table::from_series(columns).map_err(|e| ReportError::Parse(e.to_string()))
}

/// A sheet column becomes numeric when every non-empty cell is a number,
/// otherwise text.
fn sheet_column<'a>(name: &str, cells: impl Iterator<Item = Option<&'a Cell>> + Clone) -> Series {
    let filled = || cells.clone().flatten().filter(|c| !c.is_empty());
    let numeric = filled().next().is_some() && filled().all(|c| cell_number(c).is_some());
    if numeric {
        let values: Vec<Option<f64>> = cells.map(|c| c.and_then(cell_number)).collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells
            .map(|c| c.filter(|c| !c.is_empty()).map(|c| c.to_string()))
            .collect();
        Series::new(name, values)
    }
}

fn cell_number(cell: &Cell) -> Option<f64> {
    cell.get_float().or_else(|| cell.get_int().map(|v| v as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ReportFormat::from_filename("run.csv").unwrap(), ReportFormat::DelimitedText);
        assert_eq!(ReportFormat::from_filename("RUN.XLSX").unwrap(), ReportFormat::Spreadsheet);
        assert!(matches!(
            ReportFormat::from_filename("run.pdf"),
            Err(ReportError::UnsupportedFormat(_))
        ));
        assert!(ReportFormat::from_filename("noext").is_err());
    }

    #[test]
    fn csv_header_names_are_verbatim() {
        let csv = b"TransactionName,SLA,Run1-90Percent\nLogin,5,6.5\nLogout,5,\n";
        let table = load(csv, ReportFormat::DelimitedText).unwrap();
        assert_eq!(table.column_names(), vec!["TransactionName", "SLA", "Run1-90Percent"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_f64("Run1-90Percent").unwrap(), vec![Some(6.5), None]);
    }

    #[test]
    fn empty_bytes_are_a_parse_error() {
        assert!(matches!(load(b"", ReportFormat::DelimitedText), Err(ReportError::Parse(_))));
    }

    #[test]
    fn garbage_spreadsheet_is_a_parse_error() {
        let err = load(b"definitely not a zip container", ReportFormat::Spreadsheet).unwrap_err();
        assert!(matches!(err, ReportError::Parse(_)));
    }
}
