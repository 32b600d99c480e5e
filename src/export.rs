use std::fs::File;
use std::io::Write;
use std::path::Path;

use polars::prelude::*;

use crate::data::columnar::Table;
use crate::error::Result;

/// Write a table as comma-separated text with a header row. A zero-row
/// table still gets its header.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut df = table.dataframe().clone();
    CsvWriter::new(writer).has_header(true).finish(&mut df)?;
    Ok(())
}

pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn save_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file)
}
