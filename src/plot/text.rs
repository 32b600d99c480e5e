use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table as TextTable};

use crate::data::columnar::Table;
use crate::metrics::averages::AggregateResult;

fn base() -> TextTable {
    let mut text = TextTable::new();
    text.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    text
}

/// Render a report table for a terminal.
pub fn render_table(table: &Table) -> TextTable {
    let mut text = base();
    text.set_header(table.column_names());
    for row in table.rows_text() {
        text.add_row(row);
    }
    text
}

/// One line per run with mean, min, max and sample count; the best run is
/// starred.
pub fn render_averages(result: &AggregateResult) -> TextTable {
    let mut text = base();
    text.set_header(vec!["Run", "Average", "Min", "Max", "Samples"]);
    for s in &result.summaries {
        let name = if s.column == result.best {
            format!("{} *", s.column)
        } else {
            s.column.clone()
        };
        text.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.2}", s.mean)),
            Cell::new(format!("{:.2}", s.min)),
            Cell::new(format!("{:.2}", s.max)),
            Cell::new(s.count),
        ]);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::averages::averages;
    use polars::prelude::*;

    #[test]
    fn table_rendering_includes_header_and_cells() {
        let table = Table::from_series(vec![
            Series::new("TransactionName", &["Login"]),
            Series::new("Run1", &[Some(2.5)]),
        ])
        .unwrap();
        let out = render_table(&table).to_string();
        assert!(out.contains("TransactionName"));
        assert!(out.contains("Login"));
        assert!(out.contains("2.5"));
    }

    #[test]
    fn best_run_is_starred() {
        let table =
            Table::from_series(vec![Series::new("A", &[1.0]), Series::new("B", &[3.0])]).unwrap();
        let out = render_averages(&averages(&table, &["A", "B"]).unwrap()).to_string();
        assert!(out.contains("A *"));
        assert!(out.contains("3.00"));
    }
}
