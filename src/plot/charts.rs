use std::fs;
use std::path::Path;

use plotly::common::{Mode, Title};
use plotly::layout::{Axis, BarMode};
use plotly::{Bar, Layout, Plot, Scatter};
use serde::Serialize;

use crate::error::Result;
use crate::plot::tidy::TidyRow;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// All points of one metric, in tidy-row order: one trace on a chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
}

/// Group tidy rows into one series per metric, metrics in first-seen order.
pub fn group_series(rows: &[TidyRow]) -> Vec<ChartSeries> {
    let mut series: Vec<ChartSeries> = Vec::new();
    for row in rows {
        let idx = match series.iter().position(|s| s.name == row.metric) {
            Some(idx) => idx,
            None => {
                series.push(ChartSeries { name: row.metric.clone(), x: Vec::new(), y: Vec::new() });
                series.len() - 1
            }
        };
        series[idx].x.push(row.key.clone());
        series[idx].y.push(row.value);
    }
    series
}

/// Series as JSON, for front ends that draw their own charts.
pub fn series_json(rows: &[TidyRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&group_series(rows))?)
}

fn layout(title: &str, key_label: &str, value_label: &str) -> Layout {
    Layout::new()
        .title(Title::new(title))
        .x_axis(Axis::new().title(Title::new(key_label)))
        .y_axis(Axis::new().title(Title::new(value_label)))
}

/// Grouped bars: one bar per run for every key.
pub fn comparison_chart(rows: &[TidyRow], key_label: &str) -> Plot {
    let mut plot = Plot::new();
    for s in group_series(rows) {
        plot.add_trace(Bar::new(s.x, s.y).name(&s.name));
    }
    plot.set_layout(
        layout("Response Time Comparison per Transaction", key_label, "Response Time")
            .bar_mode(BarMode::Group),
    );
    plot
}

/// One line with markers per run across the keys.
pub fn trend_chart(rows: &[TidyRow], key_label: &str) -> Plot {
    let mut plot = Plot::new();
    for s in group_series(rows) {
        plot.add_trace(Scatter::new(s.x, s.y).mode(Mode::LinesMarkers).name(&s.name));
    }
    plot.set_layout(layout("Response Time Trend Over Runs", key_label, "Response Time"));
    plot
}

/// Stand-alone HTML page for a chart, loading plotly.js from its CDN.
pub fn to_html_page(plot: &Plot) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n\
         <script src=\"{PLOTLY_CDN}\"></script>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        plot.to_inline_html(None)
    )
}

pub fn write_html(plot: &Plot, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, to_html_page(plot))?;
    Ok(())
}
