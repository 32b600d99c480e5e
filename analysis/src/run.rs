use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use perf_report::export::save_csv;
use perf_report::plot::charts::{comparison_chart, series_json, trend_chart, write_html};
use perf_report::plot::text::{render_averages, render_table};
use perf_report::{
    analyze, compare_reports, load_named, FilterCriteria, RangeConstraint, ReportAnalysis,
    ReportSchema, Table,
};

/// Analyze performance test reports: filter, average runs, flag SLA breaches
/// and chart the results.
#[derive(Parser, Debug)]
#[command(name = "report_analysis")]
pub struct Args {
    /// Report files (.csv or .xlsx)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// JSON schema naming the key, threshold and metric columns
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Override the schema's key column
    #[arg(long)]
    pub key: Option<String>,

    /// Key values to keep (default: all)
    #[arg(long, num_args = 1..)]
    pub keep: Vec<String>,

    /// Columns to keep, in order (default: all)
    #[arg(long, num_args = 1..)]
    pub columns: Vec<String>,

    /// Inclusive numeric range, as column:min:max
    #[arg(long, value_parser = parse_range)]
    pub range: Vec<RangeConstraint>,

    /// Directory for CSV, HTML and JSON outputs
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Also write chart series as JSON
    #[arg(long)]
    pub json: bool,

    /// Rows shown in the preview table
    #[arg(long, default_value_t = 10)]
    pub preview: usize,
}

fn parse_range(spec: &str) -> Result<RangeConstraint, String> {
    RangeConstraint::parse(spec).map_err(|e| e.to_string())
}

struct FileReport {
    label: String,
    analysis: ReportAnalysis,
}

fn label_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".into())
}

/// One output label per input file. Files sharing a stem get their position
/// appended, so no two reports write to the same output files.
fn unique_labels(files: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = files.iter().map(|p| label_of(p)).collect();
    stems
        .iter()
        .enumerate()
        .map(|(i, stem)| {
            if stems.iter().filter(|s| *s == stem).count() > 1 {
                format!("{stem}_{}", i + 1)
            } else {
                stem.clone()
            }
        })
        .collect()
}

fn criteria_for(table: &Table, schema: &ReportSchema, args: &Args) -> FilterCriteria {
    let columns = if args.columns.is_empty() {
        table.column_names()
    } else {
        args.columns.clone()
    };
    let criteria = FilterCriteria::new(columns);
    let criteria = if args.keep.is_empty() {
        criteria.with_all_rows(table, &schema.key_column)
    } else {
        criteria.with_rows(&schema.key_column, args.keep.clone())
    };
    args.range.iter().cloned().fold(criteria, FilterCriteria::with_range)
}

fn analyze_file(
    path: &Path,
    label: String,
    schema: &ReportSchema,
    args: &Args,
) -> anyhow::Result<FileReport> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let table =
        load_named(&bytes, &name).with_context(|| format!("loading {}", path.display()))?;
    let criteria = criteria_for(&table, schema, args);
    let analysis = analyze(&table, schema, &criteria)
        .with_context(|| format!("filtering {}", path.display()))?;

    let out = |suffix: &str| args.out.join(format!("{label}_{suffix}"));
    save_csv(&analysis.filtered, out("filtered.csv"))?;
    match &analysis.tidy {
        Ok(rows) if !rows.is_empty() => {
            write_html(&comparison_chart(rows, &schema.key_column), out("comparison.html"))?;
            write_html(&trend_chart(rows, &schema.key_column), out("trend.html"))?;
            if args.json {
                fs::write(out("chart.json"), series_json(rows)?)?;
            }
        }
        Ok(_) => tracing::warn!(report = %label, "no data available for graphing"),
        Err(e) => tracing::warn!(report = %label, error = %e, "charts skipped"),
    }
    Ok(FileReport { label, analysis })
}

fn print_report(report: &FileReport, schema: &ReportSchema, preview: usize) {
    let analysis = &report.analysis;
    println!("== {} ({} rows after filtering)", report.label, analysis.filtered.len());
    println!("{}", render_table(&analysis.filtered.head(preview)));

    match &analysis.averages {
        Ok(avg) => {
            println!("{}", render_averages(avg));
            println!("{avg}");
        }
        Err(e) => println!("Not enough data for response time comparison: {e}"),
    }

    match &analysis.breaches {
        Ok(rows) if rows.is_empty() => {
            println!("No transactions exceed {} limits.", schema.threshold_column)
        }
        Ok(rows) => {
            println!("The following transactions exceed the {}:", schema.threshold_column);
            println!("{}", render_table(rows));
        }
        Err(e) => println!("Breach detection skipped: {e}"),
    }
    println!();
}

pub fn run(args: &Args) -> anyhow::Result<()> {
    let mut schema = match &args.schema {
        Some(path) => ReportSchema::from_json_file(path)
            .with_context(|| format!("reading schema {}", path.display()))?,
        None => ReportSchema::default(),
    };
    if let Some(key) = &args.key {
        schema.key_column = key.clone();
    }
    fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;

    let pb = ProgressBar::new(args.files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    tracing::info!(files = args.files.len(), "analyzing reports");

    let labels = unique_labels(&args.files);

    // each report is an independent pipeline run
    let results: Vec<(PathBuf, anyhow::Result<FileReport>)> = args
        .files
        .par_iter()
        .zip(labels)
        .map(|(path, label)| {
            let result = analyze_file(path, label, &schema, args);
            pb.inc(1);
            (path.clone(), result)
        })
        .collect();
    pb.finish_and_clear();

    let mut reports = Vec::new();
    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(report) => {
                print_report(&report, &schema, args.preview);
                reports.push(report);
            }
            Err(e) => {
                failed += 1;
                tracing::error!(file = %path.display(), error = ?e, "report failed");
            }
        }
    }

    if reports.len() > 1 {
        if let Some(metric) = reports[0].analysis.metric_columns.first() {
            let runs: Vec<(&str, &Table)> =
                reports.iter().map(|r| (r.label.as_str(), &r.analysis.filtered)).collect();
            match compare_reports(&runs, metric) {
                Ok(cmp) => {
                    println!("== {metric} across reports");
                    println!("{}", render_averages(&cmp));
                    println!("{cmp}");
                }
                Err(e) => println!("Cross-report comparison skipped: {e}"),
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} reports failed", args.files.len());
    }
    Ok(())
}
