//! Spreadsheet export.
//!
//! The normal output is a two-sheet workbook: "Details" (every record plus
//! the grand-total row) and "Summary" (named metrics). When the workbook
//! cannot be produced, the detail rows are written as a single CSV sheet
//! instead and the caller gets a warning back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::{RunSummary, grand_total_record};
use crate::error::ExportError;
use crate::record::{ProductRecord, QuotaState};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DETAILS_SHEET: &str = "Details";
pub const SUMMARY_SHEET: &str = "Summary";
pub const DETAIL_HEADERS: [&str; 10] = [
    "ASIN",
    "Design",
    "Size",
    "Average Rating",
    "Total Reviews",
    "5★",
    "4★",
    "3★",
    "2★",
    "1★",
];

/// One row of the Details sheet, as written to the CSV fallback.
#[derive(Debug, Serialize)]
struct DetailRow<'a> {
    #[serde(rename = "ASIN")]
    asin: &'a str,
    #[serde(rename = "Design")]
    design: Option<&'a str>,
    #[serde(rename = "Size")]
    size: Option<&'a str>,
    #[serde(rename = "Average Rating")]
    average_rating: Option<f64>,
    #[serde(rename = "Total Reviews")]
    total_reviews: Option<u64>,
    #[serde(rename = "5★")]
    five: Option<u64>,
    #[serde(rename = "4★")]
    four: Option<u64>,
    #[serde(rename = "3★")]
    three: Option<u64>,
    #[serde(rename = "2★")]
    two: Option<u64>,
    #[serde(rename = "1★")]
    one: Option<u64>,
}

impl<'a> From<&'a ProductRecord> for DetailRow<'a> {
    fn from(r: &'a ProductRecord) -> Self {
        Self {
            asin: r.asin.as_str(),
            design: r.design.as_deref(),
            size: r.size.as_deref(),
            average_rating: r.average_rating,
            total_reviews: r.total_reviews,
            five: r.stars.map(|s| s.five),
            four: r.stars.map(|s| s.four),
            three: r.stars.map(|s| s.three),
            two: r.stars.map(|s| s.two),
            one: r.stars.map(|s| s.one),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Count(u64),
    Text(String),
    Empty,
}

impl From<Option<f64>> for MetricValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(MetricValue::Empty, MetricValue::Number)
    }
}

impl From<Option<u64>> for MetricValue {
    fn from(v: Option<u64>) -> Self {
        v.map_or(MetricValue::Empty, MetricValue::Count)
    }
}

/// A named row of the Summary sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetric {
    pub name: &'static str,
    pub value: MetricValue,
}

/// The Summary sheet rows, in display order.
pub fn summary_metrics(
    summary: &RunSummary,
    quota: &QuotaState,
    generated_at: DateTime<Utc>,
) -> Vec<SummaryMetric> {
    let count = |n: u64| MetricValue::Count(n);
    let stars = summary.stars;
    let metric = |name, value| SummaryMetric { name, value };
    vec![
        metric("Products", count(summary.products as u64)),
        metric("Products With Rating", count(summary.rated_products as u64)),
        metric("Unweighted Mean Rating", summary.unweighted_mean.into()),
        metric("Weighted Mean Rating", summary.weighted_mean.into()),
        metric("Total Reviews", count(summary.total_reviews)),
        metric("5★ Total", count(stars.five)),
        metric("4★ Total", count(stars.four)),
        metric("3★ Total", count(stars.three)),
        metric("2★ Total", count(stars.two)),
        metric("1★ Total", count(stars.one)),
        metric("Credits Used", quota.used.into()),
        metric("Credits Remaining", quota.remaining.into()),
        metric("Generated At", MetricValue::Text(generated_at.to_rfc3339())),
    ]
}

/// Where the export ended up.
#[derive(Debug)]
pub enum ExportOutcome {
    Workbook { path: PathBuf },
    CsvFallback { path: PathBuf, warning: String },
}

/// Writes the records, grand total and summary to `path`.
///
/// Falls back to a CSV of the detail rows (same stem, `.csv` extension) if
/// the workbook cannot be built.
pub fn export(
    path: &Path,
    records: &[ProductRecord],
    summary: &RunSummary,
    quota: &QuotaState,
) -> Result<ExportOutcome, ExportError> {
    let mut details = records.to_vec();
    details.push(grand_total_record(summary));
    let metrics = summary_metrics(summary, quota, Utc::now());

    write_export(path, &details, workbook_bytes(&details, &metrics))
}

/// Saves an already built workbook, or the CSV fallback when building failed.
fn write_export(
    path: &Path,
    details: &[ProductRecord],
    workbook: Result<Vec<u8>, ExportError>,
) -> Result<ExportOutcome, ExportError> {
    match workbook {
        Ok(bytes) => {
            std::fs::write(path, &bytes)?;
            info!(path = %path.display(), bytes = bytes.len(), content_type = XLSX_MIME, "Workbook written");
            Ok(ExportOutcome::Workbook {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            let csv_path = path.with_extension("csv");
            let warning = format!(
                "Could not build the Excel workbook ({e}); exported details only to {}",
                csv_path.display()
            );
            warn!(error = %e, path = %csv_path.display(), "Falling back to single-sheet CSV export");
            write_details_csv(&csv_path, details)?;
            Ok(ExportOutcome::CsvFallback {
                path: csv_path,
                warning,
            })
        }
    }
}

/// Writes detail rows to a CSV file with the Details sheet headers.
pub fn write_details_csv(path: &Path, rows: &[ProductRecord]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(DetailRow::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(feature = "xlsx")]
fn workbook_bytes(
    details: &[ProductRecord],
    metrics: &[SummaryMetric],
) -> Result<Vec<u8>, ExportError> {
    build_workbook(details, metrics).map_err(|e| ExportError::Workbook(e.to_string()))
}

#[cfg(feature = "xlsx")]
fn build_workbook(
    details: &[ProductRecord],
    metrics: &[SummaryMetric],
) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(DETAILS_SHEET)?;
        for (col, header) in DETAIL_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        sheet.set_column_width(1, 24)?;

        for (i, record) in details.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, record.asin.as_str())?;
            if let Some(design) = record.design.as_deref() {
                sheet.write_string(row, 1, design)?;
            }
            if let Some(size) = record.size.as_deref() {
                sheet.write_string(row, 2, size)?;
            }
            if let Some(rating) = record.average_rating {
                sheet.write_number(row, 3, rating)?;
            }
            if let Some(total) = record.total_reviews {
                sheet.write_number(row, 4, total as f64)?;
            }
            if let Some(stars) = record.stars {
                for (j, count) in stars.as_array().into_iter().enumerate() {
                    sheet.write_number(row, 5 + j as u16, count as f64)?;
                }
            }
        }
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SUMMARY_SHEET)?;
        sheet.write_string_with_format(0, 0, "Metric", &bold)?;
        sheet.write_string_with_format(0, 1, "Value", &bold)?;
        sheet.set_column_width(0, 26)?;

        for (i, metric) in metrics.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, metric.name)?;
            match &metric.value {
                MetricValue::Number(v) => {
                    sheet.write_number(row, 1, *v)?;
                }
                MetricValue::Count(v) => {
                    sheet.write_number(row, 1, *v as f64)?;
                }
                MetricValue::Text(v) => {
                    sheet.write_string(row, 1, v.as_str())?;
                }
                MetricValue::Empty => {}
            }
        }
    }

    workbook.save_to_buffer()
}

#[cfg(not(feature = "xlsx"))]
fn workbook_bytes(
    _details: &[ProductRecord],
    _metrics: &[SummaryMetric],
) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::Unsupported)
}
