//! Terminal rendering of a finished batch.
//!
//! Produces the results table, the headline metrics and a star bar chart as
//! plain strings, plus a JSON form of the whole run.

use std::fmt::{Display, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::RunSummary;
use crate::record::{ProductRecord, QuotaState, StarCounts};

const CHART_WIDTH: u64 = 40;
const STAR_LABELS: [&str; 5] = ["5★", "4★", "3★", "2★", "1★"];

fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Renders the detail rows followed by the grand-total row.
pub fn render_table(records: &[ProductRecord], grand_total: &ProductRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<20} {:<12} {:>7} {:>8} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "ASIN", "Design", "Size", "Rating", "Reviews", "5★", "4★", "3★", "2★", "1★"
    );
    let _ = writeln!(out, "{}", "-".repeat(101));

    let mut write_row = |r: &ProductRecord| {
        let stars = r.stars.map(|s| s.as_array());
        let star = |i: usize| cell(stars.map(|s| s[i]));
        let _ = writeln!(
            out,
            "{:<12} {:<20} {:<12} {:>7} {:>8} {:>6} {:>6} {:>6} {:>6} {:>6}",
            truncate(r.asin.as_str(), 12),
            truncate(r.design.as_deref().unwrap_or("-"), 20),
            truncate(r.size.as_deref().unwrap_or("-"), 12),
            cell(r.average_rating.map(|v| format!("{v:.2}"))),
            cell(r.total_reviews),
            star(0),
            star(1),
            star(2),
            star(3),
            star(4),
        );
    };

    for record in records {
        write_row(record);
    }
    write_row(grand_total);
    out
}

/// The three headline metrics, plus the API credit counters when known.
pub fn render_metrics(summary: &RunSummary, quota: &QuotaState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Average rating (unweighted): {}",
        cell(summary.unweighted_mean.map(|v| format!("{v:.3}")))
    );
    let _ = writeln!(
        out,
        "Average rating (weighted by reviews): {}",
        cell(summary.weighted_mean.map(|v| format!("{v:.3}")))
    );
    let _ = writeln!(out, "Total reviews: {}", summary.total_reviews);
    if quota.remaining.is_some() {
        let _ = writeln!(
            out,
            "Credits used in last response: {}; credits remaining (approx): {}",
            cell(quota.used),
            cell(quota.remaining)
        );
    }
    out
}

/// Horizontal bar chart of the star totals, scaled to the largest bucket.
pub fn render_star_chart(stars: &StarCounts) -> String {
    let counts = stars.as_array();
    let max = counts.iter().copied().max().unwrap_or(0);

    let mut out = String::new();
    for (label, count) in STAR_LABELS.iter().zip(counts) {
        let len = if max == 0 { 0 } else { count * CHART_WIDTH / max };
        let _ = writeln!(out, "{label} {:<width$} {count}", "█".repeat(len as usize), width = CHART_WIDTH as usize);
    }
    out
}

#[derive(Serialize)]
struct RunReport<'a> {
    records: &'a [ProductRecord],
    summary: &'a RunSummary,
    quota: &'a QuotaState,
}

/// Serializes the whole run as pretty-printed JSON.
pub fn render_json(
    records: &[ProductRecord],
    summary: &RunSummary,
    quota: &QuotaState,
) -> Result<String> {
    debug!(records = records.len(), "Rendering JSON report");
    Ok(serde_json::to_string_pretty(&RunReport {
        records,
        summary,
        quota,
    })?)
}
