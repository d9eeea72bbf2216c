//! Chart math for report views.
//!
//! Converts the magnitude strings of a report into the numbers a view
//! needs: bar widths relative to the largest entry, share-of-total
//! percentages, and the sweep angle of the visibility gauge. Rows are
//! sorted by parsed volume, descending; the stored report is not touched.

use serde::Serialize;

use crate::models::{Competitor, KeywordMetric, RankedKeyword};
use crate::volume::parse_volume;

/// One row of a horizontal bar chart or stacked distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRow {
    pub label: String,
    /// The magnitude string as reported, for display.
    pub display: String,
    /// SERP position, for ranked keyword rows.
    pub position: Option<u32>,
    pub value: f64,
    /// Bar width or share, in percent.
    pub percent: f64,
}

/// Bar widths as a percentage of the largest value.
///
/// The divisor is never below 1 so all-zero input yields zero-width bars.
pub fn bar_widths(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(1.0_f64, f64::max);
    values.iter().map(|v| v / max * 100.0).collect()
}

/// Each value's share of the total, in percent. All zeros if the total is 0.
pub fn shares(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total * 100.0).collect()
}

/// Gauge sweep in degrees for a 0–100 score.
pub fn gauge_degrees(score: u8) -> f64 {
    f64::from(score.min(100)) / 100.0 * 360.0
}

/// Top organic keywords, largest volume first, with widths relative to the largest.
pub fn ranked_keyword_bars(keywords: &[RankedKeyword]) -> Vec<BarRow> {
    let rows = keywords
        .iter()
        .map(|k| (k.keyword.clone(), k.volume.clone(), Some(k.position)))
        .collect();
    bars(rows, bar_widths)
}

pub fn related_keyword_bars(keywords: &[KeywordMetric]) -> Vec<BarRow> {
    let rows = keywords
        .iter()
        .map(|k| (k.keyword.clone(), k.volume.clone(), None))
        .collect();
    bars(rows, bar_widths)
}

/// Competitors, most common keywords first, with each one's share of the total.
pub fn competitor_shares(competitors: &[Competitor]) -> Vec<BarRow> {
    let rows = competitors
        .iter()
        .map(|c| (c.domain.clone(), c.common_keywords.clone(), None))
        .collect();
    bars(rows, shares)
}

fn bars(
    rows: Vec<(String, String, Option<u32>)>,
    scale: fn(&[f64]) -> Vec<f64>,
) -> Vec<BarRow> {
    let mut rows: Vec<(String, String, Option<u32>, f64)> = rows
        .into_iter()
        .map(|(label, display, position)| {
            let value = parse_volume(&display);
            (label, display, position, value)
        })
        .collect();
    // stable: equal volumes keep service order
    rows.sort_by(|a, b| b.3.partial_cmp(&a.3).unwrap_or(std::cmp::Ordering::Equal));

    let values: Vec<f64> = rows.iter().map(|r| r.3).collect();
    let percents = scale(&values);

    rows.into_iter()
        .zip(percents)
        .map(|((label, display, position, value), percent)| BarRow {
            label,
            display,
            position,
            value,
            percent,
        })
        .collect()
}

/// Coarse sentiment bucket for colouring the sentiment badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Other,
}

impl Sentiment {
    pub fn classify(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "neutral" => Sentiment::Neutral,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Other,
        }
    }
}
