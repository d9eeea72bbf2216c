//! Terminal rendering of reports and history.
//!
//! Lays a report out as metric cards, a visibility gauge, and horizontal
//! bar charts, using the chart math from [`ai_visibility_core::chart`].
//! All functions return strings so the CLI decides where they go.

use std::fmt::Write;

use ai_visibility_core::chart::{
    competitor_shares, gauge_degrees, ranked_keyword_bars, related_keyword_bars, BarRow, Sentiment,
};
use ai_visibility_core::models::{AiOverview, AnalysisResult, DomainReport, HistoryItem, KeywordReport};

/// Character width of a full bar.
const BAR_WIDTH: usize = 30;
const GAUGE_CELLS: usize = 20;

pub fn render_report(report: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Visibility Overview: {}", report.subject());
    let _ = writeln!(out, "{}", "=".repeat(BAR_WIDTH + 30));
    match report {
        AnalysisResult::Domain(r) => render_domain(&mut out, r),
        AnalysisResult::Keyword(r) => render_keyword(&mut out, r),
    }
    render_overview(&mut out, report.overview());
    let _ = writeln!(out);
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "  {}", report.summary());
    out
}

fn render_domain(out: &mut String, r: &DomainReport) {
    card(out, "Organic Search Traffic", &r.organic_search_traffic);
    card(out, "Organic Keywords", &r.organic_keywords);
    card(out, "Referring Domains", &r.referring_domains);

    let _ = writeln!(out);
    let _ = writeln!(out, "Top Organic Keywords");
    let rows = ranked_keyword_bars(&r.top_organic_keywords);
    if rows.is_empty() {
        let _ = writeln!(out, "  No top organic keywords available.");
    }
    for row in &rows {
        let position = row.position.map(|p| format!("#{}", p)).unwrap_or_default();
        let _ = writeln!(out, "  {:>4} {}", position, bar_line(row));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Top Competitors (share of common keywords)");
    let rows = competitor_shares(&r.top_competitors);
    if rows.is_empty() {
        let _ = writeln!(out, "  No competitor data available.");
    }
    for row in &rows {
        let _ = writeln!(
            out,
            "  {} {} ({:.1}%)",
            bar(row.percent),
            row.label,
            row.percent
        );
    }
}

fn render_keyword(out: &mut String, r: &KeywordReport) {
    card(out, "Search Volume", &r.search_volume);
    card(out, "Keyword Difficulty", &r.keyword_difficulty);

    let _ = writeln!(out);
    let _ = writeln!(out, "Related Keywords");
    let rows = related_keyword_bars(&r.related_keywords);
    if rows.is_empty() {
        let _ = writeln!(out, "  No related keywords available.");
    }
    for row in &rows {
        let _ = writeln!(out, "  {}", bar_line(row));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "SERP Features");
    if r.serp_features.is_empty() {
        let _ = writeln!(out, "  None reported.");
    } else {
        let _ = writeln!(out, "  {}", r.serp_features.join(", "));
    }
}

fn render_overview(out: &mut String, o: &AiOverview) {
    let _ = writeln!(out);
    let _ = writeln!(out, "AI Overview");
    let filled = (gauge_degrees(o.visibility_score) / 360.0 * GAUGE_CELLS as f64).round() as usize;
    let _ = writeln!(
        out,
        "  AI Visibility  {:>3}/100 [{}{}] {}",
        o.visibility_score,
        "█".repeat(filled),
        "░".repeat(GAUGE_CELLS - filled.min(GAUGE_CELLS)),
        o.visibility_level
    );
    let _ = writeln!(out, "  {}", o.visibility_description);
    card(out, "AI Snippet Inclusion", &o.snippet_inclusion_rate);
    card(out, "LLM Mentions", &o.llm_mentions);
    card(out, "Cited Pages in AI", &o.cited_pages_in_ai);
    card(
        out,
        "AI Sentiment",
        &format!("{} {}", sentiment_marker(&o.sentiment), o.sentiment),
    );
    if !o.prominent_ai_keywords.is_empty() {
        let _ = writeln!(
            out,
            "  {:<24} {}",
            "Prominent AI Keywords",
            o.prominent_ai_keywords.join(", ")
        );
    }
}

fn sentiment_marker(text: &str) -> &'static str {
    match Sentiment::classify(text) {
        Sentiment::Positive => "(+)",
        Sentiment::Negative => "(-)",
        Sentiment::Neutral | Sentiment::Other => "(~)",
    }
}

fn card(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {:<24} {}", label, value);
}

fn bar(percent: f64) -> String {
    let cells = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let cells = cells.min(BAR_WIDTH);
    format!("{}{}", "▇".repeat(cells), " ".repeat(BAR_WIDTH - cells))
}

fn bar_line(row: &BarRow) -> String {
    format!("{} {:<28} {:>8}", bar(row.percent), row.label, row.display)
}

/// One line per item, newest first.
pub fn render_history(items: &[HistoryItem]) -> String {
    if items.is_empty() {
        return "No history yet. Run `aiv report <query>` to generate one.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(
            out,
            "{}  {}: {}  {}",
            item.id,
            item.kind.label(),
            item.query,
            format_timestamp(item.timestamp)
        );
    }
    out
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| millis.to_string())
}
