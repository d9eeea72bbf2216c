//! Core data models used throughout AI Visibility.
//!
//! Report structs mirror the JSON shape requested from the generation
//! service (camelCase wire names, the shared AI-overview block flattened
//! into each report). [`AnalysisResult`] is the explicit tagged union that
//! the history log persists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::generator::GenerateError;

/// Which of the two report shapes is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    Domain,
    Keyword,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Domain => "DOMAIN",
            ReportKind::Keyword => "KEYWORD",
        }
    }

    /// Human-facing label used in history listings.
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Domain => "Domain",
            ReportKind::Keyword => "Keyword",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DOMAIN" => Ok(ReportKind::Domain),
            "KEYWORD" => Ok(ReportKind::Keyword),
            _ => Err(GenerateError::InvalidReportKind(s.to_string())),
        }
    }
}

/// A related keyword and its monthly search volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetric {
    pub keyword: String,
    pub volume: String,
}

/// A keyword the domain ranks for, with its SERP position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedKeyword {
    pub keyword: String,
    pub volume: String,
    #[serde(deserialize_with = "position_from_number")]
    pub position: u32,
}

/// A competing domain and how many keywords it shares with the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub domain: String,
    pub common_keywords: String,
}

/// Generative-search visibility metrics shared by both report kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiOverview {
    #[serde(rename = "aiSnippetInclusionRate")]
    pub snippet_inclusion_rate: String,
    #[serde(rename = "prominentAiKeywords")]
    pub prominent_ai_keywords: Vec<String>,
    #[serde(rename = "aiSentimentAnalysis")]
    pub sentiment: String,
    #[serde(rename = "llmMentions")]
    pub llm_mentions: String,
    #[serde(rename = "citedPagesInAI")]
    pub cited_pages_in_ai: String,
    /// Always within `0..=100`; out-of-range service values are clamped on decode.
    #[serde(rename = "aiVisibilityScore", deserialize_with = "score_from_number")]
    pub visibility_score: u8,
    #[serde(rename = "aiVisibilityLevel")]
    pub visibility_level: String,
    #[serde(rename = "aiVisibilityDescription")]
    pub visibility_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainReport {
    pub domain: String,
    pub organic_search_traffic: String,
    pub organic_keywords: String,
    pub referring_domains: String,
    pub top_organic_keywords: Vec<RankedKeyword>,
    pub top_competitors: Vec<Competitor>,
    pub summary: String,
    #[serde(flatten)]
    pub overview: AiOverview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordReport {
    pub keyword: String,
    pub search_volume: String,
    pub keyword_difficulty: String,
    pub related_keywords: Vec<KeywordMetric>,
    pub serp_features: Vec<String>,
    pub summary: String,
    #[serde(flatten)]
    pub overview: AiOverview,
}

/// A generated report of either kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisResult {
    Domain(DomainReport),
    Keyword(KeywordReport),
}

impl AnalysisResult {
    pub fn kind(&self) -> ReportKind {
        match self {
            AnalysisResult::Domain(_) => ReportKind::Domain,
            AnalysisResult::Keyword(_) => ReportKind::Keyword,
        }
    }

    /// The analyzed domain or keyword, as reported by the service.
    pub fn subject(&self) -> &str {
        match self {
            AnalysisResult::Domain(r) => &r.domain,
            AnalysisResult::Keyword(r) => &r.keyword,
        }
    }

    pub fn overview(&self) -> &AiOverview {
        match self {
            AnalysisResult::Domain(r) => &r.overview,
            AnalysisResult::Keyword(r) => &r.overview,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            AnalysisResult::Domain(r) => &r.summary,
            AnalysisResult::Keyword(r) => &r.summary,
        }
    }
}

/// One entry of the history log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub query: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    /// Creation time, Unix epoch milliseconds.
    pub timestamp: i64,
    pub report: AnalysisResult,
}

fn score_from_number<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

// NUMBER in the response schema admits fractional values.
fn position_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() || raw < 1.0 {
        return Ok(1);
    }
    Ok(raw.min(u32::MAX as f64).round() as u32)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn overview(score: u8) -> AiOverview {
        AiOverview {
            snippet_inclusion_rate: "25%".to_string(),
            prominent_ai_keywords: vec!["ai seo".to_string(), "llm ranking".to_string()],
            sentiment: "Positive".to_string(),
            llm_mentions: "20.1K".to_string(),
            cited_pages_in_ai: "7.1K".to_string(),
            visibility_score: score,
            visibility_level: "Medium".to_string(),
            visibility_description: "Occasionally mentioned in LLM outputs.".to_string(),
        }
    }

    pub fn domain_report(domain: &str) -> AnalysisResult {
        AnalysisResult::Domain(DomainReport {
            domain: domain.to_string(),
            organic_search_traffic: "1.2M".to_string(),
            organic_keywords: "500K".to_string(),
            referring_domains: "12K".to_string(),
            top_organic_keywords: vec![
                RankedKeyword {
                    keyword: "example".to_string(),
                    volume: "10K".to_string(),
                    position: 1,
                },
                RankedKeyword {
                    keyword: "example domain".to_string(),
                    volume: "2.5K".to_string(),
                    position: 3,
                },
            ],
            top_competitors: vec![Competitor {
                domain: "example.org".to_string(),
                common_keywords: "20K".to_string(),
            }],
            summary: "Strong organic footprint.".to_string(),
            overview: overview(55),
        })
    }

    pub fn keyword_report(keyword: &str) -> AnalysisResult {
        AnalysisResult::Keyword(KeywordReport {
            keyword: keyword.to_string(),
            search_volume: "100K".to_string(),
            keyword_difficulty: "75%".to_string(),
            related_keywords: vec![KeywordMetric {
                keyword: format!("{} tools", keyword),
                volume: "5K".to_string(),
            }],
            serp_features: vec!["Featured Snippet".to_string()],
            summary: "High potential.".to_string(),
            overview: overview(70),
        })
    }

    pub fn domain_json(domain: &str) -> String {
        serde_json::json!({
            "domain": domain,
            "organicSearchTraffic": "1.2M",
            "organicKeywords": "500K",
            "referringDomains": "12K",
            "topOrganicKeywords": [
                { "keyword": "example", "volume": "10K", "position": 1 },
                { "keyword": "example domain", "volume": "2.5K", "position": 3 }
            ],
            "topCompetitors": [ { "domain": "example.org", "commonKeywords": "20K" } ],
            "summary": "Strong organic footprint.",
            "aiSnippetInclusionRate": "25%",
            "prominentAiKeywords": ["ai seo", "llm ranking"],
            "aiSentimentAnalysis": "Positive",
            "llmMentions": "20.1K",
            "citedPagesInAI": "7.1K",
            "aiVisibilityScore": 55,
            "aiVisibilityLevel": "Medium",
            "aiVisibilityDescription": "Occasionally mentioned in LLM outputs."
        })
        .to_string()
    }

    pub fn keyword_json(keyword: &str) -> String {
        match keyword_report(keyword) {
            AnalysisResult::Keyword(report) => serde_json::to_string(&report).unwrap(),
            AnalysisResult::Domain(_) => unreachable!(),
        }
    }
}
