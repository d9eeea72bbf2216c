//! Prompt and structured-output schema construction.
//!
//! Each [`ReportKind`] has its own instruction prompt and response schema.
//! Schemas use the Gemini `responseSchema` dialect (`OBJECT`, `ARRAY`,
//! `STRING`, `NUMBER` with `properties`, `items`, and `required`), and both
//! embed the shared AI-overview block.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::ReportKind;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default reasoning allowance requested from the service, in tokens.
pub const DEFAULT_THINKING_BUDGET: u32 = 2048;

/// Fixed generation settings, taken from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub model: String,
    pub thinking_budget: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
        }
    }
}

/// Everything a [`TextService`](crate::generator::TextService) needs for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub model: String,
    pub prompt: String,
    /// Structured-output schema; the service is asked for strict JSON matching it.
    pub schema: Value,
    pub thinking_budget: u32,
}

pub fn build_request(query: &str, kind: ReportKind, settings: &GeneratorSettings) -> ReportRequest {
    ReportRequest {
        model: settings.model.clone(),
        prompt: build_prompt(query, kind),
        schema: response_schema(kind),
        thinking_budget: settings.thinking_budget,
    }
}

pub fn build_prompt(query: &str, kind: ReportKind) -> String {
    let query = query.trim();
    match kind {
        ReportKind::Domain => format!(
            "Act as an AI Visibility expert providing a comprehensive report for the domain '{}'. \
             Generate a JSON object with the following structure, including metrics for traditional SEO \
             and Google AI Overview. Invent realistic data if you don't have real-time access, ensuring \
             varied sentiment and keyword data. Focus on a brief summary of the domain's AI and \
             traditional search performance.",
            query
        ),
        ReportKind::Keyword => format!(
            "Act as an AI Visibility expert providing a comprehensive report for the keyword '{}'. \
             Generate a JSON object with the following structure, including metrics for traditional SEO \
             and Google AI Overview. Invent realistic data if you don't have real-time access, ensuring \
             varied sentiment and keyword data. Focus on a brief summary of the keyword's potential for \
             AI and traditional search discovery.",
            query
        ),
    }
}

/// Response schema for `kind`, with every field listed as required.
pub fn response_schema(kind: ReportKind) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<&str> = Vec::new();

    match kind {
        ReportKind::Domain => {
            field(&mut properties, &mut required, "domain", string("The analyzed domain."));
            field(
                &mut properties,
                &mut required,
                "organicSearchTraffic",
                string("Estimated monthly organic search traffic, e.g., \"1.2M\"."),
            );
            field(
                &mut properties,
                &mut required,
                "organicKeywords",
                string("Number of keywords the domain ranks for organically, e.g., \"500K\"."),
            );
            field(
                &mut properties,
                &mut required,
                "referringDomains",
                string("Number of unique domains linking to this domain, e.g., \"12K\"."),
            );
            field(
                &mut properties,
                &mut required,
                "topOrganicKeywords",
                array(
                    object(&[
                        ("keyword", string("A top organic keyword.")),
                        ("volume", string("Monthly search volume for the keyword, e.g., \"10K\".")),
                        ("position", number("Ranking position for the keyword.")),
                    ]),
                    "List of top organic keywords with their volume and position.",
                ),
            );
            field(
                &mut properties,
                &mut required,
                "topCompetitors",
                array(
                    object(&[
                        ("domain", string("A top competitor domain.")),
                        (
                            "commonKeywords",
                            string("Number of common keywords with the analyzed domain, e.g., \"20K\"."),
                        ),
                    ]),
                    "List of top competitors with shared keywords.",
                ),
            );
            field(
                &mut properties,
                &mut required,
                "summary",
                string("A brief summary of the domain's SEO performance."),
            );
        }
        ReportKind::Keyword => {
            field(&mut properties, &mut required, "keyword", string("The analyzed keyword."));
            field(
                &mut properties,
                &mut required,
                "searchVolume",
                string("Estimated monthly global search volume, e.g., \"100K\"."),
            );
            field(
                &mut properties,
                &mut required,
                "keywordDifficulty",
                string("Keyword difficulty score as a percentage, e.g., \"75%\"."),
            );
            field(
                &mut properties,
                &mut required,
                "relatedKeywords",
                array(
                    object(&[
                        ("keyword", string("A related keyword.")),
                        (
                            "volume",
                            string("Monthly search volume for the related keyword, e.g., \"5K\"."),
                        ),
                    ]),
                    "List of related keywords with their search volume.",
                ),
            );
            field(
                &mut properties,
                &mut required,
                "serpFeatures",
                array(
                    json!({ "type": "STRING" }),
                    "List of prominent SERP features for this keyword, e.g., [\"Featured Snippet\", \"People Also Ask\"].",
                ),
            );
            field(
                &mut properties,
                &mut required,
                "summary",
                string("A brief summary of the keyword's search potential."),
            );
        }
    }

    ai_overview_fields(&mut properties, &mut required);

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

fn ai_overview_fields(properties: &mut Map<String, Value>, required: &mut Vec<&'static str>) {
    field(
        properties,
        required,
        "aiSnippetInclusionRate",
        string("Percentage of times content is used in AI snippets, e.g., \"25%\"."),
    );
    field(
        properties,
        required,
        "prominentAiKeywords",
        array(
            json!({ "type": "STRING" }),
            "Keywords frequently associated with the content in AI responses.",
        ),
    );
    field(
        properties,
        required,
        "aiSentimentAnalysis",
        string("Overall sentiment of AI-generated responses (e.g., \"Positive\", \"Neutral\", \"Negative\")."),
    );
    field(
        properties,
        required,
        "llmMentions",
        string("Aggregate mentions across LLMs, e.g., \"20.1K\"."),
    );
    field(
        properties,
        required,
        "citedPagesInAI",
        string("Aggregate cited pages in AI responses, e.g., \"7.1K\"."),
    );
    field(
        properties,
        required,
        "aiVisibilityScore",
        number("A numerical AI visibility score out of 100, e.g., 55."),
    );
    field(
        properties,
        required,
        "aiVisibilityLevel",
        string("Categorical AI visibility level (e.g., \"Low\", \"Medium\", \"High\")."),
    );
    field(
        properties,
        required,
        "aiVisibilityDescription",
        string("A brief description for the AI visibility score."),
    );
}

fn field(
    properties: &mut Map<String, Value>,
    required: &mut Vec<&'static str>,
    name: &'static str,
    descriptor: Value,
) {
    properties.insert(name.to_string(), descriptor);
    required.push(name);
}

fn string(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn number(description: &str) -> Value {
    json!({ "type": "NUMBER", "description": description })
}

fn array(items: Value, description: &str) -> Value {
    json!({ "type": "ARRAY", "items": items, "description": description })
}

/// Array item object; all listed fields are required.
fn object(fields: &[(&str, Value)]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(name, descriptor)| (name.to_string(), descriptor.clone()))
        .collect();
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    json!({ "type": "OBJECT", "properties": properties, "required": required })
}
