//! End-to-end tests of the `aiv` binary against a mock Gemini endpoint.
//!
//! The mock picks its behaviour from the API key header:
//! `good` → a valid domain or keyword report, `reject` → the provider's
//! "Requested entity was not found." 404, `empty` → a candidate with no text,
//! `garbage` → non-JSON text.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use axum::{extract::Path as UrlPath, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

fn aiv_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("aiv");
    path
}

fn domain_report(domain: &str) -> Value {
    json!({
        "domain": domain,
        "organicSearchTraffic": "1.2M",
        "organicKeywords": "500K",
        "referringDomains": "12K",
        "topOrganicKeywords": [
            { "keyword": "example", "volume": "10K", "position": 1 },
            { "keyword": "example site", "volume": "1,500", "position": 4 }
        ],
        "topCompetitors": [
            { "domain": "example.org", "commonKeywords": "20K" },
            { "domain": "example.net", "commonKeywords": "5K" }
        ],
        "summary": "Strong organic footprint with modest AI presence.",
        "aiSnippetInclusionRate": "25%",
        "prominentAiKeywords": ["example", "placeholder domain"],
        "aiSentimentAnalysis": "Neutral",
        "llmMentions": "20.1K",
        "citedPagesInAI": "7.1K",
        "aiVisibilityScore": 55,
        "aiVisibilityLevel": "Medium",
        "aiVisibilityDescription": "Occasionally mentioned in LLM outputs."
    })
}

fn keyword_report(keyword: &str) -> Value {
    json!({
        "keyword": keyword,
        "searchVolume": "100K",
        "keywordDifficulty": "75%",
        "relatedKeywords": [ { "keyword": "rust tutorial", "volume": "5K" } ],
        "serpFeatures": ["Featured Snippet"],
        "summary": "High potential keyword.",
        "aiSnippetInclusionRate": "40%",
        "prominentAiKeywords": ["memory safety"],
        "aiSentimentAnalysis": "Positive",
        "llmMentions": "50K",
        "citedPagesInAI": "3K",
        "aiVisibilityScore": 80,
        "aiVisibilityLevel": "High",
        "aiVisibilityDescription": "Frequently cited."
    })
}

fn candidate(text: &str) -> Value {
    json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] })
}

async fn mock_generate(
    UrlPath(call): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    assert!(call.ends_with(":generateContent"), "unexpected call {}", call);
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default().to_string();
    let is_domain = body["generationConfig"]["responseSchema"]["properties"]
        .get("domain")
        .is_some();

    match key.as_str() {
        "good" if is_domain => {
            let domain = prompt.split('\'').nth(1).unwrap_or("unknown").to_string();
            (StatusCode::OK, Json(candidate(&domain_report(&domain).to_string())))
        }
        "good" => {
            let keyword = prompt.split('\'').nth(1).unwrap_or("unknown").to_string();
            (StatusCode::OK, Json(candidate(&keyword_report(&keyword).to_string())))
        }
        "reject" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" } })),
        ),
        "empty" => (StatusCode::OK, Json(candidate("  "))),
        _ => (StatusCode::OK, Json(candidate("definitely not json"))),
    }
}

fn start_mock_gemini() -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            let app = Router::new().route("/v1beta/models/{call}", post(mock_generate));
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

fn setup_test_env(max_items: usize) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let base_url = start_mock_gemini();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/aiv.sqlite"

[history]
max_items = {}

[generator]
api_key_env = "AIV_TEST_API_KEY"
base_url = "{}"
timeout_secs = 10
"#,
        root.display(),
        max_items,
        base_url
    );

    let config_path = config_dir.join("aiv.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_aiv(config_path: &Path, api_key: Option<&str>, args: &[&str]) -> (String, String, bool) {
    let binary = aiv_binary();
    let mut cmd = Command::new(&binary);
    cmd.arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("AIV_TEST_API_KEY")
        .env_remove("API_KEY");
    if let Some(key) = api_key {
        cmd.env("AIV_TEST_API_KEY", key);
    }
    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run aiv binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn history_json(config_path: &Path) -> Vec<Value> {
    let (stdout, stderr, ok) = run_aiv(config_path, None, &["history", "list", "--json"]);
    assert!(ok, "history list failed: {}", stderr);
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config) = setup_test_env(10);
    let (stdout, stderr, ok) = run_aiv(&config, None, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized successfully."));
    let (_, stderr, ok) = run_aiv(&config, None, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_domain_report_is_rendered_and_recorded() {
    let (_tmp, config) = setup_test_env(10);
    let (stdout, stderr, ok) = run_aiv(
        &config,
        Some("good"),
        &["report", "example.com", "--kind", "domain"],
    );
    assert!(ok, "report failed: {}", stderr);
    assert!(stdout.contains("Visibility Overview: example.com"));
    assert!(stdout.contains("Top Organic Keywords"));
    assert!(stdout.contains("example.org (80.0%)"));
    assert!(stdout.contains("Saved to history as example.com-DOMAIN-"));

    let items = history_json(&config);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["query"], "example.com");
    assert_eq!(items[0]["type"], "DOMAIN");
    assert_eq!(items[0]["report"]["domain"], "example.com");
    assert_eq!(items[0]["report"]["aiVisibilityScore"], 55);
}

#[test]
fn test_history_show_replays_without_gemini() {
    let (_tmp, config) = setup_test_env(10);
    let (_, stderr, ok) = run_aiv(&config, Some("good"), &["report", "rust", "--kind", "keyword"]);
    assert!(ok, "report failed: {}", stderr);

    let items = history_json(&config);
    let id = items[0]["id"].as_str().unwrap().to_string();

    // No API key: replay must still work.
    let (stdout, stderr, ok) = run_aiv(&config, None, &["history", "show", &id]);
    assert!(ok, "show failed: {}", stderr);
    assert!(stdout.contains("Keyword: rust"));
    assert!(stdout.contains("Related Keywords"));
    assert!(stdout.contains("rust tutorial"));

    let (stdout, _, ok) = run_aiv(&config, None, &["history", "show", &id, "--json"]);
    assert!(ok);
    let item: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(item, items[0]);

    let (_, stderr, ok) = run_aiv(&config, None, &["history", "show", "missing-id"]);
    assert!(!ok);
    assert!(stderr.contains("history item not found"));
}

#[test]
fn test_history_is_bounded_and_newest_first() {
    let (_tmp, config) = setup_test_env(2);
    for domain in ["a.com", "b.com", "c.com"] {
        let (_, stderr, ok) = run_aiv(&config, Some("good"), &["report", domain]);
        assert!(ok, "report {} failed: {}", domain, stderr);
    }
    let items = history_json(&config);
    let queries: Vec<&str> = items.iter().map(|i| i["query"].as_str().unwrap()).collect();
    assert_eq!(queries, vec!["c.com", "b.com"]);

    let (stdout, _, ok) = run_aiv(&config, None, &["history", "clear"]);
    assert!(ok);
    assert!(stdout.contains("Cleared 2 history item(s)."));
    assert!(history_json(&config).is_empty());
}

#[test]
fn test_report_without_api_key_fails() {
    let (_tmp, config) = setup_test_env(10);
    let (_, stderr, ok) = run_aiv(&config, None, &["report", "example.com"]);
    assert!(!ok);
    assert!(stderr.contains("AIV_TEST_API_KEY"), "stderr: {}", stderr);
    assert!(history_json(&config).is_empty());
}

#[test]
fn test_rejected_credential_message() {
    let (_tmp, config) = setup_test_env(10);
    let (_, stderr, ok) = run_aiv(&config, Some("reject"), &["report", "example.com"]);
    assert!(!ok);
    assert!(
        stderr.contains("API key might be invalid or needs to be re-selected"),
        "stderr: {}",
        stderr
    );
    assert!(history_json(&config).is_empty());
}

#[test]
fn test_empty_and_malformed_responses() {
    let (_tmp, config) = setup_test_env(10);
    let (_, stderr, ok) = run_aiv(&config, Some("empty"), &["report", "example.com"]);
    assert!(!ok);
    assert!(stderr.contains("empty response"), "stderr: {}", stderr);

    let (_, stderr, ok) = run_aiv(&config, Some("garbage"), &["report", "example.com"]);
    assert!(!ok);
    assert!(stderr.contains("malformed JSON"), "stderr: {}", stderr);

    assert!(history_json(&config).is_empty());
}

#[test]
fn test_invalid_kind_rejected() {
    let (_tmp, config) = setup_test_env(10);
    let (_, stderr, ok) = run_aiv(&config, Some("good"), &["report", "example.com", "--kind", "unknown"]);
    assert!(!ok);
    assert!(stderr.contains("invalid report type"), "stderr: {}", stderr);
}

#[test]
fn test_corrupt_history_self_heals() {
    let (_tmp, config) = setup_test_env(10);
    let (_, _, ok) = run_aiv(&config, None, &["init"]);
    assert!(ok);

    let db_path = config.parent().unwrap().parent().unwrap().join("data/aiv.sqlite");
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}", db_path.display()))
            .await
            .unwrap();
        sqlx::query("INSERT INTO kv (key, value, updated_at) VALUES ('aiVisibilityHistory', '{oops', 0)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    });

    assert!(history_json(&config).is_empty());
    assert!(history_json(&config).is_empty());

    let (_, stderr, ok) = run_aiv(&config, Some("good"), &["report", "example.com"]);
    assert!(ok, "report after corruption failed: {}", stderr);
    assert_eq!(history_json(&config).len(), 1);
}

#[test]
fn test_completions_need_no_config() {
    let (stdout, _, ok) = run_aiv(Path::new("/nonexistent/aiv.toml"), None, &["completions", "bash"]);
    assert!(ok);
    assert!(stdout.contains("aiv"));
}
