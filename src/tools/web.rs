//! Built-in browsing tools: web search and page fetch.
//!
//! The search backend is a SearxNG-compatible JSON endpoint; the page
//! fetcher pulls raw HTML and extracts readable text with html2text,
//! falling back to a naive tag stripper. Both are thin, stateless I/O
//! wrappers; the orchestration around them lives in `chat::browse`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use html2text::from_read;
use serde::{Deserialize, Serialize};

use crate::core::tool::{ParamType, ToolArguments, ToolHandler, ToolOutput, ToolSpec};

/// Name of the built-in search tool.
pub const SEARCH_TOOL: &str = "web_search";
/// Name of the built-in page-fetch tool.
pub const FETCH_TOOL: &str = "fetch_page";

/// Cap on search hits returned to the model.
const MAX_SEARCH_HITS: usize = 8;
/// Cap on extracted page text handed back as a tool result.
const MAX_PAGE_CHARS: usize = 20_000;
/// Timeout for both tools' HTTP requests.
const WEB_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// One entry in a search result list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Shared reqwest client for the web tools and the priming fetch.
pub fn web_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(WEB_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// Naive tag stripper, used when html2text cannot make sense of the page
fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn looks_like_html(s: &str) -> bool {
    let s = s.trim_start();
    s.starts_with("<!")
        || s.starts_with("<html")
        || s.starts_with("<HTML")
        || (s.contains('<') && (s.contains("</") || s.contains("<head") || s.contains("<title")))
}

/// Convert HTML to readable text, stripping tags and scripts.
pub fn html_to_text(html: &str) -> String {
    match from_read(html.as_bytes(), 120) {
        Ok(text) if !text.trim().is_empty() => text,
        _ => strip_html_tags(html),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...[truncated]", head)
    }
}

/// Fetch a page and extract its readable text.
///
/// Returns `None` when the page is unreachable, answers with a non-success
/// status, or yields no extractable content; the browsing sequencer uses
/// that to drop the candidate and retry.
pub async fn fetch_page_text(client: &reqwest::Client, url: &str) -> Option<String> {
    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;
    let text = if looks_like_html(&body) {
        html_to_text(&body)
    } else {
        body
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(truncate_chars(text, MAX_PAGE_CHARS))
}

/// `web_search(query) -> JSON [{title, url, snippet}]`
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: web_client(),
            endpoint: endpoint.into(),
        }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(SEARCH_TOOL, "Search the web and return a list of candidate pages")
            .required_param("query", ParamType::String, "Search query")
    }
}

#[async_trait]
impl ToolHandler for WebSearchTool {
    async fn call(&self, args: &ToolArguments) -> Result<ToolOutput> {
        let query: String = args.get_required("query")?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query.as_str()), ("format", "json")])
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("search endpoint returned status {}", response.status());
        }

        let body: serde_json::Value = response.json().await?;
        let hits: Vec<SearchHit> = body
            .get("results")
            .and_then(|r| r.as_array())
            .map(|results| {
                results
                    .iter()
                    .filter_map(|entry| {
                        let url = entry.get("url")?.as_str()?.to_string();
                        Some(SearchHit {
                            title: entry
                                .get("title")
                                .and_then(|v| v.as_str())
                                .unwrap_or_default()
                                .to_string(),
                            url,
                            snippet: entry
                                .get("content")
                                .and_then(|v| v.as_str())
                                .unwrap_or_default()
                                .to_string(),
                        })
                    })
                    .take(MAX_SEARCH_HITS)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ToolOutput::Json(serde_json::to_value(hits)?))
    }
}

/// `fetch_page(url) -> text`, empty when the page yields nothing.
pub struct FetchPageTool {
    client: reqwest::Client,
}

impl FetchPageTool {
    pub fn new() -> Self {
        Self {
            client: web_client(),
        }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(FETCH_TOOL, "Fetch a web page and return its readable text")
            .required_param("url", ParamType::String, "URL of the page to fetch")
    }
}

impl Default for FetchPageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for FetchPageTool {
    async fn call(&self, args: &ToolArguments) -> Result<ToolOutput> {
        let url: String = args.get_required("url")?;
        let text = fetch_page_text(&self.client, &url)
            .await
            .unwrap_or_default();
        Ok(ToolOutput::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn html_extraction_strips_tags() {
        let html = "<html><head><title>t</title></head><body><p>Hello <b>world</b></p></body></html>";
        let text = html_to_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn truncation_appends_marker() {
        let long = "x".repeat(MAX_PAGE_CHARS + 10);
        let truncated = truncate_chars(&long, MAX_PAGE_CHARS);
        assert!(truncated.ends_with("...[truncated]"));
    }

    #[tokio::test]
    async fn search_normalizes_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "title": "Rust", "url": "https://rust-lang.org", "content": "language" },
                    { "title": "No url entry" },
                    { "title": "Crates", "url": "https://crates.io", "content": "registry" }
                ]
            })))
            .mount(&server)
            .await;

        let tool = WebSearchTool::new(format!("{}/search", server.uri()));
        let mut values = serde_json::Map::new();
        values.insert("query".to_string(), serde_json::json!("rust"));
        let output = tool.call(&ToolArguments::new(values)).await.unwrap();

        let hits: Vec<SearchHit> = serde_json::from_str(&output.into_text()).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://rust-lang.org");
        assert_eq!(hits[1].snippet, "registry");
    }

    #[tokio::test]
    async fn fetch_returns_empty_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tool = FetchPageTool::new();
        let mut values = serde_json::Map::new();
        values.insert(
            "url".to_string(),
            serde_json::json!(format!("{}/page", server.uri())),
        );
        let output = tool.call(&ToolArguments::new(values)).await.unwrap();
        assert_eq!(output.into_text(), "");
    }

    #[tokio::test]
    async fn fetch_extracts_page_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><h1>Title</h1><p>Body text</p></body></html>"),
            )
            .mount(&server)
            .await;

        let client = web_client();
        let text = fetch_page_text(&client, &format!("{}/doc", server.uri()))
            .await
            .unwrap();
        assert!(text.contains("Body text"));
    }
}
