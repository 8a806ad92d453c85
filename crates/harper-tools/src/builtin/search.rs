//! Web search tool backed by the Tavily API

use super::parse_params;
use crate::Tool;
use async_trait::async_trait;
use harper_core::{Error, Result};
use harper_llm::tools::schema;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

const NAME: &str = "search_web";
const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 3;

/// Searches the web for current information
pub struct SearchWebTool {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(alias = "input")]
    query: String,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Page URL
    #[serde(default)]
    pub url: String,
    /// Extracted snippet
    #[serde(default)]
    pub content: String,
}

impl SearchWebTool {
    /// Create the tool with an optional Tavily key
    ///
    /// Without a key the tool stays registered and reports an error when
    /// called.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: TAVILY_SEARCH_URL.to_string(),
        }
    }

    /// Read the key from `TAVILY_API_KEY`
    pub fn from_env() -> Self {
        Self::new(std::env::var("TAVILY_API_KEY").ok())
    }

    /// Point the tool at a different search endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search(&self, api_key: &str, query: &str) -> std::result::Result<Vec<SearchHit>, String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TavilyRequest {
                api_key,
                query,
                max_results: MAX_RESULTS,
            })
            .send()
            .await
            .map_err(|e| format!("Search request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("Search API returned HTTP {}", response.status()));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| format!("Invalid search response: {e}"))?;

        Ok(body.results.into_iter().take(MAX_RESULTS).collect())
    }
}

#[async_trait]
impl Tool for SearchWebTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SearchParams = parse_params(NAME, params)?;
        let query = params.query.trim();
        if query.is_empty() {
            return Err(Error::tool(NAME, "Search query must not be empty"));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::tool(NAME, "TAVILY_API_KEY is not set"))?;

        debug!(%query, "Searching the web");
        let hits = self
            .search(api_key, query)
            .await
            .map_err(|msg| Error::tool(NAME, msg))?;

        if hits.is_empty() {
            return Ok(json!("No results found."));
        }
        serde_json::to_value(hits).map_err(|e| Error::tool(NAME, e.to_string()))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Search the web for current information. Input should be a search query."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "query": schema::string("The search query"),
            }),
            &["query"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_tool_error() {
        let tool = SearchWebTool::new(None);
        let err = tool.execute(json!({"query": "rust"})).await.unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));

        let blank = SearchWebTool::new(Some("  ".into()));
        assert!(blank.execute(json!("rust")).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let tool = SearchWebTool::new(Some("key".into()));
        let err = tool.execute(json!({"query": "   "})).await.unwrap_err();
        assert!(matches!(err, Error::ToolExecution { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let tool =
            SearchWebTool::new(Some("key".into())).with_endpoint("http://127.0.0.1:9/search");
        let err = tool.execute(json!({"query": "rust"})).await.unwrap_err();
        assert!(err.to_string().contains("Search request failed"));
    }

    #[test]
    fn test_response_shape() {
        let body: TavilyResponse = serde_json::from_value(json!({
            "query": "rust",
            "results": [
                {"title": "Rust", "url": "https://www.rust-lang.org", "content": "A language", "score": 0.9}
            ]
        }))
        .unwrap();
        assert_eq!(body.results.len(), 1);
        assert_eq!(body.results[0].url, "https://www.rust-lang.org");
    }
}
