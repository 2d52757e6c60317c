//! Web search through the DuckDuckGo instant-answer API.
//!
//! The tool takes `{"query": "..."}` and returns the abstract (when DuckDuckGo has one)
//! followed by related topics, each as `{"title", "snippet", "url"}`:
//!
//! ```json
//! {"query": "clima", "results": [{"title": "Clima", "snippet": "...", "url": "https://..."}]}
//! ```
//!
//! A non-2xx answer is reported back to the model as a failed [`ToolResult`]; transport and
//! decoding problems are [`ToolError::ExecutionFailed`].

use crate::clients::common::get_shared_http_client;
use crate::tool_protocol::{Tool, ToolError, ToolParameter, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const DUCKDUCKGO_API_URL: &str = "https://api.duckduckgo.com/";

/// Results returned per query unless configured otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Deserialize, Default)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a topic (`Text` + `FirstURL`) or a named group of topics.
#[derive(Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text")]
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
    #[serde(rename = "Topics", default)]
    topics: Vec<RelatedTopic>,
}

impl RelatedTopic {
    fn collect_into(&self, results: &mut Vec<serde_json::Value>, limit: usize) {
        if results.len() >= limit {
            return;
        }
        if let (Some(text), Some(url)) = (&self.text, &self.first_url) {
            // DuckDuckGo topic texts start with the page title followed by " - ".
            let title = text.split(" - ").next().unwrap_or(text);
            results.push(json!({ "title": title, "snippet": text, "url": url }));
        }
        for topic in &self.topics {
            topic.collect_into(results, limit);
        }
    }
}

pub struct WebSearchTool {
    http: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            http: get_shared_http_client().clone(),
            base_url: DUCKDUCKGO_API_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Query a different instant-answer endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub async fn search(&self, query: &str) -> Result<ToolResult, ToolError> {
        log::debug!("WebSearchTool::search(): {}", query);
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                log::warn!("WebSearchTool::search(): transport error: {}", e);
                ToolError::ExecutionFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("WebSearchTool::search(): HTTP {} for '{}'", status, query);
            return Ok(ToolResult::failure(format!(
                "search service answered HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        let answer: InstantAnswer = if body.trim().is_empty() {
            InstantAnswer::default()
        } else {
            serde_json::from_str(&body)
                .map_err(|e| ToolError::ExecutionFailed(format!("unreadable search answer: {}", e)))?
        };

        let mut results = Vec::new();
        if !answer.abstract_text.trim().is_empty() {
            results.push(json!({
                "title": answer.heading,
                "snippet": answer.abstract_text,
                "url": answer.abstract_url,
            }));
        }
        for topic in &answer.related_topics {
            topic.collect_into(&mut results, self.max_results);
        }
        results.truncate(self.max_results);

        Ok(ToolResult::success(json!({ "query": query, "results": results })))
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return short summaries with their source URLs."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::new("query", "What to search for").required()]
    }

    async fn execute(&self, parameters: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = parameters
            .get("query")
            .and_then(|q| q.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidParameters("'query' must be a non-empty string".to_string()))?;
        self.search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_topics_are_flattened_up_to_the_limit() {
        let answer: InstantAnswer = serde_json::from_value(json!({
            "RelatedTopics": [
                { "Text": "Clima - Condições atmosféricas", "FirstURL": "https://duckduckgo.com/Clima" },
                { "Name": "Ciência", "Topics": [
                    { "Text": "Meteorologia - Estudo da atmosfera", "FirstURL": "https://duckduckgo.com/Meteorologia" },
                    { "Text": "El Niño - Fenômeno oceânico", "FirstURL": "https://duckduckgo.com/El_Nino" }
                ]}
            ]
        }))
        .unwrap();

        let mut results = Vec::new();
        for topic in &answer.related_topics {
            topic.collect_into(&mut results, 2);
        }
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "Clima");
        assert_eq!(results[1]["url"], "https://duckduckgo.com/Meteorologia");
    }

    #[tokio::test]
    async fn missing_query_is_rejected_before_any_request() {
        let tool = WebSearchTool::new().with_base_url("http://127.0.0.1:9/");
        assert!(matches!(
            tool.execute(json!({ "query": "  " })).await,
            Err(ToolError::InvalidParameters(_))
        ));
        assert!(matches!(
            tool.execute(json!({})).await,
            Err(ToolError::InvalidParameters(_))
        ));
    }
}
