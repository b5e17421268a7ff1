use super::{is_web_link, SearchProvider, SearchRequest};
use crate::models::{RawResult, TavilySearchRequest, TavilySearchResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// News search through the Tavily API.
pub struct TavilySearch {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Tavily HTTP client")?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawResult>> {
        debug!(
            region = %request.region,
            safesearch = ?request.safesearch,
            "Tavily ignores region and safe-search filters"
        );

        let body = TavilySearchRequest {
            query: request.query.clone(),
            max_results: request.max_results,
            topic: "news".to_string(),
            days: request.time_window.days(),
            search_depth: "basic".to_string(),
            include_raw_content: false,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Tavily request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Tavily API error {}: {}", status, text);
        }

        let search_response: TavilySearchResponse = response
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        let results: Vec<RawResult> = search_response
            .results
            .into_iter()
            .filter(|r| !r.title.trim().is_empty() && is_web_link(&r.url))
            .map(|r| RawResult {
                title: r.title.trim().to_string(),
                link: r.url,
                snippet: r.content.trim().to_string(),
            })
            .take(request.max_results)
            .collect();

        info!(query = %request.query, count = results.len(), "Tavily search complete");
        Ok(results)
    }
}
