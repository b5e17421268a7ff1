pub mod duckduckgo;
pub mod llm;
pub mod tavily;

use crate::config::{SafeSearch, SearchOptions, TimeWindow};
use crate::models::RawResult;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use duckduckgo::DuckDuckGoSearch;
pub use llm::OpenAiChatModel;
pub use tavily::TavilySearch;

/// One outbound search query with its provider-side constraints.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    pub region: String,
    pub safesearch: SafeSearch,
    pub time_window: TimeWindow,
}

impl SearchRequest {
    pub fn for_topic(topic: &str, options: &SearchOptions, now: DateTime<Utc>) -> Self {
        Self {
            query: recency_query(topic, now),
            max_results: options.max_results,
            region: options.region.clone(),
            safesearch: options.safesearch,
            time_window: options.time_window,
        }
    }
}

/// Appends the `after:YYYY-MM` qualifier that biases results to this month.
pub fn recency_query(topic: &str, now: DateTime<Utc>) -> String {
    format!("{} after:{}", topic.trim(), now.format("%Y-%m"))
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawResult>>;
}

/// Single-turn chat completion: fixed instructions plus one user message.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, instructions: &str, input: &str) -> Result<String>;
}

pub(crate) fn is_web_link(link: &str) -> bool {
    url::Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
