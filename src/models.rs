use crate::error::PipelineError;
use crate::render::{empty_topic, render, RenderedView};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRequest {
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub topic: String,
}

/// A single hit returned by the search provider, before any model touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl RawResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Formats search hits as the plain-text block handed to the model.
pub fn format_raw_results(results: &[RawResult]) -> String {
    results
        .iter()
        .map(|r| format!("Title: {}\nLink: {}\nSnippet: {}", r.title, r.link, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// The JSON document the structuring model is asked to produce.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NewsDigest {
    Wrapped { news_articles: Vec<NewsArticle> },
    Bare(Vec<NewsArticle>),
}

impl NewsDigest {
    pub fn into_articles(self) -> Vec<NewsArticle> {
        match self {
            NewsDigest::Wrapped { news_articles } => news_articles,
            NewsDigest::Bare(articles) => articles,
        }
    }
}

/// Outcome of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowResult {
    Articles { articles: Vec<NewsArticle> },
    NoResults { topic: String },
    Failed { error: PipelineError },
    EmptyTopic,
}

impl WorkflowResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, WorkflowResult::Failed { .. })
    }
}

impl From<PipelineError> for WorkflowResult {
    fn from(error: PipelineError) -> Self {
        WorkflowResult::Failed { error }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Searching,
    Rewriting,
    Structuring,
    Rendered,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Idle => "idle",
            Stage::Searching => "searching",
            Stage::Rewriting => "rewriting",
            Stage::Structuring => "structuring",
            Stage::Rendered => "rendered",
            Stage::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Shared state carried between tasks in the workflow session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsContext {
    pub topic: String,
    pub raw_results: Vec<RawResult>,
    pub article_text: Option<String>,
    pub outcome: Option<WorkflowResult>,
}

impl NewsContext {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            raw_results: vec![],
            article_text: None,
            outcome: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub topic: String,
    pub result: WorkflowResult,
    pub stage_times_ms: HashMap<String, u64>,
    pub total_time_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsResponse {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WorkflowResult>,
    pub view: RenderedView,
    pub stage_times_ms: HashMap<String, u64>,
    pub total_time_ms: u64,
}

impl NewsResponse {
    pub fn from_run(run: WorkflowRun) -> Self {
        Self {
            topic: run.topic,
            view: render(&run.result),
            result: Some(run.result),
            stage_times_ms: run.stage_times_ms,
            total_time_ms: run.total_time_ms,
        }
    }

    pub fn empty_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            result: None,
            view: empty_topic(),
            stage_times_ms: HashMap::new(),
            total_time_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchRequest {
    pub query: String,
    pub max_results: usize,
    pub topic: String,
    pub days: u32,
    pub search_depth: String,
    pub include_raw_content: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchResponse {
    #[serde(default)]
    pub results: Vec<TavilyResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}
