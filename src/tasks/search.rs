use super::{load_news_context, record_stage_time, NEWS_CONTEXT_KEY, SEARCH_TASK};
use crate::config::SearchOptions;
use crate::models::WorkflowResult;
use crate::tools::{SearchProvider, SearchRequest};
use async_trait::async_trait;
use chrono::Utc;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct SearchTask {
    provider: Arc<dyn SearchProvider>,
    options: SearchOptions,
}

impl SearchTask {
    pub fn new(provider: Arc<dyn SearchProvider>, options: SearchOptions) -> Self {
        Self { provider, options }
    }
}

#[async_trait]
impl Task for SearchTask {
    fn id(&self) -> &str {
        SEARCH_TASK
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        let mut news_context = load_news_context(&context).await?;

        let request = SearchRequest::for_topic(&news_context.topic, &self.options, Utc::now());
        info!(provider = self.provider.name(), query = %request.query, "Searching for news");

        let mut results = self
            .provider
            .search(&request)
            .await
            .map_err(GraphError::Other)?;
        results.truncate(self.options.max_results);
        info!("Found {} results", results.len());

        let (message, next) = if results.is_empty() {
            news_context.outcome = Some(WorkflowResult::NoResults {
                topic: news_context.topic.clone(),
            });
            (format!("No results found for {}", news_context.topic), NextAction::End)
        } else {
            let message = format!("Found {} results", results.len());
            news_context.raw_results = results;
            (message, NextAction::Continue)
        };

        context.set(NEWS_CONTEXT_KEY, news_context).await;
        record_stage_time(&context, SEARCH_TASK, start_time).await;

        Ok(TaskResult::new(Some(message), next))
    }
}
