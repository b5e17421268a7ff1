use super::{load_news_context, record_stage_time, NEWS_CONTEXT_KEY, STRUCTURE_TASK};
use crate::extract::parse_news_articles;
use crate::models::{format_raw_results, WorkflowResult};
use crate::tools::LanguageModel;
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const STRUCTURE_INSTRUCTIONS: &str = r#"Convert the news you are given into VALID JSON and nothing else.

Format:
{"news_articles": [{"title": "...", "link": "...", "snippet": "..."}]}

Requirements:
- One entry per news story, in the order they appear
- `link` must be the full original URL of the story
- `snippet` is a one or two sentence summary
- Do not add stories that are not in the text
- Do not wrap the JSON in Markdown"#;

pub struct StructureTask {
    model: Arc<dyn LanguageModel>,
}

impl StructureTask {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Task for StructureTask {
    fn id(&self) -> &str {
        STRUCTURE_TASK
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting structuring task");

        let mut news_context = load_news_context(&context).await?;
        let input = news_context
            .article_text
            .clone()
            .unwrap_or_else(|| format_raw_results(&news_context.raw_results));

        let reply = self
            .model
            .complete(STRUCTURE_INSTRUCTIONS, &input)
            .await
            .map_err(GraphError::Other)?;

        let (message, outcome) = match parse_news_articles(&reply, news_context.raw_results.len()) {
            Ok(articles) => {
                info!("Structured {} articles", articles.len());
                (
                    format!("Structured {} articles", articles.len()),
                    WorkflowResult::Articles { articles },
                )
            }
            Err(error) => {
                warn!(%error, "Structuring reply was not usable");
                (error.to_string(), WorkflowResult::from(error))
            }
        };

        news_context.outcome = Some(outcome);
        context.set(NEWS_CONTEXT_KEY, news_context).await;
        record_stage_time(&context, STRUCTURE_TASK, start_time).await;

        Ok(TaskResult::new(Some(message), NextAction::End))
    }
}
