use super::{load_news_context, record_stage_time, NEWS_CONTEXT_KEY, REWRITE_TASK};
use crate::config::Tone;
use crate::models::format_raw_results;
use crate::tools::LanguageModel;
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument};

pub fn rewrite_instructions(tone: Tone) -> String {
    let voice = match tone {
        Tone::Professional => {
            "Write in a strictly professional, neutral newsroom voice. Do not editorialize."
        }
        Tone::Humorous => {
            "Write with a humorous, lightly sarcastic voice, but never invent facts."
        }
    };

    format!(
        r#"You are a news editor. Rewrite the news snippets you are given into an article ready for publishing.

Requirements:
- {}
- Give each news story its own section with a headline
- Keep the original link of every story next to its section
- Only use information present in the snippets
- Do not add stories that are not in the snippets"#,
        voice
    )
}

pub struct RewriteTask {
    model: Arc<dyn LanguageModel>,
    tone: Tone,
}

impl RewriteTask {
    pub fn new(model: Arc<dyn LanguageModel>, tone: Tone) -> Self {
        Self { model, tone }
    }
}

#[async_trait]
impl Task for RewriteTask {
    fn id(&self) -> &str {
        REWRITE_TASK
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting rewrite task");

        let mut news_context = load_news_context(&context).await?;
        let raw_text = format_raw_results(&news_context.raw_results);

        let article = self
            .model
            .complete(&rewrite_instructions(self.tone), &raw_text)
            .await
            .map_err(GraphError::Other)?;

        info!("Rewrote {} results into {} characters", news_context.raw_results.len(), article.len());
        news_context.article_text = Some(article);
        context.set(NEWS_CONTEXT_KEY, news_context).await;
        record_stage_time(&context, REWRITE_TASK, start_time).await;

        Ok(TaskResult::new(
            Some("Article rewritten".to_string()),
            NextAction::Continue,
        ))
    }
}
