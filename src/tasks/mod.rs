mod rewrite;
mod search;
mod structure;

pub use rewrite::{rewrite_instructions, RewriteTask};
pub use search::SearchTask;
pub use structure::{StructureTask, STRUCTURE_INSTRUCTIONS};

use crate::models::{NewsContext, Stage};
use graph_flow::{Context, GraphError};
use std::collections::HashMap;
use std::time::Instant;

pub const SEARCH_TASK: &str = "search";
pub const REWRITE_TASK: &str = "rewrite";
pub const STRUCTURE_TASK: &str = "structure";

pub const NEWS_CONTEXT_KEY: &str = "news_context";
pub const STAGE_TIMES_KEY: &str = "stage_times";

pub fn stage_for_task(task_id: &str) -> Option<Stage> {
    match task_id {
        SEARCH_TASK => Some(Stage::Searching),
        REWRITE_TASK => Some(Stage::Rewriting),
        STRUCTURE_TASK => Some(Stage::Structuring),
        _ => None,
    }
}

async fn load_news_context(context: &Context) -> Result<NewsContext, GraphError> {
    context
        .get(NEWS_CONTEXT_KEY)
        .await
        .ok_or_else(|| GraphError::ContextError("News context not found".to_string()))
}

async fn record_stage_time(context: &Context, task_id: &str, started: Instant) {
    let elapsed = started.elapsed().as_millis() as u64;
    let mut stage_times: HashMap<String, u64> =
        context.get(STAGE_TIMES_KEY).await.unwrap_or_default();
    stage_times.insert(task_id.to_string(), elapsed);
    context.set(STAGE_TIMES_KEY, stage_times).await;
}
