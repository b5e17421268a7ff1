use crate::config::{NewsConfig, PipelineMode, PipelineOptions, SearchBackend};
use crate::error::PipelineError;
use crate::models::{NewsContext, Stage, WorkflowResult, WorkflowRun};
use crate::progress::{StageEvent, StageObserver};
use crate::tasks::{
    stage_for_task, RewriteTask, SearchTask, StructureTask, NEWS_CONTEXT_KEY, REWRITE_TASK,
    SEARCH_TASK, STAGE_TIMES_KEY, STRUCTURE_TASK,
};
use crate::tools::{
    DuckDuckGoSearch, LanguageModel, OpenAiChatModel, SearchProvider, TavilySearch,
};
use anyhow::Context as _;
use graph_flow::{
    ExecutionStatus, FlowRunner, Graph, GraphBuilder, GraphError, InMemorySessionStorage,
    Session, SessionStorage,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// The search → rewrite → structure graph, built once and shared by requests.
pub struct NewsWorkflow {
    graph: Arc<Graph>,
}

impl NewsWorkflow {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        model: Arc<dyn LanguageModel>,
        options: PipelineOptions,
    ) -> Self {
        let builder = GraphBuilder::new("news_workflow")
            .add_task(Arc::new(SearchTask::new(search, options.search.clone())))
            .add_task(Arc::new(StructureTask::new(model.clone())));

        let graph = match options.mode {
            PipelineMode::Editorial => builder
                .add_task(Arc::new(RewriteTask::new(model, options.tone)))
                .add_edge(SEARCH_TASK, REWRITE_TASK)
                .add_edge(REWRITE_TASK, STRUCTURE_TASK)
                .build(),
            PipelineMode::Direct => builder.add_edge(SEARCH_TASK, STRUCTURE_TASK).build(),
        };

        Self {
            graph: Arc::new(graph),
        }
    }

    /// Wires the production search provider and chat model from configuration.
    pub fn from_config(config: &NewsConfig) -> anyhow::Result<Self> {
        let search: Arc<dyn SearchProvider> = match config.pipeline.search.backend {
            SearchBackend::Duckduckgo => Arc::new(DuckDuckGoSearch::new(config.timeout)?),
            SearchBackend::Tavily => {
                let api_key = config
                    .tavily_api_key
                    .as_deref()
                    .context("TAVILY_API_KEY is required for the tavily provider")?;
                Arc::new(TavilySearch::new(api_key, config.timeout)?)
            }
        };
        info!(provider = search.name(), model = %config.model, "News workflow configured");

        let model: Arc<dyn LanguageModel> = Arc::new(OpenAiChatModel::new(
            &config.openai_api_key,
            config.model.clone(),
            config.timeout,
        ));

        Ok(Self::new(search, model, config.pipeline.clone()))
    }

    /// Runs one request to completion. Never returns an error: every failure
    /// ends up as `WorkflowResult::Failed`. A blank topic returns
    /// `WorkflowResult::EmptyTopic` without searching or emitting events.
    #[instrument(skip(self, observer))]
    pub async fn run(&self, topic: &str, observer: &dyn StageObserver) -> WorkflowRun {
        let topic = topic.trim();
        if topic.is_empty() {
            warn!("News workflow called without a topic");
            return WorkflowRun {
                topic: String::new(),
                result: WorkflowResult::EmptyTopic,
                stage_times_ms: HashMap::new(),
                total_time_ms: 0,
            };
        }

        let start_time = Instant::now();
        let session_id = Uuid::new_v4().to_string();
        info!("Starting news workflow for session {}", session_id);

        // Per-request storage: nothing outlives this call.
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let runner = FlowRunner::new(self.graph.clone(), storage.clone());

        let (result, stage_times_ms) =
            match drive(&runner, storage.as_ref(), &session_id, topic, observer).await {
                Ok(done) => done,
                Err(failure) => (
                    WorkflowResult::from(failure),
                    recorded_stage_times(storage.as_ref(), &session_id).await,
                ),
            };

        match &result {
            WorkflowResult::Failed { error } => {
                error!("Workflow failed: {}", error);
                observer.on_stage(&StageEvent::with_detail(Stage::Failed, error.to_string()));
            }
            WorkflowResult::NoResults { topic } => {
                observer.on_stage(&StageEvent::with_detail(
                    Stage::Rendered,
                    format!("No results found for {}", topic),
                ));
            }
            WorkflowResult::Articles { articles } => {
                observer.on_stage(&StageEvent::with_detail(
                    Stage::Rendered,
                    format!("{} articles", articles.len()),
                ));
            }
            WorkflowResult::EmptyTopic => {}
        }

        let total_time_ms = start_time.elapsed().as_millis() as u64;
        info!("Workflow completed in {}ms", total_time_ms);

        WorkflowRun {
            topic: topic.to_string(),
            result,
            stage_times_ms,
            total_time_ms,
        }
    }
}

async fn drive(
    runner: &FlowRunner,
    storage: &dyn SessionStorage,
    session_id: &str,
    topic: &str,
    observer: &dyn StageObserver,
) -> Result<(WorkflowResult, HashMap<String, u64>), PipelineError> {
    let session = Session::new_from_task(session_id.to_string(), SEARCH_TASK);
    session
        .context
        .set(NEWS_CONTEXT_KEY, NewsContext::new(topic))
        .await;
    storage
        .save(session)
        .await
        .map_err(|e| PipelineError::internal(e.to_string()))?;

    let mut stage = Stage::Searching;
    observer.on_stage(&StageEvent::new(stage));

    loop {
        let result = runner
            .run(session_id)
            .await
            .map_err(|e| pipeline_error(stage, e))?;

        match result.status {
            ExecutionStatus::Completed => break,
            ExecutionStatus::Paused { next_task_id, .. } => {
                stage = stage_for_task(&next_task_id).ok_or_else(|| {
                    PipelineError::internal(format!("Unknown task {}", next_task_id))
                })?;
                observer.on_stage(&StageEvent::new(stage));
            }
            ExecutionStatus::Error(message) => {
                return Err(PipelineError::internal(message));
            }
            _ => {
                return Err(PipelineError::internal(
                    "Workflow stopped waiting for input",
                ));
            }
        }
    }

    let session = storage
        .get(session_id)
        .await
        .map_err(|e| PipelineError::internal(e.to_string()))?
        .ok_or_else(|| PipelineError::internal("Session disappeared"))?;

    let news_context: NewsContext = session
        .context
        .get(NEWS_CONTEXT_KEY)
        .await
        .ok_or_else(|| PipelineError::internal("News context not found"))?;
    let stage_times: HashMap<String, u64> =
        session.context.get(STAGE_TIMES_KEY).await.unwrap_or_default();

    let result = news_context
        .outcome
        .ok_or_else(|| PipelineError::internal("Workflow ended without an outcome"))?;

    Ok((result, stage_times))
}

/// Task failures (a provider call returning an error) belong to the stage
/// that was running; everything else is the engine's own bookkeeping.
fn pipeline_error(stage: Stage, error: GraphError) -> PipelineError {
    match error {
        GraphError::TaskExecutionFailed(message) => PipelineError::provider(stage, message),
        GraphError::Other(e) => PipelineError::provider(stage, e.to_string()),
        other => PipelineError::internal(other.to_string()),
    }
}

/// Timings of the stages that finished before a failure. A failing step is
/// never saved, so the stored session holds exactly the completed ones.
async fn recorded_stage_times(
    storage: &dyn SessionStorage,
    session_id: &str,
) -> HashMap<String, u64> {
    match storage.get(session_id).await {
        Ok(Some(session)) => session.context.get(STAGE_TIMES_KEY).await.unwrap_or_default(),
        _ => HashMap::new(),
    }
}
