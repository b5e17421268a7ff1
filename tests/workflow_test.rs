mod common;

use common::{echo_reply, mexico_results, MockSearch, ScriptedModel};
use newsdesk::config::{PipelineMode, PipelineOptions, SearchOptions, Tone};
use newsdesk::progress::{NoopObserver, RecordingObserver};
use newsdesk::render::{render, RenderedView};
use newsdesk::tasks::STRUCTURE_INSTRUCTIONS;
use newsdesk::{NewsWorkflow, PipelineError, Stage, WorkflowResult};
use std::sync::Arc;

fn options(mode: PipelineMode, max_results: usize) -> PipelineOptions {
    PipelineOptions {
        search: SearchOptions {
            max_results,
            ..SearchOptions::default()
        },
        tone: Tone::Humorous,
        mode,
    }
}

fn workflow(
    search: Arc<MockSearch>,
    model: Arc<ScriptedModel>,
    options: PipelineOptions,
) -> NewsWorkflow {
    NewsWorkflow::new(search, model, options)
}

#[tokio::test]
async fn editorial_run_preserves_every_input_article() {
    let results = mexico_results(5);
    let search = Arc::new(MockSearch::returning(results.clone()));
    let model = Arc::new(ScriptedModel::new(vec![
        Ok("# Mexico's AI spring\n\nA long rewritten article...".to_string()),
        Ok(format!("```json\n{}\n```", echo_reply(&results))),
    ]));
    let observer = RecordingObserver::new();

    let run = workflow(search.clone(), model.clone(), options(PipelineMode::Editorial, 5))
        .run("AI in Mexico", &observer)
        .await;

    let WorkflowResult::Articles { articles } = &run.result else {
        panic!("expected articles, got {:?}", run.result);
    };
    assert_eq!(articles.len(), 5);
    for (article, raw) in articles.iter().zip(&results) {
        assert_eq!(article.title, raw.title);
        assert_eq!(article.link, raw.link);
        assert!(!article.snippet.is_empty());
    }

    let queries = search.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].starts_with("AI in Mexico after:"));

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].instructions.contains("sarcastic"));
    assert!(calls[0].input.contains("Link: https://news.example.mx/ai/3"));
    assert_eq!(calls[1].instructions, STRUCTURE_INSTRUCTIONS);
    assert!(calls[1].input.starts_with("# Mexico's AI spring"));

    assert_eq!(
        observer.stages(),
        vec![
            Stage::Searching,
            Stage::Rewriting,
            Stage::Structuring,
            Stage::Rendered
        ]
    );
    assert!(run.stage_times_ms.contains_key("search"));
    assert!(run.stage_times_ms.contains_key("rewrite"));
    assert!(run.stage_times_ms.contains_key("structure"));
}

#[tokio::test]
async fn direct_mode_skips_the_rewrite() {
    let results = mexico_results(3);
    let search = Arc::new(MockSearch::returning(results.clone()));
    let model = Arc::new(ScriptedModel::new(vec![Ok(echo_reply(&results))]));
    let observer = RecordingObserver::new();

    let run = workflow(search, model.clone(), options(PipelineMode::Direct, 5))
        .run("AI in Mexico", &observer)
        .await;

    assert!(matches!(run.result, WorkflowResult::Articles { ref articles } if articles.len() == 3));

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].input.starts_with("Title: AI story 1 from Mexico"));
    assert_eq!(
        observer.stages(),
        vec![Stage::Searching, Stage::Structuring, Stage::Rendered]
    );
}

#[tokio::test]
async fn empty_search_is_no_results_without_model_calls() {
    let search = Arc::new(MockSearch::returning(vec![]));
    let model = Arc::new(ScriptedModel::new(vec![]));
    let observer = RecordingObserver::new();

    let run = workflow(search, model.clone(), options(PipelineMode::Editorial, 7))
        .run("quantum llamas", &observer)
        .await;

    assert_eq!(
        run.result,
        WorkflowResult::NoResults {
            topic: "quantum llamas".to_string()
        }
    );
    assert!(model.calls().is_empty());
    assert_eq!(observer.stages(), vec![Stage::Searching, Stage::Rendered]);
    assert!(matches!(render(&run.result), RenderedView::Warning { .. }));
}

#[tokio::test]
async fn unlabelled_fence_parses() {
    let results = mexico_results(2);
    let search = Arc::new(MockSearch::returning(results.clone()));
    let model = Arc::new(ScriptedModel::new(vec![
        Ok("article".to_string()),
        Ok(format!("```\n{}\n```", echo_reply(&results))),
    ]));

    let run = workflow(search, model, options(PipelineMode::Editorial, 5))
        .run("AI in Mexico", &NoopObserver)
        .await;

    assert!(matches!(run.result, WorkflowResult::Articles { ref articles } if articles.len() == 2));
}

#[tokio::test]
async fn output_is_capped_at_search_count() {
    let results = mexico_results(2);
    let search = Arc::new(MockSearch::returning(results));
    let model = Arc::new(ScriptedModel::new(vec![
        Ok("article".to_string()),
        Ok(echo_reply(&mexico_results(6))),
    ]));

    let run = workflow(search, model, options(PipelineMode::Editorial, 5))
        .run("AI in Mexico", &NoopObserver)
        .await;

    let WorkflowResult::Articles { articles } = run.result else {
        panic!("expected articles");
    };
    assert_eq!(articles.len(), 2);
}

#[tokio::test]
async fn search_results_are_capped_at_max_results() {
    let search = Arc::new(MockSearch::returning(mexico_results(10)));
    let model = Arc::new(ScriptedModel::new(vec![Ok(echo_reply(&mexico_results(10)))]));

    let run = workflow(search, model.clone(), options(PipelineMode::Direct, 4))
        .run("AI in Mexico", &NoopObserver)
        .await;

    assert_eq!(model.calls()[0].input.matches("Title: ").count(), 4);
    assert!(matches!(run.result, WorkflowResult::Articles { ref articles } if articles.len() == 4));
}

#[tokio::test]
async fn truncated_json_is_a_structuring_failure() {
    let results = mexico_results(3);
    let search = Arc::new(MockSearch::returning(results.clone()));
    let reply = echo_reply(&results);
    let model = Arc::new(ScriptedModel::new(vec![
        Ok("article".to_string()),
        Ok(format!("```json\n{}", &reply[..reply.len() / 2])),
    ]));
    let observer = RecordingObserver::new();

    let run = workflow(search, model, options(PipelineMode::Editorial, 5))
        .run("AI in Mexico", &observer)
        .await;

    assert!(matches!(
        run.result,
        WorkflowResult::Failed {
            error: PipelineError::StructuringParse { .. }
        }
    ));
    assert_eq!(observer.stages().last(), Some(&Stage::Failed));

    let RenderedView::Error { message } = render(&run.result) else {
        panic!("expected an error view");
    };
    assert!(!message.is_empty());
}

#[tokio::test]
async fn search_failure_is_a_provider_failure() {
    let search = Arc::new(MockSearch::failing("connection reset"));
    let model = Arc::new(ScriptedModel::new(vec![]));
    let observer = RecordingObserver::new();

    let run = workflow(search, model, options(PipelineMode::Editorial, 5))
        .run("AI in Mexico", &observer)
        .await;

    let WorkflowResult::Failed {
        error: PipelineError::Provider { stage, message },
    } = &run.result
    else {
        panic!("expected provider failure, got {:?}", run.result);
    };
    assert_eq!(*stage, Stage::Searching);
    assert!(message.contains("connection reset"));
    assert_eq!(observer.stages(), vec![Stage::Searching, Stage::Failed]);
}

#[tokio::test]
async fn model_failure_names_the_stage_it_happened_in() {
    let search = Arc::new(MockSearch::returning(mexico_results(2)));
    let model = Arc::new(ScriptedModel::new(vec![Err("rate limited".to_string())]));

    let run = workflow(search, model, options(PipelineMode::Editorial, 5))
        .run("AI in Mexico", &NoopObserver)
        .await;

    assert!(matches!(
        run.result,
        WorkflowResult::Failed {
            error: PipelineError::Provider {
                stage: Stage::Rewriting,
                ..
            }
        }
    ));
}

#[tokio::test]
async fn concurrent_runs_are_isolated() {
    let results = mexico_results(2);
    let search = Arc::new(MockSearch::returning(results.clone()));
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(echo_reply(&results)),
        Ok(echo_reply(&results)),
    ]));
    let workflow = Arc::new(workflow(search, model, options(PipelineMode::Direct, 5)));

    let (a, b) = tokio::join!(
        workflow.run("first topic", &NoopObserver),
        workflow.run("second topic", &NoopObserver)
    );

    assert_eq!(a.topic, "first topic");
    assert_eq!(b.topic, "second topic");
    assert!(!a.result.is_failure());
    assert!(!b.result.is_failure());
}

#[tokio::test]
async fn failed_run_keeps_timings_of_finished_stages() {
    let search = Arc::new(MockSearch::returning(mexico_results(2)));
    let model = Arc::new(ScriptedModel::new(vec![
        Ok("article".to_string()),
        Err("rate limited".to_string()),
    ]));

    let run = workflow(search, model, options(PipelineMode::Editorial, 5))
        .run("AI in Mexico", &NoopObserver)
        .await;

    assert!(matches!(
        run.result,
        WorkflowResult::Failed {
            error: PipelineError::Provider {
                stage: Stage::Structuring,
                ..
            }
        }
    ));
    assert!(run.stage_times_ms.contains_key("search"));
    assert!(run.stage_times_ms.contains_key("rewrite"));
    assert!(!run.stage_times_ms.contains_key("structure"));
}

#[tokio::test]
async fn blank_topic_never_reaches_the_providers() {
    let search = Arc::new(MockSearch::returning(mexico_results(2)));
    let model = Arc::new(ScriptedModel::new(vec![]));
    let observer = RecordingObserver::new();

    let run = workflow(search.clone(), model.clone(), options(PipelineMode::Editorial, 5))
        .run("   ", &observer)
        .await;

    assert_eq!(run.result, WorkflowResult::EmptyTopic);
    assert!(!run.result.is_failure());
    assert!(search.queries.lock().unwrap().is_empty());
    assert!(model.calls().is_empty());
    assert!(observer.stages().is_empty());
    assert_eq!(
        render(&run.result),
        RenderedView::Warning {
            message: "Please enter a topic.".to_string()
        }
    );
}
