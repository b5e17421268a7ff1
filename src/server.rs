use crate::models::{NewsRequest, NewsResponse, StreamQuery};
use crate::progress::{ChannelObserver, LoggingObserver, StageEvent, StageObserver};
use crate::workflow::NewsWorkflow;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, Json,
    },
    routing::{get, post},
    Router,
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<NewsWorkflow>,
}

enum StreamMessage {
    Stage(StageEvent),
    Done(Box<NewsResponse>),
}

impl From<StageEvent> for StreamMessage {
    fn from(event: StageEvent) -> Self {
        StreamMessage::Stage(event)
    }
}

/// Fans stage events out to the tracing log as well as the SSE channel.
struct StreamObserver {
    channel: ChannelObserver<StreamMessage>,
}

impl StageObserver for StreamObserver {
    fn on_stage(&self, event: &StageEvent) {
        LoggingObserver.on_stage(event);
        self.channel.on_stage(event);
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/news", post(fetch_news))
        .route("/api/news/stream", get(stream_news))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, workflow: Arc<NewsWorkflow>) -> Result<()> {
    let app = router(AppState { workflow });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("News desk running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "OK"
}

#[instrument(skip(state))]
async fn fetch_news(
    State(state): State<AppState>,
    Json(req): Json<NewsRequest>,
) -> (StatusCode, Json<NewsResponse>) {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(NewsResponse::empty_topic(req.topic.clone())),
        );
    }

    let run = state.workflow.run(topic, &LoggingObserver).await;
    (StatusCode::OK, Json(NewsResponse::from_run(run)))
}

#[instrument(skip(state))]
async fn stream_news(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let topic = query.topic.trim().to_string();

    if topic.is_empty() {
        let _ = tx.send(StreamMessage::Done(Box::new(NewsResponse::empty_topic(
            query.topic,
        ))));
    } else {
        let workflow = state.workflow.clone();
        tokio::spawn(async move {
            let observer = StreamObserver {
                channel: ChannelObserver::new(tx.clone()),
            };
            let run = workflow.run(&topic, &observer).await;
            let _ = tx.send(StreamMessage::Done(Box::new(NewsResponse::from_run(run))));
        });
    }

    let events = stream::unfold(rx, |mut rx| async move {
        let message = rx.recv().await?;
        Some((Ok::<_, Infallible>(to_event(message)), rx))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_event(message: StreamMessage) -> Event {
    let event = match &message {
        StreamMessage::Stage(stage) => Event::default().event("stage").json_data(stage),
        StreamMessage::Done(response) => Event::default().event("result").json_data(response),
    };

    event.unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
