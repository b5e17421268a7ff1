//! Stage-transition events for whoever is presenting a running workflow.

use crate::models::Stage;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StageEvent {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            detail: None,
        }
    }

    pub fn with_detail(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: Some(detail.into()),
        }
    }

    /// Human label shown next to the spinner.
    pub fn label(&self) -> &'static str {
        match self.stage {
            Stage::Idle => "Waiting for a topic",
            Stage::Searching => "Searching for news...",
            Stage::Rewriting => "Rewriting the news...",
            Stage::Structuring => "Formatting articles...",
            Stage::Rendered => "Done!",
            Stage::Failed => "Something went wrong",
        }
    }
}

pub trait StageObserver: Send + Sync {
    fn on_stage(&self, event: &StageEvent);
}

pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn on_stage(&self, _event: &StageEvent) {}
}

pub struct LoggingObserver;

impl StageObserver for LoggingObserver {
    fn on_stage(&self, event: &StageEvent) {
        info!(stage = %event.stage, detail = ?event.detail, "Workflow stage");
    }
}

/// Forwards events into a channel; a closed receiver is ignored.
pub struct ChannelObserver<T> {
    sender: UnboundedSender<T>,
}

impl<T> ChannelObserver<T> {
    pub fn new(sender: UnboundedSender<T>) -> Self {
        Self { sender }
    }
}

impl<T> StageObserver for ChannelObserver<T>
where
    T: From<StageEvent> + Send,
{
    fn on_stage(&self, event: &StageEvent) {
        let _ = self.sender.send(T::from(event.clone()));
    }
}

/// Keeps every event in arrival order.
#[derive(Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<StageEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.stage).collect())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl StageObserver for RecordingObserver {
    fn on_stage(&self, event: &StageEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
