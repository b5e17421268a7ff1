use crate::models::Stage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single pipeline run ended without articles.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineError {
    #[error("Could not read news articles from the model reply: {reason}")]
    StructuringParse { reason: String, excerpt: String },

    #[error("{stage} failed: {message}")]
    Provider { stage: Stage, message: String },

    #[error("Workflow error: {message}")]
    Internal { message: String },
}

impl PipelineError {
    pub fn structuring(reason: impl Into<String>, reply: &str) -> Self {
        PipelineError::StructuringParse {
            reason: reason.into(),
            excerpt: excerpt(reply, 200),
        }
    }

    pub fn provider(stage: Stage, message: impl Into<String>) -> Self {
        PipelineError::Provider {
            stage,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PipelineError::Internal {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
