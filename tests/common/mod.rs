#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use newsdesk::models::RawResult;
use newsdesk::tools::{LanguageModel, SearchProvider, SearchRequest};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::net::TcpListener;

pub enum SearchBehaviour {
    Results(Vec<RawResult>),
    Fail(String),
}

pub struct MockSearch {
    behaviour: SearchBehaviour,
    pub queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn returning(results: Vec<RawResult>) -> Self {
        Self {
            behaviour: SearchBehaviour::Results(results),
            queries: Mutex::new(vec![]),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            behaviour: SearchBehaviour::Fail(message.to_string()),
            queries: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawResult>> {
        self.queries.lock().unwrap().push(request.query.clone());
        match &self.behaviour {
            SearchBehaviour::Results(results) => Ok(results.clone()),
            SearchBehaviour::Fail(message) => Err(anyhow!(message.clone())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelCall {
    pub instructions: String,
    pub input: String,
}

/// Replies with queued answers in order; an `Err` entry simulates a provider failure.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub calls: Mutex<Vec<ModelCall>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, instructions: &str, input: &str) -> Result<String> {
        self.calls.lock().unwrap().push(ModelCall {
            instructions: instructions.to_string(),
            input: input.to_string(),
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

pub fn mexico_results(count: usize) -> Vec<RawResult> {
    (1..=count)
        .map(|n| {
            RawResult::new(
                format!("AI story {} from Mexico", n),
                format!("https://news.example.mx/ai/{}", n),
                format!("Snippet about AI development number {}", n),
            )
        })
        .collect()
}

/// A well-behaved structuring reply that echoes every input title and link.
pub fn echo_reply(results: &[RawResult]) -> String {
    let articles: Vec<_> = results
        .iter()
        .map(|r| {
            serde_json::json!({
                "title": r.title,
                "link": r.link,
                "snippet": format!("Rewritten: {}", r.snippet),
            })
        })
        .collect();

    serde_json::json!({ "news_articles": articles }).to_string()
}

/// Accepts connections and never writes a byte back, so every request sent
/// to the returned base URL hangs until the client gives up.
pub async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    format!("http://{}", addr)
}
