use crate::models::{NewsArticle, WorkflowResult};
use serde::Serialize;
use std::io::{self, Write};

pub const EMPTY_TOPIC_WARNING: &str = "Please enter a topic.";

/// What the results area shows. Articles and errors never appear together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedView {
    Articles {
        heading: String,
        articles: Vec<NewsArticle>,
        footer: String,
    },
    Warning {
        message: String,
    },
    Error {
        message: String,
    },
}

pub fn render(result: &WorkflowResult) -> RenderedView {
    match result {
        WorkflowResult::Articles { articles } => RenderedView::Articles {
            heading: "News Articles:".to_string(),
            articles: articles.clone(),
            footer: "Done!".to_string(),
        },
        WorkflowResult::NoResults { topic } => RenderedView::Warning {
            message: format!("No results found for {}", topic),
        },
        WorkflowResult::Failed { error } => RenderedView::Error {
            message: error.to_string(),
        },
        WorkflowResult::EmptyTopic => empty_topic(),
    }
}

pub fn empty_topic() -> RenderedView {
    RenderedView::Warning {
        message: EMPTY_TOPIC_WARNING.to_string(),
    }
}

/// Markdown-flavoured output for the terminal.
pub fn write_terminal(view: &RenderedView, out: &mut impl Write) -> io::Result<()> {
    match view {
        RenderedView::Articles {
            heading,
            articles,
            footer,
        } => {
            writeln!(out, "## {}", heading)?;
            writeln!(out)?;
            for article in articles {
                writeln!(out, "**Title:** {}", article.title)?;
                writeln!(out, "[Read more]({})", article.link)?;
                writeln!(out, "*Snippet:* {}", article.snippet)?;
                writeln!(out, "---")?;
            }
            writeln!(out, "{}", footer)
        }
        RenderedView::Warning { message } => writeln!(out, "WARNING: {}", message),
        RenderedView::Error { message } => writeln!(out, "ERROR: {}", message),
    }
}
