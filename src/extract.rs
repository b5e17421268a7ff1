//! Recovering the `news_articles` document from a model reply.
//!
//! Models wrap JSON in Markdown fences, prefix it with a language label, or
//! surround it with prose. Extraction tries, in order: the reply as-is, the
//! body of the first code fence found anywhere in the reply, and the first
//! complete object or array embedded in the text. Only when all three fail is
//! the reply rejected.

use crate::error::PipelineError;
use crate::models::{NewsArticle, NewsDigest};
use crate::tools::is_web_link;
use serde_json::Value;
use tracing::warn;

/// Returns the first candidate payload that parses as JSON.
///
/// The error names the most specific candidate that failed: the fenced block
/// when there is one, then the embedded document, then the reply itself.
pub fn extract_json_payload(reply: &str) -> Result<Value, String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err("reply was empty".to_string());
    }

    let direct_error = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    let mut fence_error = None;
    if let Some(body) = fenced_block(trimmed) {
        match serde_json::from_str(body) {
            Ok(value) => return Ok(value),
            Err(e) => fence_error = Some(format!("fenced block is not valid JSON: {}", e)),
        }
    }

    let embedded_error = match first_embedded_value(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    Err(fence_error.or(embedded_error).unwrap_or(direct_error))
}

/// Body of the first Markdown code fence, wherever it sits in the text, with
/// a language label such as `json` removed. An unterminated fence runs to the
/// end of the text.
pub fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(strip_label(body.trim()))
}

fn strip_label(body: &str) -> &str {
    let label_len = body
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric())
        .map(|(idx, _)| idx)
        .unwrap_or(body.len());

    if label_len == 0 {
        return body;
    }

    let rest = body[label_len..].trim_start();
    if rest.starts_with('{') || rest.starts_with('[') {
        rest
    } else {
        body
    }
}

/// Parses one value starting at each `{` or `[` in turn, ignoring whatever
/// follows it, and keeps the first object or array of objects. Prose brackets
/// such as `[3 found]` are skipped. `Err(None)` means no bracket parsed at all.
fn first_embedded_value(text: &str) -> Result<Value, Option<String>> {
    let mut first_error = None;
    for (start, _) in text.match_indices(|c: char| c == '{' || c == '[') {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if is_document(&value) => return Ok(value),
            Some(Ok(_)) | None => {}
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| format!("no complete JSON document: {}", e));
            }
        }
    }
    Err(first_error)
}

fn is_document(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().all(Value::is_object),
        _ => false,
    }
}

/// Turns a structuring reply into validated articles.
///
/// Entries without a title or with a non-http link are dropped, and the list
/// is capped at `max_articles` (the number of search results that went in).
pub fn parse_news_articles(
    reply: &str,
    max_articles: usize,
) -> Result<Vec<NewsArticle>, PipelineError> {
    let payload =
        extract_json_payload(reply).map_err(|reason| PipelineError::structuring(reason, reply))?;

    let digest: NewsDigest = serde_json::from_value(payload).map_err(|e| {
        PipelineError::structuring(format!("unexpected JSON shape: {}", e), reply)
    })?;

    let mut articles = Vec::new();
    for article in digest.into_articles() {
        let article = NewsArticle {
            title: article.title.trim().to_string(),
            link: article.link.trim().to_string(),
            snippet: article.snippet.trim().to_string(),
        };

        if article.title.is_empty() || !is_web_link(&article.link) {
            warn!(title = %article.title, link = %article.link, "Dropping invalid article");
            continue;
        }
        articles.push(article);
    }

    if articles.len() > max_articles {
        warn!(
            returned = articles.len(),
            max_articles, "Model returned more articles than were searched"
        );
        articles.truncate(max_articles);
    }

    if articles.is_empty() {
        return Err(PipelineError::structuring(
            "no article with a title and a valid link",
            reply,
        ));
    }

    Ok(articles)
}
