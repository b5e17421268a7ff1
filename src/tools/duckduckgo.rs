use super::{is_web_link, SearchProvider, SearchRequest};
use crate::config::{SafeSearch, TimeWindow};
use crate::models::RawResult;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Text search against the DuckDuckGo HTML endpoint. Needs no API key.
pub struct DuckDuckGoSearch {
    base_url: String,
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build DuckDuckGo HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawResult>> {
        let form = [
            ("q", request.query.as_str()),
            ("kl", request.region.as_str()),
            ("kp", safesearch_param(request.safesearch)),
            ("df", time_window_param(request.time_window)),
        ];
        debug!(?form, "DuckDuckGo request");

        let response = self
            .client
            .post(format!("{}/html/", self.base_url))
            .header("Accept", "text/html")
            .form(&form)
            .send()
            .await
            .context("DuckDuckGo request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("DuckDuckGo search error: {}", status);
        }

        let body = response
            .text()
            .await
            .context("Failed to read DuckDuckGo response")?;

        let results = parse_results(&body, request.max_results)?;
        info!(query = %request.query, count = results.len(), "DuckDuckGo search complete");
        Ok(results)
    }
}

fn safesearch_param(level: SafeSearch) -> &'static str {
    match level {
        SafeSearch::Strict => "1",
        SafeSearch::Moderate => "-1",
        SafeSearch::Off => "-2",
    }
}

fn time_window_param(window: TimeWindow) -> &'static str {
    match window {
        TimeWindow::Day => "d",
        TimeWindow::Week => "w",
        TimeWindow::Month => "m",
        TimeWindow::Year => "y",
    }
}

// `Html` is !Send, so parsing stays in a sync fn that never crosses an await.
fn parse_results(body: &str, max_results: usize) -> Result<Vec<RawResult>> {
    let document = Html::parse_document(body);
    let result_sel = selector(".result")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let results = document
        .select(&result_sel)
        .filter(|el| {
            !el.value()
                .classes()
                .any(|class| class == "result--ad" || class == "result--no-result")
        })
        .filter_map(|el| {
            let anchor = el.select(&link_sel).next()?;
            let title = collapse_whitespace(&anchor.text().collect::<String>());
            let link = decode_redirect(anchor.value().attr("href").unwrap_or_default());
            let snippet = el
                .select(&snippet_sel)
                .next()
                .map(|s| collapse_whitespace(&s.text().collect::<String>()))
                .unwrap_or_default();

            if title.is_empty() || !is_web_link(&link) {
                return None;
            }
            Some(RawResult { title, link, snippet })
        })
        .take(max_results)
        .collect();

    Ok(results)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))
}

/// Result links come wrapped as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
fn decode_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    url::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
