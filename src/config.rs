use crate::error::ConfigError;
use clap::{Args, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MAX_RESULTS: usize = 7;
const MAX_RESULTS_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchBackend {
    Duckduckgo,
    Tavily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SafeSearch {
    Strict,
    Moderate,
    Off,
}

/// How far back the search provider should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeWindow {
    #[value(name = "d")]
    Day,
    #[value(name = "w")]
    Week,
    #[value(name = "m")]
    Month,
    #[value(name = "y")]
    Year,
}

impl TimeWindow {
    pub fn days(self) -> u32 {
        match self {
            TimeWindow::Day => 1,
            TimeWindow::Week => 7,
            TimeWindow::Month => 30,
            TimeWindow::Year => 365,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tone {
    Professional,
    Humorous,
}

/// Editorial runs search → rewrite → structure; direct hands the raw
/// search text straight to the structuring model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PipelineMode {
    Editorial,
    Direct,
}

/// Raw settings as read from flags and environment.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Chat model used by the rewrite and structuring agents
    #[arg(long, env = "OPENAI_MODEL_NAME")]
    pub model: Option<String>,

    #[arg(long, env = "NEWSDESK_SEARCH_PROVIDER", value_enum, default_value = "duckduckgo")]
    pub search_provider: SearchBackend,

    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    pub tavily_api_key: Option<String>,

    /// Maximum number of search results fed into the pipeline
    #[arg(long, env = "NEWSDESK_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,

    #[arg(long, env = "NEWSDESK_REGION", default_value = "wt-wt")]
    pub region: String,

    #[arg(long, env = "NEWSDESK_SAFESEARCH", value_enum, default_value = "moderate")]
    pub safesearch: SafeSearch,

    #[arg(long, env = "NEWSDESK_TIME_WINDOW", value_enum, default_value = "w")]
    pub time_window: TimeWindow,

    #[arg(long, env = "NEWSDESK_TONE", value_enum, default_value = "professional")]
    pub tone: Tone,

    #[arg(long, env = "NEWSDESK_MODE", value_enum, default_value = "editorial")]
    pub mode: PipelineMode,

    /// Upper bound for every outbound search or model call
    #[arg(long, env = "NEWSDESK_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, env = "NEWSDESK_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub backend: SearchBackend,
    pub max_results: usize,
    pub region: String,
    pub safesearch: SafeSearch,
    pub time_window: TimeWindow,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            backend: SearchBackend::Duckduckgo,
            max_results: DEFAULT_MAX_RESULTS,
            region: "wt-wt".to_string(),
            safesearch: SafeSearch::Moderate,
            time_window: TimeWindow::Week,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub search: SearchOptions,
    pub tone: Tone,
    pub mode: PipelineMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            tone: Tone::Professional,
            mode: PipelineMode::Editorial,
        }
    }
}

/// Validated, read-only configuration established once at startup.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub openai_api_key: String,
    pub model: String,
    pub tavily_api_key: Option<String>,
    pub pipeline: PipelineOptions,
    pub timeout: Duration,
    pub bind: SocketAddr,
}

impl NewsConfig {
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let openai_api_key =
            non_blank(settings.openai_api_key).ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let model = non_blank(settings.model).ok_or(ConfigError::Missing("OPENAI_MODEL_NAME"))?;

        let tavily_api_key = non_blank(settings.tavily_api_key);
        if settings.search_provider == SearchBackend::Tavily && tavily_api_key.is_none() {
            return Err(ConfigError::Missing("TAVILY_API_KEY"));
        }

        if settings.max_results == 0 || settings.max_results > MAX_RESULTS_LIMIT {
            return Err(ConfigError::Invalid {
                name: "NEWSDESK_MAX_RESULTS",
                reason: format!("must be between 1 and {}", MAX_RESULTS_LIMIT),
            });
        }

        if settings.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "NEWSDESK_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            openai_api_key,
            model,
            tavily_api_key,
            pipeline: PipelineOptions {
                search: SearchOptions {
                    backend: settings.search_provider,
                    max_results: settings.max_results,
                    region: settings.region,
                    safesearch: settings.safesearch,
                    time_window: settings.time_window,
                },
                tone: settings.tone,
                mode: settings.mode,
            },
            timeout: Duration::from_secs(settings.timeout_secs),
            bind: settings.bind,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
