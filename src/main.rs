use anyhow::Result;
use clap::{Parser, Subcommand};
use newsdesk::progress::{LoggingObserver, StageEvent, StageObserver};
use newsdesk::render::{empty_topic, render, write_terminal};
use newsdesk::{server, NewsConfig, NewsWorkflow, Settings};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "newsdesk", version, about = "Fetch, rewrite and structure recent news on a topic")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the news page and JSON API (default)
    Serve,
    /// Run the pipeline once and print the articles
    Fetch {
        /// Free-text topic, e.g. "AI in Mexico"
        topic: String,
    },
}

/// Prints the spinner label on stderr so stdout stays clean for the articles.
struct TerminalObserver;

impl StageObserver for TerminalObserver {
    fn on_stage(&self, event: &StageEvent) {
        LoggingObserver.on_stage(event);
        eprintln!("[{}] {}", event.stage, event.label());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("newsdesk=debug,graph_flow=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match NewsConfig::from_settings(cli.settings) {
        Ok(config) => config,
        Err(e) => {
            error!(%e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let workflow = Arc::new(NewsWorkflow::from_config(&config)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(config.bind, workflow).await,
        Command::Fetch { topic } => fetch_once(&workflow, &topic).await,
    }
}

async fn fetch_once(workflow: &NewsWorkflow, topic: &str) -> Result<()> {
    let topic = topic.trim();
    if topic.is_empty() {
        write_terminal(&empty_topic(), &mut std::io::stdout().lock())?;
        anyhow::bail!("No topic given");
    }

    let run = workflow.run(topic, &TerminalObserver).await;
    info!(
        total_time_ms = run.total_time_ms,
        stage_times = ?run.stage_times_ms,
        "Fetch finished"
    );

    write_terminal(&render(&run.result), &mut std::io::stdout().lock())?;

    if run.result.is_failure() {
        anyhow::bail!("News workflow failed");
    }
    Ok(())
}
