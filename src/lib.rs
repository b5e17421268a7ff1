pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod progress;
pub mod render;
pub mod server;
pub mod tasks;
pub mod tools;
pub mod workflow;

pub use config::{NewsConfig, PipelineMode, PipelineOptions, SearchOptions, Settings, Tone};
pub use error::PipelineError;
pub use models::{NewsArticle, RawResult, Stage, WorkflowResult, WorkflowRun};
pub use workflow::NewsWorkflow;
