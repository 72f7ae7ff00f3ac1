//! # Research Assistant
//!
//! Researches a topic by searching the web with Tavily and, optionally,
//! drafting and refining a report with a local LLM served by Ollama.
//!
//! ```text
//! query ──▶ search ──▶ draft ──▶ finalize ──▶ report file
//! ```
//!
//! ## Quick Start
//! ```bash
//! TAVILY_API_KEY=tvly-... cargo run -- --agents "Space Exploration 2025"
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod search;
pub mod stubs;

pub use agent::{ResearchAssistant, ResearchMode, SavedReport, TopicOutcome};
pub use config::{ApiKey, Config};
pub use error::ResearchError;
pub use llm::{LanguageModel, LlmError, OllamaModel};
pub use pipeline::{Phase, PipelineState, Query, ResearchPipeline, Stage, StageUpdate};
pub use report::{format_report, report_filename, save_report, ReportFormat, StructuredReport};
pub use search::{
    search_or_empty, SearchClient, SearchDepth, SearchError, SearchOptions, SearchResult,
    SourceDocument, TavilyClient,
};
