//! # Research Assistant CLI
//!
//! Researches each topic in turn and writes one report file per topic.
//!
//! ```bash
//! # Formatted search report for the default topics
//! research-assistant
//!
//! # Search, draft and finalize with the local model
//! research-assistant --agents "Space Exploration 2025"
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use research_assistant::report::preview;
use research_assistant::{Config, ReportFormat, ResearchAssistant, ResearchMode};

/// Topics researched when none are given on the command line
const DEFAULT_TOPICS: [&str; 3] = [
    "Artificial Intelligence Ethics",
    "Climate Change Solutions",
    "Space Exploration 2025",
];

/// Characters of each report echoed to the console
const PREVIEW_CHARS: usize = 500;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "research-assistant",
    version,
    about = "Searches the web with Tavily and writes a research report per topic",
    long_about = r#"
Research Assistant - web search plus optional LLM report writing.

For every topic it will:
  1. Search the web with Tavily (TAVILY_API_KEY must be set)
  2. Either format the results into a fixed text report, or (with --agents)
     draft and refine a report with a local Ollama model
  3. Save the report as {topic_with_underscores}_report.txt

EXAMPLES:
  research-assistant "Rust async runtimes"
  research-assistant --agents --model llama3.2 "Space Exploration 2025"
  research-assistant --json --output-dir reports "Climate Change Solutions"
"#
)]
struct Args {
    /// Topics to research (defaults to three sample topics)
    #[arg(value_name = "TOPIC")]
    topics: Vec<String>,

    /// Draft and finalize the report with the language model
    #[arg(short = 'a', long = "agents")]
    agents: bool,

    /// Write structured JSON instead of the text report
    #[arg(long = "json")]
    json: bool,

    /// The Ollama model to use (overrides OLLAMA_MODEL env var)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// Directory reports are written to (overrides REPORT_DIR)
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    output_dir: Option<std::path::PathBuf>,

    /// Enable verbose/debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Args {
    fn topics(&self) -> Vec<String> {
        if self.topics.is_empty() {
            DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
        } else {
            self.topics.clone()
        }
    }

    fn mode(&self) -> ResearchMode {
        if self.agents {
            ResearchMode::Agents
        } else {
            ResearchMode::Report
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;

    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if args.json {
        config.report_format = ReportFormat::Json;
    }

    init_logging(&config.log_level, args.verbose)?;
    config.validate()?;

    info!(
        model = %config.model,
        host = %config.ollama_host,
        depth = %config.search_depth,
        "Configuration loaded"
    );

    let assistant = ResearchAssistant::new(&config);
    let topics = args.topics();
    let mut failures = 0;

    for topic in &topics {
        println!("\n\nNEW RESEARCH TOPIC: {}", topic);
        println!("{}", "=".repeat(50));

        match assistant.research_topic(topic, args.mode()).await {
            Ok(saved) => {
                println!("Report saved to {}", saved.path.display());
                println!("\nREPORT PREVIEW:");
                println!("{}\n", preview(&saved.contents, PREVIEW_CHARS));
            }
            Err(e) => {
                failures += 1;
                tracing::error!(topic = %topic, error = %e, "Research failed");
                eprintln!("Research failed for '{}': {}", topic, e);
                if e.is_generation_failure() {
                    eprintln!("Tip: make sure Ollama is running (ollama serve) and the model is pulled.");
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} topics failed", failures, topics.len());
    }

    info!("Research completed successfully");
    Ok(())
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
fn init_logging(log_level: &str, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
