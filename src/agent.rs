//! # Agent Module
//!
//! [`ResearchAssistant`] ties the search client, the model and the report
//! writer together. It offers two entry points:
//!
//! - [`ResearchAssistant::research`]: one search, formatted into the fixed text report
//! - [`ResearchAssistant::research_with_agents`]: the Search → Draft → Finalize pipeline
//!
//! Batches go through [`ResearchAssistant::research_topics`], where each topic
//! succeeds or fails on its own.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::error::ResearchError;
use crate::llm::{LanguageModel, OllamaModel};
use crate::pipeline::{Query, ResearchPipeline};
use crate::report::{format_report, save_report, ReportFormat, StructuredReport};
use crate::search::{search_or_empty, SearchClient, SearchOptions, TavilyClient};

/// Which entry point produces the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResearchMode {
    /// Single search rendered with the fixed text layout
    #[default]
    Report,
    /// Search, then draft and finalize with the language model
    Agents,
}

/// Result of researching one topic in a batch.
#[derive(Debug)]
pub struct TopicOutcome {
    pub topic: String,
    pub result: Result<SavedReport, ResearchError>,
}

impl TopicOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A report that has been written to disk.
#[derive(Debug, Clone)]
pub struct SavedReport {
    pub path: PathBuf,
    pub contents: String,
}

/// Entry point used by the CLI.
///
/// Reports are written to `output_dir` as `{topic}_report.{ext}`; the topic is
/// sanitized first, see [`crate::report::report_filename`].
pub struct ResearchAssistant {
    search: Arc<dyn SearchClient>,
    pipeline: ResearchPipeline,
    search_options: SearchOptions,
    output_dir: PathBuf,
    format: ReportFormat,
}

impl ResearchAssistant {
    /// Build an assistant backed by Tavily and Ollama.
    pub fn new(config: &Config) -> Self {
        let search: Arc<dyn SearchClient> = Arc::new(
            TavilyClient::new(config.tavily_api_key.expose())
                .with_base_url(config.tavily_base_url.as_str()),
        );
        let model: Arc<dyn LanguageModel> = Arc::new(OllamaModel::new(
            &config.ollama_host,
            config.model.as_str(),
            config.temperature,
        ));

        Self::with_clients(config, search, model)
    }

    /// Build an assistant from explicit collaborators.
    pub fn with_clients(
        config: &Config,
        search: Arc<dyn SearchClient>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let search_options = config.search_options();
        let pipeline =
            ResearchPipeline::new(search.clone(), model).with_search_options(search_options.clone());

        Self {
            search,
            pipeline,
            search_options,
            output_dir: config.output_dir.clone(),
            format: config.report_format,
        }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Search once and render the results without the language model.
    pub async fn research(&self, query: &str) -> Result<String, ResearchError> {
        let query = Query::new(query)?;
        info!(query = %query, "Researching");

        let result = search_or_empty(self.search.as_ref(), query.as_str(), &self.search_options).await;

        match self.format {
            ReportFormat::Text => Ok(format_report(query.as_str(), &result.documents)),
            ReportFormat::Json => StructuredReport::from_search(query.as_str(), &result).to_json(),
        }
    }

    /// Run the Search → Draft → Finalize pipeline.
    pub async fn research_with_agents(&self, query: &str) -> Result<String, ResearchError> {
        let state = self.pipeline.execute(query).await?;

        match self.format {
            ReportFormat::Text => state.into_final_report(),
            ReportFormat::Json => {
                let search_result = state.search_result.clone().unwrap_or_default();
                let report = state.into_final_report()?;
                StructuredReport::from_search(query, &search_result)
                    .with_final_report(report)
                    .to_json()
            }
        }
    }

    /// Research one topic and save the report. Nothing is written on failure.
    pub async fn research_topic(
        &self,
        topic: &str,
        mode: ResearchMode,
    ) -> Result<SavedReport, ResearchError> {
        let contents = match mode {
            ResearchMode::Report => self.research(topic).await?,
            ResearchMode::Agents => self.research_with_agents(topic).await?,
        };

        let path = save_report(&self.output_dir, topic, self.format, &contents)?;
        Ok(SavedReport { path, contents })
    }

    /// Research topics one at a time. A failed topic does not stop the rest.
    pub async fn research_topics<S: AsRef<str>>(
        &self,
        topics: &[S],
        mode: ResearchMode,
    ) -> Vec<TopicOutcome> {
        let mut outcomes = Vec::with_capacity(topics.len());

        for topic in topics {
            let topic = topic.as_ref();
            let result = self.research_topic(topic, mode).await;

            if let Err(e) = &result {
                error!(topic = %topic, error = %e, "Research failed for topic");
            }

            outcomes.push(TopicOutcome {
                topic: topic.to_string(),
                result,
            });
        }

        outcomes
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use crate::llm::LlmError;
    use crate::pipeline::Stage;
    use crate::search::{SearchError, SearchResult, SourceDocument};
    use crate::stubs::{StubLanguageModel, StubSearchClient};

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            tavily_api_key: ApiKey::new("test"),
            output_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn one_source() -> SearchResult {
        SearchResult::new(
            vec![SourceDocument::new("NASA Plans", Some("http://nasa.gov"), "A".repeat(50))],
            "",
        )
    }

    #[tokio::test]
    async fn test_research_formats_search_results() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = ResearchAssistant::with_clients(
            &config_in(dir.path()),
            Arc::new(StubSearchClient::returning(one_source())),
            Arc::new(StubLanguageModel::default()),
        );

        let report = assistant.research("Space Exploration 2025").await.unwrap();

        assert!(report.contains("Research Report on: SPACE EXPLORATION 2025"));
        assert!(report.contains("Found 1 relevant sources"));
    }

    #[tokio::test]
    async fn test_research_reports_no_results_on_search_failure() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = ResearchAssistant::with_clients(
            &config_in(dir.path()),
            Arc::new(StubSearchClient::failing(SearchError::Timeout)),
            Arc::new(StubLanguageModel::default()),
        );

        let report = assistant.research("X").await.unwrap();

        assert_eq!(report, "No results found for: X");
    }

    #[tokio::test]
    async fn test_research_json_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            report_format: ReportFormat::Json,
            ..config_in(dir.path())
        };
        let assistant = ResearchAssistant::with_clients(
            &config,
            Arc::new(StubSearchClient::returning(one_source())),
            Arc::new(StubLanguageModel::with_responses(["draft", "final"])),
        );

        let json: serde_json::Value =
            serde_json::from_str(&assistant.research_with_agents("Space").await.unwrap()).unwrap();

        assert_eq!(json["source_count"], 1);
        assert_eq!(json["final_report"], "final");
    }

    #[tokio::test]
    async fn test_failed_topic_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = ResearchAssistant::with_clients(
            &config_in(dir.path()),
            Arc::new(StubSearchClient::returning(one_source())),
            Arc::new(StubLanguageModel::failing_on_call(
                0,
                LlmError::Completion("offline".into()),
            )),
        );

        let err = assistant
            .research_topic("Space Exploration 2025", ResearchMode::Agents)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Draft));
        assert!(!dir.path().join("Space_Exploration_2025_report.txt").exists());
    }

    #[tokio::test]
    async fn test_topic_with_path_separators_saves_inside_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        let assistant = ResearchAssistant::with_clients(
            &config_in(&out),
            Arc::new(StubSearchClient::returning(one_source())),
            Arc::new(StubLanguageModel::default()),
        );

        let saved = assistant
            .research_topic("../AI/ML", ResearchMode::Report)
            .await
            .unwrap();

        assert_eq!(saved.path, out.join("___AI_ML_report.txt"));
        assert!(saved.path.exists());
        assert!(!root.path().join("AI").exists());
    }

    #[tokio::test]
    async fn test_research_topics_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        // The first topic's draft fails; the second topic gets both responses.
        let model = StubLanguageModel::with_responses(["draft", "final"])
            .fail_on_call(0, LlmError::Completion("offline".into()));
        let assistant = ResearchAssistant::with_clients(
            &config_in(dir.path()),
            Arc::new(StubSearchClient::returning(one_source())),
            Arc::new(model),
        );

        let outcomes = assistant
            .research_topics(&["First Topic", "Second Topic"], ResearchMode::Agents)
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_success());
        assert!(outcomes[1].is_success());

        let saved = outcomes[1].result.as_ref().unwrap();
        assert_eq!(saved.contents, "final");
        assert_eq!(saved.path, dir.path().join("Second_Topic_report.txt"));
        assert!(!dir.path().join("First_Topic_report.txt").exists());
    }
}
