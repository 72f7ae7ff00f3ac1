//! Search → Draft → Finalize workflow.
//!
//! ```text
//! Start ──search──▶ Searched ──draft──▶ Drafted ──finalize──▶ Finalized
//! ```
//!
//! Each stage reads the state produced so far and returns a [`StageUpdate`].
//! [`PipelineState::apply_update`] consumes the old state and returns the next
//! one, refusing updates that arrive out of order or would overwrite a field.
//!
//! Failure policy differs per stage: the search stage never fails (provider
//! errors degrade to an empty source list) while a model failure in draft or
//! finalize aborts the run with [`ResearchError::GenerationFailure`].
//!
//! A run that ends up with no sources says so: both prompts carry
//! `No results found for: {query}` in place of the source list, and the
//! final report starts with the same line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ResearchError;
use crate::llm::LanguageModel;
use crate::prompts::{sources_summary, ReportPrompts};
use crate::report::no_results_message;
use crate::search::{search_or_empty, SearchClient, SearchOptions, SearchResult};

/// A non-empty research topic.
///
/// Deserialization goes through [`Query::new`], so a stored state can never
/// carry a blank query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query(String);

impl Query {
    pub fn new(query: impl Into<String>) -> Result<Self, ResearchError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ResearchError::EmptyQuery);
        }
        Ok(Self(query))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Query {
    type Error = ResearchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Query::new(value)
    }
}

impl From<Query> for String {
    fn from(query: Query) -> Self {
        query.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Search,
    Draft,
    Finalize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Search => "search",
            Stage::Draft => "draft",
            Stage::Finalize => "finalize",
        }
    }

    /// The stage that runs after this one, if any
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Search => Some(Stage::Draft),
            Stage::Draft => Some(Stage::Finalize),
            Stage::Finalize => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a [`PipelineState`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Start,
    Searched,
    Drafted,
    Finalized,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Finalized)
    }
}

/// Output of a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageUpdate {
    Searched(SearchResult),
    Drafted(String),
    Finalized(String),
}

impl StageUpdate {
    pub fn stage(&self) -> Stage {
        match self {
            StageUpdate::Searched(_) => Stage::Search,
            StageUpdate::Drafted(_) => Stage::Draft,
            StageUpdate::Finalized(_) => Stage::Finalize,
        }
    }
}

/// The record threaded through the workflow.
///
/// Fields fill in strictly in stage order; [`PipelineState::phase`] is derived
/// from which of them are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub query: Query,
    pub search_result: Option<SearchResult>,
    pub draft: Option<String>,
    pub final_report: Option<String>,
}

impl PipelineState {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            search_result: None,
            draft: None,
            final_report: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.final_report.is_some() {
            Phase::Finalized
        } else if self.draft.is_some() {
            Phase::Drafted
        } else if self.search_result.is_some() {
            Phase::Searched
        } else {
            Phase::Start
        }
    }

    /// Merge a stage's output into the state.
    ///
    /// An update is only accepted when the state is exactly one stage behind it.
    pub fn apply_update(self, update: StageUpdate) -> Result<Self, ResearchError> {
        let stage = update.stage();
        let expected = match stage {
            Stage::Search => Phase::Start,
            Stage::Draft => Phase::Searched,
            Stage::Finalize => Phase::Drafted,
        };
        if self.phase() != expected {
            return Err(ResearchError::StageOrder {
                stage,
                field: Self::prerequisite(stage),
            });
        }

        Ok(match update {
            StageUpdate::Searched(result) => Self {
                search_result: Some(result),
                ..self
            },
            StageUpdate::Drafted(draft) => Self {
                draft: Some(draft),
                ..self
            },
            StageUpdate::Finalized(report) => Self {
                final_report: Some(report),
                ..self
            },
        })
    }

    /// Extract the final report, discarding the rest of the state.
    pub fn into_final_report(self) -> Result<String, ResearchError> {
        self.final_report.ok_or(ResearchError::StageOrder {
            stage: Stage::Finalize,
            field: "final_report",
        })
    }

    fn prerequisite(stage: Stage) -> &'static str {
        match stage {
            Stage::Search => "a fresh state",
            Stage::Draft => "search_result",
            Stage::Finalize => "draft",
        }
    }

    fn search_result_for(&self, stage: Stage) -> Result<&SearchResult, ResearchError> {
        self.search_result
            .as_ref()
            .ok_or(ResearchError::StageOrder {
                stage,
                field: "search_result",
            })
    }

    /// Source list as embedded in the prompts.
    ///
    /// Falls back to the no-results statement when search came back empty.
    fn sources_for(&self, stage: Stage) -> Result<String, ResearchError> {
        let search_result = self.search_result_for(stage)?;
        if search_result.is_empty() {
            Ok(no_results_message(self.query.as_str()))
        } else {
            Ok(sources_summary(&search_result.documents))
        }
    }
}

/// The Search → Draft → Finalize pipeline.
///
/// Holds the two external collaborators behind trait objects so tests can
/// swap in [`crate::stubs`]. One pipeline may run any number of queries; each
/// run starts from a fresh [`PipelineState`].
pub struct ResearchPipeline {
    search: Arc<dyn SearchClient>,
    model: Arc<dyn LanguageModel>,
    search_options: SearchOptions,
}

impl ResearchPipeline {
    pub fn new(search: Arc<dyn SearchClient>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            search,
            model,
            search_options: SearchOptions::default(),
        }
    }

    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.search_options = options;
        self
    }

    pub fn search_options(&self) -> &SearchOptions {
        &self.search_options
    }

    /// Run all three stages and return the final report.
    pub async fn run(&self, query: &str) -> Result<String, ResearchError> {
        self.execute(query).await?.into_final_report()
    }

    /// Run all three stages and return the terminal state.
    pub async fn execute(&self, query: &str) -> Result<PipelineState, ResearchError> {
        let query = Query::new(query)?;
        info!(query = %query, "Starting research pipeline");

        let mut state = PipelineState::new(query);
        let mut next = Some(Stage::Search);

        while let Some(stage) = next {
            let update = self.run_stage(stage, &state).await?;
            state = state.apply_update(update)?;
            next = stage.next();
        }

        info!(query = %state.query, "Research pipeline finished");
        Ok(state)
    }

    /// Run one stage against `state` without applying its output.
    pub async fn run_stage(
        &self,
        stage: Stage,
        state: &PipelineState,
    ) -> Result<StageUpdate, ResearchError> {
        info!(stage = %stage, query = %state.query, "Running stage");
        match stage {
            Stage::Search => Ok(self.search_stage(state).await),
            Stage::Draft => self.draft_stage(state).await,
            Stage::Finalize => self.finalize_stage(state).await,
        }
    }

    async fn search_stage(&self, state: &PipelineState) -> StageUpdate {
        let result =
            search_or_empty(self.search.as_ref(), state.query.as_str(), &self.search_options).await;
        StageUpdate::Searched(result)
    }

    async fn draft_stage(&self, state: &PipelineState) -> Result<StageUpdate, ResearchError> {
        let sources = state.sources_for(Stage::Draft)?;
        let prompt = ReportPrompts::draft(state.query.as_str(), &sources);

        let draft = self.generate(Stage::Draft, &prompt).await?;
        Ok(StageUpdate::Drafted(draft))
    }

    async fn finalize_stage(&self, state: &PipelineState) -> Result<StageUpdate, ResearchError> {
        let draft = state.draft.as_deref().ok_or(ResearchError::StageOrder {
            stage: Stage::Finalize,
            field: "draft",
        })?;
        let sources = state.sources_for(Stage::Finalize)?;
        let prompt = ReportPrompts::finalize(draft, &sources);

        let report = self.generate(Stage::Finalize, &prompt).await?;

        if state.search_result_for(Stage::Finalize)?.is_empty() {
            info!(query = %state.query, "No sources found, marking final report");
            let header = no_results_message(state.query.as_str());
            return Ok(StageUpdate::Finalized(format!("{}\n\n{}", header, report)));
        }
        Ok(StageUpdate::Finalized(report))
    }

    async fn generate(&self, stage: Stage, prompt: &str) -> Result<String, ResearchError> {
        debug!(stage = %stage, model = self.model.name(), prompt = %prompt, "Prompting model");

        self.model
            .generate(prompt)
            .await
            .map_err(|source| ResearchError::GenerationFailure { stage, source })
    }
}
