//! # Search Module
//!
//! Web search through the Tavily Search API.
//!
//! - [`SearchClient`] is the seam the pipeline depends on
//! - [`TavilyClient`] is the production adapter
//! - [`search_or_empty`] applies the fail-soft policy: provider errors are
//!   logged as a `search_failure` event and replaced with an empty result

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Placeholder rendered for documents without a URL
pub const NO_URL_PLACEHOLDER: &str = "No URL available";

/// Default Tavily endpoint
pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";

/// Default number of results requested per search
pub const DEFAULT_MAX_RESULTS: usize = 5;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// ERRORS
// =============================================================================
/// Typed errors for the Tavily API.
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized - check TAVILY_API_KEY")]
    Unauthorized,

    #[error("Rate limited - too many requests")]
    RateLimited,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("HTTP error ({0}): {1}")]
    HttpError(u16, String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

// =============================================================================
// DATA MODEL
// =============================================================================
/// One search-result item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub title: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub content: String,
}

impl SourceDocument {
    pub fn new(title: impl Into<String>, url: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.map(str::to_string),
            content: content.into(),
        }
    }

    /// The URL, or [`NO_URL_PLACEHOLDER`] when the provider sent none.
    pub fn url_or_placeholder(&self) -> &str {
        self.url.as_deref().unwrap_or(NO_URL_PLACEHOLDER)
    }
}

/// Ranked documents plus the provider's synthesized answer (may be empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub documents: Vec<SourceDocument>,
    pub answer: String,
}

impl SearchResult {
    pub fn new(documents: Vec<SourceDocument>, answer: impl Into<String>) -> Self {
        Self {
            documents,
            answer: answer.into(),
        }
    }

    /// The degraded result substituted when a search fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// How thoroughly Tavily searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(SearchDepth::Basic),
            "advanced" => Ok(SearchDepth::Advanced),
            other => Err(format!("unknown search depth '{}' (expected basic or advanced)", other)),
        }
    }
}

/// Per-call search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Always at least 1
    pub max_results: usize,
    pub depth: SearchDepth,
    pub include_domains: Option<Vec<String>>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            depth: SearchDepth::default(),
            include_domains: None,
        }
    }
}

impl SearchOptions {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_depth(mut self, depth: SearchDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = if domains.is_empty() { None } else { Some(domains) };
        self
    }
}

// =============================================================================
// SEARCH CLIENT TRAIT
// =============================================================================
/// A web search provider.
///
/// Implementations report provider failures as errors; callers that want the
/// fail-soft behaviour go through [`search_or_empty`].
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, SearchError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Run a search, substituting an empty result on any provider failure.
pub async fn search_or_empty(
    client: &dyn SearchClient,
    query: &str,
    options: &SearchOptions,
) -> SearchResult {
    match client.search(query, options).await {
        Ok(result) => {
            info!(
                query = %query,
                provider = client.name(),
                count = result.documents.len(),
                "Search completed"
            );
            result
        }
        Err(e) => {
            warn!(
                event = "search_failure",
                query = %query,
                provider = client.name(),
                error = %e,
                "Search failed, continuing with no sources"
            );
            SearchResult::empty()
        }
    }
}

// =============================================================================
// TAVILY ADAPTER
// =============================================================================
/// Request body for `POST /search`
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: SearchDepth,
    include_answer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_domains: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,

    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,

    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    content: String,
}

impl From<TavilyResult> for SourceDocument {
    fn from(r: TavilyResult) -> Self {
        Self {
            title: r.title,
            url: r.url,
            content: r.content,
        }
    }
}

/// Tavily Search API client.
///
/// The API key is passed in explicitly; nothing is read from process globals.
pub struct TavilyClient {
    api_key: String,
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: DEFAULT_TAVILY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Point the client at another endpoint (a proxy, or a mock server in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, request: &TavilyRequest<'_>) -> Result<TavilyResponse, SearchError> {
        let url = format!("{}/search", self.base_url);
        debug!(url = %url, depth = %request.search_depth, "Sending Tavily request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else if e.is_connect() {
                    SearchError::Connection(e.to_string())
                } else {
                    SearchError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| SearchError::ParseError(e.to_string()));
        }

        let error_text = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(SearchError::Unauthorized),
            429 => Err(SearchError::RateLimited),
            400 => Err(SearchError::BadRequest(error_text)),
            500..=599 => Err(SearchError::ServerError(status.as_u16(), error_text)),
            _ => Err(SearchError::HttpError(status.as_u16(), error_text)),
        }
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::BadRequest("query must not be empty".to_string()));
        }

        let request = TavilyRequest {
            query,
            max_results: options.max_results.max(1),
            search_depth: options.depth,
            include_answer: true,
            include_domains: options
                .include_domains
                .as_deref()
                .filter(|domains| !domains.is_empty()),
        };

        let response = self.execute(&request).await?;

        Ok(SearchResult {
            documents: response.results.into_iter().map(SourceDocument::from).collect(),
            answer: response.answer.unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        "tavily"
    }
}
