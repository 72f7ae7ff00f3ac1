//! # Configuration Module
//!
//! Runtime configuration loaded from environment variables (and `.env`).
//! The Tavily API key has no default and must be supplied at runtime.

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::report::ReportFormat;
use crate::search::{SearchDepth, SearchOptions, DEFAULT_MAX_RESULTS, DEFAULT_TAVILY_URL};

/// A secret that never appears in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for the research assistant.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tavily credential (`TAVILY_API_KEY`)
    pub tavily_api_key: ApiKey,

    /// Tavily endpoint, overridable for proxies and tests
    pub tavily_base_url: String,

    /// The Ollama model to use (e.g., "llama2", "llama3.2")
    pub model: String,

    /// Ollama server URL (default: http://localhost:11434)
    pub ollama_host: String,

    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Results requested per search
    pub max_search_results: usize,

    pub search_depth: SearchDepth,

    /// Restrict searches to these domains when set
    pub include_domains: Option<Vec<String>>,

    /// Directory reports are written to
    pub output_dir: PathBuf,

    pub report_format: ReportFormat,

    /// Log filter directive for the application
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tavily_api_key: ApiKey::default(),
            tavily_base_url: DEFAULT_TAVILY_URL.to_string(),
            model: "llama2".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            temperature: 0.7,
            max_search_results: DEFAULT_MAX_RESULTS,
            search_depth: SearchDepth::Advanced,
            include_domains: None,
            output_dir: PathBuf::from("."),
            report_format: ReportFormat::Text,
            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        let api_key = lookup("TAVILY_API_KEY")
            .context("TAVILY_API_KEY must be set (get a key at https://tavily.com)")?;
        config.tavily_api_key = ApiKey::new(api_key);

        if let Some(val) = lookup("TAVILY_API_URL") {
            config.tavily_base_url = val;
        }

        if let Some(val) = lookup("OLLAMA_MODEL") {
            config.model = val;
        }

        if let Some(val) = lookup("OLLAMA_API_BASE_URL") {
            config.ollama_host = val;
        }

        if let Some(val) = lookup("TEMPERATURE") {
            config.temperature = val
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        if let Some(val) = lookup("MAX_SEARCH_RESULTS") {
            config.max_search_results = val
                .parse()
                .context("MAX_SEARCH_RESULTS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("SEARCH_DEPTH") {
            config.search_depth = val
                .parse()
                .map_err(anyhow::Error::msg)
                .context("SEARCH_DEPTH must be 'basic' or 'advanced'")?;
        }

        if let Some(val) = lookup("INCLUDE_DOMAINS") {
            config.include_domains = parse_domains(&val);
        }

        if let Some(val) = lookup("REPORT_DIR") {
            config.output_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Validate the configuration before any network call is made.
    pub fn validate(&self) -> Result<()> {
        if self.tavily_api_key.is_empty() {
            anyhow::bail!("TAVILY_API_KEY cannot be empty");
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.max_search_results == 0 {
            anyhow::bail!("MAX_SEARCH_RESULTS must be at least 1");
        }

        if self.model.is_empty() {
            anyhow::bail!("OLLAMA_MODEL cannot be empty");
        }

        Ok(())
    }

    /// Search options derived from this configuration.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::default()
            .with_max_results(self.max_search_results)
            .with_depth(self.search_depth)
            .with_include_domains(self.include_domains.clone().unwrap_or_default())
    }
}

fn parse_domains(raw: &str) -> Option<Vec<String>> {
    let domains: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();

    if domains.is_empty() {
        None
    } else {
        Some(domains)
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.model, "llama2");
        assert_eq!(config.ollama_host, "http://localhost:11434");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.max_search_results, 5);
        assert_eq!(config.search_depth, SearchDepth::Advanced);
        assert_eq!(config.tavily_base_url, "https://api.tavily.com");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[("OLLAMA_MODEL", "llama3.2")]));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TAVILY_API_KEY", "tvly-test"),
            ("OLLAMA_MODEL", "llama3.2"),
            ("TEMPERATURE", "0.2"),
            ("MAX_SEARCH_RESULTS", "8"),
            ("SEARCH_DEPTH", "basic"),
            ("INCLUDE_DOMAINS", "nasa.gov, esa.int,,"),
            ("REPORT_DIR", "/tmp/reports"),
        ]))
        .unwrap();

        assert_eq!(config.tavily_api_key.expose(), "tvly-test");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.max_search_results, 8);
        assert_eq!(config.search_depth, SearchDepth::Basic);
        assert_eq!(
            config.include_domains,
            Some(vec!["nasa.gov".to_string(), "esa.int".to_string()])
        );
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));

        let options = config.search_options();
        assert_eq!(options.max_results, 8);
        assert_eq!(options.depth, SearchDepth::Basic);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("TAVILY_API_KEY", "k"),
            ("MAX_SEARCH_RESULTS", "many"),
        ]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup_from(&[
            ("TAVILY_API_KEY", "k"),
            ("SEARCH_DEPTH", "deep"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config {
            tavily_api_key: ApiKey::new("k"),
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        config.temperature = 3.0;
        assert!(config.validate().is_err());

        config.temperature = 0.7;
        config.max_search_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_api_key_fails_validation() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = Config {
            tavily_api_key: ApiKey::new("tvly-secret"),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("tvly-secret"));
    }
}
