//! Deterministic in-process stand-ins for the search provider and the model.
//!
//! Used by the unit and integration tests to exercise the fail-soft and
//! fail-fast paths without network access.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::llm::{LanguageModel, LlmError};
use crate::search::{SearchClient, SearchError, SearchOptions, SearchResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Search client that answers every query with the same outcome.
pub struct StubSearchClient {
    outcome: Result<SearchResult, SearchError>,
    calls: Mutex<Vec<(String, SearchOptions)>>,
}

impl StubSearchClient {
    pub fn returning(result: SearchResult) -> Self {
        Self {
            outcome: Ok(result),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: SearchError) -> Self {
        Self {
            outcome: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn queries(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|(q, _)| q.clone()).collect()
    }

    pub fn last_options(&self) -> Option<SearchOptions> {
        lock(&self.calls).last().map(|(_, options)| options.clone())
    }
}

#[async_trait]
impl SearchClient for StubSearchClient {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, SearchError> {
        lock(&self.calls).push((query.to_string(), options.clone()));
        self.outcome.clone()
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Model that replays scripted responses in call order and records prompts.
///
/// Calls past the end of the script fail with [`LlmError::Completion`].
#[derive(Default)]
pub struct StubLanguageModel {
    responses: Mutex<VecDeque<String>>,
    failures: HashMap<usize, LlmError>,
    prompts: Mutex<Vec<String>>,
}

impl StubLanguageModel {
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// A model whose `call`-th invocation (zero-based) fails.
    pub fn failing_on_call(call: usize, error: LlmError) -> Self {
        Self::default().fail_on_call(call, error)
    }

    pub fn fail_on_call(mut self, call: usize, error: LlmError) -> Self {
        self.failures.insert(call, error);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait]
impl LanguageModel for StubLanguageModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let call = {
            let mut prompts = lock(&self.prompts);
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        if let Some(error) = self.failures.get(&call) {
            return Err(error.clone());
        }

        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| LlmError::Completion(format!("no scripted response for call {}", call)))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
