//! # Report Module
//!
//! Rendering and persistence of research reports.
//!
//! The plain-text layout produced by [`format_report`] is consumed by
//! existing tooling and must stay byte-for-byte stable. [`StructuredReport`]
//! is the JSON alternative.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ResearchError;
use crate::search::{SearchResult, SourceDocument};

/// Characters of content kept per source in the text report
pub const CONTENT_SUMMARY_CHARS: usize = 300;

const BANNER: &str = "============================================";

/// Output encoding of a saved report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

/// First [`CONTENT_SUMMARY_CHARS`] characters of `content`.
///
/// Character based, not word aware.
pub fn content_summary(content: &str) -> String {
    content.chars().take(CONTENT_SUMMARY_CHARS).collect()
}

/// The statement used wherever a run found no sources.
pub fn no_results_message(query: &str) -> String {
    format!("No results found for: {}", query)
}

/// Render the fixed-layout text report.
///
/// The `...` marker is appended to every content summary, including ones
/// shorter than the truncation length.
pub fn format_report(query: &str, documents: &[SourceDocument]) -> String {
    if documents.is_empty() {
        return no_results_message(query);
    }

    let mut report = String::new();
    report.push_str(BANNER);
    report.push('\n');
    report.push_str(&format!("Research Report on: {}\n\n", query.to_uppercase()));
    report.push_str(BANNER);
    report.push_str("\n\n");
    report.push_str("SUMMARY:\n");
    report.push_str(&format!("Found {} relevant sources\n\n", documents.len()));
    report.push_str("DETAILED FINDINGS:\n");

    for (i, doc) in documents.iter().enumerate() {
        report.push_str(&format!("SOURCE {}:\n", i + 1));
        report.push_str(&format!("Title: {}\n", doc.title));
        report.push_str(&format!("URL: {}\n", doc.url_or_placeholder()));
        report.push_str(&format!(
            "Content Summary: {}...\n\n",
            content_summary(&doc.content)
        ));
    }

    report.push_str(BANNER);
    report.push('\n');
    report.push_str("END OF REPORT\n");
    report
}

/// One source entry in a [`StructuredReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSource {
    /// 1-based position in the search ranking
    pub index: usize,
    pub title: String,
    pub url: Option<String>,
    pub content_summary: String,
}

/// JSON form of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub query: String,
    pub source_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub sources: Vec<ReportSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
}

impl StructuredReport {
    pub fn from_search(query: &str, result: &SearchResult) -> Self {
        let sources = result
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| ReportSource {
                index: i + 1,
                title: doc.title.clone(),
                url: doc.url.clone(),
                content_summary: content_summary(&doc.content),
            })
            .collect::<Vec<_>>();

        Self {
            query: query.to_string(),
            source_count: sources.len(),
            answer: Some(result.answer.clone()).filter(|a| !a.is_empty()),
            sources,
            final_report: None,
        }
    }

    /// Attach the model-written report from the agentic path.
    pub fn with_final_report(mut self, report: impl Into<String>) -> Self {
        self.final_report = Some(report.into());
        self
    }

    pub fn to_json(&self) -> Result<String, ResearchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `{topic with spaces replaced by underscores}_report.{ext}`
///
/// Path separators and leading dots also become `_`, so the file always
/// lands directly inside the output directory.
pub fn report_filename(topic: &str, format: ReportFormat) -> String {
    let mut stem: String = topic
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();

    let leading_dots = stem.chars().take_while(|&c| c == '.').count();
    if leading_dots > 0 {
        stem.replace_range(..leading_dots, &"_".repeat(leading_dots));
    }

    format!("{}_report.{}", stem, format.extension())
}

/// Write `contents` as UTF-8 into `dir` and return the file path.
pub fn save_report(
    dir: &Path,
    topic: &str,
    format: ReportFormat,
    contents: &str,
) -> Result<PathBuf, ResearchError> {
    let path = dir.join(report_filename(topic, format));

    fs::create_dir_all(dir).map_err(|source| ResearchError::ReportWrite {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, contents).map_err(|source| ResearchError::ReportWrite {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), bytes = contents.len(), "Report saved");
    Ok(path)
}

/// First `max_chars` characters followed by `...`, for console previews.
pub fn preview(report: &str, max_chars: usize) -> String {
    let head: String = report.chars().take(max_chars).collect();
    format!("{}...", head)
}
