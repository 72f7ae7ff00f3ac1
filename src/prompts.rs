//! Prompt templates for the draft and finalize stages.

use crate::search::SourceDocument;

/// Prompt templates for the report pipeline
pub struct ReportPrompts;

impl ReportPrompts {
    /// Prompt asking for a first draft of the report.
    pub fn draft(query: &str, sources: &str) -> String {
        format!(
            r#"You are a research assistant. Based on the following search results:
{sources}

Please create a comprehensive and well-organized draft report for the research query: "{query}".
"#
        )
    }

    /// Prompt asking the model to refine a draft into the final report.
    pub fn finalize(draft: &str, sources: &str) -> String {
        format!(
            r#"You are an expert research analyst. Below is a draft report:
{draft}

Improve and refine this report. Ensure that the final report is comprehensive and includes additional details based on these sources:
{sources}

Final Report:
"#
        )
    }
}

/// One `Title: ..., URL: ...` line per document.
pub fn sources_summary(documents: &[SourceDocument]) -> String {
    documents
        .iter()
        .map(|doc| format!("Title: {}, URL: {}", doc.title, doc.url_or_placeholder()))
        .collect::<Vec<_>>()
        .join("\n")
}
