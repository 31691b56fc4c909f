use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched paper, normalized across sources.
///
/// Constructed once by a source fetcher, mutated in place by enrichment
/// (`popularity`) and summarization (`generated_summary`), read-only for
/// ranking and rendering. Nothing persists past one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    /// Byline order. May be empty when the provider omits author metadata.
    pub authors: Vec<String>,
    /// Source abstract, whitespace-normalized to a single line.
    pub summary: String,
    pub published: DateTime<Utc>,
    /// Canonical landing page.
    pub url: String,
    pub pdf_url: String,
    /// Provider-native identifier, e.g. a bare arXiv id like `2301.12345`.
    /// Unique within one fetch batch, not across providers.
    pub source_id: String,
    /// Citation count or upvote count depending on source. Enrichment
    /// overwrites this, it never accumulates.
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub generated_summary: Option<String>,
}

/// A named, ordered group of papers for display. Sections are independent;
/// a multi-section digest is display-time concatenation only.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub papers: Vec<Paper>,
}

impl Section {
    pub fn new(name: impl Into<String>, papers: Vec<Paper>) -> Self {
        Self { name: name.into(), papers }
    }
}
