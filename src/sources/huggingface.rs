use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::SourceError;
use crate::paper::Paper;

const BASE_URL: &str = "https://huggingface.co/api/daily_papers";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Trending fetcher against the Hugging Face daily papers list. The list is
/// pre-ranked by upvotes, which map directly into `popularity`.
pub struct HuggingFaceClient {
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HfPaper {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    authors: Vec<HfAuthor>,
    published_at: Option<String>,
    upvotes: Option<u32>,
    // The provider keeps this one key snake_case, unlike publishedAt.
    #[serde(rename = "ai_summary")]
    ai_summary: Option<String>,
}

#[derive(Deserialize)]
struct HfAuthor {
    name: Option<String>,
}

impl HuggingFaceClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-digest/0.1")
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap(),
        }
    }

    /// Fetch the current top `limit` daily papers. When `keyword` is given,
    /// only items whose title or abstract contains it (case-insensitive
    /// substring) are kept.
    pub async fn fetch_daily(
        &self,
        limit: u32,
        keyword: Option<&str>,
    ) -> Result<Vec<Paper>, SourceError> {
        let limit = limit.to_string();
        let items: Vec<serde_json::Value> = self
            .client
            .get(BASE_URL)
            .query(&[("limit", limit.as_str())])
            .send()
            .await?
            .json()
            .await?;
        Ok(parse_daily(items, keyword))
    }
}

fn parse_daily(items: Vec<serde_json::Value>, keyword: Option<&str>) -> Vec<Paper> {
    let mut papers = Vec::new();
    for item in items {
        // Entries sometimes nest the paper under a "paper" key.
        let value = item.get("paper").cloned().unwrap_or(item);
        let hf: HfPaper = match serde_json::from_value(value) {
            Ok(hf) => hf,
            Err(e) => {
                tracing::debug!("Skipping malformed daily paper entry: {}", e);
                continue;
            }
        };
        // Items without an arXiv-style dotted id have no usable identifier.
        if !hf.id.contains('.') {
            continue;
        }
        if let Some(kw) = keyword {
            if !keyword_match(&hf.title, &hf.summary, kw) {
                continue;
            }
        }
        papers.push(to_paper(hf));
    }
    papers
}

fn keyword_match(title: &str, summary: &str, keyword: &str) -> bool {
    let kw = keyword.to_lowercase();
    title.to_lowercase().contains(&kw) || summary.to_lowercase().contains(&kw)
}

fn to_paper(hf: HfPaper) -> Paper {
    let published = hf
        .published_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH);
    Paper {
        title: hf.title,
        authors: hf.authors.into_iter().filter_map(|a| a.name).collect(),
        summary: hf.summary.split_whitespace().collect::<Vec<_>>().join(" "),
        published,
        url: format!("https://huggingface.co/papers/{}", hf.id),
        pdf_url: format!("https://arxiv.org/pdf/{}.pdf", hf.id),
        popularity: hf.upvotes.unwrap_or(0),
        generated_summary: hf.ai_summary,
        source_id: hf.id,
    }
}
