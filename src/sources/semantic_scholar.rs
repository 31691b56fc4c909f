use std::time::Duration;

use serde::Deserialize;

use super::SourceError;
use crate::paper::Paper;

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Citation-count lookups against the Semantic Scholar graph API, keyed by
/// bare arXiv id.
pub struct SemanticScholarClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    citation_count: Option<u32>,
}

impl SemanticScholarClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-digest/0.1")
                .timeout(LOOKUP_TIMEOUT)
                .build()
                .unwrap(),
            api_key,
        }
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        }
    }

    pub async fn citation_count(&self, arxiv_id: &str) -> Result<u32, SourceError> {
        let url = format!("{}/paper/arXiv:{}", BASE_URL, arxiv_id);
        let resp = self
            .add_auth(self.client.get(&url).query(&[("fields", "citationCount")]))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::Parse(format!(
                "lookup for {} returned status {}",
                arxiv_id,
                resp.status()
            )));
        }
        let paper: S2Paper = resp.json().await?;
        paper
            .citation_count
            .ok_or_else(|| SourceError::Parse(format!("no citationCount for {}", arxiv_id)))
    }

    /// Overwrite each paper's popularity with its citation count. One call
    /// per record, sequentially; a failed lookup leaves the previous value
    /// and never aborts the rest of the batch.
    pub async fn enrich(&self, papers: &mut [Paper]) {
        for paper in papers.iter_mut() {
            let result = self.citation_count(&paper.source_id).await;
            apply_citation_count(paper, result);
        }
    }
}

/// Overwrite on success, keep the prior value on failure. The record itself
/// is never dropped here.
fn apply_citation_count(paper: &mut Paper, result: Result<u32, SourceError>) {
    match result {
        Ok(count) => paper.popularity = count,
        Err(e) => {
            tracing::debug!("Citation lookup failed for {}: {}", paper.source_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn paper(id: &str, popularity: u32) -> Paper {
        Paper {
            title: format!("Paper {}", id),
            authors: vec![],
            summary: String::new(),
            published: DateTime::UNIX_EPOCH,
            url: String::new(),
            pdf_url: String::new(),
            source_id: id.to_string(),
            popularity,
            generated_summary: None,
        }
    }

    #[test]
    fn successful_lookup_overwrites_popularity() {
        let mut p = paper("2301.12345", 7);
        apply_citation_count(&mut p, Ok(42));
        assert_eq!(p.popularity, 42);
        // Replaces, never accumulates.
        apply_citation_count(&mut p, Ok(42));
        assert_eq!(p.popularity, 42);
    }

    #[test]
    fn failed_lookup_keeps_prior_popularity() {
        let mut p = paper("2301.12345", 7);
        apply_citation_count(
            &mut p,
            Err(SourceError::Parse("lookup returned status 404".to_string())),
        );
        assert_eq!(p.popularity, 7);
    }
}
