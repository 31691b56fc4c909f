use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paper::{Paper, Section};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
}

/// Summary generation capability, selected once at startup. The disabled
/// variant makes every call a no-op so the pipeline never has to check for
/// credentials mid-run.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// `Ok(None)` means the capability is disabled; `Err` means the provider
    /// failed for this record. Either way the caller leaves the paper's
    /// generated summary absent and moves on.
    async fn summarize(&self, paper: &Paper) -> Result<Option<String>, SummarizeError>;
}

pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _paper: &Paper) -> Result<Option<String>, SummarizeError> {
        Ok(None)
    }
}

/// Chat-completions summarizer with a fixed prompt template.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_length: u32,
    language: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: String, max_length: u32, language: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-digest/0.1")
                .timeout(COMPLETION_TIMEOUT)
                .build()
                .unwrap(),
            api_key,
            model,
            max_length,
            language,
        }
    }

    fn build_prompt(&self, paper: &Paper) -> String {
        format!(
            "Summarize the following paper in {} within {} characters. \
             Focus on the key contribution and its impact.\n\n\
             Title: {}\n\nAbstract:\n{}",
            self.language, self.max_length, paper.title, paper.summary
        )
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, paper: &Paper) -> Result<Option<String>, SummarizeError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are an assistant that writes concise summaries of academic papers.".to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: self.build_prompt(paper),
                },
            ],
            max_tokens: 500,
            temperature: 0.3,
        };

        let resp = self
            .client
            .post(COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SummarizeError::Api(format!(
                "completion returned status {}",
                resp.status()
            )));
        }
        let body: ChatResponse = resp.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SummarizeError::Api("empty completion".to_string()))?;
        Ok(Some(text))
    }
}

/// Fill in generated summaries for every sectioned paper that lacks one.
/// Failures are logged per record and never abort the batch.
pub async fn summarize_sections(summarizer: &dyn Summarizer, sections: &mut [Section]) {
    for section in sections.iter_mut() {
        for paper in section.papers.iter_mut() {
            if paper.generated_summary.is_some() {
                continue;
            }
            match summarizer.summarize(paper).await {
                Ok(Some(text)) => paper.generated_summary = Some(text),
                Ok(None) => return, // capability disabled
                Err(e) => {
                    tracing::warn!("Summary generation failed for {}: {}", paper.source_id, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::Section;
    use chrono::DateTime;

    fn paper(id: &str, generated: Option<&str>) -> Paper {
        Paper {
            title: "Structured State Spaces".to_string(),
            authors: vec!["Alice".to_string()],
            summary: "A new sequence model.".to_string(),
            published: DateTime::UNIX_EPOCH,
            url: String::new(),
            pdf_url: String::new(),
            source_id: id.to_string(),
            popularity: 0,
            generated_summary: generated.map(str::to_string),
        }
    }

    #[test]
    fn prompt_carries_title_abstract_language_and_budget() {
        let s = OpenAiSummarizer::new(
            "key".to_string(),
            "gpt-4o-mini".to_string(),
            200,
            "Japanese".to_string(),
        );
        let prompt = s.build_prompt(&paper("1", None));
        assert!(prompt.contains("Structured State Spaces"));
        assert!(prompt.contains("A new sequence model."));
        assert!(prompt.contains("Japanese"));
        assert!(prompt.contains("200 characters"));
    }

    #[tokio::test]
    async fn disabled_summarizer_is_a_noop() {
        let s = DisabledSummarizer;
        let result = s.summarize(&paper("1", None)).await.unwrap();
        assert!(result.is_none());

        let mut sections = vec![Section::new("Top", vec![paper("1", None)])];
        summarize_sections(&s, &mut sections).await;
        assert!(sections[0].papers[0].generated_summary.is_none());
    }

    #[tokio::test]
    async fn existing_summaries_are_not_regenerated() {
        struct Failing;
        #[async_trait]
        impl Summarizer for Failing {
            async fn summarize(&self, _: &Paper) -> Result<Option<String>, SummarizeError> {
                Err(SummarizeError::Api("down".to_string()))
            }
        }

        let mut sections = vec![Section::new(
            "Top",
            vec![paper("1", Some("already there")), paper("2", None)],
        )];
        summarize_sections(&Failing, &mut sections).await;
        assert_eq!(
            sections[0].papers[0].generated_summary.as_deref(),
            Some("already there")
        );
        // The failed record stays eligible for fallback rendering.
        assert!(sections[0].papers[1].generated_summary.is_none());
    }
}
