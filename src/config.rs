use thiserror::Error;

use crate::notify::{email::EmailNotifier, slack::SlackNotifier, Notifier};
use crate::summarize::{DisabledSummarizer, OpenAiSummarizer, Summarizer};

const DEFAULT_QUERY: &str = "cat:cs.AI OR cat:cs.LG";
const DEFAULT_EMAIL_FROM: &str = "Paper Daily <papers@yourdomain.com>";

/// Named query presets. An explicit ARXIV_QUERY wins over a preset.
const PRESETS: &[(&str, &str)] = &[
    ("rag", "all:Retrieval-Augmented OR all:RAG OR all:'retrieval augmented'"),
    ("llm", "cat:cs.CL OR all:'Large Language Model' OR all:LLM"),
    ("agents", "all:'AI Agents' OR all:'autonomous agents' OR all:'agent systems'"),
    ("multimodal", "all:multimodal OR all:'vision language' OR all:VLM"),
    ("ai", "cat:cs.AI"),
    ("machine_learning", "cat:cs.LG"),
    ("computation_language", "cat:cs.CL"),
    ("computer_vision", "cat:cs.CV"),
    ("robotics", "cat:cs.RO"),
    ("nlp", "cat:cs.CL"),
    ("ai_ml", "cat:cs.AI OR cat:cs.LG"),
    ("all_ai", "cat:cs.AI OR cat:cs.LG OR cat:cs.CL OR cat:cs.CV"),
];

pub fn preset_query(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    PRESETS.iter().find(|(n, _)| *n == name).map(|(_, q)| *q)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no delivery sink configured: set SLACK_WEBHOOK_URL or RESEND_API_KEY + EMAIL_TO")]
    NoSink,
}

/// Run parameters, read once from the environment at startup and passed by
/// reference into the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub arxiv_query: String,
    pub max_papers: u32,
    pub min_citations: u32,
    pub days_back: u32,
    pub use_huggingface: bool,
    pub keyword_filter: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub email_to: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub summary_max_length: u32,
    pub summary_language: String,
    pub semantic_scholar_api_key: Option<String>,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            arxiv_query: resolve_query(
                std::env::var("ARXIV_QUERY").ok(),
                std::env::var("ARXIV_PRESET").ok(),
            ),
            max_papers: env_parse("MAX_PAPERS", 100),
            min_citations: env_parse("MIN_CITATIONS", 0),
            days_back: env_parse("DAYS_BACK", 1),
            use_huggingface: std::env::var("USE_HUGGINGFACE")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(true),
            keyword_filter: non_empty(std::env::var("KEYWORD_FILTER").ok()),
            slack_webhook_url: non_empty(std::env::var("SLACK_WEBHOOK_URL").ok()),
            resend_api_key: non_empty(std::env::var("RESEND_API_KEY").ok()),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| DEFAULT_EMAIL_FROM.to_string()),
            email_to: non_empty(std::env::var("EMAIL_TO").ok()),
            openai_api_key: non_empty(std::env::var("OPENAI_API_KEY").ok()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            summary_max_length: env_parse("SUMMARY_MAX_LENGTH", 200),
            summary_language: std::env::var("SUMMARY_LANGUAGE")
                .unwrap_or_else(|_| "Japanese".to_string()),
            semantic_scholar_api_key: non_empty(std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok()),
        };
        config.validate()?;
        Ok(config)
    }

    /// A run with nowhere to deliver is a fatal startup error; everything
    /// else degrades at the stage where it fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let email_configured = self.resend_api_key.is_some() && self.email_to.is_some();
        if self.slack_webhook_url.is_none() && !email_configured {
            return Err(ConfigError::NoSink);
        }
        Ok(())
    }

    /// Build the configured delivery sinks. `validate` guarantees at least
    /// one.
    pub fn build_notifiers(&self) -> Vec<Box<dyn Notifier>> {
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        if let (Some(key), Some(to)) = (&self.resend_api_key, &self.email_to) {
            notifiers.push(Box::new(EmailNotifier::new(
                key.clone(),
                self.email_from.clone(),
                to.clone(),
            )));
        }
        if let Some(url) = &self.slack_webhook_url {
            notifiers.push(Box::new(SlackNotifier::new(url.clone())));
        }
        notifiers
    }

    /// Select the summarization capability once at startup.
    pub fn build_summarizer(&self) -> Box<dyn Summarizer> {
        match &self.openai_api_key {
            Some(key) => Box::new(OpenAiSummarizer::new(
                key.clone(),
                self.openai_model.clone(),
                self.summary_max_length,
                self.summary_language.clone(),
            )),
            None => {
                tracing::info!("OPENAI_API_KEY not set, summary generation disabled");
                Box::new(DisabledSummarizer)
            }
        }
    }
}

/// Precedence: explicit query, then preset, then the default. Empty strings
/// count as unset.
fn resolve_query(explicit: Option<String>, preset: Option<String>) -> String {
    non_empty(explicit)
        .or_else(|| non_empty(preset).and_then(|p| preset_query(&p).map(str::to_string)))
        .unwrap_or_else(|| DEFAULT_QUERY.to_string())
}

fn env_parse(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
