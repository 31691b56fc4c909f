use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::{byline, display_text, total_papers, Notifier};
use crate::paper::Section;

const DELIVER_TIMEOUT: Duration = Duration::from_secs(10);
const FALLBACK_BUDGET: usize = 200;

/// Block Kit digest posted to an incoming webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-digest/0.1")
                .timeout(DELIVER_TIMEOUT)
                .build()
                .unwrap(),
            webhook_url,
        }
    }
}

/// Only the first (non-empty) section of the digest goes to Slack; the
/// webhook targets a single channel and the email sink carries the full
/// multi-section digest.
fn first_section(sections: &[Section]) -> Option<&Section> {
    sections.iter().find(|s| !s.papers.is_empty())
}

/// One header block, then per paper a mrkdwn section and a divider.
fn build_payload(section: &Section) -> Value {
    let today = Utc::now().format("%Y/%m/%d");
    let mut blocks = vec![json!({
        "type": "header",
        "text": {
            "type": "plain_text",
            "text": format!("🔥 {} Top Papers ({})", today, section.papers.len()),
        }
    })];

    for (i, paper) in section.papers.iter().enumerate() {
        let popularity = if paper.popularity > 0 {
            format!(" | ★ {}", paper.popularity)
        } else {
            String::new()
        };
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*{}. {}*\n_{}_\n{}{}\n<{}|arXiv> | <{}|PDF>",
                    i + 1,
                    paper.title,
                    byline(&paper.authors),
                    display_text(paper, FALLBACK_BUDGET),
                    popularity,
                    paper.url,
                    paper.pdf_url,
                ),
            }
        }));
        blocks.push(json!({"type": "divider"}));
    }

    json!({ "blocks": blocks })
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn deliver(&self, sections: &[Section]) -> bool {
        if total_papers(sections) == 0 {
            tracing::info!("No papers to send to Slack");
            return true;
        }
        let Some(section) = first_section(sections) else {
            return true;
        };
        let payload = build_payload(section);

        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("Sent {} papers to Slack", section.papers.len());
                true
            }
            Ok(resp) => {
                tracing::error!("Slack webhook returned status {}", resp.status());
                false
            }
            Err(e) => {
                tracing::error!("Slack delivery failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::Paper;
    use chrono::DateTime;

    fn paper(id: &str, popularity: u32) -> Paper {
        Paper {
            title: format!("Paper {}", id),
            authors: vec!["Alice".to_string(), "Bob".to_string()],
            summary: "An abstract.".to_string(),
            published: DateTime::UNIX_EPOCH,
            url: format!("https://arxiv.org/abs/{}", id),
            pdf_url: format!("https://arxiv.org/pdf/{}", id),
            source_id: id.to_string(),
            popularity,
            generated_summary: None,
        }
    }

    #[test]
    fn payload_has_header_and_per_paper_blocks() {
        let section = Section::new("Top", vec![paper("1", 12), paper("2", 0)]);
        let payload = build_payload(&section);
        let blocks = payload["blocks"].as_array().unwrap();
        // header + 2 * (section + divider)
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0]["type"], "header");
        assert!(blocks[0]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("Top Papers (2)"));
    }

    #[test]
    fn popularity_annotation_only_above_zero() {
        let section = Section::new("Top", vec![paper("1", 12), paper("2", 0)]);
        let payload = build_payload(&section);
        let blocks = payload["blocks"].as_array().unwrap();
        let first = blocks[1]["text"]["text"].as_str().unwrap();
        let second = blocks[3]["text"]["text"].as_str().unwrap();
        assert!(first.contains("★ 12"));
        assert!(!second.contains('★'));
    }

    #[test]
    fn entries_are_ranked_one_based_with_links() {
        let section = Section::new("Top", vec![paper("1", 0)]);
        let payload = build_payload(&section);
        let text = payload["blocks"][1]["text"]["text"].as_str().unwrap();
        assert!(text.starts_with("*1. Paper 1*"));
        assert!(text.contains("<https://arxiv.org/abs/1|arXiv>"));
        assert!(text.contains("<https://arxiv.org/pdf/1|PDF>"));
    }

    #[test]
    fn only_the_first_section_is_sent() {
        let sections = vec![
            Section::new("Trending", vec![paper("1", 5)]),
            Section::new("RAG", vec![paper("2", 3)]),
        ];
        let chosen = first_section(&sections).unwrap();
        assert_eq!(chosen.name, "Trending");
        let payload = build_payload(chosen);
        let text = serde_json::to_string(&payload).unwrap();
        assert!(text.contains("Paper 1"));
        assert!(!text.contains("Paper 2"));
    }

    #[test]
    fn empty_leading_sections_are_skipped() {
        let sections = vec![
            Section::new("Empty", vec![]),
            Section::new("RAG", vec![paper("2", 3)]),
        ];
        assert_eq!(first_section(&sections).unwrap().name, "RAG");
        assert!(first_section(&[]).is_none());
    }

    #[tokio::test]
    async fn empty_digest_is_trivial_success() {
        let notifier = SlackNotifier::new("http://localhost:1/unused".to_string());
        assert!(notifier.deliver(&[]).await);
        assert!(notifier.deliver(&[Section::new("Top", vec![])]).await);
    }
}
