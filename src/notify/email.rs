use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::{byline, display_text, total_papers, Notifier};
use crate::paper::{Paper, Section};

const BASE_URL: &str = "https://api.resend.com/emails";
const DELIVER_TIMEOUT: Duration = Duration::from_secs(10);
const FALLBACK_BUDGET: usize = 300;

/// HTML digest sent through the Resend email API. Unlike the Slack sink,
/// this renders every non-empty section.
pub struct EmailNotifier {
    client: reqwest::Client,
    api_key: String,
    from: String,
    to: String,
}

impl EmailNotifier {
    pub fn new(api_key: String, from: String, to: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-digest/0.1")
                .timeout(DELIVER_TIMEOUT)
                .build()
                .unwrap(),
            api_key,
            from,
            to,
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Alternate source link: the landing page itself when the paper came from
/// Hugging Face, otherwise the record URL.
fn alternate_link(paper: &Paper) -> String {
    if paper.url.contains("huggingface.co") {
        format!("https://huggingface.co/papers/{}", paper.source_id)
    } else {
        paper.url.clone()
    }
}

fn build_html(sections: &[Section]) -> String {
    let today = Utc::now().format("%Y/%m/%d");
    let total = total_papers(sections);

    let mut parts = vec![format!("<h1>🔥 {} Paper Digest ({} papers)</h1>", today, total)];

    for section in sections.iter().filter(|s| !s.papers.is_empty()) {
        parts.push(format!(
            "<h2>📚 {} ({})</h2>",
            escape_html(&section.name),
            section.papers.len()
        ));
        for (i, paper) in section.papers.iter().enumerate() {
            let popularity = if paper.popularity > 0 {
                format!(" | 👍 {}", paper.popularity)
            } else {
                String::new()
            };
            parts.push(format!(
                r#"
                <div style="margin: 20px 0; padding: 15px; border: 1px solid #ddd; border-radius: 8px;">
                    <h3>{rank}. {title}</h3>
                    <p><em>{byline}</em></p>
                    <p>{summary}{popularity}</p>
                    <p>
                        <a href="{alt}">Source</a> | <a href="https://arxiv.org/abs/{id}">arXiv</a> | <a href="{pdf}">PDF</a>
                    </p>
                </div>
                "#,
                rank = i + 1,
                title = escape_html(&paper.title),
                byline = escape_html(&byline(&paper.authors)),
                summary = escape_html(&display_text(paper, FALLBACK_BUDGET)),
                popularity = popularity,
                alt = alternate_link(paper),
                id = paper.source_id,
                pdf = paper.pdf_url,
            ));
        }
    }

    format!(
        r#"<html>
        <body style="font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px;">
            {}
            <hr style="margin-top: 30px;">
            <p style="color: #666; font-size: 12px;">
                Powered by <a href="https://huggingface.co/papers">Hugging Face Papers</a>
            </p>
        </body>
        </html>"#,
        parts.join("")
    )
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, sections: &[Section]) -> bool {
        let total = total_papers(sections);
        if total == 0 {
            tracing::info!("No papers to email");
            return true;
        }

        let today = Utc::now().format("%Y/%m/%d");
        let payload = json!({
            "from": self.from,
            "to": [self.to],
            "subject": format!("🔥 {} Paper Digest ({} papers)", today, total),
            "html": build_html(sections),
        });

        let result = self
            .client
            .post(BASE_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("Emailed digest with {} papers", total);
                true
            }
            Ok(resp) => {
                tracing::error!("Email API returned status {}", resp.status());
                false
            }
            Err(e) => {
                tracing::error!("Email delivery failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn paper(id: &str, title: &str, url: &str) -> Paper {
        Paper {
            title: title.to_string(),
            authors: vec!["Alice".to_string()],
            summary: "Some abstract text.".to_string(),
            published: DateTime::UNIX_EPOCH,
            url: url.to_string(),
            pdf_url: format!("https://arxiv.org/pdf/{}.pdf", id),
            source_id: id.to_string(),
            popularity: 3,
            generated_summary: None,
        }
    }

    #[test]
    fn html_counts_all_sections_and_skips_empty_ones() {
        let sections = vec![
            Section::new("Trending", vec![paper("1", "One", "https://arxiv.org/abs/1")]),
            Section::new("Empty", vec![]),
            Section::new("RAG", vec![paper("2", "Two", "https://arxiv.org/abs/2")]),
        ];
        let html = build_html(&sections);
        assert!(html.contains("(2 papers)"));
        assert!(html.contains("<h2>📚 Trending (1)</h2>"));
        assert!(html.contains("<h2>📚 RAG (1)</h2>"));
        assert!(!html.contains("Empty"));
    }

    #[test]
    fn titles_are_html_escaped() {
        let sections = vec![Section::new(
            "Top",
            vec![paper("1", "Attention <Is> All & \"More\"", "https://arxiv.org/abs/1")],
        )];
        let html = build_html(&sections);
        assert!(html.contains("Attention &lt;Is&gt; All &amp; &quot;More&quot;"));
        assert!(!html.contains("<Is>"));
    }

    #[test]
    fn renders_three_links_per_paper() {
        let sections = vec![Section::new(
            "Top",
            vec![paper("2602.02016", "T", "https://huggingface.co/papers/2602.02016")],
        )];
        let html = build_html(&sections);
        assert!(html.contains(r#"<a href="https://huggingface.co/papers/2602.02016">Source</a>"#));
        assert!(html.contains(r#"<a href="https://arxiv.org/abs/2602.02016">arXiv</a>"#));
        assert!(html.contains(r#"<a href="https://arxiv.org/pdf/2602.02016.pdf">PDF</a>"#));
    }

    #[test]
    fn escape_html_covers_the_four_entities() {
        assert_eq!(escape_html(r#"a & <b> "c""#), "a &amp; &lt;b&gt; &quot;c&quot;");
    }

    #[tokio::test]
    async fn empty_digest_is_trivial_success() {
        let notifier = EmailNotifier::new(
            "key".to_string(),
            "from@example.com".to_string(),
            "to@example.com".to_string(),
        );
        assert!(notifier.deliver(&[]).await);
    }
}
