pub mod email;
pub mod slack;

use async_trait::async_trait;

use crate::paper::{Paper, Section};

/// A delivery sink. Implementations report success as a boolean and never
/// let errors escape their boundary; a failed sink only fails itself.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, sections: &[Section]) -> bool;
}

pub(crate) fn total_papers(sections: &[Section]) -> usize {
    sections.iter().map(|s| s.papers.len()).sum()
}

/// Character-budget truncation. Strings within the budget pass through;
/// longer ones are cut to budget - 3 characters plus an ellipsis marker, so
/// the result is exactly `budget` characters long.
pub(crate) fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let cut: String = text.chars().take(budget.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// First three authors, comma-joined, with an "et al." marker when more
/// exist.
pub(crate) fn byline(authors: &[String]) -> String {
    let mut line = authors
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > 3 {
        line.push_str(" et al.");
    }
    line
}

/// Generated summary when present, else the raw abstract truncated to the
/// sink's character budget.
pub(crate) fn display_text(paper: &Paper, fallback_budget: usize) -> String {
    match &paper.generated_summary {
        Some(s) => s.clone(),
        None => truncate(&paper.summary, fallback_budget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn truncate_is_exact_at_the_budget() {
        // 500-char abstract, 200-char budget: 197 chars of content plus a
        // 3-char marker, 200 total.
        let text = "a".repeat(500);
        let out = truncate(&text, 200);
        assert_eq!(out.chars().count(), 200);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..197], &text[..197]);
    }

    #[test]
    fn truncate_passes_short_text_through() {
        assert_eq!(truncate("short", 200), "short");
        let exact = "b".repeat(200);
        assert_eq!(truncate(&exact, 200), exact);
    }

    #[test]
    fn byline_marks_extra_authors() {
        let three: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(byline(&three), "A, B, C");
        let four: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(byline(&four), "A, B, C et al.");
        assert_eq!(byline(&[]), "");
    }

    #[test]
    fn display_text_prefers_generated_summary() {
        let mut paper = Paper {
            title: String::new(),
            authors: vec![],
            summary: "x".repeat(400),
            published: DateTime::UNIX_EPOCH,
            url: String::new(),
            pdf_url: String::new(),
            source_id: "1".to_string(),
            popularity: 0,
            generated_summary: Some("generated".to_string()),
        };
        assert_eq!(display_text(&paper, 200), "generated");
        paper.generated_summary = None;
        assert_eq!(display_text(&paper, 200).chars().count(), 200);
    }
}
