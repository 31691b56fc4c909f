use crate::config::Config;
use crate::notify::Notifier;
use crate::paper::{Paper, Section};
use crate::rank::filter_and_rank;
use crate::sources::arxiv::ArxivClient;
use crate::sources::huggingface::HuggingFaceClient;
use crate::sources::semantic_scholar::SemanticScholarClient;
use crate::summarize::{summarize_sections, Summarizer};

/// How many papers each section shows.
const DISPLAY_SIZE: usize = 10;

/// Wires fetch → enrich → rank → summarize → deliver for one run.
pub struct Pipeline {
    config: Config,
    summarizer: Box<dyn Summarizer>,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let summarizer = config.build_summarizer();
        let notifiers = config.build_notifiers();
        Self { config, summarizer, notifiers }
    }

    /// Run the full pipeline. Returns true when at least one configured sink
    /// delivered (or there was nothing to deliver).
    pub async fn run(&self) -> bool {
        let mut sections = if self.config.use_huggingface {
            self.collect_trending().await
        } else {
            self.collect_query().await
        };

        if sections.iter().all(|s| s.papers.is_empty()) {
            tracing::info!("No new papers, nothing to deliver");
            return true;
        }

        summarize_sections(&*self.summarizer, &mut sections).await;

        let mut delivered = 0;
        for notifier in &self.notifiers {
            if notifier.deliver(&sections).await {
                delivered += 1;
            } else {
                tracing::error!("Sink {} failed to deliver", notifier.name());
            }
        }
        if delivered == 0 {
            tracing::error!("Every configured sink failed");
            return false;
        }
        tracing::info!("Delivered digest to {} sink(s)", delivered);
        true
    }

    /// Trending mode: the daily list is pre-ranked by upvotes, so sections
    /// are truncated to the display size without re-filtering.
    async fn collect_trending(&self) -> Vec<Section> {
        tracing::info!("Fetching Hugging Face daily papers");
        let client = HuggingFaceClient::new();

        let general = match client.fetch_daily(self.config.max_papers, None).await {
            Ok(papers) => papers,
            Err(e) => {
                tracing::error!("Trending fetch failed: {}", e);
                Vec::new()
            }
        };

        let keyword = match &self.config.keyword_filter {
            Some(kw) => match client.fetch_daily(self.config.max_papers, Some(kw)).await {
                Ok(papers) => Some((kw.as_str(), papers)),
                Err(e) => {
                    tracing::error!("Keyword trending fetch failed: {}", e);
                    None
                }
            },
            None => None,
        };

        trending_sections(general, keyword)
    }

    /// Query mode: fetch from arXiv, enrich with citation counts, then
    /// filter and rank.
    async fn collect_query(&self) -> Vec<Section> {
        tracing::info!(
            "Searching arXiv: query={}, max_results={}",
            self.config.arxiv_query,
            self.config.max_papers
        );
        let client = ArxivClient::new();
        let mut papers = match client
            .search(
                &self.config.arxiv_query,
                self.config.max_papers,
                self.config.days_back,
            )
            .await
        {
            Ok(papers) => papers,
            Err(e) => {
                tracing::error!("arXiv fetch failed: {}", e);
                Vec::new()
            }
        };
        tracing::info!("Fetched {} papers from arXiv", papers.len());
        if papers.is_empty() {
            return Vec::new();
        }

        let enricher =
            SemanticScholarClient::new(self.config.semantic_scholar_api_key.clone());
        enricher.enrich(&mut papers).await;

        let ranked = filter_and_rank(papers, self.config.min_citations, DISPLAY_SIZE);
        if ranked.is_empty() {
            return Vec::new();
        }
        vec![Section::new(format!("Top {}", DISPLAY_SIZE), ranked)]
    }
}

/// Assemble trending-mode sections: the general top list, then a keyword
/// section when one was fetched. Empty fetches yield no section.
fn trending_sections(
    general: Vec<Paper>,
    keyword: Option<(&str, Vec<Paper>)>,
) -> Vec<Section> {
    let mut sections = Vec::new();
    if !general.is_empty() {
        sections.push(Section::new(
            format!("Trending Top {}", DISPLAY_SIZE),
            head(general),
        ));
    }
    if let Some((kw, papers)) = keyword {
        if !papers.is_empty() {
            sections.push(Section::new(format!("{} Top {}", kw, DISPLAY_SIZE), head(papers)));
        }
    }
    sections
}

fn head(mut papers: Vec<Paper>) -> Vec<Paper> {
    papers.truncate(DISPLAY_SIZE);
    papers
}
