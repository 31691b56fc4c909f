use crate::paper::Paper;

/// Drop papers below the popularity threshold (inclusive keep), sort the
/// remainder by popularity descending and truncate to `top_n`. The sort is
/// stable, so equal-popularity papers keep their fetch order.
pub fn filter_and_rank(papers: Vec<Paper>, min_popularity: u32, top_n: usize) -> Vec<Paper> {
    let before = papers.len();
    let mut kept: Vec<Paper> = papers
        .into_iter()
        .filter(|p| p.popularity >= min_popularity)
        .collect();
    if kept.len() < before {
        tracing::info!("Popularity filter: {} -> {} papers", before, kept.len());
    }
    kept.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    kept.truncate(top_n);
    kept
}
