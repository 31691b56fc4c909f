use std::time::Duration;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::SourceError;
use crate::paper::Paper;

const BASE_URL: &str = "http://export.arxiv.org/api/query";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Query-based fetcher against the arXiv search API.
pub struct ArxivClient {
    client: reqwest::Client,
}

impl ArxivClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-digest/0.1")
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap(),
        }
    }

    /// Fetch papers matching `query`, newest first, restricted to those
    /// published within the last `days_back` days. The window filter is
    /// applied client-side on the provider's date-sorted page; no extra
    /// pages are requested.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
        days_back: u32,
    ) -> Result<Vec<Paper>, SourceError> {
        let max = max_results.to_string();
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await?
            .text()
            .await?;

        let since = Utc::now() - chrono::Duration::days(i64::from(days_back));
        let mut papers = parse_atom_feed(&resp)?;
        papers.retain(|p| p.published >= since);
        Ok(papers)
    }
}

fn parse_atom_feed(xml: &str) -> Result<Vec<Paper>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();
    let mut in_entry = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut summary = String::new();
    let mut entry_id = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut published = String::new();
    let mut link_pdf = String::new();
    let mut author_name = String::new();
    let mut in_author = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "entry" {
                    in_entry = true;
                    title.clear();
                    summary.clear();
                    entry_id.clear();
                    authors.clear();
                    published.clear();
                    link_pdf.clear();
                } else if in_entry {
                    current_tag = tag.clone();
                    if tag == "author" {
                        in_author = true;
                        author_name.clear();
                    }
                    if tag == "link" {
                        if let Some(href) = pdf_href(&e) {
                            link_pdf = href;
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) if in_entry => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "link" {
                    if let Some(href) = pdf_href(&e) {
                        link_pdf = href;
                    }
                }
            }
            Ok(Event::Text(e)) if in_entry => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current_tag.as_str() {
                    "title" => title.push_str(&text),
                    "summary" => summary.push_str(&text),
                    "id" if entry_id.is_empty() => entry_id = text,
                    "published" => published.push_str(&text),
                    "name" if in_author => author_name.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "entry" && in_entry {
                    in_entry = false;
                    let id = entry_id
                        .rsplit('/')
                        .next()
                        .unwrap_or(&entry_id)
                        .to_string();
                    if !id.is_empty() && !title.trim().is_empty() {
                        let pdf_url = if link_pdf.is_empty() {
                            entry_id.replace("/abs/", "/pdf/")
                        } else {
                            link_pdf.clone()
                        };
                        papers.push(Paper {
                            title: normalize_whitespace(&title),
                            authors: authors.clone(),
                            summary: normalize_whitespace(&summary),
                            published: parse_timestamp(&published),
                            url: entry_id.clone(),
                            pdf_url,
                            source_id: id,
                            popularity: 0,
                            generated_summary: None,
                        });
                    }
                } else if tag == "author" && in_author {
                    in_author = false;
                    if !author_name.trim().is_empty() {
                        authors.push(author_name.trim().to_string());
                    }
                }
                if tag == current_tag {
                    current_tag.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(papers)
}

fn pdf_href(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    let mut href = String::new();
    let mut title_attr = String::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let val = String::from_utf8_lossy(&attr.value).to_string();
        if key == "href" {
            href = val;
        } else if key == "title" {
            title_attr = val;
        }
    }
    if title_attr == "pdf" && !href.is_empty() {
        Some(href)
    } else {
        None
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Entries with a missing or malformed timestamp sort to the epoch, so the
/// days-back window drops them rather than letting them through.
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
