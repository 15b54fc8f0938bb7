//! Headline discovery over the paginated news index.
//!
//! Fetches index pages 0..n, pulls out list items with a titled link,
//! keeps only allow-listed sections, keyword-gates the titles, and
//! deduplicates by URL keeping the latest publication timestamp.
//!
//! An index page that still fails after retries aborts the whole run: a
//! partial index would silently shrink the day's batch, which is worse than
//! failing loudly and re-running.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

use crate::error::IngestError;
use crate::keywords::classify_headline;
use crate::retry::retry_with_backoff;
use crate::types::{CandidateHeadline, IngestConfig};

/// URL path sections eligible for collection.
const ALLOWED_SECTIONS: &[&str] = &["politics", "news", "the-nation"];

/// Collects candidate headlines from the paginated news index.
pub struct HeadlineCollector {
    client: reqwest::Client,
    index_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HeadlineCollector {
    /// Build a collector with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the client cannot be constructed.
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            index_url: config.news_index_url.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    /// Collect candidate headlines across `pages` index pages.
    ///
    /// Deduplicates by URL; when the same URL appears more than once, the
    /// entry with the greatest timestamp wins regardless of scan order.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`IngestError`] if any index page cannot be
    /// fetched after retries — collection is all-or-nothing.
    pub async fn collect(&self, pages: u32) -> Result<Vec<CandidateHeadline>, IngestError> {
        let mut latest: HashMap<String, CandidateHeadline> = HashMap::new();

        for page in 0..pages {
            let url = format!("{}{page}", self.index_url);
            let html = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.fetch_page(&url)
            })
            .await?;

            let page_timestamp = page_level_timestamp(&html);
            let mut kept = 0usize;

            for item in parse_index_items(&html) {
                let Some(section) = path_segment(&item.url, 3) else {
                    continue;
                };
                if !ALLOWED_SECTIONS.contains(&section) {
                    continue;
                }
                let is_national = path_segment(&item.url, 4) == Some("national");
                if classify_headline(&item.title, is_national).is_none() {
                    continue;
                }
                // Prefer the item's own timestamp; the page-level element is
                // a shared fallback when the item markup carries none.
                let Some(published_at) =
                    item.published_at.or_else(|| page_timestamp.clone())
                else {
                    continue;
                };

                let candidate = CandidateHeadline {
                    url: item.url,
                    title: item.title,
                    published_at,
                };

                match latest.entry(candidate.url.clone()) {
                    Entry::Occupied(mut occupied) => {
                        if candidate.published_at > occupied.get().published_at {
                            occupied.insert(candidate);
                        }
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(candidate);
                    }
                }
                kept += 1;
            }

            tracing::debug!(page, kept, "index page scanned");
        }

        tracing::info!(candidates = latest.len(), "headline collection complete");
        Ok(latest.into_values().collect())
    }

    async fn fetch_page(&self, url: &str) -> Result<String, IngestError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}

/// A raw index list item before gating.
#[derive(Debug, Clone)]
struct IndexItem {
    url: String,
    title: String,
    published_at: Option<String>,
}

/// Extract titled links (and per-item timestamps where present) from the
/// index page's `<li>` items.
fn parse_index_items(html: &str) -> Vec<IndexItem> {
    let li_re = Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("valid li regex");
    let link_re = Regex::new(
        r#"(?is)<h3[^>]*class\s*=\s*["'][^"']*title[^"']*["'][^>]*>.*?<a[^>]+href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#,
    )
    .expect("valid title link regex");

    li_re
        .captures_iter(html)
        .filter_map(|cap| {
            let block = cap.get(1).map_or("", |m| m.as_str());
            let link = link_re.captures(block)?;
            let url = link.get(1).map_or("", |m| m.as_str()).trim().to_string();
            let title = clean_text(link.get(2).map_or("", |m| m.as_str()));
            if url.is_empty() || title.is_empty() {
                return None;
            }
            Some(IndexItem {
                url,
                title,
                published_at: published_timestamp(block),
            })
        })
        .collect()
}

/// First `data-published` attribute found in the fragment, if any.
fn published_timestamp(fragment: &str) -> Option<String> {
    let re = Regex::new(r#"(?is)data-published\s*=\s*["']([^"']+)["']"#)
        .expect("valid data-published regex");
    re.captures(fragment)
        .and_then(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|s| !s.is_empty())
}

/// The page-level `news-time` timestamp, shared by items without their own.
fn page_level_timestamp(html: &str) -> Option<String> {
    let re = Regex::new(
        r#"(?is)<div[^>]*class\s*=\s*["'][^"']*news-time[^"']*["'][^>]*data-published\s*=\s*["']([^"']+)["']"#,
    )
    .expect("valid news-time regex");
    re.captures(html)
        .and_then(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|s| !s.is_empty())
}

/// The nth slash-separated segment of a URL, where segment 3 is the first
/// path component after `scheme://host`.
fn path_segment(url: &str, n: usize) -> Option<&str> {
    url.split('/').nth(n).filter(|s| !s.is_empty())
}

/// Strip tags and collapse whitespace runs to single spaces.
pub(crate) fn clean_text(input: &str) -> String {
    let tags = Regex::new(r"(?is)<[^>]+>").expect("valid tags regex");
    let no_tags = tags.replace_all(input, " ");
    no_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}
