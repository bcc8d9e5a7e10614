//! Pagination over `{count, next, results}` envelopes
//!
//! The first page tells us the total item count and the page size; the
//! remaining pages are then fetched concurrently and stitched back together
//! in page order.

use log::debug;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Fetcher;
use super::parallel::fetch_remaining_pages;
use crate::error::{ConfigError, Result};

/// One page of a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    /// Total items across all pages of the same query
    #[serde(default)]
    pub count: usize,

    /// URL of the next page, absent on the last one
    #[serde(default)]
    pub next: Option<String>,

    /// Items on this page
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> PageEnvelope<T> {
    /// Check if there are more pages to fetch.
    pub fn has_next_page(&self) -> bool {
        self.next.is_some()
    }

    /// Total number of pages, derived from `count` and this page's size.
    ///
    /// A page with a `next` link but no results has an undefined page size
    /// and is treated as the only page.
    pub fn total_pages(&self) -> usize {
        let page_size = self.results.len();
        if !self.has_next_page() || page_size == 0 {
            return 1;
        }
        self.count.div_ceil(page_size).max(1)
    }

    /// Page numbers still to fetch after this (first) page
    pub fn remaining_pages(&self) -> Vec<usize> {
        (2..=self.total_pages()).collect()
    }
}

/// Build a page URL: `search` only when non-empty, `page` always.
pub fn page_url(base_url: &str, search: Option<&str>, page: usize) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ConfigError::Invalid(format!("Invalid API URL '{}': {}", base_url, e)))?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query.append_pair("search", term);
        }
        query.append_pair("page", &page.to_string());
    }
    Ok(url.into())
}

/// Fetch every page of a collection and return all results in source order.
pub async fn fetch_all_pages<T>(
    fetcher: &Fetcher,
    base_url: &str,
    search: Option<&str>,
    max_concurrent: usize,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let first_url = page_url(base_url, search, 1)?;
    let first: PageEnvelope<T> = fetcher.get_json(&first_url).await?;

    let remaining = first.remaining_pages();
    if remaining.is_empty() {
        debug!(
            "{} fits on one page ({} of {} items)",
            first_url,
            first.results.len(),
            first.count
        );
        return Ok(first.results);
    }

    debug!(
        "{} has {} items over {} pages",
        base_url,
        first.count,
        remaining.len() + 1
    );

    let mut items = first.results;
    let rest = fetch_remaining_pages(
        remaining,
        |page| async move {
            let url = page_url(base_url, search, page)?;
            let envelope: PageEnvelope<T> = fetcher.get_json(&url).await?;
            Ok(envelope.results)
        },
        max_concurrent,
    )
    .await?;
    items.extend(rest);

    Ok(items)
}
