//! Bounded concurrent fan-out for page fetches and entity resolution.
//!
//! Both helpers run at most `max_concurrent` futures at a time and return
//! results in input order, whatever order the futures finish in.

use std::collections::BTreeMap;
use std::future::Future;

use futures::stream::{self, FuturesUnordered, StreamExt, TryStreamExt};
use log::debug;

use crate::error::Result;

/// Fetch all remaining pages concurrently after the first page.
///
/// # Arguments
///
/// * `remaining_pages` - Page numbers to fetch (from `PageEnvelope::remaining_pages()`)
/// * `fetch_page` - Async function that fetches a single page by number
/// * `max_concurrent` - Maximum number of concurrent requests
///
/// # Returns
///
/// All items from all remaining pages, concatenated in page-number order.
/// The first failing page aborts the whole fetch.
pub async fn fetch_remaining_pages<T, F, Fut>(
    remaining_pages: Vec<usize>,
    fetch_page: F,
    max_concurrent: usize,
) -> Result<Vec<T>>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if remaining_pages.is_empty() {
        return Ok(Vec::new());
    }

    let max_concurrent = max_concurrent.max(1);
    debug!(
        "Fetching {} remaining pages with max {} concurrent",
        remaining_pages.len(),
        max_concurrent
    );

    let mut pages: BTreeMap<usize, Vec<T>> = BTreeMap::new();
    let mut futures = FuturesUnordered::new();
    let mut pending_pages = remaining_pages.into_iter();

    let make_future = |page: usize| {
        let fut = fetch_page(page);
        async move { (page, fut.await) }
    };

    // Seed initial batch up to max_concurrent
    for page in pending_pages.by_ref().take(max_concurrent) {
        futures.push(make_future(page));
    }

    // Keep the pool full until every page has arrived
    while let Some((page, result)) = futures.next().await {
        let items = result?;
        debug!("Page {} returned {} items", page, items.len());
        pages.insert(page, items);

        if let Some(next_page) = pending_pages.next() {
            futures.push(make_future(next_page));
        }
    }

    Ok(pages.into_values().flatten().collect())
}

/// Map every item through `resolve` concurrently, keeping input order.
pub async fn resolve_in_order<I, T, U, F, Fut>(
    items: I,
    resolve: F,
    max_concurrent: usize,
) -> Result<Vec<U>>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<U>>,
{
    stream::iter(items)
        .map(resolve)
        .buffered(max_concurrent.max(1))
        .try_collect()
        .await
}
