//! Extraction and flattening
//!
//! [`extract`] walks a page two levels deep: for each group bucket it
//! enumerates the group elements, and within each group element it
//! enumerates the elements of every rule in the bucket. Each non-empty
//! handler result becomes one [`ScrapedData`]. [`flatten`] later merges the
//! results that describe the same element into one [`Record`].

mod flatten;

pub use flatten::{flatten, Record, RESERVED_KEYS};

use crate::backend::Backend;
use crate::rules::{RuleAction, RuleSet};
use crate::HarvestError;

/// Fields produced by a scrape handler, in insertion order
pub type Data = serde_json::Map<String, serde_json::Value>;

/// One handler result, with the position it was produced at
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedData {
    /// 1-based index of the page within the current frontier entry
    pub page_number: u32,
    pub page_url: String,
    /// Sequential id of the matched group element within one extraction
    /// pass; meaningless across passes
    pub group_id: usize,
    pub group_index: usize,
    pub element_index: usize,
    pub data: Data,
}

/// Runs every applicable scrape rule against a loaded document
///
/// # Arguments
///
/// * `backend` - The backend that loaded `document`
/// * `rules` - The resolved rules of the crawl
/// * `document` - The page to extract from
/// * `url` - The page URL, used for rule selection and bookkeeping
/// * `page_number` - 1-based index of the page within the current entry
///
/// # Returns
///
/// * `Ok(Vec<ScrapedData>)` - One entry per non-empty handler result, in
///   group, rule and element order
/// * `Err(HarvestError)` - A query failed or a handler returned an error
pub async fn extract<B: Backend>(
    backend: &B,
    rules: &RuleSet<B::Element, B::Document>,
    document: &B::Document,
    url: &str,
    page_number: u32,
) -> Result<Vec<ScrapedData>, HarvestError> {
    let mut results = Vec::new();
    let mut next_group_id = 0;

    for bucket in rules.grouped_scraping_rules_for(url) {
        let groups = backend.query_document(document, bucket.group).await?;

        for (group_index, group) in groups.iter().enumerate() {
            let group_id = next_group_id;
            next_group_id += 1;

            for rule in &bucket.rules {
                let RuleAction::Scrape(handler) = &rule.action else {
                    continue;
                };

                let elements = backend.query_element(group, &rule.selector).await?;
                for (element_index, element) in elements.into_iter().enumerate() {
                    let data = handler.call(element).await?;
                    if data.is_empty() {
                        continue;
                    }
                    results.push(ScrapedData {
                        page_number,
                        page_url: url.to_string(),
                        group_id,
                        group_index,
                        element_index,
                        data,
                    });
                }
            }
        }
    }

    tracing::debug!("Extracted {} items from {}", results.len(), url);
    Ok(results)
}

/// Same as [`extract`], driven to completion on the current thread
///
/// Meant for crawls made only of synchronous handlers, which never
/// suspend; handlers waiting on a runtime timer or socket must go through
/// [`extract`] instead.
pub fn extract_blocking<B: Backend>(
    backend: &B,
    rules: &RuleSet<B::Element, B::Document>,
    document: &B::Document,
    url: &str,
    page_number: u32,
) -> Result<Vec<ScrapedData>, HarvestError> {
    futures::executor::block_on(extract(backend, rules, document, url, page_number))
}
