//! Crawl frontier
//!
//! The frontier is the FIFO of pending entries. Before handing an entry out
//! it applies the politeness rules: the URL's network location must belong
//! to a seed, robots.txt must allow it, and the origin's crawl delay is
//! observed.

use crate::crawler::Request;
use crate::robots::RobotsCache;
use crate::url::{is_same_page, netloc_of, resolve_link};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A pending frontier item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontierEntry {
    /// A bare URL, fetched with GET
    Url(String),
    /// A fully specified request from a start-requests handler
    Request(Request),
}

impl FrontierEntry {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Request(request) => &request.url,
        }
    }

    pub fn into_request(self) -> Request {
        match self {
            Self::Url(url) => Request::get(url),
            Self::Request(request) => request,
        }
    }
}

/// The queue of pages waiting to be fetched
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    allowed_domains: HashSet<String>,
    robots: RobotsCache,
    ignore_robots: bool,
    dedupe: bool,
    seen: HashSet<String>,
    current_url: Option<String>,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `robots` - Cache consulted for every entry unless `ignore_robots`
    /// * `ignore_robots` - Skip robots.txt checks and crawl delays
    /// * `dedupe` - Never enqueue a URL twice; by default revisits are
    ///   allowed
    pub fn new(robots: RobotsCache, ignore_robots: bool, dedupe: bool) -> Self {
        Self {
            queue: VecDeque::new(),
            allowed_domains: HashSet::new(),
            robots,
            ignore_robots,
            dedupe,
            seen: HashSet::new(),
            current_url: None,
        }
    }

    /// Replaces the queue with `urls` and allows exactly their network
    /// locations
    pub fn seed<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queue.clear();
        self.allowed_domains.clear();
        self.seen.clear();

        for url in urls {
            let url = url.into();
            if let Some(domain) = netloc_of(&url) {
                self.allowed_domains.insert(domain);
            }
            self.seen.insert(url.clone());
            self.queue.push_back(FrontierEntry::Url(url));
        }

        tracing::debug!(
            "Seeded frontier with {} URLs over {} domains",
            self.queue.len(),
            self.allowed_domains.len()
        );
    }

    /// Appends a request supplied by a start-requests handler
    ///
    /// Its network location becomes allowed as well.
    pub fn push_request(&mut self, request: Request) {
        if let Some(domain) = netloc_of(&request.url) {
            self.allowed_domains.insert(domain);
        }
        self.seen.insert(request.url.clone());
        self.queue.push_back(FrontierEntry::Request(request));
    }

    /// Appends an absolute URL
    ///
    /// # Returns
    ///
    /// `false` if deduplication is on and the URL was already enqueued
    pub fn push_url(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if !self.seen.insert(url.clone()) && self.dedupe {
            tracing::trace!("Skipping already queued {}", url);
            return false;
        }
        self.queue.push_back(FrontierEntry::Url(url));
        true
    }

    /// Follows a link found on `base_url`
    ///
    /// The href is resolved against the page; links resolving back to the
    /// page itself (ignoring trailing slashes) are not followed.
    ///
    /// # Returns
    ///
    /// `true` if a new entry was appended
    pub fn follow(&mut self, base_url: &str, href: &str) -> bool {
        let Ok(base) = Url::parse(base_url) else {
            tracing::debug!("Cannot follow links from unparsable {}", base_url);
            return false;
        };
        let Some(target) = resolve_link(href, &base) else {
            return false;
        };

        let target = target.to_string();
        if is_same_page(&target, base_url) {
            return false;
        }
        self.push_url(target)
    }

    /// Checks the allow-list for a URL
    pub fn is_allowed(&self, url: &str) -> bool {
        netloc_of(url)
            .map(|domain| self.allowed_domains.contains(&domain))
            .unwrap_or(false)
    }

    /// Pops the next entry that may be fetched
    ///
    /// Entries outside the allowed domains or disallowed by robots.txt are
    /// logged and dropped. Before returning, waits for the origin's crawl
    /// delay; this pause holds up the whole crawl.
    ///
    /// # Returns
    ///
    /// * `Some(Request)` - The next request to fetch
    /// * `None` - The frontier is exhausted
    pub async fn next(&mut self) -> Option<Request> {
        while let Some(entry) = self.queue.pop_front() {
            let url = entry.url().to_string();

            if !self.is_allowed(&url) {
                tracing::info!("URL {} is not in allowed domains.", url);
                continue;
            }

            if !self.ignore_robots {
                let decision = self.robots.check(&url).await;
                if !decision.allowed {
                    tracing::info!("Not allowed to crawl {}", url);
                    continue;
                }
                if !decision.crawl_delay.is_zero() {
                    tracing::debug!("Waiting {:?} before {}", decision.crawl_delay, url);
                    tokio::time::sleep(decision.crawl_delay).await;
                }
            }

            self.current_url = Some(url);
            return Some(entry.into_request());
        }

        None
    }

    /// URL of the entry most recently handed out
    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
