//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop. For every frontier entry it walks
//! the [`VisitState`] machine:
//! - fetch the document (failures abandon the entry, blocked requests end
//!   it quietly)
//! - run setup hooks and rules once
//! - extract, optionally save, then navigate, until the page budget is
//!   used up or the page stops moving
//!
//! When the frontier is exhausted the remaining buffer is saved.

use crate::backend::Backend;
use crate::config::{CrawlerConfig, OutputConfig};
use crate::crawler::{Frontier, Request};
use crate::extract::{extract, ScrapedData};
use crate::harvester::CrawlHandle;
use crate::output::SaveRegistry;
use crate::robots::RobotsCache;
use crate::rules::{Handler, Hooks, RuleAction, RuleSet};
use crate::state::VisitState;
use crate::{BackendError, HarvestError, Result};

/// Moves `state` to `next`, refusing transitions the machine does not allow
fn advance(state: &mut VisitState, next: VisitState) -> Result<()> {
    if !state.can_transition_to(next) {
        return Err(HarvestError::InvalidTransition {
            from: *state,
            to: next,
        });
    }
    tracing::trace!("Visit state {} -> {}", state, next);
    *state = next;
    Ok(())
}

/// Counters reported at the end of a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Frontier entries handed out
    pub entries: usize,
    /// Entries whose fetch or navigation failed
    pub abandoned: usize,
    /// Fetches and navigations refused by the request filter
    pub blocked: usize,
    /// Pages extracted, navigated pages included
    pub pages: usize,
}

/// Main crawler structure
///
/// Owns the frontier, the resolved rules and the result buffer of one
/// crawl. A crawler runs on a single logical thread; handlers are invoked
/// one at a time.
pub struct Crawler<B: Backend> {
    backend: B,
    rules: RuleSet<B::Element, B::Document>,
    saves: SaveRegistry,
    hooks: Hooks<B::Document>,
    start_requests: Vec<Handler<(), Vec<Request>>>,
    handle: CrawlHandle,
    frontier: Frontier,
    config: CrawlerConfig,
    output: OutputConfig,
    buffer: Vec<ScrapedData>,
    stats: CrawlStats,
}

impl<B: Backend> Crawler<B> {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `backend` - Loads pages and answers selector queries
    /// * `rules` - The resolved rules
    /// * `robots` - Robots.txt cache for the frontier
    /// * `config` - Seeds, page budget and politeness settings
    /// * `output` - Where and how results are saved
    pub fn new(
        backend: B,
        rules: RuleSet<B::Element, B::Document>,
        robots: RobotsCache,
        config: CrawlerConfig,
        output: OutputConfig,
    ) -> Self {
        let frontier = Frontier::new(robots, config.ignore_robots, config.dedupe_urls);
        Self {
            backend,
            rules,
            saves: SaveRegistry::with_builtins(),
            hooks: Hooks::default(),
            start_requests: Vec::new(),
            handle: CrawlHandle::default(),
            frontier,
            config,
            output,
            buffer: Vec::new(),
            stats: CrawlStats::default(),
        }
    }

    pub fn with_saves(mut self, saves: SaveRegistry) -> Self {
        self.saves = saves;
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks<B::Document>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_start_requests(mut self, handlers: Vec<Handler<(), Vec<Request>>>) -> Self {
        self.start_requests = handlers;
        self
    }

    /// Shares a handle with the handlers of this crawl
    pub fn with_handle(mut self, handle: CrawlHandle) -> Self {
        self.handle = handle;
        self
    }

    /// Items scraped since the last successful save
    pub fn buffer(&self) -> &[ScrapedData] {
        &self.buffer
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Every entry was visited and the results were saved
    /// * `Err(HarvestError)` - A handler, query or save failed; the buffer
    ///   keeps whatever was not saved
    pub async fn run(&mut self) -> Result<()> {
        for hook in &self.hooks.startup {
            hook.call(()).await?;
        }

        let per_page = self.config.save_per_page || self.config.follow_links;

        self.frontier.seed(self.config.urls.iter().cloned());
        for handler in &self.start_requests {
            for request in handler.call(()).await? {
                self.frontier.push_request(request);
            }
        }
        self.drain_follows();

        tracing::info!(
            "Starting crawl with {} entries in the frontier",
            self.frontier.len()
        );

        while let Some(request) = self.frontier.next().await {
            self.handle.set_current_url(&request.url);
            self.stats.entries += 1;

            let state = self.visit(&request, per_page).await?;
            if state == VisitState::Abandoned {
                self.stats.abandoned += 1;
            }
        }

        if !per_page {
            self.save(false).await?;
        }

        for hook in &self.hooks.shutdown {
            hook.call(()).await?;
        }

        tracing::info!(
            "Crawl complete: {} entries, {} abandoned, {} blocked, {} pages",
            self.stats.entries,
            self.stats.abandoned,
            self.stats.blocked,
            self.stats.pages
        );
        Ok(())
    }

    /// Processes one frontier entry
    ///
    /// # Returns
    ///
    /// The terminal state the entry ended in
    async fn visit(&mut self, request: &Request, per_page: bool) -> Result<VisitState> {
        let mut state = VisitState::Fetching;

        let mut document = match self.backend.fetch(request).await {
            Ok(document) => document,
            Err(BackendError::Blocked { url }) => {
                tracing::info!("URL {} has been blocked.", url);
                self.stats.blocked += 1;
                advance(&mut state, VisitState::Done)?;
                return Ok(state);
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", request.url, e);
                advance(&mut state, VisitState::Abandoned)?;
                return Ok(state);
            }
        };
        let mut url = self.backend.page_url(&document);
        tracing::info!("Loaded page {}", url);
        self.follow_links(&document, &url);

        advance(&mut state, VisitState::Setup)?;
        self.setup(&document, &url).await?;

        advance(&mut state, VisitState::Extracting)?;
        let mut page_number: u32 = 1;
        loop {
            let items = extract(&self.backend, &self.rules, &document, &url, page_number).await?;
            self.buffer.extend(items);
            self.stats.pages += 1;
            self.drain_follows();

            if per_page {
                advance(&mut state, VisitState::SavePerPage)?;
                self.save(true).await?;
            }

            if page_number >= self.config.max_pages {
                advance(&mut state, VisitState::Done)?;
                break;
            }

            advance(&mut state, VisitState::Navigating)?;
            if !self.navigate(&document, &url).await? {
                advance(&mut state, VisitState::Done)?;
                break;
            }

            match self.backend.navigate(&document).await {
                Ok(Some(next)) => {
                    let next_url = self.backend.page_url(&next);
                    document = next;
                    if next_url == url {
                        tracing::debug!("Page {} did not change after navigation", url);
                        advance(&mut state, VisitState::Done)?;
                        break;
                    }
                    url = next_url;
                    self.handle.set_current_url(&url);
                    tracing::info!("Navigated to {}", url);
                    self.follow_links(&document, &url);

                    advance(&mut state, VisitState::Extracting)?;
                    page_number += 1;
                }
                Ok(None) => {
                    advance(&mut state, VisitState::Done)?;
                    break;
                }
                Err(BackendError::Blocked { url: target }) => {
                    tracing::info!("URL {} has been blocked.", target);
                    self.stats.blocked += 1;
                    advance(&mut state, VisitState::Done)?;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Navigation from {} failed: {}", url, e);
                    advance(&mut state, VisitState::Abandoned)?;
                    break;
                }
            }
        }

        Ok(state)
    }

    async fn setup(&self, document: &B::Document, url: &str) -> Result<()> {
        for hook in &self.hooks.pre_setup {
            hook.call(document.clone()).await?;
        }

        for rule in self.rules.setup_rules_for(url) {
            let RuleAction::Setup(handler) = &rule.action else {
                continue;
            };
            for element in self.backend.query_document(document, &rule.selector).await? {
                handler.call((element, document.clone())).await?;
            }
        }

        for hook in &self.hooks.post_setup {
            hook.call(document.clone()).await?;
        }
        Ok(())
    }

    /// Invokes the first navigate rule that matches an element
    ///
    /// # Returns
    ///
    /// `true` if a handler ran
    async fn navigate(&self, document: &B::Document, url: &str) -> Result<bool> {
        for rule in self.rules.navigate_rules_for(url) {
            let RuleAction::Navigate(handler) = &rule.action else {
                continue;
            };
            let elements = self.backend.query_document(document, &rule.selector).await?;
            if let Some(element) = elements.into_iter().next() {
                handler.call((element, document.clone())).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn follow_links(&mut self, document: &B::Document, url: &str) {
        if !self.config.follow_links {
            return;
        }
        let mut followed = 0;
        for href in self.backend.links(document) {
            if self.frontier.follow(url, &href) {
                followed += 1;
            }
        }
        tracing::debug!("Queued {} links from {}", followed, url);
    }

    /// Moves URLs queued by handlers into the frontier
    fn drain_follows(&mut self) {
        for url in self.handle.take_pending() {
            self.frontier.push_url(url);
        }
    }

    async fn save(&mut self, per_page: bool) -> Result<()> {
        self.saves
            .save(
                &mut self.buffer,
                &self.output.format,
                self.output.path.as_deref(),
                per_page,
            )
            .await?;
        Ok(())
    }
}
