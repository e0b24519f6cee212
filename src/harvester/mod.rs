//! Handler registration
//!
//! A [`Harvester`] collects scrape, setup and navigate rules, group
//! assignments, save handlers and lifecycle hooks, then runs them as one
//! crawl:
//!
//! ```no_run
//! use sumi_harvest::config::{CrawlerConfig, OutputConfig, UserAgentConfig};
//! use sumi_harvest::{Data, Handler, Harvester, HtmlBackend, HtmlElement, RequestGate, Select};
//!
//! # fn main() -> sumi_harvest::Result<()> {
//! let mut harvester: Harvester<HtmlBackend> = Harvester::new();
//! harvester.select(
//!     Select::css(".title").group(".item"),
//!     Handler::sync(|element: HtmlElement| {
//!         let mut data = Data::new();
//!         data.insert("title".into(), element.text().into());
//!         Ok(data)
//!     }),
//! )?;
//!
//! let backend = HtmlBackend::new(&UserAgentConfig::default(), RequestGate::default())?;
//! let config = CrawlerConfig {
//!     urls: vec!["https://example.com/".into()],
//!     ..CrawlerConfig::default()
//! };
//! harvester.run(backend, &config, &OutputConfig::default())?;
//! # Ok(())
//! # }
//! ```

mod handle;
mod select;

pub use handle::CrawlHandle;
pub use select::Select;

use crate::backend::{Backend, HtmlBackend};
use crate::config::{CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::crawler::{build_http_client, Crawler, Request};
use crate::extract::Data;
use crate::output::{SaveFn, SaveRegistry};
use crate::robots::RobotsCache;
use crate::rules::{GroupRegistry, Handler, Hooks, Rule, RuleAction, RuleSet, Selector};
use crate::Result;
use std::cell::RefCell;
use std::fmt;

/// Registry of everything a crawl runs
pub struct Harvester<B: Backend> {
    rules: Vec<Rule<B::Element, B::Document>>,
    groups: GroupRegistry,
    saves: SaveRegistry,
    hooks: Hooks<B::Document>,
    start_requests: Vec<Handler<(), Vec<Request>>>,
    user_agent: UserAgentConfig,
    handle: CrawlHandle,
}

impl<B: Backend> Harvester<B> {
    /// Creates a harvester with the built-in save handlers
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            groups: GroupRegistry::new(),
            saves: SaveRegistry::with_builtins(),
            hooks: Hooks::default(),
            start_requests: Vec::new(),
            user_agent: UserAgentConfig::default(),
            handle: CrawlHandle::default(),
        }
    }

    fn add_rule(
        &mut self,
        select: Select,
        action: RuleAction<B::Element, B::Document>,
    ) -> Result<&mut Self> {
        select.selector.validate()?;
        if let Some(group) = &select.group {
            group.validate()?;
        }
        let url_matcher = select.url_matcher()?;
        let handler_id = select
            .name
            .unwrap_or_else(|| format!("handler-{}", self.rules.len() + 1));

        tracing::debug!(
            "Registered {} rule '{}' for {}",
            action.kind(),
            handler_id,
            select.selector
        );
        self.rules.push(Rule {
            selector: select.selector,
            group: select.group,
            url_matcher,
            priority: select.priority,
            handler_id,
            action,
        });
        Ok(self)
    }

    /// Registers a scrape handler, called with every matched element
    ///
    /// # Returns
    ///
    /// * `Ok(&mut Self)` - Registered
    /// * `Err(HarvestError)` - The selector pattern is empty or the URL glob
    ///   does not compile
    pub fn select(
        &mut self,
        select: impl Into<Select>,
        handler: Handler<B::Element, Data>,
    ) -> Result<&mut Self> {
        self.add_rule(select.into(), RuleAction::Scrape(handler))
    }

    /// Registers a setup handler, called once per frontier entry with every
    /// matched element and the loaded document
    pub fn setup(
        &mut self,
        select: impl Into<Select>,
        handler: Handler<(B::Element, B::Document), ()>,
    ) -> Result<&mut Self> {
        self.add_rule(select.into(), RuleAction::Setup(handler))
    }

    /// Registers a navigate handler, called with the first matched element
    /// and the document to move to the next page
    pub fn navigate(
        &mut self,
        select: impl Into<Select>,
        handler: Handler<(B::Element, B::Document), ()>,
    ) -> Result<&mut Self> {
        self.add_rule(select.into(), RuleAction::Navigate(handler))
    }

    /// Assigns a group to every scrape rule named `handler_id` that has no
    /// explicit group
    ///
    /// The first registration for a name wins.
    pub fn group(&mut self, handler_id: &str, group: impl Into<Selector>) -> Result<&mut Self> {
        let group = group.into();
        group.validate()?;
        self.groups.register(handler_id, group);
        Ok(self)
    }

    /// Registers a save handler for `format`, replacing any built-in one
    pub fn save(&mut self, format: &str, per_page: bool, handler: SaveFn) -> &mut Self {
        self.saves.register(format, per_page, handler);
        self
    }

    pub fn startup(&mut self, handler: Handler<(), ()>) -> &mut Self {
        self.hooks.startup.push(handler);
        self
    }

    pub fn shutdown(&mut self, handler: Handler<(), ()>) -> &mut Self {
        self.hooks.shutdown.push(handler);
        self
    }

    pub fn pre_setup(&mut self, handler: Handler<B::Document, ()>) -> &mut Self {
        self.hooks.pre_setup.push(handler);
        self
    }

    pub fn post_setup(&mut self, handler: Handler<B::Document, ()>) -> &mut Self {
        self.hooks.post_setup.push(handler);
        self
    }

    /// Registers a handler supplying extra requests, queued after the seeds
    pub fn start_requests(&mut self, handler: Handler<(), Vec<Request>>) -> &mut Self {
        self.start_requests.push(handler);
        self
    }

    /// Sets the identity used for robots.txt
    pub fn user_agent(&mut self, user_agent: UserAgentConfig) -> &mut Self {
        self.user_agent = user_agent;
        self
    }

    /// A handle for handlers to queue URLs and read the current URL
    pub fn handle(&self) -> CrawlHandle {
        self.handle.clone()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// True if any registered handler is asynchronous
    pub fn has_async(&self) -> bool {
        self.rules.iter().any(Rule::is_async)
            || self.saves.has_async()
            || self.hooks.has_async()
            || self.start_requests.iter().any(Handler::is_async)
    }

    /// Resolves the rules and prepares a crawler over `backend`
    pub fn crawler(
        &self,
        backend: B,
        config: &CrawlerConfig,
        output: &OutputConfig,
    ) -> Result<Crawler<B>> {
        let rules = RuleSet::resolve(self.rules.clone(), &self.groups);
        let robots = RobotsCache::new(
            build_http_client(&self.user_agent)?,
            self.user_agent.crawler_name.clone(),
        );

        Ok(Crawler::new(backend, rules, robots, config.clone(), output.clone())
            .with_saves(self.saves.clone())
            .with_hooks(self.hooks.clone())
            .with_start_requests(self.start_requests.clone())
            .with_handle(self.handle.clone()))
    }

    /// Runs a crawl on the caller's runtime
    pub async fn run_async(
        &self,
        backend: B,
        config: &CrawlerConfig,
        output: &OutputConfig,
    ) -> Result<()> {
        tracing::info!("Harvester started with {} backend", backend.name());
        self.crawler(backend, config, output)?.run().await
    }

    /// Runs a crawl to completion on a new current-thread runtime
    ///
    /// Must not be called from within an async context; use
    /// [`Harvester::run_async`] there.
    pub fn run(&self, backend: B, config: &CrawlerConfig, output: &OutputConfig) -> Result<()> {
        if self.has_async() {
            tracing::info!("Using async mode...");
        } else {
            tracing::info!("Using sync mode...");
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_async(backend, config, output))
    }
}

impl<B: Backend> Default for Harvester<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for Harvester<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harvester")
            .field("rules", &self.rules.len())
            .field("groups", &self.groups.len())
            .field("saves", &self.saves)
            .field("user_agent", &self.user_agent.crawler_name)
            .finish()
    }
}

thread_local! {
    static DEFAULT: RefCell<Harvester<HtmlBackend>> = RefCell::new(Harvester::new());
}

/// Registers on this thread's default harvester
///
/// # Example
///
/// ```
/// use sumi_harvest::harvester::{take_default, with_default};
/// use sumi_harvest::{Data, Handler, HtmlElement};
///
/// with_default(|h| {
///     h.select("h1", Handler::sync(|_: HtmlElement| Ok(Data::new())))
///         .map(|_| ())
/// })
/// .unwrap();
/// assert_eq!(take_default().rule_count(), 1);
/// ```
pub fn with_default<R>(f: impl FnOnce(&mut Harvester<HtmlBackend>) -> R) -> R {
    DEFAULT.with(|harvester| f(&mut harvester.borrow_mut()))
}

/// Takes this thread's default harvester, leaving an empty one behind
pub fn take_default() -> Harvester<HtmlBackend> {
    DEFAULT.with(|harvester| std::mem::take(&mut *harvester.borrow_mut()))
}
