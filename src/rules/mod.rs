//! Rule model
//!
//! A [`Rule`] binds a [`Selector`] to a handler, scoped to the page URLs its
//! [`UrlMatcher`] accepts and ordered by priority. Rules come in three
//! kinds: scrape rules produce data, setup rules prepare a freshly loaded
//! page, and navigate rules move to the next page.

mod handler;
mod resolve;
mod selector;

pub use handler::{Handler, Hooks};
pub use resolve::{GroupRegistry, RuleGroup, RuleSet};
pub use selector::{Selector, SelectorKind, SelectorParts, ROOT_SELECTOR};

pub use crate::url::UrlMatcher;

use crate::extract::Data;
use std::fmt;

/// Priority given to rules that don't specify one
pub const DEFAULT_PRIORITY: i32 = 100;

/// What a rule is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Scrape,
    Setup,
    Navigate,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Setup => "setup",
            Self::Navigate => "navigate",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The callback of a rule, typed by its kind
///
/// `E` is the backend's element type and `D` its document type.
pub enum RuleAction<E, D> {
    /// Called with each matched element; returns the extracted fields
    Scrape(Handler<E, Data>),
    /// Called with each matched element and the page, for side effects
    Setup(Handler<(E, D), ()>),
    /// Called with the first matched element and the page to move on
    Navigate(Handler<(E, D), ()>),
}

impl<E: 'static, D: 'static> RuleAction<E, D> {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Scrape(_) => RuleKind::Scrape,
            Self::Setup(_) => RuleKind::Setup,
            Self::Navigate(_) => RuleKind::Navigate,
        }
    }

    pub fn is_async(&self) -> bool {
        match self {
            Self::Scrape(h) => h.is_async(),
            Self::Setup(h) | Self::Navigate(h) => h.is_async(),
        }
    }
}

impl<E, D> Clone for RuleAction<E, D> {
    fn clone(&self) -> Self {
        match self {
            Self::Scrape(h) => Self::Scrape(h.clone()),
            Self::Setup(h) => Self::Setup(h.clone()),
            Self::Navigate(h) => Self::Navigate(h.clone()),
        }
    }
}

/// A selector bound to a handler
pub struct Rule<E, D> {
    pub selector: Selector,
    /// Parent scope for scrape rules; always set once the rule is resolved
    pub group: Option<Selector>,
    pub url_matcher: UrlMatcher,
    /// Lower runs first
    pub priority: i32,
    /// Identity of the handler, used to look up registered groups
    pub handler_id: String,
    pub action: RuleAction<E, D>,
}

impl<E: 'static, D: 'static> Rule<E, D> {
    pub fn kind(&self) -> RuleKind {
        self.action.kind()
    }

    pub fn is_async(&self) -> bool {
        self.action.is_async()
    }

    /// Checks whether the rule applies to the page at `url`
    pub fn applies_to(&self, url: &str) -> bool {
        self.url_matcher.matches(url)
    }

    /// Key used to pre-sort rules before grouping
    pub fn sort_key(&self) -> (Option<&Selector>, &Selector, i32) {
        (self.group.as_ref(), &self.selector, self.priority)
    }

    /// Key rules are grouped by
    pub fn group_key(&self) -> Option<&Selector> {
        self.group.as_ref()
    }
}

impl<E, D> Clone for Rule<E, D> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone(),
            group: self.group.clone(),
            url_matcher: self.url_matcher.clone(),
            priority: self.priority,
            handler_id: self.handler_id.clone(),
            action: self.action.clone(),
        }
    }
}

impl<E, D> fmt::Debug for Rule<E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("selector", &self.selector)
            .field("group", &self.group)
            .field("url_matcher", &self.url_matcher)
            .field("priority", &self.priority)
            .field("handler_id", &self.handler_id)
            .finish_non_exhaustive()
    }
}
