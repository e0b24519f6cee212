//! Rule resolution
//!
//! Resolution assigns every scrape rule its effective group once, before a
//! crawl starts. Afterwards the [`RuleSet`] answers, for a given page URL,
//! which setup, navigate and (grouped) scrape rules apply and in which
//! order.

use crate::rules::{Rule, RuleKind, Selector};
use std::collections::HashMap;

/// Groups registered per handler identity
///
/// Append-only: the first registration for a handler wins, later ones are
/// dropped with a warning.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: HashMap<String, Selector>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `group` for `handler_id`
    ///
    /// # Returns
    ///
    /// * `true` - The group was registered
    /// * `false` - A group already existed for this handler and was kept
    pub fn register(&mut self, handler_id: &str, group: Selector) -> bool {
        if let Some(existing) = self.groups.get(handler_id) {
            tracing::warn!(
                "Group '{}' already exists for handler '{}'. Skipping '{}'",
                existing,
                handler_id,
                group
            );
            return false;
        }
        self.groups.insert(handler_id.to_string(), group);
        true
    }

    pub fn get(&self, handler_id: &str) -> Option<&Selector> {
        self.groups.get(handler_id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Scrape rules sharing one group selector, in priority order
#[derive(Debug)]
pub struct RuleGroup<'a, E, D> {
    pub group: &'a Selector,
    pub rules: Vec<&'a Rule<E, D>>,
}

/// The resolved, immutable rule collection of a crawl
#[derive(Debug)]
pub struct RuleSet<E, D> {
    rules: Vec<Rule<E, D>>,
}

impl<E: 'static, D: 'static> RuleSet<E, D> {
    /// Resolves the effective group of every scrape rule
    ///
    /// A scrape rule keeps its explicit group; otherwise it takes the group
    /// registered for its handler, and falls back to the whole document.
    /// Setup and navigate rules are left untouched.
    pub fn resolve(mut rules: Vec<Rule<E, D>>, registry: &GroupRegistry) -> Self {
        for rule in rules
            .iter_mut()
            .filter(|rule| rule.kind() == RuleKind::Scrape)
        {
            if rule.group.is_none() {
                let group = registry
                    .get(&rule.handler_id)
                    .cloned()
                    .unwrap_or_else(Selector::root);
                rule.group = Some(group);
            }
        }

        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if any rule handler is asynchronous
    pub fn has_async(&self) -> bool {
        self.rules.iter().any(Rule::is_async)
    }

    fn rules_for<'a, 'u>(
        &'a self,
        kind: RuleKind,
        url: &'u str,
    ) -> impl Iterator<Item = &'a Rule<E, D>> + 'u
    where
        'a: 'u,
    {
        self.rules
            .iter()
            .filter(move |rule| rule.kind() == kind && rule.applies_to(url))
    }

    /// Scrape rules applying to `url`, in registration order
    pub fn scraping_rules_for<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a Rule<E, D>> {
        self.rules_for(RuleKind::Scrape, url)
    }

    /// Setup rules applying to `url`, by ascending priority
    pub fn setup_rules_for(&self, url: &str) -> Vec<&Rule<E, D>> {
        by_priority(self.rules_for(RuleKind::Setup, url).collect())
    }

    /// Navigate rules applying to `url`, by ascending priority
    pub fn navigate_rules_for(&self, url: &str) -> Vec<&Rule<E, D>> {
        by_priority(self.rules_for(RuleKind::Navigate, url).collect())
    }

    /// Scrape rules applying to `url`, bucketed by group
    ///
    /// Rules are sorted by `(group, selector, priority)` so a single linear
    /// pass can split them into buckets of equal group; each bucket is then
    /// ordered by priority. The result does not depend on registration
    /// order, except between rules whose sort keys are equal.
    pub fn grouped_scraping_rules_for<'a>(&'a self, url: &'a str) -> Vec<RuleGroup<'a, E, D>> {
        let mut rules: Vec<&Rule<E, D>> = self.scraping_rules_for(url).collect();
        rules.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut buckets: Vec<RuleGroup<'a, E, D>> = Vec::new();
        for rule in rules {
            // resolve() gives every scrape rule a group
            let Some(group) = rule.group_key() else {
                continue;
            };
            match buckets.last_mut() {
                Some(bucket) if bucket.group == group => bucket.rules.push(rule),
                _ => buckets.push(RuleGroup {
                    group,
                    rules: vec![rule],
                }),
            }
        }

        for bucket in &mut buckets {
            bucket.rules.sort_by_key(|rule| rule.priority);
        }

        buckets
    }
}

fn by_priority<E, D>(mut rules: Vec<&Rule<E, D>>) -> Vec<&Rule<E, D>> {
    rules.sort_by_key(|rule| rule.priority);
    rules
}
