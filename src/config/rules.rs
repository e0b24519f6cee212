//! Building a harvester from `[[rule]]` entries
//!
//! Config rules are the declarative counterpart of registering handlers in
//! code: a scrape rule maps output field names to what is read from each
//! matched element, and a navigate rule follows the link of the first
//! matched element.

use crate::backend::{HtmlBackend, HtmlElement, HtmlPage};
use crate::config::types::{Config, RuleConfig, RuleConfigKind};
use crate::extract::Data;
use crate::harvester::{Harvester, Select};
use crate::rules::{Handler, Selector, SelectorParts};
use crate::{ConfigError, HarvestError, SelectorError};
use serde_json::Value;
use std::collections::HashSet;

/// What a configured field reads from an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// Trimmed text content
    Text,
    /// Outer HTML
    Html,
    /// Value of an attribute, `null` when absent
    Attr(String),
}

impl FieldSpec {
    /// Parses `text`, `html` or `attr:<name>`
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        match spec.trim() {
            "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            other => match other.strip_prefix("attr:").map(str::trim) {
                Some(name) if !name.is_empty() => Ok(Self::Attr(name.to_string())),
                _ => Err(ConfigError::InvalidRule(format!(
                    "Unknown field extraction '{}', expected text, html or attr:<name>",
                    spec
                ))),
            },
        }
    }

    pub fn read(&self, element: &HtmlElement) -> Value {
        match self {
            Self::Text => Value::String(element.text()),
            Self::Html => Value::String(element.html()),
            Self::Attr(name) => element.attr(name).map(Value::String).unwrap_or(Value::Null),
        }
    }
}

impl RuleConfig {
    /// The rule's selector; exactly one selector field must be set
    pub fn selector(&self) -> Result<Selector, SelectorError> {
        Selector::from_parts(SelectorParts {
            selector: self.selector.clone(),
            css: self.css.clone(),
            xpath: self.xpath.clone(),
            text: self.text.clone(),
            regex: self.regex.clone(),
        })
    }

    /// The rule's explicit group, if any group field is set
    pub fn group_selector(&self) -> Result<Option<Selector>, SelectorError> {
        let parts = SelectorParts {
            selector: self.group.clone(),
            css: self.group_css.clone(),
            xpath: self.group_xpath.clone(),
            text: self.group_text.clone(),
            regex: self.group_regex.clone(),
        };
        if parts.is_empty() {
            return Ok(None);
        }
        Selector::from_parts(parts).map(Some)
    }

    /// The parsed `fields` table, in field name order
    pub fn field_specs(&self) -> Result<Vec<(String, FieldSpec)>, ConfigError> {
        self.fields
            .iter()
            .map(|(name, spec)| Ok((name.clone(), FieldSpec::parse(spec)?)))
            .collect()
    }
}

/// Registers every configured rule on a new harvester
///
/// Unnamed rules are named `rule-<n>` after their 1-based position. Rules
/// sharing a name without a group of their own use the group of the first
/// of them that declares one.
pub fn harvester_from_config(config: &Config) -> Result<Harvester<HtmlBackend>, HarvestError> {
    let mut harvester = Harvester::new();
    harvester.user_agent(config.user_agent.clone());
    let mut grouped = HashSet::new();

    for (index, rule) in config.rules.iter().enumerate() {
        let name = rule
            .name
            .clone()
            .unwrap_or_else(|| format!("rule-{}", index + 1));

        let mut select = Select::new(rule.selector()?)
            .url(rule.url.clone())
            .priority(rule.priority)
            .name(name.clone());
        if let Some(group) = rule.group_selector()? {
            if grouped.insert(name.clone()) {
                harvester.group(&name, group.clone())?;
            }
            select = select.group(group);
        }

        match rule.kind {
            RuleConfigKind::Scrape => {
                let fields = rule.field_specs()?;
                harvester.select(
                    select,
                    Handler::sync(move |element: HtmlElement| {
                        let mut data = Data::new();
                        for (name, spec) in &fields {
                            data.insert(name.clone(), spec.read(&element));
                        }
                        Ok(data)
                    }),
                )?;
            }
            RuleConfigKind::Navigate => {
                harvester.navigate(
                    select,
                    Handler::sync(|(element, page): (HtmlElement, HtmlPage)| {
                        if !page.follow(&element) {
                            tracing::debug!("Navigation element on {} has no link", page.url());
                        }
                        Ok(())
                    }),
                )?;
            }
        }
    }

    tracing::debug!("Registered {} rules from config", harvester.rule_count());
    Ok(harvester)
}
