use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, RuleConfig, RuleConfigKind, UserAgentConfig,
};
use crate::output::SaveRegistry;
use crate::url::UrlMatcher;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output, &config.crawler)?;
    validate_rules(&config.rules)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.urls.is_empty() {
        return Err(ConfigError::Validation(
            "At least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.urls {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if !matches!(url.scheme(), "http" | "https" | "file") {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use the http, https or file scheme",
                seed
            )));
        }
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates that a save handler exists for the configured output
fn validate_output_config(
    output: &OutputConfig,
    crawler: &CrawlerConfig,
) -> Result<(), ConfigError> {
    let format = SaveRegistry::resolve_format(&output.format, output.path.as_deref());
    let registry = SaveRegistry::with_builtins();

    if !registry.has_handler(&format, false) {
        return Err(ConfigError::Validation(format!(
            "Unknown output format '{}', expected one of json, csv, yaml, yml, sqlite, db",
            format
        )));
    }

    let per_page = crawler.save_per_page || crawler.follow_links;
    if per_page && !registry.has_handler(&format, true) {
        return Err(ConfigError::Validation(format!(
            "Format '{}' cannot be saved per page (needed by save-per-page and follow-links), use sqlite or db",
            format
        )));
    }

    if matches!(format.as_str(), "sqlite" | "db") && output.path.is_none() {
        return Err(ConfigError::Validation(format!(
            "Format '{}' requires an output path",
            format
        )));
    }

    Ok(())
}

/// Validates `[[rule]]` entries
fn validate_rules(rules: &[RuleConfig]) -> Result<(), ConfigError> {
    for (index, rule) in rules.iter().enumerate() {
        let label = rule
            .name
            .clone()
            .unwrap_or_else(|| format!("rule-{}", index + 1));
        let invalid = |message: String| ConfigError::InvalidRule(format!("{}: {}", label, message));

        rule.selector().map_err(|e| invalid(e.to_string()))?;
        rule.group_selector().map_err(|e| invalid(e.to_string()))?;
        UrlMatcher::glob(&rule.url)
            .map_err(|e| invalid(format!("invalid url pattern '{}': {}", rule.url, e)))?;

        match rule.kind {
            RuleConfigKind::Scrape => {
                if rule.fields.is_empty() {
                    return Err(invalid("scrape rules need at least one field".to_string()));
                }
                rule.field_specs().map_err(|e| invalid(e.to_string()))?;
            }
            RuleConfigKind::Navigate => {
                if !rule.fields.is_empty() {
                    tracing::warn!("Ignoring fields of navigate rule {}", label);
                }
            }
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
