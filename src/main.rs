//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest scraper. Rules
//! are declared in the TOML configuration file.

use clap::Parser;
use std::path::PathBuf;
use sumi_harvest::config::{harvester_from_config, load_config_with_hash, validate, Config};
use sumi_harvest::ConfigError;
use sumi_harvest::{HtmlBackend, RequestGate};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a declarative, polite web scraper
///
/// Sumi-Harvest visits the configured seed URLs while respecting robots.txt
/// and crawl delays, extracts the fields declared by the configured rules
/// and writes them as JSON, CSV, YAML or SQLite.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A declarative, polite web scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Output file, overriding the config
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output format, overriding the config
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Maximum pages per seed, overriding the config
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Ignore robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Follow every link of every loaded page
    #[arg(long)]
    follow_links: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded config and
    /// validates the result
    fn apply_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
        if let Some(format) = &self.format {
            config.output.format = format.clone();
        }
        if let Some(pages) = self.pages {
            config.crawler.max_pages = pages;
        }
        config.crawler.ignore_robots |= self.ignore_robots;
        config.crawler.follow_links |= self.follow_links;
        validate(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = cli.apply_overrides(&mut config) {
        tracing::error!("Invalid command-line overrides: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so scraped output on stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let harvester = harvester_from_config(config)?;

    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Follow links: {}", config.crawler.follow_links);
    println!("  Save per page: {}", config.crawler.save_per_page);
    println!("  Ignore robots.txt: {}", config.crawler.ignore_robots);
    println!("  Dedupe URLs: {}", config.crawler.dedupe_urls);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    if let Some(url) = &config.user_agent.contact_url {
        println!("  Contact URL: {}", url);
    }
    if let Some(email) = &config.user_agent.contact_email {
        println!("  Contact Email: {}", email);
    }

    println!("\nOutput:");
    match &config.output.path {
        Some(path) => println!("  Path: {}", path.display()),
        None => println!("  Path: <stdout>"),
    }
    println!("  Format: {}", config.output.format);

    println!("\nAd-block rules: {}", config.adblock.rules.len());

    println!("\nRules ({}):", harvester.rule_count());
    for (index, rule) in config.rules.iter().enumerate() {
        let selector = rule.selector()?;
        println!(
            "  - {} {:?} {} (url: {}, priority: {})",
            rule.name
                .clone()
                .unwrap_or_else(|| format!("rule-{}", index + 1)),
            rule.kind,
            selector,
            rule.url,
            rule.priority
        );
    }

    println!("\nSeed URLs ({}):", config.crawler.urls.len());
    for url in &config.crawler.urls {
        println!("  * {}", url);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let harvester = harvester_from_config(config)?;
    let gate = RequestGate::new(&config.adblock.rules);
    let backend = HtmlBackend::new(&config.user_agent, gate)?;

    tracing::info!(
        "Seed URLs: {}, rules: {}, ad-block rules: {}",
        config.crawler.urls.len(),
        harvester.rule_count(),
        config.adblock.rules.len()
    );

    match harvester
        .run_async(backend, &config.crawler, &config.output)
        .await
    {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
