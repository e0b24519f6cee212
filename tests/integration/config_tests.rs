//! Crawls declared entirely in a TOML config file

use crate::common::{backend, write_pages};
use serde_json::Value;
use sumi_harvest::config::{harvester_from_config, load_config};
use sumi_harvest::ConfigError;
use tempfile::TempDir;

const PAGE_ONE: &str = r#"<html><body>
    <div class="item"><a class="title" href="/one">One</a><span class="price">1</span></div>
    <div class="item"><a class="title" href="/two">Two</a></div>
    <a class="next" href="page2.html">Next</a>
</body></html>"#;

const PAGE_TWO: &str = r#"<html><body>
    <div class="item"><a class="title" href="/three">Three</a><span class="price">3</span></div>
</body></html>"#;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("harvest.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_config_driven_crawl() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(&dir, &[("page1.html", PAGE_ONE), ("page2.html", PAGE_TWO)]);
    let output = dir.path().join("items.json");

    let config_path = write_config(
        &dir,
        &format!(
            r#"
[crawler]
urls = ["{seed}"]
max-pages = 5

[output]
path = "{output}"

[[rule]]
name = "items"
css = ".title"
group-css = ".item"
fields = {{ title = "text", link = "attr:href" }}

[[rule]]
name = "items"
css = ".price"
fields = {{ price = "text" }}

[[rule]]
kind = "navigate"
css = "a.next"
"#,
            seed = urls[0],
            output = output.display()
        ),
    );

    let config = load_config(&config_path).unwrap();
    let harvester = harvester_from_config(&config).unwrap();
    assert_eq!(harvester.rule_count(), 3);

    harvester
        .run_async(backend(), &config.crawler, &config.output)
        .await
        .unwrap();

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let rows = saved.as_array().unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0]["title"], "One");
    assert_eq!(rows[0]["link"], "/one");
    assert_eq!(rows[0]["price"], "1");
    assert_eq!(rows[1]["title"], "Two");
    assert!(rows[1].get("price").is_none());
    assert_eq!(rows[1]["_group_index"], 1);

    assert_eq!(rows[2]["title"], "Three");
    assert_eq!(rows[2]["_page_number"], 2);
    assert_eq!(rows[2]["_page_url"], urls[1].as_str());
}

#[test]
fn test_config_with_bad_rule_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        &dir,
        r#"
[crawler]
urls = ["https://example.com/"]

[[rule]]
css = "li"
xpath = "//li"
fields = { name = "text" }
"#,
    );

    match load_config(&config_path).unwrap_err() {
        ConfigError::InvalidRule(message) => assert!(message.starts_with("rule-1")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_config_without_seeds_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, "[crawler]\nurls = []\n");

    assert!(matches!(
        load_config(&config_path).unwrap_err(),
        ConfigError::Validation(_)
    ));
}
