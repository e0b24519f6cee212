//! Whole-crawl output to files and custom save handlers

use crate::common::{backend, text_handler, write_pages};
use serde_json::Value;
use std::path::PathBuf;
use sumi_harvest::config::{CrawlerConfig, OutputConfig};
use sumi_harvest::output::SqliteOutput;
use sumi_harvest::{HarvestError, Handler, Harvester, HtmlBackend, Record, SaveError, Select};
use tempfile::TempDir;

const LIST: &str = "<ul><li>Apple</li><li>Banana</li><li>Cherry</li></ul>";

fn list_harvester() -> Harvester<HtmlBackend> {
    let mut harvester = Harvester::new();
    harvester
        .select(Select::css("li").group("ul"), text_handler("fruit"))
        .unwrap();
    harvester
}

fn crawl_config(dir: &TempDir, body: &str) -> CrawlerConfig {
    CrawlerConfig {
        urls: write_pages(dir, &[("list.html", body)]),
        ..CrawlerConfig::default()
    }
}

fn output(path: PathBuf, format: &str) -> OutputConfig {
    OutputConfig {
        path: Some(path),
        format: format.into(),
    }
}

#[tokio::test]
async fn test_json_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("fruits.json");

    list_harvester()
        .run_async(backend(), &crawl_config(&dir, LIST), &output(path.clone(), "json"))
        .await
        .unwrap();

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let rows = saved.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["fruit"], "Apple");
    assert_eq!(rows[2]["fruit"], "Cherry");
    assert_eq!(rows[2]["_element_index"], 2);
    assert_eq!(rows[2]["_group_index"], 0);
    assert_eq!(rows[2]["_page_number"], 1);
}

#[tokio::test]
async fn test_extension_overrides_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fruits.csv");

    list_harvester()
        .run_async(backend(), &crawl_config(&dir, LIST), &output(path.clone(), "json"))
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("_element_index,_group_id,_group_index,_page_number,_page_url,fruit")
    );
    assert!(lines.next().unwrap().ends_with(",Apple"));
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn test_yaml_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fruits.yml");

    list_harvester()
        .run_async(backend(), &crawl_config(&dir, LIST), &output(path.clone(), "json"))
        .await
        .unwrap();

    let saved: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let rows = saved.as_sequence().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["fruit"].as_str(), Some("Banana"));
}

#[tokio::test]
async fn test_sqlite_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fruits.db");

    list_harvester()
        .run_async(backend(), &crawl_config(&dir, LIST), &output(path.clone(), "sqlite"))
        .await
        .unwrap();

    let db = SqliteOutput::open(&path).unwrap();
    assert_eq!(db.count().unwrap(), 3);
}

#[tokio::test]
async fn test_nothing_scraped_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");

    list_harvester()
        .run_async(
            backend(),
            &crawl_config(&dir, "<p>no list here</p>"),
            &output(path.clone(), "json"),
        )
        .await
        .unwrap();

    assert!(!path.exists());
}

#[tokio::test]
async fn test_failed_save_keeps_results() {
    let dir = TempDir::new().unwrap();
    let mut harvester = list_harvester();
    harvester.save(
        "custom",
        false,
        Handler::sync(|(_, _): (Vec<Record>, Option<PathBuf>)| Ok(false)),
    );

    let out = OutputConfig {
        path: None,
        format: "custom".into(),
    };
    let mut crawler = harvester
        .crawler(backend(), &crawl_config(&dir, LIST), &out)
        .unwrap();
    let err = crawler.run().await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Save(SaveError::Failed { ref format }) if format == "custom"
    ));
    assert_eq!(crawler.buffer().len(), 3);
}

#[tokio::test]
async fn test_unknown_format_is_an_error() {
    let dir = TempDir::new().unwrap();
    let out = OutputConfig {
        path: None,
        format: "xml".into(),
    };

    let err = list_harvester()
        .run_async(backend(), &crawl_config(&dir, LIST), &out)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Save(SaveError::NoHandler { per_page: false, .. })
    ));
}
