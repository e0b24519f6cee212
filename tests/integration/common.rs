//! Shared helpers for the integration tests

use reqwest::Client;
use serde_json::json;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use sumi_harvest::{Data, Handler, Harvester, HtmlBackend, HtmlElement, Record, RequestGate};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes each `(file name, body)` pair and returns their `file://` URLs
pub fn write_pages(dir: &TempDir, pages: &[(&str, &str)]) -> Vec<String> {
    pages
        .iter()
        .map(|(name, body)| {
            let path = dir.path().join(name);
            std::fs::write(&path, body).expect("Failed to write page");
            format!("file://{}", path.display())
        })
        .collect()
}

/// A backend with a plain client and no request filter
pub fn backend() -> HtmlBackend {
    HtmlBackend::with_client(Client::new(), RequestGate::default())
}

pub fn backend_with_rules(rules: &[&str]) -> HtmlBackend {
    HtmlBackend::with_client(Client::new(), RequestGate::new(rules))
}

/// Scrape handler storing the element text under `key`
pub fn text_handler(key: &'static str) -> Handler<HtmlElement, Data> {
    Handler::sync(move |element: HtmlElement| {
        let mut data = Data::new();
        data.insert(key.into(), json!(element.text()));
        Ok(data)
    })
}

/// Registers a `memory` save format collecting every saved row
pub fn memory_save(
    harvester: &mut Harvester<HtmlBackend>,
    per_page: bool,
) -> Rc<RefCell<Vec<Record>>> {
    let rows: Rc<RefCell<Vec<Record>>> = Rc::default();
    let sink = Rc::clone(&rows);
    harvester.save(
        "memory",
        per_page,
        Handler::sync(move |(batch, _): (Vec<Record>, Option<PathBuf>)| {
            sink.borrow_mut().extend(batch);
            Ok(true)
        }),
    );
    rows
}

/// Mounts a GET handler serving `body` as HTML at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a GET handler serving `body` as HTML, expected exactly `times`
pub async fn mount_page_expect(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Values of `key` across rows, in order
pub fn column(rows: &[Record], key: &str) -> Vec<serde_json::Value> {
    rows.iter()
        .map(|row| row.data.get(key).cloned().unwrap_or_default())
        .collect()
}
