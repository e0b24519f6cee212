//! Robots.txt, crawl delay, link following and request filtering against
//! mock servers

use crate::common::{
    backend, backend_with_rules, column, memory_save, mount_page, mount_page_expect, mount_robots,
    text_handler,
};
use serde_json::json;
use std::time::{Duration, Instant};
use sumi_harvest::config::{CrawlerConfig, OutputConfig};
use sumi_harvest::{Harvester, HtmlBackend};
use wiremock::MockServer;

fn memory_output() -> OutputConfig {
    OutputConfig {
        path: None,
        format: "memory".into(),
    }
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /admin").await;
    mount_page(
        &server,
        "/",
        &format!(
            r#"<h1>Home</h1><a href="{base}/allowed">ok</a><a href="{base}/admin">no</a>"#
        ),
    )
    .await;
    mount_page(&server, "/allowed", "<h1>Allowed</h1>").await;
    mount_page_expect(&server, "/admin", "<h1>Admin</h1>", 0).await;

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("h1", text_handler("title")).unwrap();
    let rows = memory_save(&mut harvester, true);

    let config = CrawlerConfig {
        urls: vec![format!("{}/", base)],
        follow_links: true,
        ..CrawlerConfig::default()
    };
    harvester
        .run_async(backend(), &config, &memory_output())
        .await
        .unwrap();

    assert_eq!(
        column(&rows.borrow(), "title"),
        vec![json!("Home"), json!("Allowed")]
    );
}

#[tokio::test]
async fn test_ignore_robots() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /").await;
    mount_page_expect(&server, "/page", "<h1>Page</h1>", 1).await;

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("h1", text_handler("title")).unwrap();
    let rows = memory_save(&mut harvester, false);

    let config = CrawlerConfig {
        urls: vec![format!("{}/page", base)],
        ignore_robots: true,
        ..CrawlerConfig::default()
    };
    harvester
        .run_async(backend(), &config, &memory_output())
        .await
        .unwrap();

    assert_eq!(column(&rows.borrow(), "title"), vec![json!("Page")]);
}

#[tokio::test]
async fn test_crawl_delay_is_honored() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nCrawl-delay: 0.5").await;
    mount_page(&server, "/a", "<h1>A</h1>").await;
    mount_page(&server, "/b", "<h1>B</h1>").await;

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("h1", text_handler("title")).unwrap();
    let rows = memory_save(&mut harvester, false);

    let config = CrawlerConfig {
        urls: vec![format!("{}/a", base), format!("{}/b", base)],
        ..CrawlerConfig::default()
    };
    let started = Instant::now();
    harvester
        .run_async(backend(), &config, &memory_output())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(1000));
    assert_eq!(
        column(&rows.borrow(), "title"),
        vec![json!("A"), json!("B")]
    );
}

#[tokio::test]
async fn test_unrepresentable_crawl_delay_is_ignored() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nCrawl-delay: 1e30").await;
    mount_page(&server, "/a", "<h1>A</h1>").await;
    mount_page(&server, "/b", "<h1>B</h1>").await;

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("h1", text_handler("title")).unwrap();
    let rows = memory_save(&mut harvester, false);

    let config = CrawlerConfig {
        urls: vec![format!("{}/a", base), format!("{}/b", base)],
        ..CrawlerConfig::default()
    };
    let started = Instant::now();
    harvester
        .run_async(backend(), &config, &memory_output())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(
        column(&rows.borrow(), "title"),
        vec![json!("A"), json!("B")]
    );
}

#[tokio::test]
async fn test_follow_links_with_dedupe() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page_expect(
        &server,
        "/",
        &format!(r#"<h1>Root</h1><a href="/a">a</a><a href="{base}/b">b</a>"#),
        1,
    )
    .await;
    mount_page_expect(
        &server,
        "/a",
        r#"<h1>A</h1><a href="/">home</a><a href="/b">b</a>"#,
        1,
    )
    .await;
    mount_page_expect(&server, "/b", r#"<h1>B</h1><a href="a">a</a>"#, 1).await;

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("h1", text_handler("title")).unwrap();
    let rows = memory_save(&mut harvester, true);

    let config = CrawlerConfig {
        urls: vec![format!("{}/", base)],
        follow_links: true,
        dedupe_urls: true,
        ..CrawlerConfig::default()
    };
    harvester
        .run_async(backend(), &config, &memory_output())
        .await
        .unwrap();

    let rows = rows.borrow();
    assert_eq!(
        column(&rows, "title"),
        vec![json!("Root"), json!("A"), json!("B")]
    );
    assert_eq!(rows[1].page_url, format!("{}/a", base));
}

#[tokio::test]
async fn test_links_outside_seed_domains_are_dropped() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(r#"<h1>Root</h1><a href="{}/elsewhere">x</a>"#, other.uri()),
    )
    .await;
    mount_page_expect(&other, "/elsewhere", "<h1>Elsewhere</h1>", 0).await;

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("h1", text_handler("title")).unwrap();
    let rows = memory_save(&mut harvester, true);

    let config = CrawlerConfig {
        urls: vec![format!("{}/", server.uri())],
        follow_links: true,
        ..CrawlerConfig::default()
    };
    harvester
        .run_async(backend(), &config, &memory_output())
        .await
        .unwrap();

    assert_eq!(column(&rows.borrow(), "title"), vec![json!("Root")]);
}

#[tokio::test]
async fn test_blocked_requests_are_not_sent() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<h1>Root</h1><a href="/banner.html">ad</a><a href="/article.html">read</a>"#,
    )
    .await;
    mount_page_expect(&server, "/banner.html", "<h1>Ad</h1>", 0).await;
    mount_page(&server, "/article.html", "<h1>Article</h1>").await;

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("h1", text_handler("title")).unwrap();
    let rows = memory_save(&mut harvester, true);

    let config = CrawlerConfig {
        urls: vec![format!("{}/", base)],
        follow_links: true,
        ..CrawlerConfig::default()
    };
    let mut crawler = harvester
        .crawler(
            backend_with_rules(&["/banner.html"]),
            &config,
            &memory_output(),
        )
        .unwrap();
    crawler.run().await.unwrap();

    assert_eq!(
        column(&rows.borrow(), "title"),
        vec![json!("Root"), json!("Article")]
    );
    assert_eq!(crawler.stats().blocked, 1);
    assert_eq!(crawler.stats().abandoned, 0);
}
