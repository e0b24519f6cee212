//! End-to-end crawls over local pages

use crate::common::{backend, column, memory_save, text_handler, write_pages};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use sumi_harvest::config::{CrawlerConfig, OutputConfig};
use sumi_harvest::{Data, Handler, Harvester, HtmlBackend, HtmlElement, HtmlPage, Request, Select};
use tempfile::TempDir;

fn crawl_config(urls: Vec<String>, max_pages: u32) -> CrawlerConfig {
    CrawlerConfig {
        urls,
        max_pages,
        ..CrawlerConfig::default()
    }
}

fn memory_output() -> OutputConfig {
    OutputConfig {
        path: None,
        format: "memory".into(),
    }
}

#[tokio::test]
async fn test_list_items_share_group() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(
        &dir,
        &[(
            "list.html",
            "<html><body><ul><li>Apple</li><li>Banana</li><li>Cherry</li></ul></body></html>",
        )],
    );

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester
        .select(Select::css("li").group("ul"), text_handler("fruit"))
        .unwrap();
    let rows = memory_save(&mut harvester, false);

    harvester
        .run_async(backend(), &crawl_config(urls.clone(), 1), &memory_output())
        .await
        .unwrap();

    let rows = rows.borrow();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        column(&rows, "fruit"),
        vec![json!("Apple"), json!("Banana"), json!("Cherry")]
    );
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.element_index, index);
        assert_eq!(row.group_index, 0);
        assert_eq!(row.group_id, rows[0].group_id);
        assert_eq!(row.page_number, 1);
        assert_eq!(row.page_url, urls[0]);
    }
}

#[tokio::test]
async fn test_rules_on_same_elements_merge() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(
        &dir,
        &[(
            "items.html",
            r#"<div class="item"><span data-id="1">One</span></div>
               <div class="item"><span data-id="2">Two</span></div>"#,
        )],
    );

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester
        .select(Select::css("span").group(".item"), text_handler("label"))
        .unwrap()
        .select(
            Select::css("span").group(".item"),
            Handler::sync(|element: HtmlElement| {
                let mut data = Data::new();
                data.insert("id".into(), json!(element.attr("data-id")));
                Ok(data)
            }),
        )
        .unwrap();
    let rows = memory_save(&mut harvester, false);

    harvester
        .run_async(backend(), &crawl_config(urls, 1), &memory_output())
        .await
        .unwrap();

    let rows = rows.borrow();
    assert_eq!(rows.len(), 2);
    assert_eq!(column(&rows, "label"), vec![json!("One"), json!("Two")]);
    assert_eq!(column(&rows, "id"), vec![json!("1"), json!("2")]);
    assert_eq!(rows[0].group_index, 0);
    assert_eq!(rows[1].group_index, 1);
}

#[tokio::test]
async fn test_pagination_respects_page_budget() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(
        &dir,
        &[
            ("p1.html", r#"<h1>first</h1><a class="next" href="p2.html">next</a>"#),
            ("p2.html", r#"<h1>second</h1><a class="next" href="p3.html">next</a>"#),
            ("p3.html", r#"<h1>third</h1>"#),
        ],
    );

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester
        .select("h1", text_handler("heading"))
        .unwrap()
        .navigate(
            Select::css("a.next"),
            Handler::sync(|(element, page): (HtmlElement, HtmlPage)| {
                page.follow(&element);
                Ok(())
            }),
        )
        .unwrap();
    let rows = memory_save(&mut harvester, false);

    harvester
        .run_async(backend(), &crawl_config(vec![urls[0].clone()], 2), &memory_output())
        .await
        .unwrap();

    let rows = rows.borrow();
    assert_eq!(column(&rows, "heading"), vec![json!("first"), json!("second")]);
    assert_eq!(rows[0].page_number, 1);
    assert_eq!(rows[1].page_number, 2);
    assert_eq!(rows[1].page_url, urls[1]);
}

#[tokio::test]
async fn test_pagination_in_directory_with_space() {
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("my site");
    std::fs::create_dir(&site).unwrap();
    std::fs::write(
        site.join("p1.html"),
        r#"<h1>first</h1><a class="next" href="p2.html">next</a>"#,
    )
    .unwrap();
    std::fs::write(site.join("p2.html"), "<h1>second</h1>").unwrap();
    let seed = format!("file://{}", site.join("p1.html").display());

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester
        .select("h1", text_handler("heading"))
        .unwrap()
        .navigate(
            Select::css("a.next"),
            Handler::sync(|(element, page): (HtmlElement, HtmlPage)| {
                page.follow(&element);
                Ok(())
            }),
        )
        .unwrap();
    let rows = memory_save(&mut harvester, false);

    harvester
        .run_async(backend(), &crawl_config(vec![seed], 2), &memory_output())
        .await
        .unwrap();

    let rows = rows.borrow();
    assert_eq!(column(&rows, "heading"), vec![json!("first"), json!("second")]);
    assert!(rows[1].page_url.ends_with("my%20site/p2.html"));
}

#[tokio::test]
async fn test_url_glob_limits_rule() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(
        &dir,
        &[("a.html", "<p>from a</p>"), ("b.html", "<p>from b</p>")],
    );

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester
        .select(Select::css("p").url("*/b.html"), text_handler("text"))
        .unwrap();
    let rows = memory_save(&mut harvester, false);

    harvester
        .run_async(backend(), &crawl_config(urls, 1), &memory_output())
        .await
        .unwrap();

    assert_eq!(column(&rows.borrow(), "text"), vec![json!("from b")]);
}

#[tokio::test]
async fn test_async_handlers() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(&dir, &[("a.html", "<p>one</p><p>two</p>")]);

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester
        .select(
            "p",
            Handler::from_async(|element: HtmlElement| async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                let mut data = Data::new();
                data.insert("text".into(), json!(element.text().to_uppercase()));
                Ok(data)
            }),
        )
        .unwrap();
    let rows = memory_save(&mut harvester, false);
    assert!(harvester.has_async());

    harvester
        .run_async(backend(), &crawl_config(urls, 1), &memory_output())
        .await
        .unwrap();

    assert_eq!(
        column(&rows.borrow(), "text"),
        vec![json!("ONE"), json!("TWO")]
    );
}

#[test]
fn test_sync_run() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(&dir, &[("a.html", "<p>only</p>")]);

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("p", text_handler("text")).unwrap();
    let rows = memory_save(&mut harvester, false);
    assert!(!harvester.has_async());

    harvester
        .run(backend(), &crawl_config(urls, 1), &memory_output())
        .unwrap();

    assert_eq!(column(&rows.borrow(), "text"), vec![json!("only")]);
}

#[tokio::test]
async fn test_handlers_queue_urls() {
    let dir = TempDir::new().unwrap();
    let urls = write_pages(
        &dir,
        &[
            ("index.html", r#"<p>index</p><span class="more">detail.html</span>"#),
            ("detail.html", "<p>detail</p>"),
            ("extra.html", "<p>extra</p>"),
        ],
    );

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    let handle = harvester.handle();
    let detail_url = urls[1].clone();
    harvester
        .select("p", text_handler("text"))
        .unwrap()
        .select(
            "span.more",
            Handler::sync(move |_: HtmlElement| {
                handle.follow_url(detail_url.clone());
                Ok(Data::new())
            }),
        )
        .unwrap();

    let extra_url = urls[2].clone();
    harvester.start_requests(Handler::sync(move |_: ()| {
        Ok(vec![Request::get(extra_url.clone())])
    }));

    let seen: Rc<RefCell<Vec<Option<String>>>> = Rc::default();
    let seen_sink = Rc::clone(&seen);
    let handle = harvester.handle();
    harvester.pre_setup(Handler::sync(move |_: HtmlPage| {
        seen_sink.borrow_mut().push(handle.current_url());
        Ok(())
    }));
    let rows = memory_save(&mut harvester, false);

    harvester
        .run_async(backend(), &crawl_config(vec![urls[0].clone()], 1), &memory_output())
        .await
        .unwrap();

    let texts = column(&rows.borrow(), "text");
    assert_eq!(texts.len(), 3);
    for expected in ["index", "detail", "extra"] {
        assert!(texts.contains(&json!(expected)), "missing {}", expected);
    }
    assert_eq!(
        *seen.borrow(),
        vec![
            Some(urls[0].clone()),
            Some(urls[2].clone()),
            Some(urls[1].clone())
        ]
    );
}

#[tokio::test]
async fn test_missing_page_is_skipped() {
    let dir = TempDir::new().unwrap();
    let mut urls = write_pages(&dir, &[("a.html", "<p>present</p>")]);
    urls.insert(0, format!("file://{}/missing.html", dir.path().display()));

    let mut harvester: Harvester<HtmlBackend> = Harvester::new();
    harvester.select("p", text_handler("text")).unwrap();
    let rows = memory_save(&mut harvester, false);

    let mut crawler = harvester
        .crawler(backend(), &crawl_config(urls, 1), &memory_output())
        .unwrap();
    crawler.run().await.unwrap();

    assert_eq!(column(&rows.borrow(), "text"), vec![json!("present")]);
    let stats = crawler.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.abandoned, 1);
    assert_eq!(stats.pages, 1);
}
