//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use webber::config::{Config, CrawlerConfig};
use webber::crawler::Crawler;
use webber::{CrawlPhase, MediaKind, WebberError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with the given crawl budgets
fn create_test_config(max_depth: u32, max_pages: u32, concurrency: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            max_pages,
            concurrency,
            page_timeout_secs: 5,
        },
        ..Config::default()
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<img src="/a.png">
           <img src="https://other.example/b.png">
           <a href="/page1">Page 1</a>
           <a href="/page2">Page 2</a>
           <a href="https://other.example/away">Elsewhere</a>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<img src="/logo.svg"><video src="/clip.mp4" poster="/poster.jpg"></video>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/page2", r#"<img src="/a.png"><a href="/">Home</a>"#, 1).await;

    let crawler = Crawler::new(&create_test_config(2, 100, 3)).expect("Failed to create crawler");
    let report = crawler
        .crawl(&format!("{}/", base_url))
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.phase, CrawlPhase::Drained);
    assert_eq!(
        report.urls(MediaKind::Image),
        vec![
            format!("{}/a.png", base_url),
            format!("{}/poster.jpg", base_url),
            "https://other.example/b.png".to_string(),
        ]
    );
    assert_eq!(report.urls(MediaKind::Vector), vec![format!("{}/logo.svg", base_url)]);
    assert_eq!(report.urls(MediaKind::Video), vec![format!("{}/clip.mp4", base_url)]);
    assert!(report.urls(MediaKind::Font).is_empty());
}

#[tokio::test]
async fn test_cycles_and_variants_visit_each_page_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a><a href="/a#top">A again</a><a href="/b?utm_source=news">B</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/a", r#"<a href="/b">B</a><a href="/">Home</a>"#, 1).await;
    mount_page(&mock_server, "/b", r#"<a href="/a?fbclid=xyz">A</a><a href="/#main">Home</a>"#, 1).await;

    let crawler = Crawler::new(&create_test_config(5, 100, 4)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.pages_visited, 3);
}

#[tokio::test]
async fn test_page_budget_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (1..=10)
        .map(|i| format!(r#"<a href="/p{}">P{}</a><img src="/img{}.png">"#, i, i, i))
        .collect();
    mount_page(&mock_server, "/", &links, 1).await;

    Mock::given(method("GET"))
        .respond_with(html_page(r#"<img src="/shared.gif">"#))
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&create_test_config(3, 3, 2)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 3);

    // No page fails here, so no more than the budget is ever fetched
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.len() <= 3, "fetched {} pages", requests.len());
}

#[tokio::test]
async fn test_depth_limit_stops_descent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/d1">D1</a>"#, 1).await;
    mount_page(&mock_server, "/d1", r#"<a href="/d2">D2</a><img src="/d1.png">"#, 1).await;
    mount_page(&mock_server, "/d2", r#"<img src="/d2.png">"#, 0).await;

    let crawler = Crawler::new(&create_test_config(1, 100, 2)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.urls(MediaKind::Image), vec![format!("{}/d1.png", base_url)]);
}

#[tokio::test]
async fn test_zero_depth_processes_start_page_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/next">Next</a><img src="/a.webp">"#, 1).await;
    mount_page(&mock_server, "/next", "", 0).await;

    let crawler = Crawler::new(&create_test_config(0, 100, 2)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.urls(MediaKind::Image), vec![format!("{}/a.webp", base_url)]);
}

#[tokio::test]
async fn test_stylesheet_fonts_are_discovered() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<link rel="stylesheet" href="/css/site.css">
           <style>@font-face { src: url('/fonts/inline.otf'); }</style>"#,
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/css/site.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"@font-face { src: url("../fonts/main.woff") format("woff"), url(extra.ttf); }
               body { background: url(/bg.png); }"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&create_test_config(1, 10, 1)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(
        report.urls(MediaKind::Font),
        vec![
            format!("{}/css/extra.ttf", base_url),
            format!("{}/fonts/inline.otf", base_url),
            format!("{}/fonts/main.woff", base_url),
        ]
    );
    // Only fonts are taken from stylesheets
    assert!(report.urls(MediaKind::Image).is_empty());
}

#[tokio::test]
async fn test_shared_stylesheet_is_fetched_once_per_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let head = r#"<link rel="stylesheet" href="/site.css">"#;
    mount_page(
        &mock_server,
        "/",
        &format!(r#"{}<a href="/one">1</a><a href="/two">2</a>"#, head),
        1,
    )
    .await;
    mount_page(&mock_server, "/one", head, 1).await;
    mount_page(&mock_server, "/two", head, 1).await;

    Mock::given(method("GET"))
        .and(path("/site.css"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("@font-face { src: url(/f.woff); }"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&create_test_config(2, 10, 3)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.urls(MediaKind::Font), vec![format!("{}/f.woff", base_url)]);
}

#[tokio::test]
async fn test_stylesheet_failure_is_swallowed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<link rel="stylesheet" href="/missing.css"><img src="/ok.png">"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.css"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&create_test_config(1, 10, 1)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.urls(MediaKind::Image), vec![format!("{}/ok.png", base_url)]);
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/broken">B</a><a href="/fine">F</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/fine", r#"<img src="/fine.jpg">"#, 1).await;

    let crawler = Crawler::new(&create_test_config(2, 10, 2)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.urls(MediaKind::Image), vec![format!("{}/fine.jpg", base_url)]);
}

#[tokio::test]
async fn test_failed_start_page_yields_empty_report() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&create_test_config(2, 10, 2)).unwrap();
    let report = crawler.crawl(&format!("{}/", base_url)).await.unwrap();

    assert_eq!(report.pages_processed, 0);
    assert!(report.media.is_empty());
}

#[tokio::test]
async fn test_scan_page_returns_all_kinds() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/gallery",
        r#"<img srcset="/s.jpg 1x, /l.jpg 2x"><object data="/doc.svg"></object>
           <a href="/elsewhere">not followed</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/elsewhere", "", 0).await;

    let crawler = Crawler::new(&Config::default()).unwrap();
    let page = crawler
        .scan_page(&format!("{}/gallery", base_url))
        .await
        .unwrap();

    assert_eq!(page.media.count(MediaKind::Image), 2);
    assert_eq!(page.media.count(MediaKind::Vector), 1);
    assert!(page.links.contains(&format!("{}/elsewhere", base_url)));
}

#[tokio::test]
async fn test_scan_page_failure_is_reported() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&Config::default()).unwrap();
    let result = crawler.scan_page(&format!("{}/missing", base_url)).await;

    assert!(matches!(result, Err(WebberError::Status { status: 404, .. })));
}
