//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: ledger, page artifacts and aggregates.

use site_insights::config::Config;
use site_insights::crawler::run_crawl;
use site_insights::output::{read_keyword_frequency, ProjectLayout};
use site_insights::storage::{open_storage, LedgerStore, RunStatus};
use site_insights::{InsightsError, Ledger, UrlStatus};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "test-site";

/// Creates a test configuration writing into `root`
fn create_test_config(root: &TempDir) -> Config {
    let mut config = Config::default();
    config.output.root_dir = root.path().to_string_lossy().to_string();
    config.crawler.workers = 2;
    config.crawler.backoff_base_ms = 10;
    config.crawler.backoff_max_ms = 20;
    config.crawler.crawl_delay_ms = Some(0);
    config
}

fn layout(root: &TempDir) -> ProjectLayout {
    ProjectLayout::for_project(root.path(), PROJECT)
}

fn load_ledger(root: &TempDir) -> Ledger {
    let storage = open_storage(&layout(root).ledger_db()).expect("open ledger");
    storage.load_ledger().expect("load ledger")
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    let html = format!(
        "<html><head><title>{}</title><meta name=\"description\" content=\"{} page\"></head>\
         <body><h1>{}</h1><p>{}</p></body></html>",
        title, title, title, body
    );
    ResponseTemplate::new(200).set_body_raw(html.into_bytes(), "text/html")
}

fn sitemap(urls: &[String]) -> ResponseTemplate {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );
    for url in urls {
        xml.push_str(&format!("<url><loc>{}</loc></url>", url));
    }
    xml.push_str("</urlset>");
    ResponseTemplate::new(200).set_body_string(xml)
}

async fn mount_page(server: &MockServer, route: &str, title: &str, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, "crawled content about gardens and tomatoes"))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

async fn mount_sitemap(server: &MockServer, routes: &[&str]) {
    let urls: Vec<String> = routes
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(sitemap(&urls))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_and_exhausted_retries() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);

    mount_page(&server, "/", "Home", 1).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    mount_sitemap(&server, &["/b"]).await;

    let run = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .expect("crawl should finish");

    let home_url = format!("{}/", server.uri());
    let b_url = format!("{}/b", server.uri());

    assert_eq!(run.pages_processed, 1);
    assert_eq!(run.pages_failed, 1);
    assert_eq!(run.failed_urls(), vec![b_url.as_str()]);
    assert!(!run.failures[0].permanent);

    let ledger = load_ledger(&root);
    let home = ledger.get(&home_url).expect("home row");
    assert_eq!(home.status, UrlStatus::Visited);
    assert!(home.last_visited.is_some());
    assert_eq!(ledger.get(&b_url).expect("b row").status, UrlStatus::Pending);

    let layout = layout(&root);
    assert!(layout.markdown_path("home.md").is_file());
    assert!(layout.json_path("home.json").is_file());
    assert!(layout.index_md().is_file());
    assert!(layout.index_json().is_file());
    assert!(layout.external_urls_md().is_file());
    assert!(layout.keyword_csv("127.0.0.1").is_file());
    assert!(layout.ledger_csv("127.0.0.1").is_file());

    let records: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(layout.ledger_json("127.0.0.1")).unwrap())
            .unwrap();
    assert_eq!(records.as_array().map(Vec::len), Some(2));
    assert_eq!(records[0]["URL"], home_url.as_str());

    let storage = open_storage(&layout.ledger_db()).unwrap();
    let last_run = storage.get_latest_run().unwrap().expect("run recorded");
    assert_eq!(last_run.status, RunStatus::Completed);
    assert_eq!(last_run.pages_processed, 1);
    assert_eq!(last_run.pages_failed, 1);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);

    mount_page(&server, "/", "Home", 1).await;
    mount_page(&server, "/about", "About", 1).await;
    mount_sitemap(&server, &["/about"]).await;

    let first = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.pages_processed, 2);
    let ledger_after_first = load_ledger(&root);
    let keywords_after_first =
        std::fs::read_to_string(layout(&root).keyword_csv("127.0.0.1")).unwrap();

    let second = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.pages_processed, 0);
    assert_eq!(second.pages_failed, 0);
    assert_eq!(load_ledger(&root), ledger_after_first);
    assert_eq!(
        std::fs::read_to_string(layout(&root).keyword_csv("127.0.0.1")).unwrap(),
        keywords_after_first
    );
}

#[tokio::test]
async fn test_page_budget_is_respected() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut config = create_test_config(&root);
    config.crawler.max_pages = 3;

    let routes = ["/p1", "/p2", "/p3", "/p4", "/p5"];
    mount_page(&server, "/", "Home", 1).await;
    for route in routes {
        mount_page(&server, route, "Page", 1).await;
    }
    mount_sitemap(&server, &routes).await;

    let first = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.pages_processed, 3);
    let ledger = load_ledger(&root);
    assert_eq!(ledger.count_by_status(UrlStatus::Visited), 3);
    assert_eq!(ledger.count_by_status(UrlStatus::Pending), 3);

    let second = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.pages_processed, 3);
    assert_eq!(load_ledger(&root).count_by_status(UrlStatus::Visited), 6);
}

#[tokio::test]
async fn test_each_url_fetched_at_most_once_per_run() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut config = create_test_config(&root);
    config.crawler.workers = 8;

    let routes: Vec<String> = (0..10).map(|i| format!("/article-{}", i)).collect();
    let route_refs: Vec<&str> = routes.iter().map(String::as_str).collect();
    mount_page(&server, "/", "Home", 1).await;
    for route in &route_refs {
        mount_page(&server, route, "Article", 1).await;
    }
    // Listing the same URL twice must not produce a second fetch
    let mut listed = route_refs.clone();
    listed.push("/article-0");
    mount_sitemap(&server, &listed).await;

    let run = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.pages_processed, 11);
    assert_eq!(load_ledger(&root).len(), 11);
}

#[tokio::test]
async fn test_sitemap_root_without_slash_is_the_seed_url() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);

    mount_page(&server, "/", "Home", 1).await;
    // `http://host:port` and `http://host:port/` are the same page
    mount_sitemap(&server, &["", "/#top"]).await;

    let run = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.pages_processed, 1);

    let ledger = load_ledger(&root);
    assert_eq!(ledger.len(), 1);
    assert!(ledger.contains(&format!("{}/", server.uri())));

    let keywords = read_keyword_frequency(&layout(&root).keyword_csv("127.0.0.1")).unwrap();
    assert_eq!(keywords.get("tomatoes"), Some(&1));
}

#[cfg(not(feature = "browser"))]
#[tokio::test]
async fn test_browser_fetching_needs_feature() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut config = create_test_config(&root);
    config.crawler.browser = true;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new()).await;

    assert!(matches!(result, Err(InsightsError::Config(_))));
    assert!(!layout(&root).ledger_db().exists());
}

#[tokio::test]
async fn test_sitemap_disabled() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut config = create_test_config(&root);
    config.crawler.use_sitemap = false;

    mount_page(&server, "/", "Home", 1).await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let run = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.pages_processed, 1);
    assert_eq!(load_ledger(&root).len(), 1);
}

#[tokio::test]
async fn test_project_document_merges_across_runs() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut config = create_test_config(&root);
    config.crawler.max_pages = 1;

    mount_page(&server, "/", "Home", 1).await;
    mount_page(&server, "/about", "About", 1).await;
    mount_sitemap(&server, &["/about"]).await;

    run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    let project_path = layout(&root).project_json(PROJECT);
    let first: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&project_path).unwrap()).unwrap();
    assert_eq!(first["pages_count"], 1);

    // Distinct timestamps between the two documents
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&project_path).unwrap()).unwrap();

    assert_eq!(second["pages_count"], 2);
    assert_eq!(second["created_at"], first["created_at"]);
    assert_ne!(second["last_updated_at"], first["last_updated_at"]);

    let slugs: Vec<&str> = second["pages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["slug"].as_str())
        .collect();
    assert_eq!(slugs, vec!["home", "about"]);
}

#[tokio::test]
async fn test_missing_artifact_is_refetched() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);

    mount_page(&server, "/", "Home", 2).await;

    run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    std::fs::remove_file(layout(&root).markdown_path("home.md")).unwrap();

    let run = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.pages_processed, 1);
    assert!(layout(&root).markdown_path("home.md").is_file());
}

#[tokio::test]
async fn test_not_found_marks_failed_then_retries_next_run() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);

    mount_page(&server, "/", "Home", 1).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    mount_sitemap(&server, &["/gone"]).await;

    let gone = format!("{}/gone", server.uri());

    let first = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    assert!(first.failures[0].permanent);
    assert_eq!(load_ledger(&root).get(&gone).unwrap().status, UrlStatus::Failed);

    let second = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.failed_urls(), vec![gone.as_str()]);
}

#[tokio::test]
async fn test_legacy_ledger_csv_is_imported() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut config = create_test_config(&root);
    config.crawler.use_sitemap = false;

    mount_page(&server, "/", "Home", 1).await;
    mount_page(&server, "/legacy", "Legacy", 1).await;

    let layout = layout(&root);
    layout.ensure_dirs().unwrap();
    std::fs::write(
        layout.ledger_csv("127.0.0.1"),
        format!("URL,Status,Data,MD File\n{}/legacy,2,,\n", server.uri()),
    )
    .unwrap();

    let run = run_crawl(&config, PROJECT, &server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.pages_processed, 2);
    let ledger = load_ledger(&root);
    assert_eq!(ledger.entries()[0].url, format!("{}/legacy", server.uri()));
    assert_eq!(ledger.count_by_status(UrlStatus::Visited), 2);
}

#[tokio::test]
async fn test_cancelled_run_keeps_urls_pending() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let config = create_test_config(&root);

    mount_page(&server, "/", "Home", 0).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let run = run_crawl(&config, PROJECT, &server.uri(), cancel)
        .await
        .unwrap();

    assert!(run.cancelled);
    assert_eq!(run.pages_processed, 0);
    assert_eq!(
        load_ledger(&root).count_by_status(UrlStatus::Pending),
        1
    );

    let storage = open_storage(&layout(&root).ledger_db()).unwrap();
    assert_eq!(
        storage.get_latest_run().unwrap().unwrap().status,
        RunStatus::Cancelled
    );
}
