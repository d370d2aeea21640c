//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::path::Path;
use sumi_mirror::config::{
    Config, CrawlerConfig, OutputConfig, SegmentConfig, TargetConfig, UserAgentConfig,
};
use sumi_mirror::crawler::{crawl, Coordinator};
use sumi_mirror::{CrawlPhase, DownloadOutcome, MirrorError};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `destination`
fn create_test_config(destination: &Path, max_retries: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_retries,
            timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        segments: SegmentConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            destination: destination.display().to_string(),
            summary_path: None,
        },
        targets: TargetConfig::default(),
    }
}

async fn mount_get(server: &MockServer, route: &str, content_type: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

async fn mount_head(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn success_urls(outcomes: &[DownloadOutcome]) -> Vec<String> {
    outcomes.iter().map(|o| o.url().path().to_string()).collect()
}

#[tokio::test]
async fn test_full_crawl_html_json_hls() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_head(&server).await;

    mount_get(
        &server,
        "/",
        "text/html",
        r#"<html><body>
            <a href="/api/streams.json">Streams</a>
            <script src="/app.js"></script>
            </body></html>"#
            .to_string(),
    )
    .await;
    mount_get(
        &server,
        "/api/streams.json",
        "application/json",
        format!(r#"{{"live": {{"hls": "{}/live/index.m3u8"}}}}"#, base_url),
    )
    .await;
    mount_get(&server, "/app.js", "application/javascript", "let x = 1;".to_string()).await;
    mount_get(
        &server,
        "/live/index.m3u8",
        "application/vnd.apple.mpegurl",
        "#EXTM3U\n#EXTINF:10,\nseg0.ts\n#EXTINF:10,\nseg1.ts\n".to_string(),
    )
    .await;
    mount_get(&server, "/live/seg0.ts", "video/mp2t", "zero".to_string()).await;
    mount_get(&server, "/live/seg1.ts", "video/mp2t", "one".to_string()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 0);
    let seed = Url::parse(&format!("{}/", base_url)).unwrap();

    let report = crawl(&config, seed).await.expect("Crawl failed");

    assert_eq!(
        success_urls(report.log.successes()),
        vec![
            "/",
            "/api/streams.json",
            "/app.js",
            "/live/index.m3u8",
            "/live/seg0.ts",
            "/live/seg1.ts"
        ]
    );
    assert!(report.log.failures().is_empty());
    assert_eq!(report.processed, 6);

    let host_dir = dir.path().join("127.0.0.1");
    assert!(!std::fs::read(host_dir.join("file")).unwrap().is_empty());
    assert_eq!(
        std::fs::read_to_string(host_dir.join("live/seg1.ts")).unwrap(),
        "one"
    );
    assert!(host_dir.join("api/streams.json").exists());
}

#[tokio::test]
async fn test_unavailable_seed_aborts_before_fetching() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);
    let mut coordinator = Coordinator::from_config(&config).unwrap();

    let result = coordinator
        .run(Url::parse("http://127.0.0.1:1/").unwrap())
        .await;

    assert!(matches!(result, Err(MirrorError::Unavailable { .. })));
    assert_eq!(coordinator.phase(), CrawlPhase::Aborted);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    mount_head(&server).await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("finally", "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);
    let seed = Url::parse(&format!("{}/flaky", server.uri())).unwrap();

    let report = crawl(&config, seed).await.unwrap();

    assert_eq!(report.log.successes().len(), 1);
    assert!(report.log.failures().is_empty());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("127.0.0.1/flaky")).unwrap(),
        "finally"
    );
}

#[tokio::test]
async fn test_failed_links_are_reported_and_crawl_continues() {
    let server = MockServer::start().await;
    mount_head(&server).await;

    mount_get(
        &server,
        "/",
        "text/html",
        r#"<a href="/missing">gone</a><img src="/logo.png"><a>no href</a>"#.to_string(),
    )
    .await;
    mount_get(&server, "/logo.png", "image/png", "png".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 2);
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();

    let report = crawl(&config, seed).await.unwrap();

    assert_eq!(success_urls(report.log.successes()), vec!["/", "/logo.png"]);
    assert_eq!(report.log.failed_urls().len(), 1);
    match &report.log.failures()[0] {
        DownloadOutcome::Failure {
            url,
            error,
            retries,
        } => {
            assert_eq!(url.path(), "/missing");
            assert!(error.contains("404"));
            assert_eq!(*retries, 2);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!dir.path().join("127.0.0.1/missing").exists());
}

#[tokio::test]
async fn test_charset_html_is_not_parsed() {
    let server = MockServer::start().await;
    mount_head(&server).await;

    mount_get(
        &server,
        "/",
        "text/html; charset=utf-8",
        r#"<a href="/never">never</a>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 0);
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();

    let report = crawl(&config, seed).await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.discovered, 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_fetching() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), 3);
    config.crawler.timeout_secs = 0;

    let result = crawl(&config, Url::parse("http://127.0.0.1:1/").unwrap()).await;

    assert!(matches!(result, Err(MirrorError::Config(_))));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}
