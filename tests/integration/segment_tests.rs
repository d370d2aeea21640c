//! Integration tests for the HLS segment pipeline
//!
//! These tests serve playlists and segments from a wiremock server and
//! mirror them into a temporary directory.

use std::path::Path;
use sumi_mirror::config::{
    Config, CrawlerConfig, OutputConfig, SegmentConfig, TargetConfig, UserAgentConfig,
};
use sumi_mirror::crawler::{mirror_playlist, SegmentPipeline};
use sumi_mirror::{DownloadOutcome, MirrorError};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MASTER: &str = "#EXTM3U\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"en\",URI=\"audio/en.m3u8\"\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000\n\
video/low.m3u8\n";

const VIDEO: &str = "#EXTM3U\n\
#EXT-X-TARGETDURATION:10\n\
#EXTINF:10,\n\
v0.ts\n\
#EXTINF:10,\n\
v1.ts\n\
#EXTINF:10,\n\
v2.ts\n\
#EXT-X-ENDLIST\n";

const AUDIO: &str = "#EXTM3U\n#EXTINF:10,\na0.aac\n#EXT-X-ENDLIST\n";

fn create_test_config(
    destination: &Path,
    concurrency: usize,
    follow_variants: bool,
    max_retries: u32,
) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_retries,
            timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        segments: SegmentConfig {
            concurrency,
            follow_variants,
        },
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

async fn mount_body(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/octet-stream"))
        .mount(server)
        .await;
}

async fn start_stream_server() -> MockServer {
    let server = MockServer::start().await;
    mount_body(&server, "/stream/master.m3u8", MASTER).await;
    mount_body(&server, "/stream/video/low.m3u8", VIDEO).await;
    mount_body(&server, "/stream/audio/en.m3u8", AUDIO).await;
    for (route, body) in [
        ("/stream/video/v0.ts", "v0"),
        ("/stream/video/v1.ts", "v1"),
        ("/stream/video/v2.ts", "v2"),
        ("/stream/audio/a0.aac", "a0"),
    ] {
        mount_body(&server, route, body).await;
    }
    server
}

fn paths(outcomes: &[DownloadOutcome]) -> Vec<String> {
    outcomes.iter().map(|o| o.url().path().to_string()).collect()
}

#[tokio::test]
async fn test_media_playlist_segments_are_mirrored() {
    let server = start_stream_server().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, false, 0);
    let playlist = Url::parse(&format!("{}/stream/video/low.m3u8", server.uri())).unwrap();

    let report = mirror_playlist(&config, &playlist).await.unwrap();

    assert_eq!(
        paths(report.log.successes()),
        vec![
            "/stream/video/v0.ts",
            "/stream/video/v1.ts",
            "/stream/video/v2.ts"
        ]
    );
    assert!(report.log.failures().is_empty());

    let video_dir = dir.path().join("127.0.0.1/stream/video");
    assert_eq!(std::fs::read_to_string(video_dir.join("low.m3u8")).unwrap(), VIDEO);
    assert_eq!(std::fs::read_to_string(video_dir.join("v2.ts")).unwrap(), "v2");
}

#[tokio::test]
async fn test_master_playlist_without_following_variants() {
    let server = start_stream_server().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, false, 0);
    let playlist = Url::parse(&format!("{}/stream/master.m3u8", server.uri())).unwrap();

    let report = mirror_playlist(&config, &playlist).await.unwrap();

    assert_eq!(report.playlists_fetched, 1);
    assert_eq!(
        paths(report.log.successes()),
        vec!["/stream/audio/en.m3u8", "/stream/video/low.m3u8"]
    );
    assert!(!dir.path().join("127.0.0.1/stream/video/v0.ts").exists());
}

#[tokio::test]
async fn test_master_playlist_following_variants() {
    let server = start_stream_server().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, true, 0);
    let playlist = Url::parse(&format!("{}/stream/master.m3u8", server.uri())).unwrap();

    let report = mirror_playlist(&config, &playlist).await.unwrap();

    assert_eq!(report.playlists_fetched, 3);
    assert_eq!(
        paths(report.log.successes()),
        vec![
            "/stream/audio/en.m3u8",
            "/stream/audio/a0.aac",
            "/stream/video/low.m3u8",
            "/stream/video/v0.ts",
            "/stream/video/v1.ts",
            "/stream/video/v2.ts"
        ]
    );
}

#[tokio::test]
async fn test_failing_segment_uses_its_own_budget() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        "/live/index.m3u8",
        "#EXTM3U\n#EXTINF:4,\nok.ts\n#EXTINF:4,\nbroken.ts\n",
    )
    .await;
    mount_body(&server, "/live/ok.ts", "ok").await;
    Mock::given(method("GET"))
        .and(path("/live/broken.ts"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 2, false, 2);
    let playlist = Url::parse(&format!("{}/live/index.m3u8", server.uri())).unwrap();

    let report = mirror_playlist(&config, &playlist).await.unwrap();

    assert_eq!(paths(report.log.successes()), vec!["/live/ok.ts"]);
    match &report.log.failures()[0] {
        DownloadOutcome::Failure { url, retries, .. } => {
            assert_eq!(url.path(), "/live/broken.ts");
            assert_eq!(*retries, 2);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrency_one_and_eight_agree() {
    let server = start_stream_server().await;
    let playlist = Url::parse(&format!("{}/stream/video/low.m3u8", server.uri())).unwrap();

    let serial_dir = TempDir::new().unwrap();
    let serial = SegmentPipeline::from_config(&create_test_config(serial_dir.path(), 1, false, 0))
        .unwrap()
        .run(&playlist)
        .await
        .unwrap();

    let parallel_dir = TempDir::new().unwrap();
    let parallel =
        SegmentPipeline::from_config(&create_test_config(parallel_dir.path(), 8, false, 0))
            .unwrap()
            .run(&playlist)
            .await
            .unwrap();

    assert_eq!(paths(serial.log.successes()), paths(parallel.log.successes()));
    assert_eq!(paths(serial.log.failures()), paths(parallel.log.failures()));
}

#[tokio::test]
async fn test_missing_playlist_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, false, 1);
    let playlist = Url::parse(&format!("{}/nothing.m3u8", server.uri())).unwrap();

    let result = mirror_playlist(&config, &playlist).await;

    match result {
        Err(MirrorError::PlaylistUnavailable { url, reason }) => {
            assert_eq!(url, playlist.to_string());
            assert!(reason.contains("404"));
        }
        other => panic!("expected PlaylistUnavailable, got {:?}", other.map(|r| r.log)),
    }
}
