//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the mirror, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - HEAD requests to check that a seed is reachable
//! - GET requests that hand back the body as a stream of chunks
//! - Error classification into [`TransportError`]

use crate::config::{Config, UserAgentConfig};
use crate::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Body chunks in arrival order; an error ends the body early
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Response headers of a successful GET, with the body not read yet
pub struct FetchedResponse {
    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Content-Type header value, verbatim
    pub content_type: Option<String>,

    pub body: BodyStream,
}

impl FetchedResponse {
    /// A response whose whole body is already in memory
    pub fn from_bytes(status: u16, content_type: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: stream::iter([Ok(body.into())]).boxed(),
        }
    }
}

impl fmt::Debug for FetchedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// A downloaded resource as the task reports it
///
/// `body` holds the bytes only when the task was asked to keep them.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Content-Type header value, verbatim
    pub content_type: Option<String>,

    pub body: Vec<u8>,
}

/// The transport capability used by download tasks
///
/// `fetch` must report every non-2xx status as a [`TransportError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one GET request and returns once the headers have arrived
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, TransportError>;

    /// Performs a HEAD request and reports whether the server answered
    async fn available(&self, url: &Url) -> bool;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Connect timeout and total request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_mirror::config::UserAgentConfig;
/// use sumi_mirror::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiMirror".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Formats the user agent: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from the user agent and crawler timeout settings
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.crawler.timeout_secs);
        Ok(Self::new(build_http_client(&config.user_agent, timeout)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            content_type = content_type.as_deref().unwrap_or(""),
            length = ?response.content_length(),
            "response headers received"
        );

        let source = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| TransportError::from_reqwest(&source, &e)))
            .boxed();

        Ok(FetchedResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    async fn available(&self, url: &Url) -> bool {
        match self.client.head(url.clone()).send().await {
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status().as_u16(), "HEAD probe answered");
                true
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "HEAD probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn create_fetcher() -> HttpFetcher {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5)).unwrap();
        HttpFetcher::new(client)
    }

    async fn collect(mut body: BodyStream) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Some(chunk) = body.next().await {
            bytes.extend_from_slice(&chunk.unwrap());
        }
        bytes
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert_eq!(
            user_agent_string(&create_test_config()),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[tokio::test]
    async fn test_fetch_success_keeps_content_type_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let response = create_fetcher().fetch(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("text/html"));
        assert_eq!(collect(response.body).await, b"<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_streams_large_body() {
        let server = MockServer::start().await;
        let payload = vec![7u8; 256 * 1024];
        Mock::given(method("GET"))
            .and(path("/seg.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(payload.clone(), "video/mp2t"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/seg.ts", server.uri())).unwrap();
        let response = create_fetcher().fetch(&url).await.unwrap();

        assert_eq!(collect(response.body).await, payload);
    }

    #[tokio::test]
    async fn test_from_bytes_is_a_single_chunk() {
        let response = FetchedResponse::from_bytes(200, None, "abc");
        assert_eq!(collect(response.body).await, b"abc");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let result = create_fetcher().fetch(&url).await;

        assert!(matches!(
            result,
            Err(TransportError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let url = Url::parse("http://127.0.0.1:1/unreachable").unwrap();
        let result = create_fetcher().fetch(&url).await;

        let error = result.unwrap_err();
        assert_eq!(error.url(), "http://127.0.0.1:1/unreachable");
    }

    #[tokio::test]
    async fn test_available_any_response() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let fetcher = create_fetcher();
        let up = Url::parse(&format!("{}/", server.uri())).unwrap();
        assert!(fetcher.available(&up).await);

        // Unmatched HEAD answers 404, which still proves the server is up
        let missing = Url::parse(&format!("{}/nothing", server.uri())).unwrap();
        assert!(fetcher.available(&missing).await);
    }

    #[tokio::test]
    async fn test_unavailable_when_nothing_listens() {
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        assert!(!create_fetcher().available(&url).await);
    }
}
