use serde::Deserialize;

/// Default retry budget per URL
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request transport timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default segment worker pool size
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Main configuration structure for Sumi-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub segments: SegmentConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub targets: TargetConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Retry budget for each URL
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Connect and read timeout applied to every request (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base delay between retries (milliseconds, doubles per retry)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,

    /// Skip URLs already present in the frontier
    #[serde(default)]
    pub deduplicate: bool,

    /// Stop after processing this many frontier entries
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_delay_ms: 0,
            deduplicate: false,
            max_pages: None,
        }
    }
}

/// HLS segment pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentConfig {
    /// Number of segments fetched at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Treat `.m3u8` entries as nested playlists instead of plain files
    #[serde(rename = "follow-variants", default)]
    pub follow_variants: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            follow_variants: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the mirror
    pub destination: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// What to mirror
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetConfig {
    /// Seed URLs for recursive crawls
    #[serde(default)]
    pub seeds: Vec<String>,

    /// HLS playlist URLs for the segment pipeline
    #[serde(default)]
    pub playlists: Vec<String>,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
