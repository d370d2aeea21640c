//! Link extraction from fetched bodies
//!
//! Three extractors are provided, selected by content type or file extension:
//! - HTML: `<a href>`, `<img src>` and `<script src>` references
//! - JSON: absolute `http(s)://` URLs found anywhere in the raw text
//! - HLS: `#EXT-X-MEDIA` `URI=` attributes and bare segment/variant lines
//!
//! Extraction never fails. Malformed bodies yield whatever could be found and
//! references that cannot be resolved are dropped.

use crate::url::{is_fetchable, resolve};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use regex::Regex;
use scraper::{Html, Selector};
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

/// Content type routed to the HTML extractor (exact match)
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Content type routed to the JSON extractor (exact match)
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// File extension routed to the HLS extractor
pub const PLAYLIST_EXTENSION: &str = "m3u8";

const MEDIA_TAG: &str = "#EXT-X-MEDIA:";
const URI_KEY: &str = "URI=";

/// Absolute URLs embedded in text. `$-_` is a character range, so the class
/// also covers `/`, `:`, `?`, `=` and the other path and query characters.
static EMBEDDED_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+",
    )
    .expect("embedded URL regex is valid")
});

/// The body formats links can be extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkExtractor {
    Html,
    Json,
    Hls,
}

impl LinkExtractor {
    /// Selects an extractor from a content-type header value
    ///
    /// The comparison is an exact string match: `text/html; charset=utf-8`
    /// selects nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_mirror::LinkExtractor;
    ///
    /// assert_eq!(LinkExtractor::for_content_type(Some("text/html")), Some(LinkExtractor::Html));
    /// assert_eq!(LinkExtractor::for_content_type(Some("application/json")), Some(LinkExtractor::Json));
    /// assert_eq!(LinkExtractor::for_content_type(Some("text/html; charset=utf-8")), None);
    /// assert_eq!(LinkExtractor::for_content_type(None), None);
    /// ```
    pub fn for_content_type(content_type: Option<&str>) -> Option<Self> {
        match content_type? {
            HTML_CONTENT_TYPE => Some(Self::Html),
            JSON_CONTENT_TYPE => Some(Self::Json),
            _ => None,
        }
    }

    /// Selects the HLS extractor when a local file has the `.m3u8` extension
    pub fn for_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(PLAYLIST_EXTENSION) => Some(Self::Hls),
            _ => None,
        }
    }

    /// Extracts absolute URLs from a body
    ///
    /// # Arguments
    ///
    /// * `body` - Raw response bytes (decoded as UTF-8, lossily)
    /// * `base` - The URL the body was fetched from
    ///
    /// # Returns
    ///
    /// Every fetchable URL found, in extraction order, duplicates included.
    pub fn extract(&self, body: &[u8], base: &Url) -> Vec<Url> {
        let text = String::from_utf8_lossy(body);

        let references = match self {
            Self::Html => html_references(&text),
            Self::Json => json_references(&text),
            Self::Hls => hls_references(&text),
        };

        let links: Vec<Url> = references
            .iter()
            .filter_map(|reference| resolve_reference(base, reference))
            .collect();

        tracing::debug!(
            extractor = ?self,
            base = %base,
            found = references.len(),
            kept = links.len(),
            "extracted links"
        );

        links
    }
}

/// Resolves one reference, dropping it if it is malformed or not fetchable
fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    match resolve(base, reference) {
        Ok(url) if is_fetchable(&url) => Some(url),
        Ok(url) => {
            tracing::debug!(url = %url, "dropping link with unsupported scheme");
            None
        }
        Err(e) => {
            tracing::warn!(base = %base, error = %e, "dropping malformed link");
            None
        }
    }
}

/// `href` of every `a` element and `src` of every `img`/`script` element,
/// in document order
///
/// Parsed with scripting disabled so `<noscript>` content is markup, not text.
fn html_references(text: &str) -> Vec<String> {
    let document = parse_html(text);
    let mut references = Vec::new();

    if let Ok(selector) = Selector::parse("a, img, script") {
        for element in document.root_element().select(&selector) {
            let attribute = match element.value().name() {
                "a" => "href",
                _ => "src",
            };

            if let Some(value) = element.value().attr(attribute) {
                references.push(value.to_string());
            }
        }
    }

    references
}

fn parse_html(text: &str) -> Html {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    html5ever::parse_document(Html::new_document(), opts).one(text)
}

/// Every embedded absolute URL, left to right
fn json_references(text: &str) -> Vec<String> {
    EMBEDDED_URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Media `URI=` values first, then every bare (non-comment) line
fn hls_references(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.split('\n').map(str::trim_end).collect();

    let media = lines
        .iter()
        .filter(|line| line.starts_with(MEDIA_TAG))
        .filter_map(|line| line.rfind(URI_KEY).map(|at| &line[at + URI_KEY.len()..]))
        .map(strip_quotes)
        .filter(|value| !value.is_empty());

    let bare = lines
        .iter()
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.trim())
        .filter(|line| !line.is_empty());

    media.chain(bare).map(str::to_string).collect()
}

/// Drops exactly one character from each end, then surrounding whitespace
///
/// Callers pass right-trimmed lines, so whitespace after a closing quote is
/// already gone and the quote itself is what gets dropped.
fn strip_quotes(value: &str) -> &str {
    let mut chars = value.chars();
    chars.next();
    chars.next_back();
    chars.as_str().trim()
}
