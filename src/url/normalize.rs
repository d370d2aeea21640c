use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL into the key used by the frontier's seen-set
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host (the parser already lowercases it and drops default ports)
/// 4. Remove fragment (everything after #)
/// 5. Sort query parameters, keeping their original encoding
/// 6. Remove empty query string (trailing ?)
///
/// The path is kept as parsed, including a trailing slash, because `/dir`
/// and `/dir/` mirror to different local files.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM:80/page/?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page/?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let sorted = sort_query(query);
        if sorted.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&sorted));
        }
    }

    Ok(url)
}

/// Sorts the `&`-separated query pieces, dropping empty ones
fn sort_query(query: &str) -> String {
    let mut pieces: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    pieces.sort_unstable();
    pieces.join("&")
}
