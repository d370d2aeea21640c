use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a possibly-relative reference against a base URL
///
/// Resolution follows the WHATWG URL rules implemented by the `url` crate:
/// relative paths, absolute paths, scheme-relative references, and query or
/// fragment-only references are all handled. Already-absolute references are
/// returned as parsed.
///
/// # Arguments
///
/// * `base` - The URL the reference was found in
/// * `reference` - The raw reference text (surrounding whitespace is ignored)
///
/// # Returns
///
/// * `Ok(Url)` - The absolute URL
/// * `Err(UrlError::Parse)` - The reference cannot be resolved
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("http://h/videos/playlist.m3u8").unwrap();
/// assert_eq!(resolve(&base, "seg1.ts").unwrap().as_str(), "http://h/videos/seg1.ts");
/// assert_eq!(resolve(&base, "/root.ts").unwrap().as_str(), "http://h/root.ts");
/// assert_eq!(resolve(&base, "//cdn/x.ts").unwrap().as_str(), "http://cdn/x.ts");
/// ```
pub fn resolve(base: &Url, reference: &str) -> UrlResult<Url> {
    base.join(reference.trim())
        .map_err(|e| UrlError::Parse(format!("{} (reference '{}')", e, reference)))
}

/// Returns true if the URL uses a scheme the fetcher can retrieve
pub fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
