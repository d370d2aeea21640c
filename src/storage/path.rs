use crate::url::extract_domain;
use std::path::{Path, PathBuf};
use url::Url;

/// File name used when a URL path names a directory
pub const FALLBACK_FILENAME: &str = "file";

/// Computes the mirrored local path of a URL
///
/// The layout is `<root>/<host>/<path without leading slash>`. When the URL
/// path is empty or ends with `/`, [`FALLBACK_FILENAME`] is appended. Query
/// strings and fragments do not take part in the path, so URLs differing only
/// in their query map to the same file.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sumi_mirror::storage::local_path;
/// use url::Url;
///
/// let root = Path::new("mirror");
/// let url = Url::parse("https://example.com/videos/seg1.ts?token=abc").unwrap();
/// assert_eq!(local_path(root, &url), Path::new("mirror/example.com/videos/seg1.ts"));
///
/// let url = Url::parse("https://example.com/docs/").unwrap();
/// assert_eq!(local_path(root, &url), Path::new("mirror/example.com/docs/file"));
/// ```
pub fn local_path(root: &Path, url: &Url) -> PathBuf {
    let mut path = root.to_path_buf();

    if let Some(host) = extract_domain(url) {
        path.push(host);
    }

    let url_path = url.path();
    let relative = url_path.strip_prefix('/').unwrap_or(url_path);

    // Repeated slashes collapse
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }

    if relative.is_empty() || relative.ends_with('/') {
        path.push(FALLBACK_FILENAME);
    }

    path
}
