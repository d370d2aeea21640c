//! Crawl frontier
//!
//! The frontier is an append-only list of links plus a cursor. The crawl
//! engine processes the entry under the cursor and appends whatever it
//! discovers to the tail, which makes the traversal breadth-first.

use crate::url::normalize_url;
use std::collections::HashSet;
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute URL to fetch
    pub url: Url,

    /// Page the URL was found on (None for the seed)
    pub discovered_from: Option<Url>,
}

impl Link {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            discovered_from: None,
        }
    }

    pub fn discovered(url: Url, from: &Url) -> Self {
        Self {
            url,
            discovered_from: Some(from.clone()),
        }
    }
}

/// Ordered links plus the index of the next one to process
///
/// Invariant: `cursor <= links.len()`.
#[derive(Debug, Default)]
pub struct Frontier {
    links: Vec<Link>,
    cursor: usize,
    /// Normalized URLs already queued, when deduplication is enabled
    seen: Option<HashSet<Url>>,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// With `deduplicate` set, a link whose normalized URL was queued before
    /// is not appended again.
    pub fn new(deduplicate: bool) -> Self {
        Self {
            links: Vec::new(),
            cursor: 0,
            seen: deduplicate.then(HashSet::new),
        }
    }

    /// Appends a link to the tail; returns false if it was a duplicate
    pub fn push(&mut self, link: Link) -> bool {
        if let Some(seen) = self.seen.as_mut() {
            let key = normalize_url(link.url.as_str()).unwrap_or_else(|_| link.url.clone());
            if !seen.insert(key) {
                tracing::trace!(url = %link.url, "skipping already queued link");
                return false;
            }
        }

        self.links.push(link);
        true
    }

    /// Returns the link under the cursor and advances past it
    pub fn next_link(&mut self) -> Option<&Link> {
        if self.cursor >= self.links.len() {
            return None;
        }

        let index = self.cursor;
        self.cursor += 1;
        self.links.get(index)
    }

    /// Index of the next link to process
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of links ever queued
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links queued but not processed yet
    pub fn pending(&self) -> usize {
        self.links.len() - self.cursor
    }

    pub fn is_drained(&self) -> bool {
        self.cursor == self.links.len()
    }
}
