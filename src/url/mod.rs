//! URL handling module for Sumi-Mirror
//!
//! This module provides relative reference resolution, normalization of
//! URLs into deduplication keys, and host extraction for the mirrored layout.

mod domain;
mod normalize;
mod resolve;

// Re-export main functions
pub use domain::extract_domain;
pub use normalize::normalize_url;
pub use resolve::{is_fetchable, resolve};
