//! Storage module for persisting mirrored resources
//!
//! This module handles everything the crawler writes to disk:
//! - Deriving the mirrored local path of a URL
//! - Creating parent directories lazily before a write
//! - Streaming bodies to disk chunk by chunk
//! - Removing partially written files before a retry

mod fs;
mod path;
mod traits;

pub use fs::FsStorage;
pub use path::{local_path, FALLBACK_FILENAME};
pub use traits::{FileWriter, Storage, StorageError, StorageResult};
