//! Storage traits and error types
//!
//! This module defines the filesystem capability the download task writes
//! through, the writer it streams bodies into, and their error type.

use crate::storage::local_path;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An open destination file that body chunks are appended to
pub struct FileWriter {
    path: PathBuf,
    sink: Box<dyn AsyncWrite + Send + Unpin>,
}

impl FileWriter {
    pub fn new(path: impl Into<PathBuf>, sink: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            path: path.into(),
            sink: Box::new(sink),
        }
    }

    /// Appends one chunk
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        self.sink
            .write_all(chunk)
            .await
            .map_err(|source| self.write_error(source))
    }

    /// Flushes buffered bytes; the file is complete once this returns
    pub async fn finish(mut self) -> StorageResult<()> {
        self.sink
            .flush()
            .await
            .map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Trait for the filesystem capability
///
/// Implementations are shared between concurrent segment workers, so they
/// must be usable through a shared reference from several tasks.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Destination root every mirrored path lives under
    fn root(&self) -> &Path;

    /// Mirrored local path for a URL under this storage's root
    fn path_for(&self, url: &Url) -> PathBuf {
        local_path(self.root(), url)
    }

    /// Opens `path` for writing, creating parent directories as needed
    ///
    /// An existing file is truncated.
    async fn create(&self, path: &Path) -> StorageResult<FileWriter>;

    /// Deletes `path` if it exists
    ///
    /// Returns true if a file was removed.
    async fn remove_if_exists(&self, path: &Path) -> StorageResult<bool>;
}
