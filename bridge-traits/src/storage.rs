//! Storage and File System Abstractions
//!
//! Provides a platform-agnostic trait over the local cache directory: stat,
//! enumeration, atomic writes, full reads, streaming reads and deletion.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::transfer::ByteStream;

/// File metadata information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Every write goes through [`write_stream_atomic`](FileSystemAccess::write_stream_atomic):
/// implementations must never leave a truncated file at the destination path,
/// so readers only ever observe the previous content or the complete new one.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn frames(fs: &dyn FileSystemAccess, dir: &Path) -> Result<Vec<PathBuf>> {
///     fs.create_dir_all(dir).await?;
///     fs.list_matching(dir, &["png"]).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get metadata for a file or directory
    ///
    /// Returns an error for which [`BridgeError::is_not_found`](crate::BridgeError::is_not_found)
    /// holds when the path does not exist.
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Drain `stream` into `path`, replacing any existing file atomically.
    ///
    /// Returns the number of bytes written. On failure the destination keeps
    /// whatever content it had before the call.
    async fn write_stream_atomic(&self, path: &Path, stream: ByteStream) -> Result<u64>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// List all entries directly under a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Open a file for streaming reads
    async fn open_read_stream(&self, path: &Path) -> Result<ByteStream>;

    /// List entries directly under `path` whose extension is one of `extensions`
    ///
    /// Matching is case-sensitive, like a `*.{gif,png}` glob.
    async fn list_matching(&self, path: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let entries = self.list_directory(path).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| {
                entry
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(&ext))
            })
            .collect())
    }
}
