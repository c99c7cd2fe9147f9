//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
    transfer::ByteStream,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Tokio-based file system implementation
///
/// Atomic writes stage content in a hidden `.<name>.part` sibling and rename
/// it over the destination once the stream has been fully drained and synced.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// Sibling path used while a write is in flight
    fn staging_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.part", name))
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    async fn drain_into(staging: &Path, stream: &mut ByteStream) -> std::io::Result<u64> {
        let mut file = fs::File::create(staging).await?;
        let written = tokio::io::copy(stream, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Ensured directory");
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_stream_atomic(&self, path: &Path, mut stream: ByteStream) -> Result<u64> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }

        let staging = Self::staging_path(path);
        match Self::drain_into(&staging, &mut stream).await {
            Ok(written) => {
                fs::rename(&staging, path)
                    .await
                    .map_err(Self::map_io_error)?;
                debug!(path = ?path, size = written, "Wrote file");
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&staging).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = ?staging, error = %cleanup, "Failed to remove staging file");
                    }
                }
                Err(Self::map_io_error(e))
            }
        }
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(Self::map_io_error)?
        {
            entries.push(entry.path());
        }

        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn open_read_stream(&self, path: &Path) -> Result<ByteStream> {
        let file = fs::File::open(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Opened file for reading");
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

    /// Yields some bytes then fails, like a dropped data connection.
    struct BrokenStream {
        sent: bool,
    }

    impl AsyncRead for BrokenStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.sent {
                Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "data connection reset",
                )))
            } else {
                self.sent = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let path = dir.path().join("IDR032.background.png");

        let stream: ByteStream = Box::new(std::io::Cursor::new(b"Hello, radar!".to_vec()));
        let written = fs.write_stream_atomic(&path, stream).await.unwrap();
        assert_eq!(written, 13);

        let read = fs.read_file(&path).await.unwrap();
        assert_eq!(read, Bytes::from_static(b"Hello, radar!"));

        let metadata = fs.metadata(&path).await.unwrap();
        assert_eq!(metadata.size, 13);
        assert!(metadata.modified_at.is_some());
        assert!(!metadata.is_directory);

        let mut reader = fs.open_read_stream(&path).await.unwrap();
        let mut streamed = Vec::new();
        reader.read_to_end(&mut streamed).await.unwrap();
        assert_eq!(streamed, b"Hello, radar!");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let path = dir.path().join("IDR032.T.201803210500.png");

        let original: ByteStream = Box::new(std::io::Cursor::new(b"complete".to_vec()));
        fs.write_stream_atomic(&path, original).await.unwrap();

        let broken: ByteStream = Box::new(BrokenStream { sent: false });
        assert!(fs.write_stream_atomic(&path, broken).await.is_err());

        assert_eq!(
            fs.read_file(&path).await.unwrap(),
            Bytes::from_static(b"complete")
        );
        let leftovers = fs.list_directory(dir.path()).await.unwrap();
        assert_eq!(leftovers, vec![path]);
    }

    #[tokio::test]
    async fn test_metadata_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();

        let err = fs
            .metadata(&dir.path().join("IDR032.composite.gif"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(fs
            .metadata(&dir.path().join("missing"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_create_dir_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let nested = dir.path().join("a").join("b");

        fs.create_dir_all(&nested).await.unwrap();
        fs.create_dir_all(&nested).await.unwrap();
        assert!(fs.metadata(&nested).await.unwrap().is_directory);
        assert!(fs.list_directory(&nested).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let path = dir.path().join("old.png");
        std::fs::write(&path, b"x").unwrap();

        fs.delete_file(&path).await.unwrap();
        assert!(!path.exists());
        assert!(fs.delete_file(&path).await.unwrap_err().is_not_found());
    }
}
