//! Remote Transfer Abstraction
//!
//! Models an FTP-like remote: connect to a host, change directory, list the
//! current directory and retrieve files by name. Protocol handshakes, passive
//! mode and credentials are the adapter's business.

use async_trait::async_trait;

use crate::error::Result;

/// Owned async byte source handed between bridges.
pub type ByteStream = Box<dyn tokio::io::AsyncRead + Send + Unpin>;

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// File name relative to the current remote directory
    pub name: String,
    /// Size in bytes as reported by the listing
    pub size: u64,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Factory for remote sessions
///
/// # Example
///
/// ```ignore
/// use bridge_traits::transfer::TransferClient;
///
/// async fn names(client: &dyn TransferClient) -> Result<Vec<String>> {
///     let session = client.connect("ftp.bom.gov.au").await?;
///     session.change_directory("/anon/gen/radar").await?;
///     let entries = session.list().await?;
///     session.close().await?;
///     Ok(entries.into_iter().map(|e| e.name).collect())
/// }
/// ```
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Open a session against `host`
    async fn connect(&self, host: &str) -> Result<Box<dyn TransferSession>>;
}

/// A live remote session
///
/// Methods take `&self` so a bounded number of fetches may be in flight at
/// once; implementations serialize internally if the protocol requires it.
#[async_trait]
pub trait TransferSession: Send + Sync {
    /// Change the current remote directory
    async fn change_directory(&self, path: &str) -> Result<()>;

    /// List regular files in the current remote directory
    async fn list(&self) -> Result<Vec<RemoteEntry>>;

    /// Retrieve `name` from the current remote directory
    async fn fetch(&self, name: &str) -> Result<ByteStream>;

    /// Tear the session down
    async fn close(&self) -> Result<()>;
}
