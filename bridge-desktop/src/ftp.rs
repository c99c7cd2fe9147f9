//! Transfer Client Implementation using suppaftp
//!
//! suppaftp's synchronous `FtpStream` runs on Tokio's blocking pool. One
//! control connection is shared per session, so concurrent fetches on the same
//! session are serialized by a mutex.
//!
//! Control and data sockets carry read/write timeouts, so a stalled server
//! fails the blocking call instead of parking a pool thread forever. Closing a
//! session that is mid-transfer shuts the control socket down rather than
//! waiting for the mutex.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    transfer::{ByteStream, RemoteEntry, TransferClient, TransferSession},
};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Duration;
use suppaftp::{list::File as ListedFile, types::FileType, FtpError, FtpResult, FtpStream};
use tracing::{debug, warn};

const DEFAULT_FTP_PORT: u16 = 21;
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// FTP transfer client
#[derive(Debug, Clone)]
pub struct FtpTransferClient {
    username: String,
    password: String,
    port: u16,
    io_timeout: Duration,
}

impl FtpTransferClient {
    /// Client with explicit credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            port: DEFAULT_FTP_PORT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Anonymous login, as public radar mirrors expect
    pub fn anonymous() -> Self {
        Self::new("anonymous", "anonymous@")
    }

    /// Override the control port used when the host carries none
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Longest a single socket read or write may block
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    fn address(&self, host: &str) -> String {
        if host.contains(':') {
            host.to_string()
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

impl Default for FtpTransferClient {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[async_trait]
impl TransferClient for FtpTransferClient {
    async fn connect(&self, host: &str) -> Result<Box<dyn TransferSession>> {
        let address = self.address(host);
        let username = self.username.clone();
        let password = self.password.clone();
        let timeout = self.io_timeout;

        debug!(address = %address, timeout = ?timeout, "FTP connect");
        let (stream, control) =
            tokio::task::spawn_blocking(move || -> FtpResult<(FtpStream, TcpStream)> {
                let stream = FtpStream::connect(address.as_str())?
                    .passive_stream_builder(move |addr| data_stream(addr, timeout));
                let control = stream.get_ref();
                control
                    .set_read_timeout(Some(timeout))
                    .and_then(|_| control.set_write_timeout(Some(timeout)))
                    .map_err(FtpError::ConnectionError)?;
                let control = control.try_clone().map_err(FtpError::ConnectionError)?;

                let mut stream = stream;
                stream.login(username.as_str(), password.as_str())?;
                stream.transfer_type(FileType::Binary)?;
                Ok((stream, control))
            })
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("FTP connect task failed: {}", e)))?
            .map_err(|e| BridgeError::Transfer(format!("connect to {}: {}", host, e)))?;

        Ok(Box::new(FtpSession::new(stream, Some(control))))
    }
}

/// Passive data connection with the same I/O bound as the control socket
fn data_stream(addr: SocketAddr, timeout: Duration) -> FtpResult<TcpStream> {
    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(FtpError::ConnectionError)?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(FtpError::ConnectionError)?;
    Ok(stream)
}

struct FtpSession {
    stream: Arc<Mutex<Option<FtpStream>>>,
    /// Second handle on the control socket, used to interrupt a busy session
    control: Option<TcpStream>,
    closed: Arc<AtomicBool>,
}

impl FtpSession {
    fn new(stream: FtpStream, control: Option<TcpStream>) -> Self {
        Self {
            stream: Arc::new(Mutex::new(Some(stream))),
            control,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run `op` against the control connection on the blocking pool
    async fn with_stream<T, F>(&self, label: String, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> FtpResult<T> + Send + 'static,
    {
        let stream = Arc::clone(&self.stream);
        let closed = Arc::clone(&self.closed);
        tokio::task::spawn_blocking(move || {
            if closed.load(Ordering::SeqCst) {
                return Err(BridgeError::Transfer(format!("{}: session closed", label)));
            }
            let mut guard = stream
                .lock()
                .map_err(|_| BridgeError::Transfer(format!("{}: session lock poisoned", label)))?;
            let ftp = guard
                .as_mut()
                .ok_or_else(|| BridgeError::Transfer(format!("{}: session closed", label)))?;
            op(ftp).map_err(|e| BridgeError::Transfer(format!("{}: {}", label, e)))
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("FTP task failed: {}", e)))?
    }
}

/// Parse LIST output, keeping regular files only
fn parse_listing(lines: &[String]) -> Vec<RemoteEntry> {
    lines
        .iter()
        .filter_map(|line| match line.parse::<ListedFile>() {
            Ok(file) if file.is_file() => Some(RemoteEntry::new(file.name(), file.size() as u64)),
            Ok(_) => None,
            Err(e) => {
                warn!(line = %line, error = ?e, "Unparseable LIST line");
                None
            }
        })
        .collect()
}

#[async_trait]
impl TransferSession for FtpSession {
    async fn change_directory(&self, path: &str) -> Result<()> {
        debug!(path = %path, "FTP cwd");
        let target = path.to_string();
        self.with_stream(format!("cwd {}", path), move |ftp| ftp.cwd(target.as_str()))
            .await
    }

    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        debug!("FTP list");
        let lines = self
            .with_stream("list".to_string(), |ftp| ftp.list(None))
            .await?;
        Ok(parse_listing(&lines))
    }

    async fn fetch(&self, name: &str) -> Result<ByteStream> {
        debug!(name = %name, "FTP get");
        let target = name.to_string();
        let buffer = self
            .with_stream(format!("get {}", name), move |ftp| {
                ftp.retr_as_buffer(target.as_str())
            })
            .await?;
        Ok(Box::new(buffer))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);

        let taken = match self.stream.try_lock() {
            Ok(mut guard) => guard.take(),
            Err(TryLockError::WouldBlock) => {
                // A transfer holds the connection; cut it so the blocked call fails
                debug!("FTP session busy, shutting control socket down");
                if let Some(control) = &self.control {
                    if let Err(e) = control.shutdown(Shutdown::Both) {
                        debug!(error = %e, "FTP control shutdown failed");
                    }
                }
                return Ok(());
            }
            Err(TryLockError::Poisoned(_)) => {
                return Err(BridgeError::Transfer(
                    "quit: session lock poisoned".to_string(),
                ))
            }
        };

        debug!("FTP quit");
        tokio::task::spawn_blocking(move || {
            match taken {
                Some(mut ftp) => ftp
                    .quit()
                    .map_err(|e| BridgeError::Transfer(format!("quit: {}", e))),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("FTP task failed: {}", e)))?
    }
}
