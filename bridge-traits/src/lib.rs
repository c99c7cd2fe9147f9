//! # Host Bridge Traits
//!
//! Collaborator contracts that the radar core relies on but never implements
//! itself.
//!
//! ## Overview
//!
//! The core owns the synchronization, retention and composition logic. Anything
//! that touches the outside world goes through one of the traits below so that
//! hosts can swap implementations and tests can inject fakes.
//!
//! ## Traits
//!
//! ### I/O
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Cache directory I/O with atomic writes
//! - [`TransferClient`](transfer::TransferClient) - Remote listing and retrieval (FTP-like)
//!
//! ### Image tooling
//! - [`Compositor`](compositor::Compositor) - External layered-composite invocation
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Implementations
//!
//! | Trait | Desktop adapter (`bridge-desktop`) |
//! |-------|------------------------------------|
//! | `FileSystemAccess` | `TokioFileSystem` |
//! | `TransferClient` | `FtpTransferClient` |
//! | `Compositor` | `ImageMagickCompositor` |
//! | `Clock` | [`SystemClock`](time::SystemClock) |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! should convert their native errors into it and keep the path or remote name
//! in the message so the core can report which entry failed.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so that a single adapter can be
//! shared by concurrent fetch tasks.

pub mod compositor;
pub mod error;
pub mod storage;
pub mod time;
pub mod transfer;

pub use error::BridgeError;

// Re-export commonly used types
pub use compositor::Compositor;
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
pub use transfer::{ByteStream, RemoteEntry, TransferClient, TransferSession};
