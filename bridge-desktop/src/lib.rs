//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`, with write-then-rename staging
//! - `TransferClient` using `suppaftp` on Tokio's blocking pool
//! - `Compositor` spawning ImageMagick's `convert` through `tokio::process`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FtpTransferClient, ImageMagickCompositor, TokioFileSystem};
//!
//! #[tokio::main]
//! async fn main() {
//!     let fs = TokioFileSystem::new();
//!     let ftp = FtpTransferClient::anonymous();
//!     let convert = ImageMagickCompositor::new();
//!
//!     // Hand them to core_runtime::config::RadarConfig::builder()
//! }
//! ```

mod filesystem;
mod ftp;
mod imagemagick;

pub use filesystem::TokioFileSystem;
pub use ftp::FtpTransferClient;
pub use imagemagick::ImageMagickCompositor;
