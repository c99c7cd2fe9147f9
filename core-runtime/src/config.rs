//! # Runtime Configuration Module
//!
//! Wires the host capabilities the radar engines depend on.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `RadarConfig` holding every bridge the core needs. It fails fast: a
//! capability that is neither injected nor available as a platform default
//! is reported at build time rather than on first use.
//!
//! ## Capabilities
//!
//! - `FileSystemAccess` - cache directory I/O (desktop default: tokio fs)
//! - `TransferClient` - remote listing and download (desktop default: suppaftp)
//! - `Compositor` - animation rendering (desktop default: ImageMagick `convert`)
//! - `Clock` - wall-clock source (default: system clock, on every platform)
//!
//! ## Usage
//!
//! ### Desktop defaults
//!
//! ```ignore
//! use core_runtime::config::RadarConfig;
//!
//! let config = RadarConfig::builder()
//!     .build()
//!     .expect("desktop-shims provides every capability");
//! ```
//!
//! ### Custom bridges
//!
//! ```ignore
//! use core_runtime::config::RadarConfig;
//! use std::sync::Arc;
//!
//! let config = RadarConfig::builder()
//!     .file_system(Arc::new(MyFileSystem))
//!     .transfer_client(Arc::new(MyMirrorClient))
//!     .compositor(Arc::new(MyRenderer))
//!     .clock(Arc::new(ManualClock::new(start)))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, Compositor, FileSystemAccess, SystemClock, TransferClient};
use std::fmt;
use std::sync::Arc;

/// Host capabilities shared by the sync, retention and composite engines.
///
/// Use [`RadarConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct RadarConfig {
    /// Local cache directory access
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Remote mirror client
    pub transfer_client: Arc<dyn TransferClient>,

    /// Image compositor invoked with the resolved argument list
    pub compositor: Arc<dyn Compositor>,

    /// Wall-clock source for retention cutoffs and artifact expiry
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for RadarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadarConfig")
            .field("file_system", &"<dyn FileSystemAccess>")
            .field("transfer_client", &"<dyn TransferClient>")
            .field("compositor", &"<dyn Compositor>")
            .field("clock", &"<dyn Clock>")
            .finish()
    }
}

impl RadarConfig {
    /// Creates a new builder for constructing a `RadarConfig`.
    pub fn builder() -> RadarConfigBuilder {
        RadarConfigBuilder::default()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, desktop_default: &str, other: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{capability} implementation is required. \
             Desktop: enable the 'desktop-shims' feature to use the default {desktop_default}. \
             Other hosts: {other}."
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Ok(Arc::new(bridge_desktop::TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(capability_missing(
        "FileSystemAccess",
        "TokioFileSystem",
        "inject a file system bridge for the cache directory",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_transfer_client() -> Result<Arc<dyn TransferClient>> {
    Ok(Arc::new(bridge_desktop::FtpTransferClient::anonymous()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_transfer_client() -> Result<Arc<dyn TransferClient>> {
    Err(capability_missing(
        "TransferClient",
        "FtpTransferClient",
        "inject a client able to list and download from the mirror",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_compositor() -> Result<Arc<dyn Compositor>> {
    Ok(Arc::new(bridge_desktop::ImageMagickCompositor::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_compositor() -> Result<Arc<dyn Compositor>> {
    Err(capability_missing(
        "Compositor",
        "ImageMagickCompositor",
        "inject a renderer that accepts ImageMagick-style arguments",
    ))
}

/// Builder for constructing [`RadarConfig`] instances.
#[derive(Default)]
pub struct RadarConfigBuilder {
    file_system: Option<Arc<dyn FileSystemAccess>>,
    transfer_client: Option<Arc<dyn TransferClient>>,
    compositor: Option<Arc<dyn Compositor>>,
    clock: Option<Arc<dyn Clock>>,
}

impl RadarConfigBuilder {
    pub fn file_system(mut self, file_system: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    pub fn transfer_client(mut self, client: Arc<dyn TransferClient>) -> Self {
        self.transfer_client = Some(client);
        self
    }

    pub fn compositor(mut self, compositor: Arc<dyn Compositor>) -> Self {
        self.compositor = Some(compositor);
        self
    }

    /// Overrides the system clock, mostly useful in tests
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `RadarConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when a bridge was not injected and
    /// no platform default exists for it.
    pub fn build(self) -> Result<RadarConfig> {
        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let transfer_client = match self.transfer_client {
            Some(client) => client,
            None => provide_default_transfer_client()?,
        };

        let compositor = match self.compositor {
            Some(compositor) => compositor,
            None => provide_default_compositor()?,
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        Ok(RadarConfig {
            file_system,
            transfer_client,
            compositor,
            clock,
        })
    }
}
