//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the radar mirror:
//! - Logging and tracing infrastructure
//! - Capability wiring (file system, transfer client, compositor, clock)
//!
//! ## Overview
//!
//! Every other crate in the workspace logs through the subscriber installed
//! by [`logging::init_logging`] and receives its host capabilities through a
//! [`config::RadarConfig`]. On desktop builds the `desktop-shims` feature
//! fills in any capability the caller leaves out.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
