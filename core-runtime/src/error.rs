//! Runtime error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid runtime configuration (bad filter string, inconsistent builder input)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A host capability was neither injected nor available as a desktop default
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
