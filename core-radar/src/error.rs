use bridge_traits::BridgeError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadarError {
    /// Malformed settings or an unknown option; raised before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error during {stage} for {category}: {source}")]
    Transport {
        category: String,
        stage: &'static str,
        #[source]
        source: BridgeError,
    },

    #[error("Local I/O error while trying to {operation} {}: {source}", .path.display())]
    LocalIo {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error("Compositor failed: {0}")]
    Compositor(#[source] BridgeError),

    #[error("{category} timed out after {after:?}")]
    Timeout { category: String, after: Duration },
}

impl RadarError {
    pub(crate) fn transport(category: impl Into<String>, stage: &'static str, source: BridgeError) -> Self {
        Self::Transport {
            category: category.into(),
            stage,
            source,
        }
    }

    pub(crate) fn local_io(operation: &'static str, path: impl Into<PathBuf>, source: BridgeError) -> Self {
        Self::LocalIo {
            operation,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RadarError>;
