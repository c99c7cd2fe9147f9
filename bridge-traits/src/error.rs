use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("External process failed: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the error means the target simply does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            BridgeError::NotFound(_) => true,
            BridgeError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(BridgeError::NotFound(PathBuf::from("/tmp/x.png")).is_not_found());
        assert!(
            BridgeError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
                .is_not_found()
        );
        assert!(!BridgeError::Transfer("550".to_string()).is_not_found());
        assert!(
            !BridgeError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"))
                .is_not_found()
        );
    }
}
