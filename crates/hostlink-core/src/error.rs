//! Core error types

use hostlink_bridge::BridgeError;
use std::convert::Infallible;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] hostlink_store::StorageError),

    #[error("Window not found: {0}")]
    WindowNotFound(String),

    #[error("Invalid window state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid window size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Failure of the bridge itself; operation errors are unwrapped instead.
    #[error("Bridge error: {0}")]
    Bridge(BridgeError<Infallible>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::Bridge(e) if e.is_timeout())
    }
}

impl From<BridgeError<CoreError>> for CoreError {
    fn from(error: BridgeError<CoreError>) -> Self {
        match error {
            BridgeError::Operation(e) => e,
            BridgeError::Timeout { id, after } => CoreError::Bridge(BridgeError::Timeout { id, after }),
            BridgeError::OwnerGone => CoreError::Bridge(BridgeError::OwnerGone),
            BridgeError::Reentrant => CoreError::Bridge(BridgeError::Reentrant),
        }
    }
}
