//! Bridge error types

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BridgeError<E> {
    /// The caller stopped waiting. The owner thread may still run the command.
    #[error("Command {id} timed out after {after:?}")]
    Timeout { id: Uuid, after: Duration },

    #[error("Command failed: {0}")]
    Operation(E),

    #[error("Owner thread is no longer running")]
    OwnerGone,

    #[error("Blocking call issued from the owner thread")]
    Reentrant,
}

impl<E> BridgeError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }

    /// Map the operation error, keeping the bridge-level variants.
    pub fn map_operation<F, O>(self, f: F) -> BridgeError<O>
    where
        F: FnOnce(E) -> O,
    {
        match self {
            BridgeError::Timeout { id, after } => BridgeError::Timeout { id, after },
            BridgeError::Operation(e) => BridgeError::Operation(f(e)),
            BridgeError::OwnerGone => BridgeError::OwnerGone,
            BridgeError::Reentrant => BridgeError::Reentrant,
        }
    }
}
