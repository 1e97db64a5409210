//! Broker types.

use dappshell_core::envelope::DropReason;
use thiserror::Error;

use crate::provider::ProviderError;

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not for us, or not a call; no reply.
    Dropped(DropReason),
    /// Token check failed; an error reply was posted.
    Rejected,
    /// Waiting for the user's decision.
    Queued { queue_id: u64 },
    /// Authorized; exactly one reply is (or will be) posted.
    Executed,
}

/// Errors from executing an authorized call.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
