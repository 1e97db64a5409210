//! Permission types.

use std::fmt;
use std::sync::Arc;

use dappshell_core::Envelope;

use crate::frame::Frame;

/// A call waiting for the user's decision.
#[derive(Clone)]
pub struct QueuedRequest {
    /// Monotonic queue id, never reused within the process.
    pub queue_id: u64,
    /// App the call's token was issued to.
    pub app_id: String,
    /// The original message.
    pub envelope: Envelope,
    /// Frame the eventual reply goes to.
    pub frame: Arc<dyn Frame>,
}

impl QueuedRequest {
    /// Method the approval is about (`params[0]` for subscriptions).
    ///
    /// Same key the dispatcher checked when queueing, so section lookups on
    /// approval and squashing agree with it.
    pub fn method(&self) -> &str {
        self.envelope
            .call
            .permission_key()
            .unwrap_or_else(|| self.envelope.method_label())
    }

    pub fn token(&self) -> Option<&str> {
        self.envelope.token()
    }
}

impl fmt::Debug for QueuedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedRequest")
            .field("queue_id", &self.queue_id)
            .field("app_id", &self.app_id)
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}
