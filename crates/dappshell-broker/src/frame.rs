//! Reply sinks standing in for the originating dapp frame.

use tokio::sync::mpsc;
use tracing::debug;

use dappshell_core::Reply;

/// Where replies for a given inbound message are delivered.
///
/// Posting is fire-and-forget: a frame that has gone away simply never sees
/// the reply.
pub trait Frame: Send + Sync {
    fn post(&self, reply: Reply);
}

impl Frame for mpsc::UnboundedSender<Reply> {
    fn post(&self, reply: Reply) {
        if self.send(reply).is_err() {
            debug!("Frame closed, dropping reply");
        }
    }
}
