//! Cross-frame request broker.
//!
//! Validates inbound frame messages, checks the caller's token and
//! permissions, queues calls that need approval and executes the rest.

mod dispatcher;
mod intrinsic;
mod types;

pub use dispatcher::Broker;
pub use intrinsic::Intrinsic;
pub use types::{BrokerError, Dispatch};
